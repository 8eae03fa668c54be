//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Activity is recorded by the event loop before
//! input reaches these handlers.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{
    can_add_password_char, can_add_url_char, can_add_username_char, App, AppState, FormFocus,
    LoginFocus,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key);
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Focus movement works everywhere on the form
    match key.code {
        KeyCode::Tab => {
            app.form_focus = app.form_focus.next();
            return Ok(false);
        }
        KeyCode::BackTab => {
            app.form_focus = app.form_focus.prev();
            return Ok(false);
        }
        _ => {}
    }

    if app.form_focus == FormFocus::Url {
        handle_url_input(app, key);
        return Ok(false);
    }

    // Global keys (outside the text field)
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('c') => {
            app.copy_short_url();
        }
        KeyCode::Char('l') => {
            app.logout();
        }
        KeyCode::Char('e') | KeyCode::Char('i') => {
            app.form_focus = FormFocus::Url;
        }
        _ => match app.form_focus {
            FormFocus::Provider => handle_provider_input(app, key),
            FormFocus::Shorten => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    app.submit();
                }
            }
            FormFocus::Url => {}
        },
    }

    Ok(false)
}

fn handle_provider_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') | KeyCode::Char('j') => {
            app.cycle_provider(true);
        }
        KeyCode::Left | KeyCode::Up | KeyCode::Char('k') => {
            app.cycle_provider(false);
        }
        KeyCode::Enter => {
            app.form_focus = FormFocus::Url;
        }
        _ => {}
    }
}

fn handle_url_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            // Leave the text field so single-key commands work
            app.form_focus = FormFocus::Shorten;
        }
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Backspace => {
            app.url_input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.url_input.clear();
        }
        KeyCode::Char(c) => {
            if can_add_url_char(app.url_input.chars().count(), c) {
                app.url_input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            // Move to next field
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            // Move to previous field
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                // On failure login_error is set and the overlay stays up
                app.attempt_login();
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            // Ignore character input on button
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
