use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use linkgate_core::{ProviderId, ShortenState};

use crate::app::{App, AppState, FormFocus, LoginFocus};

use super::styles;

/// Width of the visible URL field
const URL_FIELD_WIDTH: usize = 48;

const LOGO: [&str; 3] = [
    "   ╦  ╦╔╗╔╦╔═  ╔═╗╔═╗╔╦╗╔═╗",
    "   ║  ║║║║╠╩╗  ║ ╦╠═╣ ║ ║╣ ",
    "   ╩═╝╩╝╚╝╩ ╩  ╚═╝╩ ╩ ╩ ╚═╝",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_form(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame, app);
    }

    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| Line::from(Span::styled(*row, styles::title_style())))
        .collect()
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  linkgate";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

/// Show the tail of long input so the cursor stays visible
fn visible_tail(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        format!("{:<width$}", text, width = width)
    } else {
        let tail: String = text.chars().skip(len - width + 1).collect();
        format!("…{}", tail)
    }
}

fn provider_spans(selected: ProviderId, focused: bool) -> Vec<Span<'static>> {
    let mut spans = vec![Span::styled("  Provider: ", styles::muted_style())];
    for (i, id) in ProviderId::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(id.display_name(), styles::choice_style(*id == selected)));
    }
    if focused {
        spans.push(Span::styled("   ◀ ▶", styles::highlight_style()));
    }
    spans
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let controller = app.gate.controller();
    let mut lines = vec![Line::from("")];

    // Provider selector
    lines.push(Line::from(provider_spans(
        app.provider,
        app.form_focus == FormFocus::Provider,
    )));
    lines.push(Line::from(""));

    // URL field
    let url_focused = app.form_focus == FormFocus::Url;
    let cursor = if url_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::styled("  URL:      [", styles::muted_style()),
        Span::styled(
            format!("{}{}", visible_tail(&app.url_input, URL_FIELD_WIDTH), cursor),
            styles::field_style(url_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));
    lines.push(Line::from(""));

    // Shorten button
    let button_focused = app.form_focus == FormFocus::Shorten;
    let label = if controller.is_loading() {
        " Shortening… "
    } else if button_focused {
        " ▶ Shorten ◀ "
    } else {
        "   Shorten   "
    };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(label, styles::field_style(button_focused)),
        Span::raw("]"),
    ]));
    lines.push(Line::from(""));

    // Outcome
    match controller.state() {
        ShortenState::Success(short) => {
            lines.push(Line::from(vec![
                Span::styled("  Short link: ", styles::muted_style()),
                Span::styled(short.clone(), styles::link_style()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  [c]", styles::help_key_style()),
                Span::styled(" copy to clipboard", styles::muted_style()),
            ]));
        }
        ShortenState::Failed(e) => {
            lines.push(Line::from(Span::styled(
                format!("  {}", e),
                styles::error_style(),
            )));
        }
        ShortenState::Validating | ShortenState::InFlight => {
            lines.push(Line::from(Span::styled(
                format!("  Contacting {}…", app.provider.display_name()),
                styles::highlight_style(),
            )));
        }
        ShortenState::Idle => {}
    }

    let block = Block::default()
        .title(" Shorten a link ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.state == AppState::Normal));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match (&app.status_message, app.gate.session().current_user()) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, Some(user)) => format!(" Signed in as {} ", user),
        (None, None) => " Not signed in ".to_string(),
    };

    let center_text = format!(
        "Session expires after {} minutes of inactivity",
        app.timeout_minutes()
    );

    let right_text = match app.session_minutes_left() {
        Some(minutes) => format!(" {} min left | [l]ogout | [q]uit ", minutes),
        None => " [q]uit ".to_string(),
    };

    // Center it absolutely, regardless of left/right content
    let width = area.width as usize;
    let center_start = (width.saturating_sub(center_text.len())) / 2;
    let left_pad = center_start.saturating_sub(left_text.len());
    let right_start = center_start + center_text.len();
    let right_pad = width.saturating_sub(right_start).saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(left_pad)),
        Span::styled(center_text, styles::muted_style()),
        Span::raw(" ".repeat(right_pad)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 23, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines();
    help_text.extend([
        Line::from(Span::styled(
            format!("              version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Form", styles::highlight_style())),
        help_line("  Tab       ", "Next field (provider, URL, button)"),
        help_line("  ←/→       ", "Change provider"),
        help_line("  Enter     ", "Shorten the URL"),
        help_line("  Esc       ", "Leave the URL field"),
        help_line("  Ctrl+U    ", "Clear the URL field"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("  e         ", "Edit the URL"),
        help_line("  c         ", "Copy the short link"),
        help_line("  l         ", "Log out"),
        help_line("  q         ", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Idle for {} minutes and you are logged out.",
                app.timeout_minutes()
            ),
            styles::muted_style(),
        )),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    // Fixed size dialog - compact
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(46, height, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    // Username field
    let username_focused = app.login_focus == LoginFocus::Username;
    let username_display = format!("{:<16}", app.login_username);
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(
            format!("{}{}", username_display, cursor),
            styles::field_style(username_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_masked: String = "*".repeat(app.login_password.chars().count().min(16));
    let password_display = format!("{:<16}", password_masked);
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(
            format!("{}{}", password_display, cursor),
            styles::field_style(password_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    // Login button
    let button_focused = app.login_focus == LoginFocus::Button;
    lines.push(Line::from(""));
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(label, styles::field_style(button_focused)),
        Span::raw("]"),
    ]));

    // Error message
    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    // Fixed size dialog matching login screen
    let area = centered_rect_fixed(46, 9, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_tail_pads_short_input() {
        assert_eq!(visible_tail("abc", 6), "abc   ");
    }

    #[test]
    fn test_visible_tail_keeps_end_of_long_input() {
        let shown = visible_tail("https://example.com/a/very/long/path", 10);
        assert_eq!(shown.chars().count(), 10);
        assert!(shown.starts_with('…'));
        assert!(shown.ends_with("long/path"));
    }

    #[test]
    fn test_centered_rect_fixed_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered_rect_fixed(46, 12, area);
        assert_eq!(rect, Rect::new(0, 0, 40, 10));

        let rect = centered_rect_fixed(20, 4, area);
        assert_eq!(rect, Rect::new(10, 3, 20, 4));
    }
}
