use ratatui::style::{Color, Modifier, Style};

// Color palette
pub const BRAND: Color = Color::Rgb(80, 150, 200);
pub const LINK: Color = Color::Rgb(110, 190, 120);
pub const KEY: Color = Color::Rgb(210, 170, 70);
pub const ERROR: Color = Color::Rgb(200, 72, 72);
pub const DIM: Color = Color::Rgb(130, 130, 140);
pub const FOCUS_BG: Color = Color::Rgb(44, 50, 70);
pub const BAR_BG: Color = Color::Rgb(28, 30, 38);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(BRAND).add_modifier(Modifier::BOLD)
}

/// Input fields and buttons, highlighted while focused
pub fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().bg(FOCUS_BG).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

/// Provider selector entry
pub fn choice_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(BRAND)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        muted_style()
    }
}

pub fn muted_style() -> Style {
    Style::default().fg(DIM)
}

pub fn highlight_style() -> Style {
    Style::default().fg(KEY)
}

pub fn link_style() -> Style {
    Style::default().fg(LINK).add_modifier(Modifier::BOLD)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(BRAND)
    } else {
        Style::default().fg(DIM)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(BAR_BG).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(KEY).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}
