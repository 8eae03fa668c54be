//! Clipboard writes through the terminal (OSC 52).
//!
//! Works over SSH and without a display server. Terminals that do not
//! support OSC 52 ignore the sequence; there is no confirmation either way.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Escape sequence asking the terminal to put `text` on the system clipboard
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

pub fn copy(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(osc52_sequence(text).as_bytes())?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(
            osc52_sequence("https://tiny.example/abc"),
            "\x1b]52;c;aHR0cHM6Ly90aW55LmV4YW1wbGUvYWJj\x07"
        );
    }

    #[test]
    fn test_osc52_empty() {
        assert_eq!(osc52_sequence(""), "\x1b]52;c;\x07");
    }
}
