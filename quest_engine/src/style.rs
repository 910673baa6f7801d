//! Styling helpers for terminal output.
//!
//! The [`QuestStyle`] trait applies ANSI styling via the `colored` crate. It is
//! implemented for `&str` and `String` so literals and formatted text style the same way.

use colored::{ColoredString, Colorize};

/// Convenience trait for applying color and style to quest output.
pub trait QuestStyle {
    fn section_style(&self) -> ColoredString;
    fn quest_style(&self) -> ColoredString;
    fn step_style(&self) -> ColoredString;
    fn done_style(&self) -> ColoredString;
    fn zone_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
}

impl QuestStyle for &str {
    fn section_style(&self) -> ColoredString {
        let bracketed = format!("[{self}]");
        bracketed.truecolor(75, 80, 75)
    }
    fn quest_style(&self) -> ColoredString {
        self.truecolor(220, 40, 220).bold()
    }
    fn step_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn done_style(&self) -> ColoredString {
        self.truecolor(13, 130, 60).strikethrough()
    }
    fn zone_style(&self) -> ColoredString {
        self.truecolor(223, 77, 10)
    }
    fn error_style(&self) -> ColoredString {
        self.truecolor(230, 30, 30)
    }
}

impl QuestStyle for String {
    fn section_style(&self) -> ColoredString {
        self.as_str().section_style()
    }
    fn quest_style(&self) -> ColoredString {
        self.as_str().quest_style()
    }
    fn step_style(&self) -> ColoredString {
        self.as_str().step_style()
    }
    fn done_style(&self) -> ColoredString {
        self.as_str().done_style()
    }
    fn zone_style(&self) -> ColoredString {
        self.as_str().zone_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
}
