use serde::Serialize;
use std::fmt;

/// Rendering phase of the dialogue textbox in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextboxState {
    Closed,
    Open,
    Scroll1,
    Scroll2,
    Scroll3,
    BigText,
}

impl TextboxState {
    /// A static box whose text can be captured.
    pub fn is_open_like(self) -> bool {
        matches!(self, TextboxState::Open | TextboxState::BigText)
    }

    pub fn is_scroll(self) -> bool {
        matches!(
            self,
            TextboxState::Scroll1 | TextboxState::Scroll2 | TextboxState::Scroll3
        )
    }
}

impl fmt::Display for TextboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextboxState::Closed => "CLOSED",
            TextboxState::Open => "OPEN",
            TextboxState::Scroll1 => "SCROLL_1",
            TextboxState::Scroll2 => "SCROLL_2",
            TextboxState::Scroll3 => "SCROLL_3",
            TextboxState::BigText => "BIG_TEXT",
        };
        write!(f, "{}", name)
    }
}
