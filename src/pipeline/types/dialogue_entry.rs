use serde::Serialize;

/// One finalized textbox. Never mutated after it is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueEntry {
    pub line1: String,
    pub line2: String,
    /// Frame whose transition flushed this entry.
    pub frame: u64,
    /// The box scrolled on after this entry, so the next entry belongs to the same paragraph.
    pub continues: bool,
}

impl DialogueEntry {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>, frame: u64) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
            frame,
            continues: false,
        }
    }

    pub fn with_continuation(mut self, continues: bool) -> Self {
        self.continues = continues;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.line1.is_empty() && self.line2.is_empty()
    }

    /// Displayed characters, spaces included.
    pub fn character_count(&self) -> usize {
        self.line1.chars().count() + self.line2.chars().count()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        [self.line1.as_str(), self.line2.as_str()]
            .into_iter()
            .filter(|line| !line.is_empty())
    }
}
