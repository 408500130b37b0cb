use super::DialogueEntry;
use serde::Serialize;

/// Characters the game prints per second of slow text.
pub const CHARACTERS_PER_SECOND: f64 = 60.0;

/// Ordered dialogue extracted from one recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    pub source: String,
    pub entries: Vec<DialogueEntry>,
}

#[derive(Serialize)]
struct TranscriptReport<'a> {
    source: &'a str,
    entries: &'a [DialogueEntry],
    total_characters: usize,
    seconds_of_text: f64,
}

impl Transcript {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: DialogueEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_characters(&self) -> usize {
        self.entries.iter().map(DialogueEntry::character_count).sum()
    }

    pub fn seconds_of_text(&self) -> f64 {
        self.total_characters() as f64 / CHARACTERS_PER_SECOND
    }

    pub fn summary(&self) -> String {
        format!(
            "Total characters: {} ({:.2} seconds of text)",
            self.total_characters(),
            self.seconds_of_text()
        )
    }

    /// Entries as plain lines. A blank line closes each paragraph; entries
    /// that scrolled on stay attached to the next one.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            for line in entry.lines() {
                out.push_str(line);
                out.push('\n');
            }
            if !entry.continues {
                out.push('\n');
            }
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&TranscriptReport {
            source: &self.source,
            entries: &self.entries,
            total_characters: self.total_characters(),
            seconds_of_text: self.seconds_of_text(),
        })
    }
}
