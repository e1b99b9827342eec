//! Document and fragment types

/// Characters of plain text kept as lead text when a source has no pages
pub const LEAD_TEXT_CHARS: usize = 10_000;

/// A program document whose text has been extracted
///
/// The text is owned and never mutated after extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    name: String,
    text: String,
    lead_text: Option<String>,
}

impl Document {
    /// Create a document from its identifier (file name) and full text
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            lead_text: None,
        }
    }

    /// Attach a lead-text sample (first pages of a paginated source)
    pub fn with_lead_text(mut self, lead_text: impl Into<String>) -> Self {
        self.lead_text = Some(lead_text.into());
        self
    }

    /// Document identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full extracted text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of characters (not bytes) in the full text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Lead text used for metadata extraction
    ///
    /// Falls back to the first [`LEAD_TEXT_CHARS`] characters of the full
    /// text when no sample was attached.
    pub fn lead_text(&self) -> String {
        match &self.lead_text {
            Some(lead) => lead.clone(),
            None => truncate_chars(&self.text, LEAD_TEXT_CHARS).to_string(),
        }
    }
}

/// A bounded, self-contained piece of a document's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// 1-based position in the sequence
    pub index: usize,
    /// Total number of fragments produced for the document
    pub total: usize,
    /// Start of the source window, in characters
    pub start: usize,
    /// End (exclusive) of the source window, in characters
    pub end: usize,
    /// Trimmed copy of the window's text
    pub text: String,
}

impl Fragment {
    /// Number of characters in the fragment text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Return the prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
