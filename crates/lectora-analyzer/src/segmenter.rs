//! Splits program text into overlapping, model-sized fragments
//!
//! Window boundaries prefer a paragraph break near the end of the window,
//! then a sentence break, then a hard cut. All positions are character
//! offsets, never byte offsets, so multi-byte text is never split inside
//! a code point.

use lectora_domain::Fragment;
use tracing::{debug, info};

/// How far back from the window end to look for a paragraph or sentence break
pub const BOUNDARY_SEARCH_CHARS: usize = 500;

const PARAGRAPH_BREAK: [char; 2] = ['\n', '\n'];
const SENTENCE_BREAK: [char; 2] = ['.', ' '];

/// Splits text into overlapping fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    max_chars: usize,
    overlap_chars: usize,
}

impl Segmenter {
    /// Create a new segmenter
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            overlap_chars,
        }
    }

    /// Split `text` into fragments
    ///
    /// Text that fits in one window is returned whole and untrimmed. Longer
    /// text is cut window by window; each window is trimmed and skipped if
    /// nothing but whitespace remains. The result depends only on the
    /// inputs.
    pub fn segment(&self, text: &str) -> Vec<Fragment> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        if len <= self.max_chars {
            debug!("Text fits in a single fragment ({} chars)", len);
            return vec![Fragment {
                index: 1,
                total: 1,
                start: 0,
                end: len,
                text: text.to_string(),
            }];
        }

        let mut windows: Vec<(usize, usize, String)> = Vec::new();
        let mut start = 0;

        loop {
            let end = self.window_end(&chars, start);

            let piece: String = chars[start..end].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                debug!(
                    "Fragment {}: {} chars (position {} - {})",
                    windows.len() + 1,
                    trimmed.chars().count(),
                    start,
                    end
                );
                windows.push((start, end, trimmed.to_string()));
            }

            if end >= len {
                break;
            }

            // Overlap must never move the window backwards
            let next = end.saturating_sub(self.overlap_chars);
            start = if next <= start { end } else { next };
        }

        let total = windows.len();
        if total > 0 {
            let average = windows.iter().map(|(_, _, t)| t.chars().count()).sum::<usize>() / total;
            info!(
                "Text split into {} fragments (average {} chars/fragment)",
                total, average
            );
        }

        windows
            .into_iter()
            .enumerate()
            .map(|(i, (start, end, text))| Fragment {
                index: i + 1,
                total,
                start,
                end,
                text,
            })
            .collect()
    }

    /// End (exclusive) of the window starting at `start`
    fn window_end(&self, chars: &[char], start: usize) -> usize {
        let len = chars.len();
        let end = (start + self.max_chars).min(len);
        if end >= len {
            return len;
        }

        let search_from = start.max(end.saturating_sub(BOUNDARY_SEARCH_CHARS));
        let window = &chars[search_from..end];

        if let Some(i) = rfind_pair(window, PARAGRAPH_BREAK) {
            // Keep both newlines in this fragment
            return search_from + i + 2;
        }
        if let Some(i) = rfind_pair(window, SENTENCE_BREAK) {
            // Cut right after the period
            return search_from + i + 1;
        }
        end
    }
}

/// Position of the last occurrence of `pair` lying entirely inside `haystack`
fn rfind_pair(haystack: &[char], pair: [char; 2]) -> Option<usize> {
    haystack.windows(2).rposition(|w| w[0] == pair[0] && w[1] == pair[1])
}
