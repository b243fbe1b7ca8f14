//! Mutable document holder driven by editor change events.

use std::sync::Arc;

use parking_lot::RwLock;
use smol_str::SmolStr;

use super::line_index::LineIndex;
use super::snapshot::{DocumentSnapshot, offset_of};
use super::text_utils::byte_offset;
use crate::base::Range;
use crate::error::DocumentError;

/// One content change: a full replacement when `range` is `None`, otherwise
/// a replacement of the text covered by `range`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentChange {
    pub range: Option<Range>,
    pub text: String,
}

impl ContentChange {
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            text: text.into(),
        }
    }

    pub fn ranged(range: Range, text: impl Into<String>) -> Self {
        Self {
            range: Some(range),
            text: text.into(),
        }
    }
}

/// What it takes to revert one applied change.
#[derive(Debug)]
enum Undo {
    /// `inserted` characters at `offset` replaced `removed`.
    Replaced {
        offset: usize,
        inserted: usize,
        removed: String,
        was_ascii: bool,
    },
    /// The whole text was replaced.
    Reset {
        text: Arc<String>,
        lines: Arc<LineIndex>,
        is_ascii: bool,
    },
}

#[derive(Debug)]
struct DocumentState {
    version: i32,
    text: Arc<String>,
    lines: Arc<LineIndex>,
    is_ascii: bool,
}

impl DocumentState {
    fn new(version: i32, text: String) -> Self {
        let lines = LineIndex::from_text(&text);
        let is_ascii = text.is_ascii();
        Self {
            version,
            text: Arc::new(text),
            lines: Arc::new(lines),
            is_ascii,
        }
    }

    /// Swap in a new text. The previous text and index are moved into the
    /// returned undo entry, not copied.
    fn set_text(&mut self, text: &str) -> Undo {
        Undo::Reset {
            text: std::mem::replace(&mut self.text, Arc::new(text.to_owned())),
            lines: std::mem::replace(&mut self.lines, Arc::new(LineIndex::from_text(text))),
            is_ascii: std::mem::replace(&mut self.is_ascii, text.is_ascii()),
        }
    }

    /// Both the text and the index are updated or neither is.
    fn replace(&mut self, offset: usize, length: usize, inserted: &str) -> Result<Undo, DocumentError> {
        let start = byte_offset(&self.text, offset, self.is_ascii);
        let end = offset
            .checked_add(length)
            .and_then(|end| byte_offset(&self.text, end, self.is_ascii));

        Arc::make_mut(&mut self.lines).replace(offset, length, inserted)?;

        let was_ascii = self.is_ascii;
        let mut removed = String::new();
        // The index accepted the bounds, so both byte offsets exist
        if let (Some(start), Some(end)) = (start, end) {
            let text = Arc::make_mut(&mut self.text);
            removed.push_str(&text[start..end]);
            text.replace_range(start..end, inserted);
        }
        self.is_ascii &= inserted.is_ascii();

        Ok(Undo::Replaced {
            offset,
            inserted: inserted.chars().count(),
            removed,
            was_ascii,
        })
    }

    fn undo(&mut self, undo: Undo) {
        match undo {
            Undo::Replaced {
                offset,
                inserted,
                removed,
                was_ascii,
            } => {
                if let Err(err) = self.replace(offset, inserted, &removed) {
                    tracing::error!(offset, inserted, error = %err, "failed to undo document change");
                }
                self.is_ascii = was_ascii;
            }
            Undo::Reset { text, lines, is_ascii } => {
                self.text = text;
                self.lines = lines;
                self.is_ascii = is_ascii;
            }
        }
    }

    fn snapshot(&self, uri: &SmolStr, language_id: &SmolStr) -> DocumentSnapshot {
        DocumentSnapshot::from_parts(
            uri.clone(),
            language_id.clone(),
            self.version,
            Arc::clone(&self.text),
            Arc::clone(&self.lines),
            self.is_ascii,
        )
    }
}

/// The live state of one open document.
///
/// Writers are serialized by an internal lock; readers take a
/// [`DocumentSnapshot`], which shares storage until the next edit copies it.
#[derive(Debug)]
pub struct TextDocument {
    uri: SmolStr,
    language_id: SmolStr,
    state: RwLock<DocumentState>,
}

impl TextDocument {
    pub fn new(
        uri: impl Into<SmolStr>,
        language_id: impl Into<SmolStr>,
        version: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            state: RwLock::new(DocumentState::new(version, text.into())),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.state.read().version
    }

    /// Current content, copied out.
    pub fn content(&self) -> String {
        self.state.read().text.as_str().to_owned()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.state.read().snapshot(&self.uri, &self.language_id)
    }

    pub fn set_text(&self, text: &str) {
        self.state.write().set_text(text);
    }

    /// Replace `length` characters at `offset`. The version is unchanged.
    pub fn replace(&self, offset: usize, length: usize, text: &str) -> Result<(), DocumentError> {
        self.state.write().replace(offset, length, text).map(|_| ())
    }

    /// Apply an ordered batch of change events and move to `version`.
    ///
    /// Ranges are resolved against the text as left by the previous change.
    /// A batch that is not newer than the document is ignored. A failing
    /// change rolls the whole batch back.
    pub fn apply_changes(&self, version: i32, changes: &[ContentChange]) -> Result<(), DocumentError> {
        let mut state = self.state.write();

        if version <= state.version {
            tracing::warn!(
                uri = %self.uri,
                current = state.version,
                received = version,
                "change event with stale version ignored"
            );
            return Err(DocumentError::StaleVersion {
                current: state.version,
                received: version,
            });
        }

        tracing::trace!(uri = %self.uri, changes = changes.len(), "applying changes");
        let mut applied = Vec::with_capacity(changes.len());

        for change in changes {
            match apply_change(&mut state, change) {
                Ok(undo) => applied.push(undo),
                Err(err) => {
                    for undo in applied.into_iter().rev() {
                        state.undo(undo);
                    }
                    return Err(err);
                }
            }
        }

        state.version = version;
        Ok(())
    }
}

fn apply_change(state: &mut DocumentState, change: &ContentChange) -> Result<Undo, DocumentError> {
    let Some(range) = change.range else {
        return Ok(state.set_text(&change.text));
    };

    let start = offset_of(&state.lines, range.start)?;
    let end = offset_of(&state.lines, range.end)?;
    if end < start {
        return Err(DocumentError::InvalidRange { start, end });
    }

    state.replace(start, end - start, &change.text)
}
