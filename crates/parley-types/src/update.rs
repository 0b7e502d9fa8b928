use serde::{Deserialize, Serialize};

use crate::transcript::Transcript;

/// A single output field of a pipeline stage.
///
/// `Keep` means "leave whatever the display currently shows", which is a
/// different thing from setting the field to an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Update<T> {
    Keep,
    Set(T),
}

impl<T> Update<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Update::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Update::Set(value) => Some(value),
            Update::Keep => None,
        }
    }
}

impl<T> Default for Update<T> {
    fn default() -> Self {
        Update::Keep
    }
}

impl<T> From<Option<T>> for Update<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Update::Keep, Update::Set)
    }
}

/// What the presentation layer should change after a stage ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiUpdate {
    pub transcript: Update<Transcript>,
    pub status: Update<String>,
    pub send_enabled: Update<bool>,
    pub cancel_enabled: Update<bool>,
    /// Contents of the input field
    pub input: Update<String>,
}

impl UiUpdate {
    /// The explicit "no state transition occurred" result.
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn is_unchanged(&self) -> bool {
        self.transcript.is_keep()
            && self.status.is_keep()
            && self.send_enabled.is_keep()
            && self.cancel_enabled.is_keep()
            && self.input.is_keep()
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Update::Set(transcript);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Update::Set(status.into());
        self
    }

    pub fn with_controls(mut self, send_enabled: bool, cancel_enabled: bool) -> Self {
        self.send_enabled = Update::Set(send_enabled);
        self.cancel_enabled = Update::Set(cancel_enabled);
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Update::Set(input.into());
        self
    }
}
