use serde::{Deserialize, Serialize};

/// Stored in place of an assignment when a lecture is added without a `pdf` part.
pub const NO_ASSIGNMENT: &str = "No Assignment";

/// An encoded file payload (poster image, lecture video or assignment).
///
/// Serialized as `{ "base64": "data:<mime>;base64,..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub base64: String,
}

impl Media {
    pub fn new(base64: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
        }
    }

    pub fn no_assignment() -> Self {
        Self::new(NO_ASSIGNMENT)
    }

    pub fn is_no_assignment(&self) -> bool {
        self.base64 == NO_ASSIGNMENT
    }

    pub fn as_str(&self) -> &str {
        &self.base64
    }

    pub fn into_inner(self) -> String {
        self.base64
    }
}

impl From<String> for Media {
    fn from(base64: String) -> Self {
        Self { base64 }
    }
}
