use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque locator (URL or path) of a file attached to a ticketing card
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attachment(String);

impl Attachment {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn locator(&self) -> &str {
        &self.0
    }
}

impl From<String> for Attachment {
    fn from(locator: String) -> Self {
        Self(locator)
    }
}

impl From<&str> for Attachment {
    fn from(locator: &str) -> Self {
        Self(locator.to_string())
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
