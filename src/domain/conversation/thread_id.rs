//! Conversation thread identifier

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Maximum length for thread IDs
pub const MAX_THREAD_ID_LENGTH: usize = 128;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._:-]+$").unwrap());

/// Opaque, validated conversation key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_thread_id(&id)?;
        Ok(Self(id))
    }

    /// Fresh identifier for a conversation the caller did not name
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Use the caller's identifier when given, otherwise start a new thread
    pub fn resolve(id: Option<&str>) -> Result<Self, DomainError> {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Ok(Self::generate()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ThreadId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ThreadId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn validate_thread_id(id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::invalid_id("Thread ID cannot be empty"));
    }

    if id.len() > MAX_THREAD_ID_LENGTH {
        return Err(DomainError::invalid_id(format!(
            "Thread ID exceeds maximum length of {} characters",
            MAX_THREAD_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(DomainError::invalid_id(format!(
            "Thread ID '{}' may only contain letters, digits, '.', '_', ':' and '-'",
            id
        )));
    }

    Ok(())
}
