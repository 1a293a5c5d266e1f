use std::fmt;

use serde::{Deserialize, Serialize};

/// Chat identity used as the session key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message previously sent into a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// A `(uid, password)` tuple, the unit of work for token enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialPair {
    pub uid: String,
    pub password: String,
}

impl CredentialPair {
    pub fn new(uid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            password: password.into(),
        }
    }

    /// Builds a pair from raw field values, trimming both and rejecting
    /// empty results.
    pub fn from_parts(uid: &str, password: &str) -> Option<Self> {
        let uid = uid.trim();
        let password = password.trim();
        if uid.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self::new(uid, password))
    }

    /// Like [`CredentialPair::from_parts`], but keeps the values exactly as
    /// given; whitespace only decides whether a field counts as empty.
    pub fn from_untrimmed(uid: String, password: String) -> Option<Self> {
        if uid.trim().is_empty() || password.trim().is_empty() {
            return None;
        }
        Some(Self { uid, password })
    }

    /// Builds a pair from one record of an uploaded credential file.
    ///
    /// Missing or null fields become empty strings; the enrichment pipeline
    /// skips such pairs instead of calling the token service.
    pub fn from_record(record: &serde_json::Value) -> Self {
        let field = |key: &str| {
            record
                .get(key)
                .map(value_to_string)
                .unwrap_or_default()
        };
        Self::new(field("uid"), field("password"))
    }

    pub fn is_complete(&self) -> bool {
        !self.uid.is_empty() && !self.password.is_empty()
    }
}

/// Renders a JSON scalar the way a user would type it: strings without
/// quotes, numbers and booleans in their literal form, null as empty.
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A token returned by the external token service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub token: String,
}

/// A repository on the source-hosting service, addressed by `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

impl Repository {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    File,
    Dir,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub path: String,
    pub kind: ContentKind,
}

impl ContentEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ContentKind::File,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ContentKind::Dir,
        }
    }
}

/// A specific version of a remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileHandle {
    pub path: String,
    /// Optimistic-concurrency token required by the write call.
    pub revision: String,
}

/// File contents together with the revision they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    pub revision: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_rejects_blank_fields() {
        assert_eq!(
            CredentialPair::from_parts("  42 ", " pw "),
            Some(CredentialPair::new("42", "pw"))
        );
        assert_eq!(CredentialPair::from_parts("   ", "pw"), None);
        assert_eq!(CredentialPair::from_parts("42", ""), None);
    }

    #[test]
    fn test_from_untrimmed_keeps_surrounding_spaces() {
        assert_eq!(
            CredentialPair::from_untrimmed("1".to_string(), " secret ".to_string()),
            Some(CredentialPair::new("1", " secret "))
        );
        assert_eq!(
            CredentialPair::from_untrimmed(" \t".to_string(), "pw".to_string()),
            None
        );
    }

    #[test]
    fn test_large_integers_keep_every_digit() {
        let pair = CredentialPair::from_record(&serde_json::from_str::<serde_json::Value>(
            r#"{"uid": 123456789012345678901, "password": "a"}"#,
        )
        .unwrap());
        assert_eq!(pair.uid, "123456789012345678901");
    }

    #[test]
    fn test_from_record_coerces_numbers() {
        let pair = CredentialPair::from_record(&json!({"uid": 123, "password": "abc"}));
        assert_eq!(pair, CredentialPair::new("123", "abc"));
        assert!(pair.is_complete());
    }

    #[test]
    fn test_from_record_missing_fields_are_incomplete() {
        let pair = CredentialPair::from_record(&json!({"uid": "7"}));
        assert!(!pair.is_complete());

        let pair = CredentialPair::from_record(&json!("not an object"));
        assert!(!pair.is_complete());
    }
}
