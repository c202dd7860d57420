//! Chat mentions used as notification addressees.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Telegram usernames: letters, digits and underscores, at most 32 chars.
const MENTION_PATTERN: &str = r"^@[A-Za-z0-9_]{1,32}$";

static MENTION_RE: OnceLock<Regex> = OnceLock::new();

fn mention_re() -> &'static Regex {
    MENTION_RE.get_or_init(|| Regex::new(MENTION_PATTERN).expect("mention pattern is valid"))
}

/// A string that does not look like `@handle`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid mention '{0}': expected @handle")]
pub struct InvalidMention(pub String);

/// Canonical chat handle, e.g. `@alice`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mention(String);

impl Mention {
    /// Validates and wraps a handle. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, InvalidMention> {
        let trimmed = raw.trim();
        if mention_re().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidMention(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Mention {
    type Error = InvalidMention;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Mention> for String {
    fn from(value: Mention) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let mention = Mention::parse("@Alice_Fedyashova").unwrap();
        assert_eq!(mention.as_str(), "@Alice_Fedyashova");
        assert_eq!(Mention::parse("  @bob ").unwrap().to_string(), "@bob");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Mention::parse("alice").is_err());
        assert!(Mention::parse("@").is_err());
        assert!(Mention::parse("@with space").is_err());
        assert!(Mention::parse("@Алиса").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let ok: Mention = serde_json::from_str("\"@carol\"").unwrap();
        assert_eq!(ok.as_str(), "@carol");
        assert!(serde_json::from_str::<Mention>("\"carol\"").is_err());
    }
}
