//! Recipient directory: who gets notified.
//!
//! Maps a canonical mention (`@handle`) to the display-name variants that
//! identify that person in the remote system ("Алиса Федяшова", "Алиса",
//! "Алиса Ф."). Matching is exact and case-sensitive.

use std::collections::BTreeMap;
use std::path::Path;

use relay_models::Mention;
use tracing::{debug, info};

use crate::error::{RelayError, Result};

/// Result of [`RecipientDirectory::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Mention → accepted display-name variants.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    entries: BTreeMap<Mention, Vec<String>>,
}

impl RecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a roster file of the form `{ "@handle": ["Full Name", "Name"] }`.
    ///
    /// A missing file yields an empty directory. Empty variant lists and a
    /// variant claimed by two mentions are rejected.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No roster file, starting with an empty team");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let raw: BTreeMap<Mention, Vec<String>> = serde_json::from_str(&content)?;

        let mut directory = Self::new();
        for (mention, variants) in raw {
            if variants.iter().all(|v| v.trim().is_empty()) {
                return Err(RelayError::Roster(format!("{} has no name variants", mention)));
            }
            for variant in variants {
                directory.add(mention.clone(), variant)?;
            }
        }

        info!(
            path = %path.display(),
            mentions = directory.len(),
            "Loaded roster"
        );
        Ok(directory)
    }

    /// Finds the mention whose variants contain `display_name` exactly.
    pub fn resolve(&self, display_name: &str) -> Option<&Mention> {
        self.entries
            .iter()
            .find(|(_, variants)| variants.iter().any(|v| v == display_name))
            .map(|(mention, _)| mention)
    }

    /// Appends a variant, creating the mention entry if absent.
    ///
    /// Re-adding the same pair is a no-op. A variant owned by a different
    /// mention is refused, since resolution would become ambiguous.
    pub fn add(&mut self, mention: Mention, variant: impl Into<String>) -> Result<AddOutcome> {
        let variant = variant.into().trim().to_string();
        if variant.is_empty() {
            return Err(RelayError::Roster("empty name variant".to_string()));
        }

        if let Some(owner) = self.resolve(&variant) {
            if owner != &mention {
                return Err(RelayError::DuplicateVariant {
                    variant,
                    owner: owner.to_string(),
                });
            }
            return Ok(AddOutcome::AlreadyPresent);
        }

        debug!(mention = %mention, variant = %variant, "Adding roster variant");
        self.entries.entry(mention).or_default().push(variant);
        Ok(AddOutcome::Added)
    }

    /// Removes a variant from whichever mention holds it.
    ///
    /// Returns the owning mention, or `None` if no mention has the variant.
    /// The mention entry stays even when its last variant is removed.
    pub fn remove(&mut self, variant: &str) -> Option<Mention> {
        for (mention, variants) in self.entries.iter_mut() {
            if let Some(pos) = variants.iter().position(|v| v == variant) {
                variants.remove(pos);
                debug!(mention = %mention, variant = %variant, "Removed roster variant");
                return Some(mention.clone());
            }
        }
        None
    }

    /// Mentions with at least one variant occurring anywhere in `text`.
    pub fn mentions_in(&self, text: &str) -> Vec<Mention> {
        self.entries
            .iter()
            .filter(|(_, variants)| variants.iter().any(|v| text.contains(v.as_str())))
            .map(|(mention, _)| mention.clone())
            .collect()
    }

    /// Registered mentions in stable order.
    pub fn mentions(&self) -> impl Iterator<Item = &Mention> {
        self.entries.keys()
    }

    /// Variants registered for a mention.
    pub fn variants(&self, mention: &Mention) -> &[String] {
        self.entries.get(mention).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mention(s: &str) -> Mention {
        Mention::parse(s).unwrap()
    }

    fn team() -> RecipientDirectory {
        let mut dir = RecipientDirectory::new();
        dir.add(mention("@alice"), "Алиса Федяшова").unwrap();
        dir.add(mention("@alice"), "Алиса").unwrap();
        dir.add(mention("@maria"), "Мария Петрова").unwrap();
        dir
    }

    #[test]
    fn test_resolve_every_variant() {
        let dir = team();
        assert_eq!(dir.resolve("Алиса Федяшова"), Some(&mention("@alice")));
        assert_eq!(dir.resolve("Алиса"), Some(&mention("@alice")));
        assert_eq!(dir.resolve("Мария Петрова"), Some(&mention("@maria")));
        assert_eq!(dir.resolve("Ксения Торикина"), None);
        assert_eq!(dir.resolve("алиса"), None);
    }

    #[test]
    fn test_add_resolve_remove() {
        let mut dir = RecipientDirectory::new();
        assert_eq!(dir.add(mention("@bob"), "Bob Smith").unwrap(), AddOutcome::Added);
        assert_eq!(dir.resolve("Bob Smith"), Some(&mention("@bob")));

        assert_eq!(dir.remove("Bob Smith"), Some(mention("@bob")));
        assert_eq!(dir.resolve("Bob Smith"), None);
        // Entry survives with an empty variant set.
        assert_eq!(dir.len(), 1);
        assert!(dir.variants(&mention("@bob")).is_empty());
    }

    #[test]
    fn test_remove_keeps_other_variants() {
        let mut dir = team();
        assert_eq!(dir.remove("Алиса Федяшова"), Some(mention("@alice")));
        assert_eq!(dir.resolve("Алиса Федяшова"), None);
        assert_eq!(dir.resolve("Алиса"), Some(&mention("@alice")));
    }

    #[test]
    fn test_remove_unknown() {
        let mut dir = team();
        assert_eq!(dir.remove("Nobody Here"), None);
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut dir = team();
        assert_eq!(
            dir.add(mention("@alice"), "Алиса").unwrap(),
            AddOutcome::AlreadyPresent
        );
        assert_eq!(dir.variants(&mention("@alice")).len(), 2);
    }

    #[test]
    fn test_add_rejects_variant_owned_elsewhere() {
        let mut dir = team();
        let err = dir.add(mention("@other"), "Алиса").unwrap_err();
        assert!(matches!(err, RelayError::DuplicateVariant { .. }));
        assert_eq!(dir.resolve("Алиса"), Some(&mention("@alice")));
    }

    #[test]
    fn test_mentions_in_text() {
        let dir = team();
        let found = dir.mentions_in("<div>Мария Петрова, спроси Алису Федяшову и Алиса ответит</div>");
        assert_eq!(found, vec![mention("@alice"), mention("@maria")]);
        assert!(dir.mentions_in("ничего интересного").is_empty());
    }

    #[test]
    fn test_load_roster_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"@alice": ["Алиса Федяшова", "Алиса"], "@maria": ["Мария Петрова"]}}"#
        )
        .unwrap();

        let dir = RecipientDirectory::load(file.path()).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.resolve("Алиса"), Some(&mention("@alice")));
    }

    #[test]
    fn test_load_rejects_bad_rosters() {
        let mut empty = tempfile::NamedTempFile::new().unwrap();
        write!(empty, r#"{{"@alice": []}}"#).unwrap();
        assert!(RecipientDirectory::load(empty.path()).is_err());

        let mut dup = tempfile::NamedTempFile::new().unwrap();
        write!(dup, r#"{{"@alice": ["Alex"], "@alex": ["Alex"]}}"#).unwrap();
        assert!(RecipientDirectory::load(dup.path()).is_err());

        let mut bad_mention = tempfile::NamedTempFile::new().unwrap();
        write!(bad_mention, r#"{{"alice": ["Alice"]}}"#).unwrap();
        assert!(RecipientDirectory::load(bad_mention.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let roster = RecipientDirectory::load(&dir.path().join("team.json")).unwrap();
        assert!(roster.is_empty());
    }
}
