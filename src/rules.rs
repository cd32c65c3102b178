//! Persisted block rules.
//!
//! Loaded once at startup and read-only afterwards. The scorer does not
//! consult these sets yet; they ride along as configuration input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file: {0}")]
    Io(#[from] io::Error),

    #[error("rules file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub blocked_addresses: BTreeSet<String>,
    #[serde(default)]
    pub blocked_ports: BTreeSet<u16>,
    #[serde(default)]
    pub blocked_protocols: BTreeSet<String>,
}

impl RuleSet {
    pub fn load(path: &Path) -> Result<RuleSet, RulesError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), RulesError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load the rules file, writing an empty one first if none exists.
    /// A present-but-corrupt file is returned as an error for the caller
    /// to surface; monitoring still works on an empty fallback.
    pub fn load_or_init(path: &Path) -> Result<RuleSet, RulesError> {
        if !path.exists() {
            let rules = RuleSet::default();
            rules.save(path)?;
            return Ok(rules);
        }
        RuleSet::load(path)
    }

    pub fn is_empty(&self) -> bool {
        self.blocked_addresses.is_empty()
            && self.blocked_ports.is_empty()
            && self.blocked_protocols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_init_creates_empty_file_when_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        let rules = RuleSet::load_or_init(&path).expect("load_or_init");
        assert!(rules.is_empty());
        assert!(path.exists());

        // The persisted file must itself parse back to the empty set.
        let reloaded = RuleSet::load(&path).expect("reload");
        assert_eq!(reloaded, rules);
    }

    #[test]
    fn test_load_surfaces_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        fs::write(&path, "{not json").expect("write");
        let err = RuleSet::load_or_init(&path).unwrap_err();
        assert!(matches!(err, RulesError::Parse(_)));
    }

    #[test]
    fn test_save_then_load_preserves_sets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        let mut rules = RuleSet::default();
        rules.blocked_addresses.insert("203.0.113.9".to_string());
        rules.blocked_ports.insert(23);
        rules.blocked_protocols.insert("ICMP".to_string());
        rules.save(&path).expect("save");
        assert_eq!(RuleSet::load(&path).expect("load"), rules);
    }

    #[test]
    fn test_missing_keys_default_to_empty_sets() {
        let rules: RuleSet =
            serde_json::from_str(r#"{"blocked_ports": [22]}"#).expect("parse");
        assert!(rules.blocked_addresses.is_empty());
        assert_eq!(rules.blocked_ports.len(), 1);
        assert!(rules.blocked_protocols.is_empty());
    }
}
