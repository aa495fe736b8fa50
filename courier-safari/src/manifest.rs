//! Push package manifest.

use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// Archive path to lowercase hex SHA-1 of the entry bytes.
///
/// Entries are kept sorted so identical inputs serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the digest of `data` under `path`.
    pub fn add(&mut self, path: impl Into<String>, data: &[u8]) {
        self.0.insert(path.into(), digest(data));
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The `manifest.json` bytes.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Lowercase hex SHA-1.
pub fn digest(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest() {
        assert_eq!(digest(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_sorted_output() {
        let mut manifest = Manifest::new();
        manifest.add("website.json", b"{}");
        manifest.add("icon.iconset/icon_16x16.png", b"png");

        let json = String::from_utf8(manifest.to_json().unwrap()).unwrap();
        assert!(json.find("icon.iconset").unwrap() < json.find("website.json").unwrap());
        assert_eq!(manifest.get("website.json"), Some(digest(b"{}").as_str()));
    }

    #[test]
    fn test_deterministic() {
        let build = |order: &[&str]| {
            let mut manifest = Manifest::new();
            for path in order {
                manifest.add(*path, path.as_bytes());
            }
            manifest.to_json().unwrap()
        };

        assert_eq!(build(&["a", "b", "c"]), build(&["c", "a", "b"]));
    }
}
