//! Content fingerprinting for change detection.
//!
//! The worker source may be edited by tooling that emits no change
//! notifications, so the supervisor polls: each cycle it recomputes a
//! digest of the file bytes and compares it with the previous one. The
//! digest is used for equality only and is never persisted.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// SHA-256 digest of a source file's bytes.
///
/// A missing file yields the [`Fingerprint::absent`] sentinel, which is
/// equal only to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Sentinel for a file that does not exist.
    #[must_use]
    pub const fn absent() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.0.is_empty()
    }

    fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            write!(f, "<absent>")
        } else {
            write!(f, "{}", &self.0[..12.min(self.0.len())])
        }
    }
}

/// Digest of the file at `path`, or the absent sentinel if it cannot be
/// read.
pub async fn fingerprint(path: &Path) -> Fingerprint {
    match tokio::fs::read(path).await {
        Ok(bytes) => Fingerprint::of_bytes(&bytes),
        Err(_) => Fingerprint::absent(),
    }
}

/// Whether the file at `path` differs from `previous`, returning the
/// current fingerprint alongside so the caller can carry it forward.
pub async fn has_changed(path: &Path, previous: &Fingerprint) -> (bool, Fingerprint) {
    let current = fingerprint(path).await;
    (current != *previous, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            Fingerprint::of_bytes(b"abc").0,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn missing_file_is_absent() {
        let fp = fingerprint(Path::new("/nonexistent/source.py")).await;
        assert!(fp.is_absent());
    }

    #[tokio::test]
    async fn detects_content_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.py");
        tokio::fs::write(&path, "print(1)\n").await.unwrap();

        let first = fingerprint(&path).await;
        let (changed, same) = has_changed(&path, &first).await;
        assert!(!changed);
        assert_eq!(same, first);

        tokio::fs::write(&path, "print(2)\n").await.unwrap();
        let (changed, second) = has_changed(&path, &first).await;
        assert!(changed);
        assert_ne!(second, first);
    }

    #[tokio::test]
    async fn deletion_counts_as_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.py");
        tokio::fs::write(&path, "x = 1\n").await.unwrap();

        let before = fingerprint(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();

        let (changed, after) = has_changed(&path, &before).await;
        assert!(changed);
        assert!(after.is_absent());
    }
}
