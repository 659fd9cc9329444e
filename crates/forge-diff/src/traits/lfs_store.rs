//! Lookup of Git LFS objects known to the repository.

use std::collections::HashSet;

/// Answers whether an LFS object id is stored for the repository being diffed.
///
/// The parser only flags a file as an LFS pointer when the pointer's oid is
/// known here; unknown oids are treated as ordinary text.
pub trait LfsObjectStore {
    /// `oid` is the 64 character hex sha256 from the pointer file.
    fn contains(&self, oid: &str) -> bool;
}

/// A store that knows no LFS objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLfsObjects;

impl LfsObjectStore for NoLfsObjects {
    fn contains(&self, _oid: &str) -> bool {
        false
    }
}

impl LfsObjectStore for HashSet<String> {
    fn contains(&self, oid: &str) -> bool {
        HashSet::contains(self, oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_lfs_objects() {
        assert!(!NoLfsObjects.contains("abc"));
    }

    #[test]
    fn test_hash_set_store() {
        let store: HashSet<String> = ["abc".to_string()].into_iter().collect();
        assert!(LfsObjectStore::contains(&store, "abc"));
        assert!(!LfsObjectStore::contains(&store, "def"));
    }
}
