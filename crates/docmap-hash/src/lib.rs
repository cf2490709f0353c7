//! Domain-separated BLAKE3 hashing for docmap identities.
//!
//! The identity of a document is the digest of its hashable-field values
//! joined with a fixed delimiter. This crate owns the digest step; the
//! assembly of the hash-input string (path resolution, canonical value
//! rendering, ordering) lives in `docmap-schema`.

use docmap_types::Identity;

/// Delimiter between field values in the assembled hash-input string.
pub const VALUE_DELIMITER: &str = "|";

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag that is prepended to every computation,
/// so identical bytes hashed for different purposes never collide.
pub struct IdentityHasher {
    domain: &'static str,
}

impl IdentityHasher {
    /// Hasher for document identities.
    pub const DOCUMENT: Self = Self {
        domain: "docmap-identity-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Identity {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Identity::from_digest(*hasher.finalize().as_bytes())
    }

    /// Join pre-rendered value strings with [`VALUE_DELIMITER`] and hash the
    /// UTF-8 bytes of the result.
    ///
    /// Only the values participate; the caller is responsible for supplying
    /// them in declared path order (the join is order-sensitive).
    pub fn hash_values<S: AsRef<str>>(&self, values: &[S]) -> Identity {
        let joined = values
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(VALUE_DELIMITER);
        self.hash(joined.as_bytes())
    }

    /// Verify that data produces the expected identity.
    pub fn verify(&self, data: &[u8], expected: &Identity) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_is_deterministic() {
        let id1 = IdentityHasher::DOCUMENT.hash(b"Kitty|Domestic Shorthair");
        let id2 = IdentityHasher::DOCUMENT.hash(b"Kitty|Domestic Shorthair");
        assert_eq!(id1, id2);
    }

    #[test]
    fn hash_values_joins_with_delimiter() {
        let from_values = IdentityHasher::DOCUMENT.hash_values(&["Kitty", "Domestic Shorthair"]);
        let from_bytes = IdentityHasher::DOCUMENT.hash(b"Kitty|Domestic Shorthair");
        assert_eq!(from_values, from_bytes);
    }

    #[test]
    fn value_order_changes_the_digest() {
        let ab = IdentityHasher::DOCUMENT.hash_values(&["X", "Y"]);
        let ba = IdentityHasher::DOCUMENT.hash_values(&["Y", "X"]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn different_domains_produce_different_digests() {
        let custom = IdentityHasher::new("docmap-test-v1");
        assert_ne!(
            custom.hash(b"same bytes"),
            IdentityHasher::DOCUMENT.hash(b"same bytes")
        );
    }

    #[test]
    fn verify_detects_tampering() {
        let id = IdentityHasher::DOCUMENT.hash(b"original");
        assert!(IdentityHasher::DOCUMENT.verify(b"original", &id));
        assert!(!IdentityHasher::DOCUMENT.verify(b"tampered", &id));
    }

    proptest! {
        #[test]
        fn digest_is_a_pure_function(data: Vec<u8>) {
            let id1 = IdentityHasher::DOCUMENT.hash(&data);
            let id2 = IdentityHasher::DOCUMENT.hash(&data);
            prop_assert_eq!(id1, id2);
        }

        #[test]
        fn distinct_single_values_rarely_collide(a in "\\PC{1,32}", b in "\\PC{1,32}") {
            prop_assume!(a != b);
            let ha = IdentityHasher::DOCUMENT.hash_values(&[&a]);
            let hb = IdentityHasher::DOCUMENT.hash_values(&[&b]);
            prop_assert_ne!(ha, hb);
        }
    }
}
