use std::hash::{Hash, Hasher};

use meter::{Key, KeyHasher};

/// A type that can hash itself.
///
/// In high-performance use cases, an object can pre-hash itself, or memoize
/// its hash value, when it is anticipated that the object will be hashed
/// multiple times.  Rather than the standard library `Hash` trait,
/// `Hashable` exposes an interface that forces objects to hash themselves
/// entirely, providing only the resulting 8-byte hash.
///
/// As a key may sometimes need to be rehashed, the same hashing algorithm
/// used to pre-generate the hash must be used when rehashing it.  All
/// implementors declare that algorithm via the `Hasher` associated type.
pub trait Hashable: Hash {
    /// The hasher implementation used internally.
    type Hasher: Hasher + Default;

    /// Generates the hash of this object.
    #[inline]
    fn hashable(&self) -> u64 {
        let mut hasher = Self::Hasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Hashable for Key {
    type Hasher = KeyHasher;

    #[inline]
    fn hashable(&self) -> u64 {
        self.fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use meter::{Key, Label};

    use super::Hashable;

    #[test]
    fn test_key_hashable_is_fingerprint() {
        let key = Key::from_parts("x", vec![Label::new("a", "1")]);
        assert_eq!(key.hashable(), key.fingerprint());
    }
}
