//! Hash containers used by the schema and the mapper, based on *hashbrown*
//! with a fixed *foldhash* seed.
//!
//! Member and key names are hashed on every plan compilation, so the state
//! is fixed (no per-map random seed) to keep iteration of debug output and
//! test expectations reproducible between runs.

use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x5EC7_10A2_D1C3_9B47);

/// A hasher whose results only depend on the input.
pub type FixedHasher = FoldHasher<'static>;

/// Build state producing [`FixedHasher`]s.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// Containers

/// A [`hashbrown::HashMap`] using [`FixedHashState`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`].
pub type HashSet<T> = hashbrown::HashSet<T, FixedHashState>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;

    use super::{FixedHashState, HashMap};

    #[test]
    fn fixed_state_is_stable() {
        let a = FixedHashState.hash_one("Line1");
        let b = FixedHashState.hash_one("Line1");
        assert_eq!(a, b);
    }

    #[test]
    fn map_with_fixed_state() {
        let mut map: HashMap<&str, i32> = HashMap::default();
        map.insert("Id", 1);
        assert_eq!(map.get("Id"), Some(&1));
    }
}
