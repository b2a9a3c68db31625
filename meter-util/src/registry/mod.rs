//! High-performance metrics storage.

mod storage;
use std::collections::HashMap as StdHashMap;
use std::hash::BuildHasherDefault;
use std::iter::repeat_with;
use std::sync::{PoisonError, RwLock};

use hashbrown::{hash_map::RawEntryMut, HashMap};
pub use storage::{
    CounterStorage, FloatCounterStorage, GaugeStorage, HistogramStorage, Storage, SummaryStorage,
};

use crate::Hashable;

type RegistryHashMap<K, V> = HashMap<K, V, BuildHasherDefault<<K as Hashable>::Hasher>>;

/// A concurrent mapping from metric identity to a shared metric instance.
///
/// `Registry` maintains a central listing of metrics mapped by key, with
/// get-or-create semantics: repeated lookups with an equal key always yield
/// the same instance, even under racing first lookups.  Each registry is
/// monomorphic over one instance kind via its [`Storage`]; a façade that
/// supports several kinds composes several registries.
///
/// The mapping is sharded by the key's pre-computed 64-bit fingerprint, and
/// each shard is a reader/writer-locked hash map.  Lookups of existing
/// identities take only a shard read lock, so reads never block other reads;
/// a write lock is taken briefly to publish a brand-new identity.
///
/// ## Performance
///
/// `Registry` is optimized for reads.
pub struct Registry<K, S>
where
    K: Hashable,
    S: Storage<K>,
{
    shards: Vec<RwLock<RegistryHashMap<K, S::Instance>>>,
    shard_mask: usize,
    storage: S,
}

impl<K, S> Registry<K, S>
where
    K: Hashable,
    S: Storage<K>,
{
    /// Creates a new `Registry`.
    pub fn new(storage: S) -> Self {
        let shard_count = std::cmp::max(1, num_cpus::get()).next_power_of_two();
        let shard_mask = shard_count - 1;
        let shards = repeat_with(|| RwLock::new(RegistryHashMap::default()))
            .take(shard_count)
            .collect();

        Self { shards, shard_mask, storage }
    }

    #[inline]
    fn get_hash_and_shard(&self, key: &K) -> (u64, &RwLock<RegistryHashMap<K, S::Instance>>) {
        let hash = key.hashable();

        // SAFETY: We initialize the vector of shards with a power-of-two
        // length, and `self.shard_mask` is that length minus one, so the
        // masked hash can never index out of bounds.
        let shard = unsafe { self.shards.get_unchecked(hash as usize & self.shard_mask) };

        (hash, shard)
    }

    /// Visits every metric stored in this registry.
    ///
    /// This operation does not lock the entire registry, but proceeds
    /// directly through the shards that are kept internally.  All shards will
    /// be visited, but a metric that is added after the call to `visit`
    /// starts, and before it finishes, may or may not be observed.
    pub fn visit<F>(&self, mut collect: F)
    where
        F: FnMut(&K, &S::Instance),
    {
        for shard in self.shards.iter() {
            let shard_read = shard.read().unwrap_or_else(PoisonError::into_inner);
            for (key, instance) in shard_read.iter() {
                collect(key, instance);
            }
        }
    }
}

impl<K, S> Registry<K, S>
where
    K: Clone + Eq + Hashable,
    S: Storage<K>,
{
    /// Gets a copy of an existing instance.
    pub fn get(&self, key: &K) -> Option<S::Instance> {
        let (hash, shard) = self.get_hash_and_shard(key);
        let shard_read = shard.read().unwrap_or_else(PoisonError::into_inner);
        shard_read.raw_entry().from_key_hashed_nocheck(hash, key).map(|(_, v)| v.clone())
    }

    /// Gets or creates the instance for the given key.
    ///
    /// The `op` function is called with the instance under `key`, with the
    /// instance first being created via the registry's storage if it does
    /// not already exist.
    pub fn get_or_create<O, V>(&self, key: &K, op: O) -> V
    where
        O: FnOnce(&S::Instance) -> V,
    {
        self.get_or_create_with(key, || self.storage.create(key), op)
    }

    /// Gets or creates the instance for the given key, constructing it with
    /// `create` on a miss.
    ///
    /// The instance is constructed before the shard write lock is taken, so
    /// slower construction work -- bucket ladders and the like -- never
    /// happens under the lock.  If a concurrent caller has published an
    /// instance for the same key in the meantime, the freshly built instance
    /// is discarded without ever being observable, and the winner is used:
    /// at most one instance per identity, ever.
    pub fn get_or_create_with<C, O, V>(&self, key: &K, create: C, op: O) -> V
    where
        C: FnOnce() -> S::Instance,
        O: FnOnce(&S::Instance) -> V,
    {
        let (hash, shard) = self.get_hash_and_shard(key);

        {
            let shard_read = shard.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((_, v)) = shard_read.raw_entry().from_key_hashed_nocheck(hash, key) {
                return op(v);
            }
        }

        let instance = create();

        let mut shard_write = shard.write().unwrap_or_else(PoisonError::into_inner);
        match shard_write.raw_entry_mut().from_key_hashed_nocheck(hash, key) {
            RawEntryMut::Occupied(entry) => op(entry.get()),
            RawEntryMut::Vacant(entry) => {
                let (_, v) = entry.insert_hashed_nocheck(hash, key.clone(), instance);
                op(v)
            }
        }
    }

    /// Gets a map of all present instances, mapped by key.
    ///
    /// This map is a point-in-time snapshot of the registry.
    pub fn handles(&self) -> StdHashMap<K, S::Instance> {
        let mut handles = StdHashMap::new();
        self.visit(|k, v| {
            handles.insert(k.clone(), v.clone());
        });
        handles
    }
}
