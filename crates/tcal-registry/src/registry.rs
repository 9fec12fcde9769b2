//! Schedule registry: cache of compiled partitions keyed by definition (or
//! profile schedule) and venue.
//!
//! An entry is current when its partition did not consult defaults, or was
//! built from the active defaults generation. Stale entries are rebuilt on
//! next access. Compilation runs outside the cache lock; when two callers
//! race to build the same key, the first insert wins and both get it.
//!
//! The cache is unbounded unless `max_entries` is set, in which case the
//! least recently used entry is evicted on insert.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tcal_core::{ScheduleError, SharedPartition};
use tcal_defaults::{DefaultsManager, DefaultsSnapshot};
use tcal_definition::{DefaultsData, RuleCompiler, ScheduleCompiler};

use crate::{DefaultsProfileSource, InstrumentProfile, ProfileSource};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    definition: String,
    venue: Option<String>,
}

struct Entry {
    partition: SharedPartition,
    last_used: AtomicU64,
}

impl Entry {
    fn is_current(&self, generation: u64) -> bool {
        self.partition
            .defaults_generation()
            .map_or(true, |g| g == generation)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Upper bound on cached partitions; `None` is unbounded.
    pub max_entries: Option<usize>,
}

pub struct ScheduleRegistry {
    defaults: DefaultsManager,
    compiler: Arc<dyn ScheduleCompiler>,
    profiles: Arc<dyn ProfileSource>,
    options: RegistryOptions,
    cache: RwLock<HashMap<CacheKey, Entry>>,
    clock: AtomicU64,
}

impl std::fmt::Debug for ScheduleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleRegistry")
            .field("entries", &self.len())
            .field("options", &self.options)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ScheduleRegistry {
    /// Registry with the rule compiler and defaults-backed profile source.
    pub fn new(defaults: DefaultsManager, options: RegistryOptions) -> Self {
        Self::with_parts(
            defaults,
            Arc::new(RuleCompiler),
            Arc::new(DefaultsProfileSource),
            options,
        )
    }

    pub fn with_parts(
        defaults: DefaultsManager,
        compiler: Arc<dyn ScheduleCompiler>,
        profiles: Arc<dyn ProfileSource>,
        options: RegistryOptions,
    ) -> Self {
        Self {
            defaults,
            compiler,
            profiles,
            options,
            cache: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    pub fn defaults(&self) -> &DefaultsManager {
        &self.defaults
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Partition for `profile`, optionally scoped to `venue`.
    pub fn get_instance(
        &self,
        profile: &InstrumentProfile,
        venue: Option<&str>,
    ) -> Result<SharedPartition, ScheduleError> {
        let key = CacheKey {
            definition: profile.trading_hours.clone(),
            venue: venue.map(str::to_string),
        };
        self.instance(key, |data| {
            self.profiles.resolve_definition(profile, venue, data)
        })
    }

    /// Partition for a definition string (rule text or `NAME[@VENUE]`).
    pub fn get_instance_for_definition(
        &self,
        definition: &str,
    ) -> Result<SharedPartition, ScheduleError> {
        let key = CacheKey {
            definition: definition.to_string(),
            venue: None,
        };
        self.instance(key, |_| Ok(definition.to_string()))
    }

    /// Ordered venues declared for the profile's schedule.
    pub fn get_trading_venues(
        &self,
        profile: &InstrumentProfile,
    ) -> Result<Vec<String>, ScheduleError> {
        let snapshot = self.defaults.snapshot();
        self.profiles.venues_of(profile, &snapshot.data)
    }

    fn instance<F>(&self, key: CacheKey, resolve: F) -> Result<SharedPartition, ScheduleError>
    where
        F: FnOnce(&DefaultsData) -> Result<String, ScheduleError>,
    {
        let snapshot = self.defaults.snapshot();
        if let Some(hit) = self.lookup(&key, snapshot.generation) {
            return Ok(hit);
        }

        let partition = self.build(&snapshot, resolve)?;

        let mut cache = self.cache.write();
        if let Some(existing) = cache.get(&key) {
            if existing.is_current(snapshot.generation) {
                existing.last_used.store(self.tick(), Ordering::Relaxed);
                return Ok(Arc::clone(&existing.partition));
            }
        }
        tracing::debug!(
            definition = %key.definition,
            venue = ?key.venue,
            generation = snapshot.generation,
            "schedule cached"
        );
        cache.insert(
            key.clone(),
            Entry {
                partition: Arc::clone(&partition),
                last_used: AtomicU64::new(self.tick()),
            },
        );
        self.evict_over_limit(&mut cache, &key);
        Ok(partition)
    }

    fn lookup(&self, key: &CacheKey, generation: u64) -> Option<SharedPartition> {
        let cache = self.cache.read();
        let entry = cache.get(key).filter(|e| e.is_current(generation))?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&entry.partition))
    }

    fn build<F>(
        &self,
        snapshot: &DefaultsSnapshot,
        resolve: F,
    ) -> Result<SharedPartition, ScheduleError>
    where
        F: FnOnce(&DefaultsData) -> Result<String, ScheduleError>,
    {
        let definition = resolve(&snapshot.data)?;
        let partition = self
            .compiler
            .compile(&definition, &snapshot.data, snapshot.generation)?;
        Ok(Arc::new(partition))
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn evict_over_limit(&self, cache: &mut HashMap<CacheKey, Entry>, keep: &CacheKey) {
        let Some(limit) = self.options.max_entries else {
            return;
        };
        while cache.len() > limit.max(1) {
            let victim = cache
                .iter()
                .filter(|(k, _)| *k != keep)
                .min_by_key(|(_, e)| e.last_used.load(Ordering::Relaxed))
                .map(|(k, _)| k.clone());
            let Some(victim) = victim else {
                return;
            };
            tracing::debug!(
                definition = %victim.definition,
                venue = ?victim.venue,
                "schedule evicted"
            );
            cache.remove(&victim);
        }
    }

    // -----------------------------------------------------------------------
    // Defaults passthrough
    // -----------------------------------------------------------------------

    /// See [`DefaultsManager::download_defaults`].
    pub fn download_defaults(&self, config: &str) -> Result<(), ScheduleError> {
        self.defaults.download_defaults(config)
    }

    /// See [`DefaultsManager::set_defaults`].
    pub fn set_defaults(&self, bytes: &[u8]) -> bool {
        self.defaults.set_defaults(bytes)
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Drop entries built from an outdated defaults generation. Returns how
    /// many were removed.
    pub fn purge_stale(&self) -> usize {
        let generation = self.defaults.generation();
        let mut cache = self.cache.write();
        let before = cache.len();
        cache.retain(|_, e| e.is_current(generation));
        before - cache.len()
    }
}
