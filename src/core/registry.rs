use crate::core::cache::{cache_key, CacheError, RangeCache, CACHE_NAMESPACE};
use crate::core::config::Config;
use crate::core::errors::{Error, Result};
use crate::core::fetchers::FetcherTable;
use crate::core::network_prefix::{
    decode_prefix_set, encode_prefix_set, longest_match, NetworkPrefix, PrefixSet,
};
use crate::core::provider::ProviderId;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/*-------------------------------------------------------------------------------------------------
  Range Snapshot
-------------------------------------------------------------------------------------------------*/

/// Where a provider's current prefixes came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeSource {
    /// Nothing has been loaded yet.
    Empty,
    Cache,
    Fetch,
}

/// Immutable view of one provider's prefixes. Refreshes swap in a new snapshot; existing
/// snapshots are never modified.
#[derive(Clone, Debug)]
pub struct RangeSnapshot {
    prefixes: PrefixSet,
    source: RangeSource,
    updated_at: Option<DateTime<Utc>>,
}

impl RangeSnapshot {
    fn empty() -> Self {
        Self {
            prefixes: PrefixSet::new(),
            source: RangeSource::Empty,
            updated_at: None,
        }
    }

    fn new(prefixes: PrefixSet, source: RangeSource) -> Self {
        Self {
            prefixes,
            source,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn prefixes(&self) -> &PrefixSet {
        &self.prefixes
    }

    pub fn source(&self) -> RangeSource {
        self.source
    }

    /// When the prefixes were adopted; `None` while the snapshot is still [RangeSource::Empty].
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn contains(&self, address: IpAddr) -> bool {
        self.longest_match(address).is_some()
    }

    pub fn longest_match(&self, address: IpAddr) -> Option<NetworkPrefix> {
        longest_match(&self.prefixes, address)
    }
}

/*-------------------------------------------------------------------------------------------------
  Cloud Range Registry
-------------------------------------------------------------------------------------------------*/

struct ProviderSlot {
    snapshot: ArcSwap<RangeSnapshot>,
    // Held for the whole cache-read, fetch, cache-write pipeline of one provider, and by a
    // timed-out fetch until its blocking task returns.
    refresh_lock: Arc<Mutex<()>>,
}

/// Holds the current prefixes of every [ProviderId] and answers "is this a cloud IP?" queries.
///
/// Construct one registry at startup and share it (`Arc<CloudRangeRegistry>`). Queries never
/// block: each provider's prefixes live behind an [ArcSwap] and refreshes replace them whole.
///
/// ```no_run
/// use cloudipranges::{CloudRangeRegistry, Config, FetcherTable, ProviderId};
///
/// let config = Config::new();
/// let registry = CloudRangeRegistry::new(FetcherTable::standard(&config), &config);
/// registry.refresh_sync(&ProviderId::ALL)?;
///
/// assert!(!registry.is_cloud_ip("192.168.1.1", &ProviderId::ALL));
/// # Ok::<(), cloudipranges::Error>(())
/// ```
pub struct CloudRangeRegistry {
    fetchers: FetcherTable,
    slots: BTreeMap<ProviderId, ProviderSlot>,
    cache: RwLock<Option<Arc<dyn RangeCache>>>,
    cache_ttl: Duration,
    io_timeout: Duration,
    fetch_timeout: Duration,
}

impl CloudRangeRegistry {
    /// A registry with every provider present and empty, and no cache attached.
    pub fn new(fetchers: FetcherTable, config: &Config) -> Self {
        let slots = ProviderId::ALL
            .into_iter()
            .map(|provider| {
                let slot = ProviderSlot {
                    snapshot: ArcSwap::from_pointee(RangeSnapshot::empty()),
                    refresh_lock: Arc::new(Mutex::new(())),
                };
                (provider, slot)
            })
            .collect();

        Self {
            fetchers,
            slots,
            cache: RwLock::new(None),
            cache_ttl: config.cache_ttl(),
            io_timeout: config.io_timeout(),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /*-------------------------------------------------------------------------
      Queries
    -------------------------------------------------------------------------*/

    /// Whether `ip` lies in the published ranges of any of `providers`.
    ///
    /// Unparsable input is logged and reported as `false`.
    pub fn is_cloud_ip(&self, ip: &str, providers: &[ProviderId]) -> bool {
        match parse_ip(ip) {
            Ok(address) => self.contains(address, providers),
            Err(error) => {
                error!("{error}");
                false
            }
        }
    }

    pub fn contains(&self, address: IpAddr, providers: &[ProviderId]) -> bool {
        providers
            .iter()
            .filter_map(|provider| self.slots.get(provider))
            .any(|slot| slot.snapshot.load().contains(address))
    }

    /// Every requested provider whose ranges contain `address`, with the most specific
    /// matching prefix of each.
    pub fn matching_providers(
        &self,
        address: IpAddr,
        providers: &[ProviderId],
    ) -> Vec<(ProviderId, NetworkPrefix)> {
        unique(providers)
            .into_iter()
            .filter_map(|provider| {
                let slot = self.slots.get(&provider)?;
                let prefix = slot.snapshot.load().longest_match(address)?;
                Some((provider, prefix))
            })
            .collect()
    }

    /// The current prefixes of `provider`.
    pub fn snapshot(&self, provider: ProviderId) -> Option<Arc<RangeSnapshot>> {
        self.slots
            .get(&provider)
            .map(|slot| slot.snapshot.load_full())
    }

    pub fn has_cache(&self) -> bool {
        self.cache().is_some()
    }

    /*-------------------------------------------------------------------------
      Synchronous Refresh
    -------------------------------------------------------------------------*/

    /// Fetch each provider's ranges directly, bypassing any cache.
    ///
    /// Fails with [Error::Configuration], without touching any provider, when a cache is
    /// attached; use [CloudRangeRegistry::refresh_with_cache] instead. Blocks on network I/O, so
    /// it must not be called from an async task.
    pub fn refresh_sync(&self, providers: &[ProviderId]) -> Result<()> {
        if self.has_cache() {
            return Err(Error::Configuration(
                "synchronous refresh is not available while a cache is attached; \
                 use refresh_with_cache"
                    .to_string(),
            ));
        }

        for provider in unique(providers) {
            let Some(slot) = self.slots.get(&provider) else {
                continue;
            };

            let _guard = match slot.refresh_lock.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!("{provider} refresh already in flight; waiting for it");
                    drop(slot.refresh_lock.blocking_lock());
                    continue;
                }
            };

            let fetched = self
                .fetchers
                .get(provider)
                .ok_or_else(|| Error::fetch(provider, "no fetcher registered"))
                .and_then(|fetcher| fetcher.fetch())
                .and_then(|prefixes| non_empty(provider, prefixes));

            self.apply_fetch_result(provider, slot, fetched);
        }

        Ok(())
    }

    /*-------------------------------------------------------------------------
      Cache-Aware Refresh
    -------------------------------------------------------------------------*/

    /// Bind `cache` to the registry, then load every requested provider through it.
    pub async fn attach_cache(&self, cache: Arc<dyn RangeCache>, providers: &[ProviderId]) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(cache);
        info!("Range cache attached");
        self.refresh_with_cache(providers).await;
    }

    /// Refresh each provider from the cache when it holds a fresh entry, otherwise from the
    /// provider's fetcher, writing fetched ranges back to the cache.
    ///
    /// Providers refresh concurrently and independently; a failure leaves that provider's current
    /// ranges in place. Without an attached cache every provider is fetched directly.
    pub async fn refresh_with_cache(&self, providers: &[ProviderId]) {
        let cache = self.cache();
        let refreshes = unique(providers)
            .into_iter()
            .map(|provider| self.refresh_provider(provider, cache.clone()));
        futures::future::join_all(refreshes).await;
    }

    async fn refresh_provider(&self, provider: ProviderId, cache: Option<Arc<dyn RangeCache>>) {
        let Some(slot) = self.slots.get(&provider) else {
            return;
        };

        let guard = match Arc::clone(&slot.refresh_lock).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("{provider} refresh already in flight; waiting for it");
                drop(slot.refresh_lock.lock().await);
                return;
            }
        };

        if let Some(cache) = &cache {
            match self.read_cache(cache.as_ref(), provider).await {
                Ok(Some(prefixes)) => {
                    info!("Loaded {} {provider} prefixes from cache", prefixes.len());
                    slot.snapshot
                        .store(Arc::new(RangeSnapshot::new(prefixes, RangeSource::Cache)));
                    return;
                }
                Ok(None) => info!("No cached {provider} ranges; fetching"),
                Err(error) => warn!("Failed to read cached {provider} ranges: {error}; fetching"),
            }
        }

        let (_guard, fetched) = self.fetch(provider, guard).await;

        if let (Some(cache), Ok(prefixes)) = (&cache, &fetched) {
            if let Err(error) = self.write_cache(cache.as_ref(), provider, prefixes).await {
                warn!("Failed to cache {provider} ranges: {error}");
            }
        }

        self.apply_fetch_result(provider, slot, fetched);
    }

    /// Run the provider's blocking fetcher on the blocking pool, bounded by the fetch timeout.
    ///
    /// The refresh guard travels with the blocking task and comes back only when the fetch
    /// finishes in time; after a timeout it is released when the abandoned fetch returns.
    async fn fetch(
        &self,
        provider: ProviderId,
        guard: OwnedMutexGuard<()>,
    ) -> (Option<OwnedMutexGuard<()>>, Result<PrefixSet>) {
        let Some(fetcher) = self.fetchers.get(provider) else {
            return (
                Some(guard),
                Err(Error::fetch(provider, "no fetcher registered")),
            );
        };

        let task = tokio::task::spawn_blocking(move || (guard, fetcher.fetch()));
        match tokio::time::timeout(self.fetch_timeout, task).await {
            Err(_) => (
                None,
                Err(Error::Timeout {
                    provider,
                    step: "fetch",
                    millis: self.fetch_timeout.as_millis() as u64,
                }),
            ),
            Ok(Err(error)) => (None, Err(Error::fetch(provider, error))),
            Ok(Ok((guard, fetched))) => (
                Some(guard),
                fetched.and_then(|prefixes| non_empty(provider, prefixes)),
            ),
        }
    }

    async fn read_cache(
        &self,
        cache: &dyn RangeCache,
        provider: ProviderId,
    ) -> Result<Option<PrefixSet>> {
        let value = tokio::time::timeout(self.io_timeout, cache.get(CACHE_NAMESPACE, provider))
            .await
            .map_err(|_| self.timeout(provider, "cache read"))??;

        let Some(value) = value else {
            return Ok(None);
        };

        let prefixes = decode_prefix_set(&value).map_err(|error| CacheError::Malformed {
            key: cache_key(CACHE_NAMESPACE, provider),
            message: error.to_string(),
        })?;

        Ok(Some(prefixes).filter(|prefixes| !prefixes.is_empty()))
    }

    async fn write_cache(
        &self,
        cache: &dyn RangeCache,
        provider: ProviderId,
        prefixes: &PrefixSet,
    ) -> Result<()> {
        let value = encode_prefix_set(prefixes);
        tokio::time::timeout(
            self.io_timeout,
            cache.set(CACHE_NAMESPACE, provider, &value, self.cache_ttl),
        )
        .await
        .map_err(|_| self.timeout(provider, "cache write"))??;
        Ok(())
    }

    /*-------------------------------------------------------------------------
      Private Methods
    -------------------------------------------------------------------------*/

    /// Adopt fetched prefixes; on failure keep whatever the provider already has.
    fn apply_fetch_result(
        &self,
        provider: ProviderId,
        slot: &ProviderSlot,
        fetched: Result<PrefixSet>,
    ) {
        match fetched {
            Ok(prefixes) => {
                info!("Fetched {} {provider} prefixes", prefixes.len());
                slot.snapshot
                    .store(Arc::new(RangeSnapshot::new(prefixes, RangeSource::Fetch)));
            }
            Err(error) => {
                let kept = slot.snapshot.load().prefixes.len();
                error!("Failed to refresh {provider} IP ranges: {error}; keeping {kept} prefixes");
            }
        }
    }

    fn cache(&self) -> Option<Arc<dyn RangeCache>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn timeout(&self, provider: ProviderId, step: &'static str) -> Error {
        Error::Timeout {
            provider,
            step,
            millis: self.io_timeout.as_millis() as u64,
        }
    }
}

impl std::fmt::Debug for CloudRangeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<ProviderId, usize> = self
            .slots
            .iter()
            .map(|(provider, slot)| (*provider, slot.snapshot.load().prefixes.len()))
            .collect();
        f.debug_struct("CloudRangeRegistry")
            .field("fetchers", &self.fetchers)
            .field("prefixes", &counts)
            .field("has_cache", &self.has_cache())
            .finish()
    }
}

/*-------------------------------------------------------------------------------------------------
  Helper Functions
-------------------------------------------------------------------------------------------------*/

pub fn parse_ip(ip: &str) -> Result<IpAddr> {
    ip.parse::<IpAddr>()
        .map_err(|_| Error::InvalidInput(format!("invalid IP address: {ip:?}")))
}

/// Requested providers in a stable order, without duplicates.
fn unique(providers: &[ProviderId]) -> BTreeSet<ProviderId> {
    providers.iter().copied().collect()
}

/// An empty fetch result is a failure; it never replaces existing ranges.
fn non_empty(provider: ProviderId, prefixes: PrefixSet) -> Result<PrefixSet> {
    if prefixes.is_empty() {
        Err(Error::fetch(provider, "no prefixes returned"))
    } else {
        Ok(prefixes)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
