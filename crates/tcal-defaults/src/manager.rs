//! Defaults manager: holds the active defaults payload and refreshes it.
//!
//! The active payload is an `Arc<DefaultsSnapshot>` behind a `RwLock`;
//! readers clone the `Arc` and release the lock immediately. Every install
//! bumps the generation by one. A failed fetch or an invalid payload leaves
//! the active snapshot and generation untouched.
//!
//! Refresh runs as a tokio task driven by `tokio::time::interval`, so tests
//! can pause and advance the clock. Each configured task carries an epoch;
//! reconfiguring or shutting down bumps the epoch and signals stop, and a
//! fetch that completes for an outdated epoch is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use tcal_core::ScheduleError;
use tcal_definition::{DefaultsData, BUILTIN_DEFAULTS};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{DefaultsFetcher, DownloadConfig};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One installed defaults payload.
#[derive(Debug)]
pub struct DefaultsSnapshot {
    pub generation: u64,
    pub data: DefaultsData,
    /// sha256 hex of the raw payload bytes.
    pub digest: String,
    pub installed_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Fetching,
    Applied,
    FetchFailed,
}

/// Observable refresh state, published on a watch channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshStatus {
    pub phase: RefreshPhase,
    pub generation: u64,
    pub source: Option<String>,
    pub last_fetch: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ManagerOptions {
    /// Remote location used by the `auto` download config. `None` means the
    /// built-in payload is the auto location.
    pub auto_url: Option<String>,
    pub auto_period: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            auto_url: None,
            auto_period: Duration::from_secs(24 * 3600),
        }
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DefaultsManager {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn DefaultsFetcher>,
    runtime: tokio::runtime::Handle,
    options: ManagerOptions,
    active: RwLock<Arc<DefaultsSnapshot>>,
    config: Mutex<DownloadConfig>,
    task: Mutex<Option<RefreshTask>>,
    epoch: AtomicU64,
    status: watch::Sender<RefreshStatus>,
}

struct RefreshTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    fn stop(self) {
        let _ = self.stop.send(true);
        drop(self.handle);
    }
}

impl DefaultsManager {
    /// Manager with the built-in payload installed as generation 0.
    pub fn new(
        fetcher: Arc<dyn DefaultsFetcher>,
        runtime: tokio::runtime::Handle,
        options: ManagerOptions,
    ) -> Result<Self, ScheduleError> {
        let data = DefaultsData::parse(BUILTIN_DEFAULTS)?;
        let initial = Arc::new(DefaultsSnapshot {
            generation: 0,
            data,
            digest: sha256_hex(BUILTIN_DEFAULTS),
            installed_at: Utc::now(),
        });
        let (status, _) = watch::channel(RefreshStatus {
            phase: RefreshPhase::Idle,
            generation: 0,
            source: None,
            last_fetch: None,
            last_error: None,
        });
        Ok(Self {
            inner: Arc::new(Inner {
                fetcher,
                runtime,
                options,
                active: RwLock::new(initial),
                config: Mutex::new(DownloadConfig::Disabled),
                task: Mutex::new(None),
                epoch: AtomicU64::new(0),
                status,
            }),
        })
    }

    /// Active payload. The returned snapshot never changes.
    pub fn snapshot(&self) -> Arc<DefaultsSnapshot> {
        Arc::clone(&self.inner.active.read())
    }

    pub fn generation(&self) -> u64 {
        self.inner.active.read().generation
    }

    pub fn download_config(&self) -> DownloadConfig {
        self.inner.config.lock().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.inner.status.subscribe()
    }

    /// Validate and install `bytes`. `false` leaves everything unchanged.
    pub fn set_defaults(&self, bytes: &[u8]) -> bool {
        self.try_set_defaults(bytes).is_ok()
    }

    /// [`set_defaults`](Self::set_defaults) returning the new generation or
    /// the validation error.
    pub fn try_set_defaults(&self, bytes: &[u8]) -> Result<u64, ScheduleError> {
        let generation = self
            .inner
            .install(bytes, None, None)
            .map_err(|err| {
                tracing::warn!(error = %err, "defaults payload rejected");
                err
            })?
            .unwrap_or_default();
        Ok(generation)
    }

    /// Apply a download config string (see [`DownloadConfig`]).
    ///
    /// A malformed string is rejected and the current configuration, task
    /// and data stay as they are. Otherwise any running refresh task is
    /// stopped and replaced.
    pub fn download_defaults(&self, config: &str) -> Result<(), ScheduleError> {
        let parsed = DownloadConfig::parse(config).map_err(|err| {
            tracing::warn!(config, error = %err, "download config rejected");
            err
        })?;

        let mut task = self.inner.task.lock();
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = task.take() {
            previous.stop();
        }

        match &parsed {
            DownloadConfig::Disabled => {
                self.inner.status.send_modify(|s| {
                    s.phase = RefreshPhase::Idle;
                    s.source = None;
                });
            }
            DownloadConfig::Once { url } => {
                *task = Some(self.spawn_refresh(epoch, url.clone(), None));
            }
            DownloadConfig::Periodic { url, period } => {
                *task = Some(self.spawn_refresh(epoch, url.clone(), Some(*period)));
            }
            DownloadConfig::Auto => match &self.inner.options.auto_url {
                Some(url) => {
                    let period = self.inner.options.auto_period;
                    *task = Some(self.spawn_refresh(epoch, url.clone(), Some(period)));
                }
                None => {
                    if self.snapshot().digest != sha256_hex(BUILTIN_DEFAULTS) {
                        self.try_set_defaults(BUILTIN_DEFAULTS)?;
                    }
                }
            },
        }

        tracing::info!(config = %parsed, epoch, "download config applied");
        *self.inner.config.lock() = parsed;
        Ok(())
    }

    /// Fetch `url` now and install the result, bypassing any schedule.
    pub async fn refresh_now(&self, url: &str) -> Result<u64, ScheduleError> {
        let bytes = self.inner.fetcher.fetch(url).await.map_err(|err| {
            tracing::warn!(url, error = %err, "defaults fetch failed");
            err
        })?;
        let generation = self.inner.install(&bytes, Some(url), None)?.unwrap_or_default();
        self.inner.status.send_modify(|s| s.last_fetch = Some(Utc::now()));
        Ok(generation)
    }

    /// Stop any refresh task. Active data stays installed.
    pub fn shutdown(&self) {
        let mut task = self.inner.task.lock();
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = task.take() {
            previous.stop();
        }
        *self.inner.config.lock() = DownloadConfig::Disabled;
        self.inner.status.send_modify(|s| s.phase = RefreshPhase::Idle);
    }

    fn spawn_refresh(&self, epoch: u64, url: String, period: Option<Duration>) -> RefreshTask {
        let (stop, stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let handle = self
            .inner
            .runtime
            .spawn(run_refresh(inner, epoch, url, period, stop_rx));
        RefreshTask { stop, handle }
    }
}

impl std::fmt::Debug for DefaultsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultsManager")
            .field("generation", &self.generation())
            .field("config", &self.download_config())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Refresh loop
// ---------------------------------------------------------------------------

async fn run_refresh(
    inner: Arc<Inner>,
    epoch: u64,
    url: String,
    period: Option<Duration>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = period.map(|p| {
        let mut t = tokio::time::interval(p);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t
    });

    loop {
        if let Some(ticker) = ticker.as_mut() {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }
        }

        inner.status.send_modify(|s| {
            s.phase = RefreshPhase::Fetching;
            s.source = Some(url.clone());
        });

        let fetched = tokio::select! {
            res = inner.fetcher.fetch(&url) => res,
            _ = stop.changed() => {
                tracing::debug!(url = %url, epoch, "in-flight defaults fetch abandoned");
                break;
            }
        };
        inner.apply_fetch(epoch, &url, fetched);

        if ticker.is_none() {
            break;
        }
    }
}

impl Inner {
    /// Validate, then swap in a new snapshot. Returns the new generation, or
    /// `None` when `epoch` is given and no longer current.
    fn install(
        &self,
        bytes: &[u8],
        source: Option<&str>,
        epoch: Option<u64>,
    ) -> Result<Option<u64>, ScheduleError> {
        let data = DefaultsData::parse(bytes)?;
        let digest = sha256_hex(bytes);

        let mut active = self.active.write();
        if epoch.is_some_and(|e| e != self.epoch.load(Ordering::SeqCst)) {
            return Ok(None);
        }
        let generation = active.generation + 1;
        *active = Arc::new(DefaultsSnapshot {
            generation,
            data,
            digest: digest.clone(),
            installed_at: Utc::now(),
        });
        // Published under the write lock so status never trails a newer install.
        self.status.send_modify(|s| s.generation = generation);
        drop(active);

        tracing::info!(
            generation,
            digest = %digest,
            source = source.unwrap_or("<direct>"),
            "defaults installed"
        );
        Ok(Some(generation))
    }

    fn apply_fetch(&self, epoch: u64, url: &str, fetched: Result<Vec<u8>, ScheduleError>) {
        let now = Utc::now();
        match fetched.and_then(|bytes| self.install(&bytes, Some(url), Some(epoch))) {
            Ok(Some(_)) => self.status.send_modify(|s| {
                s.phase = RefreshPhase::Applied;
                s.last_fetch = Some(now);
                s.last_error = None;
            }),
            Ok(None) => {
                tracing::debug!(url, epoch, "discarding fetch for a replaced download config");
            }
            Err(err) if self.epoch.load(Ordering::SeqCst) != epoch => {
                tracing::debug!(
                    url,
                    epoch,
                    error = %err,
                    "ignoring failure for a replaced download config"
                );
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "defaults refresh failed; keeping previous data");
                self.status.send_modify(|s| {
                    s.phase = RefreshPhase::FetchFailed;
                    s.last_fetch = Some(now);
                    s.last_error = Some(err.to_string());
                });
            }
        }
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
