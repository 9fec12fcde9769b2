//! tcal-defaults
//!
//! Lifecycle of the defaults payload: the [`DownloadConfig`] grammar, the
//! [`DefaultsFetcher`] boundary with an HTTP/file implementation, and the
//! [`DefaultsManager`] that installs payloads atomically and runs the
//! cancellable refresh task.

mod download;
mod fetch;
mod manager;

pub use download::DownloadConfig;
pub use fetch::{DefaultsFetcher, UrlFetcher};
pub use manager::{
    DefaultsManager, DefaultsSnapshot, ManagerOptions, RefreshPhase, RefreshStatus,
};
