pub mod actor;
pub mod bot;
mod daemon;
mod domain;
pub mod transport;

pub use daemon::{Daemon, DaemonError, RunningDaemon, RuntimeConfig, ensure_watched_file};
pub use domain::{config, line};

pub mod dirs;
