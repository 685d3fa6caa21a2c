//! Actor-based concurrency primitives
//!
//! Instead of shared-state concurrency with `Arc<Mutex<...>>`, components
//! communicate via message passing. Each seen-set is owned by exactly one
//! task.
//!
//! # Actors
//!
//! - [`WatcherTask`]: Receives notify events, reads the watched file and forwards new lines
//! - [`DeliveryActor`]: Sends forwarded lines to the notifier, one at a time, in order
//! - [`DigestTask`]: Periodically reports and truncates the watched file
//!
//! ```text
//! notify thread ─▶ WatcherTask ─▶ DeliveryActor ─▶ Notifier
//!                   DigestTask ─────────────────────▶ Notifier
//! ```

pub mod delivery;
pub mod digest;
pub mod handle;
pub mod message;
pub mod watcher;


pub use delivery::DeliveryActor;
pub use digest::{CycleOutcome, DigestError, DigestTask};
pub use handle::{DeliveryHandle, SendError};
pub use message::PendingNotification;
pub use watcher::{FileTracker, WatcherConfig, WatcherError, WatcherTask};
