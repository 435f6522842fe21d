// todosync-core: local replica of a task account, kept in step with the
// sync endpoint through a command queue and an idempotent merge.

pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub mod managers;
pub mod model;
pub mod session;
pub mod store;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CachedState, StateCache};
pub use command::{Command, CommandQueue, CommandStatus};
pub use config::{DEFAULT_ENDPOINT, SessionConfig, TlsVerification};
pub use error::CoreError;
pub use managers::Manager;
pub use model::{Entity, EntityId, ResourceType};
pub use session::{CommitOutcome, Session};
pub use store::{DataStore, ReconcileStats, SyncCursors, SyncScope};
pub use transport::Transport;
