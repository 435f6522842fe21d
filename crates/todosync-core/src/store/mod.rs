// ── Local state store ──
//
// Id-keyed entity collections, scalar fields, per-type sync cursors,
// and the reconciliation pass that folds server deltas into them.

mod collection;
mod cursor;
mod data_store;
mod reconcile;

pub use cursor::{SyncCursors, SyncScope};
pub use data_store::DataStore;
pub use reconcile::ReconcileStats;

pub(crate) use reconcile::SyncPayload;
