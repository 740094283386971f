//! The tracker engine: strike selection, quantity fixing, startup
//! reconciliation, and the long-lived poll loop that ties them to the
//! market-data client and the on-disk stores.

pub mod history;
pub mod reconcile;
pub mod select;
pub mod service;
pub mod sizing;
pub mod state;

pub use reconcile::{LiveContracts, Reconciler, RecoveryOutcome, RecoverySource};
pub use select::{SelectedLegs, SelectionError};
pub use service::TrackerService;
pub use sizing::{FixedQuantities, SizingError};
pub use state::TrackerState;
