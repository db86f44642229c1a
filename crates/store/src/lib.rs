//! Record Store Client interface.
//!
//! The compiler never owns catalog records: it borrows read-only snapshots
//! of them from whatever system persists them, through the [`RecordStore`]
//! trait defined here.

pub mod error;
pub mod store;

pub use crate::store::RecordStore;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn RecordStore + Send + Sync>;
