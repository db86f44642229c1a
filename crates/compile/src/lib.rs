//! Catalog-to-search-document compiler.
//!
//! Turns a work, its editions, its authors and its ranking signals into one
//! flat [`SearchDocument`] for a full-text/faceted search index:
//!
//! 1. **Fetched**: a [`Snapshot`] of every record the work needs is loaded
//!    from a [`RecordStore`].
//! 2. **Resolved**: redirects and tombstones are resolved against the
//!    snapshot ([`resolve`]).
//! 3. **Aggregated**: editions are folded into counts and representative
//!    attributes ([`aggregate`]), subject strings into facets ([`facets`]),
//!    and signal sources into ranking signals ([`signals`]).
//! 4. **Assembled**: everything is merged and validated ([`assemble`]).
//!
//! A work that cannot be compiled is reported as [`Skipped`] with the
//! stage it reached and a reason; problems with an individual edition or
//! author only exclude that reference and are reported as [`Warning`]s.
//!
//! ```
//! use folio_compile::document::fields;
//! use folio_records::models::{Author, Edition, Work, WorkKey};
//! use folio_store::store::MockStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = MockStore::with_records(
//!     [Work::new("W1", "Example").with_authors(["A1"])],
//!     [Edition::new("E1", "W1").with_year(1990), Edition::new("E2", "W1").with_cover("C1")],
//!     [Author::new("A1", "Ada")],
//! );
//! let compiled = folio_compile::compile(&store, &WorkKey::from("W1")).await.unwrap();
//! assert_eq!(compiled.document.integer(fields::EDITION_COUNT), Some(2));
//! assert_eq!(compiled.document.list(fields::AUTHOR_NAME).unwrap(), ["Ada"]);
//! # }
//! ```

pub mod aggregate;
pub mod assemble;
mod compiler;
mod consts;
pub mod document;
pub mod error;
pub mod facets;
pub mod resolve;
pub mod signals;
mod snapshot;

pub use crate::compiler::{Compiled, Compiler, Options, SkipReason, Skipped, Stage, Warning};
pub use crate::document::{FieldValue, SearchDocument};
pub use crate::snapshot::Snapshot;
use folio_records::models::WorkKey;
use folio_store::RecordStore;
use tracing::instrument;

/// Compile a single work from `store` with the default [`Compiler`].
#[instrument(skip(store), fields(store = store.name()))]
pub async fn compile(store: &dyn RecordStore, key: &WorkKey) -> Result<Compiled, Skipped> {
    Compiler::new().compile(store, key).await
}
