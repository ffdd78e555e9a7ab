//! Cloud collaborator abstractions.
//!
//! - [`WarehouseIO`] - the analytical warehouse records are read from
//! - [`DocumentStoreIO`] - the hierarchical document store documents are written to
//!
//! Both are provider-agnostic and synchronous. In-memory fakes
//! ([`FakeWarehouseIO`], [`FakeDocumentStore`]) back the tests, and
//! [`helpers`] holds the retry/backoff logic the write sink uses.
//!
//! ```
//! use rowdoc::io::cloud::*;
//! use rowdoc::{FieldSchema, TableSchema};
//!
//! # fn main() -> CloudResult<()> {
//! let warehouse = FakeWarehouseIO::new();
//! warehouse.add_table(
//!     "events",
//!     TableSchema::new(vec![FieldSchema::new("id", "INTEGER")]),
//!     vec![vec![7i64.into()]],
//! );
//! assert_eq!(warehouse.query("SELECT * FROM events")?.row_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod fake;
pub mod helpers;
pub mod traits;

pub use fake::*;
pub use traits::*;
