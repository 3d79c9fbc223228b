//! Record-level model of the agency document store.
//!
//! Records are loosely typed JSON objects; this crate only names the
//! collections, the fields handlers touch, and the query shapes they use.

pub mod collection;
pub mod db;
pub mod errors;
pub mod filter;
pub mod id;
pub mod record;

pub use collection::Collection;
pub use filter::{Filter, FindSpec};
pub use id::RecordId;
pub use record::Record;
