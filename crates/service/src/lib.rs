//! Service layer for the agency backend.
//! - `store`: document-store abstraction with MongoDB and in-memory backends.
//! - `gateway`: one store primitive per HTTP resource operation.
//! - `upload` / `media`: staging uploaded files and relaying them to the media host.
//! - `identity`: bearer-token verification against the identity provider.

pub mod errors;
pub mod gateway;
pub mod identity;
pub mod media;
pub mod store;
pub mod upload;
#[cfg(test)]
pub mod test_support;

pub use gateway::ResourceGateway;
pub use upload::{StagedUpload, UploadRelay};
