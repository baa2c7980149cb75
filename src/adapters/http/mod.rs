//! HTTP adapters for the remote record store and the Conflict Check endpoint.

pub mod client;
pub mod conflict_check;
pub mod store;

pub use client::RestClient;
pub use conflict_check::HttpConflictCheck;
pub use store::HttpSlotStore;
