//! Local persistence. Offline record store.

pub mod local_store;

pub use local_store::LocalSlotStore;
