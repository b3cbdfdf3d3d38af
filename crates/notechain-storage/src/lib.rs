//! Persistent [`KeyValueStore`](notechain_core::KeyValueStore) backends.

pub mod sled_store;

pub use sled_store::SledStore;
