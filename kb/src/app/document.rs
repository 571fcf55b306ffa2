//! Concrete [crate::core::document::store::DocumentStore] implementations.

pub mod store;
