//! Business logic built on top of the [repo][crate::core::repo],
//! [vector][crate::core::vector] and [document][crate::core::document] traits.
//! Adapters in `app/` wire concrete implementations of those traits into
//! these services; HTTP handlers call only the services.

pub mod catalog;
pub mod ingest;
pub mod query;
