//! Concrete [crate::core::vector::VectorDb] implementations.

#[cfg(feature = "qdrant")]
pub mod qdrant;
