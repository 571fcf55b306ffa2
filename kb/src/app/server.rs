//! `axum` HTTP surface (§6): route table, request/response DTOs, and the
//! OpenAPI schema aggregator.

/// OpenAPI schema aggregator for `/swagger-ui`.
pub mod api;

/// Request/response bodies.
pub mod dto;

/// Route table and handlers.
pub mod router;
