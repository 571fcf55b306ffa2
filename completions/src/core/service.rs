//! Business logic built on top of the [provider][crate::core::provider],
//! [kb_client][crate::core::kb_client] and [connector][crate::core::connector]
//! traits. Adapters in `app/` wire concrete implementations of those traits
//! into these services; HTTP handlers call only the services.

pub mod org_config_resolver;
pub mod rag_orchestrator;
