//! Concrete implementations of the [core](crate::core) module: the
//! directory, the `kb` HTTP client, and the wiring that assembles them
//! into [state::AppState].

/// Production [DirectoryLookup](crate::core::provider::DirectoryLookup).
pub mod directory;

/// `reqwest`-based [KbClient](crate::core::kb_client::KbClient).
pub mod kb_client;

/// Application state configuration.
pub mod state;

/// HTTP server implementation.
#[cfg(feature = "http")]
pub mod server;
