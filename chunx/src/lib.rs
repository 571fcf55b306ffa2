use std::str::Utf8Error;

mod cursor;
pub mod sliding;
pub mod snapping;
pub mod token;

pub use sliding::SlidingWindow;
pub use snapping::SnappingWindow;
pub use token::TokenWindow;

#[derive(Debug, thiserror::Error)]
pub enum ChunkerError {
    #[error("{0}")]
    Config(String),

    #[error("utf-8: {0}")]
    Utf8(#[from] Utf8Error),
}
