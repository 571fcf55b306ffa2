use std::error::Error as _;
use thiserror::Error;
use tracing::error;

pub mod http;

/// Error kinds for the completion layer (§7). `kb` has its own `KbErr`;
/// these are deliberately distinct enums since the two services talk only
/// over HTTP (§1) and never share an error type.
#[derive(Debug, Error)]
pub enum CompletionErr {
    #[error("bad input; {0}")]
    BadInput(String),

    #[error("not found; {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("config error; {0}")]
    Config(String),

    #[error("provider error; {0}")]
    Provider(String),

    #[error("http client; {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error; {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("IO; {0}")]
    IO(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("axum http; {0}")]
    AxumHttp(#[from] axum::http::Error),
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct CompletionError {
    file: &'static str,
    line: u32,
    column: u32,
    pub error: CompletionErr,
}

impl CompletionError {
    pub fn new(file: &'static str, line: u32, column: u32, error: CompletionErr) -> CompletionError {
        CompletionError {
            file,
            line,
            column,
            error,
        }
    }

    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }

    pub fn print(&self) {
        let location = self.location();

        error!("{location} | {self}");

        let mut src = self.error.source();
        while let Some(source) = src {
            error!(" - {source}");
            src = source.source();
        }
    }
}

#[macro_export]
macro_rules! err {
    ($ty:ident $(, $l:literal $(,)? $($args:expr),* )?) => {
        Err($crate::error::CompletionError::new(
            file!(),
            line!(),
            column!(),
            $crate::error::CompletionErr::$ty $( (format!($l, $( $args, )*)) )?,
        ))
    };
}

#[macro_export]
macro_rules! map_err {
    ($ex:expr) => {
        $ex.map_err(|e| $crate::error::CompletionError::new(file!(), line!(), column!(), e.into()))?
    };
}
