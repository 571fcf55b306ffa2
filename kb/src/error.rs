use std::{error::Error as _, num::ParseIntError, string::FromUtf8Error};
use thiserror::Error;
use tracing::error;
use validify::ValidationErrors;

#[cfg(feature = "qdrant")]
use qdrant_client::QdrantError;

pub mod http;

#[derive(Debug, Error)]
pub enum KbErr {
    #[error("not found; {0}")]
    NotFound(String),

    #[error("already exists; {0}")]
    Conflict(String),

    #[error("bad input; {0}")]
    BadInput(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid provider; {0}")]
    InvalidProvider(String),

    #[error("plugin error; {0}")]
    Plugin(String),

    #[error("storage error; {0}")]
    Storage(String),

    #[error("embedding error; {0}")]
    Embedding(#[from] kb_embedders::EmbeddingError),

    #[error("IO; {0}")]
    IO(#[from] std::io::Error),

    #[error("UTF-8; {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("parse int; {0}")]
    ParseInt(#[from] ParseIntError),

    #[error("SQL; {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON error; {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("chunker: {0}")]
    Chunker(#[from] chunx::ChunkerError),

    #[error("validation; {0}")]
    Validation(#[from] ValidationErrors),

    #[error("http client; {0}")]
    Reqwest(#[from] reqwest::Error),

    #[cfg(feature = "http")]
    #[error("axum http; {0}")]
    AxumHttp(#[from] axum::http::Error),

    #[cfg(feature = "http")]
    #[error("axum; {0}")]
    Axum(#[from] axum::Error),

    #[cfg(feature = "qdrant")]
    #[error("qdrant; {0}")]
    Qdrant(#[from] QdrantError),

    #[error("uuid: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("docx read; {0}")]
    DocxRead(#[from] docx_rs::ReaderError),

    #[error("pdf read; {0}")]
    Pdfium(#[from] pdfium_render::prelude::PdfiumError),

    #[error("html conversion; {0}")]
    Htmd(#[from] htmd::HtmdError),

    #[error("zip archive; {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("fmt; {0}")]
    Fmt(#[from] std::fmt::Error),
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct KbError {
    file: &'static str,
    line: u32,
    column: u32,
    pub error: KbErr,
}

impl KbError {
    pub fn new(file: &'static str, line: u32, column: u32, error: KbErr) -> KbError {
        KbError {
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

        if self.error.source().is_some() {
            error!("Causes:");
        }

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
        Err($crate::error::KbError::new(
            file!(),
            line!(),
            column!(),
            $crate::error::KbErr::$ty $( (format!($l, $( $args, )*)) )?,
        ))
    };
}

#[macro_export]
macro_rules! map_err {
    ($ex:expr) => {
        $ex.map_err(|e| $crate::error::KbError::new(file!(), line!(), column!(), e.into()))?
    };
}
