use super::{KbErr, KbError};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

impl KbError {
    pub fn status(&self) -> StatusCode {
        use KbErr as E;
        use StatusCode as SC;
        match self.error {
            E::BadInput(_) | E::ParseInt(_) | E::Validation(_) | E::Chunker(_) => {
                SC::BAD_REQUEST
            }
            E::NotFound(_) => SC::NOT_FOUND,
            E::Conflict(_) => SC::CONFLICT,
            E::Unauthorized => SC::UNAUTHORIZED,
            E::InvalidProvider(_) => SC::UNPROCESSABLE_ENTITY,
            E::Plugin(_) => SC::UNPROCESSABLE_ENTITY,
            E::Storage(_) | E::Sqlx(_) | E::IO(_) | E::Utf8(_) | E::SerdeJson(_) => {
                SC::INTERNAL_SERVER_ERROR
            }
            E::Embedding(_) | E::Reqwest(_) => SC::BAD_GATEWAY,

            #[cfg(feature = "http")]
            E::AxumHttp(_) | E::Axum(_) => SC::INTERNAL_SERVER_ERROR,

            #[cfg(feature = "qdrant")]
            E::Qdrant(_) => SC::INTERNAL_SERVER_ERROR,

            E::Uuid(_) => SC::BAD_REQUEST,

            E::DocxRead(_) | E::Pdfium(_) | E::Fmt(_) | E::Htmd(_) | E::Zip(_) => {
                SC::UNPROCESSABLE_ENTITY
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseError<T: Serialize> {
    error_type: ErrorType,
    body: T,
}

impl<T> ResponseError<T>
where
    T: Serialize,
{
    pub fn new(error_type: ErrorType, body: T) -> Self {
        Self { error_type, body }
    }
}

#[derive(Debug, Serialize)]
enum ErrorType {
    Internal,
    Api,
}

impl<T> IntoResponse for ResponseError<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        <Json<ResponseError<T>> as IntoResponse>::into_response(Json(self))
    }
}

impl IntoResponse for KbError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        self.print();

        use ErrorType as ET;
        use KbErr as E;

        match self.error {
            E::NotFound(e) => (status, ResponseError::new(ET::Api, e)).into_response(),
            E::Conflict(e) => (status, ResponseError::new(ET::Api, e)).into_response(),
            E::BadInput(e) => (status, ResponseError::new(ET::Api, e)).into_response(),
            E::InvalidProvider(e) => (status, ResponseError::new(ET::Api, e)).into_response(),
            E::Plugin(e) => (status, ResponseError::new(ET::Api, e)).into_response(),
            E::Unauthorized => {
                (status, ResponseError::new(ET::Api, "unauthorized".to_string())).into_response()
            }
            E::Validation(errors) => {
                (status, ResponseError::new(ET::Api, errors)).into_response()
            }
            E::SerdeJson(e) => (status, ResponseError::new(ET::Api, e.to_string())).into_response(),

            E::Storage(_)
            | E::Sqlx(_)
            | E::IO(_)
            | E::Utf8(_)
            | E::ParseInt(_)
            | E::Chunker(_)
            | E::Embedding(_)
            | E::Reqwest(_)
            | E::Uuid(_) => (
                status,
                ResponseError::new(ET::Internal, "internal server error".to_string()),
            )
                .into_response(),

            E::DocxRead(e) => (
                status,
                ResponseError::new(ET::Api, format!("failed to read docx file: {e}")),
            )
                .into_response(),

            E::Pdfium(e) => (
                status,
                ResponseError::new(ET::Api, format!("failed to read pdf file: {e}")),
            )
                .into_response(),

            E::Htmd(e) => (
                status,
                ResponseError::new(ET::Api, format!("failed to convert html: {e}")),
            )
                .into_response(),

            E::Zip(e) => (
                status,
                ResponseError::new(ET::Api, format!("failed to read zip archive: {e}")),
            )
                .into_response(),

            E::Fmt(_) => (
                status,
                ResponseError::new(ET::Internal, "internal server error".to_string()),
            )
                .into_response(),

            #[cfg(feature = "http")]
            E::AxumHttp(_) | E::Axum(_) => (
                status,
                ResponseError::new(ET::Internal, "internal server error".to_string()),
            )
                .into_response(),

            #[cfg(feature = "qdrant")]
            E::Qdrant(_) => (
                status,
                ResponseError::new(ET::Internal, "vector store error".to_string()),
            )
                .into_response(),
        }
    }
}
