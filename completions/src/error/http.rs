use super::{CompletionErr, CompletionError};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

impl CompletionError {
    pub fn status(&self) -> StatusCode {
        use CompletionErr as E;
        use StatusCode as SC;
        match self.error {
            E::BadInput(_) => SC::BAD_REQUEST,
            E::NotFound(_) => SC::NOT_FOUND,
            E::Unauthorized => SC::UNAUTHORIZED,
            E::Config(_) => SC::INTERNAL_SERVER_ERROR,
            E::Provider(_) => SC::BAD_GATEWAY,
            E::Reqwest(_) => SC::BAD_GATEWAY,
            E::SerdeJson(_) | E::IO(_) => SC::INTERNAL_SERVER_ERROR,

            #[cfg(feature = "http")]
            E::AxumHttp(_) => SC::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseError<T: Serialize> {
    error_type: ErrorType,
    body: T,
}

#[derive(Debug, Serialize)]
enum ErrorType {
    Internal,
    Api,
}

impl IntoResponse for CompletionError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        self.print();

        use CompletionErr as E;

        match self.error {
            E::BadInput(e) | E::NotFound(e) | E::Provider(e) => (
                status,
                Json(ResponseError {
                    error_type: ErrorType::Api,
                    body: e,
                }),
            )
                .into_response(),
            _ => (
                status,
                Json(ResponseError {
                    error_type: ErrorType::Internal,
                    body: "internal server error".to_string(),
                }),
            )
                .into_response(),
        }
    }
}
