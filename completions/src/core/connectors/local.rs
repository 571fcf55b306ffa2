use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::connector::{ConnectRequest, Connector, ConnectorResponse};
use crate::core::model::chat::ChatCompletionChunk;
use crate::error::{CompletionErr, CompletionError};

/// Runs a local model through a subprocess rather than an HTTP call — the
/// `endpoint` field of the resolved [crate::core::model::org::ProviderConfig]
/// names the executable, invoked with the resolved messages piped in as
/// JSON on stdin and expected to print the completion text on stdout. No
/// streaming variant: local runs are always buffered, matching what a
/// short-lived CLI tool can produce.
#[derive(Default)]
pub struct LocalConnector;

impl LocalConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Connector for LocalConnector {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn connect(&self, request: ConnectRequest) -> Result<ConnectorResponse, CompletionError> {
        let executable = request.provider.endpoint.as_deref().ok_or_else(|| {
            CompletionError::new(
                file!(),
                line!(),
                column!(),
                CompletionErr::Config("local provider has no endpoint (executable path) configured".to_string()),
            )
        })?;

        let payload = serde_json::json!({
            "model": request.llm,
            "messages": request.messages,
        });
        let input = serde_json::to_vec(&payload).map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::SerdeJson(e)))?;

        let mut child = Command::new(executable)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::IO(e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::IO(e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::IO(e)))?;

        if !output.status.success() {
            return Err(CompletionError::new(
                file!(),
                line!(),
                column!(),
                CompletionErr::Provider(format!(
                    "local model process exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).chars().take(500).collect::<String>()
                )),
            ));
        }

        let content = String::from_utf8_lossy(&output.stdout).trim().to_string();

        Ok(ConnectorResponse::Buffered(ChatCompletionChunk::single(
            uuid::Uuid::new_v4().to_string(),
            request.llm.clone(),
            content,
        )))
    }
}
