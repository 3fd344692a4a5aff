//! `reqwest` implementation of the transport traits

use super::{ActionError, ActionExecutor, ByteStream, ChatTransport, TransportError};
use crate::config::ClientConfig;
use crate::feedback::{FeedbackError, FeedbackRequest, FeedbackResponse};
use crate::protocol::{
    ChatRequest, CreateMeetingResponse, ErrorResponse, ToolProposal, CREATE_MEETING_TOOL,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

/// HTTP client for the assistant API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::connect(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Submit visitor feedback after validating it locally
    pub async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, FeedbackError> {
        request.validate()?;

        let response = self
            .client
            .post(self.url("/feedback"))
            .json(request)
            .send()
            .await
            .map_err(|e| FeedbackError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedbackError::Transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| "Failed to submit feedback".to_string());
            tracing::warn!(status = status.as_u16(), %message, "Feedback rejected");
            return Err(FeedbackError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: FeedbackResponse = serde_json::from_str(&body)
            .map_err(|e| FeedbackError::Transport(format!("Failed to parse response: {e}")))?;
        tracing::info!(id = ?parsed.id, "Feedback submitted");
        Ok(parsed)
    }
}

fn classify_send_error(e: &reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::connect(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        TransportError::connect(format!("Connection failed: {e}"))
    } else {
        TransportError::connect(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl ChatTransport for HttpClient {
    async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        tracing::debug!(
            messages = request.messages.len(),
            session_id = ?request.session_id,
            "Opening chat stream"
        );

        let response = self
            .client
            .post(self.url("/chat"))
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::status(status.as_u16(), &body));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::interrupted(format!("Stream interrupted: {e}")))
            })
            .boxed();

        Ok(body)
    }
}

#[async_trait]
impl ActionExecutor for HttpClient {
    async fn execute(&self, proposal: &ToolProposal) -> Result<CreateMeetingResponse, ActionError> {
        let path = match proposal.name.as_str() {
            CREATE_MEETING_TOOL => "/actions/create-meeting",
            other => return Err(ActionError::Unsupported(other.to_string())),
        };

        let response = self
            .client
            .post(self.url(path))
            .json(&proposal.args)
            .send()
            .await
            .map_err(|e| ActionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ActionError::Transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |e| e.message);
            return Err(ActionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ActionError::InvalidResponse(e.to_string()))
    }
}
