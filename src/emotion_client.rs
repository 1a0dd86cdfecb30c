//! Client for the remote emotion-classification service.
//!
//! The service speaks JSON over a WebSocket. The client sends
//!
//! ```json
//! {"event": "localhost:subscribe", "data": {"image": "data:image/jpeg;base64,..."}}
//! ```
//!
//! and the service answers with either a prediction
//!
//! ```json
//! {"predictions": {"angry": 0.8, "neutral": 0.1, ...}, "emotion": "angry"}
//! ```
//!
//! or `{"error": "<reason>"}`. There is no acknowledgement or retry. Every
//! request opens its own connection, waits for the first reply and closes.

use crate::config::duration_ms;
use crate::face::emotion::EmotionPrediction;
use crate::face::pipeline::{PredictionDispatcher, PredictionRequest, PredictionResponse};
use crossbeam_channel::Sender;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

/// Default service endpoint.
pub const DEFAULT_SERVICE_URL: &str = "ws://localhost:8000";

/// Event name of a classification request.
pub const SUBSCRIBE_EVENT: &str = "localhost:subscribe";

/// Emotion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionServiceConfig {
    /// WebSocket endpoint (`ws://` or `wss://`)
    pub url: String,
    /// Time allowed for connect, send and reply together
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
}

impl Default for EmotionServiceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl EmotionServiceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Check that the endpoint is a WebSocket URL.
    pub fn validate(&self) -> Result<(), EmotionError> {
        if self.url.starts_with("ws://") || self.url.starts_with("wss://") {
            Ok(())
        } else {
            Err(EmotionError::Config(format!(
                "Service URL must start with ws:// or wss://, got '{}'",
                self.url
            )))
        }
    }
}

/// Emotion client error types.
#[derive(Debug)]
pub enum EmotionError {
    /// Configuration error
    Config(String),
    /// Could not open the connection
    Connect(String),
    /// Could not send the request
    Send(String),
    /// Connection failed while waiting for the reply
    Receive(String),
    /// Connection closed before any reply
    Closed,
    /// No reply within the request timeout
    Timeout(Duration),
    /// The service answered with an error message
    Service(String),
    /// The reply was not a valid prediction
    Malformed(String),
}

impl std::fmt::Display for EmotionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmotionError::Config(msg) => write!(f, "Emotion service config error: {msg}"),
            EmotionError::Connect(msg) => write!(f, "Emotion service connect error: {msg}"),
            EmotionError::Send(msg) => write!(f, "Emotion service send error: {msg}"),
            EmotionError::Receive(msg) => write!(f, "Emotion service receive error: {msg}"),
            EmotionError::Closed => write!(f, "Emotion service closed the connection"),
            EmotionError::Timeout(after) => {
                write!(f, "Emotion service did not reply within {after:?}")
            }
            EmotionError::Service(msg) => write!(f, "Emotion service error: {msg}"),
            EmotionError::Malformed(msg) => write!(f, "Malformed emotion reply: {msg}"),
        }
    }
}

impl std::error::Error for EmotionError {}

/// Classification request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest<'a> {
    pub event: &'a str,
    pub data: SubscribeData<'a>,
}

/// Request payload.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeData<'a> {
    /// Frame as a `data:` URL
    pub image: &'a str,
}

impl<'a> SubscribeRequest<'a> {
    pub fn new(image: &'a str) -> Self {
        Self {
            event: SUBSCRIBE_EVENT,
            data: SubscribeData { image },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServiceReply {
    Prediction(EmotionPrediction),
    Error { error: String },
}

/// Interpret one reply from the service.
pub fn parse_reply(text: &str) -> Result<EmotionPrediction, EmotionError> {
    match serde_json::from_str::<ServiceReply>(text) {
        Ok(ServiceReply::Prediction(prediction)) => Ok(prediction),
        Ok(ServiceReply::Error { error }) => Err(EmotionError::Service(error)),
        Err(e) => Err(EmotionError::Malformed(e.to_string())),
    }
}

/// One-shot-per-request emotion service client.
#[derive(Debug, Clone)]
pub struct EmotionClient {
    config: EmotionServiceConfig,
}

impl EmotionClient {
    /// Create a new client.
    pub fn new(config: EmotionServiceConfig) -> Result<Self, EmotionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EmotionServiceConfig {
        &self.config
    }

    /// Classify one image (a `data:` URL).
    pub async fn predict(&self, image: &str) -> Result<EmotionPrediction, EmotionError> {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, self.exchange(image))
            .await
            .map_err(|_| EmotionError::Timeout(timeout))?
    }

    async fn exchange(&self, image: &str) -> Result<EmotionPrediction, EmotionError> {
        let (mut socket, _) = tokio_tungstenite::connect_async(self.config.url.as_str())
            .await
            .map_err(|e| EmotionError::Connect(e.to_string()))?;

        let payload = serde_json::to_string(&SubscribeRequest::new(image))
            .map_err(|e| EmotionError::Send(e.to_string()))?;
        socket
            .send(Message::Text(payload))
            .await
            .map_err(|e| EmotionError::Send(e.to_string()))?;

        while let Some(message) = socket.next().await {
            let reply = match message.map_err(|e| EmotionError::Receive(e.to_string()))? {
                Message::Text(text) => parse_reply(&text),
                Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                    Ok(text) => parse_reply(text),
                    Err(e) => Err(EmotionError::Malformed(e.to_string())),
                },
                Message::Close(_) => return Err(EmotionError::Closed),
                _ => continue,
            };
            let _ = socket.close(None).await;
            return reply;
        }

        Err(EmotionError::Closed)
    }
}

/// Runs each tick's request as a task on a tokio runtime and reports the
/// outcome back to the fusion loop.
pub struct EmotionDispatcher {
    client: Arc<EmotionClient>,
    handle: tokio::runtime::Handle,
    replies: Sender<PredictionResponse>,
}

impl EmotionDispatcher {
    pub fn new(
        client: EmotionClient,
        handle: tokio::runtime::Handle,
        replies: Sender<PredictionResponse>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            handle,
            replies,
        }
    }
}

impl PredictionDispatcher for EmotionDispatcher {
    fn dispatch(&self, request: PredictionRequest) {
        let client = Arc::clone(&self.client);
        let replies = self.replies.clone();

        self.handle.spawn(async move {
            let result = client.predict(&request.image).await;
            // The loop may already be gone; nothing to do then.
            let _ = replies.send(PredictionResponse {
                tick_id: request.tick_id,
                result,
            });
        });
    }
}
