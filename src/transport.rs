use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw bytes sent with their own media type.
    Binary { content_type: String, bytes: Vec<u8> },
    /// Serialized as `application/json`.
    Json(Value),
}

/// One POST to a hosted model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub url: String,
    pub bearer_token: String,
    pub body: RequestBody,
}

/// Status and raw body of whatever the hosting service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ModelResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network seam of the inference client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: ModelRequest) -> Result<ModelResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(&self, request: ModelRequest) -> Result<ModelResponse, TransportError> {
        (**self).post(request).await
    }
}

/// reqwest-backed transport. No per-request timeout beyond reqwest's defaults.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: ModelRequest) -> Result<ModelResponse, TransportError> {
        tracing::debug!(url = %request.url, "sending model request");

        let builder = self
            .client
            .post(&request.url)
            .bearer_auth(&request.bearer_token);

        let builder = match request.body {
            RequestBody::Binary {
                content_type,
                bytes,
            } => builder.header(CONTENT_TYPE, content_type).body(bytes),
            RequestBody::Json(value) => builder.json(&value),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status, bytes = body.len(), "model responded");
        Ok(ModelResponse { status, body })
    }
}
