use serde_json::{json, Value};

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::payload::{ImagePayload, Question};
use crate::retry::{poll_until_ready, AttemptOutcome};
use crate::transport::{HttpTransport, ModelRequest, ModelResponse, RequestBody, Transport};

pub const CAPTION_FALLBACK_MESSAGE: &str = "Failed to generate caption";
pub const ANSWER_FALLBACK_MESSAGE: &str = "Failed to answer question";

/// Captions images and answers questions about them through hosted models,
/// polling while a model is still loading on the serving side.
///
/// Holds no per-request state: each call owns its own attempt counter, so one
/// client can serve concurrent requests.
pub struct InferenceClient<T = HttpTransport> {
    config: InferenceConfig,
    transport: T,
}

impl InferenceClient<HttpTransport> {
    pub fn new(config: InferenceConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> InferenceClient<T> {
    pub fn with_transport(config: InferenceConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Posts the raw image to the captioning model and returns its `generated_text`.
    pub async fn generate_caption(&self, image: &ImagePayload) -> Result<String, InferenceError> {
        let url = self.config.model_url(&self.config.caption_model);
        tracing::info!(model = %self.config.caption_model, bytes = image.bytes().len(), "generating caption");

        poll_until_ready(self.config.retry, "caption", |_| {
            let request = ModelRequest {
                url: url.clone(),
                bearer_token: self.config.api_token.clone(),
                body: RequestBody::Binary {
                    content_type: image.media_type().to_string(),
                    bytes: image.bytes().to_vec(),
                },
            };
            self.attempt(request, "generated_text", CAPTION_FALLBACK_MESSAGE)
        })
        .await
    }

    /// Sends the base64 image and question to the VQA model and returns its `answer`.
    pub async fn answer_question(
        &self,
        image: &ImagePayload,
        question: &Question,
    ) -> Result<String, InferenceError> {
        let url = self.config.model_url(&self.config.vqa_model);
        let body = json!({
            "inputs": {
                "image": image.to_base64(),
                "question": question.as_str(),
            }
        });
        tracing::info!(model = %self.config.vqa_model, question_len = question.as_str().len(), "answering question");
        tracing::debug!(question = question.as_str(), "question text");

        poll_until_ready(self.config.retry, "question", |_| {
            let request = ModelRequest {
                url: url.clone(),
                bearer_token: self.config.api_token.clone(),
                body: RequestBody::Json(body.clone()),
            };
            self.attempt(request, "answer", ANSWER_FALLBACK_MESSAGE)
        })
        .await
    }

    async fn attempt(
        &self,
        request: ModelRequest,
        field: &'static str,
        fallback: &'static str,
    ) -> Result<AttemptOutcome, InferenceError> {
        let response = self.transport.post(request).await?;
        interpret_response(&response, field, fallback)
    }
}

/// Classifies one model response.
///
/// A loading error wins over the status code; any other non-success status is
/// a rejection carrying the server's message. A success body must be an array
/// whose first element has a string `field`.
pub fn interpret_response(
    response: &ModelResponse,
    field: &str,
    fallback: &str,
) -> Result<AttemptOutcome, InferenceError> {
    let body: Value = serde_json::from_slice(&response.body).map_err(|e| {
        InferenceError::UnexpectedResponse(format!("status {} with non-JSON body: {e}", response.status))
    })?;

    let error = body.get("error").and_then(error_message);

    if error.as_deref().is_some_and(|message| message.contains("loading")) {
        return Ok(AttemptOutcome::Loading {
            estimated_time: body.get("estimated_time").and_then(Value::as_f64),
        });
    }

    if !response.is_success() {
        let message = error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Ok(AttemptOutcome::Rejected(message));
    }

    body.get(0)
        .and_then(|first| first.get(field))
        .and_then(Value::as_str)
        .map(|text| AttemptOutcome::Ready(text.to_string()))
        .ok_or_else(|| InferenceError::UnexpectedResponse(format!("missing `{field}` in model response")))
}

/// The hosting service sends `error` either as a string or, for input
/// validation failures, as a list of strings.
fn error_message(error: &Value) -> Option<String> {
    match error {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}
