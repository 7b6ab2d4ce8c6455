#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_image_analyzer::{
    transport::{ModelRequest, ModelResponse, Transport},
    ImagePayload, InferenceClient, InferenceConfig, RetryPolicy, TransportError,
};
use async_trait::async_trait;

pub const TOKEN: &str = "hf_test_token";
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake";

pub type Scripted = Result<ModelResponse, TransportError>;

/// Replays canned responses in order and records every request it sees.
///
/// Once the script is exhausted the last entry is repeated.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Default::default()
        })
    }

    pub fn always(response: Scripted) -> Arc<Self> {
        Self::new([response])
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: ModelRequest) -> Result<ModelResponse, TransportError> {
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = next {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Err(TransportError::new("script is empty")))
    }
}

pub fn json(status: u16, body: &str) -> Scripted {
    Ok(ModelResponse {
        status,
        body: body.as_bytes().to_vec(),
    })
}

pub fn caption_ok(text: &str) -> Scripted {
    json(200, &format!(r#"[{{"generated_text":"{text}"}}]"#))
}

pub fn answer_ok(text: &str) -> Scripted {
    json(200, &format!(r#"[{{"answer":"{text}","score":0.93}}]"#))
}

pub fn loading() -> Scripted {
    json(
        503,
        r#"{"error":"Model Salesforce/blip-image-captioning-base is currently loading","estimated_time":20.0}"#,
    )
}

pub fn network_error(message: &str) -> Scripted {
    Err(TransportError::new(message))
}

pub fn config() -> InferenceConfig {
    let mut config = InferenceConfig::new(TOKEN);
    config.api_base_url = "https://inference.test".to_string();
    config
}

pub fn fast_config(max_attempts: u32) -> InferenceConfig {
    let mut config = config();
    config.retry = RetryPolicy {
        max_attempts,
        delay: Duration::ZERO,
    };
    config
}

pub fn client(transport: &Arc<ScriptedTransport>) -> InferenceClient<Arc<ScriptedTransport>> {
    InferenceClient::with_transport(config(), Arc::clone(transport))
}

pub fn png() -> ImagePayload {
    ImagePayload::new(PNG_BYTES.to_vec(), "image/png").unwrap()
}
