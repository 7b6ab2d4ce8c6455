use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::client::InferenceClient;
use crate::error::InferenceError;
use crate::payload::{ImagePayload, Question};
use crate::transport::Transport;

pub struct AppState<T> {
    pub client: InferenceClient<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
    pub model: String,
    pub processing_time_ms: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    /// Data URL or bare base64 of the image the question is about.
    pub image: String,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
    pub model: String,
    pub processing_time_ms: u128,
}

/// `{"error": message}` with a status code; the page shows `message` verbatim.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        let status = match err {
            InferenceError::EmptyQuestion | InferenceError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            InferenceError::ModelLoadTimeout => StatusCode::SERVICE_UNAVAILABLE,
            InferenceError::Request(_)
            | InferenceError::Transport(_)
            | InferenceError::UnexpectedResponse(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

pub fn router<T: Transport + 'static>(state: Arc<AppState<T>>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/caption", post(caption_image::<T>))
        .route("/api/ask", post(ask_question::<T>))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn caption_image<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let start = Instant::now();
    let mut multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let declared = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let image = ImagePayload::from_upload(data.to_vec(), declared.as_deref())?;

        let caption = state.client.generate_caption(&image).await?;

        return Ok(Json(CaptionResponse {
            caption,
            model: state.client.config().caption_model.clone(),
            processing_time_ms: start.elapsed().as_millis(),
        }));
    }

    Err(ApiError::bad_request("missing `image` field"))
}

async fn ask_question<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let start = Instant::now();
    let Json(request) = request.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let question = Question::new(request.question)?;
    let image = ImagePayload::from_data_url(&request.image)?;

    let answer = state.client.answer_question(&image, &question).await?;

    Ok(Json(AnswerResponse {
        question: question.as_str().to_string(),
        answer,
        model: state.client.config().vqa_model.clone(),
        processing_time_ms: start.elapsed().as_millis(),
    }))
}

async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}
