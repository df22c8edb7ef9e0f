//! In-process stand-ins for the provider and object storage APIs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

const VOCABULARY: &[&str] = &[
    "sky", "blue", "grass", "green", "snow", "white", "color", "report", "summary", "draft",
];

/// Deterministic keyword-count vectors, one dimension per vocabulary word.
pub fn embed_vectors(texts: &[String]) -> Vec<Vec<f32>> {
    texts
        .iter()
        .map(|text| {
            let text = text.to_lowercase();
            VOCABULARY
                .iter()
                .map(|word| text.matches(word).count() as f32)
                .collect()
        })
        .collect()
}

/// Fields of the last signed upload received by the Cloudinary stand-in.
#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub cloud_name: String,
    pub filename: String,
    pub bytes: usize,
    pub api_key: String,
    pub timestamp: String,
    pub signature: String,
}

#[derive(Default)]
struct MockState {
    fail_embeddings: AtomicBool,
    fail_generation: AtomicBool,
    fail_storage: AtomicBool,
    embed_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    last_authorization: Mutex<Option<String>>,
    last_upload: Mutex<Option<RecordedUpload>>,
}

impl MockState {
    fn record_authorization(&self, headers: &HeaderMap) {
        *self.last_authorization.lock().unwrap() = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }
}

/// Stand-ins for every provider API on a random local port:
///
/// - TEI `/embed`
/// - OpenAI `/embeddings` and `/chat/completions`
/// - Hugging Face `/models/{model}` generation and
///   `/models/{model}/pipeline/feature-extraction`
/// - Cloudinary `/{cloud}/auto/upload`
pub struct MockUpstream {
    base: String,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/embed", post(embed))
            .route("/embeddings", post(openai_embeddings))
            .route("/chat/completions", post(openai_chat))
            .route("/models/{*model}", post(huggingface))
            .route("/{cloud}/auto/upload", post(cloudinary_upload))
            .route("/health", get(|| async { "ok" }))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    pub fn url(&self) -> String {
        self.base.clone()
    }

    pub fn fail_embeddings(&self, fail: bool) {
        self.state.fail_embeddings.store(fail, Ordering::SeqCst);
    }

    pub fn fail_generation(&self, fail: bool) {
        self.state.fail_generation.store(fail, Ordering::SeqCst);
    }

    /// Answer Cloudinary uploads with 401.
    pub fn fail_storage(&self, fail: bool) {
        self.state.fail_storage.store(fail, Ordering::SeqCst);
    }

    pub fn last_upload(&self) -> Option<RecordedUpload> {
        self.state.last_upload.lock().unwrap().clone()
    }

    pub fn embed_calls(&self) -> usize {
        self.state.embed_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.state.last_prompt.lock().unwrap().clone()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

#[derive(Deserialize)]
struct EmbedBody {
    inputs: Vec<String>,
}

async fn embed(State(state): State<Arc<MockState>>, Json(body): Json<EmbedBody>) -> Response {
    state.embed_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_embeddings.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "model loading").into_response();
    }
    Json(embed_vectors(&body.inputs)).into_response()
}

#[derive(Deserialize)]
struct OpenAiEmbeddingsBody {
    input: Vec<String>,
}

/// Entries come back in reverse so clients must reorder by `index`.
async fn openai_embeddings(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<OpenAiEmbeddingsBody>,
) -> Response {
    state.record_authorization(&headers);
    state.embed_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_embeddings.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    let data: Vec<_> = embed_vectors(&body.input)
        .into_iter()
        .enumerate()
        .rev()
        .map(|(index, embedding)| json!({"object": "embedding", "index": index, "embedding": embedding}))
        .collect();
    Json(json!({"object": "list", "data": data})).into_response()
}

#[derive(Deserialize)]
struct ChatBody {
    messages: Vec<ChatBodyMessage>,
}

#[derive(Deserialize)]
struct ChatBodyMessage {
    content: String,
}

async fn openai_chat(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<ChatBody>,
) -> Response {
    state.record_authorization(&headers);
    *state.last_prompt.lock().unwrap() = body.messages.last().map(|m| m.content.clone());
    if state.fail_generation.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response();
    }
    Json(json!({
        "id": "chatcmpl-mock",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "The sky is blue."}}]
    }))
    .into_response()
}

#[derive(Deserialize)]
struct HuggingFaceBody {
    inputs: serde_json::Value,
}

async fn huggingface(
    State(state): State<Arc<MockState>>,
    Path(model): Path<String>,
    headers: HeaderMap,
    Json(body): Json<HuggingFaceBody>,
) -> Response {
    state.record_authorization(&headers);

    if model.ends_with("pipeline/feature-extraction") {
        state.embed_calls.fetch_add(1, Ordering::SeqCst);
        if state.fail_embeddings.load(Ordering::SeqCst) {
            return (StatusCode::SERVICE_UNAVAILABLE, "model loading").into_response();
        }
        let inputs: Vec<String> = serde_json::from_value(body.inputs).unwrap_or_default();
        return Json(embed_vectors(&inputs)).into_response();
    }

    let prompt = body.inputs.as_str().unwrap_or_default().to_string();
    *state.last_prompt.lock().unwrap() = Some(prompt.clone());
    if state.fail_generation.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "model loading").into_response();
    }
    // Completion models echo the prompt before the continuation.
    Json(json!([{ "generated_text": format!("{prompt} The sky is blue.") }])).into_response()
}

async fn cloudinary_upload(
    State(state): State<Arc<MockState>>,
    Path(cloud_name): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let mut upload = RecordedUpload {
        cloud_name: cloud_name.clone(),
        ..Default::default()
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            upload.filename = field.file_name().unwrap_or_default().to_string();
            upload.bytes = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            continue;
        }
        let value = field.text().await.unwrap_or_default();
        match name.as_str() {
            "api_key" => upload.api_key = value,
            "timestamp" => upload.timestamp = value,
            "signature" => upload.signature = value,
            _ => {}
        }
    }
    let filename = upload.filename.clone();
    *state.last_upload.lock().unwrap() = Some(upload);

    if state.fail_storage.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid Signature"}})),
        )
            .into_response();
    }
    let public_id = filename.trim_end_matches(".pdf").to_string();
    Json(json!({
        "public_id": public_id,
        "version": 1,
        "secure_url": format!("https://res.cloudinary.com/{cloud_name}/image/upload/v1/{filename}"),
    }))
    .into_response()
}
