use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::components::calendar::{run_batch, BatchOutcome};
use crate::components::chat::ChatTurn;
use crate::components::spreadsheet::{read_spreadsheet, PreviewRow, PREVIEW_MESSAGE};
use crate::components::{CalendarWebhook, ChatCompletion, HttpCalendarWebhook, RigChatClient};
use crate::config::Config;
use crate::error::{bad_request, AppError, AppResult};

/// Message returned by the FAQ upload
pub const FAQ_MESSAGE: &str = "FAQファイルが編集されました。";

const CHAT_CONTEXT: &str = "ChatGPT API Error";
const EXCEL_CONTEXT: &str = "Excel Upload Error";
const CALENDAR_CONTEXT: &str = "Calendar Endpoint Error";
const FAQ_CONTEXT: &str = "FAQ Upload Error";

#[derive(Clone)]
pub struct AppState {
    /// Applies calendar operations
    pub calendar: Arc<dyn CalendarWebhook>,
    /// Answers chat messages
    pub chat: Arc<dyn ChatCompletion>,
}

impl AppState {
    pub fn new(calendar: Arc<dyn CalendarWebhook>, chat: Arc<dyn ChatCompletion>) -> Self {
        Self { calendar, chat }
    }

    /// Build the production clients from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpCalendarWebhook::new(&config.webhook)),
            Arc::new(RigChatClient::new(&config.chat)),
        )
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Build the application router
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/upload_excel", post(upload_excel_handler))
        .route("/calendar", post(calendar_handler))
        .route("/faq", post(faq_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Any route failure, reported as a 500 with a free-text `detail`
#[derive(Debug)]
pub struct RouteError {
    context: &'static str,
    source: AppError,
}

impl RouteError {
    fn within(context: &'static str) -> impl FnOnce(AppError) -> Self {
        move |source| Self { context, source }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let detail = format!("{}: {}", self.context, self.source);
        error!("{}", detail);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": detail })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Handler for chat messages
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, RouteError> {
    info!("Received chat message ({} prior turns)", request.context.len());

    let reply = state
        .chat
        .reply(&request.message, &request.context)
        .await
        .map_err(RouteError::within(CHAT_CONTEXT))?;

    Ok(Json(ChatResponse { reply }))
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub message: String,
    pub data: Vec<PreviewRow>,
}

/// Handler for spreadsheet previews; parses only, nothing is sent anywhere
pub async fn upload_excel_handler(
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, RouteError> {
    let upload = read_upload(multipart)
        .await
        .map_err(RouteError::within(EXCEL_CONTEXT))?;

    let rows = read_spreadsheet(upload.file_name.as_deref(), &upload.bytes)
        .map_err(RouteError::within(EXCEL_CONTEXT))?;
    info!("Previewing {} rows", rows.len());

    Ok(Json(PreviewResponse {
        message: PREVIEW_MESSAGE.to_string(),
        data: rows.iter().map(PreviewRow::from).collect(),
    }))
}

/// Handler that applies a spreadsheet to the calendar
pub async fn calendar_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchOutcome>, RouteError> {
    let upload = read_upload(multipart)
        .await
        .map_err(RouteError::within(CALENDAR_CONTEXT))?;

    let rows = read_spreadsheet(upload.file_name.as_deref(), &upload.bytes)
        .map_err(RouteError::within(CALENDAR_CONTEXT))?;
    info!("Applying {} spreadsheet rows to the calendar", rows.len());

    let outcome = run_batch(&rows, state.calendar.as_ref())
        .await
        .map_err(RouteError::within(CALENDAR_CONTEXT))?;

    Ok(Json(outcome))
}

/// Handler for FAQ uploads. The file is read and acknowledged only.
pub async fn faq_handler(multipart: Multipart) -> Result<impl IntoResponse, RouteError> {
    let upload = read_upload(multipart)
        .await
        .map_err(RouteError::within(FAQ_CONTEXT))?;
    info!("Received FAQ file ({} bytes)", upload.bytes.len());

    Ok(Json(json!({ "message": FAQ_MESSAGE })))
}

// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}

struct Upload {
    file_name: Option<String>,
    bytes: Bytes,
}

/// Pull the `file` field out of a multipart body
async fn read_upload(mut multipart: Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(&format!("Failed to read uploaded file: {}", e)))?;
        return Ok(Upload { file_name, bytes });
    }

    Err(bad_request("Missing multipart field: file"))
}
