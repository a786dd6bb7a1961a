use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{delete, get, post, put},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use proposal_flow::{
    Dispatcher, DocumentOrigin, ExtractedDocument, FileSessionStorage, FrontMatter,
    ProposalError, ProposalOutline, ProposalSession, SessionStorage, UploadedFile,
    build_document, to_docx_bytes,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::models::{
    ClearSectionResponse, CreateSessionResponse, DispatchRequest, ExportRequest, ExportResponse,
    ExtractedFileSummary, ExtractionFailureReport, FeedbackRequest, InfoRequest, OutlineRequest,
    SectionDraftResponse, SessionResponse, SettingsRequest, StepRequest, UploadDocumentsRequest,
    UploadDocumentsResponse, session_keys,
};
use crate::workflow::{
    action_for_section, build_dispatcher, load_drafts, load_info, load_sources, save_drafts,
    save_sources,
};

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

/// Map pipeline errors onto the wire contract.
fn pipeline_error(error: ProposalError) -> ApiError {
    let status = match &error {
        ProposalError::InvalidAction(_) | ProposalError::MissingInput { .. } => {
            StatusCode::BAD_REQUEST
        }
        ProposalError::NoDraftToRevise(_) => StatusCode::CONFLICT,
        ProposalError::UpstreamGeneration(_) => StatusCode::BAD_GATEWAY,
        ProposalError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() })))
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub dispatcher: Arc<Dispatcher>,
}

pub async fn create_app() -> Router {
    let session_dir =
        std::env::var("SESSION_DIR").unwrap_or_else(|_| "./proposal_sessions".to_string());
    let app_state = AppState {
        session_storage: Arc::new(FileSessionStorage::new(session_dir)),
        dispatcher: Arc::new(build_dispatcher()),
    };
    build_router(app_state)
}

/// Middleware to add a correlation ID to all requests.
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();
    request.headers_mut().insert(
        "x-correlation-id",
        HeaderValue::from_str(&correlation_id).unwrap(),
    );
    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/proposal/sessions", post(create_session))
        .route("/proposal/{session_id}", get(get_session))
        .route("/proposal/{session_id}/documents", post(upload_documents))
        .route("/proposal/{session_id}/dispatch", post(dispatch_action))
        .route("/proposal/{session_id}/outline", put(set_outline))
        .route("/proposal/{session_id}/info", put(set_info))
        .route("/proposal/{session_id}/settings", put(set_settings))
        .route("/proposal/{session_id}/step", put(set_step))
        .route(
            "/proposal/{session_id}/sections/{section}/generate",
            post(generate_section),
        )
        .route(
            "/proposal/{session_id}/sections/{section}/feedback",
            post(apply_section_feedback),
        )
        .route("/proposal/{session_id}/sections/{section}", delete(clear_section))
        .route("/proposal/{session_id}/export", post(export_document))
        .route("/proposal/{session_id}/reset", post(reset_session))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Proposal Drafting Service",
        "version": "0.1.0",
        "description": "AI-assisted multi-section proposal drafting from uploaded source documents",
        "endpoints": {
            "POST /proposal/sessions": "Create a drafting session",
            "GET /proposal/{id}": "Session status",
            "POST /proposal/{id}/documents": "Upload and extract source documents",
            "POST /proposal/{id}/dispatch": "Run a generation action",
            "PUT /proposal/{id}/outline": "Replace the proposal outline",
            "POST /proposal/{id}/sections/{section}/generate": "Draft one section",
            "POST /proposal/{id}/sections/{section}/feedback": "Revise a drafted section",
            "DELETE /proposal/{id}/sections/{section}": "Clear a drafted section",
            "POST /proposal/{id}/export": "Export the assembled proposal",
            "POST /proposal/{id}/reset": "Reset the session",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn load_session(state: &AppState, session_id: &str) -> Result<ProposalSession, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

/// Persist after a mutating action. Persistence failure is reported in the
/// logs but never fails the request — the in-memory session keeps working
/// without durable backing.
async fn persist_session(state: &AppState, session: &ProposalSession) {
    if let Err(e) = state.session_storage.save(session).await {
        warn!(
            session_id = %session.id,
            "failed to persist session, continuing without durable backing: {}", e
        );
    }
}

async fn create_session(State(state): State<AppState>) -> ApiResult<CreateSessionResponse> {
    let session = ProposalSession::new();
    info!(session_id = %session.id, "creating proposal session");

    state.session_storage.save(&session).await.map_err(|e| {
        error!("Failed to create session: {}", e);
        internal_error("Failed to create session", &e.to_string())
    })?;

    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        status: "created".to_string(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = load_session(&state, &session_id).await?;

    let outline_text = session
        .state
        .get_string(session_keys::PROPOSAL_SECTIONS)
        .unwrap_or_else(|| ProposalOutline::default_template().to_string());
    let outline = ProposalOutline::parse(&outline_text);
    let drafts = load_drafts(&session.state);
    let mut drafted: Vec<String> = drafts.sections().map(str::to_string).collect();
    drafted.sort();

    Ok(Json(SessionResponse {
        session_id: session.id.clone(),
        current_step: session.state.get(session_keys::CURRENT_STEP).unwrap_or(1),
        current_section: session
            .state
            .get(session_keys::CURRENT_SECTION)
            .unwrap_or(0),
        outline_sections: outline.titles().iter().map(|t| t.to_string()).collect(),
        drafted_sections: drafted,
        corpus_chars: load_sources(&session.state).corpus().len(),
        proposal_settings: session
            .state
            .get(session_keys::PROPOSAL_SETTINGS)
            .unwrap_or(Value::Null),
    }))
}

async fn upload_documents(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<UploadDocumentsRequest>,
) -> ApiResult<UploadDocumentsResponse> {
    if request.files.is_empty() {
        return Err(bad_request_error("No files provided"));
    }
    let session = load_session(&state, &session_id).await?;

    let mut sources = load_sources(&session.state);
    let info_key = match request.origin {
        DocumentOrigin::Client => session_keys::CLIENT_INFO,
        DocumentOrigin::Company => session_keys::YOUR_INFO,
    };
    let mut org_info = load_info(&session.state, info_key);

    let mut extracted = Vec::new();
    let mut failures = Vec::new();

    for file in &request.files {
        let bytes = match STANDARD.decode(&file.content_base64) {
            Ok(bytes) => bytes,
            Err(_) => {
                failures.push(ExtractionFailureReport {
                    file: file.name.clone(),
                    cause: "invalid base64 content".to_string(),
                });
                continue;
            }
        };

        let upload = UploadedFile::new(&file.name, bytes);
        match ExtractedDocument::from_upload(request.origin, file.category, &upload) {
            Ok(document) => {
                sources.record_document(&document);
                org_info.files.push(crate::models::UploadedFileInfo {
                    name: document.name.clone(),
                    category: document.category,
                });
                extracted.push(ExtractedFileSummary {
                    name: document.name.clone(),
                    kind: document.kind,
                    category: document.category,
                    chars: document.text.len(),
                });
            }
            // One bad file never aborts the batch.
            Err(ProposalError::Extraction { file, cause }) => {
                warn!(file = %file, cause = %cause, "document extraction failed");
                failures.push(ExtractionFailureReport { file, cause });
            }
            Err(other) => return Err(pipeline_error(other)),
        }
    }

    save_sources(&session.state, &sources);
    session.state.set(info_key, &org_info);
    persist_session(&state, &session).await;

    info!(
        session_id = %session.id,
        extracted = extracted.len(),
        failed = failures.len(),
        "processed document upload batch"
    );
    Ok(Json(UploadDocumentsResponse { extracted, failures }))
}

/// Run a generation action verbatim. Performs no draft-store mutation —
/// callers decide where the result lands.
async fn dispatch_action(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<Value> {
    // Session must exist even though dispatch itself is stateless.
    let _session = load_session(&state, &session_id).await?;

    let output = state
        .dispatcher
        .dispatch_parts(&request.action, &request.params)
        .await
        .map_err(pipeline_error)?;

    Ok(Json(serde_json::to_value(&output).unwrap_or(Value::Null)))
}

async fn set_outline(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<OutlineRequest>,
) -> ApiResult<Value> {
    let outline = ProposalOutline::parse(&request.outline);
    if outline.is_empty() {
        return Err(bad_request_error("Outline contains no sections"));
    }
    let session = load_session(&state, &session_id).await?;

    // Drafts keyed by removed section titles are deliberately kept; the
    // export's ordered view skips them.
    session
        .state
        .set(session_keys::PROPOSAL_SECTIONS, &request.outline);
    session.state.set(
        session_keys::STRUCTURE_LAST_MODIFIED,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    persist_session(&state, &session).await;

    Ok(Json(json!({
        "status": "ok",
        "sections": outline.titles()
    })))
}

async fn set_info(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<InfoRequest>,
) -> ApiResult<Value> {
    let session = load_session(&state, &session_id).await?;

    if let Some(client_info) = request.client_info {
        session.state.set(session_keys::CLIENT_INFO, client_info);
    }
    if let Some(your_info) = request.your_info {
        session.state.set(session_keys::YOUR_INFO, your_info);
    }
    persist_session(&state, &session).await;

    Ok(Json(json!({ "status": "ok" })))
}

async fn set_settings(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SettingsRequest>,
) -> ApiResult<Value> {
    let session = load_session(&state, &session_id).await?;

    session.state.set(
        session_keys::PROPOSAL_SETTINGS,
        json!({ "type": request.proposal_type, "tone": request.tone }),
    );
    persist_session(&state, &session).await;

    Ok(Json(json!({ "status": "ok" })))
}

async fn set_step(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<StepRequest>,
) -> ApiResult<Value> {
    if !(1..=4).contains(&request.step) {
        return Err(bad_request_error("Step must be between 1 and 4"));
    }
    let session = load_session(&state, &session_id).await?;

    session.state.set(session_keys::CURRENT_STEP, request.step);
    persist_session(&state, &session).await;

    Ok(Json(json!({ "status": "ok", "current_step": request.step })))
}

async fn generate_section(
    State(state): State<AppState>,
    Path((session_id, section)): Path<(String, String)>,
) -> ApiResult<SectionDraftResponse> {
    let session = load_session(&state, &session_id).await?;

    let outline_text = session
        .state
        .get_string(session_keys::PROPOSAL_SECTIONS)
        .unwrap_or_else(|| ProposalOutline::default_template().to_string());
    let outline = ProposalOutline::parse(&outline_text);
    if !outline.contains(&section) {
        return Err(bad_request_error("Section is not part of the current outline"));
    }

    let client_info = load_info(&session.state, session_keys::CLIENT_INFO);
    let client_text = if !client_info.description.trim().is_empty() {
        client_info.description.clone()
    } else {
        client_info.name.clone()
    };
    let corpus = load_sources(&session.state).corpus().to_string();

    let bullets = outline.bullets_for(&section).unwrap_or_default();
    let bullet_prompt = if bullets.is_empty() {
        format!("- Content for {section}")
    } else {
        bullets
            .iter()
            .map(|b| format!("- {b}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let focus = format!(
        "Generate content ONLY for the '{section}' section. Focus exclusively on addressing \
         these specific aspects without any introduction, summary, or conclusion:\n{bullet_prompt}\n\
         Ensure the content directly addresses the requirements from the source documents and \
         aligns with the drafting organization's capabilities."
    );

    let action = action_for_section(&section);
    let mut params = serde_json::Map::new();
    params.insert("client_text".to_string(), json!(client_text));
    match action {
        "generate_timeline" => {
            params.insert("relevant_text".to_string(), json!(corpus));
            params.insert("additional_context".to_string(), json!(focus));
        }
        _ => {
            params.insert("extracted_text".to_string(), json!(corpus));
            params.insert("project_requirements".to_string(), json!(focus));
        }
    }

    let output = state
        .dispatcher
        .dispatch_parts(action, &params)
        .await
        .map_err(pipeline_error)?;
    let draft = output
        .technical_solution()
        .or_else(|| output.timeline())
        .ok_or_else(|| internal_error("Generation produced no draft field", action))?
        .to_string();

    let mut drafts = load_drafts(&session.state);
    drafts.store_draft(&section, &draft);
    save_drafts(&session.state, &drafts);
    if let Some(index) = outline.titles().iter().position(|t| *t == section) {
        session.state.set(session_keys::CURRENT_SECTION, index);
    }
    persist_session(&state, &session).await;

    info!(session_id = %session.id, section = %section, action, "section draft stored");
    Ok(Json(SectionDraftResponse { section, draft }))
}

async fn apply_section_feedback(
    State(state): State<AppState>,
    Path((session_id, section)): Path<(String, String)>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<SectionDraftResponse> {
    if request.feedback.trim().is_empty() {
        return Err(bad_request_error("Feedback cannot be empty"));
    }
    let session = load_session(&state, &session_id).await?;

    let mut drafts = load_drafts(&session.state);
    let revised = drafts
        .apply_feedback(&section, &request.feedback, &state.dispatcher)
        .await
        .map_err(pipeline_error)?;

    save_drafts(&session.state, &drafts);
    persist_session(&state, &session).await;

    info!(session_id = %session.id, section = %section, "feedback applied to draft");
    Ok(Json(SectionDraftResponse {
        section,
        draft: revised,
    }))
}

async fn clear_section(
    State(state): State<AppState>,
    Path((session_id, section)): Path<(String, String)>,
) -> ApiResult<ClearSectionResponse> {
    let session = load_session(&state, &session_id).await?;

    let mut drafts = load_drafts(&session.state);
    let cleared = drafts.clear(&section);
    save_drafts(&session.state, &drafts);
    persist_session(&state, &session).await;

    Ok(Json(ClearSectionResponse { section, cleared }))
}

async fn export_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<ExportResponse> {
    let session = load_session(&state, &session_id).await?;

    if let Some(cover) = &request.cover_page {
        session.state.set(session_keys::COVER_PAGE, cover);
    }
    if let Some(metadata) = &request.metadata {
        session.state.set(session_keys::METADATA, metadata);
    }

    let outline_text = session
        .state
        .get_string(session_keys::PROPOSAL_SECTIONS)
        .unwrap_or_else(|| ProposalOutline::default_template().to_string());
    let outline = ProposalOutline::parse(&outline_text);
    let drafts = load_drafts(&session.state);

    let client_info = load_info(&session.state, session_keys::CLIENT_INFO);
    let your_info = load_info(&session.state, session_keys::YOUR_INFO);
    let front = FrontMatter {
        prepared_for: Some(client_info.name).filter(|n| !n.trim().is_empty()),
        prepared_by: Some(your_info.name).filter(|n| !n.trim().is_empty()),
        cover_page: session.state.get_string(session_keys::COVER_PAGE),
        metadata: session.state.get_string(session_keys::METADATA),
    };

    let document = build_document(&drafts, &outline, &front);
    let docx_bytes = to_docx_bytes(&document).map_err(pipeline_error)?;
    persist_session(&state, &session).await;

    info!(session_id = %session.id, blocks = document.blocks.len(), "proposal exported");
    Ok(Json(ExportResponse {
        file_name: "Final_Proposal.docx".to_string(),
        blocks: document.blocks,
        docx_base64: STANDARD.encode(docx_bytes),
    }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    let session = load_session(&state, &session_id).await?;

    session.state.reset();
    persist_session(&state, &session).await;

    info!(session_id = %session.id, "session reset to step 1");
    Ok(Json(json!({ "status": "reset", "current_step": 1 })))
}
