use axum::Json;
use axum::extract::Path as AxumPath;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use gateway_core::Gated;
use gateway_protocol::http::ApprovalActionRequest;
use gateway_protocol::http::ApprovalListResponse;
use gateway_protocol::http::ApprovalResponse;
use gateway_protocol::http::EditRequest;
use gateway_protocol::http::EditResponse;
use gateway_protocol::http::ErrorResponse;
use gateway_protocol::http::ExecuteRequest;
use gateway_protocol::http::ExecuteResponse;
use gateway_protocol::http::HealthResponse;
use gateway_protocol::http::IndexRefreshResponse;
use gateway_protocol::http::ReadRequest;
use gateway_protocol::http::ReadResponse;
use gateway_protocol::http::StructureRequest;
use gateway_protocol::http::StructureResponse;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/structure", post(structure))
        .route("/read", post(read))
        .route("/edit", post(edit))
        .route("/execute", post(execute))
        .route("/index/refresh", post(refresh_index))
        .route("/approvals", get(list_approvals))
        .route("/approvals/{id}", get(get_approval).patch(patch_approval))
        .with_state(state)
}

const USER_ID_HEADER: &str = "x-user-id";

fn user_id(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    success: false,
                    error: "missing_user_id".to_string(),
                    detail: format!("{USER_ID_HEADER} header is required"),
                }),
            )
                .into_response()
        })
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let exists = state.config.workspace_root.is_dir();
    Json(HealthResponse {
        status: "healthy",
        workspace_root: state.config.workspace_root.display().to_string(),
        workspace_exists: exists,
    })
}

async fn structure(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<StructureRequest>,
) -> Response {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state
        .adapter
        .read_structure(&user, &body.path, body.depth, body.include_hidden, body.pattern.as_deref())
        .await
    {
        Ok(result) => Json(StructureResponse {
            success: true,
            root: result.root.display().to_string(),
            stats: gateway_protocol::http::StructureStats {
                total_files: result.total_files,
                total_dirs: result.total_dirs,
                returned: result.entries.len(),
            },
            tree: result.entries,
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

async fn read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ReadRequest>,
) -> Response {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state.adapter.read_file(&user, &body.path, body.line_start, body.line_end).await {
        Ok(outcome) => Json(ReadResponse {
            success: true,
            content: outcome.content,
            is_binary: outcome.is_binary,
            truncated: outcome.truncated,
            total_lines: outcome.total_lines,
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EditRequest>,
) -> Response {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let result = state
        .adapter
        .edit_file(&user, &body.path, body.edits, body.create_if_missing, false)
        .await;

    match result {
        Ok(Gated::Completed(outcome)) => Json(EditResponse {
            success: true,
            diff: outcome.diff,
            approval_id: None,
            sensitivity: None,
        })
        .into_response(),
        Ok(Gated::PendingApproval { approval_id, sensitivity }) => Json(EditResponse {
            success: false,
            diff: String::new(),
            approval_id: Some(approval_id),
            sensitivity: Some(sensitivity),
        })
        .into_response(),
        Ok(Gated::Denied { approval_id }) => Json(EditResponse {
            success: false,
            diff: String::new(),
            approval_id: Some(approval_id),
            sensitivity: None,
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

async fn execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ExecuteRequest>,
) -> Response {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let result = state
        .adapter
        .execute(&user, &body.command, body.cwd.as_deref(), body.timeout_secs, false)
        .await;

    match result {
        Ok(Gated::Completed(outcome)) => Json(ExecuteResponse {
            success: outcome.exit_code == 0,
            exit_code: outcome.exit_code,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            approval_id: None,
            sensitivity: None,
        })
        .into_response(),
        Ok(Gated::PendingApproval { approval_id, sensitivity }) => Json(ExecuteResponse {
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: "awaiting approval".to_string(),
            approval_id: Some(approval_id),
            sensitivity: Some(sensitivity),
        })
        .into_response(),
        Ok(Gated::Denied { approval_id }) => Json(ExecuteResponse {
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: "operation was not approved".to_string(),
            approval_id: Some(approval_id),
            sensitivity: None,
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

async fn refresh_index(State(state): State<AppState>) -> Response {
    match state.adapter.refresh_index().await {
        Ok(count) => Json(IndexRefreshResponse { success: true, entries_indexed: count }).into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

async fn list_approvals(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let approvals = state.approvals.get_pending_for_user(&user);
    let count = approvals.len();
    Json(ApprovalListResponse { success: true, approvals, count }).into_response()
}

async fn get_approval(State(state): State<AppState>, AxumPath(id): AxumPath<String>) -> Response {
    match state.approvals.get_status(&id) {
        Some(approval) => Json(ApprovalResponse { success: true, approval }).into_response(),
        None => ApiError(gateway_core::GatewayError::ApprovalNotFound { id }).into_response(),
    }
}

async fn patch_approval(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(body): Json<ApprovalActionRequest>,
) -> Response {
    let outcome = match gateway_protocol::ApprovalStatus::from(body.status) {
        gateway_protocol::ApprovalStatus::Approved => state.approvals.approve(&id),
        _ => state.approvals.reject(&id),
    };

    match outcome {
        Ok(approval) => Json(ApprovalResponse { success: true, approval }).into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}
