use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::chain::ContractReader;
use crate::config::Config;
use crate::engine::evaluator::evaluate_eligibility;
use crate::engine::{EligibilityReport, EvalError};
use crate::rules::builder::default_rules;
use crate::rules::Rule;
use crate::tokens::{NewToken, StoreError, TokenRecord, TokenStore};

#[derive(Clone)]
struct ApiState {
    config: Config,
    store: Arc<dyn TokenStore>,
    reader: Arc<dyn ContractReader>,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
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

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateName(_) | StoreError::DuplicateAddress(_) => {
                ApiError::conflict(error.to_string())
            }
            StoreError::Persistence(_) => ApiError::internal(error),
            _ => ApiError::bad_request(error.to_string()),
        }
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// Names a registered token either by numeric id or by its unique name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TokenSelector {
    Id(u64),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct RulesRequest {
    token: TokenSelector,
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    token: TokenSelector,
    address: String,
    rules: Option<Vec<Rule>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct TokensResponse {
    tokens: Vec<TokenRecord>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: bool,
}

#[derive(Debug, Serialize)]
struct RulesResponse {
    token: String,
    rules: Vec<Rule>,
}

pub async fn run_server(
    config: Config,
    store: Arc<dyn TokenStore>,
    reader: Arc<dyn ContractReader>,
    bind: SocketAddr,
) -> Result<()> {
    let state = ApiState {
        config,
        store,
        reader,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/tokens", get(list_tokens).post(create_token))
        .route("/v1/tokens/:id", delete(remove_token))
        .route("/v1/rules", post(token_rules))
        .route("/v1/check", post(check))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn list_tokens(State(state): State<ApiState>) -> ApiResult<TokensResponse> {
    let tokens = state.store.list()?;
    Ok(ok(TokensResponse { tokens }))
}

async fn create_token(
    State(state): State<ApiState>,
    Json(request): Json<NewToken>,
) -> ApiResult<TokenRecord> {
    let record = state.store.insert(request)?;
    info!(id = record.id, name = %record.name, "registered token");
    Ok(ok(record))
}

async fn remove_token(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> ApiResult<DeleteResponse> {
    if !state.store.delete(id)? {
        return Err(ApiError::not_found(format!("no token with id {id}")));
    }
    Ok(ok(DeleteResponse { deleted: true }))
}

async fn token_rules(
    State(state): State<ApiState>,
    Json(request): Json<RulesRequest>,
) -> ApiResult<RulesResponse> {
    let token = resolve_token(&state, &request.token)?;
    let rules = default_rules(&token.abi);
    Ok(ok(RulesResponse {
        token: token.name,
        rules,
    }))
}

async fn check(
    State(state): State<ApiState>,
    Json(request): Json<CheckRequest>,
) -> ApiResult<EligibilityReport> {
    let token = resolve_token(&state, &request.token)?;
    let rules = match request.rules {
        Some(rules) if rules.is_empty() => {
            return Err(ApiError::bad_request("rule list cannot be empty"));
        }
        Some(rules) => rules,
        None => default_rules(&token.abi),
    };

    let report = evaluate_eligibility(
        state.reader.as_ref(),
        &token,
        &request.address,
        &rules,
        state.config.evaluation.default_decimals,
    )
    .await
    .map_err(|error| match error {
        EvalError::InvalidAddress(_) | EvalError::InvalidAbi(_) => {
            ApiError::bad_request(error.to_string())
        }
    })?;
    Ok(ok(report))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn resolve_token(
    state: &ApiState,
    selector: &TokenSelector,
) -> std::result::Result<TokenRecord, ApiError> {
    let found = match selector {
        TokenSelector::Id(id) => state.store.get(*id)?,
        TokenSelector::Name(name) => state.store.find_by_name(name)?,
    };
    found.ok_or_else(|| match selector {
        TokenSelector::Id(id) => ApiError::not_found(format!("no token with id {id}")),
        TokenSelector::Name(name) => ApiError::not_found(format!("no token named {name}")),
    })
}
