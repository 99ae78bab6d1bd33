// Account Service - REST API with Axum
//
// Handlers load from the store, run the account operations and commit
// through the store. Every failure ends up as a JSON body with a message:
// validation -> 400, missing account -> 404, anything else -> 500.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::coerce;
use crate::entities::{Account, AccountPatch, NewAccount};
use crate::error::AccountError;
use crate::operations::{self, FieldUpdate};
use crate::store::AccountStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn AccountStore>,
}

impl AppState {
    pub fn new(store: impl AccountStore + 'static) -> Self {
        AppState {
            store: Arc::new(store),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Success body for single-account endpoints
#[derive(Serialize)]
struct AccountResponse {
    message: &'static str,
    cuenta: Account,
}

#[derive(Serialize)]
struct AccountListResponse {
    message: &'static str,
    cuentas: Vec<Account>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

fn account_response(status: StatusCode, message: &'static str, account: Account) -> Response {
    (
        status,
        Json(AccountResponse {
            message,
            cuenta: account,
        }),
    )
        .into_response()
}

/// Error body: `{message}` for client errors, `{message, error}` for 500s
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// A failed request: the domain error, the message for the 500 case and the
/// message for the 404 case
#[derive(Debug)]
pub struct ApiError {
    error: AccountError,
    context: &'static str,
    not_found: &'static str,
}

impl ApiError {
    fn new(error: AccountError, context: &'static str) -> Self {
        ApiError {
            error,
            context,
            not_found: MSG_NOT_FOUND,
        }
    }

    fn with_not_found(mut self, message: &'static str) -> Self {
        self.not_found = message;
        self
    }

    pub fn status(&self) -> StatusCode {
        if self.error.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.error.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self.error {
            AccountError::InvalidAmount(detail) => {
                tracing::warn!("{}: invalid amount ({})", self.context, detail);
                ErrorBody {
                    message: "Monto inválido".to_string(),
                    error: None,
                }
            }
            AccountError::InsufficientFunds {
                requested,
                available,
            } => {
                tracing::warn!(requested, available, "{}: insufficient funds", self.context);
                ErrorBody {
                    message: "Fondos insuficientes".to_string(),
                    error: None,
                }
            }
            AccountError::NotFound(id) => {
                tracing::warn!(id = %id, "{}: account not found", self.context);
                ErrorBody {
                    message: self.not_found.to_string(),
                    error: None,
                }
            }
            other => {
                tracing::error!("{}: {}", self.context, other);
                ErrorBody {
                    message: self.context.to_string(),
                    error: Some(other.to_string()),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

const ERR_CREATE: &str = "Error al crear la cuenta";
const ERR_LIST: &str = "Error al obtener las cuentas";
const ERR_GET: &str = "Error al obtener la cuenta";
const ERR_UPDATE: &str = "Error al actualizar la cuenta";
const ERR_DEPOSIT: &str = "Error al consignar saldo";
const ERR_WITHDRAW: &str = "Error al retirar saldo";
const ERR_DELETE: &str = "Error al eliminar la cuenta";

const MSG_NOT_FOUND: &str = "Cuenta no encontrada";
const MSG_DELETE_NOT_FOUND: &str = "Cuenta no encontrada para eliminar";

// ============================================================================
// Requests
// ============================================================================

/// POST /accounts body. Fields stay loose so the coercion rules decide.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[serde(default, alias = "nroCuenta")]
    pub account_number: Option<Value>,
    #[serde(default, alias = "nombreCliente")]
    pub holder_name: Option<Value>,
    #[serde(default, alias = "saldo")]
    pub balance: Option<Value>,
    #[serde(default, alias = "totalTransacciones")]
    pub transaction_count: Option<Value>,
}

impl From<CreateAccountRequest> for NewAccount {
    fn from(req: CreateAccountRequest) -> Self {
        NewAccount {
            account_number: req.account_number.as_ref().and_then(coerce::to_integer),
            holder_name: req.holder_name.and_then(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            }),
            balance: coerce::number_or_zero(req.balance.as_ref()),
            transaction_count: coerce::number_or_zero(req.transaction_count.as_ref()),
        }
    }
}

/// PUT /accounts/consignar/:id and /accounts/retirar/:id body
#[derive(Debug, Default, Deserialize)]
pub struct AmountRequest {
    #[serde(default, alias = "amount")]
    pub monto: Option<Value>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// POST /accounts - Create an account
async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Response, ApiError> {
    let account = state
        .store
        .create(request.into())
        .map_err(|e| ApiError::new(e, ERR_CREATE))?;

    tracing::info!(id = %account.id, account_number = account.account_number, "account created");
    Ok(account_response(
        StatusCode::CREATED,
        "Cuenta creada exitosamente",
        account,
    ))
}

/// GET /accounts - List all accounts
async fn list_accounts(State(state): State<AppState>) -> Result<Response, ApiError> {
    let accounts = state
        .store
        .find_all()
        .map_err(|e| ApiError::new(e, ERR_LIST))?;

    Ok((
        StatusCode::OK,
        Json(AccountListResponse {
            message: "Cuentas obtenidas exitosamente",
            cuentas: accounts,
        }),
    )
        .into_response())
}

/// GET /accounts/:id - Get one account
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let account = state
        .store
        .find_by_id(&id)
        .map_err(|e| ApiError::new(e, ERR_GET))?;

    Ok(account_response(StatusCode::OK, "Cuenta encontrada", account))
}

/// PUT /accounts/:id - Update holder name and/or account number
async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let fail = |e| ApiError::new(e, ERR_UPDATE);

    let update = FieldUpdate::from_json(&body).map_err(fail)?;
    let mut account = state.store.find_by_id(&id).map_err(fail)?;

    operations::update_fields(&mut account, &update);
    let saved = state
        .store
        .update(&id, &AccountPatch::snapshot(&account))
        .map_err(fail)?;

    tracing::info!(id = %saved.id, "account fields updated");
    Ok(account_response(
        StatusCode::OK,
        "Cuenta actualizada exitosamente",
        saved,
    ))
}

/// PUT /accounts/consignar/:id - Deposit
async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Response, ApiError> {
    let fail = |e| ApiError::new(e, ERR_DEPOSIT);

    let amount = operations::parse_amount(request.monto.as_ref()).map_err(fail)?;
    let mut account = state.store.find_by_id(&id).map_err(fail)?;

    operations::deposit(&mut account, amount).map_err(fail)?;
    let saved = state
        .store
        .update(&id, &AccountPatch::snapshot(&account))
        .map_err(fail)?;

    tracing::info!(id = %saved.id, amount, balance = saved.balance, "deposit committed");
    Ok(account_response(StatusCode::OK, "Consignación exitosa", saved))
}

/// PUT /accounts/retirar/:id - Withdraw
async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Response, ApiError> {
    let fail = |e| ApiError::new(e, ERR_WITHDRAW);

    let amount = operations::parse_amount(request.monto.as_ref()).map_err(fail)?;
    let mut account = state.store.find_by_id(&id).map_err(fail)?;

    operations::withdraw(&mut account, amount).map_err(fail)?;
    let saved = state
        .store
        .update(&id, &AccountPatch::snapshot(&account))
        .map_err(fail)?;

    tracing::info!(id = %saved.id, amount, balance = saved.balance, "withdrawal committed");
    Ok(account_response(StatusCode::OK, "Retiro exitoso", saved))
}

/// DELETE /accounts/:id - Delete an account
async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let removed = state
        .store
        .delete(&id)
        .map_err(|e| ApiError::new(e, ERR_DELETE).with_not_found(MSG_DELETE_NOT_FOUND))?;

    tracing::info!(id = %removed.id, "account deleted");
    Ok(account_response(
        StatusCode::OK,
        "Cuenta eliminada exitosamente",
        removed,
    ))
}

// ============================================================================
// Router
// ============================================================================

/// Account routes, without middleware
pub fn account_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/consignar/:id", put(deposit))
        .route("/retirar/:id", put(withdraw))
        .route(
            "/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .with_state(state)
}

/// Full application: `/accounts`, `/health`, tracing and CORS layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/accounts", account_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
