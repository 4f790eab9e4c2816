//! Development REST backend serving the console's API contract from an
//! [`InMemoryService`].

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::BearerToken;
use crate::services::{
    AdjustmentPayload, ConsoleError, ErrorBody, InMemoryService, Level, LevelPayload,
    LoginRequest, LoginResponse, MonthlySales, Order, OrderPayload, ProfileUpdate, User,
    UserPayload,
};

/// Maps service failures onto `{"error": ...}` bodies.
#[derive(Debug)]
pub struct ApiError(pub ConsoleError);

impl From<ConsoleError> for ApiError {
    fn from(err: ConsoleError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(service: InMemoryService) -> Router {
    let api = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/user/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:order_id", put(update_order).delete(delete_order))
        .route("/levels", get(list_levels).post(save_level))
        .route("/levels/:level_id", delete(delete_level))
        .route("/sales/:user_id", get(sales_history))
        .route("/sales/:user_id/:year_month/adjust", post(adjust_sales));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

fn ok() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "service": "ok", "timestamp": Utc::now() })),
    )
}

async fn login(
    State(service): State<InMemoryService>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(service.open_session(&request)?))
}

async fn logout(
    State(service): State<InMemoryService>,
    token: BearerToken,
) -> ApiResult<Json<Value>> {
    service.close_session(token.as_str())?;
    Ok(ok())
}

async fn list_users(
    State(service): State<InMemoryService>,
    token: BearerToken,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(service.fetch_users(token.as_str())?))
}

async fn get_user(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(service.fetch_user(token.as_str(), &user_id)?))
}

async fn create_user(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Json(payload): Json<UserPayload>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    service.insert_user(token.as_str(), &payload)?;
    info!(user_id = %payload.user_id, "user created");
    Ok((StatusCode::CREATED, ok()))
}

/// Admins send the whole record (with `role`); staff send their own profile.
async fn update_user(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let invalid = |err: serde_json::Error| ConsoleError::Validation(err.to_string());
    if body.get("role").is_some() {
        let payload: UserPayload = serde_json::from_value(body).map_err(invalid)?;
        service.replace_user(token.as_str(), &user_id, &payload)?;
    } else {
        let update: ProfileUpdate = serde_json::from_value(body).map_err(invalid)?;
        service.patch_profile(token.as_str(), &user_id, &update)?;
    }
    Ok(ok())
}

async fn delete_user(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    service.remove_user(token.as_str(), &user_id)?;
    Ok(ok())
}

async fn list_orders(
    State(service): State<InMemoryService>,
    token: BearerToken,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(service.fetch_orders(token.as_str())?))
}

async fn create_order(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let order_id = service.insert_order(token.as_str(), &payload)?;
    info!(%order_id, total = payload.total_amount, "order created");
    Ok((StatusCode::CREATED, Json(json!({ "orderId": order_id }))))
}

async fn update_order(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path(order_id): Path<String>,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<Json<Value>> {
    service.replace_order(token.as_str(), &order_id, &payload)?;
    Ok(ok())
}

async fn delete_order(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Value>> {
    service.remove_order(token.as_str(), &order_id)?;
    Ok(ok())
}

async fn list_levels(
    State(service): State<InMemoryService>,
    token: BearerToken,
) -> ApiResult<Json<Vec<Level>>> {
    Ok(Json(service.fetch_levels(token.as_str())?))
}

async fn save_level(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Json(payload): Json<LevelPayload>,
) -> ApiResult<Json<Value>> {
    let level_id = service.upsert_level(token.as_str(), &payload)?;
    Ok(Json(json!({ "levelId": level_id })))
}

async fn delete_level(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path(level_id): Path<String>,
) -> ApiResult<Json<Value>> {
    service.remove_level(token.as_str(), &level_id)?;
    Ok(ok())
}

async fn sales_history(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<MonthlySales>>> {
    Ok(Json(service.fetch_sales(token.as_str(), &user_id)?))
}

async fn adjust_sales(
    State(service): State<InMemoryService>,
    token: BearerToken,
    Path((user_id, year_month)): Path<(String, String)>,
    Json(payload): Json<AdjustmentPayload>,
) -> ApiResult<Json<Value>> {
    service.set_adjustment(token.as_str(), &user_id, &year_month, payload.adjustment)?;
    info!(%user_id, %year_month, adjustment = payload.adjustment, "sales adjusted");
    Ok(ok())
}
