use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::session::Session;

pub mod memory;

pub use memory::InMemoryService;

pub type ServiceResult<T> = Result<T, ConsoleError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("not signed in")]
    Unauthorized,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Non-success response; `message` is whatever the server put in `error`.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConsoleError::Unauthorized)
            || matches!(self, ConsoleError::Api { status: 401, .. })
    }

    /// HTTP status the development backend answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            ConsoleError::Unauthorized => 401,
            ConsoleError::PermissionDenied(_) => 403,
            ConsoleError::Validation(_) => 400,
            ConsoleError::NotFound(_) => 404,
            ConsoleError::Api { status, .. } => *status,
            ConsoleError::Network(_) | ConsoleError::Decode(_) => 502,
            ConsoleError::Internal(_) => 500,
        }
    }
}

pub fn ensure(condition: bool, error: ConsoleError) -> ServiceResult<()> {
    if condition { Ok(()) } else { Err(error) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Staff,
}

impl Role {
    /// Anything other than `admin` is treated as staff.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "admin" { Role::Admin } else { Role::Staff }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    Individual,
    Corporate,
}

impl BusinessType {
    pub fn from_tag(tag: &str) -> Self {
        if tag == "corporate" { BusinessType::Corporate } else { BusinessType::Individual }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            BusinessType::Individual => "individual",
            BusinessType::Corporate => "corporate",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pending" => Some(OrderStatus::Pending),
            "in_progress" => Some(OrderStatus::InProgress),
            "completed" => Some(OrderStatus::Completed),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub business_type: BusinessType,
    pub business_name: String,
    pub address: String,
    pub birthdate: String,
    pub role: Role,
    pub level: i64,
}

impl Default for User {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            name: String::new(),
            business_type: BusinessType::Individual,
            business_name: String::new(),
            address: String::new(),
            birthdate: String::new(),
            role: Role::Staff,
            level: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub user_id: String,
    pub amount: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    pub order_id: String,
    pub title: String,
    pub total_amount: i64,
    pub deadline: Option<String>,
    pub status: OrderStatus,
    pub assignments: Vec<Assignment>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Level {
    pub level_id: String,
    pub level_number: i64,
    pub description: String,
    pub required_sales: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesOrderLine {
    pub title: String,
    pub amount: i64,
    pub date: String,
}

/// One month of a user's sales as aggregated by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlySales {
    pub year_month: String,
    pub total_sales: i64,
    pub manual_adjustment: i64,
    pub orders: Vec<SalesOrderLine>,
}

impl MonthlySales {
    /// Sales coming from orders, i.e. the total without the manual adjustment.
    pub fn order_sales(&self) -> i64 {
        self.total_sales.saturating_sub(self.manual_adjustment)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

/// Body of `POST /users` and the admin's `PUT /user/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub user_id: String,
    pub name: String,
    pub business_type: BusinessType,
    pub business_name: String,
    pub address: String,
    pub birthdate: String,
    pub role: Role,
    pub level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body of a staff member's own `PUT /user/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub business_type: BusinessType,
    pub business_name: String,
    pub address: String,
    pub birthdate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub title: String,
    pub total_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub status: OrderStatus,
    pub assignments: Vec<Assignment>,
}

/// `POST /levels` updates when `level_id` is present and creates otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<String>,
    pub level_number: i64,
    pub description: String,
    pub required_sales: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustmentPayload {
    pub adjustment: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Create vs. edit for every editor surface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Creating,
    Editing(String),
}

impl EditMode {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditMode::Editing(_))
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            EditMode::Creating => None,
            EditMode::Editing(id) => Some(id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Message surfaced to the operator after an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct ConsoleContext {
    pub session: Option<Session>,
    pub notice: Option<Notice>,
}

impl ConsoleContext {
    pub fn new(session: Session) -> Self {
        Self {
            session: Some(session),
            notice: None,
        }
    }

    pub fn token(&self) -> ServiceResult<String> {
        self.session
            .as_ref()
            .map(|session| session.token.clone())
            .ok_or(ConsoleError::Unauthorized)
    }

    pub fn user_id(&self) -> ServiceResult<String> {
        self.session
            .as_ref()
            .map(|session| session.user_id.clone())
            .ok_or(ConsoleError::Unauthorized)
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        });
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

/// The backend REST contract.
///
/// The browser talks to the real API through an HTTP implementation; tests
/// and the development server use [`InMemoryService`].
#[async_trait(?Send)]
pub trait ConsoleService {
    async fn login(&self, request: &LoginRequest) -> ServiceResult<LoginResponse>;
    async fn logout(&self, token: &str) -> ServiceResult<()>;

    async fn list_users(&self, token: &str) -> ServiceResult<Vec<User>>;
    async fn get_user(&self, token: &str, user_id: &str) -> ServiceResult<User>;
    async fn create_user(&self, token: &str, payload: &UserPayload) -> ServiceResult<()>;
    async fn update_user(
        &self,
        token: &str,
        user_id: &str,
        payload: &UserPayload,
    ) -> ServiceResult<()>;
    async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> ServiceResult<()>;
    async fn delete_user(&self, token: &str, user_id: &str) -> ServiceResult<()>;

    async fn list_orders(&self, token: &str) -> ServiceResult<Vec<Order>>;
    async fn create_order(&self, token: &str, payload: &OrderPayload) -> ServiceResult<()>;
    async fn update_order(
        &self,
        token: &str,
        order_id: &str,
        payload: &OrderPayload,
    ) -> ServiceResult<()>;
    async fn delete_order(&self, token: &str, order_id: &str) -> ServiceResult<()>;

    async fn list_levels(&self, token: &str) -> ServiceResult<Vec<Level>>;
    async fn save_level(&self, token: &str, payload: &LevelPayload) -> ServiceResult<()>;
    async fn delete_level(&self, token: &str, level_id: &str) -> ServiceResult<()>;

    async fn sales_history(&self, token: &str, user_id: &str) -> ServiceResult<Vec<MonthlySales>>;
    async fn adjust_sales(
        &self,
        token: &str,
        user_id: &str,
        year_month: &str,
        adjustment: i64,
    ) -> ServiceResult<()>;
}

pub(crate) fn read_failed(ctx: &mut ConsoleContext, err: ConsoleError, what: &str) -> ConsoleError {
    error!(error = %err, what, "load failed");
    if !err.is_unauthorized() {
        ctx.fail(format!("{what}の取得に失敗しました"));
    }
    err
}

pub(crate) fn write_failed(ctx: &mut ConsoleContext, err: ConsoleError) -> ConsoleError {
    warn!(error = %err, "write rejected");
    if !err.is_unauthorized() {
        ctx.fail(err.to_string());
    }
    err
}

/// Local validation failure: reported, nothing sent.
pub(crate) fn rejected(ctx: &mut ConsoleContext, message: impl Into<String>) -> ConsoleError {
    let message = message.into();
    ctx.fail(message.clone());
    ConsoleError::Validation(message)
}

/// Parses a form field the way a number input reports it; blanks are `None`.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}
