use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use super::{
    Assignment, BusinessType, ConsoleError, ConsoleService, Level, LevelPayload, LoginRequest,
    LoginResponse, MonthlySales, Order, OrderPayload, OrderStatus, ProfileUpdate, Role,
    SalesOrderLine, ServiceResult, User, UserPayload, ensure,
};

#[derive(Clone, Debug)]
struct StoredUser {
    user: User,
    password: String,
}

#[derive(Clone, Debug)]
struct StoredOrder {
    order: Order,
    recorded_on: NaiveDate,
}

struct InMemoryState {
    users: Vec<StoredUser>,
    orders: Vec<StoredOrder>,
    levels: Vec<Level>,
    adjustments: HashMap<(String, String), i64>,
    sessions: HashMap<String, String>,
    next_order_id: i64,
    next_level_id: i64,
    next_session: u64,
    today: NaiveDate,
    requests: Vec<String>,
}

impl Default for InMemoryState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            orders: Vec::new(),
            levels: Vec::new(),
            adjustments: HashMap::new(),
            sessions: HashMap::new(),
            next_order_id: 1,
            next_level_id: 1,
            next_session: 1,
            today: Utc::now().date_naive(),
            requests: Vec::new(),
        }
    }
}

impl InMemoryState {
    fn user(&self, user_id: &str) -> Option<&StoredUser> {
        self.users.iter().find(|stored| stored.user.user_id == user_id)
    }

    fn user_mut(&mut self, user_id: &str) -> Option<&mut StoredUser> {
        self.users
            .iter_mut()
            .find(|stored| stored.user.user_id == user_id)
    }

    fn caller(&self, token: &str) -> ServiceResult<User> {
        let user_id = self.sessions.get(token).ok_or(ConsoleError::Unauthorized)?;
        self.user(user_id)
            .map(|stored| stored.user.clone())
            .ok_or(ConsoleError::Unauthorized)
    }

    fn admin(&self, token: &str) -> ServiceResult<User> {
        let caller = self.caller(token)?;
        ensure(
            caller.role == Role::Admin,
            ConsoleError::PermissionDenied("admin only".into()),
        )?;
        Ok(caller)
    }

    fn self_or_admin(&self, token: &str, user_id: &str) -> ServiceResult<User> {
        let caller = self.caller(token)?;
        ensure(
            caller.role == Role::Admin || caller.user_id == user_id,
            ConsoleError::PermissionDenied("other user's data".into()),
        )?;
        Ok(caller)
    }

    fn check_order(&self, payload: &OrderPayload) -> ServiceResult<()> {
        ensure(
            !payload.title.trim().is_empty(),
            ConsoleError::Validation("title is required".into()),
        )?;
        let assigned = payload
            .assignments
            .iter()
            .try_fold(0i64, |acc, a| acc.checked_add(a.amount))
            .ok_or_else(|| ConsoleError::Validation("assigned total is out of range".into()))?;
        ensure(
            assigned == payload.total_amount,
            ConsoleError::Validation(format!(
                "assigned total {assigned} does not match order total {}",
                payload.total_amount
            )),
        )?;
        for (idx, assignment) in payload.assignments.iter().enumerate() {
            ensure(
                assignment.amount > 0,
                ConsoleError::Validation("assignment amounts must be positive".into()),
            )?;
            ensure(
                !payload.assignments[..idx]
                    .iter()
                    .any(|earlier| earlier.user_id == assignment.user_id),
                ConsoleError::Validation(format!(
                    "user {} is assigned twice",
                    assignment.user_id
                )),
            )?;
            ensure(
                self.user(&assignment.user_id).is_some(),
                ConsoleError::Validation(format!("unknown user {}", assignment.user_id)),
            )?;
        }
        Ok(())
    }

    fn sales_for(&self, user_id: &str) -> Vec<MonthlySales> {
        let mut months: BTreeMap<String, MonthlySales> = BTreeMap::new();
        for stored in &self.orders {
            let Some(assignment) = stored
                .order
                .assignments
                .iter()
                .find(|a| a.user_id == user_id)
            else {
                continue;
            };
            let key = stored.recorded_on.format("%Y%m").to_string();
            let month = months.entry(key.clone()).or_insert_with(|| MonthlySales {
                year_month: key,
                ..MonthlySales::default()
            });
            month.total_sales = month.total_sales.saturating_add(assignment.amount);
            month.orders.push(SalesOrderLine {
                title: stored.order.title.clone(),
                amount: assignment.amount,
                date: stored.recorded_on.to_string(),
            });
        }
        for ((owner, year_month), adjustment) in &self.adjustments {
            if owner != user_id {
                continue;
            }
            let month = months
                .entry(year_month.clone())
                .or_insert_with(|| MonthlySales {
                    year_month: year_month.clone(),
                    ..MonthlySales::default()
                });
            month.manual_adjustment = *adjustment;
            month.total_sales = month.total_sales.saturating_add(*adjustment);
        }
        months.into_values().collect()
    }
}

/// REST contract backed by process memory.
///
/// Keeps a request log so callers can assert which endpoints were hit.
#[derive(Clone)]
pub struct InMemoryService {
    state: Arc<Mutex<InMemoryState>>,
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState::default())),
        }
    }
}

impl InMemoryService {
    pub fn new_with_sample() -> Self {
        let service = Self::default();
        if let Ok(mut state) = service.state.lock() {
            let today = state.today;
            state.users = vec![
                sample_user("admin", "管理者", Role::Admin, 1, "admin"),
                sample_user("tanaka", "田中 太郎", Role::Staff, 1, "password"),
                sample_user("suzuki", "鈴木 花子", Role::Staff, 2, "password"),
            ];
            state.levels = vec![
                sample_level("level-1", 1, "スタンダード", 0),
                sample_level("level-2", 2, "シルバー", 500_000),
                sample_level("level-3", 3, "ゴールド", 1_500_000),
            ];
            state.next_level_id = 4;
            state.orders = vec![StoredOrder {
                order: Order {
                    order_id: "order-1".into(),
                    title: "Webサイト制作".into(),
                    total_amount: 300_000,
                    deadline: None,
                    status: OrderStatus::InProgress,
                    assignments: vec![
                        Assignment {
                            user_id: "tanaka".into(),
                            amount: 200_000,
                        },
                        Assignment {
                            user_id: "suzuki".into(),
                            amount: 100_000,
                        },
                    ],
                    created_at: Some(today.to_string()),
                },
                recorded_on: today,
            }];
            state.next_order_id = 2;
        }
        service
    }

    /// Pins the date new orders are recorded on.
    pub fn with_today(self, today: NaiveDate) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.today = today;
        }
        self
    }

    fn state(&self) -> ServiceResult<MutexGuard<'_, InMemoryState>> {
        self.state
            .lock()
            .map_err(|_| ConsoleError::Internal("state lock poisoned".into()))
    }

    fn record(&self, request: String) {
        debug!(%request, "in-memory request");
        if let Ok(mut state) = self.state.lock() {
            state.requests.push(request);
        }
    }

    pub fn request_log(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    pub fn clear_request_log(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.requests.clear();
        }
    }

    pub fn seed_user(&self, user: User, password: &str) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.users.retain(|stored| stored.user.user_id != user.user_id);
        state.users.push(StoredUser {
            user,
            password: password.to_string(),
        });
        Ok(())
    }

    pub fn seed_level(&self, level: Level) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.levels.retain(|existing| existing.level_id != level.level_id);
        state.levels.push(level);
        Ok(())
    }

    /// Records an order on `recorded_on`, bypassing the admin check.
    pub fn seed_order(&self, payload: OrderPayload, recorded_on: NaiveDate) -> ServiceResult<String> {
        let mut state = self.state()?;
        state.check_order(&payload)?;
        let order_id = format!("order-{}", state.next_order_id);
        state.next_order_id += 1;
        state.orders.push(StoredOrder {
            order: order_from_payload(order_id.clone(), payload, recorded_on),
            recorded_on,
        });
        Ok(order_id)
    }

    pub fn open_session(&self, request: &LoginRequest) -> ServiceResult<LoginResponse> {
        let mut state = self.state()?;
        let user = state
            .user(&request.user_id)
            .filter(|stored| stored.password == request.password)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| ConsoleError::Api {
                status: 401,
                message: "ユーザーIDまたはパスワードが正しくありません".into(),
            })?;
        let token = format!("session-{}-{}", state.next_session, user.user_id);
        state.next_session += 1;
        state.sessions.insert(token.clone(), user.user_id.clone());
        info!(user_id = %user.user_id, "session opened");
        Ok(LoginResponse {
            token,
            user_id: user.user_id,
            name: user.name,
            role: user.role,
        })
    }

    pub fn close_session(&self, token: &str) -> ServiceResult<()> {
        let mut state = self.state()?;
        state
            .sessions
            .remove(token)
            .map(|_| ())
            .ok_or(ConsoleError::Unauthorized)
    }

    pub fn fetch_users(&self, token: &str) -> ServiceResult<Vec<User>> {
        let state = self.state()?;
        state.admin(token)?;
        Ok(state.users.iter().map(|stored| stored.user.clone()).collect())
    }

    pub fn fetch_user(&self, token: &str, user_id: &str) -> ServiceResult<User> {
        let state = self.state()?;
        state.self_or_admin(token, user_id)?;
        state
            .user(user_id)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| ConsoleError::NotFound(format!("user {user_id}")))
    }

    pub fn insert_user(&self, token: &str, payload: &UserPayload) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.admin(token)?;
        let user_id = payload.user_id.trim();
        ensure(
            !user_id.is_empty(),
            ConsoleError::Validation("user id is required".into()),
        )?;
        ensure(
            state.user(user_id).is_none(),
            ConsoleError::Validation(format!("user {user_id} already exists")),
        )?;
        let password = payload
            .password
            .clone()
            .filter(|password| !password.is_empty())
            .ok_or_else(|| ConsoleError::Validation("password is required".into()))?;
        let mut user = user_from_payload(payload);
        user.user_id = user_id.to_string();
        state.users.push(StoredUser { user, password });
        Ok(())
    }

    pub fn replace_user(
        &self,
        token: &str,
        user_id: &str,
        payload: &UserPayload,
    ) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.admin(token)?;
        let stored = state
            .user_mut(user_id)
            .ok_or_else(|| ConsoleError::NotFound(format!("user {user_id}")))?;
        let mut user = user_from_payload(payload);
        user.user_id = stored.user.user_id.clone();
        stored.user = user;
        if let Some(password) = payload.password.as_ref().filter(|p| !p.is_empty()) {
            stored.password = password.clone();
        }
        Ok(())
    }

    pub fn patch_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.self_or_admin(token, user_id)?;
        let stored = state
            .user_mut(user_id)
            .ok_or_else(|| ConsoleError::NotFound(format!("user {user_id}")))?;
        stored.user.name = update.name.clone();
        stored.user.business_type = update.business_type;
        stored.user.business_name = update.business_name.clone();
        stored.user.address = update.address.clone();
        stored.user.birthdate = update.birthdate.clone();
        if let Some(password) = update.new_password.as_ref().filter(|p| !p.is_empty()) {
            stored.password = password.clone();
        }
        Ok(())
    }

    pub fn remove_user(&self, token: &str, user_id: &str) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.admin(token)?;
        let before = state.users.len();
        state.users.retain(|stored| stored.user.user_id != user_id);
        ensure(
            state.users.len() < before,
            ConsoleError::NotFound(format!("user {user_id}")),
        )?;
        state.sessions.retain(|_, owner| owner != user_id);
        Ok(())
    }

    /// Admins see every order; staff only those they are assigned to.
    pub fn fetch_orders(&self, token: &str) -> ServiceResult<Vec<Order>> {
        let state = self.state()?;
        let caller = state.caller(token)?;
        Ok(state
            .orders
            .iter()
            .filter(|stored| {
                caller.role == Role::Admin
                    || stored
                        .order
                        .assignments
                        .iter()
                        .any(|a| a.user_id == caller.user_id)
            })
            .map(|stored| stored.order.clone())
            .collect())
    }

    pub fn insert_order(&self, token: &str, payload: &OrderPayload) -> ServiceResult<String> {
        let today = {
            let state = self.state()?;
            state.admin(token)?;
            state.today
        };
        self.seed_order(payload.clone(), today)
    }

    pub fn replace_order(
        &self,
        token: &str,
        order_id: &str,
        payload: &OrderPayload,
    ) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.admin(token)?;
        state.check_order(payload)?;
        let stored = state
            .orders
            .iter_mut()
            .find(|stored| stored.order.order_id == order_id)
            .ok_or_else(|| ConsoleError::NotFound(format!("order {order_id}")))?;
        stored.order = order_from_payload(order_id.to_string(), payload.clone(), stored.recorded_on);
        Ok(())
    }

    pub fn remove_order(&self, token: &str, order_id: &str) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.admin(token)?;
        let before = state.orders.len();
        state.orders.retain(|stored| stored.order.order_id != order_id);
        ensure(
            state.orders.len() < before,
            ConsoleError::NotFound(format!("order {order_id}")),
        )
    }

    pub fn fetch_levels(&self, token: &str) -> ServiceResult<Vec<Level>> {
        let state = self.state()?;
        state.caller(token)?;
        Ok(state.levels.clone())
    }

    pub fn upsert_level(&self, token: &str, payload: &LevelPayload) -> ServiceResult<String> {
        let mut state = self.state()?;
        state.admin(token)?;
        ensure(
            payload.level_number > 0,
            ConsoleError::Validation("level number must be positive".into()),
        )?;
        let clash = state.levels.iter().any(|level| {
            level.level_number == payload.level_number
                && Some(&level.level_id) != payload.level_id.as_ref()
        });
        ensure(
            !clash,
            ConsoleError::Validation(format!("level {} already exists", payload.level_number)),
        )?;
        match payload.level_id.as_deref() {
            Some(level_id) => {
                let level = state
                    .levels
                    .iter_mut()
                    .find(|level| level.level_id == level_id)
                    .ok_or_else(|| ConsoleError::NotFound(format!("level {level_id}")))?;
                level.level_number = payload.level_number;
                level.description = payload.description.clone();
                level.required_sales = payload.required_sales;
                Ok(level_id.to_string())
            }
            None => {
                let level_id = format!("level-{}", state.next_level_id);
                state.next_level_id += 1;
                state.levels.push(Level {
                    level_id: level_id.clone(),
                    level_number: payload.level_number,
                    description: payload.description.clone(),
                    required_sales: payload.required_sales,
                });
                Ok(level_id)
            }
        }
    }

    pub fn remove_level(&self, token: &str, level_id: &str) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.admin(token)?;
        let before = state.levels.len();
        state.levels.retain(|level| level.level_id != level_id);
        ensure(
            state.levels.len() < before,
            ConsoleError::NotFound(format!("level {level_id}")),
        )
    }

    /// Monthly sales, oldest month first.
    pub fn fetch_sales(&self, token: &str, user_id: &str) -> ServiceResult<Vec<MonthlySales>> {
        let state = self.state()?;
        state.self_or_admin(token, user_id)?;
        ensure(
            state.user(user_id).is_some(),
            ConsoleError::NotFound(format!("user {user_id}")),
        )?;
        Ok(state.sales_for(user_id))
    }

    pub fn set_adjustment(
        &self,
        token: &str,
        user_id: &str,
        year_month: &str,
        adjustment: i64,
    ) -> ServiceResult<()> {
        let mut state = self.state()?;
        state.admin(token)?;
        ensure(
            is_year_month(year_month),
            ConsoleError::Validation(format!("invalid year-month {year_month}")),
        )?;
        ensure(
            state.user(user_id).is_some(),
            ConsoleError::NotFound(format!("user {user_id}")),
        )?;
        state
            .adjustments
            .insert((user_id.to_string(), year_month.to_string()), adjustment);
        Ok(())
    }
}

#[async_trait(?Send)]
impl ConsoleService for InMemoryService {
    async fn login(&self, request: &LoginRequest) -> ServiceResult<LoginResponse> {
        self.record("POST /login".into());
        self.open_session(request)
    }

    async fn logout(&self, token: &str) -> ServiceResult<()> {
        self.record("POST /logout".into());
        self.close_session(token)
    }

    async fn list_users(&self, token: &str) -> ServiceResult<Vec<User>> {
        self.record("GET /users".into());
        self.fetch_users(token)
    }

    async fn get_user(&self, token: &str, user_id: &str) -> ServiceResult<User> {
        self.record(format!("GET /user/{user_id}"));
        self.fetch_user(token, user_id)
    }

    async fn create_user(&self, token: &str, payload: &UserPayload) -> ServiceResult<()> {
        self.record("POST /users".into());
        self.insert_user(token, payload)
    }

    async fn update_user(
        &self,
        token: &str,
        user_id: &str,
        payload: &UserPayload,
    ) -> ServiceResult<()> {
        self.record(format!("PUT /user/{user_id}"));
        self.replace_user(token, user_id, payload)
    }

    async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> ServiceResult<()> {
        self.record(format!("PUT /user/{user_id}"));
        self.patch_profile(token, user_id, update)
    }

    async fn delete_user(&self, token: &str, user_id: &str) -> ServiceResult<()> {
        self.record(format!("DELETE /user/{user_id}"));
        self.remove_user(token, user_id)
    }

    async fn list_orders(&self, token: &str) -> ServiceResult<Vec<Order>> {
        self.record("GET /orders".into());
        self.fetch_orders(token)
    }

    async fn create_order(&self, token: &str, payload: &OrderPayload) -> ServiceResult<()> {
        self.record("POST /orders".into());
        self.insert_order(token, payload).map(|_| ())
    }

    async fn update_order(
        &self,
        token: &str,
        order_id: &str,
        payload: &OrderPayload,
    ) -> ServiceResult<()> {
        self.record(format!("PUT /orders/{order_id}"));
        self.replace_order(token, order_id, payload)
    }

    async fn delete_order(&self, token: &str, order_id: &str) -> ServiceResult<()> {
        self.record(format!("DELETE /orders/{order_id}"));
        self.remove_order(token, order_id)
    }

    async fn list_levels(&self, token: &str) -> ServiceResult<Vec<Level>> {
        self.record("GET /levels".into());
        self.fetch_levels(token)
    }

    async fn save_level(&self, token: &str, payload: &LevelPayload) -> ServiceResult<()> {
        self.record("POST /levels".into());
        self.upsert_level(token, payload).map(|_| ())
    }

    async fn delete_level(&self, token: &str, level_id: &str) -> ServiceResult<()> {
        self.record(format!("DELETE /levels/{level_id}"));
        self.remove_level(token, level_id)
    }

    async fn sales_history(&self, token: &str, user_id: &str) -> ServiceResult<Vec<MonthlySales>> {
        self.record(format!("GET /sales/{user_id}"));
        self.fetch_sales(token, user_id)
    }

    async fn adjust_sales(
        &self,
        token: &str,
        user_id: &str,
        year_month: &str,
        adjustment: i64,
    ) -> ServiceResult<()> {
        self.record(format!("POST /sales/{user_id}/{year_month}/adjust"));
        self.set_adjustment(token, user_id, year_month, adjustment)
    }
}

fn is_year_month(raw: &str) -> bool {
    raw.len() == 6
        && raw.chars().all(|c| c.is_ascii_digit())
        && matches!(raw[4..].parse::<u32>(), Ok(1..=12))
}

fn user_from_payload(payload: &UserPayload) -> User {
    User {
        user_id: payload.user_id.clone(),
        name: payload.name.clone(),
        business_type: payload.business_type,
        business_name: payload.business_name.clone(),
        address: payload.address.clone(),
        birthdate: payload.birthdate.clone(),
        role: payload.role,
        level: payload.level.max(1),
    }
}

fn order_from_payload(order_id: String, payload: OrderPayload, recorded_on: NaiveDate) -> Order {
    Order {
        order_id,
        title: payload.title,
        total_amount: payload.total_amount,
        deadline: payload.deadline.filter(|deadline| !deadline.is_empty()),
        status: payload.status,
        assignments: payload.assignments,
        created_at: Some(recorded_on.to_string()),
    }
}

fn sample_user(user_id: &str, name: &str, role: Role, level: i64, password: &str) -> StoredUser {
    StoredUser {
        user: User {
            user_id: user_id.into(),
            name: name.into(),
            business_type: BusinessType::Individual,
            role,
            level,
            ..User::default()
        },
        password: password.into(),
    }
}

fn sample_level(level_id: &str, level_number: i64, description: &str, required_sales: i64) -> Level {
    Level {
        level_id: level_id.into(),
        level_number,
        description: description.into(),
        required_sales,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn admin_token(service: &InMemoryService) -> String {
        service
            .open_session(&LoginRequest {
                user_id: "admin".into(),
                password: "admin".into(),
            })
            .unwrap()
            .token
    }

    #[test]
    fn login_rejects_wrong_password() {
        let service = InMemoryService::new_with_sample();
        let err = service
            .open_session(&LoginRequest {
                user_id: "admin".into(),
                password: "nope".into(),
            })
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn staff_cannot_list_users() {
        let service = InMemoryService::new_with_sample();
        let token = service
            .open_session(&LoginRequest {
                user_id: "tanaka".into(),
                password: "password".into(),
            })
            .unwrap()
            .token;
        assert!(matches!(
            service.fetch_users(&token),
            Err(ConsoleError::PermissionDenied(_))
        ));
    }

    #[test]
    fn mismatched_assignments_are_rejected() {
        let service = InMemoryService::new_with_sample();
        let token = admin_token(&service);
        let payload = OrderPayload {
            title: "Banner".into(),
            total_amount: 1000,
            deadline: None,
            status: OrderStatus::Pending,
            assignments: vec![Assignment {
                user_id: "tanaka".into(),
                amount: 900,
            }],
        };
        assert!(matches!(
            service.insert_order(&token, &payload),
            Err(ConsoleError::Validation(_))
        ));
    }

    #[test]
    fn overflowing_split_is_rejected_and_state_stays_usable() {
        let service = InMemoryService::new_with_sample();
        let token = admin_token(&service);
        let payload = OrderPayload {
            title: "Huge".into(),
            total_amount: -2,
            deadline: None,
            status: OrderStatus::Pending,
            assignments: vec![
                Assignment {
                    user_id: "tanaka".into(),
                    amount: i64::MAX,
                },
                Assignment {
                    user_id: "suzuki".into(),
                    amount: i64::MAX,
                },
            ],
        };
        assert!(matches!(
            service.insert_order(&token, &payload),
            Err(ConsoleError::Validation(_))
        ));
        assert_eq!(service.fetch_orders(&token).unwrap().len(), 1);
        assert!(service.fetch_levels(&token).is_ok());
    }

    #[test]
    fn extreme_adjustment_saturates_month_total() {
        let service = InMemoryService::new_with_sample().with_today(date(2024, 3, 10));
        let token = admin_token(&service);
        service
            .seed_order(
                OrderPayload {
                    title: "Logo".into(),
                    total_amount: 1000,
                    deadline: None,
                    status: OrderStatus::Completed,
                    assignments: vec![Assignment {
                        user_id: "tanaka".into(),
                        amount: 1000,
                    }],
                },
                date(2024, 3, 5),
            )
            .unwrap();
        service
            .set_adjustment(&token, "tanaka", "202403", i64::MAX)
            .unwrap();

        let sales = service.fetch_sales(&token, "tanaka").unwrap();
        let march = sales.iter().find(|m| m.year_month == "202403").unwrap();
        assert_eq!(march.total_sales, i64::MAX);
        assert!(service.fetch_levels(&token).is_ok());
    }

    #[test]
    fn sales_aggregate_orders_and_adjustments_by_month() {
        let service = InMemoryService::new_with_sample().with_today(date(2024, 3, 10));
        let token = admin_token(&service);
        service
            .seed_order(
                OrderPayload {
                    title: "Logo".into(),
                    total_amount: 1000,
                    deadline: None,
                    status: OrderStatus::Completed,
                    assignments: vec![Assignment {
                        user_id: "tanaka".into(),
                        amount: 1000,
                    }],
                },
                date(2024, 1, 15),
            )
            .unwrap();
        service.set_adjustment(&token, "tanaka", "202402", -200).unwrap();

        let sales = service.fetch_sales(&token, "tanaka").unwrap();
        let keys: Vec<&str> = sales.iter().map(|m| m.year_month.as_str()).collect();
        assert_eq!(keys.first(), Some(&"202401"));
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        let february = sales.iter().find(|m| m.year_month == "202402").unwrap();
        assert_eq!(february.total_sales, -200);
        assert_eq!(february.order_sales(), 0);
    }

    #[test]
    fn level_upsert_rejects_duplicate_number() {
        let service = InMemoryService::new_with_sample();
        let token = admin_token(&service);
        let err = service
            .upsert_level(
                &token,
                &LevelPayload {
                    level_id: None,
                    level_number: 2,
                    description: "dup".into(),
                    required_sales: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
    }

    #[test]
    fn year_month_validation() {
        assert!(is_year_month("202412"));
        assert!(!is_year_month("202413"));
        assert!(!is_year_month("2024-1"));
    }
}
