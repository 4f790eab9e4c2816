use async_trait::async_trait;
use commission_console::config::ApiConfig;
use commission_console::services::{
    AdjustmentPayload, ConsoleError, ConsoleService, ErrorBody, Level, LevelPayload, LoginRequest,
    LoginResponse, MonthlySales, Order, OrderPayload, ProfileUpdate, ServiceResult, User,
    UserPayload,
};
use reqwasm::http::{Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Browser transport for the REST API.
#[derive(Clone, Debug)]
pub struct HttpService {
    config: ApiConfig,
}

pub fn http() -> HttpService {
    HttpService::new(ApiConfig::compiled())
}

impl HttpService {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Request {
        let mut req = Request::new(&self.config.url(path)).method(method);
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        req
    }

    async fn send(req: Request) -> ServiceResult<String> {
        let resp = req
            .send()
            .await
            .map_err(|e| ConsoleError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ConsoleError::Network(e.to_string()))?;
        if !resp.ok() {
            return Err(api_error(status, &text));
        }
        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> ServiceResult<T> {
        let text = Self::send(self.request(Method::GET, path, Some(token))).await?;
        serde_json::from_str(&text).map_err(|e| ConsoleError::Decode(e.to_string()))
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ServiceResult<String> {
        let body = serde_json::to_string(body).map_err(|e| ConsoleError::Decode(e.to_string()))?;
        let req = self
            .request(method, path, token)
            .header("Content-Type", "application/json")
            .body(body);
        Self::send(req).await
    }

    async fn delete(&self, path: &str, token: &str) -> ServiceResult<()> {
        Self::send(self.request(Method::DELETE, path, Some(token))).await?;
        Ok(())
    }
}

/// Prefers the server's `{"error": ...}` message over the raw body.
fn api_error(status: u16, text: &str) -> ConsoleError {
    let message = match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => body.error,
        Err(_) if text.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => text.to_string(),
    };
    ConsoleError::Api { status, message }
}

#[async_trait(?Send)]
impl ConsoleService for HttpService {
    async fn login(&self, request: &LoginRequest) -> ServiceResult<LoginResponse> {
        let text = self.send_json(Method::POST, "/login", None, request).await?;
        serde_json::from_str(&text).map_err(|e| ConsoleError::Decode(e.to_string()))
    }

    async fn logout(&self, token: &str) -> ServiceResult<()> {
        Self::send(self.request(Method::POST, "/logout", Some(token))).await?;
        Ok(())
    }

    async fn list_users(&self, token: &str) -> ServiceResult<Vec<User>> {
        self.get_json("/users", token).await
    }

    async fn get_user(&self, token: &str, user_id: &str) -> ServiceResult<User> {
        self.get_json(&format!("/user/{user_id}"), token).await
    }

    async fn create_user(&self, token: &str, payload: &UserPayload) -> ServiceResult<()> {
        self.send_json(Method::POST, "/users", Some(token), payload).await?;
        Ok(())
    }

    async fn update_user(
        &self,
        token: &str,
        user_id: &str,
        payload: &UserPayload,
    ) -> ServiceResult<()> {
        let path = format!("/user/{user_id}");
        self.send_json(Method::PUT, &path, Some(token), payload).await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> ServiceResult<()> {
        let path = format!("/user/{user_id}");
        self.send_json(Method::PUT, &path, Some(token), update).await?;
        Ok(())
    }

    async fn delete_user(&self, token: &str, user_id: &str) -> ServiceResult<()> {
        self.delete(&format!("/user/{user_id}"), token).await
    }

    async fn list_orders(&self, token: &str) -> ServiceResult<Vec<Order>> {
        self.get_json("/orders", token).await
    }

    async fn create_order(&self, token: &str, payload: &OrderPayload) -> ServiceResult<()> {
        self.send_json(Method::POST, "/orders", Some(token), payload).await?;
        Ok(())
    }

    async fn update_order(
        &self,
        token: &str,
        order_id: &str,
        payload: &OrderPayload,
    ) -> ServiceResult<()> {
        let path = format!("/orders/{order_id}");
        self.send_json(Method::PUT, &path, Some(token), payload).await?;
        Ok(())
    }

    async fn delete_order(&self, token: &str, order_id: &str) -> ServiceResult<()> {
        self.delete(&format!("/orders/{order_id}"), token).await
    }

    async fn list_levels(&self, token: &str) -> ServiceResult<Vec<Level>> {
        self.get_json("/levels", token).await
    }

    async fn save_level(&self, token: &str, payload: &LevelPayload) -> ServiceResult<()> {
        self.send_json(Method::POST, "/levels", Some(token), payload).await?;
        Ok(())
    }

    async fn delete_level(&self, token: &str, level_id: &str) -> ServiceResult<()> {
        self.delete(&format!("/levels/{level_id}"), token).await
    }

    async fn sales_history(&self, token: &str, user_id: &str) -> ServiceResult<Vec<MonthlySales>> {
        self.get_json(&format!("/sales/{user_id}"), token).await
    }

    async fn adjust_sales(
        &self,
        token: &str,
        user_id: &str,
        year_month: &str,
        adjustment: i64,
    ) -> ServiceResult<()> {
        let path = format!("/sales/{user_id}/{year_month}/adjust");
        let body = AdjustmentPayload { adjustment };
        self.send_json(Method::POST, &path, Some(token), &body).await?;
        Ok(())
    }
}
