use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::services::{ConsoleError, ConsoleService, LoginRequest, Role, ServiceResult};

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "userId";
pub const USER_NAME_KEY: &str = "userName";
pub const USER_ROLE_KEY: &str = "userRole";

/// Browser-local key/value storage holding the signed-in user.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn clear(&self);
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn is_empty(&self) -> bool {
        self.inner.lock().map(|map| map.is_empty()).unwrap_or(true)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().ok().and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut map) = self.inner.lock() {
            map.clear();
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Login,
    AdminConsole,
    StaffConsole,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Page::Login => "/",
            Page::AdminConsole => "/admin",
            Page::StaffConsole => "/staff",
        }
    }

    pub fn from_path(path: &str) -> Self {
        if path.starts_with("/admin") {
            Page::AdminConsole
        } else if path.starts_with("/staff") {
            Page::StaffConsole
        } else {
            Page::Login
        }
    }

    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Admin => Page::AdminConsole,
            Role::Staff => Page::StaffConsole,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed(Session),
    Redirect(Page),
}

pub fn load_session<St: SessionStore>(store: &St) -> Option<Session> {
    let token = store.get(TOKEN_KEY).filter(|token| !token.is_empty())?;
    Some(Session {
        token,
        user_id: store.get(USER_ID_KEY).unwrap_or_default(),
        user_name: store.get(USER_NAME_KEY).unwrap_or_default(),
        role: Role::from_tag(&store.get(USER_ROLE_KEY).unwrap_or_default()),
    })
}

/// Decides whether `page` may initialize with the cached credential.
///
/// Admins landing on the staff console are sent to the admin console.
pub fn guard<St: SessionStore>(store: &St, page: Page) -> GuardOutcome {
    let Some(session) = load_session(store) else {
        return GuardOutcome::Redirect(Page::Login);
    };
    match (page, session.role) {
        (Page::AdminConsole, Role::Staff) => GuardOutcome::Redirect(Page::Login),
        (Page::StaffConsole, Role::Admin) => GuardOutcome::Redirect(Page::AdminConsole),
        _ => GuardOutcome::Proceed(session),
    }
}

/// Signs in and caches the credential; returns the console to open.
pub async fn login<S: ConsoleService, St: SessionStore>(
    service: &S,
    store: &St,
    user_id: &str,
    password: &str,
) -> ServiceResult<Page> {
    if user_id.trim().is_empty() || password.is_empty() {
        return Err(ConsoleError::Validation(
            "ユーザーIDとパスワードを入力してください".into(),
        ));
    }
    let request = LoginRequest {
        user_id: user_id.trim().to_string(),
        password: password.to_string(),
    };
    let response = service.login(&request).await.map_err(|err| match err {
        ConsoleError::Api { message, .. } if !message.is_empty() => {
            ConsoleError::Validation(message)
        }
        ConsoleError::Validation(message) => ConsoleError::Validation(message),
        _ => ConsoleError::Validation("ログインに失敗しました".into()),
    })?;
    store.set(TOKEN_KEY, &response.token);
    store.set(USER_ID_KEY, &response.user_id);
    store.set(USER_NAME_KEY, &response.name);
    store.set(USER_ROLE_KEY, response.role.as_tag());
    info!(user_id = %response.user_id, role = response.role.as_tag(), "signed in");
    Ok(Page::home_for(response.role))
}

/// Notifies the server, then always drops the local session.
pub async fn logout<S: ConsoleService, St: SessionStore>(service: &S, store: &St) -> Page {
    if let Some(session) = load_session(store) {
        if let Err(err) = service.logout(&session.token).await {
            warn!(error = %err, "server logout failed, clearing local session anyway");
        }
    }
    store.clear();
    Page::Login
}

pub fn remember_user_name<St: SessionStore>(store: &St, name: &str) {
    store.set(USER_NAME_KEY, name);
}
