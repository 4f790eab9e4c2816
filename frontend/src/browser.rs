use commission_console::services::{ConsoleContext, NoticeLevel, ServiceResult};
use commission_console::session::{Page, SessionStore};
use dioxus::prelude::*;
use tracing::warn;

fn window() -> Option<web_sys::Window> {
    web_sys::window()
}

fn local_storage() -> Option<web_sys::Storage> {
    window().and_then(|win| win.local_storage().ok().flatten())
}

/// `localStorage`-backed session cache.
#[derive(Clone, Copy, Default)]
pub struct LocalStore;

impl SessionStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage().and_then(|storage| storage.get_item(key).ok().flatten())
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, value);
        }
    }

    fn clear(&self) {
        if let Some(storage) = local_storage() {
            let _ = storage.clear();
        }
    }
}

pub fn current_page() -> Page {
    let path = window()
        .and_then(|win| win.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string());
    Page::from_path(&path)
}

pub fn redirect(page: Page) {
    if let Some(win) = window() {
        let _ = win.location().set_href(page.path());
    }
}

pub fn alert(message: &str) {
    if let Some(win) = window() {
        let _ = win.alert_with_message(message);
    }
}

pub fn confirm(message: &str) -> bool {
    window()
        .and_then(|win| win.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Writes an action's outcome back: a rejected credential goes to the
/// login page, any notice becomes the status line and an alert.
pub fn settle(
    mut ctx_sig: Signal<ConsoleContext>,
    mut status: Signal<String>,
    mut ctx: ConsoleContext,
    result: ServiceResult<()>,
) {
    if let Err(err) = &result {
        if err.is_unauthorized() {
            warn!(error = %err, "session rejected");
            redirect(Page::Login);
            return;
        }
    }
    if let Some(notice) = ctx.take_notice() {
        if notice.level == NoticeLevel::Error {
            warn!(message = %notice.message, "action failed");
        }
        alert(&notice.message);
        status.set(notice.message);
    }
    ctx_sig.set(ctx);
}
