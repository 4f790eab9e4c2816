use commission_console::session::{Page, login};
use dioxus::prelude::*;

mod admin;
mod api;
mod browser;
mod staff;

use api::http;
use browser::{LocalStore, current_page, redirect};

fn main() {
    launch(App);
}

// ---------- App ----------
fn App() -> Element {
    let page = use_hook(current_page);

    rsx! {
        style { {STYLE} }
        div { class: "app-shell",
            {match page {
                Page::Login => rsx! { LoginPage {} },
                Page::AdminConsole => rsx! { admin::AdminPage {} },
                Page::StaffConsole => rsx! { staff::StaffPage {} },
            }}
        }
    }
}

fn LoginPage() -> Element {
    let mut user_id = use_signal(|| "".to_string());
    let mut password = use_signal(|| "".to_string());
    let mut error = use_signal(|| "".to_string());
    let mut busy = use_signal(|| false);

    let submit = move || {
        let user = user_id.read().clone();
        let pass = password.read().clone();
        spawn(async move {
            busy.set(true);
            error.set("".into());
            match login(&http(), &LocalStore, &user, &pass).await {
                Ok(page) => redirect(page),
                Err(err) => {
                    error.set(err.to_string());
                    busy.set(false);
                }
            }
        });
    };

    rsx! {
        section { class: "panel login",
            h1 { "売上管理システム" }
            p { class: "muted", "ユーザーIDとパスワードでログインしてください" }
            label { "ユーザーID" }
            input { value: "{user_id.read()}", oninput: move |evt| user_id.set(evt.value()), placeholder: "user id" }
            label { "パスワード" }
            input { value: "{password.read()}", oninput: move |evt| password.set(evt.value()), r#type: "password",
                onkeydown: move |evt| if evt.key() == Key::Enter { submit() } }
            {if !error.read().is_empty() { rsx! { div { class: "error", "{error.read()}" } } } else { rsx! {} }}
            div { class: "actions",
                button { disabled: *busy.read(), onclick: move |_| submit(), "ログイン" }
            }
        }
    }
}

// ---------- Styles ----------
const STYLE: &str = r#"
:root { --bg: #f4f6fa; --panel: #ffffff; --muted: #6b7280; --text: #1f2937; --accent: #2563eb; --danger: #dc2626; --ok: #16a34a; --border: #e5e7eb; --radius: 10px; }
* { box-sizing: border-box; }
body { margin: 0; background: var(--bg); color: var(--text); font-family: "Noto Sans JP", system-ui, -apple-system, sans-serif; }
.app-shell { max-width: 1200px; margin: 0 auto; padding: 18px 18px 36px; display: flex; flex-direction: column; gap: 14px; }
.top-nav { display: flex; align-items: center; justify-content: space-between; padding: 10px 14px; border: 1px solid var(--border); background: var(--panel); border-radius: var(--radius); }
.brand { font-weight: 800; letter-spacing: 0.4px; }
.nav-links { display: flex; gap: 8px; align-items: center; }
.nav-link { padding: 8px 12px; border-radius: 8px; border: 1px solid var(--border); background: transparent; color: var(--text); font-weight: 600; cursor: pointer; }
.nav-link.active { background: var(--accent); color: #fff; }
.console-body { border: 0; margin: 0; padding: 0; min-width: 0; display: flex; flex-direction: column; gap: 14px; }
.status-bar { border: 1px dashed var(--border); border-radius: 8px; padding: 8px 12px; color: var(--muted); background: var(--panel); }
.panel { background: var(--panel); border: 1px solid var(--border); border-radius: var(--radius); padding: 16px; }
.panel h2, .panel h3, .panel h4 { margin: 0 0 10px; }
.panel__header { display: flex; align-items: baseline; justify-content: space-between; gap: 10px; }
.login { max-width: 420px; margin: 80px auto; }
.muted { color: var(--muted); font-size: 13px; }
.error { color: var(--danger); margin-top: 10px; }
.grid { display: grid; gap: 14px; }
.grid.two { grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); }
.stat-row { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 8px; }
.stat-box { border: 1px solid var(--border); border-radius: 8px; padding: 10px; text-align: center; }
.stat-box strong { font-size: 20px; display: block; }
label { display: block; margin-top: 8px; font-weight: 700; }
input, select { width: 100%; margin-top: 4px; padding: 8px 10px; border-radius: 8px; border: 1px solid var(--border); }
input:disabled { background: #f3f4f6; }
.actions { display: flex; gap: 10px; flex-wrap: wrap; margin-top: 12px; }
button { padding: 8px 14px; border: none; border-radius: 8px; background: var(--accent); color: #fff; font-weight: 700; cursor: pointer; }
button.ghost { background: transparent; color: var(--text); border: 1px solid var(--border); }
button.danger { background: var(--danger); }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid var(--border); }
.badge { padding: 2px 8px; border-radius: 999px; font-size: 12px; }
.badge-admin { background: #fee2e2; } .badge-staff { background: #e0e7ff; }
.badge-pending { background: #f3f4f6; } .badge-in-progress { background: #fef3c7; } .badge-completed { background: #dcfce7; }
.modal { position: fixed; inset: 0; background: rgba(0,0,0,0.35); display: flex; align-items: center; justify-content: center; }
.modal__body { background: var(--panel); border-radius: var(--radius); padding: 18px; width: min(640px, 94vw); max-height: 90vh; overflow-y: auto; }
.list { list-style: none; padding: 0; margin: 8px 0 0 0; display: flex; flex-direction: column; gap: 6px; }
.item { border: 1px solid var(--border); padding: 8px 10px; border-radius: 8px; display: flex; justify-content: space-between; align-items: center; gap: 8px; }
.totals.balanced { color: var(--ok); } .totals.unbalanced { color: var(--danger); }
.progress { height: 14px; border-radius: 999px; background: #e5e7eb; overflow: hidden; }
.progress__bar { height: 100%; background: var(--accent); }
.chart { display: flex; align-items: flex-end; gap: 8px; height: 160px; padding-top: 8px; }
.chart__col { flex: 1; display: flex; flex-direction: column; align-items: center; justify-content: flex-end; height: 100%; font-size: 12px; }
.month-detail { border-top: 1px solid var(--border); margin-top: 12px; padding-top: 10px; }
.chart__bar { width: 100%; background: var(--accent); border-radius: 4px 4px 0 0; }
"#;
