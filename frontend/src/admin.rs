use std::future::Future;

use commission_console::admin_console::{AdminConsole, AdminTab, load_admin_console};
use commission_console::format::{status_badge_class, status_label, thousands, yen};
use commission_console::manage_levels::{
    LevelForm, close_level_form, delete_level, level_rows, open_level_form, save_level,
};
use commission_console::manage_users::{
    UserForm, close_user_form, delete_user, open_user_form, save_user,
};
use commission_console::order_editor::{
    OrderDraft, add_assignment, close_order_editor, delete_order, open_order_editor, order_rows,
    remove_assignment, submit_order,
};
use commission_console::sales_panel::{close_sales_panel, open_sales_panel, submit_adjustment};
use commission_console::services::{
    BusinessType, ConsoleContext, EditMode, OrderStatus, Role, ServiceResult,
};
use commission_console::session::{GuardOutcome, Page, Session, guard, logout};
use dioxus::prelude::*;

use crate::api::http;
use crate::browser::{LocalStore, confirm, redirect, settle};

pub fn AdminPage() -> Element {
    let outcome = use_hook(|| guard(&LocalStore, Page::AdminConsole));
    match outcome {
        GuardOutcome::Proceed(session) => rsx! { AdminConsoleView { session } },
        GuardOutcome::Redirect(page) => {
            redirect(page);
            rsx! {}
        }
    }
}

/// Runs one console action against owned copies of the state and writes the
/// result back once it finishes. The console stays disabled in between, so
/// the copy cannot go stale.
fn run<F, Fut>(
    ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
    action: F,
) where
    F: FnOnce(ConsoleContext, AdminConsole) -> Fut + 'static,
    Fut: Future<Output = (ConsoleContext, AdminConsole, ServiceResult<()>)> + 'static,
{
    if !console.with_mut(AdminConsole::begin_request) {
        return;
    }
    let current_ctx = ctx.read().clone();
    let current = console.read().clone();
    spawn(async move {
        let (next_ctx, mut next, result) = action(current_ctx, current).await;
        next.end_request();
        console.set(next);
        settle(ctx, status, next_ctx, result);
    });
}

fn edit_user(mut console: Signal<AdminConsole>, edit: impl FnOnce(&mut UserForm)) {
    console.with_mut(|c| {
        if let Some(form) = c.user_form.as_mut() {
            edit(form);
        }
    });
}

fn edit_order(mut console: Signal<AdminConsole>, edit: impl FnOnce(&mut OrderDraft)) {
    console.with_mut(|c| {
        if let Some(draft) = c.order_draft.as_mut() {
            edit(draft);
        }
    });
}

fn edit_level(mut console: Signal<AdminConsole>, edit: impl FnOnce(&mut LevelForm)) {
    console.with_mut(|c| {
        if let Some(form) = c.level_form.as_mut() {
            edit(form);
        }
    });
}

#[component]
fn AdminConsoleView(session: Session) -> Element {
    let user_name = session.user_name.clone();
    let ctx = use_signal(|| ConsoleContext::new(session));
    let mut console = use_signal(AdminConsole::default);
    let status = use_signal(|| "読み込み中...".to_string());

    use_hook(move || {
        spawn(async move {
            let mut c = ctx.read().clone();
            match load_admin_console(&http(), &mut c).await {
                Ok(loaded) => {
                    console.set(loaded);
                    settle(ctx, status, c, Ok(()));
                }
                Err(err) => settle(ctx, status, c, Err(err)),
            }
        });
    });

    let tab = console.read().tab;
    let busy = console.read().busy;
    let tab_class = move |t: AdminTab| if tab == t { "nav-link active" } else { "nav-link" };

    rsx! {
        nav { class: "top-nav",
            div { class: "brand", "売上管理 · 管理者" }
            div { class: "nav-links",
                button { class: tab_class(AdminTab::Users), disabled: busy, onclick: move |_| console.with_mut(|c| c.show_tab(AdminTab::Users)), "社員管理" }
                button { class: tab_class(AdminTab::Orders), disabled: busy, onclick: move |_| console.with_mut(|c| c.show_tab(AdminTab::Orders)), "発注管理" }
                button { class: tab_class(AdminTab::Levels), disabled: busy, onclick: move |_| console.with_mut(|c| c.show_tab(AdminTab::Levels)), "レベル設定" }
                span { class: "muted", "{user_name}" }
                button { class: "ghost", onclick: move |_| { spawn(async move { redirect(logout(&http(), &LocalStore).await); }); }, "ログアウト" }
            }
        }
        div { class: "status-bar", "{status.read()}" }
        fieldset { class: "console-body", disabled: busy,
            {match tab {
                AdminTab::Users => users_tab(ctx, console, status),
                AdminTab::Orders => orders_tab(ctx, console, status),
                AdminTab::Levels => levels_tab(ctx, console, status),
            }}
            {user_form_modal(ctx, console, status)}
            {order_modal(ctx, console, status)}
            {level_form_modal(ctx, console, status)}
            {sales_modal(ctx, console, status)}
        }
    }
}

// ---------- Employees ----------
fn users_tab(
    ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
) -> Element {
    let rows = console.read().user_rows();
    rsx! {
        section { class: "panel",
            div { class: "panel__header",
                h2 { "社員一覧" }
                button { onclick: move |_| console.with_mut(|c| open_user_form(c, EditMode::Creating)), "新規追加" }
            }
            table {
                thead { tr { th { "ID" } th { "氏名" } th { "事業形態" } th { "レベル" } th { "権限" } th {} } }
                tbody {
                    {rows.into_iter().map(|row| {
                        let edit_id = row.user_id.clone();
                        let delete_id = row.user_id.clone();
                        let sales_id = row.user_id.clone();
                        let badge = if row.role == Role::Admin { "badge badge-admin" } else { "badge badge-staff" };
                        rsx! {
                            tr { key: "{row.user_id}",
                                td { "{row.user_id}" }
                                td { "{row.name}" }
                                td { "{row.business}" }
                                td { "{row.level}" }
                                td { span { class: badge, "{row.role_label}" } }
                                td {
                                    button { class: "ghost", onclick: move |_| console.with_mut(|c| open_user_form(c, EditMode::Editing(edit_id.clone()))), "編集" }
                                    button { class: "ghost", onclick: move |_| {
                                        let user_id = sales_id.clone();
                                        run(ctx, console, status, move |mut c, mut a| async move {
                                            let result = open_sales_panel(&http(), &mut c, &mut a, &user_id).await;
                                            (c, a, result)
                                        });
                                    }, "売上" }
                                    button { class: "danger", onclick: move |_| {
                                        let user_id = delete_id.clone();
                                        run(ctx, console, status, move |mut c, mut a| async move {
                                            let result = delete_user(&http(), &mut c, &mut a, &user_id, confirm).await;
                                            (c, a, result)
                                        });
                                    }, "削除" }
                                }
                            }
                        }
                    })}
                }
            }
        }
    }
}

fn user_form_modal(
    ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
) -> Element {
    let Some(form) = console.read().user_form.clone() else {
        return rsx! {};
    };
    let password_hint = if form.password_required() { "パスワード" } else { "変更する場合のみ入力" };
    rsx! {
        div { class: "modal",
            div { class: "modal__body",
                h3 { "{form.title()}" }
                label { "ユーザーID" }
                input { value: "{form.user_id}", disabled: !form.id_editable(), oninput: move |evt| edit_user(console, |f| f.user_id = evt.value()) }
                label { "パスワード" }
                input { r#type: "password", value: "{form.password}", placeholder: password_hint, oninput: move |evt| edit_user(console, |f| f.password = evt.value()) }
                label { "氏名" }
                input { value: "{form.name}", oninput: move |evt| edit_user(console, |f| f.name = evt.value()) }
                label { "事業形態" }
                select { value: form.business_type.as_tag(), onchange: move |evt| edit_user(console, |f| f.business_type = BusinessType::from_tag(&evt.value())),
                    option { value: "individual", "個人" }
                    option { value: "corporate", "法人" }
                }
                label { "屋号・法人名" }
                input { value: "{form.business_name}", oninput: move |evt| edit_user(console, |f| f.business_name = evt.value()) }
                label { "住所" }
                input { value: "{form.address}", oninput: move |evt| edit_user(console, |f| f.address = evt.value()) }
                label { "生年月日" }
                input { r#type: "date", value: "{form.birthdate}", oninput: move |evt| edit_user(console, |f| f.birthdate = evt.value()) }
                label { "権限" }
                select { value: form.role.as_tag(), onchange: move |evt| edit_user(console, |f| f.role = Role::from_tag(&evt.value())),
                    option { value: "staff", "一般社員" }
                    option { value: "admin", "管理者" }
                }
                label { "レベル" }
                input { r#type: "number", min: "1", value: "{form.level}", oninput: move |evt| edit_user(console, |f| f.level = evt.value()) }
                div { class: "actions",
                    button { onclick: move |_| run(ctx, console, status, |mut c, mut a| async move {
                        let result = save_user(&http(), &mut c, &mut a).await;
                        (c, a, result)
                    }), "保存" }
                    button { class: "ghost", onclick: move |_| console.with_mut(close_user_form), "キャンセル" }
                }
            }
        }
    }
}

// ---------- Orders ----------
fn orders_tab(
    ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
) -> Element {
    let rows = order_rows(&console.read());
    rsx! {
        section { class: "panel",
            div { class: "panel__header",
                h2 { "発注一覧" }
                button { onclick: move |_| console.with_mut(|c| open_order_editor(c, EditMode::Creating)), "新規発注" }
            }
            table {
                thead { tr { th { "案件名" } th { "総額" } th { "担当者" } th { "納期" } th { "状態" } th {} } }
                tbody {
                    {rows.into_iter().map(|row| {
                        let edit_id = row.order_id.clone();
                        let delete_id = row.order_id.clone();
                        let badge = format!("badge {}", status_badge_class(row.status));
                        rsx! {
                            tr { key: "{row.order_id}",
                                td { "{row.title}" }
                                td { "{row.total}" }
                                td { "{row.assignees}" }
                                td { "{row.deadline}" }
                                td { span { class: "{badge}", "{status_label(row.status)}" } }
                                td {
                                    button { class: "ghost", onclick: move |_| console.with_mut(|c| open_order_editor(c, EditMode::Editing(edit_id.clone()))), "編集" }
                                    button { class: "danger", onclick: move |_| {
                                        let order_id = delete_id.clone();
                                        run(ctx, console, status, move |mut c, mut a| async move {
                                            let result = delete_order(&http(), &mut c, &mut a, &order_id, confirm).await;
                                            (c, a, result)
                                        });
                                    }, "削除" }
                                }
                            }
                        }
                    })}
                }
            }
        }
    }
}

fn order_modal(
    mut ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
) -> Element {
    let (draft, options, lines) = {
        let current = console.read();
        let Some(draft) = current.order_draft.clone() else {
            return rsx! {};
        };
        let lines = draft.assignment_lines(&current.users);
        (draft, current.assignee_options(), lines)
    };
    let totals = draft.totals();
    let totals_class = if totals.balanced() { "totals balanced" } else { "totals unbalanced" };
    let title = if draft.mode.is_editing() { "発注編集" } else { "新規発注" };
    rsx! {
        div { class: "modal",
            div { class: "modal__body",
                h3 { "{title}" }
                label { "案件名" }
                input { value: "{draft.title}", oninput: move |evt| edit_order(console, |d| d.title = evt.value()) }
                label { "総額（円）" }
                input { r#type: "number", value: "{draft.total_amount}", oninput: move |evt| edit_order(console, |d| d.total_amount = evt.value()) }
                label { "納期" }
                input { r#type: "date", value: "{draft.deadline}", oninput: move |evt| edit_order(console, |d| d.deadline = evt.value()) }
                label { "状態" }
                select { value: draft.status.as_tag(), onchange: move |evt| edit_order(console, |d| {
                        if let Some(status) = OrderStatus::from_tag(&evt.value()) {
                            d.status = status;
                        }
                    }),
                    {OrderStatus::ALL.iter().map(|s| rsx! { option { key: "{s.as_tag()}", value: s.as_tag(), "{status_label(*s)}" } })}
                }
                h4 { "担当者の割り振り" }
                div { class: "grid two",
                    select { value: "{draft.assignee_input}", onchange: move |evt| edit_order(console, |d| d.assignee_input = evt.value()),
                        option { value: "", "担当者を選択" }
                        {options.into_iter().map(|o| rsx! { option { key: "{o.user_id}", value: "{o.user_id}", "{o.label}" } })}
                    }
                    input { r#type: "number", placeholder: "金額", value: "{draft.amount_input}", oninput: move |evt| edit_order(console, |d| d.amount_input = evt.value()) }
                }
                div { class: "actions",
                    button { class: "ghost", onclick: move |_| {
                        let mut c = ctx.read().clone();
                        let result = console.with_mut(|a| add_assignment(&mut c, a));
                        if result.is_ok() {
                            ctx.set(c);
                        } else {
                            settle(ctx, status, c, result);
                        }
                    }, "追加" }
                }
                ul { class: "list",
                    {lines.into_iter().map(|line| {
                        let user_id = line.user_id.clone();
                        rsx! {
                            li { class: "item", key: "{line.user_id}",
                                span { "{line.label}" }
                                button { class: "ghost", onclick: move |_| console.with_mut(|a| remove_assignment(a, &user_id)), "削除" }
                            }
                        }
                    })}
                }
                div { class: "{totals_class}",
                    "割り振り合計: {totals.assigned_label()} / 総額: {thousands(totals.declared)}円"
                }
                div { class: "actions",
                    button { onclick: move |_| run(ctx, console, status, |mut c, mut a| async move {
                        let result = submit_order(&http(), &mut c, &mut a).await;
                        (c, a, result)
                    }), "保存" }
                    button { class: "ghost", onclick: move |_| console.with_mut(close_order_editor), "キャンセル" }
                }
            }
        }
    }
}

// ---------- Levels ----------
fn levels_tab(
    ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
) -> Element {
    let rows = level_rows(&console.read().levels);
    rsx! {
        section { class: "panel",
            div { class: "panel__header",
                h2 { "レベル設定" }
                button { onclick: move |_| console.with_mut(|c| open_level_form(c, EditMode::Creating)), "レベル追加" }
            }
            table {
                thead { tr { th { "レベル" } th { "説明" } th { "必要売上（3ヶ月）" } th {} } }
                tbody {
                    {rows.into_iter().map(|row| {
                        let edit_id = row.level_id.clone();
                        let delete_id = row.level_id.clone();
                        rsx! {
                            tr { key: "{row.level_id}",
                                td { "{row.level}" }
                                td { "{row.description}" }
                                td { "{row.required_sales}" }
                                td {
                                    button { class: "ghost", onclick: move |_| console.with_mut(|c| open_level_form(c, EditMode::Editing(edit_id.clone()))), "編集" }
                                    button { class: "danger", onclick: move |_| {
                                        let level_id = delete_id.clone();
                                        run(ctx, console, status, move |mut c, mut a| async move {
                                            let result = delete_level(&http(), &mut c, &mut a, &level_id, confirm).await;
                                            (c, a, result)
                                        });
                                    }, "削除" }
                                }
                            }
                        }
                    })}
                }
            }
        }
    }
}

fn level_form_modal(
    ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
) -> Element {
    let Some(form) = console.read().level_form.clone() else {
        return rsx! {};
    };
    rsx! {
        div { class: "modal",
            div { class: "modal__body",
                h3 { "{form.title()}" }
                label { "レベル番号" }
                input { r#type: "number", min: "1", value: "{form.level_number}", oninput: move |evt| edit_level(console, |f| f.level_number = evt.value()) }
                label { "説明" }
                input { value: "{form.description}", oninput: move |evt| edit_level(console, |f| f.description = evt.value()) }
                label { "必要売上（直近3ヶ月合計）" }
                input { r#type: "number", min: "0", value: "{form.required_sales}", oninput: move |evt| edit_level(console, |f| f.required_sales = evt.value()) }
                div { class: "actions",
                    button { onclick: move |_| run(ctx, console, status, |mut c, mut a| async move {
                        let result = save_level(&http(), &mut c, &mut a).await;
                        (c, a, result)
                    }), "保存" }
                    button { class: "ghost", onclick: move |_| console.with_mut(close_level_form), "キャンセル" }
                }
            }
        }
    }
}

// ---------- Sales ----------
fn sales_modal(
    ctx: Signal<ConsoleContext>,
    mut console: Signal<AdminConsole>,
    status: Signal<String>,
) -> Element {
    let Some(panel) = console.read().sales_panel.clone() else {
        return rsx! {};
    };
    rsx! {
        div { class: "modal",
            div { class: "modal__body",
                h3 { "{panel.title()}" }
                {if panel.months.is_empty() { rsx! { p { class: "muted", "売上データがありません" } } } else { rsx! {} }}
                {panel.months.iter().cloned().map(|month| {
                    let input = panel.adjustment_inputs.get(&month.year_month).cloned().unwrap_or_default();
                    let input_key = month.year_month.clone();
                    let submit_key = month.year_month.clone();
                    rsx! {
                        div { class: "panel", key: "{month.year_month}",
                            h4 { "{month.heading}" }
                            ul { class: "list",
                                {month.orders.iter().map(|line| rsx! {
                                    li { class: "item",
                                        span { "{line.title}" }
                                        span { class: "muted", "{line.date}" }
                                        strong { "{yen(line.amount)}" }
                                    }
                                })}
                            }
                            div { class: "stat-row",
                                div { class: "stat-box", span { "受注売上" } strong { "{yen(month.order_sales)}" } }
                                div { class: "stat-box", span { "手動調整" } strong { "{yen(month.manual_adjustment)}" } }
                                div { class: "stat-box", span { "合計" } strong { "{yen(month.total_sales)}" } }
                            }
                            label { "調整額" }
                            input { r#type: "number", value: "{input}", oninput: move |evt| console.with_mut(|c| {
                                if let Some(panel) = c.sales_panel.as_mut() {
                                    panel.set_adjustment_input(&input_key, evt.value());
                                }
                            }) }
                            div { class: "actions",
                                button { onclick: move |_| {
                                    let year_month = submit_key.clone();
                                    run(ctx, console, status, move |mut c, mut a| async move {
                                        let result = submit_adjustment(&http(), &mut c, &mut a, &year_month).await;
                                        (c, a, result)
                                    });
                                }, "調整" }
                            }
                        }
                    }
                })}
                div { class: "actions",
                    button { class: "ghost", onclick: move |_| console.with_mut(close_sales_panel), "閉じる" }
                }
            }
        }
    }
}
