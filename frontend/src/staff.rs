use commission_console::format::{thousands, yen};
use commission_console::services::{BusinessType, ConsoleContext};
use commission_console::session::{GuardOutcome, Page, Session, guard, logout};
use commission_console::staff_console::{
    ProfileForm, StaffDashboard, load_staff_dashboard, save_profile,
};
use dioxus::prelude::*;

use crate::api::http;
use crate::browser::{LocalStore, redirect, settle};

pub fn StaffPage() -> Element {
    let outcome = use_hook(|| guard(&LocalStore, Page::StaffConsole));
    match outcome {
        GuardOutcome::Proceed(session) => rsx! { StaffConsoleView { session } },
        GuardOutcome::Redirect(page) => {
            redirect(page);
            rsx! {}
        }
    }
}

fn edit_profile(mut dashboard: Signal<StaffDashboard>, edit: impl FnOnce(&mut ProfileForm)) {
    dashboard.with_mut(|d| {
        if let Some(form) = d.profile.as_mut() {
            edit(form);
        }
    });
}

#[component]
fn StaffConsoleView(session: Session) -> Element {
    let ctx = use_signal(|| ConsoleContext::new(session));
    let mut dashboard = use_signal(StaffDashboard::default);
    let status = use_signal(|| "読み込み中...".to_string());

    use_hook(move || {
        spawn(async move {
            let mut c = ctx.read().clone();
            match load_staff_dashboard(&http(), &mut c).await {
                Ok(loaded) => {
                    dashboard.set(loaded);
                    settle(ctx, status, c, Ok(()));
                }
                Err(err) => settle(ctx, status, c, Err(err)),
            }
        });
    });

    let save = move || {
        let mut c = ctx.read().clone();
        let mut d = dashboard.read().clone();
        spawn(async move {
            let result = save_profile(&http(), &mut c, &LocalStore, &mut d).await;
            dashboard.set(d);
            settle(ctx, status, c, result);
        });
    };

    let user_name = ctx
        .read()
        .session
        .as_ref()
        .map(|s| s.user_name.clone())
        .unwrap_or_default();
    let view = dashboard.read().clone();
    let max_sales = view.chart.iter().map(|p| p.total_sales).max().unwrap_or(0).max(1);
    let progress_note = view
        .progress
        .as_ref()
        .map(|p| format!("{}（達成率 {:.1}%）", p.caption(), p.percent));

    rsx! {
        nav { class: "top-nav",
            div { class: "brand", "売上管理 · マイページ" }
            div { class: "nav-links",
                span { class: "muted", "{user_name} さん（レベル {view.current_level}）" }
                button { class: "ghost", onclick: move |_| { spawn(async move { redirect(logout(&http(), &LocalStore).await); }); }, "ログアウト" }
            }
        }
        div { class: "status-bar", "{status.read()}" }

        section { class: "panel",
            h2 { "売上サマリー" }
            div { class: "stat-row",
                div { class: "stat-box", span { "今月の売上" } strong { "{yen(view.current_month_sales)}" } }
                div { class: "stat-box", span { "直近3ヶ月合計" } strong { "{yen(view.rolling_total)}" } }
            }
            {match &view.progress {
                Some(progress) => rsx! {
                    h4 { "次のレベルまで" }
                    div { class: "progress",
                        div { class: "progress__bar", style: "width: {progress.bar_width()}%" }
                    }
                    p { class: "muted", "{progress_note.clone().unwrap_or_default()}" }
                },
                None => rsx! {},
            }}
        }

        section { class: "panel",
            h2 { "月別売上" }
            div { class: "chart",
                {view.chart.iter().map(|point| {
                    let height = point.total_sales.max(0) as f64 * 100.0 / max_sales as f64;
                    rsx! {
                        div { class: "chart__col", key: "{point.label}",
                            span { "{thousands(point.total_sales)}" }
                            div { class: "chart__bar", style: "height: {height}%" }
                            span { "{point.label}" }
                        }
                    }
                })}
            }
            {view.month_details().into_iter().map(|month| rsx! {
                div { class: "month-detail", key: "{month.year_month}",
                    div { class: "panel__header",
                        h4 { "{month.heading}" }
                        strong { "{month.total}" }
                    }
                    {if month.orders.is_empty() {
                        rsx! { p { class: "muted", "案件データがありません" } }
                    } else {
                        rsx! {
                            table {
                                thead { tr { th { "案件名" } th { "金額" } th { "日付" } } }
                                tbody {
                                    {month.orders.iter().map(|line| rsx! {
                                        tr {
                                            td { "{line.title}" }
                                            td { "{line.amount}" }
                                            td { "{line.date}" }
                                        }
                                    })}
                                }
                            }
                        }
                    }}
                    {month.adjustment.as_ref().map(|adjustment| rsx! {
                        p { class: "muted", "手入力調整: {adjustment}" }
                    })}
                }
            })}
        }

        section { class: "panel",
            h2 { "担当案件" }
            table {
                thead { tr { th { "案件名" } th { "担当金額" } th { "納期" } th { "状態" } } }
                tbody {
                    {view.orders.iter().map(|row| rsx! {
                        tr { key: "{row.order_id}",
                            td { "{row.title}" }
                            td { "{row.amount_label()}" }
                            td { "{row.deadline}" }
                            td { "{row.status_label}" }
                        }
                    })}
                }
            }
        }

        {match view.profile.clone() {
            Some(form) => rsx! {
                section { class: "panel",
                    h2 { "プロフィール" }
                    label { "ユーザーID" }
                    input { value: "{form.user_id}", disabled: true }
                    label { "氏名" }
                    input { value: "{form.name}", oninput: move |evt| edit_profile(dashboard, |f| f.name = evt.value()) }
                    label { "事業形態" }
                    select { value: form.business_type.as_tag(), onchange: move |evt| edit_profile(dashboard, |f| f.business_type = BusinessType::from_tag(&evt.value())),
                        option { value: "individual", "個人" }
                        option { value: "corporate", "法人" }
                    }
                    label { "屋号・法人名" }
                    input { value: "{form.business_name}", oninput: move |evt| edit_profile(dashboard, |f| f.business_name = evt.value()) }
                    label { "住所" }
                    input { value: "{form.address}", oninput: move |evt| edit_profile(dashboard, |f| f.address = evt.value()) }
                    label { "生年月日" }
                    input { r#type: "date", value: "{form.birthdate}", oninput: move |evt| edit_profile(dashboard, |f| f.birthdate = evt.value()) }
                    label { "新しいパスワード" }
                    input { r#type: "password", placeholder: "変更する場合のみ入力", value: "{form.new_password}", oninput: move |evt| edit_profile(dashboard, |f| f.new_password = evt.value()) }
                    div { class: "actions", button { onclick: move |_| save(), "更新" } }
                }
            },
            None => rsx! {},
        }}
    }
}
