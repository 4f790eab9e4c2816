use chrono::NaiveDate;
use commission_console::{
    admin_console::{AdminConsole, load_admin_console},
    order_editor::{add_assignment, delete_order, open_order_editor, submit_order},
    sales_panel::{open_sales_panel, submit_adjustment},
    services::{
        ConsoleContext, ConsoleService, EditMode, InMemoryService, LoginRequest, NoticeLevel,
    },
    session::Session,
};

async fn signed_in(service: &InMemoryService, user_id: &str, password: &str) -> ConsoleContext {
    let response = service
        .login(&LoginRequest {
            user_id: user_id.into(),
            password: password.into(),
        })
        .await
        .unwrap();
    ConsoleContext::new(Session {
        token: response.token,
        user_id: response.user_id,
        user_name: response.name,
        role: response.role,
    })
}

async fn admin_console(service: &InMemoryService) -> (ConsoleContext, AdminConsole) {
    let mut ctx = signed_in(service, "admin", "admin").await;
    let console = load_admin_console(service, &mut ctx).await.unwrap();
    service.clear_request_log();
    (ctx, console)
}

fn assign(ctx: &mut ConsoleContext, console: &mut AdminConsole, user_id: &str, amount: &str) {
    let draft = console.order_draft.as_mut().unwrap();
    draft.assignee_input = user_id.into();
    draft.amount_input = amount.into();
    add_assignment(ctx, console).unwrap();
}

#[tokio::test]
async fn mismatched_split_never_reaches_the_backend() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_order_editor(&mut console, EditMode::Creating);
    {
        let draft = console.order_draft.as_mut().unwrap();
        draft.title = "LP制作".into();
        draft.total_amount = "5000".into();
    }
    assign(&mut ctx, &mut console, "tanaka", "3000");

    let err = submit_order(&service, &mut ctx, &mut console).await.unwrap_err();
    assert!(err.to_string().contains("3,000円"));
    assert!(err.to_string().contains("5,000円"));
    assert_eq!(ctx.notice.as_ref().unwrap().level, NoticeLevel::Error);
    assert!(service.request_log().is_empty());
    assert!(console.order_draft.is_some(), "draft is kept for correction");
}

#[tokio::test]
async fn balanced_split_is_created_and_list_reloaded() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_order_editor(&mut console, EditMode::Creating);
    {
        let draft = console.order_draft.as_mut().unwrap();
        draft.title = "LP制作".into();
        draft.total_amount = "5000".into();
    }
    assign(&mut ctx, &mut console, "tanaka", "3000");
    assign(&mut ctx, &mut console, "suzuki", "2000");

    submit_order(&service, &mut ctx, &mut console).await.unwrap();
    assert_eq!(service.request_log(), vec!["POST /orders", "GET /orders"]);
    assert!(console.order_draft.is_none());
    assert_eq!(console.orders.len(), 2);
    assert_eq!(ctx.take_notice().unwrap().message, "作成しました");
}

#[tokio::test]
async fn duplicate_assignee_is_rejected_locally() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_order_editor(&mut console, EditMode::Creating);
    assign(&mut ctx, &mut console, "tanaka", "1000");
    {
        let draft = console.order_draft.as_mut().unwrap();
        draft.assignee_input = "tanaka".into();
        draft.amount_input = "500".into();
    }
    assert!(add_assignment(&mut ctx, &mut console).is_err());
    let draft = console.order_draft.as_ref().unwrap();
    assert_eq!(draft.assignments.len(), 1);
    assert_eq!(draft.assigned_total(), Some(1000));
}

#[tokio::test]
async fn editing_keeps_the_order_id_and_declined_delete_is_a_no_op() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_order_editor(&mut console, EditMode::Editing("order-1".into()));
    console.order_draft.as_mut().unwrap().title = "Webサイト改修".into();
    submit_order(&service, &mut ctx, &mut console).await.unwrap();
    assert_eq!(service.request_log()[0], "PUT /orders/order-1");
    assert_eq!(console.orders[0].title, "Webサイト改修");

    service.clear_request_log();
    delete_order(&service, &mut ctx, &mut console, "order-1", |_| false)
        .await
        .unwrap();
    assert!(service.request_log().is_empty());

    delete_order(&service, &mut ctx, &mut console, "order-1", |_| true)
        .await
        .unwrap();
    assert!(console.orders.is_empty());
}

#[tokio::test]
async fn adjustment_is_added_to_the_month_and_panel_reopens() {
    let service = InMemoryService::new_with_sample()
        .with_today(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    let (mut ctx, mut console) = admin_console(&service).await;

    open_order_editor(&mut console, EditMode::Creating);
    {
        let draft = console.order_draft.as_mut().unwrap();
        draft.title = "保守".into();
        draft.total_amount = "400".into();
    }
    assign(&mut ctx, &mut console, "suzuki", "400");
    submit_order(&service, &mut ctx, &mut console).await.unwrap();

    open_sales_panel(&service, &mut ctx, &mut console, "suzuki").await.unwrap();
    let panel = console.sales_panel.as_mut().unwrap();
    assert_eq!(panel.user_name, "鈴木 花子");
    panel.set_adjustment_input("202403", "100".into());

    submit_adjustment(&service, &mut ctx, &mut console, "202403").await.unwrap();
    let panel = console.sales_panel.as_ref().unwrap();
    let march = panel
        .months
        .iter()
        .find(|month| month.year_month == "202403")
        .unwrap();
    assert_eq!(march.total_sales, 500);
    assert_eq!(march.order_sales, 400);
    assert_eq!(march.manual_adjustment, 100);
}
