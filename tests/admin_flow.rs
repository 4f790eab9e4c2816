use commission_console::{
    admin_console::{AdminConsole, load_admin_console},
    manage_levels::{delete_level, open_level_form, save_level},
    manage_users::{delete_user, open_user_form, save_user},
    order_editor::{open_order_editor, submit_order},
    sales_panel::{open_sales_panel, submit_adjustment},
    services::{
        ConsoleContext, ConsoleError, ConsoleService, EditMode, InMemoryService, LoginRequest,
        NoticeLevel,
    },
    session::Session,
};

async fn admin_console(service: &InMemoryService) -> (ConsoleContext, AdminConsole) {
    let response = service
        .login(&LoginRequest {
            user_id: "admin".into(),
            password: "admin".into(),
        })
        .await
        .unwrap();
    let mut ctx = ConsoleContext::new(Session {
        token: response.token,
        user_id: response.user_id,
        user_name: response.name,
        role: response.role,
    });
    let console = load_admin_console(service, &mut ctx).await.unwrap();
    service.clear_request_log();
    (ctx, console)
}

#[tokio::test]
async fn saving_users_writes_then_rereads_the_list() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_user_form(&mut console, EditMode::Creating);
    {
        let form = console.user_form.as_mut().unwrap();
        form.user_id = "yamada".into();
        form.password = "secret".into();
        form.name = "山田 次郎".into();
    }
    save_user(&service, &mut ctx, &mut console).await.unwrap();
    assert_eq!(service.request_log(), vec!["POST /users", "GET /users"]);
    assert!(console.user_form.is_none());
    assert!(console.user("yamada").is_some());
    assert_eq!(ctx.take_notice().unwrap().message, "作成しました");

    service.clear_request_log();
    open_user_form(&mut console, EditMode::Editing("yamada".into()));
    console.user_form.as_mut().unwrap().level = "3".into();
    save_user(&service, &mut ctx, &mut console).await.unwrap();
    assert_eq!(service.request_log(), vec!["PUT /user/yamada", "GET /users"]);
    assert_eq!(console.user("yamada").unwrap().level, 3);
    assert_eq!(ctx.take_notice().unwrap().message, "更新しました");
}

#[tokio::test]
async fn declined_user_delete_sends_nothing() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    delete_user(&service, &mut ctx, &mut console, "suzuki", |message| {
        assert!(message.contains("suzuki"));
        false
    })
    .await
    .unwrap();
    assert!(service.request_log().is_empty());
    assert!(ctx.notice.is_none());

    delete_user(&service, &mut ctx, &mut console, "suzuki", |_| true)
        .await
        .unwrap();
    assert_eq!(service.request_log(), vec!["DELETE /user/suzuki", "GET /users"]);
    assert!(console.user("suzuki").is_none());
}

#[tokio::test]
async fn level_changes_reread_the_ladder() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_level_form(&mut console, EditMode::Creating);
    {
        let form = console.level_form.as_mut().unwrap();
        form.level_number = "4".into();
        form.description = "プラチナ".into();
        form.required_sales = "3000000".into();
    }
    save_level(&service, &mut ctx, &mut console).await.unwrap();
    assert_eq!(service.request_log(), vec!["POST /levels", "GET /levels"]);
    assert_eq!(console.levels.len(), 4);
    assert!(console.level_form.is_none());

    service.clear_request_log();
    delete_level(&service, &mut ctx, &mut console, "level-3", |_| false)
        .await
        .unwrap();
    assert!(service.request_log().is_empty());

    delete_level(&service, &mut ctx, &mut console, "level-3", |_| true)
        .await
        .unwrap();
    assert_eq!(service.request_log(), vec!["DELETE /levels/level-3", "GET /levels"]);
    assert!(console.levels.iter().all(|level| level.level_id != "level-3"));
}

#[tokio::test]
async fn server_rejection_is_shown_verbatim_and_form_kept() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_level_form(&mut console, EditMode::Creating);
    {
        let form = console.level_form.as_mut().unwrap();
        form.level_number = "2".into();
        form.required_sales = "1".into();
    }
    let err = save_level(&service, &mut ctx, &mut console).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
    let notice = ctx.take_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "level 2 already exists");
    assert!(console.level_form.is_some());
    assert_eq!(service.request_log(), vec!["POST /levels"]);
}

#[tokio::test]
async fn editing_an_order_deleted_elsewhere_keeps_the_draft() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_order_editor(&mut console, EditMode::Editing("order-1".into()));
    console.order_draft.as_mut().unwrap().title = "改修".into();
    service
        .remove_order(&ctx.token().unwrap(), "order-1")
        .unwrap();

    let err = submit_order(&service, &mut ctx, &mut console).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(ctx.notice.as_ref().unwrap().message, "not found: order order-1");
    assert!(console.order_draft.is_some());
    assert_eq!(service.request_log(), vec!["PUT /orders/order-1"]);
}

#[tokio::test]
async fn unreadable_adjustment_is_rejected_without_a_request() {
    let service = InMemoryService::new_with_sample();
    let (mut ctx, mut console) = admin_console(&service).await;

    open_sales_panel(&service, &mut ctx, &mut console, "tanaka").await.unwrap();
    service.clear_request_log();
    let year_month = console.sales_panel.as_ref().unwrap().months[0].year_month.clone();
    console
        .sales_panel
        .as_mut()
        .unwrap()
        .set_adjustment_input(&year_month, "12a".into());

    let err = submit_adjustment(&service, &mut ctx, &mut console, &year_month)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
    assert_eq!(
        ctx.notice.as_ref().unwrap().message,
        "調整額は整数で入力してください"
    );
    assert!(service.request_log().is_empty());
    assert!(console.sales_panel.is_some());
}
