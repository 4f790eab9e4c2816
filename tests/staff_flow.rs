use chrono::NaiveDate;
use commission_console::{
    services::{
        Assignment, ConsoleContext, InMemoryService, Level, OrderPayload, OrderStatus, Role, User,
    },
    session::{
        GuardOutcome, MemoryStore, Page, SessionStore, USER_NAME_KEY, guard, load_session, login,
        logout,
    },
    staff_console::{load_staff_dashboard, save_profile},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn solo_order(title: &str, user_id: &str, amount: i64) -> OrderPayload {
    OrderPayload {
        title: title.into(),
        total_amount: amount,
        deadline: None,
        status: OrderStatus::Completed,
        assignments: vec![Assignment {
            user_id: user_id.into(),
            amount,
        }],
    }
}

/// Staff member at level 1 with 1,000 / 2,000 / 3,000 over three months
/// and a level 2 threshold of 5,000.
fn over_threshold() -> InMemoryService {
    let service = InMemoryService::default();
    service
        .seed_user(
            User {
                user_id: "sato".into(),
                name: "佐藤".into(),
                role: Role::Staff,
                level: 1,
                ..Default::default()
            },
            "pw",
        )
        .unwrap();
    for (level_id, level_number, required_sales) in [("l1", 1, 0), ("l2", 2, 5_000)] {
        service
            .seed_level(Level {
                level_id: level_id.into(),
                level_number,
                description: format!("Tier {level_number}"),
                required_sales,
            })
            .unwrap();
    }
    service.seed_order(solo_order("A", "sato", 1_000), date(2024, 1, 15)).unwrap();
    service.seed_order(solo_order("B", "sato", 2_000), date(2024, 2, 15)).unwrap();
    service.seed_order(solo_order("C", "sato", 3_000), date(2024, 3, 15)).unwrap();
    service
}

async fn staff_ctx(service: &InMemoryService, store: &MemoryStore) -> ConsoleContext {
    let page = login(service, store, "sato", "pw").await.unwrap();
    assert_eq!(page, Page::StaffConsole);
    match guard(store, Page::StaffConsole) {
        GuardOutcome::Proceed(session) => ConsoleContext::new(session),
        GuardOutcome::Redirect(page) => panic!("unexpected redirect to {page:?}"),
    }
}

#[tokio::test]
async fn dashboard_shows_progress_past_the_threshold() {
    let service = over_threshold();
    let store = MemoryStore::default();
    let mut ctx = staff_ctx(&service, &store).await;

    let dashboard = load_staff_dashboard(&service, &mut ctx).await.unwrap();
    assert_eq!(dashboard.current_month_sales, 3_000);
    assert_eq!(dashboard.rolling_total, 6_000);
    assert_eq!(dashboard.orders.len(), 3);
    assert_eq!(dashboard.months[0].year_month, "202403");

    let progress = dashboard.progress.unwrap();
    assert_eq!(progress.next_level, 2);
    assert!((progress.percent - 120.0).abs() < f64::EPSILON);
    assert_eq!(progress.bar_width(), 100.0);
    assert_eq!(progress.remaining, -1_000);
    assert!(ctx.notice.is_none());
}

#[tokio::test]
async fn top_level_member_gets_no_progress_indicator() {
    let service = over_threshold();
    service
        .seed_user(
            User {
                user_id: "kato".into(),
                name: "加藤".into(),
                role: Role::Staff,
                level: 2,
                ..Default::default()
            },
            "pw",
        )
        .unwrap();
    let store = MemoryStore::default();
    login(&service, &store, "kato", "pw").await.unwrap();
    let GuardOutcome::Proceed(session) = guard(&store, Page::StaffConsole) else {
        panic!("staff member was redirected");
    };
    let mut ctx = ConsoleContext::new(session);

    let dashboard = load_staff_dashboard(&service, &mut ctx).await.unwrap();
    assert_eq!(dashboard.current_level, 2);
    assert!(dashboard.progress.is_none());
    assert!(ctx.notice.is_none());
}

#[tokio::test]
async fn monthly_breakdown_lists_each_months_orders() {
    let service = over_threshold();
    let store = MemoryStore::default();
    let mut ctx = staff_ctx(&service, &store).await;

    let dashboard = load_staff_dashboard(&service, &mut ctx).await.unwrap();
    let details = dashboard.month_details();
    assert_eq!(details.len(), 3);
    assert_eq!(details[0].heading, "2024年03月");
    assert_eq!(details[0].orders.len(), 1);
    assert_eq!(details[0].orders[0].title, "C");
    assert_eq!(details[0].orders[0].amount, "3,000円");
    assert_eq!(details[0].orders[0].date, "2024/3/15");
    assert!(details.iter().all(|month| month.adjustment.is_none()));
}

#[tokio::test]
async fn profile_save_updates_cached_name_and_clears_password() {
    let service = over_threshold();
    let store = MemoryStore::default();
    let mut ctx = staff_ctx(&service, &store).await;
    let mut dashboard = load_staff_dashboard(&service, &mut ctx).await.unwrap();

    {
        let form = dashboard.profile.as_mut().unwrap();
        form.name = "佐藤 一郎".into();
        form.new_password = "fresh".into();
    }
    save_profile(&service, &mut ctx, &store, &mut dashboard).await.unwrap();

    assert_eq!(store.get(USER_NAME_KEY).as_deref(), Some("佐藤 一郎"));
    assert_eq!(ctx.session.as_ref().unwrap().user_name, "佐藤 一郎");
    assert!(dashboard.profile.as_ref().unwrap().new_password.is_empty());

    logout(&service, &store).await;
    let relogin = MemoryStore::default();
    assert!(login(&service, &relogin, "sato", "fresh").await.is_ok());
}

#[tokio::test]
async fn logout_clears_the_store_even_when_the_server_refuses() {
    let service = over_threshold();
    let store = MemoryStore::default();
    staff_ctx(&service, &store).await;
    logout(&service, &store).await;
    assert!(store.is_empty());

    store.set("token", "already-gone");
    let page = logout(&service, &store).await;
    assert_eq!(page, Page::Login);
    assert!(load_session(&store).is_none());
}

#[tokio::test]
async fn admin_is_sent_away_from_the_staff_console() {
    let service = InMemoryService::new_with_sample();
    let store = MemoryStore::default();
    login(&service, &store, "admin", "admin").await.unwrap();
    assert_eq!(
        guard(&store, Page::StaffConsole),
        GuardOutcome::Redirect(Page::AdminConsole)
    );
}
