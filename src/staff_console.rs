//! The staff member's own dashboard: profile, monthly sales, assigned
//! orders and progress toward the next level.

use futures::join;
use tracing::info;

use crate::format::{
    deadline_label, japanese_date, status_label, year_month_heading, year_month_label, yen,
};
use crate::level_progress::{LevelProgress, compute_progress, rolling_total};
use crate::services::{
    BusinessType, ConsoleContext, ConsoleService, MonthlySales, Order, OrderStatus, ProfileUpdate,
    ServiceResult, User, read_failed, rejected, write_failed,
};
use crate::session::{SessionStore, remember_user_name};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub user_id: String,
    pub name: String,
    pub business_type: BusinessType,
    pub business_name: String,
    pub address: String,
    pub birthdate: String,
    pub new_password: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            business_type: user.business_type,
            business_name: user.business_name.clone(),
            address: user.address.clone(),
            birthdate: user.birthdate.clone(),
            new_password: String::new(),
        }
    }

    /// `newPassword` is only sent when something was typed.
    pub fn to_update(&self) -> Result<ProfileUpdate, String> {
        if self.name.trim().is_empty() {
            return Err("氏名を入力してください".into());
        }
        Ok(ProfileUpdate {
            name: self.name.trim().to_string(),
            business_type: self.business_type,
            business_name: self.business_name.clone(),
            address: self.address.clone(),
            birthdate: self.birthdate.clone(),
            new_password: (!self.new_password.is_empty()).then(|| self.new_password.clone()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartPoint {
    pub label: String,
    pub total_sales: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaffOrderRow {
    pub order_id: String,
    pub title: String,
    pub my_amount: i64,
    pub deadline: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
}

impl StaffOrderRow {
    fn for_user(order: &Order, user_id: &str) -> Self {
        let my_amount = order
            .assignments
            .iter()
            .find(|assignment| assignment.user_id == user_id)
            .map(|assignment| assignment.amount)
            .unwrap_or(0);
        Self {
            order_id: order.order_id.clone(),
            title: order.title.clone(),
            my_amount,
            deadline: deadline_label(order.deadline.as_deref()),
            status: order.status,
            status_label: status_label(order.status),
        }
    }

    pub fn amount_label(&self) -> String {
        yen(self.my_amount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthOrderLine {
    pub title: String,
    pub amount: String,
    pub date: String,
}

/// One block of the monthly breakdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthDetail {
    pub year_month: String,
    pub heading: String,
    pub total: String,
    /// Empty when no order was recorded that month.
    pub orders: Vec<MonthOrderLine>,
    /// Only present for a non-zero manual adjustment.
    pub adjustment: Option<String>,
}

impl MonthDetail {
    pub fn from_month(month: &MonthlySales) -> Self {
        Self {
            year_month: month.year_month.clone(),
            heading: year_month_heading(&month.year_month),
            total: yen(month.total_sales),
            orders: month
                .orders
                .iter()
                .map(|line| MonthOrderLine {
                    title: line.title.clone(),
                    amount: yen(line.amount),
                    date: japanese_date(&line.date),
                })
                .collect(),
            adjustment: (month.manual_adjustment != 0).then(|| yen(month.manual_adjustment)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaffDashboard {
    pub profile: Option<ProfileForm>,
    pub current_level: i64,
    pub current_month_sales: i64,
    pub rolling_total: i64,
    pub chart: Vec<ChartPoint>,
    /// Newest month first.
    pub months: Vec<MonthlySales>,
    pub orders: Vec<StaffOrderRow>,
    pub progress: Option<LevelProgress>,
}

impl StaffDashboard {
    /// `history` arrives oldest first, as the backend returns it.
    pub fn apply_sales(&mut self, history: &[MonthlySales]) {
        self.current_month_sales = history.last().map(|month| month.total_sales).unwrap_or(0);
        self.rolling_total = rolling_total(history);
        self.chart = history
            .iter()
            .map(|month| ChartPoint {
                label: year_month_label(&month.year_month),
                total_sales: month.total_sales,
            })
            .collect();
        self.months = history.iter().rev().cloned().collect();
    }

    /// Breakdown per month, newest first.
    pub fn month_details(&self) -> Vec<MonthDetail> {
        self.months.iter().map(MonthDetail::from_month).collect()
    }

    pub fn apply_orders(&mut self, orders: &[Order], user_id: &str) {
        self.orders = orders
            .iter()
            .map(|order| StaffOrderRow::for_user(order, user_id))
            .collect();
    }
}

async fn load_profile<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    dashboard: &mut StaffDashboard,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let user_id = ctx.user_id()?;
    let user = service
        .get_user(&token, &user_id)
        .await
        .map_err(|err| read_failed(ctx, err, "プロフィール"))?;
    dashboard.current_level = user.level;
    dashboard.profile = Some(ProfileForm::from_user(&user));
    Ok(())
}

async fn load_sales<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    dashboard: &mut StaffDashboard,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let user_id = ctx.user_id()?;
    let history = service
        .sales_history(&token, &user_id)
        .await
        .map_err(|err| read_failed(ctx, err, "売上データ"))?;
    dashboard.apply_sales(&history);
    Ok(())
}

async fn load_orders<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    dashboard: &mut StaffDashboard,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let user_id = ctx.user_id()?;
    let orders = service
        .list_orders(&token)
        .await
        .map_err(|err| read_failed(ctx, err, "発注一覧"))?;
    dashboard.apply_orders(&orders, &user_id);
    Ok(())
}

/// Levels and sales are fetched together, then the profile is re-read so
/// the current level reflects any change made since the page opened.
pub async fn refresh_progress<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    dashboard: &mut StaffDashboard,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let user_id = ctx.user_id()?;
    let (levels, sales) = join!(
        service.list_levels(&token),
        service.sales_history(&token, &user_id)
    );
    let levels = levels.map_err(|err| read_failed(ctx, err, "レベル進捗"))?;
    let sales = sales.map_err(|err| read_failed(ctx, err, "レベル進捗"))?;
    let user = service
        .get_user(&token, &user_id)
        .await
        .map_err(|err| read_failed(ctx, err, "レベル進捗"))?;
    dashboard.current_level = user.level;
    dashboard.progress = compute_progress(&levels, user.level, &sales);
    Ok(())
}

/// Page load. A section whose fetch fails stays empty; only a rejected
/// credential stops the remaining sections.
pub async fn load_staff_dashboard<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
) -> ServiceResult<StaffDashboard> {
    let mut dashboard = StaffDashboard::default();
    let steps = [
        Section::Profile,
        Section::Sales,
        Section::Orders,
        Section::Progress,
    ];
    for section in steps {
        let result = match section {
            Section::Profile => load_profile(service, ctx, &mut dashboard).await,
            Section::Sales => load_sales(service, ctx, &mut dashboard).await,
            Section::Orders => load_orders(service, ctx, &mut dashboard).await,
            Section::Progress => refresh_progress(service, ctx, &mut dashboard).await,
        };
        if let Err(err) = result {
            if err.is_unauthorized() {
                return Err(err);
            }
        }
    }
    Ok(dashboard)
}

#[derive(Clone, Copy)]
enum Section {
    Profile,
    Sales,
    Orders,
    Progress,
}

pub async fn save_profile<S: ConsoleService, St: SessionStore>(
    service: &S,
    ctx: &mut ConsoleContext,
    store: &St,
    dashboard: &mut StaffDashboard,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let user_id = ctx.user_id()?;
    let Some(form) = dashboard.profile.as_ref() else {
        return Ok(());
    };
    let update = form.to_update().map_err(|message| rejected(ctx, message))?;
    service
        .update_profile(&token, &user_id, &update)
        .await
        .map_err(|err| write_failed(ctx, err))?;
    info!(%user_id, password_changed = update.new_password.is_some(), "profile updated");
    remember_user_name(store, &update.name);
    if let Some(session) = ctx.session.as_mut() {
        session.user_name = update.name.clone();
    }
    if let Some(form) = dashboard.profile.as_mut() {
        form.name = update.name;
        form.new_password.clear();
    }
    ctx.info("プロフィールを更新しました");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Assignment, SalesOrderLine};

    fn month(year_month: &str, total_sales: i64) -> MonthlySales {
        MonthlySales {
            year_month: year_month.into(),
            total_sales,
            ..MonthlySales::default()
        }
    }

    #[test]
    fn sales_summary_uses_latest_month_and_rolling_window() {
        let mut dashboard = StaffDashboard::default();
        dashboard.apply_sales(&[
            month("202312", 9_000),
            month("202401", 1_000),
            month("202402", 2_000),
            month("202403", 3_000),
        ]);
        assert_eq!(dashboard.current_month_sales, 3_000);
        assert_eq!(dashboard.rolling_total, 6_000);
        assert_eq!(dashboard.months[0].year_month, "202403");
        assert_eq!(dashboard.chart[0].label, "2023/12");
    }

    #[test]
    fn empty_history_means_zero() {
        let mut dashboard = StaffDashboard::default();
        dashboard.apply_sales(&[]);
        assert_eq!(dashboard.current_month_sales, 0);
        assert!(dashboard.chart.is_empty());
    }

    #[test]
    fn month_details_list_orders_and_nonzero_adjustments() {
        let mut busy = month("202402", 1_500);
        busy.manual_adjustment = 500;
        busy.orders = vec![SalesOrderLine {
            title: "Logo".into(),
            amount: 1_000,
            date: "2024-02-05".into(),
        }];
        let mut dashboard = StaffDashboard::default();
        dashboard.apply_sales(&[busy, month("202403", 0)]);

        let details = dashboard.month_details();
        assert_eq!(details[0].year_month, "202403");
        assert!(details[0].orders.is_empty());
        assert_eq!(details[0].adjustment, None);
        assert_eq!(details[1].adjustment.as_deref(), Some("500円"));
        assert_eq!(
            details[1].orders,
            vec![MonthOrderLine {
                title: "Logo".into(),
                amount: "1,000円".into(),
                date: "2024/2/5".into(),
            }]
        );
        assert_eq!(details[1].total, "1,500円");
    }

    #[test]
    fn order_rows_show_own_share_only() {
        let order = Order {
            order_id: "o1".into(),
            title: "Site".into(),
            total_amount: 300,
            assignments: vec![
                Assignment {
                    user_id: "tanaka".into(),
                    amount: 200,
                },
                Assignment {
                    user_id: "suzuki".into(),
                    amount: 100,
                },
            ],
            ..Order::default()
        };
        let mut dashboard = StaffDashboard::default();
        dashboard.apply_orders(&[order.clone()], "suzuki");
        assert_eq!(dashboard.orders[0].my_amount, 100);
        assert_eq!(dashboard.orders[0].deadline, "-");
        dashboard.apply_orders(&[order], "sato");
        assert_eq!(dashboard.orders[0].amount_label(), "0円");
    }

    #[test]
    fn blank_password_is_not_sent() {
        let mut form = ProfileForm::from_user(&User {
            user_id: "tanaka".into(),
            name: "田中".into(),
            ..User::default()
        });
        assert_eq!(form.to_update().unwrap().new_password, None);
        form.new_password = "next".into();
        assert_eq!(form.to_update().unwrap().new_password.as_deref(), Some("next"));
        form.name = "  ".into();
        assert!(form.to_update().is_err());
    }
}
