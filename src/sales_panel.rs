use std::collections::BTreeMap;

use tracing::info;

use crate::admin_console::AdminConsole;
use crate::format::year_month_heading;
use crate::services::{
    ConsoleContext, ConsoleService, MonthlySales, SalesOrderLine, ServiceResult, parse_amount,
    read_failed, rejected, write_failed,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesMonthView {
    pub year_month: String,
    pub heading: String,
    pub order_sales: i64,
    pub manual_adjustment: i64,
    pub total_sales: i64,
    pub orders: Vec<SalesOrderLine>,
}

impl From<MonthlySales> for SalesMonthView {
    fn from(month: MonthlySales) -> Self {
        Self {
            heading: year_month_heading(&month.year_month),
            order_sales: month.order_sales(),
            manual_adjustment: month.manual_adjustment,
            total_sales: month.total_sales,
            year_month: month.year_month,
            orders: month.orders,
        }
    }
}

/// One user's monthly sales, newest month first, with an adjustment input
/// per month pre-filled with the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SalesPanel {
    pub user_id: String,
    pub user_name: String,
    pub months: Vec<SalesMonthView>,
    pub adjustment_inputs: BTreeMap<String, String>,
}

impl SalesPanel {
    /// `history` arrives oldest first.
    pub fn from_history(user_id: &str, user_name: &str, history: Vec<MonthlySales>) -> Self {
        let months: Vec<SalesMonthView> = history.into_iter().rev().map(Into::into).collect();
        let adjustment_inputs = months
            .iter()
            .map(|month| (month.year_month.clone(), month.manual_adjustment.to_string()))
            .collect();
        Self {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            months,
            adjustment_inputs,
        }
    }

    pub fn title(&self) -> String {
        format!("{} の売上データ", self.user_name)
    }

    pub fn set_adjustment_input(&mut self, year_month: &str, value: String) {
        self.adjustment_inputs.insert(year_month.to_string(), value);
    }
}

pub async fn open_sales_panel<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
    user_id: &str,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let history = service
        .sales_history(&token, user_id)
        .await
        .map_err(|err| read_failed(ctx, err, "売上データ"))?;
    let user_name = console.user_name(user_id).to_string();
    console.sales_panel = Some(SalesPanel::from_history(user_id, &user_name, history));
    Ok(())
}

pub fn close_sales_panel(console: &mut AdminConsole) {
    console.sales_panel = None;
}

/// Replaces one month's manual adjustment, then re-reads the whole history.
pub async fn submit_adjustment<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
    year_month: &str,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let Some(panel) = console.sales_panel.as_ref() else {
        return Ok(());
    };
    let raw = panel
        .adjustment_inputs
        .get(year_month)
        .map(String::as_str)
        .unwrap_or_default();
    let adjustment = parse_amount(raw)
        .ok_or_else(|| rejected(ctx, "調整額は整数で入力してください"))?;
    let user_id = panel.user_id.clone();
    service
        .adjust_sales(&token, &user_id, year_month, adjustment)
        .await
        .map_err(|err| write_failed(ctx, err))?;
    info!(%user_id, year_month, adjustment, "sales adjusted");
    ctx.info("売上を調整しました");
    close_sales_panel(console);
    open_sales_panel(service, ctx, console, &user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year_month: &str, total_sales: i64, manual_adjustment: i64) -> MonthlySales {
        MonthlySales {
            year_month: year_month.into(),
            total_sales,
            manual_adjustment,
            orders: vec![SalesOrderLine {
                title: "Site".into(),
                amount: total_sales - manual_adjustment,
                date: format!("{}-{}-01", &year_month[..4], &year_month[4..]),
            }],
        }
    }

    #[test]
    fn months_are_newest_first_with_order_sales_split_out() {
        let panel = SalesPanel::from_history(
            "tanaka",
            "田中",
            vec![month("202401", 500, 100), month("202402", 800, 0)],
        );
        assert_eq!(panel.months[0].year_month, "202402");
        assert_eq!(panel.months[1].order_sales, 400);
        assert_eq!(panel.months[1].manual_adjustment, 100);
        assert_eq!(panel.months[1].heading, "2024年01月");
        assert_eq!(panel.adjustment_inputs["202401"], "100");
        assert_eq!(panel.title(), "田中 の売上データ");
    }
}
