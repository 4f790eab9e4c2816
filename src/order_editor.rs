//! Draft editing for one order and its assignment split.
//!
//! The only rule enforced here is the one the backend also enforces: the
//! assignment amounts must add up to the declared total, and nobody is
//! assigned twice. Violations never leave the browser.

use tracing::info;

use crate::admin_console::{AdminConsole, reload_orders};
use crate::format::{date_input_value, deadline_label, thousands, yen};
use crate::services::{
    Assignment, ConsoleContext, ConsoleError, ConsoleService, EditMode, Order, OrderPayload,
    OrderStatus, Role, ServiceResult, User, parse_amount, rejected, write_failed,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderDraft {
    pub mode: EditMode,
    pub title: String,
    /// Raw contents of the total-amount input.
    pub total_amount: String,
    pub deadline: String,
    pub status: OrderStatus,
    pub assignments: Vec<Assignment>,
    pub assignee_input: String,
    pub amount_input: String,
}

/// Running sum shown next to the declared total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignmentTotals {
    /// `None` once the amounts no longer fit in an `i64`.
    pub assigned: Option<i64>,
    pub declared: i64,
}

impl AssignmentTotals {
    pub fn balanced(&self) -> bool {
        self.assigned == Some(self.declared)
    }

    pub fn assigned_label(&self) -> String {
        self.assigned.map(yen).unwrap_or_else(|| OUT_OF_RANGE.into())
    }
}

const OUT_OF_RANGE: &str = "桁あふれ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentLine {
    pub user_id: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRow {
    pub order_id: String,
    pub title: String,
    pub total: String,
    pub assignees: String,
    pub deadline: String,
    pub status: OrderStatus,
}

impl OrderDraft {
    pub fn creating() -> Self {
        Self::default()
    }

    /// Starts a draft; editing an id missing from `orders` opens nothing.
    pub fn open(orders: &[Order], mode: EditMode) -> Option<Self> {
        match mode {
            EditMode::Creating => Some(Self::creating()),
            EditMode::Editing(order_id) => {
                let order = orders.iter().find(|order| order.order_id == order_id)?;
                Some(Self {
                    title: order.title.clone(),
                    total_amount: order.total_amount.to_string(),
                    deadline: order
                        .deadline
                        .as_deref()
                        .map(date_input_value)
                        .unwrap_or_default(),
                    status: order.status,
                    assignments: order.assignments.clone(),
                    mode: EditMode::Editing(order_id),
                    ..Self::default()
                })
            }
        }
    }

    /// Appends the pending assignee/amount inputs to the draft.
    ///
    /// On rejection the draft is untouched and the inputs are kept.
    pub fn add_assignment(&mut self, users: &[User]) -> ServiceResult<()> {
        let user_id = self.assignee_input.trim().to_string();
        let amount = parse_amount(&self.amount_input).filter(|amount| *amount > 0);
        let Some(amount) = amount.filter(|_| !user_id.is_empty()) else {
            return Err(ConsoleError::Validation(
                "担当者と金額を入力してください".into(),
            ));
        };
        let is_staff = users
            .iter()
            .any(|user| user.user_id == user_id && user.role == Role::Staff);
        if !is_staff {
            return Err(ConsoleError::Validation(format!(
                "担当者 {user_id} は一般社員ではありません"
            )));
        }
        if self.assignments.iter().any(|a| a.user_id == user_id) {
            return Err(ConsoleError::Validation(
                "この担当者は既に追加されています".into(),
            ));
        }
        if self.assigned_total().and_then(|total| total.checked_add(amount)).is_none() {
            return Err(ConsoleError::Validation(
                "割り振り合計が大きすぎます".into(),
            ));
        }
        self.assignments.push(Assignment { user_id, amount });
        self.assignee_input.clear();
        self.amount_input.clear();
        Ok(())
    }

    pub fn remove_assignment(&mut self, user_id: &str) {
        self.assignments.retain(|a| a.user_id != user_id);
    }

    pub fn assigned_total(&self) -> Option<i64> {
        self.assignments
            .iter()
            .try_fold(0i64, |acc, a| acc.checked_add(a.amount))
    }

    /// Declared total for display; an unreadable input counts as zero.
    pub fn declared_total(&self) -> i64 {
        parse_amount(&self.total_amount).unwrap_or(0)
    }

    pub fn totals(&self) -> AssignmentTotals {
        AssignmentTotals {
            assigned: self.assigned_total(),
            declared: self.declared_total(),
        }
    }

    pub fn assignment_lines(&self, users: &[User]) -> Vec<AssignmentLine> {
        self.assignments
            .iter()
            .map(|assignment| {
                let name = users
                    .iter()
                    .find(|user| user.user_id == assignment.user_id)
                    .map(|user| user.name.as_str())
                    .unwrap_or(&assignment.user_id);
                AssignmentLine {
                    user_id: assignment.user_id.clone(),
                    label: format!("{name}: {}", yen(assignment.amount)),
                }
            })
            .collect()
    }

    /// Builds the request body, or the message explaining why it cannot be sent.
    pub fn to_payload(&self) -> Result<OrderPayload, String> {
        if self.title.trim().is_empty() {
            return Err("案件名を入力してください".into());
        }
        let declared = parse_amount(&self.total_amount);
        let assigned = self.assigned_total();
        let Some(assigned) = assigned.filter(|sum| declared == Some(*sum)) else {
            let assigned = assigned.map(yen).unwrap_or_else(|| OUT_OF_RANGE.into());
            let declared = declared
                .map(thousands)
                .unwrap_or_else(|| self.total_amount.trim().to_string());
            return Err(format!(
                "割り振り合計（{assigned}）が総額（{declared}円）と一致しません"
            ));
        };
        let deadline = self.deadline.trim();
        Ok(OrderPayload {
            title: self.title.trim().to_string(),
            total_amount: assigned,
            deadline: (!deadline.is_empty()).then(|| deadline.to_string()),
            status: self.status,
            assignments: self.assignments.clone(),
        })
    }
}

pub fn open_order_editor(console: &mut AdminConsole, mode: EditMode) {
    if let Some(draft) = OrderDraft::open(&console.orders, mode) {
        console.order_draft = Some(draft);
    }
}

pub fn close_order_editor(console: &mut AdminConsole) {
    console.order_draft = None;
}

/// Adds the pending assignment to the open draft, reporting rejections.
pub fn add_assignment(ctx: &mut ConsoleContext, console: &mut AdminConsole) -> ServiceResult<()> {
    let AdminConsole {
        users, order_draft, ..
    } = console;
    let Some(draft) = order_draft.as_mut() else {
        return Ok(());
    };
    draft.add_assignment(users).map_err(|err| rejected(ctx, err.to_string()))
}

pub fn remove_assignment(console: &mut AdminConsole, user_id: &str) {
    if let Some(draft) = console.order_draft.as_mut() {
        draft.remove_assignment(user_id);
    }
}

/// Validates and sends the open draft, then re-reads the order list.
pub async fn submit_order<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let Some(draft) = console.order_draft.as_ref() else {
        return Ok(());
    };
    let payload = draft.to_payload().map_err(|message| rejected(ctx, message))?;
    let result = match &draft.mode {
        EditMode::Creating => service.create_order(&token, &payload).await,
        EditMode::Editing(order_id) => service.update_order(&token, order_id, &payload).await,
    };
    result.map_err(|err| write_failed(ctx, err))?;
    info!(title = %payload.title, total = payload.total_amount, "order saved");
    ctx.info(if draft.mode.is_editing() { "更新しました" } else { "作成しました" });
    close_order_editor(console);
    reload_orders(service, ctx, console).await
}

pub async fn delete_order<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
    order_id: &str,
    confirm: impl FnOnce(&str) -> bool,
) -> ServiceResult<()> {
    if !confirm("この発注を削除してもよろしいですか？") {
        return Ok(());
    }
    let token = ctx.token()?;
    service
        .delete_order(&token, order_id)
        .await
        .map_err(|err| write_failed(ctx, err))?;
    ctx.info("発注を削除しました");
    reload_orders(service, ctx, console).await
}

pub fn order_rows(console: &AdminConsole) -> Vec<OrderRow> {
    console
        .orders
        .iter()
        .map(|order| {
            let assignees = order
                .assignments
                .iter()
                .map(|a| format!("{}({})", console.user_name(&a.user_id), yen(a.amount)))
                .collect::<Vec<_>>()
                .join(", ");
            OrderRow {
                order_id: order.order_id.clone(),
                title: order.title.clone(),
                total: yen(order.total_amount),
                assignees: if assignees.is_empty() { "-".into() } else { assignees },
                deadline: deadline_label(order.deadline.as_deref()),
                status: order.status,
            }
        })
        .collect()
}
