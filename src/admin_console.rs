use crate::format::{business_label, role_label, thousands};
use crate::manage_levels::LevelForm;
use crate::manage_users::UserForm;
use crate::order_editor::OrderDraft;
use crate::sales_panel::SalesPanel;
use crate::services::{
    ConsoleContext, ConsoleService, Level, Order, Role, ServiceResult, User, read_failed,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdminTab {
    #[default]
    Users,
    Orders,
    Levels,
}

/// Everything the admin page shows. List caches are replaced wholesale on
/// every reload; at most one editor surface of each kind is open.
#[derive(Clone, Debug, Default)]
pub struct AdminConsole {
    pub tab: AdminTab,
    pub users: Vec<User>,
    pub orders: Vec<Order>,
    pub levels: Vec<Level>,
    pub user_form: Option<UserForm>,
    pub order_draft: Option<OrderDraft>,
    pub level_form: Option<LevelForm>,
    pub sales_panel: Option<SalesPanel>,
    /// A request started from the console is in flight; the page keeps its
    /// inputs disabled until the result has been written back.
    pub busy: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: String,
    pub name: String,
    pub business: String,
    pub level: String,
    pub role: Role,
    pub role_label: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssigneeOption {
    pub user_id: String,
    pub label: String,
}

impl AdminConsole {
    pub fn show_tab(&mut self, tab: AdminTab) {
        self.tab = tab;
    }

    /// Claims the console for one request. Returns `false` while another
    /// request is still pending.
    pub fn begin_request(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn end_request(&mut self) {
        self.busy = false;
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.user_id == user_id)
    }

    /// Name for display, falling back to the raw id.
    pub fn user_name<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.user(user_id)
            .map(|user| user.name.as_str())
            .unwrap_or(user_id)
    }

    pub fn user_rows(&self) -> Vec<UserRow> {
        self.users
            .iter()
            .map(|user| UserRow {
                user_id: user.user_id.clone(),
                name: user.name.clone(),
                business: business_label(user),
                level: format!("レベル {}", thousands(user.level)),
                role: user.role,
                role_label: role_label(user.role),
            })
            .collect()
    }

    /// Staff members selectable as order assignees.
    pub fn assignee_options(&self) -> Vec<AssigneeOption> {
        self.users
            .iter()
            .filter(|user| user.role == Role::Staff)
            .map(|user| AssigneeOption {
                user_id: user.user_id.clone(),
                label: format!("{} ({})", user.name, user.user_id),
            })
            .collect()
    }
}

pub async fn reload_users<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    match service.list_users(&token).await {
        Ok(users) => {
            console.users = users;
            Ok(())
        }
        Err(err) => Err(read_failed(ctx, err, "ユーザー一覧")),
    }
}

pub async fn reload_orders<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    match service.list_orders(&token).await {
        Ok(orders) => {
            console.orders = orders;
            Ok(())
        }
        Err(err) => Err(read_failed(ctx, err, "発注一覧")),
    }
}

pub async fn reload_levels<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    match service.list_levels(&token).await {
        Ok(levels) => {
            console.levels = levels;
            Ok(())
        }
        Err(err) => Err(read_failed(ctx, err, "レベル一覧")),
    }
}

/// Initial page load: users, orders, then levels, one after another.
///
/// A failed list stays empty and loading continues; only a rejected
/// credential stops it.
pub async fn load_admin_console<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
) -> ServiceResult<AdminConsole> {
    let mut console = AdminConsole::default();
    for step in [AdminTab::Users, AdminTab::Orders, AdminTab::Levels] {
        let result = match step {
            AdminTab::Users => reload_users(service, ctx, &mut console).await,
            AdminTab::Orders => reload_orders(service, ctx, &mut console).await,
            AdminTab::Levels => reload_levels(service, ctx, &mut console).await,
        };
        if let Err(err) = result {
            if err.is_unauthorized() {
                return Err(err);
            }
        }
    }
    console.show_tab(AdminTab::Users);
    Ok(console)
}
