use tracing::info;

use crate::admin_console::{AdminConsole, reload_users};
use crate::services::{
    BusinessType, ConsoleContext, ConsoleService, EditMode, Role, ServiceResult, User,
    UserPayload, parse_amount, rejected, write_failed,
};

/// Employee form. The id cannot change once the user exists, and the
/// password may be left blank when editing.
#[derive(Clone, Debug, PartialEq)]
pub struct UserForm {
    pub mode: EditMode,
    pub user_id: String,
    pub password: String,
    pub name: String,
    pub business_type: BusinessType,
    pub business_name: String,
    pub address: String,
    pub birthdate: String,
    pub role: Role,
    pub level: String,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            mode: EditMode::Creating,
            user_id: String::new(),
            password: String::new(),
            name: String::new(),
            business_type: BusinessType::Individual,
            business_name: String::new(),
            address: String::new(),
            birthdate: String::new(),
            role: Role::Staff,
            level: "1".into(),
        }
    }
}

impl UserForm {
    pub fn open(users: &[User], mode: EditMode) -> Option<Self> {
        match mode {
            EditMode::Creating => Some(Self::default()),
            EditMode::Editing(user_id) => {
                let user = users.iter().find(|user| user.user_id == user_id)?;
                Some(Self {
                    user_id: user.user_id.clone(),
                    name: user.name.clone(),
                    business_type: user.business_type,
                    business_name: user.business_name.clone(),
                    address: user.address.clone(),
                    birthdate: user.birthdate.clone(),
                    role: user.role,
                    level: user.level.to_string(),
                    mode: EditMode::Editing(user_id),
                    password: String::new(),
                })
            }
        }
    }

    pub fn title(&self) -> &'static str {
        if self.mode.is_editing() { "ユーザー編集" } else { "ユーザー追加" }
    }

    pub fn id_editable(&self) -> bool {
        !self.mode.is_editing()
    }

    pub fn password_required(&self) -> bool {
        !self.mode.is_editing()
    }

    pub fn to_payload(&self) -> Result<UserPayload, String> {
        let user_id = match &self.mode {
            EditMode::Editing(user_id) => user_id.clone(),
            EditMode::Creating => self.user_id.trim().to_string(),
        };
        if user_id.is_empty() {
            return Err("ユーザーIDを入力してください".into());
        }
        if self.password_required() && self.password.is_empty() {
            return Err("パスワードを入力してください".into());
        }
        if self.name.trim().is_empty() {
            return Err("氏名を入力してください".into());
        }
        let level = parse_amount(&self.level)
            .filter(|level| *level >= 1)
            .ok_or_else(|| "レベルは1以上の整数で入力してください".to_string())?;
        Ok(UserPayload {
            user_id,
            name: self.name.trim().to_string(),
            business_type: self.business_type,
            business_name: self.business_name.clone(),
            address: self.address.clone(),
            birthdate: self.birthdate.clone(),
            role: self.role,
            level,
            password: (!self.password.is_empty()).then(|| self.password.clone()),
        })
    }
}

pub fn open_user_form(console: &mut AdminConsole, mode: EditMode) {
    if let Some(form) = UserForm::open(&console.users, mode) {
        console.user_form = Some(form);
    }
}

pub fn close_user_form(console: &mut AdminConsole) {
    console.user_form = None;
}

pub async fn save_user<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let Some(form) = console.user_form.as_ref() else {
        return Ok(());
    };
    let payload = form.to_payload().map_err(|message| rejected(ctx, message))?;
    let editing = form.mode.is_editing();
    let result = match &form.mode {
        EditMode::Creating => service.create_user(&token, &payload).await,
        EditMode::Editing(user_id) => service.update_user(&token, user_id, &payload).await,
    };
    result.map_err(|err| write_failed(ctx, err))?;
    info!(user_id = %payload.user_id, editing, "user saved");
    ctx.info(if editing { "更新しました" } else { "作成しました" });
    close_user_form(console);
    reload_users(service, ctx, console).await
}

pub async fn delete_user<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
    user_id: &str,
    confirm: impl FnOnce(&str) -> bool,
) -> ServiceResult<()> {
    if !confirm(&format!("ユーザー \"{user_id}\" を削除してもよろしいですか？")) {
        return Ok(());
    }
    let token = ctx.token()?;
    service
        .delete_user(&token, user_id)
        .await
        .map_err(|err| write_failed(ctx, err))?;
    ctx.info("ユーザーを削除しました");
    reload_users(service, ctx, console).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Vec<User> {
        vec![User {
            user_id: "tanaka".into(),
            name: "田中".into(),
            level: 3,
            ..User::default()
        }]
    }

    #[test]
    fn edit_mode_locks_id_and_relaxes_password() {
        let form = UserForm::open(&existing(), EditMode::Editing("tanaka".into())).unwrap();
        assert!(!form.id_editable());
        assert!(!form.password_required());
        assert_eq!(form.level, "3");
        let payload = form.to_payload().unwrap();
        assert_eq!(payload.password, None);
        assert_eq!(payload.user_id, "tanaka");
    }

    #[test]
    fn edit_mode_ignores_typed_id() {
        let mut form = UserForm::open(&existing(), EditMode::Editing("tanaka".into())).unwrap();
        form.user_id = "renamed".into();
        assert_eq!(form.to_payload().unwrap().user_id, "tanaka");
    }

    #[test]
    fn create_mode_requires_id_and_password() {
        let mut form = UserForm::open(&existing(), EditMode::Creating).unwrap();
        assert!(form.id_editable());
        assert!(form.password_required());
        form.name = "佐藤".into();
        assert!(form.to_payload().is_err());
        form.user_id = "sato".into();
        assert!(form.to_payload().is_err());
        form.password = "secret".into();
        let payload = form.to_payload().unwrap();
        assert_eq!(payload.password.as_deref(), Some("secret"));
        assert_eq!(payload.level, 1);
    }

    #[test]
    fn level_must_be_positive() {
        let mut form = UserForm::open(&existing(), EditMode::Editing("tanaka".into())).unwrap();
        form.level = "0".into();
        assert!(form.to_payload().is_err());
    }

    #[test]
    fn unknown_user_opens_nothing() {
        assert!(UserForm::open(&existing(), EditMode::Editing("ghost".into())).is_none());
    }
}
