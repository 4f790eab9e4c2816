use tracing::info;

use crate::admin_console::{AdminConsole, reload_levels};
use crate::format::yen;
use crate::level_progress::sorted_ladder;
use crate::services::{
    ConsoleContext, ConsoleService, EditMode, Level, LevelPayload, ServiceResult, parse_amount,
    rejected, write_failed,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelForm {
    pub mode: EditMode,
    pub level_number: String,
    pub description: String,
    pub required_sales: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelRow {
    pub level_id: String,
    pub level: String,
    pub description: String,
    pub required_sales: String,
}

impl LevelForm {
    pub fn open(levels: &[Level], mode: EditMode) -> Option<Self> {
        match mode {
            EditMode::Creating => Some(Self::default()),
            EditMode::Editing(level_id) => {
                let level = levels.iter().find(|level| level.level_id == level_id)?;
                Some(Self {
                    level_number: level.level_number.to_string(),
                    description: level.description.clone(),
                    required_sales: level.required_sales.to_string(),
                    mode: EditMode::Editing(level_id),
                })
            }
        }
    }

    pub fn title(&self) -> &'static str {
        if self.mode.is_editing() { "レベル編集" } else { "レベル追加" }
    }

    /// Upsert body; carries the level id only when editing.
    pub fn to_payload(&self) -> Result<LevelPayload, String> {
        let level_number = parse_amount(&self.level_number)
            .filter(|number| *number > 0)
            .ok_or_else(|| "レベル番号は1以上の整数で入力してください".to_string())?;
        let required_sales = parse_amount(&self.required_sales)
            .filter(|sales| *sales >= 0)
            .ok_or_else(|| "必要売上は0以上の整数で入力してください".to_string())?;
        Ok(LevelPayload {
            level_id: self.mode.editing_id().map(str::to_string),
            level_number,
            description: self.description.trim().to_string(),
            required_sales,
        })
    }
}

pub fn level_rows(levels: &[Level]) -> Vec<LevelRow> {
    sorted_ladder(levels)
        .into_iter()
        .map(|level| LevelRow {
            level: format!("レベル {}", level.level_number),
            required_sales: yen(level.required_sales),
            level_id: level.level_id,
            description: level.description,
        })
        .collect()
}

pub fn open_level_form(console: &mut AdminConsole, mode: EditMode) {
    if let Some(form) = LevelForm::open(&console.levels, mode) {
        console.level_form = Some(form);
    }
}

pub fn close_level_form(console: &mut AdminConsole) {
    console.level_form = None;
}

pub async fn save_level<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
) -> ServiceResult<()> {
    let token = ctx.token()?;
    let Some(form) = console.level_form.as_ref() else {
        return Ok(());
    };
    let payload = form.to_payload().map_err(|message| rejected(ctx, message))?;
    service
        .save_level(&token, &payload)
        .await
        .map_err(|err| write_failed(ctx, err))?;
    info!(level = payload.level_number, "level saved");
    ctx.info(if payload.level_id.is_some() { "更新しました" } else { "作成しました" });
    close_level_form(console);
    reload_levels(service, ctx, console).await
}

pub async fn delete_level<S: ConsoleService>(
    service: &S,
    ctx: &mut ConsoleContext,
    console: &mut AdminConsole,
    level_id: &str,
    confirm: impl FnOnce(&str) -> bool,
) -> ServiceResult<()> {
    if !confirm("このレベル設定を削除してもよろしいですか？") {
        return Ok(());
    }
    let token = ctx.token()?;
    service
        .delete_level(&token, level_id)
        .await
        .map_err(|err| write_failed(ctx, err))?;
    ctx.info("レベルを削除しました");
    reload_levels(service, ctx, console).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Vec<Level> {
        vec![
            Level {
                level_id: "b".into(),
                level_number: 2,
                description: "Silver".into(),
                required_sales: 500_000,
            },
            Level {
                level_id: "a".into(),
                level_number: 1,
                description: "Standard".into(),
                required_sales: 0,
            },
        ]
    }

    #[test]
    fn rows_are_sorted_by_level_number() {
        let rows = level_rows(&ladder());
        assert_eq!(rows[0].level, "レベル 1");
        assert_eq!(rows[1].required_sales, "500,000円");
    }

    #[test]
    fn payload_carries_id_only_when_editing() {
        let form = LevelForm::open(&ladder(), EditMode::Editing("b".into())).unwrap();
        assert_eq!(form.to_payload().unwrap().level_id.as_deref(), Some("b"));

        let form = LevelForm {
            level_number: "4".into(),
            required_sales: "100".into(),
            ..LevelForm::default()
        };
        let payload = form.to_payload().unwrap();
        assert_eq!(payload.level_id, None);
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("levelId").is_none());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let form = LevelForm {
            level_number: "0".into(),
            required_sales: "100".into(),
            ..LevelForm::default()
        };
        assert!(form.to_payload().is_err());
        let form = LevelForm {
            level_number: "2".into(),
            required_sales: "-1".into(),
            ..LevelForm::default()
        };
        assert!(form.to_payload().is_err());
    }
}
