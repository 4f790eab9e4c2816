//! Display helpers shared by both consoles.

use chrono::{Datelike, NaiveDate};

use crate::services::{BusinessType, OrderStatus, Role, User};

/// `1234567` -> `1,234,567`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn yen(value: i64) -> String {
    format!("{}円", thousands(value))
}

fn split_year_month(year_month: &str) -> (&str, &str) {
    if year_month.len() >= 6 && year_month.is_char_boundary(4) && year_month.is_char_boundary(6) {
        (&year_month[..4], &year_month[4..6])
    } else {
        (year_month, "")
    }
}

/// Chart axis label, `202401` -> `2024/01`.
pub fn year_month_label(year_month: &str) -> String {
    let (year, month) = split_year_month(year_month);
    format!("{year}/{month}")
}

/// Section heading, `202401` -> `2024年01月`.
pub fn year_month_heading(year_month: &str) -> String {
    let (year, month) = split_year_month(year_month);
    format!("{year}年{month}月")
}

/// Date part of an ISO date or timestamp, for `<input type="date">`.
pub fn date_input_value(raw: &str) -> String {
    raw.split('T').next().unwrap_or_default().to_string()
}

/// `2024-01-05` or `2024-01-05T00:00:00Z` -> `2024/1/5`; other input is echoed.
pub fn japanese_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(&date_input_value(raw), "%Y-%m-%d") {
        Ok(date) => format!("{}/{}/{}", date.year(), date.month(), date.day()),
        Err(_) => raw.to_string(),
    }
}

pub fn deadline_label(deadline: Option<&str>) -> String {
    match deadline.filter(|d| !d.is_empty()) {
        Some(raw) => japanese_date(raw),
        None => "-".into(),
    }
}

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "未着手",
        OrderStatus::InProgress => "進行中",
        OrderStatus::Completed => "完了",
    }
}

/// CSS class suffix for the status badge.
pub fn status_badge_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "badge-pending",
        OrderStatus::InProgress => "badge-in-progress",
        OrderStatus::Completed => "badge-completed",
    }
}

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "管理者",
        Role::Staff => "一般社員",
    }
}

pub fn business_label(user: &User) -> String {
    let kind = match user.business_type {
        BusinessType::Corporate => "法人",
        BusinessType::Individual => "個人",
    };
    if user.business_name.is_empty() {
        kind.to_string()
    } else {
        format!("{kind} ({})", user.business_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-1000), "-1,000");
        assert_eq!(yen(-1000), "-1,000円");
    }

    #[test]
    fn year_month_formats() {
        assert_eq!(year_month_label("202401"), "2024/01");
        assert_eq!(year_month_heading("202412"), "2024年12月");
    }

    #[test]
    fn dates_render_without_padding() {
        assert_eq!(japanese_date("2024-01-05"), "2024/1/5");
        assert_eq!(japanese_date("2024-03-31T00:00:00.000Z"), "2024/3/31");
        assert_eq!(deadline_label(None), "-");
        assert_eq!(deadline_label(Some("")), "-");
        assert_eq!(date_input_value("2024-03-31T09:00:00Z"), "2024-03-31");
    }

    #[test]
    fn business_label_includes_name_when_present() {
        let mut user = User::default();
        assert_eq!(business_label(&user), "個人");
        user.business_type = BusinessType::Corporate;
        user.business_name = "Acme".into();
        assert_eq!(business_label(&user), "法人 (Acme)");
    }
}
