use crate::format::yen;
use crate::services::{Level, MonthlySales};

const ROLLING_MONTHS: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct LevelProgress {
    pub next_level: i64,
    pub description: String,
    pub required_sales: i64,
    pub rolling_total: i64,
    /// Unclamped; above 100 once the threshold is passed.
    pub percent: f64,
    /// Negative once the threshold is passed.
    pub remaining: i64,
}

impl LevelProgress {
    pub fn bar_width(&self) -> f64 {
        self.percent.min(100.0)
    }

    pub fn caption(&self) -> String {
        format!(
            "レベル{}（{}）まであと{}",
            self.next_level,
            self.description,
            yen(self.remaining)
        )
    }
}

/// Sum of the last three monthly totals; `sales` is oldest first.
pub fn rolling_total(sales: &[MonthlySales]) -> i64 {
    let start = sales.len().saturating_sub(ROLLING_MONTHS);
    sales[start..]
        .iter()
        .fold(0i64, |acc, month| acc.saturating_add(month.total_sales))
}

pub fn sorted_ladder(levels: &[Level]) -> Vec<Level> {
    let mut ladder = levels.to_vec();
    ladder.sort_by_key(|level| level.level_number);
    ladder
}

/// Lowest level number strictly above `current_level`.
pub fn next_level(levels: &[Level], current_level: i64) -> Option<Level> {
    sorted_ladder(levels)
        .into_iter()
        .find(|level| level.level_number > current_level)
}

pub fn compute_progress(
    levels: &[Level],
    current_level: i64,
    sales: &[MonthlySales],
) -> Option<LevelProgress> {
    let next = next_level(levels, current_level)?;
    let rolling = rolling_total(sales);
    let percent = if next.required_sales > 0 {
        rolling as f64 * 100.0 / next.required_sales as f64
    } else {
        100.0
    };
    Some(LevelProgress {
        next_level: next.level_number,
        description: next.description,
        required_sales: next.required_sales,
        rolling_total: rolling,
        percent,
        remaining: next.required_sales.saturating_sub(rolling),
    })
}
