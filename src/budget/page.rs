use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

use super::calculator::{calculate_budget_summary, BudgetSummary, CategoryBudgetItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPageResponse {
    pub month: u32,
    pub year: i32,
    #[serde(rename = "categoryBudgets")]
    pub category_budgets: Vec<CategoryBudgetItem>,
    pub summary: BudgetSummary,
}

/// Wrap items and their summary for one month. Month and year pass through
/// unchecked; the only failure is a summary total overflowing.
pub fn compose_budget_page_response(
    month: u32,
    year: i32,
    items: Vec<CategoryBudgetItem>,
) -> Result<BudgetPageResponse, BudgetError> {
    let summary = calculate_budget_summary(&items)?;
    Ok(BudgetPageResponse {
        month,
        year,
        category_budgets: items,
        summary,
    })
}
