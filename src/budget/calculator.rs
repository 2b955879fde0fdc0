use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BudgetError;
use crate::models::BudgetSetupItem;
use crate::spending::CategorySpendingResult;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBudgetItem {
    pub category_id: i64,
    pub category_name: String,
    pub budgeted_amount: Decimal,
    pub spent_amount: Decimal,
    pub remaining_amount: Decimal,
    pub percentage_used: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_budgeted: Decimal,
    pub total_spent: Decimal,
    pub total_remaining: Decimal,
    pub overall_percentage_used: Decimal,
}

/// `budgeted - spent`, unclamped.
pub fn calculate_category_remaining(budgeted: Decimal, spent: Decimal) -> Result<Decimal, BudgetError> {
    budgeted
        .checked_sub(spent)
        .ok_or(BudgetError::Overflow("remaining amount"))
}

/// Magnitude of `spent` as a percentage of `budgeted`. Zero when nothing is
/// budgeted; may exceed 100.
pub fn calculate_percentage_used(spent: Decimal, budgeted: Decimal) -> Result<Decimal, BudgetError> {
    if budgeted.is_zero() {
        return Ok(Decimal::ZERO);
    }
    spent
        .abs()
        .checked_div(budgeted)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .ok_or(BudgetError::Overflow("percentage used"))
}

/// One item per budget, in the order the budgets were given.
pub fn build_category_budget_items(
    budgets: &[BudgetSetupItem],
    spending: &HashMap<i64, CategorySpendingResult>,
) -> Result<Vec<CategoryBudgetItem>, BudgetError> {
    budgets
        .iter()
        .map(|budget| {
            let spent = spending
                .get(&budget.category_id)
                .map(|s| s.total_spent)
                .unwrap_or(Decimal::ZERO);
            Ok(CategoryBudgetItem {
                category_id: budget.category_id,
                category_name: budget.category_name.clone(),
                budgeted_amount: budget.planned_amount,
                spent_amount: spent,
                remaining_amount: calculate_category_remaining(budget.planned_amount, spent)?,
                percentage_used: calculate_percentage_used(spent, budget.planned_amount)?,
            })
        })
        .collect()
}

pub fn calculate_budget_summary(items: &[CategoryBudgetItem]) -> Result<BudgetSummary, BudgetError> {
    let mut summary = items
        .iter()
        .try_fold(BudgetSummary::default(), |mut acc, item| {
            acc.total_budgeted = acc.total_budgeted.checked_add(item.budgeted_amount)?;
            acc.total_spent = acc.total_spent.checked_add(item.spent_amount)?;
            acc.total_remaining = acc.total_remaining.checked_add(item.remaining_amount)?;
            Some(acc)
        })
        .ok_or(BudgetError::Overflow("budget summary"))?;
    summary.overall_percentage_used =
        calculate_percentage_used(summary.total_spent, summary.total_budgeted)?;
    Ok(summary)
}
