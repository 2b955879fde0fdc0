mod calculator;
mod page;

pub use calculator::{
    build_category_budget_items, calculate_budget_summary, calculate_category_remaining,
    calculate_percentage_used, BudgetSummary, CategoryBudgetItem,
};
pub use page::{compose_budget_page_response, BudgetPageResponse};

use crate::error::BudgetError;
use crate::models::BudgetSetupItem;
use crate::spending::{aggregate_monthly_spending, SpendingRequest, SpendingSource};

/// Budget-vs-actual page for one user and month: aggregate spending from
/// `source`, match it against `budgets`, and roll up the summary.
pub fn budget_page<S>(
    source: &S,
    budgets: &[BudgetSetupItem],
    request: &SpendingRequest,
) -> Result<BudgetPageResponse, BudgetError>
where
    S: SpendingSource + ?Sized,
{
    let spending = aggregate_monthly_spending(source, request)?;
    let items = build_category_budget_items(budgets, &spending.by_category())?;
    tracing::debug!(
        user_id = request.user_id,
        budgets = budgets.len(),
        categories_with_spend = spending.spending_by_category.len(),
        "built budget page"
    );
    compose_budget_page_response(request.month, request.year, items)
}
