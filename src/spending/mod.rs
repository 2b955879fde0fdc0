use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BudgetError;
use crate::models::{MonthRange, Transaction};

/// Anything that can hand over a user's transactions for one month.
pub trait SpendingSource {
    fn transactions_in_range(&self, user_id: i64, range: &MonthRange) -> Result<Vec<Transaction>>;
}

impl SpendingSource for [Transaction] {
    fn transactions_in_range(&self, user_id: i64, range: &MonthRange) -> Result<Vec<Transaction>> {
        Ok(self
            .iter()
            .filter(|t| t.user_id == user_id && range.contains(t.date))
            .cloned()
            .collect())
    }
}

impl SpendingSource for Vec<Transaction> {
    fn transactions_in_range(&self, user_id: i64, range: &MonthRange) -> Result<Vec<Transaction>> {
        self.as_slice().transactions_in_range(user_id, range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingRequest {
    pub user_id: i64,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpendingResult {
    pub category_id: i64,
    /// Signed sum of the category's transaction amounts.
    pub total_spent: Decimal,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingAggregationResponse {
    pub month: u32,
    pub year: i32,
    /// Ordered by ascending category ID.
    pub spending_by_category: Vec<CategorySpendingResult>,
    pub total_spending: Decimal,
    pub total_transaction_count: u64,
}

impl SpendingAggregationResponse {
    /// Per-category results keyed by category ID.
    pub fn by_category(&self) -> HashMap<i64, CategorySpendingResult> {
        self.spending_by_category
            .iter()
            .map(|r| (r.category_id, r.clone()))
            .collect()
    }
}

/// Aggregate a user's categorized spending for one calendar month.
pub fn aggregate_monthly_spending<S>(
    source: &S,
    request: &SpendingRequest,
) -> Result<SpendingAggregationResponse, BudgetError>
where
    S: SpendingSource + ?Sized,
{
    let range = MonthRange::new(request.month, request.year)?;
    let transactions = source.transactions_in_range(request.user_id, &range)?;
    tracing::debug!(
        user_id = request.user_id,
        period = %range,
        fetched = transactions.len(),
        "aggregating monthly spending"
    );
    summarize_spending(request.month, request.year, &transactions)
}

/// Group already-filtered transactions by category.
///
/// Uncategorized transactions are left out of every figure, totals included.
pub fn summarize_spending(
    month: u32,
    year: i32,
    transactions: &[Transaction],
) -> Result<SpendingAggregationResponse, BudgetError> {
    let mut groups: BTreeMap<i64, CategorySpendingResult> = BTreeMap::new();
    let mut uncategorized = 0usize;

    for txn in transactions {
        let Some(category_id) = txn.category_id else {
            uncategorized += 1;
            continue;
        };
        let entry = groups.entry(category_id).or_insert_with(|| CategorySpendingResult {
            category_id,
            total_spent: Decimal::ZERO,
            transaction_count: 0,
        });
        entry.total_spent = entry
            .total_spent
            .checked_add(txn.amount)
            .ok_or(BudgetError::Overflow("category spending"))?;
        entry.transaction_count += 1;
    }

    if uncategorized > 0 {
        tracing::debug!(uncategorized, "skipped transactions without a category");
    }

    let spending_by_category: Vec<CategorySpendingResult> = groups.into_values().collect();
    let total_spending = spending_by_category
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.total_spent))
        .ok_or(BudgetError::Overflow("total spending"))?;
    let total_transaction_count = spending_by_category.iter().map(|r| r.transaction_count).sum();

    Ok(SpendingAggregationResponse {
        month,
        year,
        spending_by_category,
        total_spending,
        total_transaction_count,
    })
}
