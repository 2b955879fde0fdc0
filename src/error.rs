use thiserror::Error;

/// Failures surfaced by the budget and spending engine.
///
/// Validation variants describe bad caller input and map to a 400-class
/// response; `Source` wraps a failure of whatever supplied the transactions.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("Year {0} is outside the supported calendar range")]
    InvalidYear(i32),
    #[error("Category ID must be a positive integer")]
    InvalidCategoryId,
    #[error("Category {0} does not exist or is not accessible")]
    CategoryNotAccessible(i64),
    #[error("Amount too large while computing {0}")]
    Overflow(&'static str),
    #[error("Transaction source failed: {0}")]
    Source(#[from] anyhow::Error),
}

impl BudgetError {
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Source(_))
    }
}
