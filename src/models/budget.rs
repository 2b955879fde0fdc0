use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Budget {
    pub id: Option<i64>,
    pub user_id: i64,
    pub category_id: i64,
    pub month: u32,
    pub year: i32,
    pub planned_amount: Decimal,
}

impl Budget {
    pub fn new(user_id: i64, category_id: i64, month: u32, year: i32, planned_amount: Decimal) -> Self {
        Self {
            id: None,
            user_id,
            category_id,
            month,
            year,
            planned_amount,
        }
    }
}

/// A planned amount joined with its category name, ready for budget-vs-actual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSetupItem {
    pub category_id: i64,
    pub category_name: String,
    pub planned_amount: Decimal,
}

impl BudgetSetupItem {
    pub fn new(category_id: i64, category_name: impl Into<String>, planned_amount: Decimal) -> Self {
        Self {
            category_id,
            category_name: category_name.into(),
            planned_amount,
        }
    }
}
