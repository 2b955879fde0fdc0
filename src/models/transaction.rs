use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub user_id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Negative is money out, positive is income or a refund.
    pub amount: Decimal,
    pub category_id: Option<i64>,
}

impl Transaction {
    pub fn new(user_id: i64, date: NaiveDate, description: String, amount: Decimal) -> Self {
        Self {
            id: None,
            user_id,
            date,
            description,
            amount,
            category_id: None,
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_expense(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn is_categorized(&self) -> bool {
        self.category_id.is_some()
    }
}
