mod budget;
mod category;
mod period;
mod transaction;

pub use budget::{Budget, BudgetSetupItem};
pub use category::Category;
pub use period::{days_in_month, is_leap_year, MonthRange};
pub use transaction::Transaction;
