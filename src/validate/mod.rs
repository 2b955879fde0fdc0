use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BudgetError;

/// Outcome of checking a proposed category reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoryValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(err: &BudgetError) -> Self {
        Self {
            valid: false,
            error: Some(err.to_string()),
        }
    }
}

/// Check a raw category ID (as received in a request body) against the IDs
/// the user may assign.
pub fn validate_category_update(category_id: &Value, valid_category_ids: &[i64]) -> CategoryValidation {
    match check_category_id(category_id, valid_category_ids) {
        Ok(_) => CategoryValidation::ok(),
        Err(e) => {
            tracing::warn!(category_id = %category_id, "rejected category update: {e}");
            CategoryValidation::rejected(&e)
        }
    }
}

/// Same checks as [`validate_category_update`], returning the accepted ID.
pub fn check_category_id(category_id: &Value, valid_category_ids: &[i64]) -> Result<i64, BudgetError> {
    let id = positive_integer(category_id).ok_or(BudgetError::InvalidCategoryId)?;
    if !valid_category_ids.contains(&id) {
        return Err(BudgetError::CategoryNotAccessible(id));
    }
    Ok(id)
}

fn positive_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    let id = match n.as_i64() {
        Some(i) => i,
        None => {
            // 5.0 is an integer, 5.5 is not
            let f = n.as_f64()?;
            if f.fract() != 0.0 || f < 1.0 || f > i64::MAX as f64 {
                return None;
            }
            f as i64
        }
    };
    (id >= 1).then_some(id)
}
