use rust_decimal::Decimal;

/// Signed dollar amount with thousands separators, e.g. `-$1,234.50`.
pub(crate) fn format_amount(val: Decimal) -> String {
    let rounded = val.round_dp(2);
    let formatted = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if rounded < Decimal::ZERO {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

pub(crate) fn format_percent(val: Decimal) -> String {
    format!("{:.1}%", val.round_dp(1))
}

/// Cut to `max` characters, marking the cut with "…".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max - 1).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0)), "$0.00");
        assert_eq!(format_amount(dec!(5.5)), "$5.50");
        assert_eq!(format_amount(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_amount(dec!(-425)), "-$425.00");
    }

    #[test]
    fn test_format_amount_rounds_before_sign() {
        assert_eq!(format_amount(dec!(-0.004)), "$0.00");
        assert_eq!(format_amount(dec!(-0.006)), "-$0.01");
        assert_eq!(format_amount(dec!(-1234.499)), "-$1,234.50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(83.33333)), "83.3%");
        assert_eq!(format_percent(dec!(116.66666)), "116.7%");
        assert_eq!(format_percent(Decimal::ZERO), "0.0%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Groceries", 20), "Groceries");
        assert_eq!(truncate("Bills & Utilities", 8), "Bills &…");
        assert_eq!(truncate("café résumé", 5), "café…");
        assert_eq!(truncate("hello", 0), "");
    }
}
