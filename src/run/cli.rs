use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use spendwise::budget::{budget_page, BudgetPageResponse};
use spendwise::config::{parse_user_id, Config};
use spendwise::db::Database;
use spendwise::models::{Budget, Category, MonthRange, Transaction};
use spendwise::spending::{aggregate_monthly_spending, SpendingAggregationResponse, SpendingRequest};
use spendwise::validate::{check_category_id, CategoryValidation};
use spendwise::BudgetError;

use super::format::{format_amount, format_percent, truncate};

pub(crate) fn as_cli(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };
    let rest = &args[2..];
    match command.as_str() {
        "budget" | "b" => cli_budget(rest, db, config),
        "spending" | "s" => cli_spending(rest, db, config),
        "set-budget" => cli_set_budget(rest, db, config),
        "clear-budget" => cli_clear_budget(rest, db, config),
        "add" => cli_add(rest, db, config),
        "set-category" => cli_set_category(rest, db, config),
        "categories" => cli_categories(rest, db, config),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendwise {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Spendwise — monthly budgets and category spending");
    println!();
    println!("Usage: spendwise <command> [--user <id>]");
    println!();
    println!("Commands:");
    println!("  budget [YYYY-MM] [--json]              Budget vs. actual for a month (default: current)");
    println!("  spending [YYYY-MM] [--json]            Spending per category for a month");
    println!("  set-budget <category> <amount> [YYYY-MM]");
    println!("                                         Set the planned amount for a category");
    println!("  clear-budget <category> [YYYY-MM]      Remove a category's budget for a month");
    println!("  add <YYYY-MM-DD> <amount> <description> [--category <name|id>]");
    println!("                                         Record a transaction (negative = expense)");
    println!("  set-category <transaction-id> <category-id>");
    println!("                                         Reassign a transaction's category");
    println!("  categories                             List categories available to the user");
    println!("  --help, -h                             Show this help");
    println!("  --version, -V                          Show version");
    println!();
    println!("Environment: SPENDWISE_DB, SPENDWISE_USER, SPENDWISE_LOG");
}

// ── Argument parsing ─────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct Options<'a> {
    positional: Vec<&'a str>,
    user: Option<&'a str>,
    category: Option<&'a str>,
    json: bool,
}

impl Options<'_> {
    fn user_id(&self, config: &Config) -> Result<i64> {
        match self.user {
            Some(raw) => parse_user_id(raw),
            None => Ok(config.default_user),
        }
    }
}

/// Split flags from positional arguments. A single leading dash is kept as a
/// positional so negative amounts pass through.
fn parse_options(args: &[String]) -> Result<Options<'_>> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => opts.json = true,
            "--user" | "--category" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{arg} needs a value"))?;
                if arg == "--user" {
                    opts.user = Some(value.as_str());
                } else {
                    opts.category = Some(value.as_str());
                }
            }
            flag if flag.starts_with("--") => anyhow::bail!("Unknown option: {flag}"),
            other => opts.positional.push(other),
        }
    }
    Ok(opts)
}

/// `YYYY-MM`, or the current month when absent.
fn parse_period(arg: Option<&str>) -> Result<MonthRange> {
    let (year, month) = match arg {
        Some(s) => {
            let (y, m) = s
                .split_once('-')
                .ok_or_else(|| anyhow::anyhow!("Expected a month as YYYY-MM, got '{s}'"))?;
            let year: i32 = y.parse().with_context(|| format!("Invalid year in '{s}'"))?;
            let month: u32 = m.parse().with_context(|| format!("Invalid month in '{s}'"))?;
            (year, month)
        }
        None => {
            let today = chrono::Local::now().date_naive();
            (today.year(), today.month())
        }
    };
    Ok(MonthRange::new(month, year)?)
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().replace(['$', ','], "");
    Decimal::from_str(&cleaned).with_context(|| format!("Invalid amount: {raw}"))
}

/// Resolve a category given by ID or name to an ID the user may use.
fn resolve_category(db: &Database, user_id: i64, raw: &str) -> Result<i64> {
    if let Ok(id) = raw.parse::<i64>() {
        let valid = db.get_valid_category_ids(user_id)?;
        return Ok(check_category_id(&Value::from(id), &valid)?);
    }
    db.get_category_by_name(user_id, raw)?
        .and_then(|c| c.id)
        .ok_or_else(|| anyhow::anyhow!("Category '{raw}' not found"))
}

// ── Commands ─────────────────────────────────────────────────

fn cli_budget(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let opts = parse_options(args)?;
    let user_id = opts.user_id(config)?;
    let period = parse_period(opts.positional.first().copied())?;
    let page = load_budget_page(db, user_id, &period)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_budget_page(&period, &page);
    }
    Ok(())
}

fn load_budget_page(db: &Database, user_id: i64, period: &MonthRange) -> Result<BudgetPageResponse> {
    let budgets = db.get_budget_setup(user_id, period.month(), period.year())?;
    let request = SpendingRequest {
        user_id,
        month: period.month(),
        year: period.year(),
    };
    Ok(budget_page(db, &budgets, &request)?)
}

fn print_budget_page(period: &MonthRange, page: &BudgetPageResponse) {
    println!("Budget — {period}");
    println!("{}", "─".repeat(72));
    if page.category_budgets.is_empty() {
        println!("  No budgets set. Use: spendwise set-budget <category> <amount> {period}");
        return;
    }
    println!(
        "  {:<22} {:>12} {:>12} {:>12} {:>8}",
        "Category", "Budgeted", "Spent", "Remaining", "Used"
    );
    for item in &page.category_budgets {
        println!(
            "  {:<22} {:>12} {:>12} {:>12} {:>8}",
            truncate(&item.category_name, 22),
            format_amount(item.budgeted_amount),
            format_amount(item.spent_amount),
            format_amount(item.remaining_amount),
            format_percent(item.percentage_used),
        );
    }
    let summary = &page.summary;
    println!("{}", "─".repeat(72));
    println!(
        "  {:<22} {:>12} {:>12} {:>12} {:>8}",
        "Total",
        format_amount(summary.total_budgeted),
        format_amount(summary.total_spent),
        format_amount(summary.total_remaining),
        format_percent(summary.overall_percentage_used),
    );
}

fn cli_spending(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let opts = parse_options(args)?;
    let user_id = opts.user_id(config)?;
    let period = parse_period(opts.positional.first().copied())?;

    let request = SpendingRequest {
        user_id,
        month: period.month(),
        year: period.year(),
    };
    let spending = aggregate_monthly_spending(db, &request)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&spending)?);
    } else {
        let categories = db.get_categories(user_id)?;
        print_spending(&period, &spending, &categories);
    }
    Ok(())
}

fn print_spending(period: &MonthRange, spending: &SpendingAggregationResponse, categories: &[Category]) {
    println!("Spending — {period}");
    println!("{}", "─".repeat(50));
    if spending.spending_by_category.is_empty() {
        println!("  No categorized transactions");
        return;
    }
    for result in &spending.spending_by_category {
        let name = Category::find_by_id(categories, result.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("Unknown");
        println!(
            "  {:<24} {:>12} {:>5} txns",
            truncate(name, 24),
            format_amount(result.total_spent),
            result.transaction_count,
        );
    }
    println!("{}", "─".repeat(50));
    println!(
        "  {:<24} {:>12} {:>5} txns",
        "Total",
        format_amount(spending.total_spending),
        spending.total_transaction_count,
    );
}

fn cli_set_budget(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let opts = parse_options(args)?;
    let user_id = opts.user_id(config)?;
    let (category_raw, amount_raw) = match opts.positional[..] {
        [c, a] | [c, a, _] => (c, a),
        _ => anyhow::bail!("Usage: spendwise set-budget <category> <amount> [YYYY-MM]"),
    };
    let period = parse_period(opts.positional.get(2).copied())?;

    let amount = parse_amount(amount_raw)?;
    if amount < Decimal::ZERO {
        anyhow::bail!("Budget amount must be non-negative, got {amount}");
    }
    let category_id = resolve_category(db, user_id, category_raw)?;

    db.upsert_budget(&Budget::new(
        user_id,
        category_id,
        period.month(),
        period.year(),
        amount,
    ))?;
    println!("Budget for {category_raw} in {period} set to {}", format_amount(amount));
    Ok(())
}

fn cli_clear_budget(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let opts = parse_options(args)?;
    let user_id = opts.user_id(config)?;
    let category_raw = match opts.positional[..] {
        [c] | [c, _] => c,
        _ => anyhow::bail!("Usage: spendwise clear-budget <category> [YYYY-MM]"),
    };
    let period = parse_period(opts.positional.get(1).copied())?;
    let category_id = resolve_category(db, user_id, category_raw)?;

    if !db.delete_budget(user_id, category_id, period.month(), period.year())? {
        anyhow::bail!("No budget for {category_raw} in {period}");
    }
    println!("Budget for {category_raw} in {period} removed");
    Ok(())
}

fn cli_add(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let opts = parse_options(args)?;
    let user_id = opts.user_id(config)?;
    let [date_raw, amount_raw, description @ ..] = &opts.positional[..] else {
        anyhow::bail!(
            "Usage: spendwise add <YYYY-MM-DD> <amount> <description> [--category <name|id>]"
        );
    };
    if description.is_empty() {
        anyhow::bail!("A description is required");
    }

    let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{date_raw}', expected YYYY-MM-DD"))?;
    let amount = parse_amount(amount_raw)?;
    let mut txn = Transaction::new(user_id, date, description.join(" "), amount);
    if let Some(raw) = opts.category {
        txn = txn.with_category(resolve_category(db, user_id, raw)?);
    }

    let id = db.insert_transaction(&txn)?;
    let kind = if txn.is_income() {
        "income"
    } else if txn.is_expense() {
        "expense"
    } else {
        "transaction"
    };
    let note = if txn.is_categorized() { "" } else { " (uncategorized)" };
    println!("Added {kind} {id}: {} {}{note}", txn.description, format_amount(amount));
    Ok(())
}

fn cli_set_category(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let opts = parse_options(args)?;
    let user_id = opts.user_id(config)?;
    let [txn_raw, category_raw] = opts.positional[..] else {
        anyhow::bail!("Usage: spendwise set-category <transaction-id> <category-id>");
    };
    let transaction_id: i64 = txn_raw
        .parse()
        .with_context(|| format!("Invalid transaction ID: {txn_raw}"))?;

    match assign_category(db, user_id, transaction_id, category_raw) {
        Ok((previous, category_id)) => {
            let from = previous.map_or("uncategorized".to_string(), |id| format!("category {id}"));
            println!("Transaction {transaction_id} moved from {from} to category {category_id}");
            Ok(())
        }
        Err(e) => {
            if let Some(body) = rejection_json(&e)? {
                println!("{body}");
            }
            Err(e)
        }
    }
}

/// Validate `category_raw` and move one of the user's transactions to it.
/// Returns the previous and new category IDs.
fn assign_category(
    db: &Database,
    user_id: i64,
    transaction_id: i64,
    category_raw: &str,
) -> Result<(Option<i64>, i64)> {
    // Pass the argument through as JSON so "5.5" or "abc" are rejected like a request body would be
    let raw: Value =
        serde_json::from_str(category_raw).unwrap_or_else(|_| Value::String(category_raw.to_string()));
    let valid_ids = db.get_valid_category_ids(user_id)?;
    let category_id = check_category_id(&raw, &valid_ids)?;

    let Some(txn) = db
        .get_transaction_by_id(transaction_id)?
        .filter(|t| t.user_id == user_id)
    else {
        anyhow::bail!("Transaction {transaction_id} not found");
    };
    if !db.update_transaction_category(user_id, transaction_id, Some(category_id))? {
        anyhow::bail!("Transaction {transaction_id} not found");
    }
    Ok((txn.category_id, category_id))
}

/// The `{"valid":false,"error":...}` body for a validation failure, if `err` is one.
fn rejection_json(err: &anyhow::Error) -> Result<Option<String>> {
    match err.downcast_ref::<BudgetError>() {
        Some(e) if e.is_validation() => Ok(Some(serde_json::to_string(&CategoryValidation::rejected(e))?)),
        _ => Ok(None),
    }
}

fn cli_categories(args: &[String], db: &Database, config: &Config) -> Result<()> {
    let opts = parse_options(args)?;
    let user_id = opts.user_id(config)?;
    let categories = db.get_categories(user_id)?;

    println!("{:<6} {:<24} Scope", "ID", "Name");
    println!("{}", "─".repeat(40));
    for cat in &categories {
        println!(
            "{:<6} {:<24} {}",
            cat.id.unwrap_or(0),
            truncate(&cat.name, 24),
            if cat.is_shared() { "shared" } else { "own" },
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> Config {
        Config {
            db_path: PathBuf::new(),
            log_filter: "warn".into(),
            default_user: 1,
        }
    }

    fn add_txn(db: &Database, user_id: i64, day: u32, amount: Decimal, category_id: Option<i64>) -> i64 {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let mut txn = Transaction::new(user_id, date, "Market".into(), amount);
        txn.category_id = category_id;
        db.insert_transaction(&txn).unwrap()
    }

    fn category_id(db: &Database, name: &str) -> i64 {
        db.get_category_by_name(1, name).unwrap().unwrap().id.unwrap()
    }

    #[test]
    fn test_parse_options() {
        let args = strings(&["2024-03", "--user", "4", "--json"]);
        let opts = parse_options(&args).unwrap();
        assert_eq!(opts.positional, vec!["2024-03"]);
        assert_eq!(opts.user, Some("4"));
        assert!(opts.json);
    }

    #[test]
    fn test_parse_options_keeps_negative_amounts() {
        let args = strings(&["2024-03-02", "-42.50", "Market", "--category", "Groceries"]);
        let opts = parse_options(&args).unwrap();
        assert_eq!(opts.positional, vec!["2024-03-02", "-42.50", "Market"]);
        assert_eq!(opts.category, Some("Groceries"));
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(parse_options(&strings(&["--user"])).is_err());
        assert!(parse_options(&strings(&["--bogus"])).is_err());
    }

    #[test]
    fn test_parse_period() {
        let range = parse_period(Some("2024-02")).unwrap();
        assert_eq!(range.month(), 2);
        assert_eq!(range.year(), 2024);
        assert!(parse_period(Some("2024-13")).is_err());
        assert!(parse_period(Some("March")).is_err());
        assert!(parse_period(None).is_ok());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,250.00").unwrap(), dec!(1250.00));
        assert_eq!(parse_amount("-42.5").unwrap(), dec!(-42.5));
        assert!(parse_amount("ten").is_err());
    }

    #[test]
    fn test_resolve_category() {
        let db = Database::open_in_memory().unwrap();
        let by_name = resolve_category(&db, 1, "groceries").unwrap();
        assert_eq!(resolve_category(&db, 1, &by_name.to_string()).unwrap(), by_name);
        assert!(resolve_category(&db, 1, "99999").is_err());
        assert!(resolve_category(&db, 1, "Nope").is_err());
    }

    // ── set-category ─────────────────────────────────────────

    #[test]
    fn test_set_category_moves_transaction() {
        let db = Database::open_in_memory().unwrap();
        let dining = category_id(&db, "Dining");
        let id = add_txn(&db, 1, 2, dec!(-42), None);
        let id_arg = id.to_string();
        let dining_arg = dining.to_string();

        cli_set_category(&strings(&[id_arg.as_str(), dining_arg.as_str()]), &db, &config()).unwrap();
        assert_eq!(db.get_transaction_by_id(id).unwrap().unwrap().category_id, Some(dining));
        assert_eq!(assign_category(&db, 1, id, &dining_arg).unwrap(), (Some(dining), dining));
    }

    #[test]
    fn test_set_category_rejects_non_numeric() {
        let db = Database::open_in_memory().unwrap();
        let id = add_txn(&db, 1, 2, dec!(-42), None);
        let id_arg = id.to_string();

        let err = cli_set_category(&strings(&[id_arg.as_str(), "abc"]), &db, &config()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BudgetError>(),
            Some(BudgetError::InvalidCategoryId)
        ));
        assert_eq!(
            rejection_json(&err).unwrap().unwrap(),
            r#"{"valid":false,"error":"Category ID must be a positive integer"}"#
        );
        assert_eq!(db.get_transaction_by_id(id).unwrap().unwrap().category_id, None);
    }

    #[test]
    fn test_set_category_rejects_other_users_category() {
        let db = Database::open_in_memory().unwrap();
        let private = db.insert_category(&Category::owned_by("Hobby".into(), 2)).unwrap();
        let id = add_txn(&db, 1, 2, dec!(-42), None);

        let err = assign_category(&db, 1, id, &private.to_string()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BudgetError>(),
            Some(BudgetError::CategoryNotAccessible(c)) if *c == private
        ));
        assert_eq!(
            rejection_json(&err).unwrap().unwrap(),
            format!(r#"{{"valid":false,"error":"Category {private} does not exist or is not accessible"}}"#)
        );
    }

    #[test]
    fn test_set_category_other_users_transaction_not_found() {
        let db = Database::open_in_memory().unwrap();
        let groceries = category_id(&db, "Groceries");
        let dining = category_id(&db, "Dining");
        let id = add_txn(&db, 2, 2, dec!(-42), Some(groceries));

        let err = assign_category(&db, 1, id, &dining.to_string()).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(rejection_json(&err).unwrap().is_none());
        assert_eq!(db.get_transaction_by_id(id).unwrap().unwrap().category_id, Some(groceries));

        assert!(assign_category(&db, 1, 99_999, &dining.to_string()).is_err());
    }

    // ── budget ───────────────────────────────────────────────

    #[test]
    fn test_budget_page_follows_setup_order() {
        let db = Database::open_in_memory().unwrap();
        let period = MonthRange::new(3, 2024).unwrap();
        for (name, amount) in [("Travel", dec!(50)), ("Groceries", dec!(300)), ("Dining", dec!(150))] {
            let id = category_id(&db, name);
            db.upsert_budget(&Budget::new(1, id, 3, 2024, amount)).unwrap();
        }
        add_txn(&db, 1, 4, dec!(-120), Some(category_id(&db, "Groceries")));
        add_txn(&db, 1, 9, dec!(-80), Some(category_id(&db, "Dining")));
        add_txn(&db, 2, 9, dec!(-999), Some(category_id(&db, "Dining")));

        let page = load_budget_page(&db, 1, &period).unwrap();
        let names: Vec<&str> = page.category_budgets.iter().map(|i| i.category_name.as_str()).collect();
        assert_eq!(names, vec!["Dining", "Groceries", "Travel"]);

        let setup = db.get_budget_setup(1, 3, 2024).unwrap();
        let ids: Vec<i64> = page.category_budgets.iter().map(|i| i.category_id).collect();
        assert_eq!(ids, setup.iter().map(|b| b.category_id).collect::<Vec<_>>());

        assert_eq!(page.category_budgets[0].spent_amount, dec!(-80));
        assert_eq!(page.category_budgets[2].spent_amount, Decimal::ZERO);
        assert_eq!(page.summary.total_budgeted, dec!(500));
        assert_eq!(page.summary.total_spent, dec!(-200));

        cli_budget(&strings(&["2024-03", "--json"]), &db, &config()).unwrap();
    }

    #[test]
    fn test_clear_budget() {
        let db = Database::open_in_memory().unwrap();
        let groceries = category_id(&db, "Groceries");
        db.upsert_budget(&Budget::new(1, groceries, 3, 2024, dec!(300))).unwrap();

        cli_clear_budget(&strings(&["Groceries", "2024-03"]), &db, &config()).unwrap();
        assert!(db.get_budget_setup(1, 3, 2024).unwrap().is_empty());
        assert!(cli_clear_budget(&strings(&["Groceries", "2024-03"]), &db, &config()).is_err());
        assert!(cli_clear_budget(&strings(&[]), &db, &config()).is_err());
    }
}
