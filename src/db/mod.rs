mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;
use crate::spending::SpendingSource;

const DATE_FORMAT: &str = "%Y-%m-%d";

const DEFAULT_CATEGORIES: &[&str] = &[
    "Bills & Utilities",
    "Dining",
    "Entertainment",
    "Groceries",
    "Health",
    "Housing",
    "Income",
    "Insurance",
    "Personal Care",
    "Shopping",
    "Subscriptions",
    "Transportation",
    "Travel",
];

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            tracing::debug!(version = schema::CURRENT_VERSION, "creating fresh schema");
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tx.commit()?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .context("Failed to read schema version")?;

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                tracing::debug!(from_version, "applying migration");
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories WHERE user_id IS NULL", [], |row| {
                row.get(0)
            })?;
        if count > 0 {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for name in DEFAULT_CATEGORIES {
            tx.execute(
                "INSERT OR IGNORE INTO categories (user_id, name) VALUES (NULL, ?1)",
                params![name],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO categories (user_id, name) VALUES (?1, ?2)",
                params![cat.user_id, cat.name],
            )
            .with_context(|| format!("Failed to create category '{}'", cat.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Shared categories plus the ones `user_id` owns, ordered by name.
    pub fn get_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name FROM categories
             WHERE user_id IS NULL OR user_id = ?1
             ORDER BY name",
        )?;
        let rows = stmt.query_map(params![user_id], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Case-insensitive lookup; a user's own category wins over a shared one.
    pub fn get_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, user_id, name FROM categories
             WHERE (user_id IS NULL OR user_id = ?1) AND name = ?2 COLLATE NOCASE
             ORDER BY user_id IS NULL
             LIMIT 1",
            params![user_id, name],
            category_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// IDs `user_id` may assign to a transaction.
    pub fn get_valid_category_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM categories WHERE user_id IS NULL OR user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Transactions ──────────────────────────────────────────

    pub fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (user_id, date, description, amount, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                txn.user_id,
                txn.date.format(DATE_FORMAT).to_string(),
                txn.description,
                txn.amount.to_string(),
                txn.category_id,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, user_id = txn.user_id, "inserted transaction");
        Ok(id)
    }

    pub fn get_transaction_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        let result = self.conn.query_row(
            "SELECT id, user_id, date, description, amount, category_id
             FROM transactions WHERE id = ?1",
            params![id],
            transaction_from_row,
        );
        match result {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns false when no transaction with that ID belongs to `user_id`.
    pub fn update_transaction_category(
        &self,
        user_id: i64,
        transaction_id: i64,
        category_id: Option<i64>,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE transactions SET category_id = ?1 WHERE id = ?2 AND user_id = ?3",
            params![category_id, transaction_id, user_id],
        )?;
        tracing::debug!(transaction_id, ?category_id, changed, "updated transaction category");
        Ok(changed == 1)
    }

    pub fn get_transactions_in_range(&self, user_id: i64, range: &MonthRange) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, date, description, amount, category_id
             FROM transactions
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                range.start.format(DATE_FORMAT).to_string(),
                range.end.format(DATE_FORMAT).to_string(),
            ],
            transaction_from_row,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub fn upsert_budget(&self, budget: &Budget) -> Result<()> {
        self.conn.execute(
            "INSERT INTO budgets (user_id, category_id, month, year, planned_amount)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, category_id, month, year) DO UPDATE SET planned_amount = ?5",
            params![
                budget.user_id,
                budget.category_id,
                budget.month,
                budget.year,
                budget.planned_amount.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn delete_budget(&self, user_id: i64, category_id: i64, month: u32, year: i32) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM budgets WHERE user_id = ?1 AND category_id = ?2 AND month = ?3 AND year = ?4",
            params![user_id, category_id, month, year],
        )?;
        Ok(changed == 1)
    }

    /// Planned amounts for one month joined with category names, ordered by name.
    pub fn get_budget_setup(&self, user_id: i64, month: u32, year: i32) -> Result<Vec<BudgetSetupItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.category_id, c.name, b.planned_amount
             FROM budgets b JOIN categories c ON b.category_id = c.id
             WHERE b.user_id = ?1 AND b.month = ?2 AND b.year = ?3
             ORDER BY c.name, b.category_id",
        )?;
        let rows = stmt.query_map(params![user_id, month, year], |row| {
            Ok(BudgetSetupItem {
                category_id: row.get(0)?,
                category_name: row.get(1)?,
                planned_amount: decimal_column(row, 2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl SpendingSource for Database {
    fn transactions_in_range(&self, user_id: i64, range: &MonthRange) -> Result<Vec<Transaction>> {
        self.get_transactions_in_range(user_id, range)
    }
}

// ── Row mapping ───────────────────────────────────────────────

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(2)?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        date,
        description: row.get(3)?,
        amount: decimal_column(row, 4)?,
        category_id: row.get(5)?,
    })
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
