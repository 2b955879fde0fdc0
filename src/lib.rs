//! Budget-vs-actual and monthly category spending for a personal-finance
//! backend.
//!
//! The engine (`validate`, `spending`, `budget`) is pure and synchronous;
//! `db` and `config` host it behind the `spendwise` CLI.

pub mod budget;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod spending;
pub mod validate;

pub use error::BudgetError;
