mod run;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use spendwise::config::Config;
use spendwise::db::Database;

fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let args: Vec<String> = std::env::args().collect();
    config.ensure_data_dir()?;
    tracing::debug!(db = %config.db_path.display(), "opening database");
    let db = Database::open(&config.db_path)?;

    run::as_cli(&args, &db, &config)
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
