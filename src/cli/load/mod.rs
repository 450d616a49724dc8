//! Load command - imports scraped phone records

use std::path::PathBuf;

use anyhow::Context;

use crate::config::AppConfig;
use crate::infrastructure::database::PhoneLoader;
use crate::infrastructure::logging::init_logging;

pub async fn run(file: PathBuf) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let schema = crate::load_schema(&config)?;
    let pool = crate::connect_database(&config)
        .await?
        .context("load requires a database (set database.url or DATABASE_URL)")?;

    let loader = PhoneLoader::new(pool, schema);
    loader.ensure_table().await?;

    let written = loader.load_file(&file).await?;
    println!("Loaded {} phones from {}", written, file.display());

    Ok(())
}
