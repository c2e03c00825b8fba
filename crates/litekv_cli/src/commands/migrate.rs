//! Migrate command implementation.

use litekv_codec::DataStyle;
use litekv_core::{Store, StoreConfig};
use litekv_storage::{FileBackend, StorageBackend};
use tracing::info;

/// Converts every configured table to `to` and returns the tables whose
/// stored style changed.
pub fn migrate(mut config: StoreConfig, to: DataStyle) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    config.normalize();
    let backend = FileBackend::new(&config.path);
    let mut converted = Vec::new();
    for table in &config.tables {
        if let Some(data) = backend.load_table(table)? {
            if data.style() != to {
                converted.push(table.clone());
            }
        }
    }

    info!(path = ?config.path, %to, "migrating store");
    let mut store = Store::open(config.data_style(to))?;
    store.connect()?;
    Ok(converted)
}

/// Runs the migrate command.
pub fn run(config: StoreConfig, to: DataStyle) -> Result<(), Box<dyn std::error::Error>> {
    let converted = migrate(config, to)?;
    if converted.is_empty() {
        println!("All tables already use {to}");
    } else {
        for table in &converted {
            println!("  {table}: converted to {to}");
        }
    }
    Ok(())
}
