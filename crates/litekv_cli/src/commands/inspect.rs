//! Inspect command implementation.

use litekv_core::StoreConfig;
use litekv_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::fs;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Configured data style.
    pub style: String,
    /// Encryption mode, or `off`.
    pub encryption: String,
    /// Record limit.
    pub limit: usize,
    /// Records across all tables.
    pub total_records: usize,
    /// Bytes across all table files.
    pub total_size: u64,
    /// Per-table statistics.
    pub tables: Vec<TableStats>,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table name.
    pub name: String,
    /// Whether the table file exists.
    pub exists: bool,
    /// Style of the stored document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_style: Option<String>,
    /// Number of records.
    pub records: usize,
    /// File size in bytes.
    pub file_size: u64,
}

/// Collects statistics without opening a store, so nothing is created or
/// converted.
pub fn inspect(config: &StoreConfig) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !config.path.exists() {
        return Err(format!("No store found at {:?}", config.path).into());
    }

    let mut config = config.clone();
    config.normalize();
    let backend = FileBackend::new(&config.path);

    let mut tables = Vec::with_capacity(config.tables.len());
    for name in &config.tables {
        let path = backend.table_path(name);
        let exists = backend.table_exists(name)?;
        let file_size = if exists { fs::metadata(&path)?.len() } else { 0 };
        let data = backend.load_table(name)?;
        tables.push(TableStats {
            name: name.clone(),
            exists,
            stored_style: data.as_ref().map(|d| d.style().to_string()),
            records: data.as_ref().map_or(0, |d| d.len()),
            file_size,
        });
    }

    Ok(InspectResult {
        path: config.path.display().to_string(),
        style: config.data_style.to_string(),
        encryption: if config.encryption.enabled {
            config.encryption.mode.as_str().to_string()
        } else {
            "off".to_string()
        },
        limit: config.limit,
        total_records: tables.iter().map(|t| t.records).sum(),
        total_size: tables.iter().map(|t| t.file_size).sum(),
        tables,
    })
}

/// Runs the inspect command.
pub fn run(config: &StoreConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(config)?;
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("litekv Store Inspection");
    println!("=======================");
    println!();
    println!("Path:       {}", result.path);
    println!("Style:      {}", result.style);
    println!("Encryption: {}", result.encryption);
    println!();
    println!(
        "Records: {} of {} ({})",
        result.total_records,
        result.limit,
        format_size(result.total_size)
    );
    println!();
    println!("Tables:");
    for table in &result.tables {
        if !table.exists {
            println!("  {:<16} (missing)", table.name);
            continue;
        }
        let style = table.stored_style.as_deref().unwrap_or("empty");
        println!(
            "  {:<16} {} records, {}, {}",
            table.name,
            table.records,
            style,
            format_size(table.file_size)
        );
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
