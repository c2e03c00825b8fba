//! Record commands: get, set, delete, all, clean and clear.

use litekv_core::{KeyArgs, SetArgs, Store, StoreConfig, Value};
use std::time::Duration;
use tracing::info;

type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Parses a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn key_args(key: &str, id: Option<String>) -> KeyArgs {
    KeyArgs {
        key: key.to_string(),
        id,
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints one record, or `null` when it does not exist.
pub fn get(config: &StoreConfig, table: &str, key: &str, id: Option<String>) -> CmdResult {
    let mut store = Store::open(config.clone())?;
    let record = store.get(table, key_args(key, id))?;
    print_json(&record)
}

/// Writes one record and prints it.
pub fn set(
    config: &StoreConfig,
    table: &str,
    key: &str,
    raw_value: &str,
    id: Option<String>,
    ttl_ms: Option<u64>,
) -> CmdResult {
    let mut store = Store::open(config.clone())?;
    let args = SetArgs {
        key: key.to_string(),
        value: Some(parse_value(raw_value)),
        id,
        ttl: ttl_ms.map(Duration::from_millis),
    };
    let record = store.set(table, args)?;
    print_json(&record)
}

/// Deletes one record.
pub fn delete(config: &StoreConfig, table: &str, key: &str, id: Option<String>) -> CmdResult {
    let mut store = Store::open(config.clone())?;
    if store.delete(table, key_args(key, id))? {
        println!("deleted");
    } else {
        println!("not found");
    }
    Ok(())
}

/// Prints every record in a table.
pub fn all(config: &StoreConfig, table: &str) -> CmdResult {
    let mut store = Store::open(config.clone())?;
    let data = store.all(table)?;
    print_json(&data)
}

/// Removes valueless records from one table or from all of them.
pub fn clean(config: &StoreConfig, table: Option<&str>) -> CmdResult {
    let mut store = Store::open(config.clone())?;
    let removed = match table {
        Some(table) => store.clean(table)?,
        None => store.clean_all()?,
    };
    info!(removed, "clean finished");
    println!("removed {removed} record(s)");
    Ok(())
}

/// Empties one table or all of them.
pub fn clear(config: &StoreConfig, table: Option<&str>) -> CmdResult {
    let mut store = Store::open(config.clone())?;
    let removed = match table {
        Some(table) => store.clear(table)?,
        None => store.clear_all()?,
    };
    info!(removed, "clear finished");
    println!("removed {removed} record(s)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn values_parse_as_json_or_string() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("{\"a\":true}"), json!({"a": true}));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
        assert_eq!(parse_value("plain text"), json!("plain text"));
    }

    #[test]
    fn set_then_delete_through_commands() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new().path(dir.path());

        set(&config, "main", "a", "[1,2]", Some("x".into()), None).unwrap();
        set(&config, "main", "b", "0", None, Some(1_000)).unwrap();

        let mut store = Store::open(config.clone()).unwrap();
        let record = store.get("main", KeyArgs::new("a").id("x")).unwrap().unwrap();
        assert_eq!(record.value, Some(json!([1, 2])));
        drop(store);

        clean(&config, None).unwrap();
        delete(&config, "main", "a", Some("x".into())).unwrap();

        let mut store = Store::open(config).unwrap();
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn unknown_table_is_an_error() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new().path(dir.path());
        assert!(all(&config, "missing").is_err());
        assert!(clear(&config, Some("missing")).is_err());
    }
}
