//! Sparse layer merging over `toml::Table`.

use toml::{Table, Value};

/// Deep-merge `overlay` onto `base`. Tables on both sides recurse; any other
/// collision is won by the overlay. Keys the overlay does not set fall
/// through to the base.
pub(crate) fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, incoming) in overlay {
        match (base.remove(&key), incoming) {
            (Some(Value::Table(lower)), Value::Table(upper)) => {
                base.insert(key, Value::Table(deep_merge(lower, upper)));
            }
            (_, incoming) => {
                base.insert(key, incoming);
            }
        }
    }
    base
}

/// Insert `value` at a dotted key path, creating intermediate tables.
///
/// If an intermediate segment already holds a non-table value it is
/// replaced by a table; dotted paths come from field discovery, where the
/// nesting structure guarantees no such conflicts.
pub(crate) fn set_nested(table: &mut Table, dotted_key: &str, value: Value) {
    let mut segments = dotted_key.split('.').peekable();
    let mut current = table;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let slot = current
            .entry(segment)
            .or_insert_with(|| Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = Value::Table(Table::new());
        }
        current = slot.as_table_mut().expect("slot was just made a table");
    }
}

/// Expand `(dotted key, value)` pairs into one nested table. Later pairs
/// win on collision.
pub(crate) fn pairs_to_table(pairs: &[(String, Value)]) -> Table {
    let mut table = Table::new();
    for (key, value) in pairs {
        set_nested(&mut table, key, value.clone());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(s: &str) -> Table {
        s.parse::<Table>().unwrap()
    }

    #[test]
    fn disjoint_keys_union() {
        let merged = deep_merge(table(r#"host = "a""#), table("port = 1"));
        assert_eq!(merged["host"].as_str().unwrap(), "a");
        assert_eq!(merged["port"].as_integer().unwrap(), 1);
    }

    #[test]
    fn overlay_wins_scalar_collision() {
        let merged = deep_merge(table("port = 8080"), table("port = 3000"));
        assert_eq!(merged["port"].as_integer().unwrap(), 3000);
    }

    #[test]
    fn nested_tables_merge_key_by_key() {
        let base = table("[db]\nurl = \"pg://old\"\npool = 5");
        let overlay = table("[db]\npool = 20");
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["db"]["url"].as_str().unwrap(), "pg://old");
        assert_eq!(merged["db"]["pool"].as_integer().unwrap(), 20);
    }

    #[test]
    fn arrays_replace_rather_than_concatenate() {
        let merged = deep_merge(table("tags = [\"a\", \"b\"]"), table("tags = [\"c\"]"));
        let tags = merged["tags"].as_array().unwrap();
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn empty_overlay_is_identity() {
        let base = table("port = 1");
        assert_eq!(deep_merge(base.clone(), Table::new()), base);
    }

    #[test]
    fn set_nested_flat_key() {
        let mut t = Table::new();
        set_nested(&mut t, "host", Value::String("x".into()));
        assert_eq!(t["host"].as_str().unwrap(), "x");
    }

    #[test]
    fn set_nested_builds_intermediate_tables() {
        let mut t = Table::new();
        set_nested(&mut t, "a.b.c", Value::Integer(42));
        assert_eq!(t["a"]["b"]["c"].as_integer().unwrap(), 42);
    }

    #[test]
    fn set_nested_shares_intermediate_tables() {
        let mut t = Table::new();
        set_nested(&mut t, "db.url", Value::String("pg://".into()));
        set_nested(&mut t, "db.pool", Value::Integer(5));
        let db = t["db"].as_table().unwrap();
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn pairs_to_table_last_wins() {
        let pairs = vec![
            ("port".to_string(), Value::Integer(1)),
            ("port".to_string(), Value::Integer(2)),
        ];
        assert_eq!(pairs_to_table(&pairs)["port"].as_integer().unwrap(), 2);
    }
}
