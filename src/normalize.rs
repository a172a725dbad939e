//! Key normalization: dotted qualified names to flag names and env var names.

/// Derive a flag name from a dotted qualified key.
///
/// Word boundaries get a `-` inserted: a lowercase→uppercase transition
/// (`RequestLog` → `request-log`) and an acronym boundary, i.e. an uppercase
/// letter followed by uppercase-then-lowercase (`HTTPServer` → `http-server`).
/// Path separators (`.`) and underscores both become `-`, and the result is
/// lowercased.
///
/// This is the default; callers can swap in their own function via
/// [`flag_name_fn`](crate::MedleyBuilder::flag_name_fn).
pub fn flag_name(qualified: &str) -> String {
    let chars: Vec<char> = qualified.chars().collect();
    let mut out = String::with_capacity(qualified.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '.' || c == '_' {
            out.push('-');
            continue;
        }
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let acronym_end = prev.is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || acronym_end {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Derive the environment variable candidate for a qualified key.
///
/// `.` and `-` become `_`, the whole name is uppercased, and the prefix (if
/// any) is prepended with a `_` joint: `env_key(Some("myapp"),
/// "database.pool_size")` → `MYAPP_DATABASE_POOL_SIZE`.
pub fn env_key(prefix: Option<&str>, qualified: &str) -> String {
    let key: String = qualified
        .chars()
        .map(|c| if c == '.' || c == '-' { '_' } else { c })
        .collect::<String>()
        .to_uppercase();

    match prefix {
        Some(p) if !p.is_empty() => format!("{}_{key}", p.to_uppercase()),
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_splits() {
        assert_eq!(flag_name("RequestLogFile"), "request-log-file");
    }

    #[test]
    fn dotted_path_becomes_hyphenated() {
        assert_eq!(flag_name("API.Endpoint"), "api-endpoint");
    }

    #[test]
    fn acronym_boundary_splits() {
        assert_eq!(flag_name("HTTPServer"), "http-server");
    }

    #[test]
    fn underscores_become_hyphens() {
        assert_eq!(flag_name("pool_size"), "pool-size");
    }

    #[test]
    fn already_lower_is_untouched() {
        assert_eq!(flag_name("host"), "host");
    }

    #[test]
    fn nested_snake_case_path() {
        assert_eq!(flag_name("database.pool_size"), "database-pool-size");
    }

    #[test]
    fn all_caps_has_no_internal_split() {
        assert_eq!(flag_name("HTTP"), "http");
    }

    #[test]
    fn env_key_without_prefix() {
        assert_eq!(env_key(None, "database.url"), "DATABASE_URL");
    }

    #[test]
    fn env_key_with_prefix() {
        assert_eq!(
            env_key(Some("myapp"), "database.pool_size"),
            "MYAPP_DATABASE_POOL_SIZE"
        );
    }

    #[test]
    fn env_key_replaces_hyphens() {
        assert_eq!(env_key(None, "request-log"), "REQUEST_LOG");
    }

    #[test]
    fn env_key_empty_prefix_ignored() {
        assert_eq!(env_key(Some(""), "host"), "HOST");
    }
}
