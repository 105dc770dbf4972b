//! Validation helpers used by generated create/update schemas (feature
//! `validate`).

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

pub fn is_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<regex::Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid built-in email regex"))
        .is_match(s)
}

/// Matches `value` against `pattern`, caching the compiled regex.
///
/// # Panics
/// Panics if `pattern` is not a valid regex — a field declaration bug, not
/// a runtime condition.
pub fn regex_is_match(pattern: &'static str, value: &str) -> bool {
    static CACHE: OnceLock<Mutex<HashMap<&'static str, regex::Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let regex = {
        let mut cache = cache.lock().expect("regex cache poisoned");
        if let Some(re) = cache.get(pattern) {
            re.clone()
        } else {
            let re = regex::Regex::new(pattern).unwrap_or_else(|e| panic!("invalid regex pattern: {pattern:?}: {e}"));
            cache.insert(pattern, re.clone());
            re
        }
    };

    regex.is_match(value)
}

pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// DDL default-literal escaping: only bool/int/str literals are ever
/// emitted, and string literals reject `;` and `--` outright rather than
/// attempting to escape them, since DDL statements can't be parameterized.
pub fn escape_ddl_string_literal(raw: &str) -> crate::error::OrmResult<String> {
    if raw.contains(';') || raw.contains("--") {
        return Err(crate::error::OrmError::configuration(format!(
            "default value '{raw}' contains disallowed characters for a DDL literal"
        )));
    }
    Ok(raw.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_email("a@b.com"));
        assert!(!is_email("not-an-email"));
    }

    #[test]
    fn ddl_literal_rejects_injection_characters() {
        assert!(escape_ddl_string_literal("fine").is_ok());
        assert!(escape_ddl_string_literal("bad; DROP TABLE x").is_err());
        assert!(escape_ddl_string_literal("bad -- comment").is_err());
    }
}
