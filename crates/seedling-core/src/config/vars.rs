//! Environment variable interpolation for config files.
//!
//! Supported forms:
//! - `$VAR` or `${VAR}` - substitute with env var value, error if missing
//! - `${VAR:-default}` - use default if VAR is unset OR empty
//! - `${VAR-default}` - use default only if VAR is unset (empty is OK)
//! - `$$` - literal `$`

use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

use crate::error::ConfigError;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \$\$                           # escaped dollar
        |
        \$\{
            ([A-Za-z_][A-Za-z0-9_]*)   # 1: braced name
            (?:
                (:?-)                  # 2: default operator
                ([^}]*)                # 3: default value
            )?
        \}
        |
        \$([A-Za-z_][A-Za-z0-9_]*)     # 4: bare name
        ",
    )
    .expect("env var pattern is a valid regex")
});

/// Substitute environment variables in `input`.
///
/// Every unresolvable reference is collected so that a single error lists all
/// of them.
pub fn interpolate(input: &str) -> Result<String, ConfigError> {
    let mut errors = Vec::new();

    let text = ENV_VAR_PATTERN
        .replace_all(input, |caps: &Captures| match resolve(caps) {
            Ok(value) => value,
            Err(message) => {
                errors.push(message);
                caps[0].to_string()
            }
        })
        .into_owned();

    if errors.is_empty() {
        Ok(text)
    } else {
        Err(ConfigError::EnvInterpolation {
            message: errors.join("\n"),
        })
    }
}

fn resolve(caps: &Captures) -> Result<String, String> {
    if &caps[0] == "$$" {
        return Ok("$".to_string());
    }

    let name = caps
        .get(1)
        .or_else(|| caps.get(4))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let operator = caps.get(2).map(|m| m.as_str());
    let default = caps.get(3).map(|m| m.as_str());

    match env::var(name) {
        Ok(value) if value.contains('\n') || value.contains('\r') => Err(format!(
            "environment variable '{name}' contains newlines, which is not allowed"
        )),
        Ok(value) if value.is_empty() && operator == Some(":-") => {
            Ok(default.unwrap_or_default().to_string())
        }
        Ok(value) => Ok(value),
        Err(_) => default
            .map(str::to_string)
            .ok_or_else(|| format!("environment variable '{name}' is not set")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env_vars<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        // SAFETY: each test uses variable names no other test touches
        for (key, value) in vars {
            match value {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        let result = f();

        // SAFETY: restoring the values captured above
        for (key, original) in originals {
            match original {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    #[test]
    fn test_bare_and_braced_substitution() {
        with_env_vars(&[("SEEDLING_TEST_SCHEMA", Some("bronze"))], || {
            let text = interpolate("a: $SEEDLING_TEST_SCHEMA\nb: ${SEEDLING_TEST_SCHEMA}").unwrap();
            assert_eq!(text, "a: bronze\nb: bronze");
        });
    }

    #[test]
    fn test_missing_variables_are_all_reported() {
        with_env_vars(
            &[
                ("SEEDLING_TEST_MISSING_A", None),
                ("SEEDLING_TEST_MISSING_B", None),
            ],
            || {
                let err = interpolate("$SEEDLING_TEST_MISSING_A/${SEEDLING_TEST_MISSING_B}")
                    .unwrap_err();
                let msg = err.to_string();
                assert!(msg.contains("SEEDLING_TEST_MISSING_A"));
                assert!(msg.contains("SEEDLING_TEST_MISSING_B"));
            },
        );
    }

    #[test]
    fn test_default_applies_to_unset_and_empty() {
        with_env_vars(
            &[
                ("SEEDLING_TEST_UNSET", None),
                ("SEEDLING_TEST_EMPTY", Some("")),
            ],
            || {
                assert_eq!(interpolate("${SEEDLING_TEST_UNSET:-dbo}").unwrap(), "dbo");
                assert_eq!(interpolate("${SEEDLING_TEST_EMPTY:-dbo}").unwrap(), "dbo");
                // `-` keeps an empty value
                assert_eq!(interpolate("${SEEDLING_TEST_EMPTY-dbo}").unwrap(), "");
            },
        );
    }

    #[test]
    fn test_newline_injection_rejected() {
        with_env_vars(&[("SEEDLING_TEST_NEWLINE", Some("dbo\nx: 1"))], || {
            assert!(interpolate("schema: $SEEDLING_TEST_NEWLINE").is_err());
        });
    }

    #[test]
    fn test_escape_sequence() {
        assert_eq!(interpolate("cost: $$100").unwrap(), "cost: $100");
    }
}
