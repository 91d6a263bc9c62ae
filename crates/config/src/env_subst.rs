//! `${ENV_VAR}` expansion in raw config text, applied before TOML parsing.
//!
//! Two forms are recognized: `${NAME}` and `${NAME:-default}`. A placeholder
//! that resolves to nothing is left in the output verbatim so that
//! validation can point at the exact unresolved value.

pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Whether a config value still contains an unexpanded placeholder.
/// Validation uses this to turn a missing variable into a diagnostic
/// instead of a silently wrong secret.
#[must_use]
pub fn has_unresolved_placeholder(value: &str) -> bool {
    match value.find("${") {
        Some(start) => value[start..].contains('}'),
        None => false,
    }
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(close) = after_open.find('}') else {
            // No closing brace anywhere; the remainder is literal text.
            out.push_str(&rest[start..]);
            return out;
        };

        let placeholder = &after_open[..close];
        let (name, default) = match placeholder.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (placeholder, None),
        };

        let resolved = if name.is_empty() {
            None
        } else {
            lookup(name).or_else(|| default.map(str::to_string))
        };
        match resolved {
            Some(value) => out.push_str(&value),
            // Keep the full `${...}` so the gap stays visible downstream.
            None => out.push_str(&rest[start..start + 2 + close + 1]),
        }

        rest = &after_open[close + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "VETRINA_TEST_SECRET" => Some("s3cret".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        let out = substitute_env_with("secret = \"${VETRINA_TEST_SECRET}\"", lookup);
        assert_eq!(out, "secret = \"s3cret\"");
    }

    #[test]
    fn leaves_unknown_var() {
        let out = substitute_env_with("x = \"${NOPE}\"", lookup);
        assert_eq!(out, "x = \"${NOPE}\"");
        assert!(has_unresolved_placeholder("${NOPE}"));
    }

    #[test]
    fn default_applies_when_var_unset() {
        let out = substitute_env_with("port = ${VETRINA_PORT:-7870}", lookup);
        assert_eq!(out, "port = 7870");
    }

    #[test]
    fn set_var_wins_over_default() {
        let out = substitute_env_with("s = \"${VETRINA_TEST_SECRET:-fallback}\"", lookup);
        assert_eq!(out, "s = \"s3cret\"");
    }

    #[test]
    fn multiple_placeholders_in_one_line() {
        let out = substitute_env_with(
            "pair = \"${VETRINA_TEST_SECRET}:${VETRINA_TEST_SECRET}\"",
            lookup,
        );
        assert_eq!(out, "pair = \"s3cret:s3cret\"");
    }

    #[test]
    fn plain_text_untouched() {
        let out = substitute_env_with("bind = \"127.0.0.1\"", lookup);
        assert_eq!(out, "bind = \"127.0.0.1\"");
        assert!(!has_unresolved_placeholder("127.0.0.1"));
    }

    #[test]
    fn unclosed_placeholder_kept_literal() {
        let out = substitute_env_with("x = ${OOPS", lookup);
        assert_eq!(out, "x = ${OOPS");
        assert!(!has_unresolved_placeholder("${OOPS"));
    }

    #[test]
    fn empty_name_kept_literal() {
        let out = substitute_env_with("x = ${}", lookup);
        assert_eq!(out, "x = ${}");
        let out = substitute_env_with("x = ${:-d}", lookup);
        assert_eq!(out, "x = ${:-d}");
    }
}
