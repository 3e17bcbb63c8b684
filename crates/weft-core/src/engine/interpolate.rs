//! Placeholder interpolation and condition evaluation.
//!
//! `interpolate` replaces `{{name}}` placeholders against a run's variable
//! and parameter maps. Substitution runs in two full passes -- all variables
//! first, then all parameters -- and substituted text is never re-scanned
//! within a pass. A placeholder still unresolved after both passes becomes
//! an empty string, never a literal leftover. The one exception is the
//! `{{_repo:org/repo}}` pattern, which resolves through the repo-path table
//! and falls back to `~` when the repository is unknown.
//!
//! Keeping the two separate passes (rather than merging the maps) preserves
//! an edge case: a parameter can rewrite text a variable substituted only if
//! the literal placeholder pattern survives the first pass. In practice
//! variable and parameter namespaces should stay disjoint.

use std::collections::HashMap;

/// Prefix of the repo-path placeholder: `{{_repo:org/repo}}`.
const REPO_PLACEHOLDER_PREFIX: &str = "_repo:";

/// Fallback substituted for an unknown repository reference.
const REPO_FALLBACK: &str = "~";

/// Replace every `{{name}}` placeholder in `text`.
///
/// Resolution order: variables, then parameters, then the repo-path table,
/// then any remaining placeholder collapses to the empty string.
pub fn interpolate(
    text: &str,
    variables: &HashMap<String, String>,
    params: &HashMap<String, String>,
    repos: &HashMap<String, String>,
) -> String {
    let after_vars = substitute_pass(text, variables);
    let after_params = substitute_pass(&after_vars, params);
    clear_pass(&after_params, repos)
}

/// One left-to-right substitution pass.
///
/// Replaces `{{key}}` for every `key` present in `map`; unknown placeholders
/// are copied through untouched. The scan continues after each replacement,
/// so substituted content is not re-interpolated within this pass.
fn substitute_pass(text: &str, map: &HashMap<String, String>) -> String {
    scan_placeholders(text, |key| map.get(key).cloned())
}

/// Final pass: resolve `{{_repo:...}}` references and blank everything else.
fn clear_pass(text: &str, repos: &HashMap<String, String>) -> String {
    scan_placeholders(text, |key| {
        if let Some(repo) = key.strip_prefix(REPO_PLACEHOLDER_PREFIX) {
            Some(
                repos
                    .get(repo)
                    .cloned()
                    .unwrap_or_else(|| REPO_FALLBACK.to_string()),
            )
        } else {
            // Unmatched placeholders resolve to empty, not literal text.
            Some(String::new())
        }
    })
}

/// Walk `text` replacing each `{{key}}` with `resolve(key)`, leaving the
/// placeholder literal when `resolve` returns `None`. Text without a closing
/// `}}` is copied through verbatim.
fn scan_placeholders(text: &str, resolve: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match resolve(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Condition evaluation
// ---------------------------------------------------------------------------

/// Evaluate an already-interpolated condition string to a boolean.
///
/// The first `==` or `!=` (by byte position, `==` winning a tie) splits the
/// condition into two operands. Both sides are trimmed and the right-hand
/// side loses a single layer of surrounding quotes if present. Comparison is
/// exact string equality -- no numeric coercion, so `"10"` never equals
/// `"10.0"`.
///
/// Without an operator, the trimmed text is truthy unless it is exactly
/// empty, `"false"`, or `"0"`.
pub fn evaluate_condition(condition: &str) -> bool {
    let eq = condition.find("==");
    let ne = condition.find("!=");

    let operator = match (eq, ne) {
        (Some(e), Some(n)) if e <= n => Some((e, true)),
        (Some(_), Some(n)) => Some((n, false)),
        (Some(e), None) => Some((e, true)),
        (None, Some(n)) => Some((n, false)),
        (None, None) => None,
    };

    match operator {
        Some((index, is_equality)) => {
            let lhs = condition[..index].trim();
            let rhs = strip_quotes(condition[index + 2..].trim());
            if is_equality { lhs == rhs } else { lhs != rhs }
        }
        None => {
            let trimmed = condition.trim();
            !trimmed.is_empty() && trimmed != "false" && trimmed != "0"
        }
    }
}

/// Remove one layer of matching surrounding quotes (`'...'` or `"..."`).
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
