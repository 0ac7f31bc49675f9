//! Attribute and type naming
//!
//! Kubernetes uses camelCase JSON field names while provider attributes are
//! snake_case. The conversion is lossy (`podCIDR` and `podCidr` both map to
//! `pod_cidr`), so schemas keep the original JSON name next to the attribute
//! name and never try to invert this function.

/// Convert a JSON field name into a snake_case attribute name
///
/// Acronyms are kept together: `podCIDR` becomes `pod_cidr` and
/// `HTTPServer` becomes `http_server`. Characters that are not valid in an
/// identifier act as word separators.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            push_separator(&mut out);
            continue;
        }

        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                push_separator(&mut out);
            }
        }

        out.push(c.to_ascii_lowercase());
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() || trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("field_{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with('_') {
        out.push('_');
    }
}

/// Convert an API group into a type name segment
///
/// `cert-manager.io` becomes `cert_manager_io`; the core group (empty)
/// becomes `core`.
#[must_use]
pub fn group_segment(group: &str) -> String {
    if group.is_empty() {
        return "core".to_string();
    }
    group
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
