use std::fmt::Write;

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};

const MAX_COMPONENT_CHARS: usize = 60;

/// `{company}_{role}_{label}_{YYYYMMDD-HHMMSS}_{hash8}.{ext}`, where the hash is
/// taken over the exported content.
pub fn export_filename(
    company: &str,
    role: &str,
    label: &str,
    ext: &str,
    content: &[u8],
    at: DateTime<Local>,
) -> String {
    format!(
        "{}_{}_{}_{}_{}.{}",
        sanitize_component(company, "company"),
        sanitize_component(role, "role"),
        sanitize_component(label, "export"),
        at.format("%Y%m%d-%H%M%S"),
        short_hash(content),
        ext.trim_start_matches('.'),
    )
}

/// Makes one filename segment safe on every platform. Whitespace and
/// forbidden characters become `_`, runs of `_` collapse, and an empty result
/// becomes `fallback`.
pub fn sanitize_component(input: &str, fallback: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if is_forbidden(c) || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let mut out: String = out
        .trim_matches(&['_', '.'][..])
        .chars()
        .take(MAX_COMPONENT_CHARS)
        .collect();
    // Truncation can leave a trailing separator.
    while out.ends_with(['_', '.']) {
        out.pop();
    }
    if out.is_empty() {
        out = fallback.to_string();
    }
    if is_reserved_windows_name(&out) {
        out.push('_');
    }
    out
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest.iter().take(4).fold(String::with_capacity(8), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}
