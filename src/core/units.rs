//! Size-string parsing and formatting
//!
//! Two distinct grammars meet here: the SI-decimal sizes printed by
//! `docker system df -v` (`67.42MB`, `0B`) and the Kubernetes resource
//! quantity syntax used in claim declarations (`1Gi`, `500Mi`, `100m`).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{MigrateError, MigrateResult};

fn si_size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*([KMGTPE]?B)$").expect("static regex"))
}

fn quantity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+|\d+\.\d*|\.\d+)(([KMGTPE]i)|[numkMGTPE]|([eE][+-]?\d+))?$").expect("static regex")
    })
}

/// Parse a `docker system df` size string into bytes.
///
/// Units are SI-decimal: `B`, `KB`, `MB`, `GB`, `TB`, `PB`, `EB`.
pub fn parse_si_size(input: &str) -> MigrateResult<u64> {
    let upper = input.trim().to_uppercase();
    let caps = si_size_re().captures(&upper).ok_or_else(|| MigrateError::InvalidSize {
        input: input.to_string(),
    })?;

    let value: f64 = caps[1].parse().map_err(|_| MigrateError::InvalidSize {
        input: input.to_string(),
    })?;

    let multiplier: u64 = match &caps[2] {
        "B" => 1,
        "KB" => 1_000,
        "MB" => 1_000_000,
        "GB" => 1_000_000_000,
        "TB" => 1_000_000_000_000,
        "PB" => 1_000_000_000_000_000,
        "EB" => 1_000_000_000_000_000_000,
        _ => {
            return Err(MigrateError::InvalidSize {
                input: input.to_string(),
            })
        }
    };

    Ok((value * multiplier as f64) as u64)
}

/// Format a byte count for display using 1024-based units.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    let suffix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, suffix)
}

/// Whether a string is a valid Kubernetes resource quantity
/// (plain number, decimal suffix `m`/`k`/`M`/`G`…, binary suffix
/// `Ki`/`Mi`/`Gi`…, or scientific notation).
pub fn is_valid_quantity(input: &str) -> bool {
    quantity_re().is_match(input.trim())
}
