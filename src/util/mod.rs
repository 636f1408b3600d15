//! util — общие утилиты.
//!
//! Содержит:
//! - round_up(): выравнивание вверх (data image offset);
//! - version_info(): hash версии → человекочитаемая метка;
//! - parse_u64_auto(): разбор чисел из ENV/CLI (dec/0x/0o/0b).

use crate::consts::SUPPORTED_VERSION_HASH;

/// Round `n` up to a multiple of `m` (`m` > 0). `round_up(0, m) == Some(0)`;
/// `None` if the result does not fit in u64.
#[inline]
pub fn round_up(n: u64, m: u64) -> Option<u64> {
    match n % m {
        0 => Some(n),
        r => n.checked_add(m - r),
    }
}

/// Known version hashes.
const KNOWN_VERSIONS: &[(&str, &str)] = &[
    ("8ee4ef7a67df9845fba331734198a953", "Dart v2.10"),
    (SUPPORTED_VERSION_HASH, "Dart v2.13"),
];

/// Human-readable label for a version hash; "unknown" if not recognised.
pub fn version_info(hash: &str) -> &'static str {
    KNOWN_VERSIONS
        .iter()
        .find(|(h, _)| *h == hash)
        .map(|(_, label)| *label)
        .unwrap_or("unknown")
}

pub fn parse_u64_auto(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(x) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(x, 16).map_err(|e| e.to_string())
    } else if let Some(x) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        u64::from_str_radix(x, 8).map_err(|e| e.to_string())
    } else if let Some(x) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        u64::from_str_radix(x, 2).map_err(|e| e.to_string())
    } else {
        s.parse::<u64>().map_err(|e| e.to_string())
    }
}

/// Truthy ENV value: 1|true|yes|on (case-insensitive).
#[inline]
pub fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "yes" || s == "on"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_to_alignment() {
        assert_eq!(round_up(0, 16), Some(0));
        assert_eq!(round_up(1, 16), Some(16));
        assert_eq!(round_up(16, 16), Some(16));
        assert_eq!(round_up(104, 16), Some(112));
        assert_eq!(round_up(u64::MAX - 15, 16), Some(u64::MAX - 15));
        assert_eq!(round_up(u64::MAX - 3, 16), None);
    }

    #[test]
    fn versions() {
        assert_eq!(version_info("8ee4ef7a67df9845fba331734198a953"), "Dart v2.10");
        assert_eq!(version_info(SUPPORTED_VERSION_HASH), "Dart v2.13");
        assert_eq!(version_info("deadbeef"), "unknown");
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_u64_auto("0x10"), Ok(16));
        assert_eq!(parse_u64_auto(" 42 "), Ok(42));
        assert_eq!(parse_u64_auto("0b101"), Ok(5));
        assert!(parse_u64_auto("zz").is_err());
    }
}
