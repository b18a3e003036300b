// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Human-readable size quantities such as `"500MB"` or `"unlimited"`.
//!
//! Units are binary multiples (`1KB == 1024`). Unparsable input yields `0`,
//! which makes a malformed limit fail closed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Byte count used for `"unlimited"` and for absent global limits.
pub const UNLIMITED: u64 = u64::MAX;

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(B|KB|MB|GB|TB)").expect("size pattern is a valid regex")
});

/// Unit of a [`SizeQuantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    Unlimited,
}

impl SizeUnit {
    fn multiplier(self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::KB => 1 << 10,
            SizeUnit::MB => 1 << 20,
            SizeUnit::GB => 1 << 30,
            SizeUnit::TB => 1 << 40,
            SizeUnit::Unlimited => 0,
        }
    }

    fn from_suffix(suffix: &str) -> Option<SizeUnit> {
        match suffix.to_ascii_uppercase().as_str() {
            "B" => Some(SizeUnit::B),
            "KB" => Some(SizeUnit::KB),
            "MB" => Some(SizeUnit::MB),
            "GB" => Some(SizeUnit::GB),
            "TB" => Some(SizeUnit::TB),
            _ => None,
        }
    }
}

/// A parsed `{number, unit}` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeQuantity {
    pub number: f64,
    pub unit: SizeUnit,
}

impl SizeQuantity {
    pub const fn unlimited() -> Self {
        Self {
            number: 0.0,
            unit: SizeUnit::Unlimited,
        }
    }

    /// Parse `"10MB"`, `"1.5 gb"`, `"2048"` or `"unlimited"`.
    pub fn parse(input: &str) -> Option<SizeQuantity> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unlimited") {
            return Some(Self::unlimited());
        }

        if let Some(captures) = SIZE_PATTERN.captures(trimmed) {
            let number = captures[1].parse::<f64>().ok()?;
            let unit = SizeUnit::from_suffix(&captures[2])?;
            return Some(SizeQuantity { number, unit });
        }

        // A bare leading integer is a byte count.
        let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
        let number = digits.parse::<u64>().ok()?;
        Some(SizeQuantity {
            number: number as f64,
            unit: SizeUnit::B,
        })
    }

    /// Exact byte count. Saturates at [`UNLIMITED`].
    pub fn bytes(&self) -> u64 {
        match self.unit {
            SizeUnit::Unlimited => UNLIMITED,
            unit => (self.number * unit.multiplier() as f64).round() as u64,
        }
    }
}

/// Convert a human-readable size to bytes; unparsable input is `0`.
pub fn to_bytes(input: &str) -> u64 {
    SizeQuantity::parse(input).map_or(0, |quantity| quantity.bytes())
}

/// A size as it appears in the policy document: a byte count or a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeSetting {
    Bytes(u64),
    Text(String),
}

impl SizeSetting {
    /// Read a global size field. `null`, `false` and non-size types are absent.
    pub fn from_value(value: Option<&Value>) -> Option<SizeSetting> {
        match value? {
            Value::String(text) => Some(SizeSetting::Text(text.clone())),
            Value::Number(number) => match number.as_u64() {
                Some(bytes) => Some(SizeSetting::Bytes(bytes)),
                // Negative counts go through the text parser and fail closed.
                None => match number.as_f64() {
                    Some(n) if n >= 0.0 => Some(SizeSetting::Bytes(n.round() as u64)),
                    _ => Some(SizeSetting::Text(number.to_string())),
                },
            },
            _ => None,
        }
    }

    /// Byte count; `0` means unlimited, like an empty string.
    pub fn bytes(&self) -> u64 {
        match self {
            SizeSetting::Bytes(0) => UNLIMITED,
            SizeSetting::Bytes(bytes) => *bytes,
            SizeSetting::Text(text) => to_bytes(text),
        }
    }
}

/// Global limit: an absent setting means unlimited.
pub fn global_limit(setting: Option<&SizeSetting>) -> u64 {
    setting.map_or(UNLIMITED, SizeSetting::bytes)
}

/// Per-role limit stored as a raw permission value.
///
/// Falsy values (`null`, `false`, `""`, `0`) mean "inherit the global limit"
/// and yield `None`.
pub fn role_limit(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(to_bytes(text)),
        Value::Number(number) => match number.as_u64() {
            Some(0) => None,
            Some(bytes) => Some(bytes),
            None => number.as_f64().filter(|n| *n > 0.0).map(|n| n.round() as u64),
        },
        Value::Bool(false) | Value::Null => None,
        _ => Some(0),
    }
}
