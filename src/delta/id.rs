use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{Error, Result};

const TOKEN_FORMAT: &str = "%Y%m%d%H%M%S";

/// Identifier of a delta: a creation timestamp followed by a slug,
/// e.g. `20250410093015-add-status-to-attendance`.
///
/// Timestamps come in three granularities (date only, minutes, seconds) and
/// may use `-` or `_` between fields. Every identifier is normalized to a
/// 14-digit token on parse, and ordering compares `(token, slug)` so mixed
/// granularity still sorts as one total order.
#[derive(Debug, Clone)]
pub struct DeltaId {
    name: String,
    token: String,
    slug: String,
}

impl DeltaId {
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidDeltaId(format!("{name}: {reason}"));

        // The stamp ends at the last separator (or first letter) that closes an
        // 8-, 12- or 14-digit run, so a slug may itself start with digits.
        let mut digits = String::new();
        let mut cut: Option<(usize, usize)> = None;
        for (i, c) in name.char_indices() {
            if c.is_ascii_digit() {
                digits.push(c);
                if digits.len() > 14 {
                    break;
                }
            } else {
                if matches!(digits.len(), 8 | 12 | 14) {
                    let slug_start = if c == '-' || c == '_' { i + 1 } else { i };
                    cut = Some((digits.len(), slug_start));
                }
                if c != '-' && c != '_' {
                    break;
                }
            }
        }

        let Some((width, slug_start)) = cut else {
            return Err(if digits.is_empty() {
                invalid("missing timestamp")
            } else if name.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_') {
                invalid("missing name after timestamp")
            } else {
                invalid(&format!("timestamp has {} digits", digits.len()))
            });
        };

        let slug = &name[slug_start..];
        if slug.is_empty() {
            return Err(invalid("missing name after timestamp"));
        }

        digits.truncate(width);
        let padded = match width {
            8 => format!("{digits}000000"),
            12 => format!("{digits}00"),
            _ => digits,
        };

        NaiveDateTime::parse_from_str(&padded, TOKEN_FORMAT)
            .map_err(|e| invalid(&format!("timestamp is not a valid date: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            token: padded,
            slug: slug.to_string(),
        })
    }

    /// The identifier exactly as declared.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Fixed-width `YYYYMMDDHHMMSS` token.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl PartialEq for DeltaId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DeltaId {}

impl PartialOrd for DeltaId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeltaId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token
            .cmp(&other.token)
            .then_with(|| self.slug.cmp(&other.slug))
    }
}

impl fmt::Display for DeltaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
