//! Sequential quotation-code allocation scoped by year and month.
//!
//! Codes look like `COT-2026-08-00042`. Allocation is a pure function over
//! the set of already-issued codes; persistence (and the uniqueness guard
//! against racing writers) lives in the repository layer.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const CODE_TAG: &str = "COT";
const SEQUENCE_WIDTH: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeScope {
    pub year: i32,
    pub month: u32,
}

impl CodeScope {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    /// `COT-{year}-{month:02}-`. Every code in this scope starts with it.
    pub fn prefix(&self) -> String {
        format!("{CODE_TAG}-{}-{:02}-", self.year, self.month)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotationCode(pub String);

impl QuotationCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric suffix, when the trailing segment parses as one.
    pub fn sequence(&self) -> Option<u32> {
        self.0.rsplit('-').next().and_then(|segment| segment.parse().ok())
    }
}

impl fmt::Display for QuotationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the next code for the scope from the already-issued codes.
///
/// Codes outside the scope's prefix are ignored; a matching code whose
/// trailing segment is missing or non-numeric counts as sequence 0. The
/// result is `max + 1`, starting at 1 for a fresh scope, zero-padded to five
/// digits. Deterministic, and callers must treat it as provisional until the
/// owning record is durably saved.
pub fn next_code<I, S>(scope: CodeScope, existing: I) -> QuotationCode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = scope.prefix();
    let max_sequence = existing
        .into_iter()
        .filter(|code| code.as_ref().starts_with(&prefix))
        .map(|code| {
            code.as_ref()
                .rsplit('-')
                .next()
                .and_then(|segment| segment.parse::<u32>().ok())
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0);

    QuotationCode(format!("{prefix}{:0width$}", max_sequence + 1, width = SEQUENCE_WIDTH))
}
