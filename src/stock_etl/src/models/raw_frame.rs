//! The provider-shaped table a [`DataProvider`](crate::providers::DataProvider)
//! hands back before normalization.
//!
//! Providers do not agree on column layout. Some return flat headers
//! (`"Open"`), others return multi-level headers where the first level is the
//! field and later levels name the ticker (`("Open", "AAPL")`). `RawFrame`
//! keeps whatever the provider produced; [`RawFrame::flatten_columns`] reduces
//! it to a single level before the fetcher maps it onto [`PriceBar`].
//!
//! [`PriceBar`]: crate::models::bar::PriceBar

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use thiserror::Error;

/// A column header made of one or more levels, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnHeader(Vec<String>);

impl ColumnHeader {
    pub fn flat(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn nested<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(levels.into_iter().map(Into::into).collect())
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    /// The outermost level, which names the field.
    pub fn level0(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn is_nested(&self) -> bool {
        self.0.len() > 1
    }
}

impl fmt::Display for ColumnHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nested() {
            write!(f, "({})", self.0.join(", "))
        } else {
            f.write_str(self.level0())
        }
    }
}

/// One untyped cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Number(f64),
    Timestamp(DateTime<FixedOffset>),
    Date(NaiveDate),
    Text(String),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawValue::Null, RawValue::Number)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("row {row} has {found} cells, expected {expected}")]
pub struct RaggedRowError {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    columns: Vec<ColumnHeader>,
    rows: Vec<Vec<RawValue>>,
}

impl RawFrame {
    /// Builds a frame, rejecting rows whose width differs from the header.
    pub fn new(
        columns: Vec<ColumnHeader>,
        rows: Vec<Vec<RawValue>>,
    ) -> Result<Self, RaggedRowError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(RaggedRowError {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[ColumnHeader] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_nested_columns(&self) -> bool {
        self.columns.iter().any(ColumnHeader::is_nested)
    }

    /// Collapses every header to its outermost level.
    pub fn flatten_columns(&mut self) {
        for column in &mut self.columns {
            if column.is_nested() {
                *column = ColumnHeader::flat(column.level0());
            }
        }
    }
}
