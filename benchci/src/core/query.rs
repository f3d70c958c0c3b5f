//! Query state: search term, equality filters, and sort specification.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::core::record::EvaluationRecord;
use crate::core::value::SortValue;

/// Sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Model,
    Timestamp,
    EvalName,
    Score,
    TotalTokens,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Model,
        SortField::Timestamp,
        SortField::EvalName,
        SortField::Score,
        SortField::TotalTokens,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Model => "model",
            SortField::Timestamp => "timestamp",
            SortField::EvalName => "eval_name",
            SortField::Score => "score",
            SortField::TotalTokens => "total_tokens",
        }
    }

    /// Extract this field from a record as a comparable value.
    pub fn value_of(self, record: &EvaluationRecord) -> SortValue {
        match self {
            SortField::Model => SortValue::from_text(&record.model),
            SortField::Timestamp => SortValue::from_timestamp(&record.timestamp),
            SortField::EvalName => SortValue::from_text(&record.eval_name),
            SortField::Score => SortValue::from_scalar(record.score.as_ref()),
            SortField::TotalTokens => SortValue::from_count(record.total_tokens),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match SortField::ALL.iter().find(|field| field.as_str() == value) {
            Some(field) => Ok(*field),
            None => bail!(
                "unknown sort field {value:?} (expected one of model, timestamp, eval_name, score, total_tokens)"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => bail!("unknown sort direction {other:?}"),
        }
    }
}

/// Where values that cannot be ordered end up in a sorted view.
///
/// Applies to absent fields and unparsable timestamps, in both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnorderedPlacement {
    First,
    #[default]
    Last,
}

/// Active sort column and direction. `field == None` keeps input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn by(field: SortField, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    /// Header-click semantics: the same column flips direction, a new column
    /// starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        self.direction = if self.field == Some(field) && self.direction == SortDirection::Ascending
        {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.field = Some(field);
    }
}

/// Everything the pipeline needs besides the records themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search_term: String,
    pub model_filter: Option<String>,
    pub eval_filter: Option<String>,
    pub sort: SortSpec,
    pub unordered: UnorderedPlacement,
}

impl Query {
    /// Reset search and equality filters; sort is kept.
    pub fn clear_filters(&mut self) {
        self.search_term.clear();
        self.model_filter = None;
        self.eval_filter = None;
    }

    pub(crate) fn active_model_filter(&self) -> Option<&str> {
        self.model_filter.as_deref().filter(|value| !value.is_empty())
    }

    pub(crate) fn active_eval_filter(&self) -> Option<&str> {
        self.eval_filter.as_deref().filter(|value| !value.is_empty())
    }
}
