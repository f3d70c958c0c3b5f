//! View state that sits next to the pipeline: filter choices, result counts,
//! and the expanded row.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::core::record::EvaluationRecord;

/// Distinct filter values, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub models: Vec<String>,
    pub evals: Vec<String>,
}

impl Facets {
    pub fn from_records(records: &[EvaluationRecord]) -> Self {
        Self {
            models: distinct(records.iter().map(|record| record.model.as_str())),
            evals: distinct(records.iter().map(|record| record.eval_name.as_str())),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSummary {
    pub shown: usize,
    pub total: usize,
}

impl fmt::Display for ViewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Showing {} of {} results", self.shown, self.total)
    }
}

/// At most one expanded row, identified by its index in the current view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowExpansion {
    expanded: Option<usize>,
}

impl RowExpansion {
    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }

    pub fn toggle(&mut self, index: usize) {
        self.expanded = if self.is_expanded(index) {
            None
        } else {
            Some(index)
        };
    }
}
