//! Record query pipeline: filter, then stable sort.
//!
//! Pure function of `(records, query)`. Records are never cloned or mutated;
//! the view is a vector of references into the caller's slice.

use std::cmp::Ordering;

use crate::core::query::{Query, SortDirection, SortField, UnorderedPlacement};
use crate::core::record::EvaluationRecord;
use crate::core::value::SortValue;

/// Produce the ordered view for `query`.
pub fn run_query<'a>(records: &'a [EvaluationRecord], query: &Query) -> Vec<&'a EvaluationRecord> {
    let needle = query.search_term.to_lowercase();
    let filtered: Vec<&EvaluationRecord> = records
        .iter()
        .filter(|record| matches_query(record, query, &needle))
        .collect();

    match query.sort.field {
        Some(field) => sort_view(filtered, field, query.sort.direction, query.unordered),
        None => filtered,
    }
}

/// Conjunction of search, model equality, and eval equality.
///
/// `needle` is the lowercased search term.
fn matches_query(record: &EvaluationRecord, query: &Query, needle: &str) -> bool {
    if !needle.is_empty()
        && !record.model.to_lowercase().contains(needle)
        && !record.eval_name.to_lowercase().contains(needle)
    {
        return false;
    }
    if let Some(model) = query.active_model_filter()
        && record.model != model
    {
        return false;
    }
    if let Some(eval_name) = query.active_eval_filter()
        && record.eval_name != eval_name
    {
        return false;
    }
    true
}

/// Stable sort by `field`. Keys are extracted once per record.
pub fn sort_view<'a>(
    view: Vec<&'a EvaluationRecord>,
    field: SortField,
    direction: SortDirection,
    unordered: UnorderedPlacement,
) -> Vec<&'a EvaluationRecord> {
    let mut keyed: Vec<(SortValue, &EvaluationRecord)> = view
        .into_iter()
        .map(|record| (field.value_of(record), record))
        .collect();
    keyed.sort_by(|(left, _), (right, _)| compare_keys(left, right, direction, unordered));
    keyed.into_iter().map(|(_, record)| record).collect()
}

fn compare_keys(
    left: &SortValue,
    right: &SortValue,
    direction: SortDirection,
    unordered: UnorderedPlacement,
) -> Ordering {
    if let Some(ordering) = left.compare(right) {
        return match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
    }
    let unordered_side = match unordered {
        UnorderedPlacement::Last => Ordering::Greater,
        UnorderedPlacement::First => Ordering::Less,
    };
    match (left.is_ordered(), right.is_ordered()) {
        (false, true) => unordered_side,
        (true, false) => unordered_side.reverse(),
        _ => Ordering::Equal,
    }
}
