//! Reconciles grade records extracted independently from several screenshots
//! of the same course into one record.
//!
//! Input order matters: every first-seen-wins rule below (class metadata,
//! grading scale, category weights, tie-breaks between equally complete
//! assignments) resolves toward the earlier record. Callers must pass records
//! in submission order to keep results reproducible.

use crate::calc;
use crate::model::{Assignment, Category, GradeRecord};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("no grade records to merge")]
    EmptyInput,
}

/// Whether a later duplicate should replace the already merged assignment.
///
/// A scored row beats an ungraded one. Otherwise `existing` is kept only when
/// its `points_possible` is at least the incoming one, so a tie keeps
/// `existing` and an unordered (NaN) comparison lets `incoming` through.
fn incoming_wins(existing: &Assignment, incoming: &Assignment) -> bool {
    match (existing.is_graded(), incoming.is_graded()) {
        (true, false) => false,
        (false, true) => true,
        _ => matches!(
            existing.points_possible.partial_cmp(&incoming.points_possible),
            Some(Ordering::Less) | None
        ),
    }
}

/// `index` maps each merged identity to its position in `merged`.
fn merge_assignments(
    merged: &mut Vec<Assignment>,
    index: &mut HashMap<String, usize>,
    incoming: Vec<Assignment>,
) {
    for assignment in incoming {
        let key = assignment.identity();
        match index.get(&key) {
            Some(&idx) => {
                if incoming_wins(&merged[idx], &assignment) {
                    merged[idx] = assignment;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(assignment);
            }
        }
    }
}

fn merge_categories(merged: &mut Vec<Category>, seen: &mut HashSet<String>, incoming: Vec<Category>) {
    for category in incoming {
        if seen.insert(category.name.to_lowercase()) {
            merged.push(category);
        }
    }
}

/// Merges `records` into one grade record.
///
/// A single record is returned untouched, including its extracted
/// `current_grade` and `letter_grade`. With two or more, the grade and letter
/// are recomputed from the merged assignments against the first record's
/// grading scale.
pub fn merge_records(records: Vec<GradeRecord>) -> Result<GradeRecord, MergeError> {
    let mut iter = records.into_iter();
    let Some(base) = iter.next() else {
        return Err(MergeError::EmptyInput);
    };

    let rest: Vec<GradeRecord> = iter.collect();
    if rest.is_empty() {
        return Ok(base);
    }
    let source_count = rest.len() + 1;

    let GradeRecord {
        class_name,
        instructor,
        assignments,
        categories,
        grading_scale,
        ..
    } = base;

    // Duplicates inside the first record stay; later rows match the earliest.
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, a) in assignments.iter().enumerate() {
        index.entry(a.identity()).or_insert(i);
    }
    let mut seen: HashSet<String> = categories.iter().map(|c| c.name.to_lowercase()).collect();

    let mut merged_assignments = assignments;
    let mut merged_categories = categories;
    for record in rest {
        merge_assignments(&mut merged_assignments, &mut index, record.assignments);
        merge_categories(&mut merged_categories, &mut seen, record.categories);
    }

    let standing = calc::points_standing(&merged_assignments);
    let letter_grade = calc::letter_for(&grading_scale, standing.percentage);

    tracing::debug!(
        sources = source_count,
        assignments = merged_assignments.len(),
        graded = standing.graded_count,
        categories = merged_categories.len(),
        current_grade = standing.percentage,
        letter = %letter_grade,
        "merged grade records"
    );

    Ok(GradeRecord {
        class_name,
        instructor,
        current_grade: standing.percentage,
        letter_grade,
        assignments: merged_assignments,
        categories: merged_categories,
        grading_scale,
    })
}
