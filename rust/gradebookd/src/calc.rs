use crate::model::{Assignment, FinalProjection, GradeRecord, GradingScale};
use serde::Serialize;
use std::cmp::Ordering;

/// Threshold used when the requested target grade is not in the record's scale.
pub const DEFAULT_TARGET_PERCENTAGE: f64 = 90.0;

/// Letter reported when no threshold in the scale is met (or the scale is empty).
pub const FALLBACK_LETTER: &str = "F";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub total_score: f64,
    pub total_possible: f64,
    pub graded_count: usize,
    pub assignment_count: usize,
    pub percentage: f64,
}

/// Points-based standing over graded assignments only.
///
/// Ungraded rows count toward `assignment_count` but contribute neither score
/// nor possible points. A zero denominator yields 0%, not an error.
pub fn points_standing<'a, I>(assignments: I) -> Standing
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let mut total_score: f64 = 0.0;
    let mut total_possible: f64 = 0.0;
    let mut graded_count: usize = 0;
    let mut assignment_count: usize = 0;

    for a in assignments {
        assignment_count += 1;
        if let Some(score) = a.score {
            graded_count += 1;
            total_score += score;
            total_possible += a.points_possible;
        }
    }

    let percentage = if total_possible > 0.0 {
        100.0 * total_score / total_possible
    } else {
        0.0
    };

    Standing {
        total_score,
        total_possible,
        graded_count,
        assignment_count,
        percentage,
    }
}

/// Scale entries by threshold, highest first. Stable: equal thresholds keep document order.
fn ranked(scale: &GradingScale) -> Vec<(&str, f64)> {
    let mut entries: Vec<(&str, f64)> = scale.iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    entries
}

pub fn letter_for(scale: &GradingScale, percentage: f64) -> String {
    ranked(scale)
        .into_iter()
        .find(|(_, threshold)| *threshold <= percentage)
        .map(|(label, _)| label.to_string())
        .unwrap_or_else(|| FALLBACK_LETTER.to_string())
}

/// Labels ordered from the highest threshold to the lowest.
pub fn grade_options(scale: &GradingScale) -> Vec<String> {
    ranked(scale)
        .into_iter()
        .map(|(label, _)| label.to_string())
        .collect()
}

/// The label ranked immediately below `label`, if any.
pub fn next_lower_grade(scale: &GradingScale, label: &str) -> Option<String> {
    let options = grade_options(scale);
    let pos = options.iter().position(|l| l == label)?;
    options.get(pos + 1).cloned()
}

/// Score needed on a not-yet-graded component worth `final_weight` percent to
/// finish at `target_grade`.
///
/// `final_weight` must be in (0, 100]; that is the caller's responsibility.
pub fn project(record: &GradeRecord, target_grade: &str, final_weight: f64) -> FinalProjection {
    let target_percentage = record
        .grading_scale
        .get(target_grade)
        .unwrap_or(DEFAULT_TARGET_PERCENTAGE);
    let current_grade = record.current_grade;
    let current_weight = 100.0 - final_weight;

    let needed = (target_percentage - current_grade * current_weight / 100.0) / (final_weight / 100.0);

    FinalProjection {
        target_grade: target_grade.to_string(),
        target_percentage,
        current_grade,
        final_weight,
        needed_score: needed.max(0.0),
        is_possible: (0.0..=100.0).contains(&needed),
    }
}
