use crate::calc;
use crate::extract::parse_extraction_text;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::extract::extract_err;
use crate::ipc::helpers::{final_weight_or, optional_str, required_record, required_typed};
use crate::ipc::types::{AppState, Request};
use crate::merge::{merge_records, MergeError};
use crate::model::GradeRecord;
use serde_json::json;

fn merge_err(req: &Request, e: MergeError) -> serde_json::Value {
    match e {
        MergeError::EmptyInput => err(&req.id, "empty_input", e.to_string(), None),
    }
}

/// Projection plus the picker context a client needs to offer alternatives.
fn projection_value(record: &GradeRecord, target_grade: &str, final_weight: f64) -> serde_json::Value {
    let projection = calc::project(record, target_grade, final_weight);
    let suggested_target = if projection.is_possible {
        None
    } else {
        calc::next_lower_grade(&record.grading_scale, target_grade)
    };
    json!({
        "projection": projection,
        "gradeOptions": calc::grade_options(&record.grading_scale),
        "suggestedTarget": suggested_target,
    })
}

fn handle_grades_merge(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let records: Vec<GradeRecord> = match required_typed(req, "records") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let merged_from = records.len();

    match merge_records(records) {
        Ok(record) => ok(
            &req.id,
            json!({
                "record": record,
                "mergedFrom": merged_from,
            }),
        ),
        Err(e) => merge_err(req, e),
    }
}

fn handle_grades_summary(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let record = match required_record(req, "record") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let standing = calc::points_standing(&record.assignments);
    ok(
        &req.id,
        json!({
            "className": record.class_name,
            "currentGrade": record.current_grade,
            "letterGrade": record.letter_grade,
            "standing": standing,
            "gradeOptions": calc::grade_options(&record.grading_scale),
        }),
    )
}

fn handle_grades_project(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record = match required_record(req, "record") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let target_grade = match optional_str(req, "targetGrade") {
        Ok(v) => v.unwrap_or_else(|| state.config.default_target_grade.clone()),
        Err(e) => return e,
    };
    let final_weight = match final_weight_or(req, state.config.default_final_weight) {
        Ok(v) => v,
        Err(e) => return e,
    };

    ok(&req.id, projection_value(&record, &target_grade, final_weight))
}

/// Parses one model reply per screenshot (in submission order), merges them
/// and projects the result.
fn handle_grades_analyze(state: &mut AppState, req: &Request) -> serde_json::Value {
    let responses: Vec<String> = match required_typed(req, "responses") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let target_grade = match optional_str(req, "targetGrade") {
        Ok(v) => v.unwrap_or_else(|| state.config.default_target_grade.clone()),
        Err(e) => return e,
    };
    let final_weight = match final_weight_or(req, state.config.default_final_weight) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut records = Vec::with_capacity(responses.len());
    for (index, text) in responses.iter().enumerate() {
        match parse_extraction_text(text) {
            Ok(r) => records.push(r),
            Err(e) => {
                tracing::warn!(index, error = %e, "extraction reply rejected");
                return extract_err(&req.id, e, json!({ "index": index }));
            }
        }
    }
    let screenshots = records.len();

    let record = match merge_records(records) {
        Ok(v) => v,
        Err(e) => return merge_err(req, e),
    };

    let mut result = projection_value(&record, &target_grade, final_weight);
    result["record"] = json!(record);
    result["screenshots"] = json!(screenshots);
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.merge" => Some(handle_grades_merge(state, req)),
        "grades.summary" => Some(handle_grades_summary(state, req)),
        "grades.project" => Some(handle_grades_project(state, req)),
        "grades.analyze" => Some(handle_grades_analyze(state, req)),
        _ => None,
    }
}
