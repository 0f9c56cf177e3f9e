use crate::extract::{parse_extraction_text, ExtractError};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

pub(crate) fn extract_err(id: &str, e: ExtractError, details: serde_json::Value) -> serde_json::Value {
    let mut details = details;
    details["retryable"] = json!(e.is_retryable());
    err(id, "extract_failed", e.to_string(), Some(details))
}

fn handle_extract_parse(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = match required_str(req, "text") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match parse_extraction_text(&text) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => {
            tracing::warn!(error = %e, "extraction reply rejected");
            extract_err(&req.id, e, json!({}))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "extract.parse" => Some(handle_extract_parse(state, req)),
        _ => None,
    }
}
