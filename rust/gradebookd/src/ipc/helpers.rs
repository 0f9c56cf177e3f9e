use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::model::GradeRecord;
use serde::de::DeserializeOwned;
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Absent and `null` both read as `None`; any other non-string is rejected.
pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_str().map(|s| Some(s.to_string())).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a string", key),
                None,
            )
        }),
    }
}

pub fn optional_f64(req: &Request, key: &str) -> Result<Option<f64>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a number", key),
                None,
            )
        }),
    }
}

/// Deserializes `params[key]` into `T`, reporting the serde path on failure.
pub fn required_typed<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid {}: {}", key, e),
            Some(json!({ "field": key })),
        )
    })
}

pub fn required_record(req: &Request, key: &str) -> Result<GradeRecord, serde_json::Value> {
    required_typed(req, key)
}

/// Final weight as a percentage of the course, in (0, 100].
pub fn final_weight_or(req: &Request, default: f64) -> Result<f64, serde_json::Value> {
    let w = optional_f64(req, "finalWeight")?.unwrap_or(default);
    if !(w.is_finite() && w > 0.0 && w <= 100.0) {
        return Err(err(
            &req.id,
            "bad_params",
            "finalWeight must be in (0, 100]",
            Some(json!({ "finalWeight": w })),
        ));
    }
    Ok(w)
}
