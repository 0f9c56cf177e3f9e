use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let cfg = &state.config;
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "defaults": {
                "targetGrade": cfg.default_target_grade,
                "finalWeight": cfg.default_final_weight,
            },
            "extractRetry": {
                "maxAttempts": cfg.retry.max_attempts,
                "initialDelayMs": cfg.retry.initial_delay.as_millis() as u64,
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
