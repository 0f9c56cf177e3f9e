use crate::extract::RetryPolicy;
use anyhow::Context;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_LOG: &str = "GRADEBOOKD_LOG";
pub const ENV_TARGET_GRADE: &str = "GRADEBOOKD_TARGET_GRADE";
pub const ENV_FINAL_WEIGHT: &str = "GRADEBOOKD_FINAL_WEIGHT";
pub const ENV_EXTRACT_ATTEMPTS: &str = "GRADEBOOKD_EXTRACT_ATTEMPTS";
pub const ENV_EXTRACT_DELAY_MS: &str = "GRADEBOOKD_EXTRACT_DELAY_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub log_filter: String,
    /// Used by projection requests that omit `targetGrade`.
    pub default_target_grade: String,
    /// Used by projection requests that omit `finalWeight`.
    pub default_final_weight: f64,
    pub retry: RetryPolicy,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            default_target_grade: "A".to_string(),
            default_final_weight: 20.0,
            retry: RetryPolicy::default(),
        }
    }
}

fn parse_var<T>(name: &str, raw: Option<String>) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = raw else {
        return Ok(None);
    };
    let t = raw.trim();
    if t.is_empty() {
        return Ok(None);
    }
    let v = t
        .parse::<T>()
        .with_context(|| format!("invalid {name}: {t:?}"))?;
    Ok(Some(v))
}

impl DaemonConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds a config from an arbitrary variable lookup; unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = DaemonConfig::default();

        if let Some(v) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            cfg.log_filter = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_TARGET_GRADE).filter(|v| !v.trim().is_empty()) {
            cfg.default_target_grade = v.trim().to_string();
        }
        if let Some(w) = parse_var::<f64>(ENV_FINAL_WEIGHT, lookup(ENV_FINAL_WEIGHT))? {
            if !(w > 0.0 && w <= 100.0) {
                anyhow::bail!("{ENV_FINAL_WEIGHT} must be in (0, 100], got {w}");
            }
            cfg.default_final_weight = w;
        }
        if let Some(n) = parse_var::<u32>(ENV_EXTRACT_ATTEMPTS, lookup(ENV_EXTRACT_ATTEMPTS))? {
            if n == 0 {
                anyhow::bail!("{ENV_EXTRACT_ATTEMPTS} must be at least 1");
            }
            cfg.retry.max_attempts = n;
        }
        if let Some(ms) = parse_var::<u64>(ENV_EXTRACT_DELAY_MS, lookup(ENV_EXTRACT_DELAY_MS))? {
            cfg.retry.initial_delay = Duration::from_millis(ms);
        }

        Ok(cfg)
    }
}
