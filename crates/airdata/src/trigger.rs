use std::fs;
use std::io::Read;
use std::path::Path;

use airdata_core::TriggerEvent;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Resolves the trigger instant: explicit time, then scheduler event, then the clock.
pub fn resolve(
    time: Option<DateTime<Utc>>,
    event: Option<&Path>,
    now: impl FnOnce() -> DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if let Some(time) = time {
        return Ok(time);
    }
    match event {
        Some(path) => read_event(path).map(|event| event.time),
        None => Ok(now()),
    }
}

/// Reads a scheduler event from `path`, or from stdin when `path` is `-`.
pub fn read_event(path: &Path) -> Result<TriggerEvent> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read trigger event from stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read trigger event {}", path.display()))?
    };
    parse_event(&raw)
}

pub fn parse_event(raw: &str) -> Result<TriggerEvent> {
    serde_json::from_str(raw).context("trigger event must be JSON like {\"time\": \"<RFC 3339>\"}")
}
