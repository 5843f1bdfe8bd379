use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::encoder;
use crate::error::ExportError;
use crate::fetcher::AirDataSource;
use crate::model::TimeWindow;
use crate::publisher::Publisher;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Treat a window with no readings as a failure instead of uploading an empty file.
    pub fail_on_empty: bool,
}

/// A fetched and encoded window that has not been uploaded yet.
#[derive(Debug, Clone)]
pub struct PreparedExport {
    pub window: TimeWindow,
    pub key: String,
    pub rows: usize,
    pub payload: Bytes,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub window: TimeWindow,
    pub key: String,
    pub rows: usize,
    pub location: String,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Saved data for {} to {}", self.window, self.location)
    }
}

/// Computes the window for `trigger`, fetches it and encodes it. Stops at the first error.
pub async fn prepare_export(
    source: &dyn AirDataSource,
    trigger: DateTime<Utc>,
    options: ExportOptions,
) -> Result<PreparedExport, ExportError> {
    let window = TimeWindow::ending_at(trigger);
    let key = window.storage_key();
    info!(%trigger, %window, %key, "time range computed");

    let readings = source.fetch(&window).await?;
    info!(rows = readings.len(), "retrieved readings");

    if readings.is_empty() {
        if options.fail_on_empty {
            return Err(ExportError::EmptyWindow {
                from: window.from(),
                to: window.to(),
            });
        }
        warn!(%window, "no readings returned; exporting an empty file");
    }

    let payload = encoder::encode(&readings)?;

    Ok(PreparedExport {
        window,
        key,
        rows: readings.len(),
        payload,
    })
}

/// Runs one export: window, fetch, encode, publish.
pub async fn run_export(
    source: &dyn AirDataSource,
    publisher: &Publisher,
    trigger: DateTime<Utc>,
    options: ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let PreparedExport {
        window,
        key,
        rows,
        payload,
    } = prepare_export(source, trigger, options).await?;

    let location = publisher.publish(&key, payload).await?;
    info!(%location, rows, "export uploaded");

    Ok(ExportSummary {
        window,
        key,
        rows,
        location,
    })
}
