use std::io::Write;

use bytes::Bytes;
use csv::{Terminator, WriterBuilder};

use crate::error::EncodeError;
use crate::model::Reading;

/// Timestamp layout understood by the downstream query engine's date parser.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Serializes readings as headerless `timestamp,component,value` rows.
pub fn encode(readings: &[Reading]) -> Result<Bytes, EncodeError> {
    write_readings(readings, Vec::new()).map(Bytes::from)
}

/// Writes the CSV rows for `readings` to `output` and hands the flushed writer back.
pub fn write_readings<W: Write>(readings: &[Reading], output: W) -> Result<W, EncodeError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(output);

    for reading in readings {
        let timestamp = reading.timestamp.format(TIMESTAMP_FORMAT).to_string();
        // f64 Display is the shortest representation that parses back to the same value
        // and never switches to exponent notation.
        let value = reading.value.to_string();
        writer.write_record([timestamp.as_str(), reading.component.as_str(), value.as_str()])?;
    }

    writer
        .into_inner()
        .map_err(|err| EncodeError::Flush(err.into_error()))
}
