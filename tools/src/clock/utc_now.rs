//! clock.utc_now — current date and time in UTC

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::schema;

/// Takes no arguments; anything the runtime sends is parsed and ignored.
pub fn execute(input: &[u8]) -> Result<String> {
    let _args = schema::parse_input(input)?;
    Ok(format_utc_time(Utc::now()))
}

pub fn format_utc_time(now: DateTime<Utc>) -> String {
    format!(
        "current UTC time is {}",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}
