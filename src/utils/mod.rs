use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn format_decimal(value: f64) -> String {
    format!("{:.2}", value)
}

/// Best-effort parse of a settlement posted-date. A trailing `+00:00` offset
/// is stripped before parsing; anything unparseable yields `None` so a bad
/// date never aborts an ingestion run.
pub fn parse_posted_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let trimmed = trimmed.strip_suffix("+00:00").unwrap_or(trimmed);

    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// dd/mm/yyyy display form, applied only at the presentation boundary.
pub fn format_display_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_display_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format("%d/%m/%Y %H:%M:%S").to_string()
}
