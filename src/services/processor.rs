use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::db::Database;
use crate::models::SettlementUpload;
use crate::services::ingest;
use crate::utils::{now_utc, sha256_file};

/// Result of processing one settlement file.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub record_count: usize,
    /// True when the file was already ingested (matched by content hash).
    pub skipped: bool,
}

/// Ingest one settlement file for a brand: hash, dedupe, parse, persist the
/// whole batch in one commit, and log the run. A parse failure persists
/// nothing except a failed log row.
pub fn process_settlement_file(db: &mut Database, path: &Path, brand: &str) -> Result<UploadOutcome> {
    let file_path = path.to_string_lossy().to_string();
    let file_hash = sha256_file(path)?;

    if let Some(existing) = db.find_upload_by_hash(&file_hash)? {
        info!(path = %file_path, "settlement file already ingested, skipping");
        return Ok(UploadOutcome {
            record_count: existing.record_count as usize,
            skipped: true,
        });
    }

    let bytes = std::fs::read(path).with_context(|| format!("read settlement file {}", file_path))?;

    match ingest::parse_settlement_bytes(&bytes, brand) {
        Ok((records, count)) => {
            let upload = SettlementUpload {
                id: uuid::Uuid::new_v4().to_string(),
                file_hash: file_hash.clone(),
                file_path: Some(file_path.clone()),
                brand: brand.to_string(),
                record_count: count as i64,
                created_at: now_utc(),
            };
            db.commit_upload(&upload, &records)
                .context("persist settlement batch")?;
            db.log_ingestion(Some(&upload.id), Some(&file_hash), brand, "success", None)?;
            info!(path = %file_path, brand, count, "settlement file ingested");
            Ok(UploadOutcome {
                record_count: count,
                skipped: false,
            })
        }
        Err(err) => {
            db.log_ingestion(None, Some(&file_hash), brand, "failed", Some(&err.to_string()))?;
            warn!(path = %file_path, brand, error = %err, "settlement ingestion failed");
            Err(err.into())
        }
    }
}
