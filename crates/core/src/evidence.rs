//! Evidence file intake: size and type filtering before files join the
//! draft.
//!
//! A file is either accepted whole or rejected with a reason; nothing is
//! ever partially added.

use serde::{Deserialize, Serialize};

use crate::draft::{EvidenceFile, EvidenceSource};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum evidence file size (5 MiB).
pub const MAX_EVIDENCE_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types accepted as evidence.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "application/pdf"];

/// Extension → MIME type fallback used when the browser sends no type.
const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("zip", "application/zip"),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A file offered for upload, before filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    pub file_name: String,
    /// MIME type reported by the picker, if any.
    pub mime_type: Option<String>,
    pub size_bytes: u64,
    pub source: EvidenceSource,
}

/// Why a candidate was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("file is {size_bytes} bytes; the limit is {limit} bytes", limit = MAX_EVIDENCE_BYTES)]
    TooLarge { size_bytes: u64 },

    #[error("type '{mime_type}' is not allowed; use JPEG, PNG, GIF or PDF")]
    UnsupportedType { mime_type: String },

    #[error("file is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedFile {
    pub file_name: String,
    pub reason: RejectionReason,
}

/// Result of running a batch of candidates through the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeReport {
    pub accepted: Vec<EvidenceFile>,
    pub rejected: Vec<RejectedFile>,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Resolve the MIME type of a candidate, falling back to its extension.
pub fn resolve_mime_type(file_name: &str, reported: Option<&str>) -> String {
    if let Some(mime) = reported.map(str::trim).filter(|m| !m.is_empty()) {
        return mime.to_ascii_lowercase();
    }
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    EXTENSION_MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| mime.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Check one file's type and size.
pub fn check_file(mime_type: &str, size_bytes: u64) -> Result<(), RejectionReason> {
    if size_bytes == 0 {
        return Err(RejectionReason::Empty);
    }
    if size_bytes > MAX_EVIDENCE_BYTES {
        return Err(RejectionReason::TooLarge { size_bytes });
    }
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(RejectionReason::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }
    Ok(())
}

/// Split candidates into accepted evidence files and rejections, keeping
/// input order within each list.
pub fn intake(candidates: Vec<CandidateFile>) -> IntakeReport {
    let mut report = IntakeReport::default();
    for candidate in candidates {
        let mime_type = resolve_mime_type(&candidate.file_name, candidate.mime_type.as_deref());
        match check_file(&mime_type, candidate.size_bytes) {
            Ok(()) => report.accepted.push(EvidenceFile {
                file_name: candidate.file_name,
                mime_type,
                size_bytes: candidate.size_bytes,
                source: candidate.source,
            }),
            Err(reason) => report.rejected.push(RejectedFile {
                file_name: candidate.file_name,
                reason,
            }),
        }
    }
    report
}
