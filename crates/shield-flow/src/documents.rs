//! # Claim Documents
//!
//! Uploads several files to a filed claim at once.
//!
//! ```text
//! uploads ──► checks (token, names, content) ──► N concurrent requests
//!                                                 (at most max_concurrent)
//!                                                        │
//!                      ┌─────────────────────────────────┼──────────────────┐
//!                      ▼                                 ▼                  ▼
//!               all succeeded                   some succeeded        none succeeded
//!              Ok(documents)             Err(Partial(report))    Err(Total(report))
//! ```
//!
//! A partial failure is not rolled back: documents that made it stay
//! attached to the claim and show up on the next detail fetch. The report
//! says which ones, so a retry only needs to resend the failures.

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use shield_gateway::{AuthToken, ClaimDocument, DocumentUpload, Gateway, GatewayError};

use crate::error::PreconditionError;

/// One document the backend did not accept.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedUpload {
    pub name: String,
    pub error: GatewayError,
}

/// Per-document outcome of a batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadReport {
    pub uploaded: Vec<ClaimDocument>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }
}

/// Why a batch did not fully succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadFailure {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("{} of {} documents failed to upload", .0.failed.len(), .0.total())]
    Partial(UploadReport),

    #[error("Failed to upload documents")]
    Total(UploadReport),
}

impl UploadFailure {
    /// The per-document report, if any request was sent.
    pub fn report(&self) -> Option<&UploadReport> {
        match self {
            UploadFailure::Partial(report) | UploadFailure::Total(report) => Some(report),
            UploadFailure::Precondition(_) => None,
        }
    }
}

/// Uploads every document, at most `max_concurrent` at a time.
///
/// Succeeds only if every document was stored.
pub async fn upload_documents(
    gateway: &dyn Gateway,
    token: Option<&AuthToken>,
    uploads: &[DocumentUpload],
    max_concurrent: usize,
) -> Result<Vec<ClaimDocument>, UploadFailure> {
    check_batch(token, uploads)?;

    let results: Vec<_> = stream::iter(uploads)
        .map(|upload| async move { (upload, gateway.upload_claim_document(token, upload).await) })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let mut report = UploadReport::default();
    for (upload, result) in results {
        match result {
            Ok(document) => report.uploaded.push(document),
            Err(error) => {
                warn!(document = %upload.name, error = %error, "Document upload failed");
                report.failed.push(FailedUpload {
                    name: upload.name.clone(),
                    error,
                });
            }
        }
    }

    info!(
        uploaded = report.uploaded.len(),
        failed = report.failed.len(),
        "Document batch finished"
    );

    if report.failed.is_empty() {
        Ok(report.uploaded)
    } else if report.uploaded.is_empty() {
        Err(UploadFailure::Total(report))
    } else {
        Err(UploadFailure::Partial(report))
    }
}

fn check_batch(
    token: Option<&AuthToken>,
    uploads: &[DocumentUpload],
) -> Result<(), PreconditionError> {
    if token.is_none() {
        return Err(PreconditionError::MissingToken);
    }
    if uploads.is_empty() {
        return Err(PreconditionError::NoDocuments);
    }
    if uploads.iter().any(|u| u.name.trim().is_empty()) {
        return Err(PreconditionError::UnnamedDocument);
    }
    if let Some(empty) = uploads.iter().find(|u| u.content.is_empty()) {
        return Err(PreconditionError::EmptyDocument {
            name: empty.name.clone(),
        });
    }
    Ok(())
}
