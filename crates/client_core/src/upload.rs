use std::{path::Path, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use shared::{
    domain::{MediaId, UploadId},
    protocol::{
        AppendPartRequest, CompleteUploadRequest, CompletedPart, InitUploadRequest,
        InitUploadResponse, PartAck,
    },
};

use crate::{error::UploadError, transport::RemoteService};

pub const CHUNK_SIZE: usize = 5 * 1024 * 1024;

const UPLOADS_COLLECTION: &str = "uploads";

/// Open multipart transfer. Parts are appended strictly in order starting at
/// 1; recording an ack for an already-acked part number replaces the earlier
/// tag, so retrying a part is safe.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub upload_id: UploadId,
    /// Canonical object key; the server may rewrite the requested hint.
    pub key: String,
    pub content_type: String,
    parts: Vec<CompletedPart>,
}

impl UploadSession {
    pub fn parts(&self) -> &[CompletedPart] {
        &self.parts
    }

    fn record_part(&mut self, part_number: u32, e_tag: String) {
        if let Some(existing) = self
            .parts
            .iter_mut()
            .find(|part| part.part_number == part_number)
        {
            existing.e_tag = e_tag;
        } else {
            self.parts.push(CompletedPart { e_tag, part_number });
        }
    }

    fn parts_are_contiguous(&self) -> bool {
        !self.parts.is_empty()
            && self
                .parts
                .iter()
                .enumerate()
                .all(|(i, part)| part.part_number == i as u32 + 1)
    }
}

/// Moves a local file to remote storage one fixed-size chunk at a time and
/// finalizes it into a permanent media reference. Chunks are strictly
/// sequential; peak memory is one chunk's worth of bytes.
pub struct MultipartUploader {
    service: Arc<dyn RemoteService>,
    cancel: CancellationToken,
}

impl MultipartUploader {
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        Self {
            service,
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn initiate(
        &self,
        key_hint: &str,
        content_type: &str,
    ) -> Result<UploadSession, UploadError> {
        let payload = serde_json::to_value(InitUploadRequest {
            key: key_hint.to_string(),
            content_type: content_type.to_string(),
        })
        .map_err(|err| {
            UploadError::Init(crate::error::RemoteError::Network(format!(
                "unserializable init request: {err}"
            )))
        })?;

        let response = self
            .service
            .create(UPLOADS_COLLECTION, payload)
            .await
            .map_err(UploadError::Init)?;
        let init: InitUploadResponse = serde_json::from_value(response)
            .map_err(|err| UploadError::Init(crate::error::RemoteError::Network(format!(
                "invalid init response: {err}"
            ))))?;

        debug!(upload_id = %init.upload_id, key = %init.key, "upload session opened");
        Ok(UploadSession {
            upload_id: init.upload_id,
            key: init.key,
            content_type: content_type.to_string(),
            parts: Vec::new(),
        })
    }

    /// Uploads one byte range as part `part_number`. Callers drive part
    /// numbers from 1 upward by exactly 1; a retry of the same part number
    /// overwrites the recorded tag.
    pub async fn append_chunk(
        &self,
        session: &mut UploadSession,
        part_number: u32,
        bytes: &[u8],
    ) -> Result<PartAck, UploadError> {
        let payload = serde_json::to_value(AppendPartRequest {
            part_number,
            upload_id: session.upload_id.clone(),
            key: session.key.clone(),
            content: STANDARD.encode(bytes),
        })
        .map_err(|err| UploadError::Chunk {
            part_number,
            source: crate::error::RemoteError::Network(format!(
                "unserializable part request: {err}"
            )),
        })?;

        let response = self
            .service
            .patch(UPLOADS_COLLECTION, None, payload)
            .await
            .map_err(|source| UploadError::Chunk {
                part_number,
                source,
            })?;
        let ack: PartAck = serde_json::from_value(response).map_err(|err| UploadError::Chunk {
            part_number,
            source: crate::error::RemoteError::Network(format!("invalid part ack: {err}")),
        })?;

        session.record_part(part_number, ack.e_tag.clone());
        Ok(ack)
    }

    /// Finalizes the transfer. The parts ledger must cover 1..=N
    /// contiguously; the server rejects anything else, so the gap is caught
    /// client-side first.
    pub async fn complete(&self, session: &UploadSession) -> Result<MediaId, UploadError> {
        if !session.parts_are_contiguous() {
            return Err(UploadError::NonContiguousParts);
        }

        let payload = serde_json::to_value(CompleteUploadRequest {
            upload_id: session.upload_id.clone(),
            key: session.key.clone(),
            parts: session.parts.clone(),
            file_type: session.content_type.clone(),
        })
        .map_err(|err| {
            UploadError::Finalize(crate::error::RemoteError::Network(format!(
                "unserializable completion request: {err}"
            )))
        })?;

        let response = self
            .service
            .update(UPLOADS_COLLECTION, None, payload)
            .await
            .map_err(UploadError::Finalize)?;

        let media_id = decode_media_id(response).ok_or_else(|| {
            UploadError::Finalize(crate::error::RemoteError::Network(
                "finalize response carried no media id".to_string(),
            ))
        })?;
        info!(key = %session.key, media = %media_id, "upload finalized");
        Ok(media_id)
    }

    /// Full pipeline for one file: init, sequential chunk appends with
    /// progress reporting, finalize. A failed chunk aborts the whole upload;
    /// there is no partial resume.
    pub async fn upload_file(
        &self,
        path: &Path,
        mut progress: Option<&mut (dyn FnMut(u8) + Send)>,
    ) -> Result<MediaId, UploadError> {
        let metadata = tokio::fs::metadata(path).await?;
        let file_size = metadata.len();
        if file_size == 0 {
            return Err(UploadError::EmptyFile);
        }

        let (content_type, extension) = content_type_for(path);
        let key_hint = hashed_object_key(path, extension);
        let mut session = self.initiate(&key_hint, content_type).await?;

        let total_chunks = file_size.div_ceil(CHUNK_SIZE as u64);
        let mut file = tokio::fs::File::open(path).await?;
        let mut remaining = file_size;

        for index in 0..total_chunks {
            if self.cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            let chunk_len = remaining.min(CHUNK_SIZE as u64) as usize;
            let mut chunk = vec![0u8; chunk_len];
            file.read_exact(&mut chunk).await?;
            remaining -= chunk_len as u64;

            let part_number = index as u32 + 1;
            self.append_chunk(&mut session, part_number, &chunk).await?;
            if let Some(report) = progress.as_deref_mut() {
                report(percent_done(part_number, total_chunks));
            }
        }

        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        self.complete(&session).await
    }
}

fn percent_done(part_number: u32, total_chunks: u64) -> u8 {
    ((part_number as f64 / total_chunks as f64) * 100.0).round() as u8
}

fn decode_media_id(response: Value) -> Option<MediaId> {
    match response {
        Value::String(id) => Some(MediaId(id)),
        Value::Object(map) => map
            .get("_id")
            .and_then(Value::as_str)
            .map(|id| MediaId(id.to_string())),
        _ => None,
    }
}

/// Content type and canonical extension from the source file suffix;
/// unknown suffixes fall back to jpeg.
pub fn content_type_for(path: &Path) -> (&'static str, &'static str) {
    let suffix = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match suffix.as_deref() {
        Some("jpg") | Some("jpeg") => ("image/jpeg", "jpg"),
        Some("png") => ("image/png", "png"),
        Some("webp") => ("image/webp", "webp"),
        Some("heic") => ("image/heic", "heic"),
        _ => ("image/jpeg", "jpg"),
    }
}

/// Collision-resistant object key: digest over the source name, the clock
/// and a random salt, truncated for readability.
fn hashed_object_key(path: &Path, extension: &str) -> String {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let digest = Sha256::digest(format!("{name}-{now}-{salt}").as_bytes());
    let hex: String = digest
        .iter()
        .take(8)
        .map(|byte| format!("{byte:02x}"))
        .collect();
    format!("{hex}-{}.{extension}", &salt[..8])
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
