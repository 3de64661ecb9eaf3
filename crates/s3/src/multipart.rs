//! Multipart upload support
//!
//! Streams a large file to S3 in fixed-size parts with a bounded number of
//! parts in flight. A failed upload is aborted so no orphaned parts remain.

use std::sync::Arc;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tokio::io::AsyncReadExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use fs3_core::{Error, Result, StreamedUpload};

use crate::client::map_sdk_error;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: u64 = 10_000;

/// Part size actually used for a file
///
/// Starts from the requested size, clamps it to S3's limits and grows it when
/// the file would otherwise need more than 10,000 parts.
pub fn effective_part_size(file_size: u64, requested: u64) -> u64 {
    let part_size = requested.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
    if file_size.div_ceil(part_size) <= MAX_PARTS {
        part_size
    } else {
        file_size
            .div_ceil(MAX_PARTS)
            .clamp(MIN_PART_SIZE, MAX_PART_SIZE)
    }
}

/// Calculate number of parts for a file
pub fn calculate_parts(file_size: u64, part_size: u64) -> u64 {
    file_size.div_ceil(part_size).max(1)
}

/// Upload `file` to `bucket/key` as a multipart upload
pub async fn upload(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    file: tokio::fs::File,
    size: u64,
    options: StreamedUpload,
) -> Result<()> {
    let part_size = effective_part_size(size, options.part_size);

    let created = client
        .create_multipart_upload()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, key))?;
    let upload_id = created
        .upload_id()
        .ok_or_else(|| Error::Network("S3 returned no upload id".into()))?
        .to_string();

    tracing::debug!(
        key,
        size,
        part_size,
        parts = calculate_parts(size, part_size),
        concurrency = options.max_concurrent_parts,
        "Started multipart upload"
    );

    let uploaded = upload_parts(
        client,
        bucket,
        key,
        &upload_id,
        file,
        part_size,
        options.max_concurrent_parts.max(1),
    )
    .await;

    let result = match uploaded {
        Ok(parts) => {
            client
                .complete_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(parts))
                        .build(),
                )
                .send()
                .await
                .map(|_| ())
                .map_err(|e| map_sdk_error(e, key))
        }
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        tracing::debug!(key, error = %e, "Aborting multipart upload");
        if let Err(abort_err) = client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(&upload_id)
            .send()
            .await
        {
            tracing::warn!(
                key,
                upload_id,
                error = %map_sdk_error(abort_err, key),
                "Failed to abort multipart upload"
            );
        }
    }

    result
}

async fn upload_parts(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
    mut file: tokio::fs::File,
    part_size: u64,
    concurrency: usize,
) -> Result<Vec<CompletedPart>> {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks: JoinSet<Result<CompletedPart>> = JoinSet::new();
    let mut parts = Vec::new();
    let mut part_number: i32 = 1;

    loop {
        // Acquire before reading so at most `concurrency` parts sit in memory
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::General(e.to_string()))?;

        let chunk = read_part(&mut file, part_size as usize).await?;
        if chunk.is_empty() && part_number > 1 {
            break;
        }
        let last = (chunk.len() as u64) < part_size;

        let client = client.clone();
        let bucket = bucket.to_string();
        let key = key.to_string();
        let upload_id = upload_id.to_string();
        let number = part_number;

        tasks.spawn(async move {
            let _permit = permit;
            let output = client
                .upload_part()
                .bucket(&bucket)
                .key(&key)
                .upload_id(upload_id)
                .part_number(number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &key))?;

            let etag = output
                .e_tag()
                .ok_or_else(|| Error::Network(format!("No ETag for part {number}")))?;
            Ok(CompletedPart::builder()
                .e_tag(etag)
                .part_number(number)
                .build())
        });

        part_number += 1;
        if last {
            break;
        }

        // Surface failures early instead of reading the rest of the file
        while let Some(done) = tasks.try_join_next() {
            match flatten(done) {
                Ok(part) => parts.push(part),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }
    }

    while let Some(done) = tasks.join_next().await {
        match flatten(done) {
            Ok(part) => parts.push(part),
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    parts.sort_by_key(|p| p.part_number());
    Ok(parts)
}

fn flatten(
    joined: std::result::Result<Result<CompletedPart>, tokio::task::JoinError>,
) -> Result<CompletedPart> {
    joined.map_err(|e| Error::General(format!("part upload task failed: {e}")))?
}

/// Fill a buffer of up to `len` bytes, short only at end of file
async fn read_part(file: &mut tokio::fs::File, len: usize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let n = file.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buffer.truncate(filled);
    Ok(buffer)
}
