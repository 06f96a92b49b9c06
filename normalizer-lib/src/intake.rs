use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::IngestError;

/// Pull an upload into memory, `chunk_size` bytes at a time.
///
/// The running total is checked before each chunk is kept, so the buffer
/// never holds more than `max_file_size` bytes; the first chunk that would
/// cross the limit aborts with `PayloadTooLarge` and the partial buffer is
/// dropped.
pub async fn read_chunked<R>(
    mut reader: R,
    chunk_size: usize,
    max_file_size: u64,
) -> Result<Vec<u8>, IngestError>
where
    R: AsyncRead + Unpin,
{
    let mut contents = Vec::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        let read = reader.read(&mut chunk).await.map_err(IngestError::Intake)?;
        if read == 0 {
            break;
        }

        let total = contents.len() as u64 + read as u64;
        if total > max_file_size {
            return Err(IngestError::PayloadTooLarge {
                limit: max_file_size,
            });
        }
        contents.extend_from_slice(&chunk[..read]);
    }

    Ok(contents)
}
