//! Bounded capture of a child's output streams.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::OutputStream;

/// Why a capture stopped early.
#[derive(Debug)]
pub(super) enum CaptureFailure {
    /// The stream produced more than the allowed number of bytes.
    Overflow(OutputStream),
    /// Reading the pipe failed.
    Io(std::io::Error),
}

/// Reads `reader` to EOF, failing as soon as it yields more than `limit`
/// bytes. A missing pipe captures nothing.
pub(super) async fn capture_bounded<R>(
    reader: Option<R>,
    stream: OutputStream,
    limit: usize,
) -> Result<Vec<u8>, CaptureFailure>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = reader else {
        return Ok(Vec::new());
    };

    let ceiling = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut buffer = Vec::new();
    pipe.take(ceiling)
        .read_to_end(&mut buffer)
        .await
        .map_err(CaptureFailure::Io)?;

    if buffer.len() > limit {
        return Err(CaptureFailure::Overflow(stream));
    }
    Ok(buffer)
}
