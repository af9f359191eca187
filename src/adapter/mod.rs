//! Async edges for callers that compose verification into futures.

use crate::failure::{Failure, Result};
use crate::value::Value;
use crate::verify;
use futures::future::{self, Ready};
use futures::{Stream, StreamExt};
use std::io;

/// [`verify::verify_equal`] as an already-completed future.
pub fn verify_equal_async(existing: &Value, new: &Value) -> Ready<Result<Value>> {
    future::ready(verify::verify_equal(existing, new))
}

/// A future that is already resolved with `result`.
pub fn defer<T>(result: T) -> Ready<T> {
    future::ready(result)
}

/// Drain a stream of byte chunks into one string. Chunks are joined before
/// decoding so multi-byte characters may straddle chunk boundaries.
pub async fn stream_to_string<S, B>(stream: S) -> Result<String>
where
    S: Stream<Item = io::Result<B>>,
    B: AsRef<[u8]>,
{
    let mut bytes = Vec::new();
    let mut chunks = 0usize;
    let mut stream = std::pin::pin!(stream);
    while let Some(chunk) = stream.next().await {
        bytes.extend_from_slice(chunk?.as_ref());
        chunks += 1;
    }
    tracing::trace!(chunks, bytes = bytes.len(), "stream drained");

    String::from_utf8(bytes).map_err(|error| Failure::Validation {
        message: format!("stream is not valid UTF-8: {error}"),
    })
}
