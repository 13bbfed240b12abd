use std::sync::atomic::{AtomicI16, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

use super::ProgressFn;

const CHUNK_SIZE: usize = 64 * 1024;

/// `round(sent / total * 100)`, clamped to `[0, 100]`. Zero total reports 100.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Counts bytes handed to the request body and forwards percentages to a sink.
///
/// Emission is monotonic: a percentage is only forwarded when it is strictly greater
/// than the last one emitted, so the sink never sees a value go backwards.
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Inner>,
}

struct Inner {
    total: u64,
    sent: AtomicU64,
    last: AtomicI16,
    sink: ProgressFn,
}

impl ProgressTracker {
    /// Returns `None` when the total is unknown (zero), in which case no events are emitted.
    pub fn new(total: u64, sink: ProgressFn) -> Option<Self> {
        if total == 0 {
            return None;
        }
        Some(Self {
            inner: Arc::new(Inner {
                total,
                sent: AtomicU64::new(0),
                last: AtomicI16::new(-1),
                sink,
            }),
        })
    }

    pub fn advance(&self, n: u64) {
        let sent = self.inner.sent.fetch_add(n, Ordering::SeqCst) + n;
        let pct = percent_of(sent.min(self.inner.total), self.inner.total);
        let prev = self.inner.last.fetch_max(pct as i16, Ordering::SeqCst);
        if (pct as i16) > prev {
            (self.inner.sink)(pct);
        }
    }

    /// Wraps a file body as a chunked stream that advances the tracker as the
    /// HTTP client pulls each chunk.
    pub fn instrument(
        &self,
        bytes: Bytes,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
        let tracker = self.clone();
        stream::iter(split_chunks(bytes, CHUNK_SIZE)).map(move |chunk| {
            tracker.advance(chunk.len() as u64);
            Ok::<_, std::io::Error>(chunk)
        })
    }
}

fn split_chunks(bytes: Bytes, size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len() / size + 1);
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + size).min(bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    chunks
}
