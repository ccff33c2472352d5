/*!
[DataStore] persists raw content blobs keyed by an opaque `data_key`.
[DataHandle] lets a caller take either a full buffer or a byte stream
from a single `get` without redundant reads, following the shape of
`object_store`'s own `GetResult`.
*/

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;

/// Either an in-memory buffer or a single-consumer byte stream.
pub enum DataHandle {
    /// The full blob, already in memory.
    Bytes(Bytes),
    /// A stream of chunks; consumed exactly once.
    Stream(BoxStream<'static, Result<Bytes>>),
}

impl DataHandle {
    /// Buffer the handle into a single contiguous byte vector.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            DataHandle::Bytes(bytes) => Ok(bytes),
            DataHandle::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Wrap an already-buffered blob.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        DataHandle::Bytes(bytes.into())
    }

    /// Wrap a stream of chunks.
    pub fn from_stream(s: BoxStream<'static, Result<Bytes>>) -> Self {
        DataHandle::Stream(s)
    }
}

/// Input accepted by [DataStore::put]: either a full buffer or a stream
/// of chunks, consumed exactly once.
pub enum DataInput {
    /// A full buffer.
    Bytes(Bytes),
    /// A stream of chunks.
    Stream(BoxStream<'static, Result<Bytes>>),
}

impl DataInput {
    /// Buffer this input into a single contiguous byte vector.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            DataInput::Bytes(bytes) => Ok(bytes),
            DataInput::Stream(mut s) => {
                let mut buf = Vec::new();
                while let Some(chunk) = s.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl From<Vec<u8>> for DataInput {
    fn from(value: Vec<u8>) -> Self {
        DataInput::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for DataInput {
    fn from(value: Bytes) -> Self {
        DataInput::Bytes(value)
    }
}

/// A single-chunk stream, useful when a caller has bytes but the
/// receiving API wants the streaming variant.
pub fn single_chunk_stream(bytes: Bytes) -> BoxStream<'static, Result<Bytes>> {
    stream::once(async move { Ok(bytes) }).boxed()
}

/// Storage contract for opaque content blobs.
///
/// `put` is idempotent by key: re-writing the same key with the same
/// bytes is a no-op-equivalent. A backend consumes a streamed input
/// exactly once; callers must not assume multiple consumers of a single
/// input stream.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch a blob by key.
    async fn get(&self, data_key: &str) -> Result<DataHandle>;

    /// Store a blob under `data_key`.
    async fn put(&self, data_key: &str, input: DataInput) -> Result<()>;

    /// Delete a blob by key. Idempotent.
    async fn delete(&self, data_key: &str) -> Result<()>;

    /// True if a blob exists under `data_key`.
    async fn exists(&self, data_key: &str) -> Result<bool>;
}
