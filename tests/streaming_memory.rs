use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use blob_transfer::{
    BlobConfig, BlobError, BlobId, BlobInfo, BlobResult, BlobStreamer, BlobTransport,
    ChunkedTransport, MemoryStore, TempChunkStorage, WriteToken,
};

/// Call log shared between a test and its recording transport
#[derive(Default)]
struct CallLog {
    write_sizes: Mutex<Vec<usize>>,
    /// (offset, requested, returned) per read_chunk call
    reads: Mutex<Vec<(u64, usize, usize)>>,
    begin_reads: Mutex<usize>,
    end_reads: Mutex<usize>,
}

impl CallLog {
    fn write_sizes(&self) -> Vec<usize> {
        self.write_sizes.lock().unwrap().clone()
    }

    fn reads(&self) -> Vec<(u64, usize, usize)> {
        self.reads.lock().unwrap().clone()
    }

    fn begin_reads(&self) -> usize {
        *self.begin_reads.lock().unwrap()
    }

    fn end_reads(&self) -> usize {
        *self.end_reads.lock().unwrap()
    }
}

/// Transport wrapper recording every call that reaches the backend
struct RecordingTransport<T> {
    inner: T,
    calls: Arc<CallLog>,
}

#[async_trait]
impl<T: BlobTransport> BlobTransport for RecordingTransport<T> {
    async fn begin_write(&self, blob: &BlobInfo) -> BlobResult<WriteToken> {
        self.inner.begin_write(blob).await
    }

    async fn write_chunk(&self, token: WriteToken, chunk: Bytes) -> BlobResult<WriteToken> {
        self.calls.write_sizes.lock().unwrap().push(chunk.len());
        self.inner.write_chunk(token, chunk).await
    }

    async fn end_write(&self, token: WriteToken, chunk: Bytes) -> BlobResult<BlobInfo> {
        self.inner.end_write(token, chunk).await
    }

    async fn abort_write(&self, token: WriteToken) -> BlobResult<()> {
        self.inner.abort_write(token).await
    }

    async fn begin_read(&self, id: &BlobId) -> BlobResult<BlobInfo> {
        *self.calls.begin_reads.lock().unwrap() += 1;
        self.inner.begin_read(id).await
    }

    async fn read_chunk(&self, id: &BlobId, offset: u64, max_bytes: usize) -> BlobResult<Bytes> {
        let chunk = self.inner.read_chunk(id, offset, max_bytes).await?;
        self.calls
            .reads
            .lock()
            .unwrap()
            .push((offset, max_bytes, chunk.len()));
        Ok(chunk)
    }

    async fn end_read(&self, id: &BlobId) -> BlobResult<()> {
        *self.calls.end_reads.lock().unwrap() += 1;
        self.inner.end_read(id).await
    }
}

struct TestRig {
    streamer: BlobStreamer,
    store: MemoryStore,
    calls: Arc<CallLog>,
    _dir: tempfile::TempDir,
}

fn test_config(dir: &tempfile::TempDir, chunk_size: usize, min_chunk_size: u64) -> BlobConfig {
    BlobConfig::default()
        .with_temp_path(dir.path())
        .with_chunk_size(chunk_size)
        .with_min_chunk_size(min_chunk_size)
}

fn test_rig(chunk_size: usize, min_chunk_size: u64) -> TestRig {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, chunk_size, min_chunk_size);
    let store = MemoryStore::new();
    let temp = Arc::new(TempChunkStorage::new(&config));
    let calls = Arc::new(CallLog::default());
    let transport = RecordingTransport {
        inner: ChunkedTransport::new(store.clone(), temp, config.clone()),
        calls: calls.clone(),
    };

    TestRig {
        streamer: BlobStreamer::new(transport, &config),
        store,
        calls,
        _dir: dir,
    }
}

/// Attach a second streamer with its own chunk size and call log to an
/// existing store
fn attach_reader(rig: &TestRig, chunk_size: usize) -> (BlobStreamer, Arc<CallLog>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, chunk_size, 5 * 1024 * 1024);
    let temp = Arc::new(TempChunkStorage::new(&config));
    let calls = Arc::new(CallLog::default());
    let transport = RecordingTransport {
        inner: ChunkedTransport::new(rig.store.clone(), temp, config.clone()),
        calls: calls.clone(),
    };
    (BlobStreamer::new(transport, &config), calls, dir)
}

fn test_blob(name: &str) -> BlobInfo {
    BlobInfo::new("test")
        .with_name(name)
        .with_content_type("application/binary")
}

/// P1. Round-trip reproduces exact bytes for length 0
#[tokio::test]
async fn round_trip_empty_blob() {
    let rig = test_rig(1024, 2048);

    let info = rig
        .streamer
        .create_from_data(test_blob("empty.dat"), b"")
        .await
        .unwrap();
    assert_eq!(info.size, 0);
    assert!(info.completed);
    assert!(rig.calls.write_sizes().is_empty());

    let data = rig.streamer.read_data(&info.id).await.unwrap();
    assert!(data.is_empty());
    assert_eq!(rig.calls.end_reads(), 1);
}

/// P1. Round-trip reproduces exact bytes for length 1
#[tokio::test]
async fn round_trip_single_byte() {
    let rig = test_rig(1024, 2048);

    let info = rig
        .streamer
        .create_from_data(test_blob("one.dat"), b"x")
        .await
        .unwrap();
    assert_eq!(info.size, 1);

    assert_eq!(rig.streamer.read_data(&info.id).await.unwrap(), b"x");
}

/// P1. Round-trip reproduces exact bytes for length > 3 x chunk size,
/// crossing the aggregation threshold several times
#[tokio::test]
async fn round_trip_large_blob() {
    let rig = test_rig(1024, 2048);
    let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

    let info = rig
        .streamer
        .create_from_stream(test_blob("large.dat"), &mut Cursor::new(data.clone()))
        .await
        .unwrap();

    assert_eq!(info.size, 5000);
    // Full chunks of chunk_size, then the remainder
    assert_eq!(rig.calls.write_sizes(), vec![1024, 1024, 1024, 1024, 904]);

    let read_back = rig.streamer.read_data(&info.id).await.unwrap();
    assert_eq!(read_back, data);
}

/// P2. Token gains exactly one field per confirmed part and existing
/// fields never change
#[tokio::test]
async fn token_monotonicity() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 1024, 10);
    let temp = Arc::new(TempChunkStorage::new(&config));
    let transport = ChunkedTransport::new(MemoryStore::new(), temp, config);

    let blob = test_blob("tokens.dat");
    let token = transport.begin_write(&blob).await.unwrap();
    assert_eq!(token.part_count(), 0);
    let initial = token.encode();

    // Below threshold: buffered, no part confirmed
    let token = transport
        .write_chunk(token, Bytes::from_static(b"1234"))
        .await
        .unwrap();
    assert_eq!(token.part_count(), 0);
    assert_eq!(token.encode(), initial);

    // Crossing the threshold confirms one part
    let token = transport
        .write_chunk(token, Bytes::from_static(b"567890"))
        .await
        .unwrap();
    assert_eq!(token.part_count(), 1);
    assert!(token.encode().starts_with(&initial));
    let after_first = token.encode();

    // A second crossing appends, never rewrites
    let token = transport
        .write_chunk(token, Bytes::from_static(b"abcdefghij"))
        .await
        .unwrap();
    assert_eq!(token.part_count(), 2);
    assert!(token.encode().starts_with(&after_first));
}

/// P7. Writing 6 bytes with chunk size 3 issues exactly two write calls
/// of 3 bytes; reading with chunk size 4 returns 4 then 2 bytes and the
/// short read terminates the loop
#[tokio::test]
async fn six_byte_scenario() {
    let rig = test_rig(3, 1);
    let data = [1u8, 2, 3, 4, 5, 6];

    let info = rig
        .streamer
        .create_from_stream(test_blob("six.dat"), &mut Cursor::new(data.to_vec()))
        .await
        .unwrap();
    assert_eq!(rig.calls.write_sizes(), vec![3, 3]);
    assert_eq!(info.size, 6);

    let (reader, read_calls, _dir) = attach_reader(&rig, 4);
    let mut out = Cursor::new(Vec::new());
    reader.read_into_stream(&info.id, &mut out).await.unwrap();

    assert_eq!(out.into_inner(), data);
    assert_eq!(read_calls.reads(), vec![(0, 4, 4), (4, 4, 2)]);
    assert_eq!(read_calls.end_reads(), 1);
}

/// P6. A blob whose size is an exact multiple of the chunk size takes one
/// extra empty read to confirm end-of-data, and no read is ever issued
/// past a short or empty one
#[tokio::test]
async fn read_exact_multiple_confirms_end_of_data() {
    let rig = test_rig(4, 1);
    let data = *b"12345678";

    let info = rig
        .streamer
        .create_from_data(test_blob("eight.dat"), &data)
        .await
        .unwrap();

    let (reader, read_calls, _dir) = attach_reader(&rig, 4);
    let read_back = reader.read_data(&info.id).await.unwrap();

    assert_eq!(read_back, data);
    assert_eq!(read_calls.reads(), vec![(0, 4, 4), (4, 4, 4), (8, 4, 0)]);
}

/// P8. Reading an id that was never written fails with NotFound before
/// any read_chunk or end_read call
#[tokio::test]
async fn begin_read_unknown_id_is_not_found() {
    let rig = test_rig(1024, 2048);
    let mut out = Cursor::new(Vec::new());

    let err = rig
        .streamer
        .read_into_stream(&BlobId::from("never-written"), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, BlobError::NotFound { .. }));
    assert_eq!(rig.calls.begin_reads(), 1);
    assert!(rig.calls.reads().is_empty());
    assert_eq!(rig.calls.end_reads(), 0);
}

/// end_read is issued even when draining fails partway through
#[tokio::test]
async fn end_read_follows_failed_drain() {
    struct FailingReads {
        inner: ChunkedTransport<MemoryStore>,
        calls: Arc<CallLog>,
    }

    #[async_trait]
    impl BlobTransport for FailingReads {
        async fn begin_write(&self, blob: &BlobInfo) -> BlobResult<WriteToken> {
            self.inner.begin_write(blob).await
        }

        async fn write_chunk(&self, token: WriteToken, chunk: Bytes) -> BlobResult<WriteToken> {
            self.inner.write_chunk(token, chunk).await
        }

        async fn end_write(&self, token: WriteToken, chunk: Bytes) -> BlobResult<BlobInfo> {
            self.inner.end_write(token, chunk).await
        }

        async fn abort_write(&self, token: WriteToken) -> BlobResult<()> {
            self.inner.abort_write(token).await
        }

        async fn begin_read(&self, id: &BlobId) -> BlobResult<BlobInfo> {
            self.inner.begin_read(id).await
        }

        async fn read_chunk(&self, _id: &BlobId, offset: u64, _max: usize) -> BlobResult<Bytes> {
            Err(BlobError::backend(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("link dropped at offset {}", offset),
            )))
        }

        async fn end_read(&self, id: &BlobId) -> BlobResult<()> {
            *self.calls.end_reads.lock().unwrap() += 1;
            self.inner.end_read(id).await
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 4, 1);
    let temp = Arc::new(TempChunkStorage::new(&config));
    let store = MemoryStore::new();
    let writer = BlobStreamer::new(
        ChunkedTransport::new(store.clone(), temp.clone(), config.clone()),
        &config,
    );
    let info = writer
        .create_from_data(test_blob("flaky.dat"), b"payload")
        .await
        .unwrap();

    let calls = Arc::new(CallLog::default());
    let reader = BlobStreamer::new(
        FailingReads {
            inner: ChunkedTransport::new(store, temp, config.clone()),
            calls: calls.clone(),
        },
        &config,
    );

    let mut out = Cursor::new(Vec::new());
    let err = reader.read_into_stream(&info.id, &mut out).await.unwrap_err();

    assert!(matches!(err, BlobError::Backend { .. }));
    assert_eq!(calls.end_reads(), 1);
}

/// Descriptor metadata survives the write and the backend reports the
/// authoritative size
#[tokio::test]
async fn descriptor_round_trip() {
    let rig = test_rig(1024, 2048);

    let blob = BlobInfo::new("docs")
        .with_name("report.pdf")
        .with_content_type("application/pdf")
        .with_size(11);
    let id = blob.id.clone();

    let info = rig
        .streamer
        .create_from_data(blob, b"hello world")
        .await
        .unwrap();

    assert_eq!(info.id, id);
    assert_eq!(info.group, "docs");
    assert_eq!(info.name.as_deref(), Some("report.pdf"));
    assert_eq!(info.content_type, "application/pdf");
    assert_eq!(info.size, 11);
    assert!(info.completed);
}

/// Concurrent transfers of distinct blob ids do not interfere
#[tokio::test]
async fn concurrent_sessions_across_blob_ids() {
    let rig = test_rig(64, 128);
    let streamer = Arc::new(rig.streamer);

    let mut handles = Vec::new();
    for index in 0..8u8 {
        let streamer = streamer.clone();
        handles.push(tokio::spawn(async move {
            let data = vec![index; 300];
            let info = streamer
                .create_from_data(test_blob(&format!("file-{}.dat", index)), &data)
                .await
                .unwrap();
            let read_back = streamer.read_data(&info.id).await.unwrap();
            assert_eq!(read_back, data);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}
