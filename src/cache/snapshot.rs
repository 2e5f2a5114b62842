//! Snapshot Module
//!
//! Dumps the whole entry set to a byte sink and restores it from a byte source.
//!
//! A snapshot is a versioned document holding one `{key, value, expires_at}`
//! record per entry. The byte encoding is pluggable through [`SnapshotCodec`];
//! [`JsonCodec`] is the shipped implementation:
//!
//! ```text
//! {"version":1,"entries":[{"key":"x","value":1,"expires_at":1700000000}]}
//! ```
//!
//! JSON carries primitives, sequences, mappings with string keys, records
//! and enums at any nesting depth. Values it cannot carry faithfully are
//! refused with `Encoding` before any byte is written: non-finite floats,
//! non-string map keys, and a `Some` wrapping a value that itself encodes
//! as `null` (such as `Some(None)`).

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::representable;
use crate::cache::{CacheEntry, CacheStore};
use crate::error::{CacheError, Result};

// == Format Constants ==
/// Schema version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

// == Snapshot Documents ==
/// Borrowed view of a store, encoded while the store's shared lock is held.
#[derive(Debug, Serialize)]
pub struct SnapshotRef<'a, V> {
    pub version: u32,
    pub entries: Vec<RecordRef<'a, V>>,
}

/// One borrowed entry record.
#[derive(Debug, Serialize)]
pub struct RecordRef<'a, V> {
    pub key: &'a str,
    pub value: &'a V,
    pub expires_at: i64,
}

/// Owned snapshot as produced by a codec.
#[derive(Debug, Deserialize)]
pub struct Snapshot<V> {
    pub version: u32,
    pub entries: Vec<Record<V>>,
}

/// One owned entry record.
#[derive(Debug, Deserialize)]
pub struct Record<V> {
    pub key: String,
    pub value: V,
    pub expires_at: i64,
}

// == Snapshot Codec ==
/// Byte encoding for snapshot documents.
///
/// Implementations must be lossless for every value they encode, refuse
/// values they cannot represent with `Encoding` before writing, and report
/// other failures as `Decoding` or `Io` errors.
pub trait SnapshotCodec {
    /// Encodes `snapshot` into `sink`.
    fn encode<V: Serialize, W: Write>(&self, snapshot: &SnapshotRef<'_, V>, sink: W)
        -> Result<()>;

    /// Decodes a complete snapshot from `source`.
    fn decode<V: DeserializeOwned, R: Read>(&self, source: R) -> Result<Snapshot<V>>;
}

// == JSON Codec ==
/// Self-describing JSON encoding backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact single-line JSON.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented JSON for human inspection.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl SnapshotCodec for JsonCodec {
    fn encode<V: Serialize, W: Write>(
        &self,
        snapshot: &SnapshotRef<'_, V>,
        mut sink: W,
    ) -> Result<()> {
        for record in &snapshot.entries {
            representable::check(record.value).map_err(|e| {
                CacheError::Encoding(format!("Value for key '{}': {}", record.key, e))
            })?;
        }

        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut sink, snapshot)
        } else {
            serde_json::to_writer(&mut sink, snapshot)
        };
        written.map_err(|e| {
            if e.is_io() {
                CacheError::Io(e.into())
            } else {
                CacheError::Encoding(e.to_string())
            }
        })?;

        sink.flush()?;
        Ok(())
    }

    fn decode<V: DeserializeOwned, R: Read>(&self, source: R) -> Result<Snapshot<V>> {
        // Encoding has no depth limit, so decoding must not impose one
        let mut de = serde_json::Deserializer::from_reader(source);
        de.disable_recursion_limit();

        let snapshot = Snapshot::deserialize(&mut de).map_err(decoding_error)?;
        de.end().map_err(decoding_error)?;
        Ok(snapshot)
    }
}

fn decoding_error(e: serde_json::Error) -> CacheError {
    if e.is_io() {
        CacheError::Io(e.into())
    } else {
        CacheError::Decoding(e.to_string())
    }
}

// == Write Snapshot ==
/// Encodes every entry of `store`, expired or not, into `sink`.
pub fn write_snapshot<V, C, W>(store: &CacheStore<V>, codec: &C, sink: W) -> Result<()>
where
    V: Serialize,
    C: SnapshotCodec,
    W: Write,
{
    let entries = store
        .iter()
        .map(|(key, entry)| RecordRef {
            key: key.as_str(),
            value: entry.value(),
            expires_at: entry.expires_at(),
        })
        .collect();

    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        entries,
    };
    codec.encode(&snapshot, sink)
}

// == Read Snapshot ==
/// Decodes a full snapshot from `source` into a fresh entry map.
///
/// Nothing is returned unless the whole source decoded successfully.
/// Duplicate keys resolve to the last record.
pub fn read_snapshot<V, C, R>(codec: &C, source: R) -> Result<HashMap<String, CacheEntry<V>>>
where
    V: DeserializeOwned,
    C: SnapshotCodec,
    R: Read,
{
    let snapshot: Snapshot<V> = codec.decode(source)?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(CacheError::Decoding(format!(
            "Unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    Ok(snapshot
        .entries
        .into_iter()
        .map(|record| {
            (
                record.key,
                CacheEntry::with_expiry(record.value, record.expires_at),
            )
        })
        .collect())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeMap;
    use std::io::{self, Cursor};

    /// Sink that rejects every write.
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Source that fails on the first read.
    struct BrokenSource;

    impl Read for BrokenSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "source gone"))
        }
    }

    fn dump<V: Serialize>(store: &CacheStore<V>) -> Vec<u8> {
        let mut buf = Vec::new();
        write_snapshot(store, &JsonCodec::new(), &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_round_trip_preserves_expiry() {
        let mut store = CacheStore::new();
        store.set("live".to_string(), vec![1u32, 2, 3], Duration::seconds(60));
        store.set("stale".to_string(), vec![], Duration::seconds(-60));

        let buf = dump(&store);
        let restored: HashMap<String, CacheEntry<Vec<u32>>> =
            read_snapshot(&JsonCodec::new(), Cursor::new(buf)).unwrap();

        assert_eq!(restored.len(), 2);
        for (key, entry) in store.iter() {
            assert_eq!(restored.get(key), Some(entry));
        }
    }

    #[test]
    fn test_round_trip_nested_values() {
        type Nested = BTreeMap<String, (Vec<Option<i64>>, HashMap<String, bool>)>;

        let value: Nested = BTreeMap::from([(
            "outer".to_string(),
            (
                vec![Some(-1), None, Some(i64::MAX)],
                HashMap::from([("flag".to_string(), true)]),
            ),
        )]);

        let mut store = CacheStore::new();
        store.set("n".to_string(), value.clone(), Duration::seconds(5));

        let restored: HashMap<String, CacheEntry<Nested>> =
            read_snapshot(&JsonCodec::pretty(), Cursor::new(dump(&store))).unwrap();
        assert_eq!(restored["n"].value(), &value);
    }

    #[test]
    fn test_empty_store_round_trip() {
        let store: CacheStore<String> = CacheStore::new();
        let restored: HashMap<String, CacheEntry<String>> =
            read_snapshot(&JsonCodec::new(), Cursor::new(dump(&store))).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_document_layout() {
        let mut store = CacheStore::new();
        store.replace_all(HashMap::from([(
            "x".to_string(),
            CacheEntry::with_expiry(1, 1_700_000_000),
        )]));

        let json: serde_json::Value = serde_json::from_slice(&dump(&store)).unwrap();
        assert_eq!(json["version"], SNAPSHOT_VERSION);
        assert_eq!(json["entries"][0]["key"], "x");
        assert_eq!(json["entries"][0]["value"], 1);
        assert_eq!(json["entries"][0]["expires_at"], 1_700_000_000i64);
    }

    #[test]
    fn test_unencodable_value() {
        // JSON object keys must be strings
        let mut store = CacheStore::new();
        store.set(
            "bad".to_string(),
            HashMap::from([(vec![1u8], 1u8)]),
            Duration::seconds(60),
        );

        let mut buf = Vec::new();
        let result = write_snapshot(&store, &JsonCodec::new(), &mut buf);
        assert!(matches!(result, Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let mut store = CacheStore::new();
        store.set("ok".to_string(), 1.5f64, Duration::seconds(60));
        store.set("nan".to_string(), f64::NAN, Duration::seconds(60));

        let mut buf = Vec::new();
        let result = write_snapshot(&store, &JsonCodec::new(), &mut buf);
        assert!(matches!(result, Err(CacheError::Encoding(ref msg)) if msg.contains("nan")));
        assert!(buf.is_empty(), "Nothing is written for a refused snapshot");

        let mut store = CacheStore::new();
        store.set("inf".to_string(), vec![f32::INFINITY], Duration::seconds(60));
        let result = write_snapshot(&store, &JsonCodec::pretty(), Vec::new());
        assert!(matches!(result, Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_nested_option_shapes() {
        let mut store = CacheStore::new();
        store.set("inner_none".to_string(), Some(None::<u8>), Duration::seconds(60));
        let result = write_snapshot(&store, &JsonCodec::new(), Vec::new());
        assert!(matches!(result, Err(CacheError::Encoding(_))));

        let mut store = CacheStore::new();
        store.set("none".to_string(), None, Duration::seconds(60));
        store.set("some".to_string(), Some(Some(1u8)), Duration::seconds(60));

        let restored: HashMap<String, CacheEntry<Option<Option<u8>>>> =
            read_snapshot(&JsonCodec::new(), Cursor::new(dump(&store))).unwrap();
        assert_eq!(restored["none"].value(), &None);
        assert_eq!(restored["some"].value(), &Some(Some(1)));
    }

    #[test]
    fn test_deeply_nested_round_trip() {
        let mut value = serde_json::json!(1);
        for _ in 0..200 {
            value = serde_json::Value::Array(vec![value]);
        }

        let mut store = CacheStore::new();
        store.set("deep".to_string(), value.clone(), Duration::seconds(60));

        let restored: HashMap<String, CacheEntry<serde_json::Value>> =
            read_snapshot(&JsonCodec::new(), Cursor::new(dump(&store))).unwrap();
        assert_eq!(restored["deep"].value(), &value);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let doc = r#"{"version":1,"entries":[]} extra"#;
        let result: Result<HashMap<String, CacheEntry<i32>>> =
            read_snapshot(&JsonCodec::new(), doc.as_bytes());
        assert!(matches!(result, Err(CacheError::Decoding(_))));
    }

    #[test]
    fn test_sink_failure_is_io_error() {
        let mut store = CacheStore::new();
        store.set("k".to_string(), 1, Duration::seconds(60));

        let result = write_snapshot(&store, &JsonCodec::new(), BrokenSink);
        assert!(matches!(result, Err(CacheError::Io(_))));
    }

    #[test]
    fn test_source_failure_is_io_error() {
        let result: Result<HashMap<String, CacheEntry<i32>>> =
            read_snapshot(&JsonCodec::new(), BrokenSource);
        assert!(matches!(result, Err(CacheError::Io(_))));
    }

    #[test]
    fn test_truncated_source() {
        let mut store = CacheStore::new();
        store.set("k".to_string(), "v".to_string(), Duration::seconds(60));
        let mut buf = dump(&store);
        buf.truncate(buf.len() / 2);

        let result: Result<HashMap<String, CacheEntry<String>>> =
            read_snapshot(&JsonCodec::new(), Cursor::new(buf));
        assert!(matches!(result, Err(CacheError::Decoding(_))));
    }

    #[test]
    fn test_malformed_source() {
        let result: Result<HashMap<String, CacheEntry<i32>>> =
            read_snapshot(&JsonCodec::new(), "not json".as_bytes());
        assert!(matches!(result, Err(CacheError::Decoding(_))));

        // Well-formed JSON with the wrong value type
        let doc = r#"{"version":1,"entries":[{"key":"k","value":"text","expires_at":0}]}"#;
        let result: Result<HashMap<String, CacheEntry<i32>>> =
            read_snapshot(&JsonCodec::new(), doc.as_bytes());
        assert!(matches!(result, Err(CacheError::Decoding(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let doc = r#"{"version":99,"entries":[]}"#;
        let result: Result<HashMap<String, CacheEntry<i32>>> =
            read_snapshot(&JsonCodec::new(), doc.as_bytes());
        assert!(matches!(result, Err(CacheError::Decoding(ref msg)) if msg.contains("99")));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let doc = r#"{"version":1,"entries":[
            {"key":"k","value":1,"expires_at":10},
            {"key":"k","value":2,"expires_at":20}
        ]}"#;
        let restored: HashMap<String, CacheEntry<i32>> =
            read_snapshot(&JsonCodec::new(), doc.as_bytes()).unwrap();
        assert_eq!(restored["k"], CacheEntry::with_expiry(2, 20));
    }
}
