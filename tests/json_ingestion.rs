use std::sync::Arc;

use serde_json::json;

use blob_importer::blob::InMemoryStorage;
use blob_importer::config::ImportConfig;
use blob_importer::ingestion::json::{parse_document, records_from_str};
use blob_importer::ingestion::json_stream::stream_array;
use blob_importer::ingestion::{Importer, JobOutcome, ParsePath};
use blob_importer::store::InMemoryDocumentStore;
use blob_importer::IngestionError;

fn setup(collection: &str) -> (Arc<InMemoryStorage>, Arc<InMemoryDocumentStore>, Importer) {
    let blobs = Arc::new(InMemoryStorage::new());
    let store = Arc::new(InMemoryDocumentStore::new());
    let importer = Importer::new(ImportConfig::new(collection), blobs.clone(), store.clone());
    (blobs, store, importer)
}

fn imported(outcome: JobOutcome) -> blob_importer::ingestion::ImportStats {
    match outcome {
        JobOutcome::Imported(stats) => stats,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn fixture_array_parses_eagerly() {
    let file = std::fs::File::open("tests/fixtures/people.json").unwrap();
    let records: Vec<_> = parse_document(file).unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("user"), Some(&json!({"name": "Ada"})));
}

#[test]
fn array_of_three_produces_three_generated_id_documents() {
    let (blobs, store, importer) = setup("items");
    let event = blobs.put("b", "imports/items.json", r#"[{"n":1},{"n":2},{"n":3}]"#);

    let stats = imported(importer.run(&event).unwrap());
    assert_eq!(stats.parser, ParsePath::JsonEager);
    assert_eq!(stats.records, 3);
    assert_eq!(store.count("items"), 3);
    // Only the eager attempt opened the object.
    assert_eq!(blobs.open_count("b", "imports/items.json"), 1);
}

#[test]
fn keyed_object_writes_nested_objects_to_their_key() {
    let (blobs, store, importer) = setup("docs");
    let event = blobs.put("b", "imports/keyed.json", r#"{"a": {"x": 1}, "b": 2}"#);

    let stats = imported(importer.run(&event).unwrap());
    assert_eq!(stats.records, 2);

    let docs = store.documents("docs");
    assert_eq!(docs.len(), 2);
    assert_eq!(store.document("docs", "a"), json!({"x": 1}).as_object().cloned());
    let generated: Vec<_> = docs.iter().filter(|(id, _)| id != "a").collect();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].1, json!({"b": 2}).as_object().cloned().unwrap());
}

#[test]
fn keyed_fixture_overwrites_existing_documents() {
    let (blobs, store, importer) = setup("people");
    let input = std::fs::read("tests/fixtures/keyed.json").unwrap();
    let event = blobs.put("b", "imports/keyed.json", input);

    importer.run(&event).unwrap();
    importer.run(&event).unwrap();

    // Two keyed documents are overwritten in place; the scalar entry is duplicated.
    assert_eq!(store.count("people"), 4);
    assert_eq!(
        store.document("people", "grace"),
        json!({"name": "Grace", "born": 1906}).as_object().cloned()
    );
}

#[test]
fn empty_object_produces_one_empty_document() {
    let (blobs, store, importer) = setup("docs");
    let event = blobs.put("b", "imports/empty.json", "{}");

    let stats = imported(importer.run(&event).unwrap());
    assert_eq!(stats.records, 1);
    let docs = store.documents("docs");
    assert_eq!(docs.len(), 1);
    assert!(docs[0].1.is_empty());
}

#[test]
fn malformed_document_with_valid_leading_array_falls_back_to_streaming() {
    let (blobs, store, importer) = setup("items");
    let input = r#"[{"n":1},{"n":2},{"n":3}] this is not json"#;
    assert!(records_from_str(input).is_err());
    let event = blobs.put("b", "imports/items.json", input);

    let stats = imported(importer.run(&event).unwrap());
    assert_eq!(stats.parser, ParsePath::JsonStreaming);
    assert_eq!(stats.records, 3);
    assert_eq!(store.count("items"), 3);
    // The streaming parser re-reads the object from the start.
    assert_eq!(blobs.open_count("b", "imports/items.json"), 2);
}

#[test]
fn streaming_fallback_ignores_keyed_semantics() {
    // Invalid UTF-8 defeats the eager parse; the streamed array still imports.
    let (blobs, store, importer) = setup("items");
    let mut input = br#"[{"id":"a"},{"id":"b"}]"#.to_vec();
    input.extend_from_slice(b"\xff");
    let event = blobs.put("b", "imports/items.json", input);

    let stats = imported(importer.run(&event).unwrap());
    assert_eq!(stats.parser, ParsePath::JsonStreaming);
    assert_eq!(store.count("items"), 2);
    assert!(store.document("items", "a").is_none());
}

#[test]
fn malformed_streaming_input_fails_after_committing_complete_groups() {
    let blobs = Arc::new(InMemoryStorage::new());
    let store = Arc::new(InMemoryDocumentStore::with_max_batch_size(2));
    let importer = Importer::new(ImportConfig::new("items"), blobs.clone(), store.clone());
    let event = blobs.put("b", "imports/items.json", r#"[{"n":1},{"n":2},{"n":3},{"n":"#);

    let err = importer.run(&event).unwrap_err();
    assert!(matches!(err, IngestionError::StreamingParse { .. }));
    // The first full group was committed before the parse error surfaced.
    assert_eq!(store.count("items"), 2);
    assert_eq!(store.committed_batch_sizes(), vec![2]);
}

#[test]
fn scalar_document_fails_in_both_phases() {
    let (blobs, store, importer) = setup("items");
    let event = blobs.put("b", "imports/number.json", "42");

    let err = importer.run(&event).unwrap_err();
    assert!(matches!(err, IngestionError::StreamingParse { .. }));
    assert_eq!(store.count("items"), 0);
}

#[test]
fn large_inputs_skip_the_eager_parse() {
    let blobs = Arc::new(InMemoryStorage::new());
    let store = Arc::new(InMemoryDocumentStore::new());
    let config = ImportConfig::new("items").with_eager_parse_max_bytes(8);
    let importer = Importer::new(config, blobs.clone(), store.clone());
    let event = blobs.put("b", "imports/items.json", r#"[{"n":1},{"n":2}]"#);

    let stats = imported(importer.run(&event).unwrap());
    assert_eq!(stats.parser, ParsePath::JsonStreaming);
    assert_eq!(stats.records, 2);
    assert_eq!(blobs.open_count("b", "imports/items.json"), 1);
}

#[test]
fn keyed_object_above_size_limit_is_rejected_by_streaming_parser() {
    let blobs = Arc::new(InMemoryStorage::new());
    let store = Arc::new(InMemoryDocumentStore::new());
    let config = ImportConfig::new("docs").with_eager_parse_max_bytes(4);
    let importer = Importer::new(config, blobs.clone(), store.clone());
    let event = blobs.put("b", "imports/keyed.json", r#"{"a": {"x": 1}}"#);

    assert!(importer.run(&event).is_err());
    assert_eq!(store.count("docs"), 0);
}

#[test]
fn stream_matches_eager_for_well_formed_arrays() {
    let input = std::fs::read("tests/fixtures/people.json").unwrap();
    let eager: Vec<_> = parse_document(input.as_slice())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let mut streamed = Vec::new();
    let elements = stream_array(input.as_slice(), |record| {
        streamed.push(record);
        Ok(())
    })
    .unwrap();
    assert_eq!(elements, 2);
    assert_eq!(eager, streamed);
}
