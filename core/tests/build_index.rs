use flate2::write::GzEncoder;
use flate2::Compression;
use newsdex_core::indexer::{build_index, IndexOptions};
use newsdex_core::persist::{load_doc_table, load_lexicon, load_meta, IndexPaths};
use newsdex_core::{Bm25Params, DocStore, Error, SearchIndex};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn record(docno: &str, headline: Option<&str>, body: &str) -> String {
    let headline = headline
        .map(|h| format!("<HEADLINE>\n<P>\n{h}\n</P>\n</HEADLINE>\n"))
        .unwrap_or_default();
    format!("<DOC>\n<DOCNO> {docno} </DOCNO>\n<DOCID> 1 </DOCID>\n{headline}<TEXT>\n<P>\n{body}\n</P>\n</TEXT>\n</DOC>\n")
}

/// Two concatenated gzip members, as produced by `cat a.gz b.gz`.
fn write_archive(path: &Path, parts: &[String]) {
    let mut file = fs::File::create(path).unwrap();
    for part in parts {
        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(part.as_bytes()).unwrap();
        file.write_all(&gz.finish().unwrap()).unwrap();
    }
}

fn corpus() -> Vec<String> {
    vec![
        record("LA010189-0001", Some("Tanker Spill Fouls Harbor"), "Oil from the tanker spread across the harbor overnight.")
            + &record("LA010189-0002", None, "The school board met to discuss the new budget."),
        record("LA010289-0003", Some("Harbor Cleanup Begins"), "Crews began skimming oil in the harbor at dawn.")
            + &record("LA010289-0004", None, "Tickets for the spring concert series go on sale Monday.")
            + &record("LA010389-0005", None, "A cold front will bring rain and wind to the valley."),
    ]
}

fn build(options: IndexOptions) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("latimes.gz");
    write_archive(&archive, &corpus());
    let out = dir.path().join("index");
    let summary = build_index(&archive, &out, options).unwrap();
    assert_eq!(summary.num_docs, 5);
    (dir, out)
}

#[test]
fn tables_cover_every_document_in_order() {
    let (_dir, out) = build(IndexOptions::default());
    let paths = IndexPaths::new(&out);
    let docs = load_doc_table(&paths).unwrap();
    assert_eq!(docs.len(), 5);
    assert_eq!(docs.docno(0), Some("LA010189-0001"));
    assert_eq!(docs.docno(4), Some("LA010389-0005"));
    // headline (4) + body (9)
    assert_eq!(docs.length(0), Some(13));

    let meta = load_meta(&paths).unwrap();
    assert_eq!(meta.num_docs, 5);
    assert!(!meta.stemmed);
    assert_eq!(meta.num_terms as usize, load_lexicon(&paths).unwrap().len());

    let lengths = fs::read_to_string(paths.doc_lengths()).unwrap();
    assert_eq!(lengths.lines().count(), 5);
}

#[test]
fn stored_documents_round_trip() {
    let (_dir, out) = build(IndexOptions::default());
    let store = DocStore::new(&out);
    let (raw, meta) = store.get("LA010289-0003").unwrap();
    assert_eq!(meta.internal_id, 2);
    assert_eq!(meta.headline, "Harbor Cleanup Begins");
    assert_eq!(meta.date, "January 02, 1989");
    assert!(raw.starts_with("<DOC>"));
    assert!(out.join("89/01/02/LA010289-0003.txt").is_file());

    let json = fs::read_to_string(out.join("89/01/02/LA010289-0003.json")).unwrap();
    assert!(json.contains("\"internal id\""));
    assert!(matches!(store.get("LA010489-0009"), Err(Error::UnknownDocument(_))));
}

#[test]
fn refuses_existing_destination() {
    let (dir, out) = build(IndexOptions::default());
    let archive = dir.path().join("latimes.gz");
    let err = build_index(&archive, &out, IndexOptions::default()).unwrap_err();
    assert!(matches!(err, Error::DestinationExists { .. }));
}

#[test]
fn missing_archive() {
    let dir = tempdir().unwrap();
    let err = build_index(&dir.path().join("nope.gz"), &dir.path().join("index"), IndexOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingArtifact { .. }));
    assert!(!dir.path().join("index").exists());
}

#[test]
fn loaded_index_ranks_matching_documents() {
    let (_dir, out) = build(IndexOptions::default());
    let index = SearchIndex::load(&out).unwrap();
    let ranked = index.rank("harbor oil", Bm25Params::default());
    let docnos: Vec<&str> = ranked.iter().map(|d| d.docno.as_str()).collect();
    assert_eq!(docnos.len(), 2);
    assert!(docnos.contains(&"LA010189-0001"));
    assert!(docnos.contains(&"LA010289-0003"));
    assert!(index.rank("zeppelin", Bm25Params::default()).is_empty());
}

#[test]
fn stemmed_and_sorted_builds() {
    let (_dir, out) = build(IndexOptions { stem: true, sorted_lexicon: true });
    let paths = IndexPaths::new(&out);
    assert!(load_meta(&paths).unwrap().stemmed);

    let lexicon = load_lexicon(&paths).unwrap();
    let terms: Vec<&str> = lexicon.iter().map(|(term, _)| term).collect();
    let mut sorted = terms.clone();
    sorted.sort_unstable();
    assert_eq!(terms, sorted);

    let index = SearchIndex::load(&out).unwrap();
    // "skimming" and "crews" are indexed as stems; the query is stemmed to match
    let ranked = index.rank("skim crew", Bm25Params::default());
    assert_eq!(ranked.first().map(|d| d.docno.as_str()), Some("LA010289-0003"));
}
