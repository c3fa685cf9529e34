//! Loading the corpus from disk and navigating its ranges

use std::io::Write;
use tempfile::NamedTempFile;
use verserec_core::{AppError, ContentIndex, ItemId, RangeSelector};

fn corpus_json() -> String {
    let mut items = Vec::new();
    for s in 1..=7 {
        items.push(format!(r#"{{"page": 1, "chapter": 1, "sequence": {}}}"#, s));
    }
    for s in 0..=40 {
        let page = if s < 17 { 582 } else { 583 };
        items.push(format!(
            r#"{{"page": {}, "chapter": 78, "sequence": {}}}"#,
            page, s
        ));
    }
    format!(
        r#"{{"chapters": [{{"number": 1, "name": "Al-Fatiha"}}, {{"number": 78, "name": "An-Naba"}}], "items": [{}]}}"#,
        items.join(",")
    )
}

#[test]
fn test_load_corpus_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(corpus_json().as_bytes()).unwrap();

    let index = ContentIndex::load(file.path()).unwrap();

    assert_eq!(index.len(), 48);
    assert_eq!(index.pages(), &[1, 582, 583]);
    assert_eq!(index.chapters(), &[1, 78]);
    assert_eq!(index.chapter_name(1), "Al-Fatiha");

    let chapter = index.range(RangeSelector::Chapter(1));
    assert_eq!(chapter.len(), 7);
    assert_eq!(chapter.first(), Some(ItemId::new(1, 1).unwrap()));

    let page = index.range(RangeSelector::Page(583));
    assert_eq!(page.first(), Some("078017".parse().unwrap()));
    assert_eq!(page.last(), Some("78:40".parse().unwrap()));
}

#[test]
fn test_opening_formula_resolves_to_canonical_item() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(corpus_json().as_bytes()).unwrap();
    let index = ContentIndex::load(file.path()).unwrap();

    let opening = index.range(RangeSelector::Chapter(78)).first().unwrap();
    assert!(opening.is_substituted_opening());
    assert_eq!(opening.audio_id().to_string(), "001000");
}

#[test]
fn test_missing_corpus_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ContentIndex::load(&dir.path().join("corpus.json"));
    assert!(matches!(result, Err(AppError::Corpus { .. })));
}
