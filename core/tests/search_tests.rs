use docsearch_core::{
    search, DocSearchError, Document, IndexBuilder, IndexStore, InvertedIndex, Normalizer, StopwordSet, DEFAULT_K,
};

fn filenames(index: &InvertedIndex, query: &str, normalizer: &Normalizer) -> Vec<String> {
    search(query, index, normalizer, DEFAULT_K)
        .unwrap()
        .into_iter()
        .map(|h| index.doc(h.doc_id).unwrap().filename.clone())
        .collect()
}

fn two_files(normalizer: &Normalizer) -> InvertedIndex {
    IndexBuilder::build(
        normalizer,
        vec![
            Document::new("a.txt", "Cartea este pe masă"),
            Document::new("b.txt", "Scaunul este în cameră"),
        ],
    )
}

#[test]
fn scenario_with_builtin_stopwords() {
    let n = Normalizer::romanian();
    let index = two_files(&n);
    assert_eq!(filenames(&index, "carte", &n), vec!["a.txt"]);
    assert!(filenames(&index, "este", &n).is_empty());
}

#[test]
fn scenario_without_stopwords() {
    let n = Normalizer::new(StopwordSet::empty());
    let index = two_files(&n);
    assert_eq!(filenames(&index, "carte", &n), vec!["a.txt"]);
    assert_eq!(filenames(&index, "este", &n), vec!["a.txt", "b.txt"]);
}

#[test]
fn every_marker_finds_exactly_its_document() {
    let n = Normalizer::romanian();
    let docs: Vec<Document> = (0..25)
        .map(|i| {
            Document::new(
                format!("doc{i}.txt"),
                format!("Documentul acesta conține marcajul zq{i}zq printre alte cuvinte obișnuite."),
            )
        })
        .collect();
    let index = IndexBuilder::build(&n, docs);
    for i in 0..25u32 {
        let hits = search(&format!("zq{i}zq"), &index, &n, DEFAULT_K).unwrap();
        assert_eq!(hits.len(), 1, "marker {i}");
        assert_eq!(hits[0].doc_id, i);
    }
}

#[test]
fn repeated_queries_are_identical() {
    let n = Normalizer::romanian();
    let docs = (0..12).map(|i| Document::new(format!("{i}.txt"), "documentul conține cuvântul comun"));
    let index = IndexBuilder::build(&n, docs);
    let first = search("comun documentul", &index, &n, 10).unwrap();
    let second = search("comun documentul", &index, &n, 10).unwrap();
    assert_eq!(first, second);
    let ids: Vec<u32> = first.iter().map(|h| h.doc_id).collect();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
}

#[test]
fn persisted_index_answers_like_the_in_memory_one() {
    let dir = tempfile::tempdir().unwrap();
    let n = Normalizer::romanian();
    let index = two_files(&n);
    let store = IndexStore::new(dir.path().join("index"));
    store.clear().unwrap();
    store.save(&index).unwrap();

    let loaded = store.load().unwrap();
    for q in ["carte", "camera", "scaun OR masă", "+scaun -carte"] {
        assert_eq!(
            search(q, &index, &n, DEFAULT_K).unwrap(),
            search(q, &loaded, &n, DEFAULT_K).unwrap(),
            "{q}"
        );
    }
}

#[test]
fn search_before_build_is_index_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = IndexStore::new(dir.path().join("never-built")).load().unwrap_err();
    assert!(matches!(err, DocSearchError::IndexNotFound(_)));
    assert!(err.is_user_facing());
}

#[test]
fn words_near_stopwords_are_searchable() {
    let n = Normalizer::romanian();
    let index = IndexBuilder::build(
        &n,
        vec![
            Document::new("sala.txt", "Sala de mese"),
            Document::new("cina.txt", "Cina a fost bună"),
            Document::new("celula.txt", "Celula are un nucleu"),
        ],
    );
    assert_eq!(filenames(&index, "sala", &n), vec!["sala.txt"]);
    assert_eq!(filenames(&index, "cina", &n), vec!["cina.txt"]);
    assert_eq!(filenames(&index, "celula", &n), vec!["celula.txt"]);
}
