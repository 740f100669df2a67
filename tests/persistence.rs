//! Persistence round-trip tests for the corpus store.

use std::sync::Arc;

use bioasm::agent::Agent;
use bioasm::belief::BeliefEngine;
use bioasm::corpus::refine::combine_related;
use bioasm::ontology::HierarchySet;
use bioasm::statement::{Evidence, Statement};
use bioasm::store::CorpusStore;

fn braf() -> Agent {
    Agent::new("BRAF").with_grounding("HGNC", "BRAF")
}

fn raf() -> Agent {
    Agent::new("RAF").with_grounding("BE", "RAF")
}

fn map2k1() -> Agent {
    Agent::new("MAP2K1").with_grounding("HGNC", "MAP2K1")
}

fn mek() -> Agent {
    Agent::new("MEK").with_grounding("BE", "MEK")
}

#[test]
fn statement_list_round_trips() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = CorpusStore::open(dir.path()).unwrap();
    let stmts = vec![
        Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
            .with_evidence(Evidence::new("reach").with_text("BRAF phosphorylates MEK1").with_direct(true)),
        Statement::complex(vec![braf(), map2k1()]).with_evidence(Evidence::new("biopax")),
    ];
    store.store_statements("raw", &stmts).unwrap();
    let loaded = store.load_statements("raw").unwrap();
    assert_eq!(stmts, loaded);
}

#[test]
fn support_graph_round_trips_with_back_references() {
    let hierarchies = HierarchySet::with_seed_entities().unwrap();
    let specific = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
        .with_evidence(Evidence::new("reach"));
    let general = Statement::phosphorylation(Some(raf()), mek(), None, None)
        .with_evidence(Evidence::new("bel"));
    let mut related = combine_related(vec![specific, general], &hierarchies);
    BeliefEngine::default().set_hierarchy_probs(&mut related);

    let dir = tempfile::TempDir::new().unwrap();
    let store = CorpusStore::open(dir.path()).unwrap();
    store.store_related("related", &related).unwrap();
    let loaded = store.load_related("related").unwrap();

    // Statements, adjacency and beliefs all survive the round trip.
    assert_eq!(related.statements, loaded.statements);
    assert_eq!(related.supports, loaded.supports);
    assert_eq!(related.supported_by, loaded.supported_by);
    assert_eq!(loaded.supports[1], vec![0]);
    assert_eq!(loaded.supported_by[0], vec![1]);
    assert_eq!(loaded.top_level_indices(), vec![0]);
}

#[test]
fn reloaded_corpus_is_usable_by_later_stages() {
    let hierarchies = Arc::new(HierarchySet::with_seed_entities().unwrap());
    let stmts = vec![
        Statement::phosphorylation(Some(braf()), map2k1(), None, None)
            .with_evidence(Evidence::new("reach")),
    ];
    let dir = tempfile::TempDir::new().unwrap();
    let store = CorpusStore::open(dir.path()).unwrap();
    store.store_statements("stage", &stmts).unwrap();

    let reloaded = store.load_statements("stage").unwrap();
    let related = combine_related(reloaded, &hierarchies);
    assert_eq!(related.top_level().len(), 1);
}
