//! Staged corpus pipeline: dedup, prior beliefs, related, top-level.
//!
//! Orchestrates the preassembly stages in order, logging statement counts at
//! every boundary and optionally persisting each stage's output so a run can
//! resume from a stage boundary.

use std::sync::Arc;

use tracing::info;

use crate::belief::BeliefEngine;
use crate::corpus::{refine, Preassembler, RelatedStatements};
use crate::error::BioasmResult;
use crate::ontology::HierarchySet;
use crate::statement::Statement;
use crate::store::CorpusStore;

/// Output of one full corpus-assembly run.
pub struct PipelineOutput {
    /// Deduplicated statements with prior beliefs.
    pub unique: Vec<Statement>,
    /// Support graph with hierarchy beliefs.
    pub related: RelatedStatements,
    /// The most-specific frontier.
    pub top_level: Vec<Statement>,
}

/// Drives the corpus stages over one statement list.
pub struct CorpusPipeline {
    hierarchies: Arc<HierarchySet>,
    belief: BeliefEngine,
    store: Option<CorpusStore>,
}

impl CorpusPipeline {
    pub fn new(hierarchies: Arc<HierarchySet>) -> Self {
        Self {
            hierarchies,
            belief: BeliefEngine::default(),
            store: None,
        }
    }

    pub fn with_belief(mut self, belief: BeliefEngine) -> Self {
        self.belief = belief;
        self
    }

    /// Persist each stage's output into the given store under the keys
    /// `unique`, `related` and `top_level`.
    pub fn with_store(mut self, store: CorpusStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Run deduplication, belief scoring, hierarchical combination and the
    /// top-level filter.
    pub fn run(&self, stmts: Vec<Statement>) -> BioasmResult<PipelineOutput> {
        info!(count = stmts.len(), "corpus pipeline starting");
        let mut pa = Preassembler::new(self.hierarchies.clone(), stmts);

        let mut unique = pa.combine_duplicates();
        self.belief.set_prior_probs(&mut unique);
        if let Some(store) = &self.store {
            store.store_statements("unique", &unique)?;
        }

        let mut related = pa.combine_related();
        self.belief.set_hierarchy_probs(&mut related);
        if let Some(store) = &self.store {
            store.store_related("related", &related)?;
        }

        let top_level = refine::filter_top_level(&related);
        if let Some(store) = &self.store {
            store.store_statements("top_level", &top_level)?;
        }
        info!(
            unique = unique.len(),
            top_level = top_level.len(),
            "corpus pipeline finished"
        );
        Ok(PipelineOutput {
            unique,
            related,
            top_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::statement::{Evidence, Statement};

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
    fn full_run_collapses_and_ranks() {
        let h = Arc::new(HierarchySet::with_seed_entities().unwrap());
        let stmts = vec![
            Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
                .with_evidence(Evidence::new("reach").with_text("a")),
            Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
                .with_evidence(Evidence::new("sparser").with_text("b")),
            Statement::phosphorylation(Some(raf()), mek(), None, None)
                .with_evidence(Evidence::new("bel").with_text("c")),
        ];
        let out = CorpusPipeline::new(h).run(stmts).unwrap();
        assert_eq!(out.unique.len(), 2);
        assert_eq!(out.top_level.len(), 1);
        // The surviving statement carries evidence-backed belief from both
        // itself and the general statement it refines.
        let top = &out.top_level[0];
        assert_eq!(top.evidence.len(), 2);
        let expected = 1.0 - 0.30 * 0.30 * 0.10;
        assert!((top.belief - expected).abs() < 1e-12);
    }

    #[test]
    fn stages_persist_when_store_is_set() {
        let h = Arc::new(HierarchySet::with_seed_entities().unwrap());
        let dir = tempfile::TempDir::new().unwrap();
        let pipeline = CorpusPipeline::new(h)
            .with_store(CorpusStore::open(dir.path()).unwrap());
        let stmts = vec![
            Statement::phosphorylation(Some(braf()), map2k1(), None, None)
                .with_evidence(Evidence::new("reach")),
        ];
        pipeline.run(stmts).unwrap();
        let reopened = CorpusStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load_statements("unique").unwrap().len(), 1);
        assert_eq!(reopened.load_statements("top_level").unwrap().len(), 1);
        assert_eq!(reopened.load_related("related").unwrap().len(), 1);
    }
}
