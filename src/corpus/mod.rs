//! Corpus assembly: deduplication and hierarchical combination of statements.
//!
//! The [`Preassembler`] drives the two corpus-reduction stages: grouping
//! semantically identical statements ([`dedup`]) and wiring support relations
//! between non-identical statements of different specificity ([`refine`]).
//! [`filters`] holds the corpus-level filter passes.

use std::sync::Arc;

use tracing::info;

use crate::ontology::HierarchySet;
use crate::statement::Statement;

pub mod dedup;
pub mod filters;
pub mod refine;

pub use refine::RelatedStatements;

/// Drives deduplication and hierarchical combination over one statement list.
pub struct Preassembler {
    hierarchies: Arc<HierarchySet>,
    stmts: Vec<Statement>,
    unique: Option<Vec<Statement>>,
}

impl Preassembler {
    pub fn new(hierarchies: Arc<HierarchySet>, stmts: Vec<Statement>) -> Self {
        Self {
            hierarchies,
            stmts,
            unique: None,
        }
    }

    /// Raw input statements.
    pub fn statements(&self) -> &[Statement] {
        &self.stmts
    }

    /// Unique statements, if [`Preassembler::combine_duplicates`] has run.
    pub fn unique_statements(&self) -> Option<&[Statement]> {
        self.unique.as_deref()
    }

    /// Collapse semantically identical statements, merging their evidence.
    /// Idempotent; the result is cached for the related stage.
    pub fn combine_duplicates(&mut self) -> Vec<Statement> {
        info!(count = self.stmts.len(), "combining duplicates");
        let unique = dedup::combine_duplicates(&self.stmts);
        info!(count = unique.len(), "unique statements");
        self.unique = Some(unique.clone());
        unique
    }

    /// Wire support relations between unique statements of different
    /// specificity. Runs the duplicate stage first if it has not run yet.
    pub fn combine_related(&mut self) -> RelatedStatements {
        if self.unique.is_none() {
            self.combine_duplicates();
        }
        let unique = self.unique.clone().unwrap_or_default();
        info!(count = unique.len(), "combining related statements");
        let related = refine::combine_related(unique, &self.hierarchies);
        info!(
            count = related.len(),
            edges = related.support_edge_count(),
            "support graph built"
        );
        related
    }
}
