//! Hierarchical statement combination: wiring support relations.
//!
//! Non-identical statements of the same kind are compared pairwise under the
//! ontology-aware refinement test. When A is strictly more specific than B,
//! A is appended to B's `supports` list and B to A's `supported_by` list —
//! the exact edge convention of the original pipeline, where "top-level"
//! statements (empty `supports`) are the most specific frontier.
//!
//! Support relations are held in an arena keyed by integer statement IDs
//! with explicit adjacency lists, so the dense bidirectional graph has no
//! ownership cycles and round-trips through serialization unchanged.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ontology::HierarchySet;
use crate::statement::Statement;

/// Arena of unique statements with their support adjacency.
///
/// `supports[i]` holds the statements strictly more specific than statement
/// `i` (its refiners); `supported_by[i]` holds the more general statements
/// that `i` refines. Only direct pairwise edges are stored; no transitive
/// closure is forced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedStatements {
    pub statements: Vec<Statement>,
    pub supports: Vec<Vec<usize>>,
    pub supported_by: Vec<Vec<usize>>,
}

impl RelatedStatements {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Total number of support edges.
    pub fn support_edge_count(&self) -> usize {
        self.supports.iter().map(Vec::len).sum()
    }

    /// Indices of the statements nothing else refines.
    pub fn top_level_indices(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.supports[i].is_empty())
            .collect()
    }

    /// The most-specific frontier: statements whose `supports` list is empty.
    pub fn top_level(&self) -> Vec<Statement> {
        self.top_level_indices()
            .into_iter()
            .map(|i| self.statements[i].clone())
            .collect()
    }
}

/// Compare unique statements pairwise and wire support relations.
///
/// Statements are pre-bucketed by type tag so the quadratic scan only runs
/// within compatible groups; the pairwise refinement checks of each bucket
/// run in parallel. Deterministic for a given input order.
pub fn combine_related(unique: Vec<Statement>, hierarchies: &HierarchySet) -> RelatedStatements {
    let n = unique.len();
    let mut supports: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut supported_by: Vec<Vec<usize>> = vec![Vec::new(); n];

    // Pre-bucket by type tag: refinement never holds across tags.
    let mut buckets: std::collections::HashMap<&'static str, Vec<usize>> =
        std::collections::HashMap::new();
    for (i, stmt) in unique.iter().enumerate() {
        buckets.entry(stmt.type_tag()).or_default().push(i);
    }

    let mut edge_set: HashSet<(usize, usize)> = HashSet::new();
    let mut tags: Vec<&&'static str> = buckets.keys().collect();
    tags.sort();
    for tag in tags {
        let members = &buckets[*tag];
        if members.len() < 2 {
            continue;
        }
        let pairs: Vec<(usize, usize)> = members
            .iter()
            .flat_map(|&i| members.iter().map(move |&j| (i, j)))
            .filter(|&(i, j)| i != j)
            .collect();
        let edges: Vec<(usize, usize)> = pairs
            .par_iter()
            .filter(|&&(i, j)| unique[i].refines(&unique[j], hierarchies))
            .copied()
            .collect();
        for (specific, general) in edges {
            // Mutual refinement between distinct keys would form a support
            // cycle; keep only the first direction encountered.
            if edge_set.contains(&(general, specific)) {
                debug!(specific, general, "mutual refinement, dropping reverse edge");
                continue;
            }
            if edge_set.insert((specific, general)) {
                supports[general].push(specific);
                supported_by[specific].push(general);
            }
        }
    }

    for adj in supports.iter_mut().chain(supported_by.iter_mut()) {
        adj.sort_unstable();
    }

    RelatedStatements {
        statements: unique,
        supports,
        supported_by,
    }
}

/// Filter to the statements at the top level of the support hierarchy —
/// the most specific ones, with an empty `supports` list.
pub fn filter_top_level(related: &RelatedStatements) -> Vec<Statement> {
    info!(count = related.len(), "filtering for top-level statements");
    let out = related.top_level();
    info!(count = out.len(), "statements after filter");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::corpus::dedup::combine_duplicates;
    use crate::statement::Statement;

    fn hierarchies() -> HierarchySet {
        HierarchySet::with_seed_entities().unwrap()
    }

    fn braf() -> Agent {
        Agent::new("BRAF").with_grounding("HGNC", "BRAF")
    }

    fn raf() -> Agent {
        Agent::new("RAF").with_grounding("BE", "RAF")
    }

    fn mek() -> Agent {
        Agent::new("MEK").with_grounding("BE", "MEK")
    }

    fn map2k1() -> Agent {
        Agent::new("MAP2K1").with_grounding("HGNC", "MAP2K1")
    }

    #[test]
    fn specific_supports_general() {
        let h = hierarchies();
        let specific = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
        let general = Statement::phosphorylation(Some(raf()), mek(), None, None);
        let related = combine_related(vec![specific, general], &h);

        // The general statement is refined by the specific one.
        assert_eq!(related.supports[1], vec![0]);
        assert_eq!(related.supported_by[0], vec![1]);
        assert!(related.supports[0].is_empty());
        assert!(related.supported_by[1].is_empty());
    }

    #[test]
    fn top_level_keeps_most_specific() {
        let h = hierarchies();
        let specific = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
        let general = Statement::phosphorylation(Some(raf()), mek(), None, None);
        let related = combine_related(vec![general, specific.clone()], &h);
        let top = filter_top_level(&related);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].matches_key(), specific.matches_key());
    }

    #[test]
    fn unrelated_statements_get_no_edges() {
        let h = hierarchies();
        let a = Statement::phosphorylation(Some(braf()), map2k1(), None, None);
        let b = Statement::complex(vec![braf(), map2k1()]);
        let related = combine_related(vec![a, b], &h);
        assert_eq!(related.support_edge_count(), 0);
        assert_eq!(related.top_level().len(), 2);
    }

    #[test]
    fn top_level_output_is_an_antichain() {
        let h = hierarchies();
        let stmts = vec![
            Statement::phosphorylation(Some(raf()), mek(), None, None),
            Statement::phosphorylation(Some(braf()), mek(), None, None),
            Statement::phosphorylation(Some(braf()), map2k1(), None, None),
            Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218")),
            Statement::phosphorylation(Some(raf()), map2k1(), Some("S"), Some("222")),
        ];
        let related = combine_related(combine_duplicates(&stmts), &h);
        let top = filter_top_level(&related);
        assert!(!top.is_empty());
        for a in &top {
            for b in &top {
                if a.matches_key() != b.matches_key() {
                    assert!(!a.refines(b, &h), "top-level output must be an antichain");
                }
            }
        }
    }

    #[test]
    fn chains_only_store_direct_edges() {
        let h = hierarchies();
        // site-specific -> gene-level -> family-level
        let s0 = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
        let s1 = Statement::phosphorylation(Some(braf()), map2k1(), None, None);
        let s2 = Statement::phosphorylation(Some(raf()), mek(), None, None);
        let related = combine_related(vec![s0, s1, s2], &h);
        // Direct pairwise comparison links every refining pair, including the
        // one that a transitive closure would imply anyway.
        assert_eq!(related.supports[2], vec![0, 1]);
        assert_eq!(related.supports[1], vec![0]);
        assert_eq!(related.supported_by[0], vec![1, 2]);
        assert_eq!(related.top_level_indices(), vec![0]);
    }

    #[test]
    fn deterministic_across_runs() {
        let h = hierarchies();
        let stmts = vec![
            Statement::phosphorylation(Some(raf()), mek(), None, None),
            Statement::phosphorylation(Some(braf()), map2k1(), None, None),
            Statement::complex(vec![braf(), map2k1()]),
            Statement::complex(vec![raf(), mek()]),
        ];
        let a = combine_related(stmts.clone(), &h);
        let b = combine_related(stmts, &h);
        assert_eq!(a.supports, b.supports);
        assert_eq!(a.supported_by, b.supported_by);
    }
}
