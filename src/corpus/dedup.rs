//! Statement deduplication: collapse structurally identical statements.
//!
//! Statements are grouped by their canonical [`matches_key`], which ignores
//! evidence and belief and normalizes agent order for symmetric kinds. The
//! first-seen statement of each group becomes the representative and absorbs
//! the evidence of the rest, concatenated in input order. One hash lookup per
//! statement keeps this O(n log n) rather than pairwise.
//!
//! [`matches_key`]: crate::statement::Statement::matches_key

use std::collections::HashMap;

use tracing::debug;

use crate::statement::Statement;

/// Collapse duplicates into one representative per equivalence class.
///
/// Grouping is stable: representatives appear in first-occurrence order, so
/// identical input ordering yields identical output. Evidence lists are
/// concatenated without deduplication.
pub fn combine_duplicates(stmts: &[Statement]) -> Vec<Statement> {
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Statement> = Vec::new();
    for stmt in stmts {
        let key = stmt.matches_key();
        match by_key.get(&key) {
            Some(&ix) => {
                out[ix].evidence.extend(stmt.evidence.iter().cloned());
            }
            None => {
                by_key.insert(key, out.len());
                out.push(stmt.clone());
            }
        }
    }
    debug!(input = stmts.len(), unique = out.len(), "deduplicated statements");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::statement::{Evidence, Statement};

    fn braf() -> Agent {
        Agent::new("BRAF").with_grounding("HGNC", "BRAF")
    }

    fn map2k1() -> Agent {
        Agent::new("MAP2K1").with_grounding("HGNC", "MAP2K1")
    }

    fn phos(source: &str) -> Statement {
        Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
            .with_evidence(Evidence::new(source))
    }

    #[test]
    fn duplicates_merge_evidence_in_order() {
        let stmts = vec![phos("reach"), phos("sparser"), phos("trips")];
        let unique = combine_duplicates(&stmts);
        assert_eq!(unique.len(), 1);
        let sources: Vec<&str> = unique[0]
            .evidence
            .iter()
            .map(|e| e.source_api.as_str())
            .collect();
        assert_eq!(sources, ["reach", "sparser", "trips"]);
    }

    #[test]
    fn distinct_statements_survive() {
        let stmts = vec![
            phos("reach"),
            Statement::phosphorylation(Some(braf()), map2k1(), None, None)
                .with_evidence(Evidence::new("reach")),
        ];
        let unique = combine_duplicates(&stmts);
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn deduplication_is_idempotent() {
        let stmts = vec![phos("reach"), phos("sparser"), phos("reach")];
        let once = combine_duplicates(&stmts);
        let twice = combine_duplicates(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn grouping_is_stable() {
        let other = Statement::complex(vec![braf(), map2k1()]);
        let stmts = vec![phos("a"), other.clone(), phos("b")];
        let unique = combine_duplicates(&stmts);
        assert_eq!(unique.len(), 2);
        // Representatives keep first-occurrence order.
        assert_eq!(unique[0].type_tag(), "phosphorylation");
        assert_eq!(unique[1].type_tag(), "complex");
    }
}
