//! Corpus filter passes.
//!
//! Each filter takes a statement slice, returns the surviving statements, and
//! logs the before/after counts. Bad statements are dropped with a
//! diagnostic, never propagated as corpus-wide failures.

use tracing::{info, warn};

use crate::statement::Statement;

/// Gene-list matching policy for [`filter_gene_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPolicy {
    /// Keep statements containing at least one listed gene.
    One,
    /// Keep statements whose agents are all in the list.
    All,
}

/// Evidence-source matching policy for [`filter_evidence_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePolicy {
    /// Keep statements with evidence from any of the sources.
    One,
    /// Keep statements with evidence from all of the sources.
    All,
    /// Keep statements with evidence from none of the sources.
    None,
}

/// Keep statements whose agents all carry a non-TEXT grounding.
pub fn filter_grounded_only(stmts: &[Statement]) -> Vec<Statement> {
    info!(count = stmts.len(), "filtering for grounded agents");
    let out: Vec<Statement> = stmts
        .iter()
        .filter(|st| st.agents().iter().all(|a| a.is_grounded()))
        .cloned()
        .collect();
    info!(count = out.len(), "statements after filter");
    out
}

/// Keep statements containing genes (and, unless `specific_only`, families)
/// exclusively.
pub fn filter_genes_only(stmts: &[Statement], specific_only: bool) -> Vec<Statement> {
    info!(count = stmts.len(), specific_only, "filtering for gene agents");
    let out: Vec<Statement> = stmts
        .iter()
        .filter(|st| {
            st.agents().iter().all(|a| {
                a.db_refs.contains_key("HGNC")
                    || a.db_refs.contains_key("UP")
                    || (!specific_only && a.db_refs.contains_key("BE"))
            })
        })
        .cloned()
        .collect();
    info!(count = out.len(), "statements after filter");
    out
}

/// Keep statements with belief at or above the cutoff.
pub fn filter_belief(stmts: &[Statement], cutoff: f64) -> Vec<Statement> {
    info!(count = stmts.len(), cutoff, "filtering by belief");
    let out: Vec<Statement> = stmts.iter().filter(|st| st.belief >= cutoff).cloned().collect();
    info!(count = out.len(), "statements after filter");
    out
}

/// Keep statements matching a gene list under the given policy.
pub fn filter_gene_list(stmts: &[Statement], genes: &[String], policy: ListPolicy) -> Vec<Statement> {
    info!(count = stmts.len(), genes = genes.len(), "filtering by gene list");
    let listed = |name: &str| genes.iter().any(|g| g == name);
    let out: Vec<Statement> = stmts
        .iter()
        .filter(|st| match policy {
            ListPolicy::One => st.agents().iter().any(|a| listed(&a.name)),
            ListPolicy::All => st.agents().iter().all(|a| listed(&a.name)),
        })
        .cloned()
        .collect();
    info!(count = out.len(), "statements after filter");
    out
}

/// Whether the evidence marks a statement as a direct interaction.
///
/// Any explicit `direct: true` wins; explicit `direct: false` with no
/// positive marking loses; unmarked evidence defaults to direct.
fn is_direct(stmt: &Statement) -> bool {
    let mut any_indirect = false;
    for ev in &stmt.evidence {
        match ev.epistemics.get("direct") {
            Some(true) => return true,
            Some(false) => any_indirect = true,
            None => {}
        }
    }
    !any_indirect
}

/// Keep statements describing direct interactions.
pub fn filter_direct(stmts: &[Statement]) -> Vec<Statement> {
    info!(count = stmts.len(), "filtering for direct interactions");
    let out: Vec<Statement> = stmts.iter().filter(|st| is_direct(st)).cloned().collect();
    info!(count = out.len(), "statements after filter");
    out
}

/// Keep statements by the presence of evidence from the given sources.
pub fn filter_evidence_source(
    stmts: &[Statement],
    sources: &[String],
    policy: SourcePolicy,
) -> Vec<Statement> {
    info!(
        count = stmts.len(),
        sources = sources.len(),
        "filtering by evidence source"
    );
    let out: Vec<Statement> = stmts
        .iter()
        .filter(|st| {
            let present: std::collections::BTreeSet<&str> =
                st.evidence.iter().map(|e| e.source_api.as_str()).collect();
            match policy {
                SourcePolicy::One => sources.iter().any(|s| present.contains(s.as_str())),
                SourcePolicy::All => sources.iter().all(|s| present.contains(s.as_str())),
                SourcePolicy::None => !sources.iter().any(|s| present.contains(s.as_str())),
            }
        })
        .cloned()
        .collect();
    info!(count = out.len(), "statements after filter");
    out
}

/// Keep statements of one fine-grained type tag.
pub fn filter_by_tag(stmts: &[Statement], tag: &str) -> Vec<Statement> {
    info!(count = stmts.len(), tag, "filtering by statement type");
    let out: Vec<Statement> = stmts.iter().filter(|st| st.type_tag() == tag).cloned().collect();
    if out.is_empty() {
        warn!(tag, "no statements matched the type tag");
    }
    info!(count = out.len(), "statements after filter");
    out
}

/// Strip all structural context from the agents of each statement.
pub fn strip_agent_context(stmts: &[Statement]) -> Vec<Statement> {
    info!(count = stmts.len(), "stripping agent context");
    stmts
        .iter()
        .map(|st| {
            let mut new_st = st.clone();
            for agent in new_st.agents_mut() {
                agent.mods.clear();
                agent.mutations.clear();
                agent.bound_conditions.clear();
                agent.location = None;
                agent.activity = None;
            }
            new_st
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, ModCondition, ModType};
    use crate::statement::{Evidence, Statement};

    fn braf() -> Agent {
        Agent::new("BRAF").with_grounding("HGNC", "BRAF")
    }

    fn ungrounded() -> Agent {
        Agent::new("mystery protein").with_grounding("TEXT", "mystery protein")
    }

    #[test]
    fn grounded_filter_drops_text_only_agents() {
        let stmts = vec![
            Statement::phosphorylation(Some(braf()), braf(), None, None),
            Statement::phosphorylation(Some(braf()), ungrounded(), None, None),
        ];
        assert_eq!(filter_grounded_only(&stmts).len(), 1);
    }

    #[test]
    fn direct_filter_honors_epistemics() {
        let direct = Statement::complex(vec![braf(), braf()])
            .with_evidence(Evidence::new("reach").with_direct(true));
        let indirect = Statement::phosphorylation(Some(braf()), braf(), None, None)
            .with_evidence(Evidence::new("reach").with_direct(false));
        let unmarked = Statement::phosphorylation(None, braf(), None, None)
            .with_evidence(Evidence::new("reach"));
        let mixed = Statement::phosphorylation(None, braf(), Some("S"), None)
            .with_evidence(Evidence::new("reach").with_direct(false))
            .with_evidence(Evidence::new("bel").with_direct(true));
        let out = filter_direct(&[direct, indirect, unmarked, mixed]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn belief_filter_uses_cutoff() {
        let mut low = Statement::phosphorylation(None, braf(), None, None);
        low.belief = 0.2;
        let mut high = Statement::phosphorylation(None, braf(), Some("S"), None);
        high.belief = 0.9;
        let out = filter_belief(&[low, high], 0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].belief, 0.9);
    }

    #[test]
    fn source_filter_policies() {
        let st = Statement::phosphorylation(None, braf(), None, None)
            .with_evidence(Evidence::new("reach"))
            .with_evidence(Evidence::new("bel"));
        let sources = vec!["bel".to_owned(), "biopax".to_owned()];
        assert_eq!(filter_evidence_source(&[st.clone()], &sources, SourcePolicy::One).len(), 1);
        assert_eq!(filter_evidence_source(&[st.clone()], &sources, SourcePolicy::All).len(), 0);
        assert_eq!(filter_evidence_source(&[st], &sources, SourcePolicy::None).len(), 0);
    }

    #[test]
    fn strip_context_removes_conditions() {
        let agent = braf()
            .with_mod(ModCondition::new(ModType::Phosphorylation, Some("S"), Some("445")))
            .with_location("cytoplasm");
        let stmts = vec![Statement::phosphorylation(Some(agent), braf(), None, None)];
        let out = strip_agent_context(&stmts);
        for agent in out[0].agents() {
            assert!(agent.mods.is_empty());
            assert!(agent.location.is_none());
        }
    }

    #[test]
    fn gene_list_policies() {
        let st = Statement::phosphorylation(Some(braf()), Agent::new("MAP2K1"), None, None);
        let one = vec!["BRAF".to_owned()];
        assert_eq!(filter_gene_list(&[st.clone()], &one, ListPolicy::One).len(), 1);
        assert_eq!(filter_gene_list(&[st], &one, ListPolicy::All).len(), 0);
    }
}
