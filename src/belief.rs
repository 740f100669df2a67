//! Belief scoring: confidence from source reliability and evidence count.
//!
//! Every extraction source carries a random-error probability; a statement's
//! prior belief is the probability that not all of its evidence is wrong,
//! `1 - prod(error_i)`. After support edges exist, the hierarchy pass scores
//! each statement over the union of its own evidence and the evidence of the
//! more general statements it refines, so the most-specific frontier carries
//! the full evidence mass of everything it subsumes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Deserialize;
use tracing::debug;

use crate::corpus::RelatedStatements;
use crate::error::{CorpusError, CorpusResult};
use crate::statement::{Evidence, Statement};

// ---------------------------------------------------------------------------
// Source priors
// ---------------------------------------------------------------------------

/// Per-source random-error probabilities, externally loadable.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcePriors {
    #[serde(default)]
    errors: BTreeMap<String, f64>,
    #[serde(default = "default_unknown_error")]
    default_error: f64,
}

fn default_unknown_error() -> f64 {
    0.35
}

impl Default for SourcePriors {
    fn default() -> Self {
        let mut errors = BTreeMap::new();
        for (source, err) in [
            ("bel", 0.10),
            ("biopax", 0.20),
            ("reach", 0.30),
            ("trips", 0.30),
            ("sparser", 0.30),
        ] {
            errors.insert(source.to_owned(), err);
        }
        Self {
            errors,
            default_error: default_unknown_error(),
        }
    }
}

impl SourcePriors {
    /// Parse priors from a TOML table, validating the probability range.
    pub fn from_toml_str(toml_str: &str) -> CorpusResult<Self> {
        let priors: SourcePriors = toml::from_str(toml_str).map_err(|e| CorpusError::Priors {
            message: e.to_string(),
        })?;
        for (source, &value) in &priors.errors {
            if !(value > 0.0 && value < 1.0) {
                return Err(CorpusError::PriorRange {
                    source_api: source.clone(),
                    value,
                });
            }
        }
        Ok(priors)
    }

    /// Error probability for a source, falling back to the unknown-source
    /// default.
    pub fn error_for(&self, source_api: &str) -> f64 {
        self.errors.get(source_api).copied().unwrap_or(self.default_error)
    }
}

// ---------------------------------------------------------------------------
// Belief engine
// ---------------------------------------------------------------------------

/// Assigns belief scores from source priors and the support graph.
#[derive(Debug, Clone, Default)]
pub struct BeliefEngine {
    priors: SourcePriors,
}

impl BeliefEngine {
    pub fn new(priors: SourcePriors) -> Self {
        Self { priors }
    }

    /// Belief over a set of evidence: `1 - prod(error_i)`. No evidence means
    /// no belief.
    fn probability<'a>(&self, evidence: impl Iterator<Item = &'a Evidence>) -> f64 {
        let mut error_product = 1.0;
        let mut any = false;
        for ev in evidence {
            error_product *= self.priors.error_for(&ev.source_api);
            any = true;
        }
        if any { 1.0 - error_product } else { 0.0 }
    }

    /// Assign each statement its prior belief from its own evidence,
    /// independent of the hierarchy.
    pub fn set_prior_probs(&self, stmts: &mut [Statement]) {
        for stmt in stmts.iter_mut() {
            stmt.belief = self.probability(stmt.evidence.iter());
        }
        debug!(count = stmts.len(), "assigned prior beliefs");
    }

    /// Assign hierarchy-aware beliefs over the support graph.
    ///
    /// Each statement's belief reflects the deduplicated union of its own
    /// evidence and the evidence of every statement reachable through its
    /// `supported_by` chain. Traversal is cycle-guarded.
    pub fn set_hierarchy_probs(&self, related: &mut RelatedStatements) {
        for i in 0..related.len() {
            let mut seen_stmts = vec![false; related.len()];
            let mut queue = VecDeque::new();
            seen_stmts[i] = true;
            queue.push_back(i);
            let mut seen_evidence: BTreeSet<(String, Option<String>, Option<String>)> =
                BTreeSet::new();
            let mut error_product = 1.0;
            let mut any = false;
            while let Some(j) = queue.pop_front() {
                for ev in &related.statements[j].evidence {
                    if seen_evidence.insert(ev.dedup_key()) {
                        error_product *= self.priors.error_for(&ev.source_api);
                        any = true;
                    }
                }
                for &general in &related.supported_by[j] {
                    if !seen_stmts[general] {
                        seen_stmts[general] = true;
                        queue.push_back(general);
                    }
                }
            }
            related.statements[i].belief = if any { 1.0 - error_product } else { 0.0 };
        }
        debug!(count = related.len(), "assigned hierarchy beliefs");
    }
}
