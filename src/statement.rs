//! Typed relational statements over agents.
//!
//! A [`Statement`] is a sourced fact relating one to three [`Agent`]s: a
//! modification, a complex formation, a regulation of activity or amount, a
//! translocation. The kind is an explicit tagged enum — mark-adding and
//! mark-removing reactions are distinguished by [`ModDirection`], never by
//! name inspection. Evidence and belief ride along; support relations between
//! statements live in the corpus arena, not on the statement itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::{injective_match, Agent, ModType};
use crate::ontology::HierarchySet;

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// One piece of evidence for a statement: the extracting source, the source
/// text, and epistemic flags such as `direct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub source_api: String,
    #[serde(default)]
    pub pmid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub epistemics: BTreeMap<String, bool>,
}

impl Evidence {
    pub fn new(source_api: &str) -> Self {
        Self {
            source_api: source_api.to_owned(),
            pmid: None,
            text: None,
            epistemics: BTreeMap::new(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_owned());
        self
    }

    pub fn with_pmid(mut self, pmid: &str) -> Self {
        self.pmid = Some(pmid.to_owned());
        self
    }

    pub fn with_direct(mut self, direct: bool) -> Self {
        self.epistemics.insert("direct".to_owned(), direct);
        self
    }

    /// Key used when deduplicating evidence across merged statements.
    pub fn dedup_key(&self) -> (String, Option<String>, Option<String>) {
        (self.source_api.clone(), self.pmid.clone(), self.text.clone())
    }
}

// ---------------------------------------------------------------------------
// Statement payloads
// ---------------------------------------------------------------------------

/// Whether a modification statement adds or removes its mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModDirection {
    Add,
    Remove,
}

/// Enzymatic (de)modification of a substrate at an optional site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub direction: ModDirection,
    pub mod_type: ModType,
    #[serde(default)]
    pub enz: Option<Agent>,
    pub sub: Agent,
    #[serde(default)]
    pub residue: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Cis or trans self-modification variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfModVariant {
    /// The enzyme phosphorylates itself.
    Auto,
    /// The enzyme phosphorylates its bound partner.
    Trans,
}

/// Self-phosphorylation of an enzyme, in cis or in trans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfModification {
    pub variant: SelfModVariant,
    pub enz: Agent,
    #[serde(default)]
    pub residue: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Complex formation between two or more members. Symmetric: member order
/// carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexFormation {
    pub members: Vec<Agent>,
}

/// Regulation of a named activity of the object by the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulateActivity {
    pub subj: Agent,
    pub obj: Agent,
    pub obj_activity: String,
    pub is_activation: bool,
}

/// Declares a site/state form of an agent as active or inactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveForm {
    pub agent: Agent,
    pub activity: String,
    pub is_active: bool,
}

/// Guanine-nucleotide exchange: the GEF switches the GTPase to its active,
/// GTP-bound state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GefActivation {
    pub gef: Agent,
    pub ras: Agent,
}

/// GTPase-activating protein: switches the GTPase to its inactive state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapInactivation {
    pub gap: Agent,
    pub ras: Agent,
}

/// Movement of an agent between cellular compartments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translocation {
    pub agent: Agent,
    #[serde(default)]
    pub from_location: Option<String>,
    #[serde(default)]
    pub to_location: Option<String>,
}

/// Regulation of the amount of an object, optionally driven by a subject.
/// Used for both synthesis (increase) and degradation (decrease).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulateAmount {
    #[serde(default)]
    pub subj: Option<Agent>,
    pub obj: Agent,
}

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// The tagged statement kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatementKind {
    Modification(Modification),
    SelfModification(SelfModification),
    Complex(ComplexFormation),
    RegulateActivity(RegulateActivity),
    ActiveForm(ActiveForm),
    GefActivation(GefActivation),
    GapInactivation(GapInactivation),
    Translocation(Translocation),
    IncreaseAmount(RegulateAmount),
    DecreaseAmount(RegulateAmount),
}

/// A typed relational fact with its evidence and belief score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(flatten)]
    pub kind: StatementKind,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default = "default_belief")]
    pub belief: f64,
}

fn default_belief() -> f64 {
    1.0
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            evidence: Vec::new(),
            belief: 1.0,
        }
    }

    pub fn with_evidence(mut self, ev: Evidence) -> Self {
        self.evidence.push(ev);
        self
    }

    /// Mark-adding modification of a substrate.
    pub fn modification(
        mod_type: ModType,
        enz: Option<Agent>,
        sub: Agent,
        residue: Option<&str>,
        position: Option<&str>,
    ) -> Self {
        Self::new(StatementKind::Modification(Modification {
            direction: ModDirection::Add,
            mod_type,
            enz,
            sub,
            residue: residue.map(str::to_owned),
            position: position.map(str::to_owned),
        }))
    }

    /// Mark-removing modification of a substrate.
    pub fn demodification(
        mod_type: ModType,
        enz: Option<Agent>,
        sub: Agent,
        residue: Option<&str>,
        position: Option<&str>,
    ) -> Self {
        Self::new(StatementKind::Modification(Modification {
            direction: ModDirection::Remove,
            mod_type,
            enz,
            sub,
            residue: residue.map(str::to_owned),
            position: position.map(str::to_owned),
        }))
    }

    pub fn phosphorylation(
        enz: Option<Agent>,
        sub: Agent,
        residue: Option<&str>,
        position: Option<&str>,
    ) -> Self {
        Self::modification(ModType::Phosphorylation, enz, sub, residue, position)
    }

    pub fn complex(members: Vec<Agent>) -> Self {
        Self::new(StatementKind::Complex(ComplexFormation { members }))
    }

    pub fn regulate_activity(subj: Agent, obj: Agent, obj_activity: &str, is_activation: bool) -> Self {
        Self::new(StatementKind::RegulateActivity(RegulateActivity {
            subj,
            obj,
            obj_activity: obj_activity.to_owned(),
            is_activation,
        }))
    }

    pub fn active_form(agent: Agent, activity: &str, is_active: bool) -> Self {
        Self::new(StatementKind::ActiveForm(ActiveForm {
            agent,
            activity: activity.to_owned(),
            is_active,
        }))
    }

    pub fn increase_amount(subj: Option<Agent>, obj: Agent) -> Self {
        Self::new(StatementKind::IncreaseAmount(RegulateAmount { subj, obj }))
    }

    pub fn decrease_amount(subj: Option<Agent>, obj: Agent) -> Self {
        Self::new(StatementKind::DecreaseAmount(RegulateAmount { subj, obj }))
    }

    /// Fine-grained type tag, used for policy resolution and pre-bucketing.
    ///
    /// Modification statements carry one tag per (direction, mark type) pair
    /// so that e.g. a dephosphorylation can be assigned its own policy, the
    /// way the original per-class handler families were addressed.
    pub fn type_tag(&self) -> &'static str {
        match &self.kind {
            StatementKind::Modification(m) => match m.direction {
                ModDirection::Add => m.mod_type.label(),
                ModDirection::Remove => m.mod_type.removal_label(),
            },
            StatementKind::SelfModification(s) => match s.variant {
                SelfModVariant::Auto => "autophosphorylation",
                SelfModVariant::Trans => "transphosphorylation",
            },
            StatementKind::Complex(_) => "complex",
            StatementKind::RegulateActivity(r) => {
                if r.is_activation {
                    "activation"
                } else {
                    "inhibition"
                }
            }
            StatementKind::ActiveForm(_) => "active_form",
            StatementKind::GefActivation(_) => "gef_activation",
            StatementKind::GapInactivation(_) => "gap_inactivation",
            StatementKind::Translocation(_) => "translocation",
            StatementKind::IncreaseAmount(_) => "increase_amount",
            StatementKind::DecreaseAmount(_) => "decrease_amount",
        }
    }

    /// Direct agent slots, in declaration order. Bound partners nested inside
    /// agents are not included.
    pub fn agents(&self) -> Vec<&Agent> {
        match &self.kind {
            StatementKind::Modification(m) => {
                let mut v = Vec::new();
                if let Some(enz) = &m.enz {
                    v.push(enz);
                }
                v.push(&m.sub);
                v
            }
            StatementKind::SelfModification(s) => vec![&s.enz],
            StatementKind::Complex(c) => c.members.iter().collect(),
            StatementKind::RegulateActivity(r) => vec![&r.subj, &r.obj],
            StatementKind::ActiveForm(a) => vec![&a.agent],
            StatementKind::GefActivation(g) => vec![&g.gef, &g.ras],
            StatementKind::GapInactivation(g) => vec![&g.gap, &g.ras],
            StatementKind::Translocation(t) => vec![&t.agent],
            StatementKind::IncreaseAmount(r) | StatementKind::DecreaseAmount(r) => {
                let mut v = Vec::new();
                if let Some(subj) = &r.subj {
                    v.push(subj);
                }
                v.push(&r.obj);
                v
            }
        }
    }

    /// Mutable access to the direct agent slots.
    pub fn agents_mut(&mut self) -> Vec<&mut Agent> {
        match &mut self.kind {
            StatementKind::Modification(m) => {
                let mut v = Vec::new();
                if let Some(enz) = &mut m.enz {
                    v.push(enz);
                }
                v.push(&mut m.sub);
                v
            }
            StatementKind::SelfModification(s) => vec![&mut s.enz],
            StatementKind::Complex(c) => c.members.iter_mut().collect(),
            StatementKind::RegulateActivity(r) => vec![&mut r.subj, &mut r.obj],
            StatementKind::ActiveForm(a) => vec![&mut a.agent],
            StatementKind::GefActivation(g) => vec![&mut g.gef, &mut g.ras],
            StatementKind::GapInactivation(g) => vec![&mut g.gap, &mut g.ras],
            StatementKind::Translocation(t) => vec![&mut t.agent],
            StatementKind::IncreaseAmount(r) | StatementKind::DecreaseAmount(r) => {
                let mut v = Vec::new();
                if let Some(subj) = &mut r.subj {
                    v.push(subj);
                }
                v.push(&mut r.obj);
                v
            }
        }
    }

    /// Canonical structural key, ignoring evidence and belief.
    ///
    /// Symmetric kinds (Complex) sort their member keys so equivalent
    /// statements hash identically regardless of member order.
    pub fn matches_key(&self) -> String {
        let tag = self.type_tag();
        match &self.kind {
            StatementKind::Modification(m) => format!(
                "{tag}({};{};{};{})",
                opt_agent_key(m.enz.as_ref()),
                m.sub.matches_key(),
                m.residue.as_deref().unwrap_or("-"),
                m.position.as_deref().unwrap_or("-"),
            ),
            StatementKind::SelfModification(s) => format!(
                "{tag}({};{};{})",
                s.enz.matches_key(),
                s.residue.as_deref().unwrap_or("-"),
                s.position.as_deref().unwrap_or("-"),
            ),
            StatementKind::Complex(c) => {
                let mut keys: Vec<String> = c.members.iter().map(Agent::matches_key).collect();
                keys.sort();
                format!("{tag}({})", keys.join(";"))
            }
            StatementKind::RegulateActivity(r) => format!(
                "{tag}({};{};{})",
                r.subj.matches_key(),
                r.obj.matches_key(),
                r.obj_activity,
            ),
            StatementKind::ActiveForm(a) => {
                format!("{tag}({};{};{})", a.agent.matches_key(), a.activity, a.is_active)
            }
            StatementKind::GefActivation(g) => {
                format!("{tag}({};{})", g.gef.matches_key(), g.ras.matches_key())
            }
            StatementKind::GapInactivation(g) => {
                format!("{tag}({};{})", g.gap.matches_key(), g.ras.matches_key())
            }
            StatementKind::Translocation(t) => format!(
                "{tag}({};{};{})",
                t.agent.matches_key(),
                t.from_location.as_deref().unwrap_or("-"),
                t.to_location.as_deref().unwrap_or("-"),
            ),
            StatementKind::IncreaseAmount(r) | StatementKind::DecreaseAmount(r) => format!(
                "{tag}({};{})",
                opt_agent_key(r.subj.as_ref()),
                r.obj.matches_key(),
            ),
        }
    }

    /// Whether this statement is equal to or strictly more specific than
    /// `other` under the ontology: same type tag, every agent slot an
    /// is-a/part-of refinement of its counterpart, and qualifiers such as
    /// residue or position at least as specific.
    ///
    /// Strictness between distinct statements is guaranteed by the caller
    /// comparing deduplicated statements with distinct canonical keys.
    pub fn refines(&self, other: &Statement, hierarchies: &HierarchySet) -> bool {
        if self.type_tag() != other.type_tag() {
            return false;
        }
        match (&self.kind, &other.kind) {
            (StatementKind::Modification(a), StatementKind::Modification(b)) => {
                opt_agent_refines(a.enz.as_ref(), b.enz.as_ref(), hierarchies)
                    && a.sub.refinement_of(&b.sub, hierarchies)
                    && opt_str_refines(a.residue.as_deref(), b.residue.as_deref())
                    && opt_str_refines(a.position.as_deref(), b.position.as_deref())
            }
            (StatementKind::SelfModification(a), StatementKind::SelfModification(b)) => {
                a.enz.refinement_of(&b.enz, hierarchies)
                    && opt_str_refines(a.residue.as_deref(), b.residue.as_deref())
                    && opt_str_refines(a.position.as_deref(), b.position.as_deref())
            }
            (StatementKind::Complex(a), StatementKind::Complex(b)) => {
                a.members.len() >= b.members.len()
                    && injective_match(&b.members, &a.members, |broad, spec| {
                        spec.refinement_of(broad, hierarchies)
                    })
            }
            (StatementKind::RegulateActivity(a), StatementKind::RegulateActivity(b)) => {
                a.subj.refinement_of(&b.subj, hierarchies)
                    && a.obj.refinement_of(&b.obj, hierarchies)
                    && activity_refines(&a.obj_activity, &b.obj_activity, hierarchies)
            }
            (StatementKind::ActiveForm(a), StatementKind::ActiveForm(b)) => {
                a.is_active == b.is_active
                    && a.agent.refinement_of(&b.agent, hierarchies)
                    && activity_refines(&a.activity, &b.activity, hierarchies)
            }
            (StatementKind::GefActivation(a), StatementKind::GefActivation(b)) => {
                a.gef.refinement_of(&b.gef, hierarchies) && a.ras.refinement_of(&b.ras, hierarchies)
            }
            (StatementKind::GapInactivation(a), StatementKind::GapInactivation(b)) => {
                a.gap.refinement_of(&b.gap, hierarchies) && a.ras.refinement_of(&b.ras, hierarchies)
            }
            (StatementKind::Translocation(a), StatementKind::Translocation(b)) => {
                a.agent.refinement_of(&b.agent, hierarchies)
                    && location_refines(a.from_location.as_deref(), b.from_location.as_deref(), hierarchies)
                    && location_refines(a.to_location.as_deref(), b.to_location.as_deref(), hierarchies)
            }
            (StatementKind::IncreaseAmount(a), StatementKind::IncreaseAmount(b))
            | (StatementKind::DecreaseAmount(a), StatementKind::DecreaseAmount(b)) => {
                opt_agent_refines(a.subj.as_ref(), b.subj.as_ref(), hierarchies)
                    && a.obj.refinement_of(&b.obj, hierarchies)
            }
            _ => false,
        }
    }
}

fn opt_agent_key(agent: Option<&Agent>) -> String {
    agent.map(Agent::matches_key).unwrap_or_else(|| "-".to_owned())
}

/// An unspecified slot on the general side is refined by anything; a specified
/// general slot requires a specified, refining counterpart.
fn opt_agent_refines(spec: Option<&Agent>, broad: Option<&Agent>, hierarchies: &HierarchySet) -> bool {
    match (spec, broad) {
        (_, None) => true,
        (Some(s), Some(g)) => s.refinement_of(g, hierarchies),
        (None, Some(_)) => false,
    }
}

fn opt_str_refines(spec: Option<&str>, broad: Option<&str>) -> bool {
    match (spec, broad) {
        (_, None) => true,
        (Some(s), Some(g)) => s == g,
        (None, Some(_)) => false,
    }
}

fn activity_refines(spec: &str, broad: &str, hierarchies: &HierarchySet) -> bool {
    spec == broad || hierarchies.activity.isa("INDRA", spec, "INDRA", broad)
}

fn location_refines(spec: Option<&str>, broad: Option<&str>, hierarchies: &HierarchySet) -> bool {
    match (spec, broad) {
        (_, None) => true,
        (Some(s), Some(g)) => {
            s == g
                || hierarchies
                    .cellular_component
                    .partof("INDRA", Some(s), "INDRA", Some(g))
        }
        (None, Some(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ModCondition;

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
    fn matches_key_is_evidence_independent() {
        let a = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
            .with_evidence(Evidence::new("reach").with_text("BRAF phosphorylates MEK1."));
        let b = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
            .with_evidence(Evidence::new("sparser"));
        assert_eq!(a.matches_key(), b.matches_key());
    }

    #[test]
    fn complex_key_is_member_order_invariant() {
        let a = Statement::complex(vec![braf(), map2k1()]);
        let b = Statement::complex(vec![map2k1(), braf()]);
        assert_eq!(a.matches_key(), b.matches_key());
    }

    #[test]
    fn add_and_remove_marks_have_distinct_tags() {
        let p = Statement::phosphorylation(Some(braf()), map2k1(), None, None);
        let d = Statement::demodification(
            ModType::Phosphorylation,
            Some(braf()),
            map2k1(),
            None,
            None,
        );
        assert_eq!(p.type_tag(), "phosphorylation");
        assert_eq!(d.type_tag(), "dephosphorylation");
        assert_ne!(p.matches_key(), d.matches_key());
        assert!(!p.refines(&d, &hierarchies()));
    }

    #[test]
    fn site_specific_refines_site_free() {
        let h = hierarchies();
        let specific = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
        let general = Statement::phosphorylation(Some(braf()), map2k1(), None, None);
        assert!(specific.refines(&general, &h));
        assert!(!general.refines(&specific, &h));
    }

    #[test]
    fn gene_level_refines_family_level() {
        let h = hierarchies();
        let specific = Statement::phosphorylation(Some(braf()), map2k1(), None, None);
        let general = Statement::phosphorylation(Some(raf()), mek(), None, None);
        assert!(specific.refines(&general, &h));
        assert!(!general.refines(&specific, &h));
    }

    #[test]
    fn enzyme_bearing_refines_enzyme_free() {
        let h = hierarchies();
        let with_enz = Statement::phosphorylation(Some(braf()), map2k1(), None, None);
        let without = Statement::phosphorylation(None, map2k1(), None, None);
        assert!(with_enz.refines(&without, &h));
        assert!(!without.refines(&with_enz, &h));
    }

    #[test]
    fn complex_refinement_matches_members_injectively() {
        let h = hierarchies();
        let specific = Statement::complex(vec![braf(), map2k1()]);
        let general = Statement::complex(vec![mek(), raf()]);
        assert!(specific.refines(&general, &h));
        assert!(!general.refines(&specific, &h));
    }

    #[test]
    fn activity_regulation_refines_through_activity_kinds() {
        let h = hierarchies();
        let specific = Statement::regulate_activity(braf(), map2k1(), "kinase", true);
        let general = Statement::regulate_activity(raf(), mek(), "activity", true);
        let inhibition = Statement::regulate_activity(raf(), mek(), "activity", false);
        assert!(specific.refines(&general, &h));
        assert!(!specific.refines(&inhibition, &h));
        assert_eq!(inhibition.type_tag(), "inhibition");
    }

    #[test]
    fn statement_json_round_trip() {
        let stmt = Statement::phosphorylation(
            Some(braf().with_mod(ModCondition::new(ModType::Phosphorylation, Some("S"), Some("445")))),
            map2k1(),
            Some("S"),
            Some("218"),
        )
        .with_evidence(Evidence::new("reach").with_direct(true).with_pmid("12345"));
        let json = serde_json::to_string(&stmt).unwrap();
        assert!(json.contains("\"type\":\"modification\""));
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(stmt, back);
        assert_eq!(stmt.matches_key(), back.matches_key());
    }
}
