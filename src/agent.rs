//! Agent data model: named biological entities and their structural qualifiers.
//!
//! An [`Agent`] is a participant slot in a statement: a named entity plus the
//! modification, mutation, binding, location and activity conditions that
//! distinguish one observed form of the entity from another. Equality and
//! refinement between agents are ontology-aware: a grounded agent may match an
//! ontological ancestor through the entity hierarchy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ontology::HierarchySet;

/// Grounding namespaces in decreasing order of preference.
///
/// `TEXT` groundings are raw extraction strings and never count as grounded.
pub const GROUNDING_PRIORITY: &[&str] = &["BE", "HGNC", "UP", "CHEBI", "GO"];

// ---------------------------------------------------------------------------
// Modification vocabulary
// ---------------------------------------------------------------------------

/// The closed vocabulary of post-translational mark types.
///
/// `Modification` is the generic root of the modification-type hierarchy; every
/// concrete mark type is-a `Modification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModType {
    Phosphorylation,
    Ubiquitination,
    Sumoylation,
    Acetylation,
    Hydroxylation,
    Glycosylation,
    Methylation,
    Ribosylation,
    Farnesylation,
    Geranylgeranylation,
    Palmitoylation,
    Myristoylation,
    /// Generic modification of unknown kind.
    Modification,
}

impl ModType {
    /// All concrete (non-generic) mark types.
    pub const CONCRETE: &'static [ModType] = &[
        ModType::Phosphorylation,
        ModType::Ubiquitination,
        ModType::Sumoylation,
        ModType::Acetylation,
        ModType::Hydroxylation,
        ModType::Glycosylation,
        ModType::Methylation,
        ModType::Ribosylation,
        ModType::Farnesylation,
        ModType::Geranylgeranylation,
        ModType::Palmitoylation,
        ModType::Myristoylation,
    ];

    /// Canonical lowercase name, as used in the modification hierarchy.
    pub fn label(self) -> &'static str {
        match self {
            ModType::Phosphorylation => "phosphorylation",
            ModType::Ubiquitination => "ubiquitination",
            ModType::Sumoylation => "sumoylation",
            ModType::Acetylation => "acetylation",
            ModType::Hydroxylation => "hydroxylation",
            ModType::Glycosylation => "glycosylation",
            ModType::Methylation => "methylation",
            ModType::Ribosylation => "ribosylation",
            ModType::Farnesylation => "farnesylation",
            ModType::Geranylgeranylation => "geranylgeranylation",
            ModType::Palmitoylation => "palmitoylation",
            ModType::Myristoylation => "myristoylation",
            ModType::Modification => "modification",
        }
    }

    /// Name of the mark-removing counterpart reaction.
    pub fn removal_label(self) -> &'static str {
        match self {
            ModType::Phosphorylation => "dephosphorylation",
            ModType::Ubiquitination => "deubiquitination",
            ModType::Sumoylation => "desumoylation",
            ModType::Acetylation => "deacetylation",
            ModType::Hydroxylation => "dehydroxylation",
            ModType::Glycosylation => "deglycosylation",
            ModType::Methylation => "demethylation",
            ModType::Ribosylation => "deribosylation",
            ModType::Farnesylation => "defarnesylation",
            ModType::Geranylgeranylation => "degeranylgeranylation",
            ModType::Palmitoylation => "depalmitoylation",
            ModType::Myristoylation => "demyristoylation",
            ModType::Modification => "demodification",
        }
    }

    /// Short site-name abbreviation used when no residue is given.
    pub fn abbrev(self) -> &'static str {
        match self {
            ModType::Phosphorylation => "phospho",
            ModType::Ubiquitination => "ub",
            ModType::Sumoylation => "sumo",
            ModType::Acetylation => "acetyl",
            ModType::Hydroxylation => "hydroxyl",
            ModType::Glycosylation => "glycosyl",
            ModType::Methylation => "methyl",
            ModType::Ribosylation => "ribosyl",
            ModType::Farnesylation => "farnesyl",
            ModType::Geranylgeranylation => "geranylgeranyl",
            ModType::Palmitoylation => "palmitoyl",
            ModType::Myristoylation => "myristoyl",
            ModType::Modification => "mod",
        }
    }

    /// (unmodified, modified) site-state pair for this mark type.
    pub fn site_states(self) -> (&'static str, &'static str) {
        match self {
            ModType::Phosphorylation => ("u", "p"),
            _ => ("n", "y"),
        }
    }

    /// Look up a mark type by its canonical lowercase name.
    pub fn from_label(label: &str) -> Option<ModType> {
        ModType::CONCRETE
            .iter()
            .copied()
            .chain(std::iter::once(ModType::Modification))
            .find(|m| m.label() == label)
    }
}

// ---------------------------------------------------------------------------
// Agent conditions
// ---------------------------------------------------------------------------

/// A modification condition on an agent: a mark of a given type, optionally
/// anchored to a residue and sequence position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModCondition {
    pub mod_type: ModType,
    pub residue: Option<String>,
    pub position: Option<String>,
    /// Whether the mark is present (true) or explicitly absent (false).
    pub is_modified: bool,
}

impl ModCondition {
    pub fn new(mod_type: ModType, residue: Option<&str>, position: Option<&str>) -> Self {
        Self {
            mod_type,
            residue: residue.map(str::to_owned),
            position: position.map(str::to_owned),
            is_modified: true,
        }
    }

    /// Canonical key fragment, independent of evidence.
    pub fn matches_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.mod_type.label(),
            self.residue.as_deref().unwrap_or("-"),
            self.position.as_deref().unwrap_or("-"),
            self.is_modified,
        )
    }

    /// Whether this condition is equal to or strictly more specific than
    /// `other` under the modification-type hierarchy.
    ///
    /// A concrete residue/position refines an unspecified one; a concrete mark
    /// type refines the generic `modification` root.
    pub fn refinement_of(&self, other: &ModCondition, hierarchies: &HierarchySet) -> bool {
        if self.is_modified != other.is_modified {
            return false;
        }
        let type_ok = self.mod_type == other.mod_type
            || hierarchies.modification.isa(
                "INDRA",
                self.mod_type.label(),
                "INDRA",
                other.mod_type.label(),
            );
        if !type_ok {
            return false;
        }
        let residue_ok = match (&self.residue, &other.residue) {
            (_, None) => true,
            (Some(a), Some(b)) => a == b,
            (None, Some(_)) => false,
        };
        let position_ok = match (&self.position, &other.position) {
            (_, None) => true,
            (Some(a), Some(b)) => a == b,
            (None, Some(_)) => false,
        };
        residue_ok && position_ok
    }
}

/// A point mutation: original residue, sequence position, replacement residue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutCondition {
    pub residue_from: Option<String>,
    pub position: Option<String>,
    pub residue_to: Option<String>,
}

impl MutCondition {
    pub fn new(residue_from: Option<&str>, position: Option<&str>, residue_to: Option<&str>) -> Self {
        Self {
            residue_from: residue_from.map(str::to_owned),
            position: position.map(str::to_owned),
            residue_to: residue_to.map(str::to_owned),
        }
    }

    pub fn matches_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.residue_from.as_deref().unwrap_or("-"),
            self.position.as_deref().unwrap_or("-"),
            self.residue_to.as_deref().unwrap_or("-"),
        )
    }
}

/// A binding condition: bound (or explicitly not bound) to a partner agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundCondition {
    pub agent: Agent,
    pub is_bound: bool,
}

impl BoundCondition {
    pub fn new(agent: Agent, is_bound: bool) -> Self {
        Self { agent, is_bound }
    }
}

/// An activity condition: the agent has (or lacks) a named activity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCondition {
    pub activity_type: String,
    pub is_active: bool,
}

impl ActivityCondition {
    pub fn new(activity_type: &str, is_active: bool) -> Self {
        Self {
            activity_type: activity_type.to_owned(),
            is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A named biological entity participating in a statement, together with the
/// structural conditions that qualify the observed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    /// Namespace to identifier mapping; an entity may be grounded in several
    /// namespaces at once.
    #[serde(default)]
    pub db_refs: BTreeMap<String, String>,
    #[serde(default)]
    pub mods: Vec<ModCondition>,
    #[serde(default)]
    pub mutations: Vec<MutCondition>,
    #[serde(default)]
    pub bound_conditions: Vec<BoundCondition>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub activity: Option<ActivityCondition>,
}

impl Agent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            db_refs: BTreeMap::new(),
            mods: Vec::new(),
            mutations: Vec::new(),
            bound_conditions: Vec::new(),
            location: None,
            activity: None,
        }
    }

    pub fn with_grounding(mut self, namespace: &str, id: &str) -> Self {
        self.db_refs.insert(namespace.to_owned(), id.to_owned());
        self
    }

    pub fn with_mod(mut self, mc: ModCondition) -> Self {
        self.mods.push(mc);
        self
    }

    pub fn with_bound(mut self, partner: Agent, is_bound: bool) -> Self {
        self.bound_conditions.push(BoundCondition::new(partner, is_bound));
        self
    }

    pub fn with_activity(mut self, activity_type: &str, is_active: bool) -> Self {
        self.activity = Some(ActivityCondition::new(activity_type, is_active));
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_owned());
        self
    }

    /// The preferred grounding of this agent, or `None` if ungrounded.
    ///
    /// Namespaces are tried in [`GROUNDING_PRIORITY`] order; `TEXT` entries are
    /// ignored.
    pub fn grounding(&self) -> Option<(&str, &str)> {
        for ns in GROUNDING_PRIORITY {
            if let Some(id) = self.db_refs.get(*ns) {
                return Some((ns, id.as_str()));
            }
        }
        None
    }

    /// Whether the agent has any non-TEXT grounding.
    pub fn is_grounded(&self) -> bool {
        self.db_refs.keys().any(|ns| ns != "TEXT")
    }

    /// Entity-level identity: grounding equality when both are grounded,
    /// name equality otherwise.
    pub fn entity_matches(&self, other: &Agent) -> bool {
        match (self.grounding(), other.grounding()) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name,
        }
    }

    /// Key fragment identifying the entity, ignoring state conditions.
    pub fn entity_key(&self) -> String {
        match self.grounding() {
            Some((ns, id)) => format!("{ns}:{id}"),
            None => self.name.clone(),
        }
    }

    /// Canonical key covering entity and all state conditions, independent of
    /// evidence. Conditions are sorted so the key is order-insensitive.
    pub fn matches_key(&self) -> String {
        let mut mods: Vec<String> = self.mods.iter().map(ModCondition::matches_key).collect();
        mods.sort();
        let mut muts: Vec<String> = self.mutations.iter().map(MutCondition::matches_key).collect();
        muts.sort();
        let mut bounds: Vec<String> = self
            .bound_conditions
            .iter()
            .map(|bc| format!("{}={}", bc.agent.matches_key(), bc.is_bound))
            .collect();
        bounds.sort();
        let act = self
            .activity
            .as_ref()
            .map(|a| format!("{}={}", a.activity_type, a.is_active))
            .unwrap_or_default();
        format!(
            "{}(m[{}]u[{}]b[{}]l[{}]a[{}])",
            self.entity_key(),
            mods.join(","),
            muts.join(","),
            bounds.join(","),
            self.location.as_deref().unwrap_or("-"),
            act,
        )
    }

    /// Entity-level refinement: identical entity, or this agent's grounding is
    /// an is-a/part-of descendant of the other's in the entity hierarchy.
    pub fn entity_refinement_of(&self, other: &Agent, hierarchies: &HierarchySet) -> bool {
        if self.entity_matches(other) {
            return true;
        }
        match (self.grounding(), other.grounding()) {
            (Some((ns1, id1)), Some((ns2, id2))) => {
                hierarchies.entity.isa(ns1, id1, ns2, id2)
                    || hierarchies.entity.partof(ns1, Some(id1), ns2, Some(id2))
            }
            _ => false,
        }
    }

    /// Whether every state condition on `other` is matched by an equal or more
    /// specific condition on `self`.
    pub fn state_refinement_of(&self, other: &Agent, hierarchies: &HierarchySet) -> bool {
        // Every mod condition on the general side needs a distinct refining
        // counterpart on the specific side.
        if !injective_match(&other.mods, &self.mods, |broad, spec| {
            spec.refinement_of(broad, hierarchies)
        }) {
            return false;
        }
        if !injective_match(&other.bound_conditions, &self.bound_conditions, |broad, spec| {
            spec.is_bound == broad.is_bound
                && spec.agent.refinement_of(&broad.agent, hierarchies)
        }) {
            return false;
        }
        // Mutations are static; the specific side must carry all of them.
        for mc in &other.mutations {
            if !self.mutations.contains(mc) {
                return false;
            }
        }
        let location_ok = match (&self.location, &other.location) {
            (_, None) => true,
            (Some(a), Some(b)) => {
                a == b
                    || hierarchies
                        .cellular_component
                        .partof("INDRA", Some(a.as_str()), "INDRA", Some(b.as_str()))
            }
            (None, Some(_)) => false,
        };
        if !location_ok {
            return false;
        }
        match (&self.activity, &other.activity) {
            (_, None) => true,
            (Some(a), Some(b)) => {
                a.is_active == b.is_active
                    && (a.activity_type == b.activity_type
                        || hierarchies.activity.isa(
                            "INDRA",
                            &a.activity_type,
                            "INDRA",
                            &b.activity_type,
                        ))
            }
            (None, Some(_)) => false,
        }
    }

    /// Full ontology-aware refinement: entity and state.
    pub fn refinement_of(&self, other: &Agent, hierarchies: &HierarchySet) -> bool {
        self.entity_refinement_of(other, hierarchies) && self.state_refinement_of(other, hierarchies)
    }

    /// Number of qualifying conditions carried by this agent.
    pub fn condition_count(&self) -> usize {
        self.mods.len()
            + self.mutations.len()
            + self.bound_conditions.len()
            + usize::from(self.location.is_some())
            + usize::from(self.activity.is_some())
    }
}

/// Match every element of `general` to a distinct element of `specific` under
/// `refines(general_elem, specific_elem)`. Backtracking search; condition
/// lists are short in practice.
pub(crate) fn injective_match<T, F>(general: &[T], specific: &[T], refines: F) -> bool
where
    F: Fn(&T, &T) -> bool + Copy,
{
    fn go<T, F>(general: &[T], specific: &[T], used: &mut Vec<bool>, refines: F) -> bool
    where
        F: Fn(&T, &T) -> bool + Copy,
    {
        let Some(broad) = general.first() else {
            return true;
        };
        for (i, spec) in specific.iter().enumerate() {
            if !used[i] && refines(broad, spec) {
                used[i] = true;
                if go(&general[1..], specific, used, refines) {
                    return true;
                }
                used[i] = false;
            }
        }
        false
    }
    let mut used = vec![false; specific.len()];
    go(general, specific, &mut used, refines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::HierarchySet;

    fn hierarchies() -> HierarchySet {
        HierarchySet::with_seed_entities().unwrap()
    }

    #[test]
    fn grounding_priority_prefers_family() {
        let agent = Agent::new("BRAF")
            .with_grounding("HGNC", "BRAF")
            .with_grounding("BE", "RAF")
            .with_grounding("TEXT", "B-Raf");
        assert_eq!(agent.grounding(), Some(("BE", "RAF")));
    }

    #[test]
    fn ungrounded_agents_match_by_name() {
        let a = Agent::new("FooKinase");
        let b = Agent::new("FooKinase").with_grounding("TEXT", "foo kinase");
        assert!(a.entity_matches(&b));
    }

    #[test]
    fn matches_key_ignores_condition_order() {
        let m1 = ModCondition::new(ModType::Phosphorylation, Some("S"), Some("218"));
        let m2 = ModCondition::new(ModType::Phosphorylation, Some("S"), Some("222"));
        let a = Agent::new("MAP2K1").with_mod(m1.clone()).with_mod(m2.clone());
        let b = Agent::new("MAP2K1").with_mod(m2).with_mod(m1);
        assert_eq!(a.matches_key(), b.matches_key());
    }

    #[test]
    fn entity_refinement_through_family() {
        let h = hierarchies();
        let braf = Agent::new("BRAF").with_grounding("HGNC", "BRAF");
        let raf = Agent::new("RAF").with_grounding("BE", "RAF");
        assert!(braf.entity_refinement_of(&raf, &h));
        assert!(!raf.entity_refinement_of(&braf, &h));
    }

    #[test]
    fn mod_condition_refinement() {
        let h = hierarchies();
        let specific = ModCondition::new(ModType::Phosphorylation, Some("S"), Some("218"));
        let general = ModCondition::new(ModType::Phosphorylation, None, None);
        let generic = ModCondition::new(ModType::Modification, None, None);
        assert!(specific.refinement_of(&general, &h));
        assert!(specific.refinement_of(&generic, &h));
        assert!(!general.refinement_of(&specific, &h));
    }

    #[test]
    fn state_refinement_requires_all_general_conditions() {
        let h = hierarchies();
        let phos = ModCondition::new(ModType::Phosphorylation, Some("S"), Some("218"));
        let specific = Agent::new("MAP2K1")
            .with_grounding("HGNC", "MAP2K1")
            .with_mod(phos.clone());
        let general = Agent::new("MAP2K1").with_grounding("HGNC", "MAP2K1").with_mod(phos);
        let bare = Agent::new("MAP2K1").with_grounding("HGNC", "MAP2K1");
        assert!(specific.refinement_of(&general, &h));
        assert!(specific.refinement_of(&bare, &h));
        assert!(!bare.refinement_of(&general, &h));
    }

    #[test]
    fn location_refinement_through_components() {
        let h = hierarchies();
        let in_cytoplasm = Agent::new("NFKB1")
            .with_grounding("HGNC", "NFKB1")
            .with_location("cytoplasm");
        let in_cell = Agent::new("NFKB1")
            .with_grounding("HGNC", "NFKB1")
            .with_location("cell");
        assert!(in_cytoplasm.refinement_of(&in_cell, &h));
        assert!(!in_cell.refinement_of(&in_cytoplasm, &h));
    }
}
