//! Rule-based reaction model: the compiler's output formalism.
//!
//! A [`Model`] holds monomer signatures, rate parameters, site-graph rewrite
//! rules, provenance annotations and initial conditions. Component insertion
//! follows the at-most-once rule: duplicate rule names are skipped with a
//! warning, non-unique parameters are reused, and unique parameters get a
//! uniquifying counter suffix.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::ident;

/// A site/state assignment dictionary, as recorded for active and inactive
/// forms and applied onto monomer patterns.
pub type SitePattern = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// The condition of one site inside a monomer pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SiteState {
    /// Explicitly unbound.
    Unbound,
    /// Bound to an unspecified partner.
    BoundAny,
    /// Bound through a numbered bond shared with another pattern.
    Bond(u32),
    /// In a named state.
    State(String),
    /// In a named state, bond status irrelevant.
    StateWild(String),
}

impl fmt::Display for SiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteState::Unbound => Ok(()),
            SiteState::BoundAny => write!(f, "!+"),
            SiteState::Bond(ix) => write!(f, "!{ix}"),
            SiteState::State(s) => write!(f, "~{s}"),
            SiteState::StateWild(s) => write!(f, "~{s}!?"),
        }
    }
}

/// A monomer with site conditions, the atom of rule patterns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonomerPattern {
    pub monomer: String,
    pub sites: BTreeMap<String, SiteState>,
}

impl MonomerPattern {
    pub fn new(monomer: &str) -> Self {
        Self {
            monomer: monomer.to_owned(),
            sites: BTreeMap::new(),
        }
    }

    /// Set one site condition, replacing any previous condition on the site.
    pub fn set(mut self, site: &str, state: SiteState) -> Self {
        self.sites.insert(site.to_owned(), state);
        self
    }

    /// Overlay a site/state dictionary (e.g. an active form) as plain states.
    pub fn with_states(mut self, states: &SitePattern) -> Self {
        for (site, state) in states {
            self.sites.insert(site.clone(), SiteState::State(state.clone()));
        }
        self
    }
}

impl fmt::Display for MonomerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.monomer)?;
        for (i, (site, state)) in self.sites.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{site}{state}")?;
        }
        write!(f, ")")
    }
}

/// Monomer patterns joined into one connected complex by shared bonds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexPattern(pub Vec<MonomerPattern>);

impl fmt::Display for ComplexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mp) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{mp}")?;
        }
        Ok(())
    }
}

/// A sum of complexes; empty for synthesis sources and degradation sinks.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReactionPattern(pub Vec<ComplexPattern>);

impl ReactionPattern {
    /// The empty pattern (synthesis source / degradation sink).
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// A pattern of free-standing monomers, one complex each.
    pub fn of(monomers: Vec<MonomerPattern>) -> Self {
        Self(monomers.into_iter().map(|mp| ComplexPattern(vec![mp])).collect())
    }

    /// A single bound complex.
    pub fn complex(monomers: Vec<MonomerPattern>) -> Self {
        Self(vec![ComplexPattern(monomers)])
    }
}

impl fmt::Display for ReactionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "0");
        }
        for (i, cp) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{cp}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Annotation attached to a monomer site during signature collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteAnnotation {
    pub site: String,
    /// The state the annotation refers to, where applicable.
    pub state: Option<String>,
    pub predicate: String,
    pub value: String,
}

/// A monomer signature: name, sites and per-site state vocabularies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Monomer {
    pub name: String,
    pub sites: Vec<String>,
    pub site_states: BTreeMap<String, Vec<String>>,
    pub site_annotations: Vec<SiteAnnotation>,
}

impl Monomer {
    /// The ground pattern: first declared state for every stateful site,
    /// unbound for the rest.
    pub fn ground_pattern(&self) -> MonomerPattern {
        let mut mp = MonomerPattern::new(&self.name);
        for site in &self.sites {
            let state = match self.site_states.get(site).and_then(|s| s.first()) {
                Some(state) => SiteState::State(state.clone()),
                None => SiteState::Unbound,
            };
            mp = mp.set(site, state);
        }
        mp
    }

    /// The fully-modified pattern: last declared state for every stateful
    /// site, unbound for the rest.
    pub fn modified_pattern(&self) -> MonomerPattern {
        let mut mp = MonomerPattern::new(&self.name);
        for site in &self.sites {
            let state = match self.site_states.get(site).and_then(|s| s.last()) {
                Some(state) => SiteState::State(state.clone()),
                None => SiteState::Unbound,
            };
            mp = mp.set(site, state);
        }
        mp
    }
}

impl fmt::Display for Monomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, site) in self.sites.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{site}")?;
            if let Some(states) = self.site_states.get(site) {
                for state in states {
                    write!(f, "~{state}")?;
                }
            }
        }
        write!(f, ")")
    }
}

/// A named rate constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
}

/// An irreversible rewrite rule with its rate parameter. Reversible
/// reactions are expressed as a forward/reverse rule pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub name: String,
    pub lhs: ReactionPattern,
    pub rhs: ReactionPattern,
    pub rate: String,
}

/// Provenance annotation: which rule involves which monomer as subject or
/// object, and which grounding a monomer maps to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub subject: String,
    pub object: String,
    pub predicate: String,
}

impl Annotation {
    pub fn new(subject: &str, object: &str, predicate: &str) -> Self {
        Self {
            subject: subject.to_owned(),
            object: object.to_owned(),
            predicate: predicate.to_owned(),
        }
    }
}

/// An initial condition: a fully specified monomer pattern seeded with an
/// amount parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Initial {
    pub pattern: MonomerPattern,
    pub parameter: String,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// The assembled rule-based model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    pub name: String,
    monomers: Vec<Monomer>,
    parameters: Vec<Parameter>,
    rules: Vec<Rule>,
    annotations: Vec<Annotation>,
    initials: Vec<Initial>,
    #[serde(skip)]
    monomer_index: HashMap<String, usize>,
    #[serde(skip)]
    parameter_index: HashMap<String, usize>,
    #[serde(skip)]
    rule_names: HashSet<String>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn monomers(&self) -> &[Monomer] {
        &self.monomers
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn initials(&self) -> &[Initial] {
        &self.initials
    }

    pub fn monomer(&self, name: &str) -> Option<&Monomer> {
        self.monomer_index.get(name).map(|&ix| &self.monomers[ix])
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameter_index.get(name).map(|&ix| &self.parameters[ix])
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Add a monomer signature. Existing signatures are kept untouched.
    pub fn add_monomer(&mut self, monomer: Monomer) {
        if self.monomer_index.contains_key(&monomer.name) {
            warn!(name = %monomer.name, "monomer already in model, skipping");
            return;
        }
        self.monomer_index.insert(monomer.name.clone(), self.monomers.len());
        self.monomers.push(monomer);
    }

    /// Add a rule under the at-most-once-per-name policy. Returns whether the
    /// rule was inserted.
    pub fn add_rule(&mut self, rule: Rule) -> bool {
        if !self.rule_names.insert(rule.name.clone()) {
            warn!(name = %rule.name, "rule already in model, skipping");
            return false;
        }
        debug!(name = %rule.name, "added rule");
        self.rules.push(rule);
        true
    }

    /// Return a parameter with the given name, creating it if needed.
    ///
    /// With `unique` set, a fresh `_N`-suffixed name is always minted; without
    /// it, an existing parameter is reused with its value left unchanged.
    pub fn get_create_parameter(&mut self, name: &str, value: f64, unique: bool) -> String {
        let norm = ident::sanitize(name);
        if !unique {
            if self.parameter(&norm).is_some() {
                return norm;
            }
            self.insert_parameter(Parameter { name: norm.clone(), value });
            return norm;
        }
        let mut pnum = 1;
        let pname = loop {
            let candidate = format!("{norm}_{pnum}");
            if self.parameter(&candidate).is_none() {
                break candidate;
            }
            pnum += 1;
        };
        self.insert_parameter(Parameter { name: pname.clone(), value });
        pname
    }

    /// Set the value of an existing parameter, or create it.
    pub fn set_parameter_value(&mut self, name: &str, value: f64) {
        if let Some(ix) = self.parameter_index.get(name).copied() {
            self.parameters[ix].value = value;
        } else {
            self.insert_parameter(Parameter {
                name: name.to_owned(),
                value,
            });
        }
    }

    fn insert_parameter(&mut self, parameter: Parameter) {
        self.parameter_index.insert(parameter.name.clone(), self.parameters.len());
        self.parameters.push(parameter);
    }

    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Rules annotated with the given predicate for a monomer name.
    pub fn rules_with_annotation(&self, monomer_name: &str, predicate: &str) -> Vec<&Rule> {
        self.annotations
            .iter()
            .filter(|a| a.predicate == predicate && a.object == monomer_name)
            .filter_map(|a| self.rule(&a.subject))
            .collect()
    }

    /// Add an initial condition unless the pattern is already seeded.
    /// Returns whether the initial was inserted.
    pub fn add_initial(&mut self, initial: Initial) -> bool {
        if self.initials.iter().any(|i| i.pattern == initial.pattern) {
            debug!(pattern = %initial.pattern, "initial condition already present, skipping");
            return false;
        }
        self.initials.push(initial);
        true
    }

    /// Seed a monomer in its ground state with the given amount. The amount
    /// parameter is named `<monomer>_0`; an existing parameter has its value
    /// updated in place.
    pub fn set_base_initial(&mut self, monomer_name: &str, value: f64) {
        let Some(monomer) = self.monomer(monomer_name) else {
            warn!(name = monomer_name, "monomer not found for initial condition");
            return;
        };
        let pattern = monomer.ground_pattern();
        let pname = format!("{monomer_name}_0");
        if self.parameter(&pname).is_some() {
            self.set_parameter_value(&pname, value);
        } else {
            self.insert_parameter(Parameter { name: pname.clone(), value });
            self.add_initial(Initial { pattern, parameter: pname });
        }
    }

    /// Seed a monomer's fully-modified state with zero amount, for tools that
    /// require every reachable species to carry initial probability mass.
    /// Unrealizable patterns (e.g. a stateless monomer whose modified pattern
    /// collides with the ground state) are skipped.
    pub fn set_extended_initial(&mut self, monomer_name: &str) {
        let Some(monomer) = self.monomer(monomer_name) else {
            warn!(name = monomer_name, "monomer not found for extended initial");
            return;
        };
        let pattern = monomer.modified_pattern();
        let pname = format!("{monomer_name}_0_mod");
        if self.parameter(&pname).is_some() {
            self.set_parameter_value(&pname, 0.0);
            return;
        }
        if self.initials.iter().any(|i| i.pattern == pattern) {
            debug!(name = monomer_name, "extended initial not realizable, skipping");
            return;
        }
        self.insert_parameter(Parameter { name: pname.clone(), value: 0.0 });
        self.add_initial(Initial { pattern, parameter: pname });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinase_monomer() -> Monomer {
        let mut site_states = BTreeMap::new();
        site_states.insert("phospho".to_owned(), vec!["u".to_owned(), "p".to_owned()]);
        Monomer {
            name: "BRAF".to_owned(),
            sites: vec!["map2k1".to_owned(), "phospho".to_owned()],
            site_states,
            site_annotations: Vec::new(),
        }
    }

    #[test]
    fn unique_parameters_get_counter_suffixes() {
        let mut model = Model::new("test");
        let p1 = model.get_create_parameter("kf_bm_bind", 1e-6, true);
        let p2 = model.get_create_parameter("kf_bm_bind", 1e-6, true);
        assert_eq!(p1, "kf_bm_bind_1");
        assert_eq!(p2, "kf_bm_bind_2");
    }

    #[test]
    fn shared_parameters_are_reused_without_overwrite() {
        let mut model = Model::new("test");
        let p1 = model.get_create_parameter("kf_bind", 1.0, false);
        let p2 = model.get_create_parameter("kf_bind", 99.0, false);
        assert_eq!(p1, p2);
        assert_eq!(model.parameter("kf_bind").unwrap().value, 1.0);
        assert_eq!(model.parameters().len(), 1);
    }

    #[test]
    fn duplicate_rules_are_skipped() {
        let mut model = Model::new("test");
        let rule = Rule {
            name: "BRAF_binds_MAP2K1".to_owned(),
            lhs: ReactionPattern::none(),
            rhs: ReactionPattern::none(),
            rate: "kf_1".to_owned(),
        };
        assert!(model.add_rule(rule.clone()));
        assert!(!model.add_rule(rule));
        assert_eq!(model.rules().len(), 1);
    }

    #[test]
    fn ground_pattern_uses_first_states() {
        let monomer = kinase_monomer();
        let ground = monomer.ground_pattern();
        assert_eq!(
            ground.sites.get("phospho"),
            Some(&SiteState::State("u".to_owned()))
        );
        assert_eq!(ground.sites.get("map2k1"), Some(&SiteState::Unbound));
        let modified = monomer.modified_pattern();
        assert_eq!(
            modified.sites.get("phospho"),
            Some(&SiteState::State("p".to_owned()))
        );
    }

    #[test]
    fn base_initial_updates_value_in_place() {
        let mut model = Model::new("test");
        model.add_monomer(kinase_monomer());
        model.set_base_initial("BRAF", 1000.0);
        model.set_base_initial("BRAF", 500.0);
        assert_eq!(model.parameter("BRAF_0").unwrap().value, 500.0);
        assert_eq!(model.initials().len(), 1);
    }

    #[test]
    fn extended_initial_skips_stateless_monomers() {
        let mut model = Model::new("test");
        model.add_monomer(Monomer {
            name: "ATP".to_owned(),
            sites: vec!["b".to_owned()],
            site_states: BTreeMap::new(),
            site_annotations: Vec::new(),
        });
        model.set_base_initial("ATP", 1000.0);
        model.set_extended_initial("ATP");
        // The modified pattern equals the ground pattern, so no extra seed.
        assert_eq!(model.initials().len(), 1);
        assert!(model.parameter("ATP_0_mod").is_none());
    }

    #[test]
    fn pattern_display_is_flat_text() {
        let mp = MonomerPattern::new("BRAF")
            .set("phospho", SiteState::State("u".to_owned()))
            .set("map2k1", SiteState::Bond(1));
        assert_eq!(mp.to_string(), "BRAF(map2k1!1,phospho~u)");
        let rp = ReactionPattern::complex(vec![
            mp.clone(),
            MonomerPattern::new("MAP2K1").set("braf", SiteState::Bond(1)),
        ]);
        assert_eq!(rp.to_string(), "BRAF(map2k1!1,phospho~u).MAP2K1(braf!1)");
        assert_eq!(ReactionPattern::none().to_string(), "0");
    }

    #[test]
    fn rules_with_annotation_resolves_rules() {
        let mut model = Model::new("test");
        model.add_rule(Rule {
            name: "r1".to_owned(),
            lhs: ReactionPattern::none(),
            rhs: ReactionPattern::none(),
            rate: "k_1".to_owned(),
        });
        model.add_annotation(Annotation::new("r1", "BRAF", "rule_has_subject"));
        model.add_annotation(Annotation::new("r1", "MAP2K1", "rule_has_object"));
        assert_eq!(model.rules_with_annotation("BRAF", "rule_has_subject").len(), 1);
        assert_eq!(model.rules_with_annotation("BRAF", "rule_has_object").len(), 0);
    }
}
