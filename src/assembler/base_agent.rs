//! Base-agent registry: corpus-wide signatures of every entity.
//!
//! A [`BaseAgent`] aggregates, across all statements of one assembler run,
//! every site a canonical entity can carry: binding sites for its partners,
//! modification and mutation sites, location and activity flags, plus the
//! site/state patterns known to switch it active or inactive. Records are
//! created lazily on first reference and only ever grow; the final registry
//! is independent of statement order.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::agent::{Agent, ModCondition};
use crate::assembler::sites;
use crate::ident;
use crate::model::{Monomer, SiteAnnotation, SitePattern};
use crate::ontology::HierarchySet;

/// The aggregated signature of one canonical entity.
#[derive(Debug, Clone)]
pub struct BaseAgent {
    pub name: String,
    /// Site names in first-seen order.
    pub sites: Vec<String>,
    /// Per-site state vocabulary, in first-seen order.
    pub site_states: BTreeMap<String, Vec<String>>,
    pub site_annotations: Vec<SiteAnnotation>,
    /// Site/state patterns diagnostic of the active state.
    pub active_forms: Vec<SitePattern>,
    /// Site/state patterns diagnostic of the inactive state.
    pub inactive_forms: Vec<SitePattern>,
    /// Named activity kinds observed for this entity.
    pub activity_types: Vec<String>,
    pub db_refs: BTreeMap<String, String>,
}

impl BaseAgent {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            sites: Vec::new(),
            site_states: BTreeMap::new(),
            site_annotations: Vec::new(),
            active_forms: Vec::new(),
            inactive_forms: Vec::new(),
            activity_types: Vec::new(),
            db_refs: BTreeMap::new(),
        }
    }

    /// Create a site if it does not exist yet. Idempotent.
    pub fn create_site(&mut self, site: &str) {
        if !self.sites.iter().any(|s| s == site) {
            self.sites.push(site.to_owned());
        }
    }

    /// Create a site with a state vocabulary, extending the vocabulary of an
    /// existing site. Idempotent and additive only.
    pub fn create_site_states(&mut self, site: &str, states: &[&str]) {
        self.create_site(site);
        self.add_site_states(site, states);
    }

    /// Append missing states to a site's vocabulary.
    pub fn add_site_states(&mut self, site: &str, states: &[&str]) {
        let existing = self.site_states.entry(site.to_owned()).or_default();
        for state in states {
            if !existing.iter().any(|s| s == state) {
                existing.push((*state).to_owned());
            }
        }
    }

    /// Create the modification site for a condition, with its two-state
    /// vocabulary and provenance annotations.
    pub fn create_mod_site(&mut self, mc: &ModCondition) {
        let site = sites::mod_site_name(mc.mod_type, mc.residue.as_deref(), mc.position.as_deref());
        let (unmod_state, mod_state) = mc.mod_type.site_states();
        self.create_site_states(&site, &[unmod_state, mod_state]);
        let mut anns = vec![SiteAnnotation {
            site: site.clone(),
            state: Some(mod_state.to_owned()),
            predicate: "is_modification".to_owned(),
            value: mc.mod_type.label().to_owned(),
        }];
        if let Some(residue) = &mc.residue {
            anns.push(SiteAnnotation {
                site: site.clone(),
                state: None,
                predicate: "is_residue".to_owned(),
                value: residue.clone(),
            });
        }
        if let Some(position) = &mc.position {
            anns.push(SiteAnnotation {
                site: site.clone(),
                state: None,
                predicate: "is_position".to_owned(),
                value: position.clone(),
            });
        }
        for ann in anns {
            if !self.site_annotations.contains(&ann) {
                self.site_annotations.push(ann);
            }
        }
    }

    /// Record a site/state pattern as diagnostic of activation or
    /// deactivation. Duplicate patterns are suppressed.
    pub fn add_activity_form(&mut self, pattern: SitePattern, is_active: bool) {
        let forms = if is_active {
            &mut self.active_forms
        } else {
            &mut self.inactive_forms
        };
        if !forms.contains(&pattern) {
            forms.push(pattern);
        }
    }

    /// Record an activity kind name. Duplicates are suppressed.
    pub fn add_activity_type(&mut self, activity_type: &str) {
        if !self.activity_types.iter().any(|a| a == activity_type) {
            self.activity_types.push(activity_type.to_owned());
        }
    }

    /// Freeze this signature into a model monomer.
    pub fn to_monomer(&self) -> Monomer {
        Monomer {
            name: self.name.clone(),
            sites: self.sites.clone(),
            site_states: self.site_states.clone(),
            site_annotations: self.site_annotations.clone(),
        }
    }
}

/// Arena of base agents keyed by canonical name, owned by one assembler run.
pub struct BaseAgentRegistry {
    agents: BTreeMap<String, BaseAgent>,
    hierarchies: Arc<HierarchySet>,
}

impl BaseAgentRegistry {
    pub fn new(hierarchies: Arc<HierarchySet>) -> Self {
        Self {
            agents: BTreeMap::new(),
            hierarchies,
        }
    }

    pub fn hierarchies(&self) -> &HierarchySet {
        &self.hierarchies
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&BaseAgent> {
        self.agents.get(name)
    }

    /// Iterate base agents in canonical-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BaseAgent)> {
        self.agents.iter()
    }

    pub(crate) fn agent_mut(&mut self, name: &str) -> &mut BaseAgent {
        self.agents
            .entry(name.to_owned())
            .or_insert_with(|| BaseAgent::new(name))
    }

    /// Look up or create the base agent for an agent reference, folding in
    /// every structural feature the reference carries. Returns the canonical
    /// name. Safe to call any number of times; additions commute.
    pub fn get_or_create(&mut self, agent: &Agent) -> String {
        let name = ident::sanitize(&agent.name);
        self.agent_mut(&name);

        // Binding is symmetric: each side gets a site named after the other.
        for bc in &agent.bound_conditions {
            let partner_name = self.get_or_create(&bc.agent);
            let own_site = sites::binding_site_name(agent, &self.hierarchies);
            let partner_site = sites::binding_site_name(&bc.agent, &self.hierarchies);
            self.agent_mut(&partner_name).create_site(&own_site);
            self.agent_mut(&name).create_site(&partner_site);
        }

        let base = self.agent_mut(&name);
        for mc in &agent.mods {
            base.create_mod_site(mc);
        }
        for mc in &agent.mutations {
            match sites::mutation_site_name(mc) {
                Some(site) => {
                    base.create_site_states(&site, &["WT"]);
                    if let Some(to) = &mc.residue_to {
                        base.add_site_states(&site, &[to.as_str()]);
                    }
                }
                None => debug!(agent = %agent.name, "mutation without position, skipping site"),
            }
        }
        if let Some(location) = &agent.location {
            let loc = ident::sanitize(location);
            base.create_site_states("loc", &[loc.as_str()]);
        }
        if let Some(activity) = &agent.activity {
            let site = ident::sanitize(&activity.activity_type);
            base.create_site_states(&site, &["inactive", "active"]);
        }
        for (db_name, db_ref) in &agent.db_refs {
            base.db_refs.insert(db_name.clone(), db_ref.clone());
        }
        name
    }

    /// Record an agent's site/state pattern as an active or inactive form.
    pub fn add_activity_form(&mut self, agent: &Agent, is_active: bool) {
        let name = self.get_or_create(agent);
        let pattern = sites::state_site_pattern(agent);
        self.agent_mut(&name).add_activity_form(pattern, is_active);
    }

    /// All site/state patterns under which an agent acts.
    ///
    /// Known active forms win; otherwise each known activity type yields an
    /// `active`-state pattern; with neither, a single unconstrained pattern
    /// is returned.
    pub fn active_patterns(&self, agent: &Agent) -> Vec<SitePattern> {
        let name = ident::sanitize(&agent.name);
        let Some(base) = self.get(&name) else {
            return vec![SitePattern::new()];
        };
        if !base.active_forms.is_empty() {
            return base.active_forms.clone();
        }
        if !base.activity_types.is_empty() {
            return base
                .activity_types
                .iter()
                .map(|at| {
                    let mut p = SitePattern::new();
                    p.insert(at.clone(), "active".to_owned());
                    p
                })
                .collect();
        }
        vec![SitePattern::new()]
    }
}
