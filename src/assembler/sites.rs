//! Site and rule naming: from agents to monomer-pattern vocabulary.
//!
//! Binding sites are named after the partner's top-level ontological
//! ancestor (lowercased), falling back to the partner's own sanitized name,
//! so every member of a family binds through the same site. Modification
//! sites are named from the residue/position when known and from the mark
//! abbreviation otherwise.

use tracing::debug;

use crate::agent::{Agent, ModType, MutCondition};
use crate::ident;
use crate::model::{Model, MonomerPattern, SitePattern, SiteState};
use crate::ontology::{uri_agent_name, HierarchySet, ParentMode};
use crate::statement::ModDirection;

/// Binding-site name for an agent, preferring its top-level family.
pub fn binding_site_name(agent: &Agent, hierarchies: &HierarchySet) -> String {
    if let Some((ns, id)) = agent.grounding() {
        if let Some(uri) = hierarchies.entity.get_uri(ns, id) {
            let parents = hierarchies.entity.get_parents(&uri, ParentMode::Top);
            // Choose the lexically first top parent when there are several.
            if let Some(parent_uri) = parents.into_iter().next() {
                if let Some(parent_name) = uri_agent_name(&parent_uri) {
                    return ident::sanitize(parent_name).to_lowercase();
                }
            }
        }
    }
    ident::sanitize(&agent.name).to_lowercase()
}

/// Site name for a modification: residue (or mark abbreviation) plus position.
pub fn mod_site_name(mod_type: ModType, residue: Option<&str>, position: Option<&str>) -> String {
    let stem = residue.unwrap_or_else(|| mod_type.abbrev());
    format!("{}{}", stem, position.unwrap_or(""))
}

/// Site name for a mutation: original residue (or `X`) plus position.
/// Mutations without a position have no stable site name.
pub fn mutation_site_name(mc: &MutCondition) -> Option<String> {
    let position = mc.position.as_deref()?;
    let from = mc.residue_from.as_deref().unwrap_or("X");
    Some(format!("{from}{position}"))
}

/// The activity site engaged by a (de)modification enzyme in
/// interactions-only assembly.
pub fn mod_activity_site(direction: ModDirection, mod_type: ModType) -> &'static str {
    match (direction, mod_type) {
        (ModDirection::Add, ModType::Phosphorylation) => "kinase",
        (ModDirection::Remove, ModType::Phosphorylation) => "phosphatase",
        _ => "catalytic",
    }
}

/// Deterministic rule-name fragment describing an agent with its conditions.
pub fn agent_rule_label(agent: &Agent) -> String {
    let mut parts = vec![ident::sanitize(&agent.name)];
    for mc in &agent.mods {
        let mut part = mc.mod_type.abbrev().to_owned();
        if let Some(residue) = &mc.residue {
            part.push_str(residue);
        }
        if let Some(position) = &mc.position {
            part.push_str(position);
        }
        parts.push(part);
    }
    for mc in &agent.mutations {
        let mut part = mc.residue_from.clone().unwrap_or_else(|| "X".to_owned());
        if let Some(position) = &mc.position {
            part.push_str(position);
        }
        if let Some(to) = &mc.residue_to {
            part.push_str(to);
        }
        parts.push(part);
    }
    for bc in &agent.bound_conditions {
        let name = ident::sanitize(&bc.agent.name);
        if bc.is_bound {
            parts.push(name);
        } else {
            parts.push(format!("n{name}"));
        }
    }
    if let Some(location) = &agent.location {
        parts.push(ident::sanitize(location));
    }
    parts.join("_")
}

/// Lowercased first character of a sanitized name, for rate-parameter stems.
pub fn name_initial(name: &str) -> char {
    ident::sanitize(name)
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .unwrap_or('x')
}

/// The unconditional form of an agent: bound and modification conditions
/// stripped, static mutations preserved.
pub fn uncond_agent(agent: &Agent) -> Agent {
    let mut uncond = Agent::new(&ident::sanitize(&agent.name));
    uncond.mutations = agent.mutations.clone();
    uncond
}

/// State-valued site pattern of an agent: modifications, mutations, location
/// and activity. Binding conditions carry no state value and are skipped.
pub fn state_site_pattern(agent: &Agent) -> SitePattern {
    let mut pattern = SitePattern::new();
    for mc in &agent.mods {
        let site = mod_site_name(mc.mod_type, mc.residue.as_deref(), mc.position.as_deref());
        let (unmod_state, mod_state) = mc.mod_type.site_states();
        let state = if mc.is_modified { mod_state } else { unmod_state };
        pattern.insert(site, state.to_owned());
    }
    for mc in &agent.mutations {
        if let (Some(site), Some(to)) = (mutation_site_name(mc), mc.residue_to.as_deref()) {
            pattern.insert(site, to.to_owned());
        }
    }
    if let Some(location) = &agent.location {
        pattern.insert("loc".to_owned(), ident::sanitize(location));
    }
    if let Some(activity) = &agent.activity {
        let state = if activity.is_active { "active" } else { "inactive" };
        pattern.insert(ident::sanitize(&activity.activity_type), state.to_owned());
    }
    if !agent.bound_conditions.is_empty() {
        debug!(agent = %agent.name, "binding conditions skipped in state pattern");
    }
    pattern
}

/// Full site pattern of an agent, including bond conditions.
pub fn site_pattern(agent: &Agent, hierarchies: &HierarchySet) -> Vec<(String, SiteState)> {
    let mut pattern: Vec<(String, SiteState)> = Vec::new();
    for bc in &agent.bound_conditions {
        let site = binding_site_name(&bc.agent, hierarchies);
        let state = if bc.is_bound {
            SiteState::BoundAny
        } else {
            SiteState::Unbound
        };
        pattern.push((site, state));
    }
    for mc in &agent.mods {
        let site = mod_site_name(mc.mod_type, mc.residue.as_deref(), mc.position.as_deref());
        let (unmod_state, mod_state) = mc.mod_type.site_states();
        let state = if mc.is_modified { mod_state } else { unmod_state };
        pattern.push((site, SiteState::StateWild(state.to_owned())));
    }
    for mc in &agent.mutations {
        if let (Some(site), Some(to)) = (mutation_site_name(mc), mc.residue_to.as_deref()) {
            pattern.push((site, SiteState::State(to.to_owned())));
        }
    }
    if let Some(location) = &agent.location {
        pattern.push(("loc".to_owned(), SiteState::State(ident::sanitize(location))));
    }
    if let Some(activity) = &agent.activity {
        let state = if activity.is_active { "active" } else { "inactive" };
        pattern.push((
            ident::sanitize(&activity.activity_type),
            SiteState::State(state.to_owned()),
        ));
    }
    pattern
}

/// Construct a validated monomer pattern for an agent against the model's
/// monomer signature, with optional extra site conditions layered on top.
///
/// Returns `None`, with a diagnostic, when the monomer is missing or the
/// generated pattern names a site or state outside the signature; the caller
/// skips that rule variant.
pub fn monomer_pattern(
    model: &Model,
    agent: &Agent,
    hierarchies: &HierarchySet,
    extra: &[(String, SiteState)],
) -> Option<MonomerPattern> {
    let name = ident::sanitize(&agent.name);
    let Some(monomer) = model.monomer(&name) else {
        debug!(monomer = %name, "monomer not found in model");
        return None;
    };
    let mut mp = MonomerPattern::new(&name);
    for (site, state) in site_pattern(agent, hierarchies).into_iter().chain(extra.iter().cloned()) {
        if !monomer.sites.iter().any(|s| *s == site) {
            debug!(monomer = %name, site, "invalid site in pattern, skipping variant");
            return None;
        }
        let state_value = match &state {
            SiteState::State(s) | SiteState::StateWild(s) => Some(s.clone()),
            _ => None,
        };
        if let Some(value) = state_value {
            let known = monomer
                .site_states
                .get(&site)
                .is_some_and(|states| states.iter().any(|s| *s == value));
            if !known {
                debug!(monomer = %name, site, state = %value, "invalid site state, skipping variant");
                return None;
            }
        }
        mp.sites.insert(site, state);
    }
    Some(mp)
}
