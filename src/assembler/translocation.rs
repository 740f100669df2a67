//! Handler for translocation statements.
//!
//! A translocation with both compartments known becomes a `loc` site flip;
//! statements missing either compartment are skipped.

use tracing::debug;

use crate::model::{Model, ReactionPattern, Rule, SiteState};
use crate::statement::{Statement, StatementKind};

use super::base_agent::BaseAgentRegistry;
use super::sites;
use crate::ident;

pub(super) fn monomers_default(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::Translocation(t) = &stmt.kind else { return };
    let (Some(from), Some(to)) = (&t.from_location, &t.to_location) else {
        debug!(agent = %t.agent.name, "translocation without both compartments, skipping");
        return;
    };
    let name = agents.get_or_create(&t.agent);
    let from = ident::sanitize(from);
    let to = ident::sanitize(to);
    agents
        .agent_mut(&name)
        .create_site_states("loc", &[from.as_str(), to.as_str()]);
}

pub(super) fn assemble_default(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let StatementKind::Translocation(t) = &stmt.kind else { return };
    let (Some(from), Some(to)) = (&t.from_location, &t.to_location) else {
        return;
    };
    let hierarchies = agents.hierarchies();
    let from = ident::sanitize(from);
    let to = ident::sanitize(to);
    let param_name = format!(
        "kf_{}_{}_{}",
        ident::sanitize(&t.agent.name).to_lowercase(),
        from,
        to
    );
    let kf_trans = model.get_create_parameter(&param_name, 1.0, true);
    let Some(agent_from) = sites::monomer_pattern(
        model,
        &t.agent,
        hierarchies,
        &[("loc".to_owned(), SiteState::State(from.clone()))],
    ) else {
        return;
    };
    let Some(agent_to) = sites::monomer_pattern(
        model,
        &t.agent,
        hierarchies,
        &[("loc".to_owned(), SiteState::State(to.clone()))],
    ) else {
        return;
    };
    let rule_name = format!(
        "{}_translocates_{}_to_{}",
        sites::agent_rule_label(&t.agent),
        from,
        to
    );
    model.add_rule(Rule {
        name: rule_name,
        lhs: ReactionPattern::of(vec![agent_from]),
        rhs: ReactionPattern::of(vec![agent_to]),
        rate: kf_trans,
    });
}
