//! Handlers for self-modification: cis autophosphorylation and trans
//! phosphorylation of a bound partner.

use tracing::debug;

use crate::agent::{ModCondition, ModType};
use crate::model::{Model, ReactionPattern, SiteState};
use crate::statement::{Statement, StatementKind};

use super::base_agent::BaseAgentRegistry;
use super::{add_rule_with_anns, sites};

fn payload(stmt: &Statement) -> Option<&crate::statement::SelfModification> {
    match &stmt.kind {
        StatementKind::SelfModification(s) => Some(s),
        _ => None,
    }
}

pub(super) fn auto_monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(s) = payload(stmt) else { return };
    let enz_name = agents.get_or_create(&s.enz);
    let mc = ModCondition::new(ModType::Phosphorylation, s.residue.as_deref(), s.position.as_deref());
    agents.agent_mut(&enz_name).create_mod_site(&mc);
}

pub(super) fn auto_assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(s) = payload(stmt) else { return };
    let hierarchies = agents.hierarchies();
    let param_name = format!("kf_{}_autophos", sites::name_initial(&s.enz.name));
    let kf_autophospho = model.get_create_parameter(&param_name, 1e-3, true);
    let phos_site =
        sites::mod_site_name(ModType::Phosphorylation, s.residue.as_deref(), s.position.as_deref());
    let Some(unphos) = sites::monomer_pattern(
        model,
        &s.enz,
        hierarchies,
        &[(phos_site.clone(), SiteState::State("u".to_owned()))],
    ) else {
        return;
    };
    let Some(phos) = sites::monomer_pattern(
        model,
        &s.enz,
        hierarchies,
        &[(phos_site.clone(), SiteState::State("p".to_owned()))],
    ) else {
        return;
    };
    let enz_label = sites::agent_rule_label(&s.enz);
    let rule_name = format!("{enz_label}_autophospho_{enz_label}_{phos_site}");
    add_rule_with_anns(
        model,
        rule_name,
        ReactionPattern::of(vec![unphos.clone()]),
        ReactionPattern::of(vec![phos.clone()]),
        kf_autophospho,
        &unphos.monomer,
        &phos.monomer,
    );
}

pub(super) fn trans_monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(s) = payload(stmt) else { return };
    agents.get_or_create(&s.enz);
    // The substrate is the enzyme's bound partner.
    let Some(bc) = s.enz.bound_conditions.first() else {
        debug!(enz = %s.enz.name, "transphosphorylation without a bound partner, skipping");
        return;
    };
    let sub_name = agents.get_or_create(&bc.agent);
    let mc = ModCondition::new(ModType::Phosphorylation, s.residue.as_deref(), s.position.as_deref());
    agents.agent_mut(&sub_name).create_mod_site(&mc);
}

pub(super) fn trans_assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(s) = payload(stmt) else { return };
    let Some(bc) = s.enz.bound_conditions.first() else {
        return;
    };
    let hierarchies = agents.hierarchies();
    let bound_agent = &bc.agent;
    let param_name = format!(
        "kf_{}{}_transphos",
        sites::name_initial(&s.enz.name),
        sites::name_initial(&bound_agent.name)
    );
    let kf = model.get_create_parameter(&param_name, 1e-3, true);
    let phos_site =
        sites::mod_site_name(ModType::Phosphorylation, s.residue.as_deref(), s.position.as_deref());
    let Some(enz_pattern) = sites::monomer_pattern(model, &s.enz, hierarchies, &[]) else {
        return;
    };
    let Some(sub_unphos) = sites::monomer_pattern(
        model,
        bound_agent,
        hierarchies,
        &[(phos_site.clone(), SiteState::State("u".to_owned()))],
    ) else {
        return;
    };
    let Some(sub_phos) = sites::monomer_pattern(
        model,
        bound_agent,
        hierarchies,
        &[(phos_site.clone(), SiteState::State("p".to_owned()))],
    ) else {
        return;
    };
    let rule_name = format!(
        "{}_transphospho_{}_{}",
        sites::agent_rule_label(&s.enz),
        sites::agent_rule_label(bound_agent),
        phos_site
    );
    add_rule_with_anns(
        model,
        rule_name,
        ReactionPattern::complex(vec![enz_pattern.clone(), sub_unphos.clone()]),
        ReactionPattern::complex(vec![enz_pattern.clone(), sub_phos]),
        kf,
        &enz_pattern.monomer,
        &sub_unphos.monomer,
    );
}
