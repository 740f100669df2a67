//! Handlers for amount regulation: synthesis and degradation.
//!
//! A subject-less DecreaseAmount is unimolecular decay (pattern to nothing);
//! a subject-less IncreaseAmount is unconditional synthesis of the object's
//! ground state. Subject-bearing variants keep the subject on both sides.

use crate::model::{Model, MonomerPattern, ReactionPattern, Rule, SiteState};
use crate::statement::{Statement, StatementKind};

use super::base_agent::BaseAgentRegistry;
use super::sites;
use crate::ident;

fn payload(stmt: &Statement) -> Option<&crate::statement::RegulateAmount> {
    match &stmt.kind {
        StatementKind::IncreaseAmount(r) | StatementKind::DecreaseAmount(r) => Some(r),
        _ => None,
    }
}

pub(super) fn monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(r) = payload(stmt) else { return };
    agents.get_or_create(&r.obj);
    if let Some(subj) = &r.subj {
        agents.get_or_create(subj);
    }
}

pub(super) fn monomers_interactions_only(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(r) = payload(stmt) else { return };
    let Some(subj) = &r.subj else { return };
    let subj_name = agents.get_or_create(subj);
    let obj_name = agents.get_or_create(&r.obj);
    let subj_site = sites::binding_site_name(&r.obj, agents.hierarchies());
    let obj_site = sites::binding_site_name(subj, agents.hierarchies());
    agents.agent_mut(&subj_name).create_site(&subj_site);
    agents.agent_mut(&obj_name).create_site(&obj_site);
}

pub(super) fn decrease_assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(r) = payload(stmt) else { return };
    let hierarchies = agents.hierarchies();
    let Some(obj_pattern) = sites::monomer_pattern(model, &r.obj, hierarchies, &[]) else {
        return;
    };
    let obj_label = sites::agent_rule_label(&r.obj);
    match &r.subj {
        None => {
            // Unimolecular decay with an apparent first-order rate.
            let param_name = format!("kf_{}_deg", sites::name_initial(&r.obj.name));
            let kf_degrade = model.get_create_parameter(&param_name, 2e-5, true);
            model.add_rule(Rule {
                name: format!("{obj_label}_degraded"),
                lhs: ReactionPattern::of(vec![obj_pattern]),
                rhs: ReactionPattern::none(),
                rate: kf_degrade,
            });
        }
        Some(subj) => {
            let Some(subj_pattern) = sites::monomer_pattern(model, subj, hierarchies, &[]) else {
                return;
            };
            // Scaled down by the default protein initial amount.
            let param_name = format!(
                "kf_{}{}_deg",
                sites::name_initial(&subj.name),
                sites::name_initial(&r.obj.name)
            );
            let kf_degrade = model.get_create_parameter(&param_name, 2e-7, true);
            let subj_label = sites::agent_rule_label(subj);
            super::add_rule_with_anns(
                model,
                format!("{subj_label}_degrades_{obj_label}"),
                ReactionPattern::of(vec![subj_pattern.clone(), obj_pattern.clone()]),
                ReactionPattern::of(vec![subj_pattern.clone()]),
                kf_degrade,
                &subj_pattern.monomer,
                &obj_pattern.monomer,
            );
        }
    }
}

pub(super) fn increase_assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(r) = payload(stmt) else { return };
    let hierarchies = agents.hierarchies();
    // The object is synthesized in its ground state, fully specified.
    let obj_name = ident::sanitize(&r.obj.name);
    let Some(obj_monomer) = model.monomer(&obj_name) else {
        return;
    };
    let obj_ground = obj_monomer.ground_pattern();
    let obj_label = sites::agent_rule_label(&r.obj);
    match &r.subj {
        None => {
            let param_name = format!("kf_{}_synth", sites::name_initial(&r.obj.name));
            let kf_synth = model.get_create_parameter(&param_name, 2e-3, true);
            model.add_rule(Rule {
                name: format!("{obj_label}_synthesized"),
                lhs: ReactionPattern::none(),
                rhs: ReactionPattern::of(vec![obj_ground]),
                rate: kf_synth,
            });
        }
        Some(subj) => {
            let Some(subj_pattern) = sites::monomer_pattern(model, subj, hierarchies, &[]) else {
                return;
            };
            // Scaled up against the default protein initial amount.
            let param_name = format!(
                "kf_{}{}_synth",
                sites::name_initial(&subj.name),
                sites::name_initial(&r.obj.name)
            );
            let kf_synth = model.get_create_parameter(&param_name, 2e-1, true);
            let subj_label = sites::agent_rule_label(subj);
            super::add_rule_with_anns(
                model,
                format!("{subj_label}_synthesizes_{obj_label}"),
                ReactionPattern::of(vec![subj_pattern.clone()]),
                ReactionPattern::of(vec![subj_pattern.clone(), obj_ground.clone()]),
                kf_synth,
                &subj_pattern.monomer,
                &obj_ground.monomer,
            );
        }
    }
}

fn contact_rule(
    model: &mut Model,
    subj: &crate::agent::Agent,
    obj: &crate::agent::Agent,
    agents: &BaseAgentRegistry,
    verb: &str,
) {
    let kf_bind = model.get_create_parameter("kf_bind", 1.0, false);
    let subj_name = ident::sanitize(&subj.name);
    let obj_name = ident::sanitize(&obj.name);
    if model.monomer(&subj_name).is_none() || model.monomer(&obj_name).is_none() {
        return;
    }
    let subj_site = sites::binding_site_name(obj, agents.hierarchies());
    let obj_site = sites::binding_site_name(subj, agents.hierarchies());
    let rule_name = format!(
        "{}_{verb}_{}",
        sites::agent_rule_label(subj),
        sites::agent_rule_label(obj)
    );
    model.add_rule(Rule {
        name: rule_name,
        lhs: ReactionPattern::of(vec![
            MonomerPattern::new(&subj_name).set(&subj_site, SiteState::Unbound),
            MonomerPattern::new(&obj_name).set(&obj_site, SiteState::Unbound),
        ]),
        rhs: ReactionPattern::complex(vec![
            MonomerPattern::new(&subj_name).set(&subj_site, SiteState::Bond(1)),
            MonomerPattern::new(&obj_name).set(&obj_site, SiteState::Bond(1)),
        ]),
        rate: kf_bind,
    });
}

pub(super) fn decrease_assemble_interactions_only(
    stmt: &Statement,
    model: &mut Model,
    agents: &BaseAgentRegistry,
) {
    let Some(r) = payload(stmt) else { return };
    let Some(subj) = &r.subj else { return };
    contact_rule(model, subj, &r.obj, agents, "degrades");
}

pub(super) fn increase_assemble_interactions_only(
    stmt: &Statement,
    model: &mut Model,
    agents: &BaseAgentRegistry,
) {
    let Some(r) = payload(stmt) else { return };
    let Some(subj) = &r.subj else { return };
    contact_rule(model, subj, &r.obj, agents, "synthesizes");
}
