//! Handlers for activity regulation, active forms, and GEF/GAP switching.
//!
//! Activity regulation toggles an `inactive`/`active` site on the regulated
//! entity; active-form statements only feed the base-agent registry, turning
//! observed site/state patterns into the multi-form expansion used by every
//! other handler. GEF/GAP statements switch the dedicated `gtpbound` site.

use crate::model::{Model, MonomerPattern, ReactionPattern, Rule, SiteState};
use crate::statement::{Statement, StatementKind};

use super::base_agent::BaseAgentRegistry;
use super::{add_rule_with_anns, form_counter, sites};
use crate::ident;

// ---------------------------------------------------------------------------
// Regulate activity
// ---------------------------------------------------------------------------

pub(super) fn regulate_monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::RegulateActivity(r) = &stmt.kind else { return };
    agents.get_or_create(&r.subj);
    let obj_name = agents.get_or_create(&r.obj);
    let site = ident::sanitize(&r.obj_activity);
    let obj = agents.agent_mut(&obj_name);
    obj.create_site_states(&site, &["inactive", "active"]);
    obj.add_activity_type(&site);
}

pub(super) fn regulate_monomers_interactions_only(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::RegulateActivity(r) = &stmt.kind else { return };
    let subj_name = agents.get_or_create(&r.subj);
    let obj_name = agents.get_or_create(&r.obj);
    let subj_site = match &r.subj.activity {
        Some(activity) => ident::sanitize(&activity.activity_type),
        None => "activity".to_owned(),
    };
    agents.agent_mut(&subj_name).create_site(&subj_site);
    agents
        .agent_mut(&obj_name)
        .create_site(&ident::sanitize(&r.obj_activity));
}

pub(super) fn regulate_assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let StatementKind::RegulateActivity(r) = &stmt.kind else { return };
    let hierarchies = agents.hierarchies();
    let act_site = ident::sanitize(&r.obj_activity);

    // The subject's own activity flag is replaced by its known active forms.
    let mut subj = r.subj.clone();
    subj.activity = None;
    let Some(subj_pattern) = sites::monomer_pattern(model, &subj, hierarchies, &[]) else {
        return;
    };
    let Some(obj_inactive) = sites::monomer_pattern(
        model,
        &r.obj,
        hierarchies,
        &[(act_site.clone(), SiteState::State("inactive".to_owned()))],
    ) else {
        return;
    };
    let Some(obj_active) = sites::monomer_pattern(
        model,
        &r.obj,
        hierarchies,
        &[(act_site.clone(), SiteState::State("active".to_owned()))],
    ) else {
        return;
    };

    let param_name = format!(
        "kf_{}{}_act",
        sites::name_initial(&subj.name),
        sites::name_initial(&r.obj.name)
    );
    let kf_act = model.get_create_parameter(&param_name, 1e-6, true);

    let (obj_from, obj_to) = if r.is_activation {
        (obj_inactive, obj_active)
    } else {
        (obj_active, obj_inactive)
    };
    let polarity = if r.is_activation { "activates" } else { "deactivates" };
    let subj_label = sites::agent_rule_label(&subj);
    let obj_label = sites::agent_rule_label(&r.obj);
    let act_patterns = agents.active_patterns(&subj);
    for (i, af) in act_patterns.iter().enumerate() {
        let counter = form_counter(i, act_patterns.len());
        let rule_name = format!("{subj_label}_{polarity}_{obj_label}_{act_site}{counter}");
        let subj_af = subj_pattern.clone().with_states(af);
        add_rule_with_anns(
            model,
            rule_name,
            ReactionPattern::of(vec![subj_af.clone(), obj_from.clone()]),
            ReactionPattern::of(vec![subj_af, obj_to.clone()]),
            kf_act.clone(),
            &subj_pattern.monomer,
            &obj_to.monomer,
        );
    }
}

pub(super) fn regulate_assemble_interactions_only(
    stmt: &Statement,
    model: &mut Model,
    _agents: &BaseAgentRegistry,
) {
    let StatementKind::RegulateActivity(r) = &stmt.kind else { return };
    let kf_bind = model.get_create_parameter("kf_bind", 1.0, false);
    let subj_name = ident::sanitize(&r.subj.name);
    let obj_name = ident::sanitize(&r.obj.name);
    if model.monomer(&subj_name).is_none() || model.monomer(&obj_name).is_none() {
        return;
    }
    let subj_site = match &r.subj.activity {
        Some(activity) => ident::sanitize(&activity.activity_type),
        None => "activity".to_owned(),
    };
    let obj_site = ident::sanitize(&r.obj_activity);
    let polarity = if r.is_activation { "activates" } else { "deactivates" };
    let rule_name = format!(
        "{}_{}_{}_{}",
        sites::agent_rule_label(&r.subj),
        polarity,
        sites::agent_rule_label(&r.obj),
        obj_site
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

// ---------------------------------------------------------------------------
// Active form
// ---------------------------------------------------------------------------

/// Record the agent's site/state pattern as an active or inactive form;
/// no rules are generated.
pub(super) fn active_form_monomers(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::ActiveForm(a) = &stmt.kind else { return };
    agents.add_activity_form(&a.agent, a.is_active);
}

// ---------------------------------------------------------------------------
// GEF / GAP
// ---------------------------------------------------------------------------

pub(super) fn gef_monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::GefActivation(g) = &stmt.kind else { return };
    agents.get_or_create(&g.gef);
    gtpase_monomers(&g.ras, agents);
}

pub(super) fn gap_monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::GapInactivation(g) = &stmt.kind else { return };
    agents.get_or_create(&g.gap);
    gtpase_monomers(&g.ras, agents);
}

/// The GTPase gets a `gtpbound` switch whose states are its activity forms.
fn gtpase_monomers(ras: &crate::agent::Agent, agents: &mut BaseAgentRegistry) {
    let ras_name = agents.get_or_create(ras);
    let base = agents.agent_mut(&ras_name);
    base.create_site_states("gtpbound", &["inactive", "active"]);
    let mut active = crate::model::SitePattern::new();
    active.insert("gtpbound".to_owned(), "active".to_owned());
    base.add_activity_form(active, true);
    let mut inactive = crate::model::SitePattern::new();
    inactive.insert("gtpbound".to_owned(), "inactive".to_owned());
    base.add_activity_form(inactive, false);
}

pub(super) fn gef_assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let StatementKind::GefActivation(g) = &stmt.kind else { return };
    gtpase_switch_rule(model, agents, &g.gef, &g.ras, true);
}

pub(super) fn gap_assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let StatementKind::GapInactivation(g) = &stmt.kind else { return };
    gtpase_switch_rule(model, agents, &g.gap, &g.ras, false);
}

fn gtpase_switch_rule(
    model: &mut Model,
    agents: &BaseAgentRegistry,
    regulator: &crate::agent::Agent,
    ras: &crate::agent::Agent,
    activating: bool,
) {
    let hierarchies = agents.hierarchies();
    let Some(reg_pattern) = sites::monomer_pattern(model, regulator, hierarchies, &[]) else {
        return;
    };
    let Some(ras_inactive) = sites::monomer_pattern(
        model,
        ras,
        hierarchies,
        &[("gtpbound".to_owned(), SiteState::State("inactive".to_owned()))],
    ) else {
        return;
    };
    let Some(ras_active) = sites::monomer_pattern(
        model,
        ras,
        hierarchies,
        &[("gtpbound".to_owned(), SiteState::State("active".to_owned()))],
    ) else {
        return;
    };
    let (stem, verb, from, to) = if activating {
        ("gef", "activates", ras_inactive, ras_active)
    } else {
        ("gap", "deactivates", ras_active, ras_inactive)
    };
    let param_name = format!(
        "kf_{}{}_{stem}",
        sites::name_initial(&regulator.name),
        sites::name_initial(&ras.name)
    );
    let kf = model.get_create_parameter(&param_name, 1e-6, true);
    let rule_name = format!(
        "{}_{verb}_{}",
        sites::agent_rule_label(regulator),
        sites::agent_rule_label(ras)
    );
    add_rule_with_anns(
        model,
        rule_name,
        ReactionPattern::of(vec![reg_pattern.clone(), from.clone()]),
        ReactionPattern::of(vec![reg_pattern.clone(), to]),
        kf,
        &reg_pattern.monomer,
        &from.monomer,
    );
}

pub(super) fn gef_monomers_interactions_only(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::GefActivation(g) = &stmt.kind else { return };
    let gef_name = agents.get_or_create(&g.gef);
    agents.agent_mut(&gef_name).create_site("gef_site");
    let ras_name = agents.get_or_create(&g.ras);
    agents.agent_mut(&ras_name).create_site("p_loop");
}

pub(super) fn gap_monomers_interactions_only(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let StatementKind::GapInactivation(g) = &stmt.kind else { return };
    let gap_name = agents.get_or_create(&g.gap);
    agents.agent_mut(&gap_name).create_site("gap_site");
    let ras_name = agents.get_or_create(&g.ras);
    agents.agent_mut(&ras_name).create_site("gtp_site");
}

pub(super) fn gef_assemble_interactions_only(
    stmt: &Statement,
    model: &mut Model,
    _agents: &BaseAgentRegistry,
) {
    let StatementKind::GefActivation(g) = &stmt.kind else { return };
    gtpase_contact_rule(model, &g.gef, &g.ras, "gef_site", "p_loop", "activates");
}

pub(super) fn gap_assemble_interactions_only(
    stmt: &Statement,
    model: &mut Model,
    _agents: &BaseAgentRegistry,
) {
    let StatementKind::GapInactivation(g) = &stmt.kind else { return };
    gtpase_contact_rule(model, &g.gap, &g.ras, "gap_site", "gtp_site", "inactivates");
}

fn gtpase_contact_rule(
    model: &mut Model,
    regulator: &crate::agent::Agent,
    ras: &crate::agent::Agent,
    reg_site: &str,
    ras_site: &str,
    verb: &str,
) {
    let kf_bind = model.get_create_parameter("kf_bind", 1.0, false);
    let reg_name = ident::sanitize(&regulator.name);
    let ras_name = ident::sanitize(&ras.name);
    if model.monomer(&reg_name).is_none() || model.monomer(&ras_name).is_none() {
        return;
    }
    let rule_name = format!(
        "{}_{verb}_{}",
        sites::agent_rule_label(regulator),
        sites::agent_rule_label(ras)
    );
    model.add_rule(Rule {
        name: rule_name,
        lhs: ReactionPattern::of(vec![
            MonomerPattern::new(&reg_name).set(reg_site, SiteState::Unbound),
            MonomerPattern::new(&ras_name).set(ras_site, SiteState::Unbound),
        ]),
        rhs: ReactionPattern::complex(vec![
            MonomerPattern::new(&reg_name).set(reg_site, SiteState::Bond(1)),
            MonomerPattern::new(&ras_name).set(ras_site, SiteState::Bond(1)),
        ]),
        rate: kf_bind,
    });
}
