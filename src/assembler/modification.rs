//! Handlers for enzymatic (de)modification statements.
//!
//! One handler family serves every mark type in both directions; the
//! direction decides which site state appears on each side of the rule.
//! Policies: `one_step` (default) direct transformation, `two_step` explicit
//! binding intermediate, `interactions_only` qualitative binding, and the
//! phosphorylation-only `atp_dependent` cofactor sub-mechanism.

use crate::agent::{Agent, ModCondition};
use crate::model::{Model, MonomerPattern, ReactionPattern, Rule, SiteState};
use crate::statement::{ModDirection, Statement, StatementKind};

use super::base_agent::BaseAgentRegistry;
use super::{add_rule_with_anns, form_counter, sites};
use crate::ident;

fn payload(stmt: &Statement) -> Option<&crate::statement::Modification> {
    match &stmt.kind {
        StatementKind::Modification(m) => Some(m),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Monomers stage
// ---------------------------------------------------------------------------

pub(super) fn monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(m) = payload(stmt) else { return };
    let Some(enz) = &m.enz else { return };
    agents.get_or_create(enz);
    let sub_name = agents.get_or_create(&m.sub);
    // A statement carries at most one substrate site; multi-site marks are
    // extracted as separate statements (distributive assumption).
    let mc = ModCondition::new(m.mod_type, m.residue.as_deref(), m.position.as_deref());
    agents.agent_mut(&sub_name).create_mod_site(&mc);
}

pub(super) fn monomers_two_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(m) = payload(stmt) else { return };
    let Some(enz) = &m.enz else { return };
    let enz_name = agents.get_or_create(enz);
    let sub_name = agents.get_or_create(&m.sub);
    let mc = ModCondition::new(m.mod_type, m.residue.as_deref(), m.position.as_deref());
    agents.agent_mut(&sub_name).create_mod_site(&mc);

    let sub_bs = sites::binding_site_name(&m.sub, agents.hierarchies());
    let enz_bs = sites::binding_site_name(enz, agents.hierarchies());
    agents.agent_mut(&enz_name).create_site(&sub_bs);
    agents.agent_mut(&sub_name).create_site(&enz_bs);
}

pub(super) fn monomers_interactions_only(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(m) = payload(stmt) else { return };
    let Some(enz) = &m.enz else { return };
    let enz_name = agents.get_or_create(enz);
    let active_site = sites::mod_activity_site(m.direction, m.mod_type);
    agents.agent_mut(&enz_name).create_site(active_site);
    let sub_name = agents.get_or_create(&m.sub);
    let mc = ModCondition::new(m.mod_type, m.residue.as_deref(), m.position.as_deref());
    agents.agent_mut(&sub_name).create_mod_site(&mc);
}

pub(super) fn monomers_atp_dependent(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(m) = payload(stmt) else { return };
    let Some(enz) = &m.enz else { return };
    monomers_two_step(stmt, agents);
    let enz_name = ident::sanitize(&enz.name);
    let atp_name = agents.get_or_create(&Agent::new("ATP"));
    agents.agent_mut(&atp_name).create_site("b");
    agents.agent_mut(&enz_name).create_site("ATP");
}

// ---------------------------------------------------------------------------
// Assemble stage
// ---------------------------------------------------------------------------

pub(super) fn assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(m) = payload(stmt) else { return };
    let Some(enz_agent) = &m.enz else { return };
    let hierarchies = agents.hierarchies();
    let tag = stmt.type_tag();
    let param_name = format!(
        "kf_{}{}_{}",
        sites::name_initial(&enz_agent.name),
        sites::name_initial(&m.sub.name),
        tag
    );
    let kf = model.get_create_parameter(&param_name, 1e-6, true);

    let mod_site = sites::mod_site_name(m.mod_type, m.residue.as_deref(), m.position.as_deref());
    let (unmod_state, mod_state) = m.mod_type.site_states();
    // The enzyme's own activity flag is replaced by its known active forms.
    let mut enz = enz_agent.clone();
    enz.activity = None;
    let Some(enz_pattern) = sites::monomer_pattern(model, &enz, hierarchies, &[]) else {
        return;
    };
    let Some(sub_unmod) = sites::monomer_pattern(
        model,
        &m.sub,
        hierarchies,
        &[(mod_site.clone(), SiteState::State(unmod_state.to_owned()))],
    ) else {
        return;
    };
    let Some(sub_mod) = sites::monomer_pattern(
        model,
        &m.sub,
        hierarchies,
        &[(mod_site.clone(), SiteState::State(mod_state.to_owned()))],
    ) else {
        return;
    };
    let (sub_from, sub_to) = match m.direction {
        ModDirection::Add => (sub_unmod, sub_mod),
        ModDirection::Remove => (sub_mod, sub_unmod),
    };

    let act_patterns = agents.active_patterns(&enz);
    let enz_label = sites::agent_rule_label(&enz);
    let sub_label = sites::agent_rule_label(&m.sub);
    for (i, af) in act_patterns.iter().enumerate() {
        let counter = form_counter(i, act_patterns.len());
        let rule_name = format!("{enz_label}_{tag}_{sub_label}_{mod_site}{counter}");
        let enz_af = enz_pattern.clone().with_states(af);
        add_rule_with_anns(
            model,
            rule_name,
            ReactionPattern::of(vec![enz_af.clone(), sub_from.clone()]),
            ReactionPattern::of(vec![enz_af, sub_to.clone()]),
            kf.clone(),
            &enz_pattern.monomer,
            &sub_from.monomer,
        );
    }
}

pub(super) fn assemble_two_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(m) = payload(stmt) else { return };
    let Some(enz_agent) = &m.enz else { return };
    let hierarchies = agents.hierarchies();
    let tag = stmt.type_tag();

    let sub_bs = sites::binding_site_name(&m.sub, hierarchies);
    let enz_bs = sites::binding_site_name(enz_agent, hierarchies);
    let mut enz = enz_agent.clone();
    enz.activity = None;

    let ei = sites::name_initial(&enz.name);
    let si = sites::name_initial(&m.sub.name);
    let kf_bind = model.get_create_parameter(&format!("kf_{ei}{si}_bind"), 1e-6, true);
    let kr_bind = model.get_create_parameter(&format!("kr_{ei}{si}_bind"), 1e-3, true);
    let kc_value = match m.direction {
        ModDirection::Add => 1.0,
        ModDirection::Remove => 1e-3,
    };
    let kc_mod = model.get_create_parameter(&format!("kc_{ei}{si}_{tag}"), kc_value, true);

    let Some(enz_bound) = sites::monomer_pattern(
        model,
        &enz,
        hierarchies,
        &[(sub_bs.clone(), SiteState::Bond(1))],
    ) else {
        return;
    };
    let Some(enz_unbound) = sites::monomer_pattern(
        model,
        &enz,
        hierarchies,
        &[(sub_bs.clone(), SiteState::Unbound)],
    ) else {
        return;
    };

    let mod_site = sites::mod_site_name(m.mod_type, m.residue.as_deref(), m.position.as_deref());
    let (unmod_state, mod_state) = m.mod_type.site_states();
    let (from_state, to_state) = match m.direction {
        ModDirection::Add => (unmod_state, mod_state),
        ModDirection::Remove => (mod_state, unmod_state),
    };
    let sub_pattern = |model: &Model, mod_state: &str, bond: SiteState| {
        sites::monomer_pattern(
            model,
            &m.sub,
            hierarchies,
            &[
                (mod_site.clone(), SiteState::State(mod_state.to_owned())),
                (enz_bs.clone(), bond),
            ],
        )
    };

    let act_patterns = agents.active_patterns(&enz);
    let enz_label = sites::agent_rule_label(&enz);
    let sub_label = sites::agent_rule_label(&m.sub);
    for (i, af) in act_patterns.iter().enumerate() {
        let counter = form_counter(i, act_patterns.len());

        let Some(sub_free) = sub_pattern(model, from_state, SiteState::Unbound) else {
            return;
        };
        let Some(sub_bound) = sub_pattern(model, from_state, SiteState::Bond(1)) else {
            return;
        };
        let Some(sub_released) = sub_pattern(model, to_state, SiteState::Unbound) else {
            return;
        };

        let bind_name = format!("{enz_label}_{tag}_bind_{sub_label}_{mod_site}{counter}");
        model.add_rule(Rule {
            name: bind_name,
            lhs: ReactionPattern::of(vec![
                enz_unbound.clone().with_states(af),
                sub_free.clone(),
            ]),
            rhs: ReactionPattern::complex(vec![
                enz_bound.clone().with_states(af),
                sub_bound.clone(),
            ]),
            rate: kf_bind.clone(),
        });

        let cat_name = format!("{enz_label}_{tag}_{sub_label}_{mod_site}{counter}");
        add_rule_with_anns(
            model,
            cat_name,
            ReactionPattern::complex(vec![enz_bound.clone().with_states(af), sub_bound]),
            ReactionPattern::of(vec![enz_unbound.clone().with_states(af), sub_released]),
            kc_mod.clone(),
            &enz_bound.monomer,
            &sub_free.monomer,
        );
    }

    // Dissociation is unconditional: only static mutations survive on the
    // patterns.
    let enz_uncond = sites::uncond_agent(&enz);
    let sub_uncond = sites::uncond_agent(&m.sub);
    let Some(enz_mon_uncond) = sites::monomer_pattern(
        model,
        &enz_uncond,
        hierarchies,
        &[(sub_bs.clone(), SiteState::Bond(1))],
    ) else {
        return;
    };
    let Some(sub_mon_uncond) = sites::monomer_pattern(
        model,
        &sub_uncond,
        hierarchies,
        &[(enz_bs.clone(), SiteState::Bond(1))],
    ) else {
        return;
    };
    let Some(enz_mon_free) = sites::monomer_pattern(
        model,
        &enz_uncond,
        hierarchies,
        &[(sub_bs, SiteState::Unbound)],
    ) else {
        return;
    };
    let Some(sub_mon_free) = sites::monomer_pattern(
        model,
        &sub_uncond,
        hierarchies,
        &[(enz_bs, SiteState::Unbound)],
    ) else {
        return;
    };
    let dissoc_name = format!(
        "{}_dissoc_{}",
        sites::agent_rule_label(&enz_uncond),
        sites::agent_rule_label(&sub_uncond)
    );
    model.add_rule(Rule {
        name: dissoc_name,
        lhs: ReactionPattern::complex(vec![enz_mon_uncond, sub_mon_uncond]),
        rhs: ReactionPattern::of(vec![enz_mon_free, sub_mon_free]),
        rate: kr_bind,
    });
}

pub(super) fn assemble_interactions_only(
    stmt: &Statement,
    model: &mut Model,
    _agents: &BaseAgentRegistry,
) {
    let Some(m) = payload(stmt) else { return };
    let Some(enz) = &m.enz else { return };
    let kf_bind = model.get_create_parameter("kf_bind", 1.0, false);

    let enz_name = ident::sanitize(&enz.name);
    let sub_name = ident::sanitize(&m.sub.name);
    if model.monomer(&enz_name).is_none() || model.monomer(&sub_name).is_none() {
        return;
    }
    let tag = stmt.type_tag();
    let active_site = sites::mod_activity_site(m.direction, m.mod_type);
    let mod_site = sites::mod_site_name(m.mod_type, m.residue.as_deref(), m.position.as_deref());
    let enz_label = sites::agent_rule_label(enz);
    let sub_label = sites::agent_rule_label(&m.sub);
    let suffix = match m.direction {
        ModDirection::Add => "_fwd",
        ModDirection::Remove => "",
    };
    let rule_name = format!("{enz_label}_{tag}_{sub_label}_{mod_site}{suffix}");
    model.add_rule(Rule {
        name: rule_name,
        lhs: ReactionPattern::of(vec![
            MonomerPattern::new(&enz_name).set(active_site, SiteState::Unbound),
            MonomerPattern::new(&sub_name).set(&mod_site, SiteState::Unbound),
        ]),
        rhs: ReactionPattern::complex(vec![
            MonomerPattern::new(&enz_name).set(active_site, SiteState::Bond(1)),
            MonomerPattern::new(&sub_name).set(&mod_site, SiteState::Bond(1)),
        ]),
        rate: kf_bind,
    });
}

pub(super) fn assemble_atp_dependent(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(m) = payload(stmt) else { return };
    if m.direction != ModDirection::Add {
        return;
    }
    let Some(enz_agent) = &m.enz else { return };
    let hierarchies = agents.hierarchies();
    let atp_bs = "ATP";
    let mut enz = enz_agent.clone();
    enz.activity = None;

    let sub_bs = sites::binding_site_name(&m.sub, hierarchies);
    let enz_bs = sites::binding_site_name(&enz, hierarchies);
    let ei = sites::name_initial(&enz.name);
    let si = sites::name_initial(&m.sub.name);

    let kf_bind_atp = model.get_create_parameter(&format!("kf_{ei}_atp_bind"), 1e-6, true);
    let kr_bind_atp = model.get_create_parameter(&format!("kr_{ei}_atp_bind"), 1e-6, true);
    let kf_bind = model.get_create_parameter(&format!("kf_{ei}{si}_bind"), 1e-6, true);
    let kr_bind = model.get_create_parameter(&format!("kr_{ei}{si}_bind"), 1e-3, true);
    let kf_phospho = model.get_create_parameter(&format!("kc_{ei}{si}_phos"), 1.0, true);

    let phos_site = sites::mod_site_name(m.mod_type, m.residue.as_deref(), m.position.as_deref());
    let (unmod_state, mod_state) = m.mod_type.site_states();

    let pat = |model: &Model, agent: &Agent, extra: &[(String, SiteState)]| {
        sites::monomer_pattern(model, agent, hierarchies, extra)
    };
    let Some(enz_atp_bound) = pat(model, &enz, &[(atp_bs.to_owned(), SiteState::Bond(1))]) else {
        return;
    };
    let Some(enz_atp_unbound) = pat(model, &enz, &[(atp_bs.to_owned(), SiteState::Unbound)]) else {
        return;
    };
    let Some(enz_sub_bound) = pat(model, &enz, &[(sub_bs.clone(), SiteState::Bond(1))]) else {
        return;
    };
    let Some(enz_sub_unbound) = pat(model, &enz, &[(sub_bs.clone(), SiteState::Unbound)]) else {
        return;
    };
    let Some(enz_sub_atp_bound) = pat(
        model,
        &enz,
        &[
            (sub_bs.clone(), SiteState::Bond(1)),
            (atp_bs.to_owned(), SiteState::Bond(2)),
        ],
    ) else {
        return;
    };
    let Some(enz_sub_atp_unbound) = pat(
        model,
        &enz,
        &[
            (sub_bs.clone(), SiteState::Unbound),
            (atp_bs.to_owned(), SiteState::Unbound),
        ],
    ) else {
        return;
    };
    let atp_free = MonomerPattern::new("ATP").set("b", SiteState::Unbound);
    let atp_bond = |ix: u32| MonomerPattern::new("ATP").set("b", SiteState::Bond(ix));

    let enz_uncond = sites::uncond_agent(&enz);
    let sub_uncond = sites::uncond_agent(&m.sub);
    let enz_uncond_label = sites::agent_rule_label(&enz_uncond);
    let sub_uncond_label = sites::agent_rule_label(&sub_uncond);
    let enz_label = sites::agent_rule_label(&enz);
    let sub_label = sites::agent_rule_label(&m.sub);
    let act_patterns = agents.active_patterns(&enz);

    // Enzyme binding ATP.
    for (i, af) in act_patterns.iter().enumerate() {
        let counter = form_counter(i, act_patterns.len());
        let rule_name = format!("{enz_uncond_label}_phospho_bind_atp{counter}");
        model.add_rule(Rule {
            name: rule_name,
            lhs: ReactionPattern::of(vec![
                enz_atp_unbound.clone().with_states(af),
                atp_free.clone(),
            ]),
            rhs: ReactionPattern::complex(vec![
                enz_atp_bound.clone().with_states(af),
                atp_bond(1),
            ]),
            rate: kf_bind_atp.clone(),
        });
    }

    // Enzyme releasing ATP, unconditionally.
    if let (Some(uncond_atp_bound), Some(uncond_atp_free)) = (
        pat(model, &enz_uncond, &[(atp_bs.to_owned(), SiteState::Bond(1))]),
        pat(model, &enz_uncond, &[(atp_bs.to_owned(), SiteState::Unbound)]),
    ) {
        model.add_rule(Rule {
            name: format!("{enz_uncond_label}_phospho_dissoc_atp"),
            lhs: ReactionPattern::complex(vec![uncond_atp_bound, atp_bond(1)]),
            rhs: ReactionPattern::of(vec![uncond_atp_free, atp_free.clone()]),
            rate: kr_bind_atp,
        });
    }

    // Enzyme binding substrate.
    let sub_pat = |model: &Model, state: &str, bond: SiteState| {
        sites::monomer_pattern(
            model,
            &m.sub,
            hierarchies,
            &[
                (phos_site.clone(), SiteState::State(state.to_owned())),
                (enz_bs.clone(), bond),
            ],
        )
    };
    for (i, af) in act_patterns.iter().enumerate() {
        let counter = form_counter(i, act_patterns.len());
        let (Some(sub_free), Some(sub_bound)) = (
            sub_pat(model, unmod_state, SiteState::Unbound),
            sub_pat(model, unmod_state, SiteState::Bond(1)),
        ) else {
            return;
        };
        model.add_rule(Rule {
            name: format!("{enz_label}_phospho_bind_{sub_label}_{phos_site}{counter}"),
            lhs: ReactionPattern::of(vec![enz_sub_unbound.clone().with_states(af), sub_free]),
            rhs: ReactionPattern::complex(vec![enz_sub_bound.clone().with_states(af), sub_bound]),
            rate: kf_bind.clone(),
        });
    }

    // Catalysis: transfer the phosphate and release everything.
    for (i, af) in act_patterns.iter().enumerate() {
        let counter = form_counter(i, act_patterns.len());
        let (Some(sub_bound), Some(sub_released)) = (
            sub_pat(model, unmod_state, SiteState::Bond(1)),
            sub_pat(model, mod_state, SiteState::Unbound),
        ) else {
            return;
        };
        let rule_name = format!("{enz_label}_phospho_{sub_label}_{phos_site}{counter}");
        let sub_monomer = sub_released.monomer.clone();
        add_rule_with_anns(
            model,
            rule_name,
            ReactionPattern::complex(vec![
                enz_sub_atp_bound.clone().with_states(af),
                atp_bond(2),
                sub_bound,
            ]),
            ReactionPattern::of(vec![
                enz_sub_atp_unbound.clone().with_states(af),
                atp_free.clone(),
                sub_released,
            ]),
            kf_phospho.clone(),
            &enz_sub_atp_bound.monomer,
            &sub_monomer,
        );
    }

    // Enzyme dissociating from substrate.
    if let (Some(e_bound), Some(s_bound), Some(e_free), Some(s_free)) = (
        pat(model, &enz_uncond, &[(sub_bs.clone(), SiteState::Bond(1))]),
        pat(model, &sub_uncond, &[(enz_bs.clone(), SiteState::Bond(1))]),
        pat(model, &enz_uncond, &[(sub_bs, SiteState::Unbound)]),
        pat(model, &sub_uncond, &[(enz_bs, SiteState::Unbound)]),
    ) {
        model.add_rule(Rule {
            name: format!("{enz_uncond_label}_dissoc_{sub_uncond_label}"),
            lhs: ReactionPattern::complex(vec![e_bound, s_bound]),
            rhs: ReactionPattern::of(vec![e_free, s_free]),
            rate: kr_bind,
        });
    }
}
