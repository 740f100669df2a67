//! Handlers for complex-formation statements.
//!
//! Under `one_step` every pair of members gets a reversible bind/dissociate
//! rule pair with reciprocal binding sites, so the complex can be fully
//! connected. `multi_way` instead emits a single n-way association rule with
//! one bond index per member pair.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{Annotation, Model, MonomerPattern, ReactionPattern, Rule, SiteState};
use crate::statement::{Statement, StatementKind};

use super::base_agent::BaseAgentRegistry;
use super::{add_rule_with_anns, sites};
use crate::ident;

fn payload(stmt: &Statement) -> Option<&crate::statement::ComplexFormation> {
    match &stmt.kind {
        StatementKind::Complex(c) => Some(c),
        _ => None,
    }
}

/// Each member gets a binding site for every other member.
pub(super) fn monomers_one_step(stmt: &Statement, agents: &mut BaseAgentRegistry) {
    let Some(c) = payload(stmt) else { return };
    for (i, member) in c.members.iter().enumerate() {
        let name = agents.get_or_create(member);
        for (j, partner) in c.members.iter().enumerate() {
            if i == j {
                continue;
            }
            let site = sites::binding_site_name(partner, agents.hierarchies());
            agents.agent_mut(&name).create_site(&site);
        }
    }
}

/// Pairwise reversible binding between all members.
pub(super) fn assemble_one_step(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(c) = payload(stmt) else { return };
    let hierarchies = agents.hierarchies();
    if c.members.len() < 2 {
        debug!("complex with fewer than two members, skipping");
        return;
    }
    for i in 0..c.members.len() {
        for j in (i + 1)..c.members.len() {
            let agent1 = &c.members[i];
            let agent2 = &c.members[j];
            let stem = format!(
                "{}{}_bind",
                sites::name_initial(&agent1.name),
                sites::name_initial(&agent2.name)
            );
            let kf_bind = model.get_create_parameter(&format!("kf_{stem}"), 1e-6, true);
            let kr_bind = model.get_create_parameter(&format!("kr_{stem}"), 1e-3, true);

            // Site on each member named after the other.
            let agent1_bs = sites::binding_site_name(agent2, hierarchies);
            let agent2_bs = sites::binding_site_name(agent1, hierarchies);

            let Some(pattern1) = sites::monomer_pattern(model, agent1, hierarchies, &[]) else {
                continue;
            };
            let Some(pattern2) = sites::monomer_pattern(model, agent2, hierarchies, &[]) else {
                continue;
            };

            let rule_name = format!(
                "{}_{}_bind",
                sites::agent_rule_label(agent1),
                sites::agent_rule_label(agent2)
            );
            let inserted = add_rule_with_anns(
                model,
                rule_name.clone(),
                ReactionPattern::of(vec![
                    pattern1.clone().set(&agent1_bs, SiteState::Unbound),
                    pattern2.clone().set(&agent2_bs, SiteState::Unbound),
                ]),
                ReactionPattern::complex(vec![
                    pattern1.clone().set(&agent1_bs, SiteState::Bond(1)),
                    pattern2.clone().set(&agent2_bs, SiteState::Bond(1)),
                ]),
                kf_bind,
                &pattern1.monomer,
                &pattern2.monomer,
            );
            if inserted {
                // Binding is symmetric: both members are subject and object.
                model.add_annotation(Annotation::new(&rule_name, &pattern2.monomer, "rule_has_subject"));
                model.add_annotation(Annotation::new(&rule_name, &pattern1.monomer, "rule_has_object"));
            }

            // Dissociation is unconditional.
            let agent1_uncond = sites::uncond_agent(agent1);
            let agent2_uncond = sites::uncond_agent(agent2);
            let (Some(u1_bound), Some(u2_bound), Some(u1_free), Some(u2_free)) = (
                sites::monomer_pattern(
                    model,
                    &agent1_uncond,
                    hierarchies,
                    &[(agent1_bs.clone(), SiteState::Bond(1))],
                ),
                sites::monomer_pattern(
                    model,
                    &agent2_uncond,
                    hierarchies,
                    &[(agent2_bs.clone(), SiteState::Bond(1))],
                ),
                sites::monomer_pattern(
                    model,
                    &agent1_uncond,
                    hierarchies,
                    &[(agent1_bs.clone(), SiteState::Unbound)],
                ),
                sites::monomer_pattern(
                    model,
                    &agent2_uncond,
                    hierarchies,
                    &[(agent2_bs.clone(), SiteState::Unbound)],
                ),
            ) else {
                continue;
            };
            let dissoc_name = format!(
                "{}_{}_dissociate",
                sites::agent_rule_label(&agent1_uncond),
                sites::agent_rule_label(&agent2_uncond)
            );
            let inserted = add_rule_with_anns(
                model,
                dissoc_name.clone(),
                ReactionPattern::complex(vec![u1_bound, u2_bound]),
                ReactionPattern::of(vec![u1_free.clone(), u2_free.clone()]),
                kr_bind,
                &u1_free.monomer,
                &u2_free.monomer,
            );
            if inserted {
                model.add_annotation(Annotation::new(&dissoc_name, &u2_free.monomer, "rule_has_subject"));
                model.add_annotation(Annotation::new(&dissoc_name, &u1_free.monomer, "rule_has_object"));
            }
        }
    }
}

/// A single n-way association rule, with a unique bond index per member pair.
pub(super) fn assemble_multi_way(stmt: &Statement, model: &mut Model, agents: &BaseAgentRegistry) {
    let Some(c) = payload(stmt) else { return };
    let hierarchies = agents.hierarchies();
    if c.members.len() < 2 {
        debug!("complex with fewer than two members, skipping");
        return;
    }
    let initials: String = c.members.iter().map(|m| sites::name_initial(&m.name)).collect();
    let kf_bind = model.get_create_parameter(&format!("kf_{initials}_bind"), 1e-6, true);
    let kr_bind = model.get_create_parameter(&format!("kr_{initials}_bind"), 1e-6, true);

    let rule_stem = c
        .members
        .iter()
        .map(sites::agent_rule_label)
        .collect::<Vec<_>>()
        .join("_");

    // One bond index per unordered member pair.
    let mut bond_indices: BTreeMap<(usize, usize), u32> = BTreeMap::new();
    let mut bond_counter = 1u32;
    let mut lhs_monomers = Vec::new();
    let mut rhs_monomers = Vec::new();
    for (i, member) in c.members.iter().enumerate() {
        let name = ident::sanitize(&member.name);
        if model.monomer(&name).is_none() {
            debug!(monomer = %name, "monomer not found in model, skipping complex rule");
            return;
        }
        let mut left = MonomerPattern::new(&name);
        let mut right = MonomerPattern::new(&name);
        for (j, partner) in c.members.iter().enumerate() {
            if i == j {
                continue;
            }
            let pair = (i.min(j), i.max(j));
            let bond = *bond_indices.entry(pair).or_insert_with(|| {
                let b = bond_counter;
                bond_counter += 1;
                b
            });
            let site = sites::binding_site_name(partner, hierarchies);
            left = left.set(&site, SiteState::Unbound);
            right = right.set(&site, SiteState::Bond(bond));
        }
        // Member state conditions appear on both sides unchanged.
        for (site, state) in sites::state_site_pattern(member) {
            left = left.set(&site, SiteState::State(state.clone()));
            right = right.set(&site, SiteState::State(state));
        }
        if member.bound_conditions.len() > 1 {
            debug!(member = %member.name, "multi-way assembly supports one bound condition per member");
        }
        if let Some(bc) = member.bound_conditions.first() {
            let site = sites::binding_site_name(&bc.agent, hierarchies);
            let state = if bc.is_bound {
                SiteState::BoundAny
            } else {
                SiteState::Unbound
            };
            left = left.set(&site, state.clone());
            right = right.set(&site, state);
        }
        lhs_monomers.push(left);
        rhs_monomers.push(right);
    }

    model.add_rule(Rule {
        name: format!("{rule_stem}_bind_fwd"),
        lhs: ReactionPattern::of(lhs_monomers.clone()),
        rhs: ReactionPattern::complex(rhs_monomers.clone()),
        rate: kf_bind,
    });
    model.add_rule(Rule {
        name: format!("{rule_stem}_bind_rev"),
        lhs: ReactionPattern::complex(rhs_monomers),
        rhs: ReactionPattern::of(lhs_monomers),
        rate: kr_bind,
    });
}
