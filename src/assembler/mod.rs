//! Rule assembler: compiles a statement corpus into a rule-based model.
//!
//! Assembly runs in two passes over the whitelisted statements. The monomers
//! pass only grows the [`BaseAgentRegistry`]; the rule-generation pass emits
//! rules, parameters and annotations into the [`Model`]. Both passes dispatch
//! through an explicit [`PolicyRegistry`] keyed by (statement type tag,
//! stage, policy name) with a fallback chase: the configured policy first,
//! then `default`, then an [`AssemblyError::UnknownPolicy`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::{Agent, ModType};
use crate::error::{AssemblyError, AssemblyResult};
use crate::model::{Annotation, Model, MonomerPattern, ReactionPattern, Rule, SiteState};
use crate::ontology::{self, HierarchySet};
use crate::statement::{Statement, StatementKind};

pub mod base_agent;
pub mod sites;

mod activity;
mod amount;
mod complex;
mod modification;
mod self_modification;
mod translocation;

pub use base_agent::{BaseAgent, BaseAgentRegistry};

/// The policy applied when none is configured for a statement type.
pub const POLICY_DEFAULT: &str = "default";

// ---------------------------------------------------------------------------
// Policy configuration
// ---------------------------------------------------------------------------

/// Per-type policy table with an `other` fallback, mirroring a configuration
/// such as `{ other = "default", phosphorylation = "two_step" }`.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    per_type: BTreeMap<String, String>,
    other: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            per_type: BTreeMap::new(),
            other: POLICY_DEFAULT.to_owned(),
        }
    }
}

impl PolicyConfig {
    /// One global policy for all statement types.
    pub fn global(policy: &str) -> Self {
        Self {
            per_type: BTreeMap::new(),
            other: policy.to_owned(),
        }
    }

    /// Override the policy for one fine-grained type tag.
    pub fn with_type(mut self, type_tag: &str, policy: &str) -> Self {
        self.per_type.insert(type_tag.to_owned(), policy.to_owned());
        self
    }

    /// The policy configured for a type tag.
    pub fn resolve(&self, type_tag: &str) -> &str {
        self.per_type.get(type_tag).unwrap_or(&self.other)
    }
}

// ---------------------------------------------------------------------------
// Policy registry
// ---------------------------------------------------------------------------

/// Monomers-stage handler: grows base-agent signatures only.
pub type MonomersFn = fn(&Statement, &mut BaseAgentRegistry);

/// Assemble-stage handler: emits rules, parameters and annotations.
pub type AssembleFn = fn(&Statement, &mut Model, &BaseAgentRegistry);

fn noop_monomers(_stmt: &Statement, _agents: &mut BaseAgentRegistry) {}

fn noop_assemble(_stmt: &Statement, _model: &mut Model, _agents: &BaseAgentRegistry) {}

/// Explicit handler registry keyed by (type tag, policy name), one map per
/// stage, populated once at initialization.
pub struct PolicyRegistry {
    monomers: HashMap<(String, String), MonomersFn>,
    assemble: HashMap<(String, String), AssembleFn>,
}

impl PolicyRegistry {
    pub fn empty() -> Self {
        Self {
            monomers: HashMap::new(),
            assemble: HashMap::new(),
        }
    }

    pub fn register_monomers(&mut self, type_tag: &str, policy: &str, f: MonomersFn) {
        self.monomers.insert((type_tag.to_owned(), policy.to_owned()), f);
    }

    pub fn register_assemble(&mut self, type_tag: &str, policy: &str, f: AssembleFn) {
        self.assemble.insert((type_tag.to_owned(), policy.to_owned()), f);
    }

    fn lookup_monomers(&self, type_tag: &str, policy: &str) -> Option<MonomersFn> {
        self.monomers.get(&(type_tag.to_owned(), policy.to_owned())).copied()
    }

    fn lookup_assemble(&self, type_tag: &str, policy: &str) -> Option<AssembleFn> {
        self.assemble.get(&(type_tag.to_owned(), policy.to_owned())).copied()
    }

    /// Resolve a monomers handler: requested policy, then `default`.
    pub fn resolve_monomers(&self, type_tag: &str, policy: &str) -> AssemblyResult<MonomersFn> {
        self.lookup_monomers(type_tag, policy)
            .or_else(|| self.lookup_monomers(type_tag, POLICY_DEFAULT))
            .ok_or_else(|| AssemblyError::UnknownPolicy {
                stage: "monomers",
                type_tag: type_tag.to_owned(),
                policy: policy.to_owned(),
            })
    }

    /// Resolve an assemble handler: requested policy, then `default`.
    pub fn resolve_assemble(&self, type_tag: &str, policy: &str) -> AssemblyResult<AssembleFn> {
        self.lookup_assemble(type_tag, policy)
            .or_else(|| self.lookup_assemble(type_tag, POLICY_DEFAULT))
            .ok_or_else(|| AssemblyError::UnknownPolicy {
                stage: "assemble",
                type_tag: type_tag.to_owned(),
                policy: policy.to_owned(),
            })
    }

    /// The built-in handler set covering every assemblable statement type.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();

        // (De)modification handlers are shared across every mark type; the
        // direction and mark live on the statement. Registration per fine
        // tag preserves per-type policy addressing.
        let mod_types = ModType::CONCRETE.iter().copied().chain([ModType::Modification]);
        for mod_type in mod_types {
            for tag in [mod_type.label(), mod_type.removal_label()] {
                reg.register_monomers(tag, "default", modification::monomers_one_step);
                reg.register_monomers(tag, "one_step", modification::monomers_one_step);
                reg.register_monomers(tag, "two_step", modification::monomers_two_step);
                reg.register_monomers(tag, "interactions_only", modification::monomers_interactions_only);
                reg.register_assemble(tag, "default", modification::assemble_one_step);
                reg.register_assemble(tag, "one_step", modification::assemble_one_step);
                reg.register_assemble(tag, "two_step", modification::assemble_two_step);
                reg.register_assemble(tag, "interactions_only", modification::assemble_interactions_only);
            }
        }
        // The ATP-dependent sub-mechanism only exists for phosphorylation;
        // other types configured with it chase down to their default.
        reg.register_monomers("phosphorylation", "atp_dependent", modification::monomers_atp_dependent);
        reg.register_assemble("phosphorylation", "atp_dependent", modification::assemble_atp_dependent);

        for (tag, monomers, assemble) in [
            (
                "autophosphorylation",
                self_modification::auto_monomers_one_step as MonomersFn,
                self_modification::auto_assemble_one_step as AssembleFn,
            ),
            (
                "transphosphorylation",
                self_modification::trans_monomers_one_step,
                self_modification::trans_assemble_one_step,
            ),
        ] {
            reg.register_monomers(tag, "default", monomers);
            reg.register_monomers(tag, "one_step", monomers);
            reg.register_monomers(tag, "interactions_only", monomers);
            reg.register_assemble(tag, "default", assemble);
            reg.register_assemble(tag, "one_step", assemble);
            reg.register_assemble(tag, "interactions_only", assemble);
        }

        reg.register_monomers("complex", "default", complex::monomers_one_step);
        reg.register_monomers("complex", "one_step", complex::monomers_one_step);
        reg.register_assemble("complex", "default", complex::assemble_one_step);
        reg.register_assemble("complex", "one_step", complex::assemble_one_step);
        reg.register_assemble("complex", "multi_way", complex::assemble_multi_way);

        for tag in ["activation", "inhibition"] {
            reg.register_monomers(tag, "default", activity::regulate_monomers_one_step);
            reg.register_monomers(tag, "one_step", activity::regulate_monomers_one_step);
            reg.register_monomers(tag, "interactions_only", activity::regulate_monomers_interactions_only);
            reg.register_assemble(tag, "default", activity::regulate_assemble_one_step);
            reg.register_assemble(tag, "one_step", activity::regulate_assemble_one_step);
            reg.register_assemble(tag, "interactions_only", activity::regulate_assemble_interactions_only);
        }

        reg.register_monomers("active_form", "default", activity::active_form_monomers);
        reg.register_monomers("active_form", "one_step", activity::active_form_monomers);
        reg.register_monomers("active_form", "interactions_only", noop_monomers);
        reg.register_assemble("active_form", "default", noop_assemble);

        for (tag, monomers, monomers_io, assemble, assemble_io) in [
            (
                "gef_activation",
                activity::gef_monomers_one_step as MonomersFn,
                activity::gef_monomers_interactions_only as MonomersFn,
                activity::gef_assemble_one_step as AssembleFn,
                activity::gef_assemble_interactions_only as AssembleFn,
            ),
            (
                "gap_inactivation",
                activity::gap_monomers_one_step,
                activity::gap_monomers_interactions_only,
                activity::gap_assemble_one_step,
                activity::gap_assemble_interactions_only,
            ),
        ] {
            reg.register_monomers(tag, "default", monomers);
            reg.register_monomers(tag, "one_step", monomers);
            reg.register_monomers(tag, "interactions_only", monomers_io);
            reg.register_assemble(tag, "default", assemble);
            reg.register_assemble(tag, "one_step", assemble);
            reg.register_assemble(tag, "interactions_only", assemble_io);
        }

        reg.register_monomers("translocation", "default", translocation::monomers_default);
        reg.register_assemble("translocation", "default", translocation::assemble_default);

        for tag in ["increase_amount", "decrease_amount"] {
            reg.register_monomers(tag, "default", amount::monomers_one_step);
            reg.register_monomers(tag, "one_step", amount::monomers_one_step);
            reg.register_monomers(tag, "interactions_only", amount::monomers_interactions_only);
        }
        reg.register_assemble("increase_amount", "default", amount::increase_assemble_one_step);
        reg.register_assemble("increase_amount", "one_step", amount::increase_assemble_one_step);
        reg.register_assemble("increase_amount", "interactions_only", amount::increase_assemble_interactions_only);
        reg.register_assemble("decrease_amount", "default", amount::decrease_assemble_one_step);
        reg.register_assemble("decrease_amount", "one_step", amount::decrease_assemble_one_step);
        reg.register_assemble("decrease_amount", "interactions_only", amount::decrease_assemble_interactions_only);

        reg
    }
}

/// Whether the statement type participates in model assembly.
pub fn is_assemblable(stmt: &Statement) -> bool {
    matches!(
        stmt.kind,
        StatementKind::Modification(_)
            | StatementKind::SelfModification(_)
            | StatementKind::Complex(_)
            | StatementKind::RegulateActivity(_)
            | StatementKind::ActiveForm(_)
            | StatementKind::GefActivation(_)
            | StatementKind::GapInactivation(_)
            | StatementKind::Translocation(_)
            | StatementKind::IncreaseAmount(_)
            | StatementKind::DecreaseAmount(_)
    )
}

/// Insert a rule and, when it lands, its subject/object provenance
/// annotations. Returns whether the rule was inserted.
pub(crate) fn add_rule_with_anns(
    model: &mut Model,
    name: String,
    lhs: ReactionPattern,
    rhs: ReactionPattern,
    rate: String,
    subject: &str,
    object: &str,
) -> bool {
    let inserted = model.add_rule(Rule {
        name: name.clone(),
        lhs,
        rhs,
        rate,
    });
    if inserted {
        model.add_annotation(Annotation::new(&name, subject, "rule_has_subject"));
        model.add_annotation(Annotation::new(&name, object, "rule_has_object"));
    }
    inserted
}

/// Uniquifying rule-name suffix for multi-form expansion: `_2`, `_3`, ...
/// when more than one variant is generated.
pub(crate) fn form_counter(index: usize, total: usize) -> String {
    if total > 1 {
        format!("_{}", index + 1)
    } else {
        String::new()
    }
}

// ---------------------------------------------------------------------------
// Grounded monomer patterns
// ---------------------------------------------------------------------------

/// Monomer patterns for an agent resolved through the model's grounding
/// annotations rather than its name.
///
/// The monomer is located via `is` annotations matching the agent's db_refs;
/// each modification on the agent is then satisfied against the monomer's
/// site annotations, constrained by residue and position where given. An
/// unresolvable grounding or unsatisfiable site yields an empty result.
pub fn grounded_monomer_patterns(model: &Model, agent: &Agent) -> Vec<MonomerPattern> {
    let mut monomer = None;
    for ann in model.annotations() {
        if ann.predicate != "is" {
            continue;
        }
        let Some((ns, id)) = ontology::parse_identifiers_url(&ann.object) else {
            continue;
        };
        if agent.db_refs.get(&ns).is_some_and(|v| *v == id) {
            monomer = model.monomer(&ann.subject);
            if monomer.is_some() {
                break;
            }
        }
    }
    let Some(monomer) = monomer else {
        debug!(agent = %agent.name, "no monomer matches the agent grounding");
        return Vec::new();
    };
    if agent.mods.is_empty() {
        return vec![MonomerPattern::new(&monomer.name)];
    }
    let mut patterns = Vec::new();
    for mc in &agent.mods {
        let mut mod_sites: BTreeMap<String, String> = BTreeMap::new();
        let mut res_sites: BTreeSet<String> = BTreeSet::new();
        let mut pos_sites: BTreeSet<String> = BTreeSet::new();
        for ann in &monomer.site_annotations {
            match ann.predicate.as_str() {
                "is_modification" if ann.value == mc.mod_type.label() => {
                    if let Some(state) = &ann.state {
                        mod_sites.insert(ann.site.clone(), state.clone());
                    }
                }
                "is_residue" if Some(ann.value.as_str()) == mc.residue.as_deref() => {
                    res_sites.insert(ann.site.clone());
                }
                "is_position" if Some(ann.value.as_str()) == mc.position.as_deref() => {
                    pos_sites.insert(ann.site.clone());
                }
                _ => {}
            }
        }
        let mut viable: BTreeSet<String> = mod_sites.keys().cloned().collect();
        if mc.residue.is_some() {
            viable = viable.intersection(&res_sites).cloned().collect();
        }
        if mc.position.is_some() {
            viable = viable.intersection(&pos_sites).cloned().collect();
        }
        if viable.is_empty() {
            debug!(agent = %agent.name, "no viable site for modification, no pattern");
            return Vec::new();
        }
        for site in viable {
            let state = mod_sites[&site].clone();
            patterns.push(
                MonomerPattern::new(&monomer.name).set(&site, SiteState::StateWild(state)),
            );
        }
    }
    patterns
}

// ---------------------------------------------------------------------------
// Rule assembler
// ---------------------------------------------------------------------------

/// Initial-condition generation mode for [`RuleAssembler::make_model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialConditions {
    /// No initial conditions.
    Skip,
    /// Ground-state seed for every monomer.
    #[default]
    Base,
    /// Ground-state seeds plus zero-amount fully-modified seeds, for tools
    /// that require every reachable species to carry initial mass.
    Extended,
}

/// Compiles statements into a [`Model`] under a [`PolicyConfig`].
pub struct RuleAssembler {
    statements: Vec<Statement>,
    policies: PolicyConfig,
    registry: PolicyRegistry,
    hierarchies: Arc<HierarchySet>,
    /// Default amount for base initial conditions.
    pub default_initial_amount: f64,
}

impl RuleAssembler {
    pub fn new(hierarchies: Arc<HierarchySet>) -> Self {
        Self {
            statements: Vec::new(),
            policies: PolicyConfig::default(),
            registry: PolicyRegistry::builtin(),
            hierarchies,
            default_initial_amount: 1000.0,
        }
    }

    pub fn with_policies(mut self, policies: PolicyConfig) -> Self {
        self.policies = policies;
        self
    }

    /// Replace the handler registry, e.g. to add custom policies.
    pub fn with_registry(mut self, registry: PolicyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn add_statements(&mut self, stmts: Vec<Statement>) {
        self.statements.extend(stmts);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Run both passes and return the assembled model.
    pub fn make_model(&self, initial_conditions: InitialConditions) -> AssemblyResult<Model> {
        let whitelisted: Vec<&Statement> =
            self.statements.iter().filter(|s| is_assemblable(s)).collect();
        let skipped = self.statements.len() - whitelisted.len();
        if skipped > 0 {
            debug!(skipped, "statements outside the assembly whitelist");
        }
        info!(count = whitelisted.len(), "collecting monomers");

        let mut agents = BaseAgentRegistry::new(self.hierarchies.clone());
        for stmt in &whitelisted {
            let tag = stmt.type_tag();
            let policy = self.policies.resolve(tag);
            let f = self.registry.resolve_monomers(tag, policy)?;
            f(stmt, &mut agents);
        }
        info!(agents = agents.len(), "collected base agents");

        let mut model = Model::new("bioasm_model");
        for (name, base) in agents.iter() {
            model.add_monomer(base.to_monomer());
            for (db_name, db_ref) in &base.db_refs {
                if let Some(url) = ontology::identifiers_url(db_name, db_ref) {
                    model.add_annotation(Annotation::new(name, &url, "is"));
                }
            }
        }

        info!(count = whitelisted.len(), "generating rules");
        for stmt in &whitelisted {
            let tag = stmt.type_tag();
            let policy = self.policies.resolve(tag);
            let f = self.registry.resolve_assemble(tag, policy)?;
            f(stmt, &mut model, &agents);
        }

        match initial_conditions {
            InitialConditions::Skip => {}
            InitialConditions::Base => self.add_default_initials(&mut model),
            InitialConditions::Extended => {
                self.add_default_initials(&mut model);
                let names: Vec<String> =
                    model.monomers().iter().map(|m| m.name.clone()).collect();
                for name in names {
                    model.set_extended_initial(&name);
                }
            }
        }

        info!(
            monomers = model.monomers().len(),
            rules = model.rules().len(),
            parameters = model.parameters().len(),
            "model assembled"
        );
        Ok(model)
    }

    fn add_default_initials(&self, model: &mut Model) {
        let names: Vec<String> = model.monomers().iter().map(|m| m.name.clone()).collect();
        for name in names {
            model.set_base_initial(&name, self.default_initial_amount);
        }
    }
}
