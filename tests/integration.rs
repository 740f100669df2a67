//! End-to-end tests for the bioasm pipeline.
//!
//! These exercise the full chain from raw statements through deduplication,
//! refinement and belief scoring into rule-model compilation, validating the
//! corpus and assembler contracts together.

use std::sync::Arc;

use bioasm::agent::{Agent, ModCondition, ModType};
use bioasm::assembler::{InitialConditions, PolicyConfig, RuleAssembler};
use bioasm::export;
use bioasm::ontology::HierarchySet;
use bioasm::pipeline::CorpusPipeline;
use bioasm::statement::{Evidence, Statement};

fn hierarchies() -> Arc<HierarchySet> {
    Arc::new(HierarchySet::with_seed_entities().unwrap())
}

fn braf() -> Agent {
    Agent::new("BRAF").with_grounding("HGNC", "BRAF")
}

fn map2k1() -> Agent {
    Agent::new("MAP2K1").with_grounding("HGNC", "MAP2K1")
}

fn assemble(stmts: Vec<Statement>, policy: &str) -> bioasm::model::Model {
    let mut assembler =
        RuleAssembler::new(hierarchies()).with_policies(PolicyConfig::global(policy));
    assembler.add_statements(stmts);
    assembler.make_model(InitialConditions::Base).unwrap()
}

#[test]
fn one_step_modification_yields_one_rule() {
    // One enzyme active form: exactly one rule, unmodified to modified,
    // driven by a single forward-rate parameter.
    let active_form = Statement::active_form(
        braf().with_mod(ModCondition::new(ModType::Phosphorylation, Some("S"), Some("445"))),
        "kinase",
        true,
    );
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let model = assemble(vec![active_form, phos], "one_step");

    assert_eq!(model.rules().len(), 1);
    let rule = &model.rules()[0];
    assert_eq!(rule.name, "BRAF_phosphorylation_MAP2K1_S218");
    assert!(rule.lhs.to_string().contains("S218~u"));
    assert!(rule.rhs.to_string().contains("S218~p"));
    // The enzyme acts in its known active form.
    assert!(rule.lhs.to_string().contains("S445~p"));
    assert_eq!(rule.rate, "kf_bm_phosphorylation_1");
    assert!(model.parameter("kf_bm_phosphorylation_1").is_some());
}

#[test]
fn multiple_active_forms_uniquify_rule_names() {
    let af1 = Statement::active_form(
        braf().with_mod(ModCondition::new(ModType::Phosphorylation, Some("S"), Some("445"))),
        "kinase",
        true,
    );
    let af2 = Statement::active_form(
        braf().with_mod(ModCondition::new(ModType::Phosphorylation, Some("T"), Some("599"))),
        "kinase",
        true,
    );
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let model = assemble(vec![af1, af2, phos], "one_step");

    let names: Vec<&str> = model.rules().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "BRAF_phosphorylation_MAP2K1_S218_1",
            "BRAF_phosphorylation_MAP2K1_S218_2",
        ]
    );
}

#[test]
fn complex_binding_is_symmetric() {
    let stmt = Statement::complex(vec![braf(), map2k1()]);
    let model = assemble(vec![stmt], "one_step");

    // Exactly one binding rule and one dissociation rule.
    let binds: Vec<_> = model.rules().iter().filter(|r| r.name.ends_with("_bind")).collect();
    let dissocs: Vec<_> = model
        .rules()
        .iter()
        .filter(|r| r.name.ends_with("_dissociate"))
        .collect();
    assert_eq!(binds.len(), 1);
    assert_eq!(dissocs.len(), 1);

    // Reciprocal binding sites, named after each partner's family.
    let braf_monomer = model.monomer("BRAF").unwrap();
    let mek_monomer = model.monomer("MAP2K1").unwrap();
    assert!(braf_monomer.sites.contains(&"mek".to_owned()));
    assert!(mek_monomer.sites.contains(&"raf".to_owned()));
}

#[test]
fn multi_way_complex_is_one_association_rule_pair() {
    let mapk1 = Agent::new("MAPK1").with_grounding("HGNC", "MAPK1");
    let stmt = Statement::complex(vec![braf(), map2k1(), mapk1]);
    let model = assemble(vec![stmt], "multi_way");

    assert_eq!(model.rules().len(), 2);
    let fwd = &model.rules()[0];
    let rev = &model.rules()[1];
    assert!(fwd.name.ends_with("_bind_fwd"));
    assert!(rev.name.ends_with("_bind_rev"));
    // Three members, one shared bond index per pair on the bound side.
    assert_eq!(fwd.rhs.to_string().matches('!').count(), 6);
    assert_eq!(fwd.lhs.to_string(), rev.rhs.to_string());
}

#[test]
fn degradation_without_subject_is_unimolecular_decay() {
    let stmt = Statement::decrease_amount(None, map2k1());
    let model = assemble(vec![stmt], "one_step");

    assert_eq!(model.rules().len(), 1);
    let rule = &model.rules()[0];
    assert_eq!(rule.name, "MAP2K1_degraded");
    assert_eq!(rule.rhs.to_string(), "0");
    assert_eq!(rule.rate, "kf_m_deg_1");
    assert!(model.parameter("kf_m_deg_1").is_some());
}

#[test]
fn synthesis_without_subject_builds_ground_state() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let synth = Statement::increase_amount(None, map2k1());
    let model = assemble(vec![phos, synth], "one_step");

    let rule = model.rule("MAP2K1_synthesized").unwrap();
    assert_eq!(rule.lhs.to_string(), "0");
    // Synthesized in the ground state: the phospho-site starts unmodified.
    assert!(rule.rhs.to_string().contains("S218~u"));
}

#[test]
fn two_step_modification_has_binding_intermediate() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let model = assemble(vec![phos], "two_step");

    let names: Vec<&str> = model.rules().iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"BRAF_phosphorylation_bind_MAP2K1_S218"));
    assert!(names.contains(&"BRAF_phosphorylation_MAP2K1_S218"));
    assert!(names.contains(&"BRAF_dissoc_MAP2K1"));
    // Separate on/off/catalytic rates.
    assert!(model.parameter("kf_bm_bind_1").is_some());
    assert!(model.parameter("kr_bm_bind_1").is_some());
    assert!(model.parameter("kc_bm_phosphorylation_1").is_some());
}

#[test]
fn interactions_only_reuses_shared_binding_rate() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), None, None);
    let ub = Statement::modification(
        ModType::Ubiquitination,
        Some(map2k1()),
        braf(),
        None,
        None,
    );
    let model = assemble(vec![phos, ub], "interactions_only");

    // The generic binding rate is shared, not uniquified.
    assert!(model.parameter("kf_bind").is_some());
    assert_eq!(
        model.parameters().iter().filter(|p| p.name.starts_with("kf_bind")).count(),
        1
    );
    // The kinase engages through its activity site.
    assert!(model.monomer("BRAF").unwrap().sites.contains(&"kinase".to_owned()));
    assert!(model.monomer("MAP2K1").unwrap().sites.contains(&"catalytic".to_owned()));
}

#[test]
fn atp_dependent_policy_adds_cofactor_mechanism() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let model = assemble(
        vec![phos],
        "atp_dependent",
    );

    // ATP becomes a monomer with its own binding site.
    let atp = model.monomer("ATP").unwrap();
    assert!(atp.sites.contains(&"b".to_owned()));
    assert!(model.monomer("BRAF").unwrap().sites.contains(&"ATP".to_owned()));
    let names: Vec<&str> = model.rules().iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"BRAF_phospho_bind_atp"));
    assert!(names.contains(&"BRAF_phospho_dissoc_atp"));
    assert!(names.contains(&"BRAF_phospho_bind_MAP2K1_S218"));
    assert!(names.contains(&"BRAF_phospho_MAP2K1_S218"));
    assert!(names.contains(&"BRAF_dissoc_MAP2K1"));
}

#[test]
fn atp_dependent_other_types_fall_back_to_default() {
    // A global atp_dependent policy only specializes phosphorylation; a
    // ubiquitination statement chases down to its default handler.
    let ub = Statement::modification(ModType::Ubiquitination, Some(braf()), map2k1(), None, None);
    let model = assemble(vec![ub], "atp_dependent");
    assert!(model.monomer("ATP").is_none());
    assert_eq!(model.rules().len(), 1);
    assert!(model.rules()[0].name.contains("ubiquitination"));
}

#[test]
fn dephosphorylation_reverses_site_states() {
    let dephos = Statement::demodification(
        ModType::Phosphorylation,
        Some(Agent::new("DUSP6").with_grounding("HGNC", "DUSP6")),
        map2k1(),
        Some("S"),
        Some("218"),
    );
    let model = assemble(vec![dephos], "one_step");
    let rule = &model.rules()[0];
    assert!(rule.name.contains("dephosphorylation"));
    assert!(rule.lhs.to_string().contains("S218~p"));
    assert!(rule.rhs.to_string().contains("S218~u"));
}

#[test]
fn activity_regulation_toggles_activity_site() {
    let act = Statement::regulate_activity(braf(), map2k1(), "kinase", true);
    let inh = Statement::regulate_activity(
        Agent::new("DUSP6").with_grounding("HGNC", "DUSP6"),
        map2k1(),
        "kinase",
        false,
    );
    let model = assemble(vec![act, inh], "one_step");

    let mek = model.monomer("MAP2K1").unwrap();
    assert_eq!(mek.site_states.get("kinase").unwrap(), &["inactive", "active"]);
    let names: Vec<&str> = model.rules().iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"BRAF_activates_MAP2K1_kinase"));
    assert!(names.contains(&"DUSP6_deactivates_MAP2K1_kinase"));
}

#[test]
fn gef_and_gap_switch_gtp_state() {
    let kras = Agent::new("KRAS").with_grounding("HGNC", "KRAS");
    let gef = Statement::new(bioasm::statement::StatementKind::GefActivation(
        bioasm::statement::GefActivation {
            gef: Agent::new("SOS1").with_grounding("HGNC", "SOS1"),
            ras: kras.clone(),
        },
    ));
    let gap = Statement::new(bioasm::statement::StatementKind::GapInactivation(
        bioasm::statement::GapInactivation {
            gap: Agent::new("RASA1").with_grounding("HGNC", "RASA1"),
            ras: kras,
        },
    ));
    let model = assemble(vec![gef, gap], "one_step");

    let ras_monomer = model.monomer("KRAS").unwrap();
    assert_eq!(ras_monomer.site_states.get("gtpbound").unwrap(), &["inactive", "active"]);
    assert!(model.rule("SOS1_activates_KRAS").is_some());
    assert!(model.rule("RASA1_deactivates_KRAS").is_some());
}

#[test]
fn translocation_flips_location_site() {
    let mut stmt = Statement::new(bioasm::statement::StatementKind::Translocation(
        bioasm::statement::Translocation {
            agent: map2k1(),
            from_location: Some("cytoplasm".to_owned()),
            to_location: Some("nucleus".to_owned()),
        },
    ));
    stmt.evidence.push(Evidence::new("reach"));
    let model = assemble(vec![stmt], "default");

    let rule = model.rule("MAP2K1_translocates_cytoplasm_to_nucleus").unwrap();
    assert!(rule.lhs.to_string().contains("loc~cytoplasm"));
    assert!(rule.rhs.to_string().contains("loc~nucleus"));

    // Missing compartments are skipped, not failed.
    let partial = Statement::new(bioasm::statement::StatementKind::Translocation(
        bioasm::statement::Translocation {
            agent: map2k1(),
            from_location: None,
            to_location: Some("nucleus".to_owned()),
        },
    ));
    let model = assemble(vec![partial], "default");
    assert!(model.rules().is_empty());
}

#[test]
fn monomer_names_are_normalized_identifiers() {
    let ywhab = Agent::new("14-3-3").with_grounding("HGNC", "YWHAB");
    let stmt = Statement::complex(vec![ywhab, braf()]);
    let model = assemble(vec![stmt], "one_step");
    assert!(model.monomer("p14_3_3").is_some());
    for monomer in model.monomers() {
        assert!(bioasm::ident::is_valid(&monomer.name));
    }
    for parameter in model.parameters() {
        assert!(bioasm::ident::is_valid(&parameter.name));
    }
}

#[test]
fn base_initials_seed_every_monomer() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let model = assemble(vec![phos], "one_step");
    assert_eq!(model.initials().len(), model.monomers().len());
    assert_eq!(model.parameter("BRAF_0").unwrap().value, 1000.0);
}

#[test]
fn extended_initials_seed_modified_states() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let mut assembler =
        RuleAssembler::new(hierarchies()).with_policies(PolicyConfig::global("one_step"));
    assembler.add_statements(vec![phos]);
    let model = assembler.make_model(InitialConditions::Extended).unwrap();

    let mod_param = model.parameter("MAP2K1_0_mod").unwrap();
    assert_eq!(mod_param.value, 0.0);
    assert!(model
        .initials()
        .iter()
        .any(|i| i.pattern.to_string().contains("S218~p")));
    // BRAF has no stateful site, so no extended seed for it.
    assert!(model.parameter("BRAF_0_mod").is_none());
}

#[test]
fn rules_carry_subject_and_object_annotations() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let model = assemble(vec![phos], "one_step");
    let subject_rules = model.rules_with_annotation("BRAF", "rule_has_subject");
    let object_rules = model.rules_with_annotation("MAP2K1", "rule_has_object");
    assert_eq!(subject_rules.len(), 1);
    assert_eq!(object_rules.len(), 1);
    // Grounding annotations for provenance.
    assert!(model
        .annotations()
        .iter()
        .any(|a| a.predicate == "is" && a.subject == "BRAF"));
}

#[test]
fn duplicate_statements_do_not_duplicate_rules() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let model = assemble(vec![phos.clone(), phos], "one_step");
    assert_eq!(model.rules().len(), 1);
}

#[test]
fn pipeline_feeds_assembler_end_to_end() {
    let raf = Agent::new("RAF").with_grounding("BE", "RAF");
    let mek = Agent::new("MEK").with_grounding("BE", "MEK");
    let stmts = vec![
        Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
            .with_evidence(Evidence::new("reach").with_text("specific")),
        Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"))
            .with_evidence(Evidence::new("sparser").with_text("dup")),
        Statement::phosphorylation(Some(raf), mek, None, None)
            .with_evidence(Evidence::new("bel").with_text("general")),
        Statement::complex(vec![braf(), map2k1()]).with_evidence(Evidence::new("biopax")),
    ];
    let corpus = CorpusPipeline::new(hierarchies()).run(stmts).unwrap();
    assert_eq!(corpus.unique.len(), 3);
    assert_eq!(corpus.top_level.len(), 2);

    let mut assembler = RuleAssembler::new(hierarchies());
    assembler.add_statements(corpus.top_level);
    let model = assembler.make_model(InitialConditions::Base).unwrap();
    // One phosphorylation rule plus a bind/dissociate pair.
    assert_eq!(model.rules().len(), 3);

    let flat = export::export_flat(&model);
    assert!(flat.contains("begin reaction rules"));
    assert!(flat.contains("BRAF_phosphorylation_MAP2K1_S218"));
}

#[test]
fn per_type_policies_compose() {
    let phos = Statement::phosphorylation(Some(braf()), map2k1(), Some("S"), Some("218"));
    let cplx = Statement::complex(vec![braf(), map2k1()]);
    let mut assembler = RuleAssembler::new(hierarchies()).with_policies(
        PolicyConfig::global("one_step").with_type("phosphorylation", "two_step"),
    );
    assembler.add_statements(vec![phos, cplx]);
    let model = assembler.make_model(InitialConditions::Skip).unwrap();
    let names: Vec<&str> = model.rules().iter().map(|r| r.name.as_str()).collect();
    // Phosphorylation went two-step, the complex stayed one-step.
    assert!(names.iter().any(|n| n.contains("phosphorylation_bind")));
    assert!(names.iter().any(|n| n.ends_with("_dissociate")));
}
