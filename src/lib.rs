//! # bioasm
//!
//! Assembles a knowledge base of extracted biological statements into two
//! derived products: a deduplicated, hierarchically-ranked statement corpus,
//! and an executable rule-based reaction-network model.
//!
//! ## Architecture
//!
//! - **Ontology** (`ontology`): is-a/part-of hierarchy DAGs over entities,
//!   mark types, activity types and cellular components, with precomputed
//!   closures
//! - **Corpus assembly** (`corpus`): deduplication and ontology-aware
//!   refinement wiring over an integer-indexed support arena
//! - **Belief** (`belief`): source-reliability priors and evidence-union
//!   propagation over the support graph
//! - **Rule assembler** (`assembler`): policy-dispatched compilation of
//!   statements into monomers, rules, parameters and annotations
//! - **Model** (`model`): the site-graph rewrite-rule formalism and its
//!   component containers
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use bioasm::agent::Agent;
//! use bioasm::assembler::{InitialConditions, RuleAssembler};
//! use bioasm::ontology::HierarchySet;
//! use bioasm::pipeline::CorpusPipeline;
//! use bioasm::statement::{Evidence, Statement};
//!
//! let hierarchies = Arc::new(HierarchySet::with_seed_entities().unwrap());
//! let braf = Agent::new("BRAF").with_grounding("HGNC", "BRAF");
//! let mek1 = Agent::new("MAP2K1").with_grounding("HGNC", "MAP2K1");
//! let stmts = vec![
//!     Statement::phosphorylation(Some(braf), mek1, Some("S"), Some("218"))
//!         .with_evidence(Evidence::new("reach")),
//! ];
//! let corpus = CorpusPipeline::new(hierarchies.clone()).run(stmts).unwrap();
//! let mut assembler = RuleAssembler::new(hierarchies);
//! assembler.add_statements(corpus.top_level);
//! let model = assembler.make_model(InitialConditions::Base).unwrap();
//! assert_eq!(model.rules().len(), 1);
//! ```

pub mod agent;
pub mod assembler;
pub mod belief;
pub mod corpus;
pub mod error;
pub mod export;
pub mod ident;
pub mod model;
pub mod ontology;
pub mod pipeline;
pub mod statement;
pub mod store;
