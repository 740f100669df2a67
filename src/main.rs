//! bioasm CLI: statement corpus assembly and rule-model compilation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use bioasm::assembler::{InitialConditions, PolicyConfig, RuleAssembler};
use bioasm::corpus::filters;
use bioasm::error::CorpusError;
use bioasm::export;
use bioasm::ontology::{HierarchyGraph, HierarchySet, ParentMode};
use bioasm::pipeline::CorpusPipeline;
use bioasm::statement::Statement;
use bioasm::store::CorpusStore;

#[derive(Parser)]
#[command(name = "bioasm", version, about = "Biological statement corpus and model assembly")]
struct Cli {
    /// Entity hierarchy TOML; the built-in seed families are used if omitted.
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the corpus pipeline: dedup, beliefs, related, top-level.
    Assemble {
        /// JSON file with a statement array.
        file: PathBuf,

        /// Directory to persist each stage's output into.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Keep only statements with grounded agents before assembly.
        #[arg(long)]
        grounded_only: bool,

        /// Drop top-level statements below this belief.
        #[arg(long)]
        belief_cutoff: Option<f64>,
    },

    /// Compile a statement list into a rule-based model.
    Model {
        /// JSON file with a statement array.
        file: PathBuf,

        /// Global assembly policy.
        #[arg(long, default_value = "default")]
        policy: String,

        /// Output format.
        #[arg(long, value_enum, default_value = "flat")]
        format: ExportFormat,

        /// Initial-condition mode.
        #[arg(long, value_enum, default_value = "base")]
        initials: InitialMode,

        /// File to write the exported model into; stdout if omitted.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Query the entity hierarchy.
    Ontology {
        #[command(subcommand)]
        action: OntologyAction,
    },
}

#[derive(Subcommand)]
enum OntologyAction {
    /// Check an is-a relation between two groundings.
    Isa {
        child_ns: String,
        child_id: String,
        parent_ns: String,
        parent_id: String,
    },
    /// List ancestors of a URI.
    Parents {
        uri: String,
        /// immediate, top or all.
        #[arg(long, default_value = "all")]
        mode: String,
    },
    /// List all descendants of a URI.
    Children { uri: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Flat,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum InitialMode {
    Skip,
    Base,
    Extended,
}

impl From<InitialMode> for InitialConditions {
    fn from(mode: InitialMode) -> Self {
        match mode {
            InitialMode::Skip => InitialConditions::Skip,
            InitialMode::Base => InitialConditions::Base,
            InitialMode::Extended => InitialConditions::Extended,
        }
    }
}

fn load_hierarchies(ontology: Option<&Path>) -> Result<Arc<HierarchySet>> {
    let set = match ontology {
        Some(path) => HierarchySet::new(HierarchyGraph::from_path(path)?)?,
        None => HierarchySet::with_seed_entities()?,
    };
    Ok(Arc::new(set))
}

fn load_statements(file: &Path) -> Result<Vec<Statement>> {
    let text = std::fs::read_to_string(file).into_diagnostic()?;
    let stmts: Vec<Statement> = serde_json::from_str(&text).map_err(|e| CorpusError::Parse {
        message: e.to_string(),
    })?;
    Ok(stmts)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let hierarchies = load_hierarchies(cli.ontology.as_deref())?;

    match cli.command {
        Commands::Assemble {
            file,
            out,
            grounded_only,
            belief_cutoff,
        } => {
            let mut stmts = load_statements(&file)?;
            if grounded_only {
                stmts = filters::filter_grounded_only(&stmts);
            }
            let mut pipeline = CorpusPipeline::new(hierarchies);
            if let Some(dir) = out {
                pipeline = pipeline.with_store(CorpusStore::open(dir)?);
            }
            let output = pipeline.run(stmts)?;
            let top_level = match belief_cutoff {
                Some(cutoff) => filters::filter_belief(&output.top_level, cutoff),
                None => output.top_level,
            };
            println!(
                "{} unique, {} top-level statements",
                output.unique.len(),
                top_level.len()
            );
            for stmt in &top_level {
                println!("  [{:.3}] {}", stmt.belief, stmt.matches_key());
            }
        }

        Commands::Model {
            file,
            policy,
            format,
            initials,
            export: export_path,
        } => {
            let stmts = load_statements(&file)?;
            let mut assembler =
                RuleAssembler::new(hierarchies).with_policies(PolicyConfig::global(&policy));
            assembler.add_statements(stmts);
            let model = assembler.make_model(initials.into())?;
            let rendered = match format {
                ExportFormat::Flat => export::export_flat(&model),
                ExportFormat::Json => export::export_json(&model)?,
            };
            match export_path {
                Some(path) => std::fs::write(path, rendered).into_diagnostic()?,
                None => print!("{rendered}"),
            }
        }

        Commands::Ontology { action } => match action {
            OntologyAction::Isa {
                child_ns,
                child_id,
                parent_ns,
                parent_id,
            } => {
                let result = hierarchies.entity.isa(&child_ns, &child_id, &parent_ns, &parent_id);
                println!("{result}");
            }
            OntologyAction::Parents { uri, mode } => {
                let mode = match mode.as_str() {
                    "immediate" => ParentMode::Immediate,
                    "top" => ParentMode::Top,
                    _ => ParentMode::All,
                };
                for parent in hierarchies.entity.get_parents(&uri, mode) {
                    println!("{parent}");
                }
            }
            OntologyAction::Children { uri } => {
                for child in hierarchies.entity.get_children(&uri) {
                    println!("{child}");
                }
            }
        },
    }

    Ok(())
}
