//! Rich diagnostic error types for the bioasm pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text, so a failed assembly run points at the
//! configuration or input that caused it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the bioasm pipeline.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum BioasmError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Result type for top-level pipeline operations.
pub type BioasmResult<T> = std::result::Result<T, BioasmError>;

// ---------------------------------------------------------------------------
// Ontology errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or building a hierarchy.
///
/// Queries against a built hierarchy never fail: unknown URIs and malformed
/// groundings yield empty results.
#[derive(Debug, Error, Diagnostic)]
pub enum OntologyError {
    #[error("failed to parse ontology configuration: {message}")]
    #[diagnostic(
        code(bioasm::ontology::config),
        help(
            "The ontology TOML could not be parsed. Check the [namespaces] table \
             and [[edges]] entries against the documented format."
        )
    )]
    Config { message: String },

    #[error("unknown namespace prefix '{namespace}'")]
    #[diagnostic(
        code(bioasm::ontology::unknown_namespace),
        help(
            "Every edge endpoint must use a namespace declared in the \
             [namespaces] table, e.g. HGNC, UP, BE, CHEBI, GO or INDRA."
        )
    )]
    UnknownNamespace { namespace: String },

    #[error("malformed grounding reference '{reference}', expected NS:ID")]
    #[diagnostic(
        code(bioasm::ontology::bad_reference),
        help("Edge endpoints are written as a namespace-qualified pair, e.g. \"HGNC:BRAF\".")
    )]
    BadReference { reference: String },

    #[error("hierarchy contains a cycle through {uri}")]
    #[diagnostic(
        code(bioasm::ontology::cycle),
        help(
            "is-a and part-of hierarchies must be acyclic. Remove the edge that \
             closes the loop through this node."
        )
    )]
    Cycle { uri: String },

    #[error("I/O error reading ontology file: {source}")]
    #[diagnostic(
        code(bioasm::ontology::io),
        help("Check that the ontology file exists and is readable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

/// Result type for ontology operations.
pub type OntologyResult<T> = std::result::Result<T, OntologyError>;

// ---------------------------------------------------------------------------
// Corpus errors
// ---------------------------------------------------------------------------

/// Errors raised by the corpus pipeline outside of persistence.
#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("failed to parse statement input: {message}")]
    #[diagnostic(
        code(bioasm::corpus::parse),
        help(
            "The statement file must contain a JSON array of statement objects. \
             Re-export the corpus or check for truncation."
        )
    )]
    Parse { message: String },

    #[error("failed to parse belief prior table: {message}")]
    #[diagnostic(
        code(bioasm::corpus::priors),
        help(
            "Source priors are a TOML table of source_api name to error \
             probability in (0, 1)."
        )
    )]
    Priors { message: String },

    #[error("source prior for '{source_api}' is {value}, outside (0, 1)")]
    #[diagnostic(
        code(bioasm::corpus::prior_range),
        help("Error probabilities are strictly between 0 and 1.")
    )]
    PriorRange { source_api: String, value: f64 },
}

/// Result type for corpus operations.
pub type CorpusResult<T> = std::result::Result<T, CorpusError>;

// ---------------------------------------------------------------------------
// Assembly errors
// ---------------------------------------------------------------------------

/// Errors raised by the rule assembler.
///
/// Only configuration-level problems surface as errors; per-statement problems
/// (missing monomers, invalid site patterns, duplicate rule names) are logged
/// and the offending statement or rule variant is skipped.
#[derive(Debug, Error, Diagnostic)]
pub enum AssemblyError {
    #[error("no {stage} handler for statement type '{type_tag}' under policy '{policy}'")]
    #[diagnostic(
        code(bioasm::assembly::unknown_policy),
        help(
            "The requested policy is not implemented for this statement type and \
             no default handler exists either. Pick one of the registered \
             policies (default, one_step, two_step, interactions_only, \
             multi_way, atp_dependent) or fix the per-type policy table."
        )
    )]
    UnknownPolicy {
        stage: &'static str,
        type_tag: String,
        policy: String,
    },

    #[error("invalid initial condition amount '{value}'")]
    #[diagnostic(
        code(bioasm::assembly::initial_amount),
        help("Initial amounts must parse as a non-negative number.")
    )]
    InvalidInitialAmount { value: String },
}

/// Result type for assembly operations.
pub type AssemblyResult<T> = std::result::Result<T, AssemblyError>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors raised by the corpus persistence layer.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(bioasm::store::io),
        help(
            "A filesystem operation failed. Check that the store directory \
             exists, has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(bioasm::store::serde),
        help(
            "Failed to serialize or deserialize a corpus. This usually means \
             the stored format predates the current statement schema."
        )
    )]
    Serialization { message: String },

    #[error("key not found: {key}")]
    #[diagnostic(
        code(bioasm::store::not_found),
        help("The requested key does not exist in the store. Verify the key is correct.")
    )]
    NotFound { key: String },

    #[error("invalid store key '{key}'")]
    #[diagnostic(
        code(bioasm::store::invalid_key),
        help("Store keys may only contain letters, digits, '.', '_' and '-'.")
    )]
    InvalidKey { key: String },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
