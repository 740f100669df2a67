//! Model export: flat textual reaction-network description and JSON.
//!
//! The flat format lists parameters, monomer signatures, seed species and
//! rules in a BNGL-flavored block layout, suitable for downstream
//! reaction-network tooling. Richer target formalisms stay external.

use crate::error::{StoreError, StoreResult};
use crate::model::Model;

/// Render the model as a flat text reaction-network description.
pub fn export_flat(model: &Model) -> String {
    let mut out = String::new();
    out.push_str(&format!("# model {}\n", model.name));

    out.push_str("begin parameters\n");
    for p in model.parameters() {
        out.push_str(&format!("  {}  {:e}\n", p.name, p.value));
    }
    out.push_str("end parameters\n\n");

    out.push_str("begin molecule types\n");
    for m in model.monomers() {
        out.push_str(&format!("  {m}\n"));
    }
    out.push_str("end molecule types\n\n");

    out.push_str("begin seed species\n");
    for i in model.initials() {
        out.push_str(&format!("  {}  {}\n", i.pattern, i.parameter));
    }
    out.push_str("end seed species\n\n");

    out.push_str("begin reaction rules\n");
    for r in model.rules() {
        out.push_str(&format!("  {}:  {} -> {}  {}\n", r.name, r.lhs, r.rhs, r.rate));
    }
    out.push_str("end reaction rules\n");
    out
}

/// Render the model structure as pretty-printed JSON.
pub fn export_json(model: &Model) -> StoreResult<String> {
    serde_json::to_string_pretty(model).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}
