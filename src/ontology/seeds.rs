//! Built-in hierarchy vocabularies.
//!
//! The mark-type, activity-type and cellular-component hierarchies are fixed
//! vocabularies shipped with the crate; the entity hierarchy is normally
//! injected from external configuration, but a seed version with a handful of
//! well-known kinase families is provided for tests and demos.

use crate::agent::ModType;
use crate::error::OntologyResult;
use crate::ontology::{HierarchyBuilder, HierarchyGraph, Relation};

/// Mark-type hierarchy: every concrete mark type is-a `modification`.
pub fn modification_hierarchy() -> OntologyResult<HierarchyGraph> {
    let mut b = HierarchyBuilder::new();
    for mod_type in ModType::CONCRETE {
        b.add_edge("INDRA", mod_type.label(), Relation::IsA, "INDRA", "modification")?;
    }
    b.build()
}

/// Activity-type hierarchy: every named activity kind is-a `activity`.
pub fn activity_hierarchy() -> OntologyResult<HierarchyGraph> {
    let mut b = HierarchyBuilder::new();
    for kind in [
        "kinase",
        "phosphatase",
        "catalytic",
        "gtpbound",
        "transcriptional",
    ] {
        b.add_edge("INDRA", kind, Relation::IsA, "INDRA", "activity")?;
    }
    b.build()
}

/// Cellular-component hierarchy: part-of relations between compartments.
pub fn component_hierarchy() -> OntologyResult<HierarchyGraph> {
    let mut b = HierarchyBuilder::new();
    for compartment in [
        "cytoplasm",
        "nucleus",
        "plasma membrane",
        "mitochondrion",
        "endoplasmic reticulum",
    ] {
        b.add_edge("INDRA", compartment, Relation::PartOf, "INDRA", "cell")?;
    }
    b.add_edge("INDRA", "nucleolus", Relation::PartOf, "INDRA", "nucleus")?;
    b.build()
}

/// Seed entity hierarchy: the RAF/MEK/ERK/RAS kinase families, the AMPK
/// complex and the HIF1 complex.
pub fn seed_entity_hierarchy() -> OntologyResult<HierarchyGraph> {
    let mut b = HierarchyBuilder::new();
    for (genes, family) in [
        (&["BRAF", "ARAF", "RAF1"][..], "RAF"),
        (&["MAP2K1", "MAP2K2"][..], "MEK"),
        (&["MAPK1", "MAPK3"][..], "ERK"),
        (&["KRAS", "NRAS", "HRAS"][..], "RAS"),
    ] {
        for gene in genes {
            b.add_edge("HGNC", gene, Relation::IsA, "BE", family)?;
        }
    }
    // AMPK: gene-level catalytic subunits form a subfamily that is part of
    // the holoenzyme complex.
    for gene in ["PRKAA1", "PRKAA2"] {
        b.add_edge("HGNC", gene, Relation::IsA, "BE", "AMPK_alpha")?;
    }
    b.add_edge("BE", "AMPK_alpha", Relation::PartOf, "BE", "AMPK")?;
    b.add_edge("BE", "HIF1_alpha", Relation::PartOf, "BE", "HIF1")?;
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_types_are_modifications() {
        let h = modification_hierarchy().unwrap();
        assert!(h.isa("INDRA", "phosphorylation", "INDRA", "modification"));
        assert!(!h.isa("INDRA", "phosphorylation", "INDRA", "ubiquitination"));
    }

    #[test]
    fn activity_kinds_are_activities() {
        let h = activity_hierarchy().unwrap();
        assert!(h.isa("INDRA", "kinase", "INDRA", "activity"));
        assert!(!h.isa("INDRA", "kinase", "INDRA", "phosphatase"));
    }

    #[test]
    fn compartments_are_part_of_the_cell() {
        let h = component_hierarchy().unwrap();
        assert!(h.partof("INDRA", Some("cytoplasm"), "INDRA", Some("cell")));
        assert!(!h.partof("INDRA", Some("cell"), "INDRA", Some("cytoplasm")));
        assert!(h.partof("INDRA", Some("nucleolus"), "INDRA", Some("cell")));
    }
}
