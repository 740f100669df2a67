//! Ontology hierarchy service: is-a and part-of DAGs over URIs.
//!
//! Four domains share one graph type: entities (gene/family/complex), mark
//! types, activity types and cellular components. Each [`HierarchyGraph`] is
//! loaded once, precomputes its transitive closures, and is read-only
//! thereafter; all queries are O(1) amortized and never fail — an unknown URI
//! simply yields an empty result.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::sync::LazyLock;

use dashmap::DashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use regex::Regex;
use serde::Deserialize;

use crate::error::{OntologyError, OntologyResult};

pub mod seeds;

// ---------------------------------------------------------------------------
// Namespaces and URIs
// ---------------------------------------------------------------------------

/// Mapping of namespace prefix to base URI, externally loadable.
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceMap {
    prefixes: BTreeMap<String, String>,
}

impl Default for NamespaceMap {
    fn default() -> Self {
        let mut prefixes = BTreeMap::new();
        for (ns, base) in [
            ("HGNC", "http://identifiers.org/hgnc.symbol/"),
            ("UP", "http://identifiers.org/uniprot/"),
            ("CHEBI", "http://identifiers.org/chebi/"),
            ("GO", "http://identifiers.org/go/"),
            ("XFAM", "http://identifiers.org/pfam/"),
            ("IP", "http://identifiers.org/interpro/"),
            ("BE", "http://sorger.med.harvard.edu/bioentities/"),
            ("INDRA", "http://sorger.med.harvard.edu/indra/"),
        ] {
            prefixes.insert(ns.to_owned(), base.to_owned());
        }
        Self { prefixes }
    }
}

impl NamespaceMap {
    /// Resolve a (namespace, identifier) pair to a URI. Unknown namespaces
    /// yield `None`, never an error.
    pub fn get_uri(&self, namespace: &str, id: &str) -> Option<String> {
        self.prefixes.get(namespace).map(|base| format!("{base}{id}"))
    }

    /// Merge externally loaded prefixes over the defaults.
    pub fn extend(&mut self, other: BTreeMap<String, String>) {
        self.prefixes.extend(other);
    }
}

/// Extract the entity name from the trailing segment of a hierarchy URI.
pub fn uri_agent_name(uri: &str) -> Option<&str> {
    uri.rsplit('/').next().filter(|s| !s.is_empty())
}

static IDENTIFIERS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^http://identifiers\.org/([A-Za-z.]+)/([A-Za-z0-9:]+)$").expect("valid regex")
});

/// Construct an identifiers.org annotation URL for a grounding, following the
/// identifiers.org layout. Unsupported namespaces yield `None`.
pub fn identifiers_url(namespace: &str, id: &str) -> Option<String> {
    let url = "http://identifiers.org/";
    match namespace {
        "UP" => Some(format!("{url}uniprot/{id}")),
        "HGNC" => Some(format!("{url}hgnc/HGNC:{id}")),
        "XFAM" if id.starts_with("PF") => Some(format!("{url}pfam/{id}")),
        "IP" => Some(format!("{url}interpro/{id}")),
        "CHEBI" => Some(format!("{url}chebi/{id}")),
        _ => None,
    }
}

/// Parse an identifiers.org URL back into a (namespace, identifier) pair.
///
/// Malformed or unrecognized URLs yield `None`, never an error.
pub fn parse_identifiers_url(url: &str) -> Option<(String, String)> {
    let caps = IDENTIFIERS_URL_RE.captures(url)?;
    let ns = caps.get(1)?.as_str();
    let id = caps.get(2)?.as_str();
    let (namespace, id) = match ns {
        "uniprot" => ("UP", id),
        "hgnc" => ("HGNC", id.strip_prefix("HGNC:")?),
        "chebi" => ("CHEBI", id),
        "interpro" => ("IP", id),
        "pfam" => ("XFAM", id),
        _ => return None,
    };
    Some((namespace.to_owned(), id.to_owned()))
}

// ---------------------------------------------------------------------------
// Hierarchy graph
// ---------------------------------------------------------------------------

/// Edge kind in a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    IsA,
    PartOf,
}

/// Ancestor query mode for [`HierarchyGraph::get_parents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentMode {
    /// Direct parents only.
    Immediate,
    /// Maximal ancestors with no further parents.
    Top,
    /// The full ancestor set.
    All,
}

/// A directed acyclic hierarchy over URIs with precomputed closures.
///
/// Edges point child to parent. The is-a closure follows is-a edges only; the
/// part-of closure follows mixed is-a/part-of paths that use at least one
/// part-of edge, so a member of a subfamily is still part of the parent
/// complex.
pub struct HierarchyGraph {
    graph: DiGraph<String, Relation>,
    nodes: HashMap<String, NodeIndex>,
    namespaces: NamespaceMap,
    isa_closure: HashMap<String, BTreeSet<String>>,
    partof_closure: HashMap<String, BTreeSet<String>>,
    children_cache: DashMap<String, Vec<String>>,
}

/// Incrementally assembled hierarchy; closures are computed by [`HierarchyBuilder::build`].
pub struct HierarchyBuilder {
    graph: DiGraph<String, Relation>,
    nodes: HashMap<String, NodeIndex>,
    namespaces: NamespaceMap,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            namespaces: NamespaceMap::default(),
        }
    }

    pub fn with_namespaces(mut self, namespaces: NamespaceMap) -> Self {
        self.namespaces = namespaces;
        self
    }

    fn node(&mut self, uri: &str) -> NodeIndex {
        if let Some(&ix) = self.nodes.get(uri) {
            return ix;
        }
        let ix = self.graph.add_node(uri.to_owned());
        self.nodes.insert(uri.to_owned(), ix);
        ix
    }

    /// Add a child-to-parent edge between two URIs.
    pub fn add_edge_uri(&mut self, child: &str, relation: Relation, parent: &str) {
        let c = self.node(child);
        let p = self.node(parent);
        if !self
            .graph
            .edges(c)
            .any(|e| e.target() == p && *e.weight() == relation)
        {
            self.graph.add_edge(c, p, relation);
        }
    }

    /// Add an edge between two namespace-qualified identifiers.
    pub fn add_edge(
        &mut self,
        child_ns: &str,
        child_id: &str,
        relation: Relation,
        parent_ns: &str,
        parent_id: &str,
    ) -> OntologyResult<()> {
        let child = self.namespaces.get_uri(child_ns, child_id).ok_or_else(|| {
            OntologyError::UnknownNamespace {
                namespace: child_ns.to_owned(),
            }
        })?;
        let parent = self.namespaces.get_uri(parent_ns, parent_id).ok_or_else(|| {
            OntologyError::UnknownNamespace {
                namespace: parent_ns.to_owned(),
            }
        })?;
        self.add_edge_uri(&child, relation, &parent);
        Ok(())
    }

    /// Compute closures and freeze the hierarchy. Fails on cyclic input.
    pub fn build(self) -> OntologyResult<HierarchyGraph> {
        let mut isa_closure = HashMap::new();
        let mut partof_closure = HashMap::new();
        for (uri, &start) in &self.nodes {
            let isa = ancestors(&self.graph, start, false);
            let partof = ancestors(&self.graph, start, true);
            if isa.contains(uri) || partof.contains(uri) {
                return Err(OntologyError::Cycle { uri: uri.clone() });
            }
            if !isa.is_empty() {
                isa_closure.insert(uri.clone(), isa);
            }
            if !partof.is_empty() {
                partof_closure.insert(uri.clone(), partof);
            }
        }
        Ok(HierarchyGraph {
            graph: self.graph,
            nodes: self.nodes,
            namespaces: self.namespaces,
            isa_closure,
            partof_closure,
            children_cache: DashMap::new(),
        })
    }
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// BFS ancestor collection. With `partof` set, traverse both edge kinds but
/// only record nodes reached through at least one part-of edge; otherwise
/// follow is-a edges exclusively.
fn ancestors(graph: &DiGraph<String, Relation>, start: NodeIndex, partof: bool) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut seen: HashMap<NodeIndex, bool> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back((start, false));
    while let Some((node, used_partof)) = queue.pop_front() {
        for edge in graph.edges(node) {
            let is_partof = *edge.weight() == Relation::PartOf;
            if !partof && is_partof {
                continue;
            }
            let next_used = used_partof || is_partof;
            let target = edge.target();
            // Revisit a node if we now reach it through a part-of edge.
            let prev = seen.get(&target).copied();
            if prev == Some(true) || prev == Some(next_used) {
                continue;
            }
            seen.insert(target, next_used);
            if !partof || next_used {
                out.insert(graph[target].clone());
            }
            queue.push_back((target, next_used));
        }
    }
    out
}

impl HierarchyGraph {
    /// An empty hierarchy with the default namespace table.
    pub fn empty() -> Self {
        HierarchyBuilder::new().build().expect("empty hierarchy is acyclic")
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// Resolve a grounding to this hierarchy's URI space.
    pub fn get_uri(&self, namespace: &str, id: &str) -> Option<String> {
        self.namespaces.get_uri(namespace, id)
    }

    /// Is-a query over namespace-qualified identifiers. Reflexive; transitive
    /// through the precomputed closure; false for unknown groundings.
    pub fn isa(&self, ns1: &str, id1: &str, ns2: &str, id2: &str) -> bool {
        if ns1 == ns2 && id1 == id2 {
            return true;
        }
        let (Some(uri1), Some(uri2)) = (self.get_uri(ns1, id1), self.get_uri(ns2, id2)) else {
            return false;
        };
        if uri1 == uri2 {
            return true;
        }
        self.isa_closure
            .get(&uri1)
            .is_some_and(|anc| anc.contains(&uri2))
    }

    /// Part-of query. `None` on the right-hand side is a universal match
    /// ("X part-of anywhere"); `None` on the left only matches a `None` right.
    pub fn partof(&self, ns1: &str, id1: Option<&str>, ns2: &str, id2: Option<&str>) -> bool {
        let Some(id2) = id2 else {
            return true;
        };
        let Some(id1) = id1 else {
            return false;
        };
        let (Some(uri1), Some(uri2)) = (self.get_uri(ns1, id1), self.get_uri(ns2, id2)) else {
            return false;
        };
        self.partof_closure
            .get(&uri1)
            .is_some_and(|anc| anc.contains(&uri2))
    }

    /// Ancestors of a URI through either relation, per [`ParentMode`].
    /// Unknown URIs yield the empty set.
    pub fn get_parents(&self, uri: &str, mode: ParentMode) -> BTreeSet<String> {
        match mode {
            ParentMode::Immediate => {
                let Some(&ix) = self.nodes.get(uri) else {
                    return BTreeSet::new();
                };
                self.graph
                    .edges(ix)
                    .map(|e| self.graph[e.target()].clone())
                    .collect()
            }
            ParentMode::All => self.all_ancestors(uri),
            ParentMode::Top => self
                .all_ancestors(uri)
                .into_iter()
                .filter(|anc| self.all_ancestors(anc).is_empty())
                .collect(),
        }
    }

    fn all_ancestors(&self, uri: &str) -> BTreeSet<String> {
        let mut out = self
            .isa_closure
            .get(uri)
            .cloned()
            .unwrap_or_default();
        if let Some(partof) = self.partof_closure.get(uri) {
            out.extend(partof.iter().cloned());
        }
        out
    }

    /// All strict descendants of a URI through both family (is-a) and complex
    /// (part-of) membership. Empty for leaf or unknown URIs. Memoized.
    pub fn get_children(&self, uri: &str) -> Vec<String> {
        if let Some(hit) = self.children_cache.get(uri) {
            return hit.clone();
        }
        let mut children: Vec<String> = self
            .nodes
            .keys()
            .filter(|candidate| self.all_ancestors(candidate).contains(uri))
            .cloned()
            .collect();
        children.sort();
        self.children_cache.insert(uri.to_owned(), children.clone());
        children
    }
}

// ---------------------------------------------------------------------------
// External configuration
// ---------------------------------------------------------------------------

/// TOML-loadable hierarchy description: a namespace table plus edges written
/// as `NS:ID` pairs.
#[derive(Debug, Deserialize)]
pub struct OntologyConfig {
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,
}

#[derive(Debug, Deserialize)]
pub struct EdgeConfig {
    pub relation: String,
    pub child: String,
    pub parent: String,
}

fn split_reference(reference: &str) -> OntologyResult<(&str, &str)> {
    reference
        .split_once(':')
        .filter(|(ns, id)| !ns.is_empty() && !id.is_empty())
        .ok_or_else(|| OntologyError::BadReference {
            reference: reference.to_owned(),
        })
}

impl HierarchyGraph {
    /// Build a hierarchy from parsed configuration.
    pub fn from_config(config: OntologyConfig) -> OntologyResult<Self> {
        let mut namespaces = NamespaceMap::default();
        namespaces.extend(config.namespaces);
        let mut builder = HierarchyBuilder::new().with_namespaces(namespaces);
        for edge in &config.edges {
            let relation = match edge.relation.as_str() {
                "isa" => Relation::IsA,
                "partof" => Relation::PartOf,
                other => {
                    return Err(OntologyError::Config {
                        message: format!("unknown relation '{other}', expected isa or partof"),
                    });
                }
            };
            let (cns, cid) = split_reference(&edge.child)?;
            let (pns, pid) = split_reference(&edge.parent)?;
            builder.add_edge(cns, cid, relation, pns, pid)?;
        }
        builder.build()
    }

    /// Build a hierarchy from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> OntologyResult<Self> {
        let config: OntologyConfig = toml::from_str(toml_str).map_err(|e| OntologyError::Config {
            message: e.to_string(),
        })?;
        Self::from_config(config)
    }

    /// Build a hierarchy from a TOML file.
    pub fn from_path(path: &Path) -> OntologyResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| OntologyError::Io { source })?;
        Self::from_toml_str(&text)
    }
}

// ---------------------------------------------------------------------------
// Hierarchy set
// ---------------------------------------------------------------------------

/// The four per-domain hierarchies shared by the combiner and the assembler.
pub struct HierarchySet {
    pub entity: HierarchyGraph,
    pub modification: HierarchyGraph,
    pub activity: HierarchyGraph,
    pub cellular_component: HierarchyGraph,
}

impl HierarchySet {
    /// Assemble a set from an injected entity hierarchy plus the built-in
    /// mark-type, activity-type and cellular-component vocabularies.
    pub fn new(entity: HierarchyGraph) -> OntologyResult<Self> {
        Ok(Self {
            entity,
            modification: seeds::modification_hierarchy()?,
            activity: seeds::activity_hierarchy()?,
            cellular_component: seeds::component_hierarchy()?,
        })
    }

    /// A set with the built-in seed entity families, for tests and demos.
    pub fn with_seed_entities() -> OntologyResult<Self> {
        Self::new(seeds::seed_entity_hierarchy()?)
    }

    /// A set with an empty entity hierarchy.
    pub fn without_entities() -> OntologyResult<Self> {
        Self::new(HierarchyGraph::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> HierarchyGraph {
        seeds::seed_entity_hierarchy().unwrap()
    }

    #[test]
    fn isa_reflexive() {
        let h = entities();
        assert!(h.isa("HGNC", "BRAF", "HGNC", "BRAF"));
    }

    #[test]
    fn isa_family_member() {
        let h = entities();
        assert!(h.isa("HGNC", "BRAF", "BE", "RAF"));
        assert!(!h.isa("HGNC", "BRAF", "HGNC", "ARAF"));
        assert!(!h.isa("BE", "RAF", "HGNC", "BRAF"));
    }

    #[test]
    fn isa_transitive_against_closure() {
        let mut b = HierarchyBuilder::new();
        b.add_edge("HGNC", "X", Relation::IsA, "BE", "Y").unwrap();
        b.add_edge("BE", "Y", Relation::IsA, "BE", "Z").unwrap();
        let h = b.build().unwrap();
        assert!(h.isa("HGNC", "X", "BE", "Y"));
        assert!(h.isa("BE", "Y", "BE", "Z"));
        assert!(h.isa("HGNC", "X", "BE", "Z"));
        assert!(!h.isa("BE", "Z", "HGNC", "X"));
    }

    #[test]
    fn partof_complex_member() {
        let h = entities();
        assert!(h.partof("BE", Some("HIF1_alpha"), "BE", Some("HIF1")));
        assert!(!h.partof("BE", Some("HIF1"), "BE", Some("HIF1_alpha")));
    }

    #[test]
    fn partof_none_wildcard() {
        let h = seeds::component_hierarchy().unwrap();
        assert!(h.partof("INDRA", Some("cytoplasm"), "INDRA", None));
        assert!(h.partof("INDRA", None, "INDRA", None));
        assert!(!h.partof("INDRA", None, "INDRA", Some("cytoplasm")));
    }

    #[test]
    fn partof_through_family_membership() {
        // A gene-level member of a subfamily is still part of the complex.
        let mut b = HierarchyBuilder::new();
        b.add_edge("HGNC", "PRKAA1", Relation::IsA, "BE", "AMPK_alpha").unwrap();
        b.add_edge("BE", "AMPK_alpha", Relation::PartOf, "BE", "AMPK").unwrap();
        let h = b.build().unwrap();
        assert!(h.partof("HGNC", Some("PRKAA1"), "BE", Some("AMPK")));
        assert!(!h.isa("HGNC", "PRKAA1", "BE", "AMPK"));
    }

    #[test]
    fn get_parents_modes() {
        let h = entities();
        let prkaa1 = h.get_uri("HGNC", "PRKAA1").unwrap();
        let ampk = h.get_uri("BE", "AMPK").unwrap();
        let alpha = h.get_uri("BE", "AMPK_alpha").unwrap();

        let all = h.get_parents(&prkaa1, ParentMode::All);
        assert!(all.contains(&ampk));
        assert!(all.contains(&alpha));

        let immediate = h.get_parents(&prkaa1, ParentMode::Immediate);
        assert!(immediate.contains(&alpha));
        assert!(!immediate.contains(&ampk));

        let top = h.get_parents(&prkaa1, ParentMode::Top);
        assert!(top.contains(&ampk));
        assert!(!top.contains(&alpha));
    }

    #[test]
    fn get_children_family_and_complex() {
        let h = entities();
        let raf = h.get_uri("BE", "RAF").unwrap();
        let braf = h.get_uri("HGNC", "BRAF").unwrap();
        let rafs = h.get_children(&raf);
        assert_eq!(rafs.len(), 3);
        assert!(rafs.contains(&braf));
        // Gene-level entities have no children.
        assert!(h.get_children(&braf).is_empty());
        // Unknown URIs yield empty results, never an error.
        assert!(h.get_children("").is_empty());
        assert!(h.get_children("http://example.org/nope").is_empty());
    }

    #[test]
    fn unknown_grounding_is_no_match() {
        let h = entities();
        assert!(!h.isa("NOPE", "X", "BE", "RAF"));
        assert!(!h.partof("NOPE", Some("X"), "BE", Some("RAF")));
        assert!(h.get_parents("http://example.org/nope", ParentMode::All).is_empty());
    }

    #[test]
    fn cycle_is_rejected() {
        let mut b = HierarchyBuilder::new();
        b.add_edge("BE", "A", Relation::IsA, "BE", "B").unwrap();
        b.add_edge("BE", "B", Relation::IsA, "BE", "A").unwrap();
        assert!(matches!(b.build(), Err(OntologyError::Cycle { .. })));
    }

    #[test]
    fn config_round_trip() {
        let toml_str = r#"
            [[edges]]
            relation = "isa"
            child = "HGNC:BRAF"
            parent = "BE:RAF"

            [[edges]]
            relation = "partof"
            child = "BE:HIF1_alpha"
            parent = "BE:HIF1"
        "#;
        let h = HierarchyGraph::from_toml_str(toml_str).unwrap();
        assert!(h.isa("HGNC", "BRAF", "BE", "RAF"));
        assert!(h.partof("BE", Some("HIF1_alpha"), "BE", Some("HIF1")));
    }

    #[test]
    fn bad_config_is_rejected() {
        let toml_str = r#"
            [[edges]]
            relation = "sibling"
            child = "HGNC:BRAF"
            parent = "BE:RAF"
        "#;
        assert!(matches!(
            HierarchyGraph::from_toml_str(toml_str),
            Err(OntologyError::Config { .. })
        ));
        let toml_str = r#"
            [[edges]]
            relation = "isa"
            child = "BRAF"
            parent = "BE:RAF"
        "#;
        assert!(matches!(
            HierarchyGraph::from_toml_str(toml_str),
            Err(OntologyError::BadReference { .. })
        ));
    }

    #[test]
    fn identifiers_url_round_trip() {
        let url = identifiers_url("UP", "P15056").unwrap();
        assert_eq!(parse_identifiers_url(&url), Some(("UP".into(), "P15056".into())));
        let url = identifiers_url("HGNC", "1097").unwrap();
        assert_eq!(parse_identifiers_url(&url), Some(("HGNC".into(), "1097".into())));
        assert_eq!(parse_identifiers_url("http://identifiers.org/hgnc/1097"), None);
        assert_eq!(parse_identifiers_url("not a url"), None);
        assert_eq!(identifiers_url("BE", "RAF"), None);
    }
}
