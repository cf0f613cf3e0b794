//! Turning definitions into the node arena.

use ps_types::{Domain, GraphError, Parameter, ParameterSet, PsResult};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

use crate::definition::{EdgeDefinition, GraphDefinition, NodeDefinition};
use crate::graph::ParameterGraph;
use crate::node::{Edge, Gate, Node, NodeId};

/// Programmatic construction of a [`ParameterGraph`].
///
/// Produces the same [`GraphDefinition`] a loader would and is validated the
/// same way on [`build`](GraphBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    definition: GraphDefinition,
    start_id: Option<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(mut self, name: impl Into<String>, domain: Domain) -> Self {
        self.definition.parameters.push(Parameter::new(name, domain));
        self
    }

    pub fn start(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.start_id = Some(id.clone());
        self.definition.nodes.push(NodeDefinition::Start { id });
        self
    }

    pub fn or_node(mut self, id: impl Into<String>, parameter: impl Into<String>) -> Self {
        self.definition.nodes.push(NodeDefinition::Or {
            id: id.into(),
            parameter: parameter.into(),
        });
        self
    }

    pub fn and_node(
        mut self,
        id: impl Into<String>,
        parameter: impl Into<String>,
        domain: Domain,
    ) -> Self {
        self.definition.nodes.push(NodeDefinition::And {
            id: id.into(),
            parameter: parameter.into(),
            domain: Some(domain),
        });
        self
    }

    /// Disjunctive (group 0) edge.
    pub fn edge(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.grouped_edge(source, target, 0)
    }

    pub fn grouped_edge(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        group: i32,
    ) -> Self {
        self.definition.edges.push(EdgeDefinition {
            source: source.into(),
            target: target.into(),
            group,
        });
        self
    }

    /// Parameter hanging directly off the start node with a single AND node
    /// covering its whole domain. Node ids are `<name>` for the OR node and
    /// `<name>_vals` for the AND node.
    pub fn unconditional(self, name: &str, domain: Domain) -> Self {
        let start = self.start_id.clone().unwrap_or_else(|| "start".to_string());
        let values = format!("{name}_vals");
        self.parameter(name, domain.clone())
            .or_node(name, name)
            .and_node(values.clone(), name, domain)
            .edge(start, name)
            .edge(name, values)
    }

    pub fn definition(&self) -> &GraphDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> GraphDefinition {
        self.definition
    }

    pub fn build(self) -> PsResult<ParameterGraph> {
        ParameterGraph::from_definition(self.definition)
    }
}

impl From<GraphDefinition> for GraphBuilder {
    fn from(definition: GraphDefinition) -> Self {
        let start_id = definition.nodes.iter().find_map(|n| match n {
            NodeDefinition::Start { id } => Some(id.clone()),
            _ => None,
        });
        Self {
            definition,
            start_id,
        }
    }
}

fn resolve_parameter(parameters: &ParameterSet, node: &str, parameter: &str) -> PsResult<usize> {
    parameters.index_of(parameter).ok_or_else(|| {
        GraphError::UnknownParameter {
            node: node.to_string(),
            parameter: parameter.to_string(),
        }
        .into()
    })
}

/// Validate a definition and lay it out as an arena with every derived
/// structure precomputed.
pub(crate) fn compile(definition: GraphDefinition) -> PsResult<ParameterGraph> {
    let GraphDefinition {
        parameters,
        nodes: node_definitions,
        edges: edge_definitions,
    } = definition;

    let parameters = Arc::new(ParameterSet::new(parameters)?);
    for parameter in parameters.iter() {
        parameter.domain().validate()?;
    }

    let mut ids: HashMap<String, NodeId> = HashMap::with_capacity(node_definitions.len());
    let mut nodes = Vec::with_capacity(node_definitions.len());
    let mut labels = Vec::with_capacity(node_definitions.len());
    let mut start = None;

    for definition in node_definitions {
        let id = NodeId::new(nodes.len() as u32);
        let label = definition.id().to_string();
        if ids.insert(label.clone(), id).is_some() {
            return Err(GraphError::DuplicateNode { id: label }.into());
        }
        let node = match definition {
            NodeDefinition::Start { .. } => {
                if start.is_some() {
                    return Err(GraphError::DuplicateStartNode { id: label }.into());
                }
                start = Some(id);
                Node::Start
            }
            NodeDefinition::And {
                parameter, domain, ..
            } => {
                let parameter = resolve_parameter(&parameters, &label, &parameter)?;
                let domain = domain.ok_or_else(|| GraphError::MissingDomain {
                    node: label.clone(),
                })?;
                domain
                    .validate()
                    .map_err(|source| GraphError::InvalidDomain {
                        node: label.clone(),
                        source,
                    })?;
                Node::And { parameter, domain }
            }
            NodeDefinition::Or { parameter, .. } => Node::Or {
                parameter: resolve_parameter(&parameters, &label, &parameter)?,
            },
        };
        nodes.push(node);
        labels.push(label);
    }
    let start = start.ok_or(GraphError::MissingStartNode)?;

    let lookup = |name: &str| {
        ids.get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode { id: name.to_string() })
    };
    let mut edges = Vec::with_capacity(edge_definitions.len());
    for definition in &edge_definitions {
        let source = lookup(&definition.source)?;
        let target = lookup(&definition.target)?;
        let (from, to) = (&nodes[source.index()], &nodes[target.index()]);
        let allowed = matches!(
            (from, to),
            (Node::Start, Node::Or { .. })
                | (Node::And { .. }, Node::Or { .. })
                | (Node::Or { .. }, Node::And { .. })
        );
        if !allowed {
            return Err(GraphError::InvalidEdge {
                source_node: definition.source.clone(),
                target_node: definition.target.clone(),
                source_kind: from.kind_name().to_string(),
                target_kind: to.kind_name().to_string(),
            }
            .into());
        }
        edges.push(Edge {
            source,
            target,
            group: definition.group,
        });
    }

    let n = nodes.len();
    let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    let mut parents: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    let mut grouped: Vec<BTreeMap<i32, Vec<NodeId>>> = vec![BTreeMap::new(); n];
    let mut gates = vec![Gate::default(); n];
    for edge in &edges {
        children[edge.source.index()].push(edge.target);
        parents[edge.target.index()].push(edge.source);
        if edge.group == 0 {
            gates[edge.target.index()].disjunctive.push(edge.source);
        } else {
            grouped[edge.target.index()]
                .entry(edge.group)
                .or_default()
                .push(edge.source);
        }
    }
    for list in children.iter_mut().chain(parents.iter_mut()) {
        list.sort();
        list.dedup();
    }
    for (gate, groups) in gates.iter_mut().zip(grouped) {
        gate.disjunctive.sort();
        gate.disjunctive.dedup();
        gate.groups = groups.into_values().collect();
    }

    if let Some(empty) = (0..n).find(|&i| nodes[i].is_or() && children[i].is_empty()) {
        return Err(GraphError::EmptyOrNode {
            node: labels[empty].clone(),
        }
        .into());
    }

    let topo_rank = topological_rank(&children, &parents).map_err(|stuck| GraphError::Cycle {
        node: labels[stuck].clone(),
    })?;

    let mut and_nodes = vec![Vec::new(); parameters.len()];
    let mut or_nodes = vec![Vec::new(); parameters.len()];
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::And { parameter, .. } => and_nodes[*parameter].push(NodeId::new(i as u32)),
            Node::Or { parameter } => or_nodes[*parameter].push(NodeId::new(i as u32)),
            Node::Start => {}
        }
    }

    let components = components(&nodes, &edges, start, &children[start.index()], parameters.len());
    for (i, members) in components.iter().enumerate() {
        debug!(component = i + 1, parameters = members.len(), "Coloured component");
    }

    info!(
        parameters = parameters.len(),
        nodes = n,
        edges = edges.len(),
        components = components.len(),
        "Built parameter graph"
    );

    Ok(ParameterGraph {
        parameters,
        nodes,
        labels,
        edges,
        start,
        children,
        parents,
        gates,
        topo_rank,
        and_nodes,
        or_nodes,
        components,
        fixed: BTreeMap::new(),
    })
}

/// Kahn's algorithm. On a cycle, returns the index of a node on it or
/// downstream of it.
fn topological_rank(
    children: &[Vec<NodeId>],
    parents: &[Vec<NodeId>],
) -> Result<Vec<usize>, usize> {
    let n = children.len();
    let mut indegree: Vec<usize> = parents.iter().map(Vec::len).collect();
    let mut ready: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut rank = vec![usize::MAX; n];
    let mut next = 0;
    while let Some(node) = ready.pop_front() {
        rank[node] = next;
        next += 1;
        for child in &children[node] {
            let c = child.index();
            indegree[c] -= 1;
            if indegree[c] == 0 {
                ready.push_back(c);
            }
        }
    }
    match rank.iter().position(|r| *r == usize::MAX) {
        Some(stuck) => Err(stuck),
        None => Ok(rank),
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb.max(ra)] = ra.min(rb);
        }
    }
}

/// Connected components of the graph with the start node removed, coloured
/// in the order of the start node's children. Nodes of one parameter always
/// share a component. Returns the parameters of each component, sorted.
fn components(
    nodes: &[Node],
    edges: &[Edge],
    start: NodeId,
    start_children: &[NodeId],
    parameter_count: usize,
) -> Vec<Vec<usize>> {
    let mut forest = DisjointSet::new(nodes.len());
    for edge in edges {
        if edge.source != start && edge.target != start {
            forest.union(edge.source.index(), edge.target.index());
        }
    }
    let mut first_node = vec![None; parameter_count];
    for (i, node) in nodes.iter().enumerate() {
        if let Some(p) = node.parameter() {
            match first_node[p] {
                Some(j) => forest.union(i, j),
                None => first_node[p] = Some(i),
            }
        }
    }

    let mut colour_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for child in start_children {
        let root = forest.find(child.index());
        if !colour_of_root.contains_key(&root) {
            colour_of_root.insert(root, components.len());
            components.push(Vec::new());
        }
    }
    for (i, node) in nodes.iter().enumerate() {
        if let Some(p) = node.parameter() {
            if let Some(&colour) = colour_of_root.get(&forest.find(i)) {
                components[colour].push(p);
            }
        }
    }
    for members in &mut components {
        members.sort_unstable();
        members.dedup();
    }
    components
}
