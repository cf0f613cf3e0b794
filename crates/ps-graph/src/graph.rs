//! The AND/OR parameter graph and its search operators.
//!
//! An OR node is a parameter's decision point; each AND node below it is one
//! sub-domain the parameter may take there. A node is active once its gate
//! opens: any group-0 parent is done, or every parent of some nonzero group
//! is done. The start node is always done.

use ps_types::{
    ConfigurationError, Domain, DomainKind, Parameter, ParameterConfiguration, ParameterSet,
    ParameterValue, PsResult,
};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::builder;
use crate::definition::GraphDefinition;
use crate::node::{DoneSet, Edge, Gate, Node, NodeId};
use crate::settings::{
    GaussianNeighbourhood, DEFAULT_MUTATION_PROBABILITY, DEFAULT_STD_DEV_FACTOR,
};

/// Conditional parameter space.
///
/// Adjacency, gates and component colouring are computed once by
/// [`from_definition`](ParameterGraph::from_definition) and never change.
#[derive(Debug, Clone)]
pub struct ParameterGraph {
    pub(crate) parameters: Arc<ParameterSet>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) labels: Vec<String>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) start: NodeId,
    pub(crate) children: Vec<Vec<NodeId>>,
    pub(crate) parents: Vec<Vec<NodeId>>,
    pub(crate) gates: Vec<Gate>,
    pub(crate) topo_rank: Vec<usize>,
    /// AND nodes per parameter index, ascending.
    pub(crate) and_nodes: Vec<Vec<NodeId>>,
    /// OR nodes per parameter index, ascending.
    pub(crate) or_nodes: Vec<Vec<NodeId>>,
    /// Parameters of each connected component, colour `i + 1` at index `i`.
    pub(crate) components: Vec<Vec<usize>>,
    pub(crate) fixed: BTreeMap<usize, ParameterValue>,
}

impl ParameterGraph {
    pub fn from_definition(definition: GraphDefinition) -> PsResult<Self> {
        builder::compile(definition)
    }

    pub fn from_json(json: &str) -> PsResult<Self> {
        Self::from_definition(GraphDefinition::from_json(json)?)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    pub fn parameter_set(&self) -> &Arc<ParameterSet> {
        &self.parameters
    }

    pub fn parameter_map(&self) -> BTreeMap<&str, &Parameter> {
        self.parameters.iter().map(|p| (p.name(), p)).collect()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_label(&self, id: NodeId) -> Option<&str> {
        self.labels.get(id.index()).map(String::as_str)
    }

    pub fn node_id(&self, label: &str) -> Option<NodeId> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| NodeId::new(i as u32))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn start_node(&self) -> NodeId {
        self.start
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        self.parents.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component_parameters(&self) -> &[Vec<usize>] {
        &self.components
    }

    /// A done-set holding only the start node.
    pub fn done_set(&self) -> DoneSet {
        let mut done = DoneSet::new(self.nodes.len());
        done.insert(self.start);
        done
    }

    /// Activation gate of `node` given the done AND nodes.
    pub fn is_active(&self, node: NodeId, done: &DoneSet) -> bool {
        self.gates
            .get(node.index())
            .map(|gate| gate.is_open(done))
            .unwrap_or(false)
    }

    fn and_parts(&self, id: NodeId) -> Option<(usize, &Domain)> {
        match self.nodes.get(id.index()) {
            Some(Node::And { parameter, domain }) => Some((*parameter, domain)),
            _ => None,
        }
    }

    fn parameter_name(&self, index: usize) -> &str {
        self.parameters.get(index).map(Parameter::name).unwrap_or("")
    }

    // ------------------------------------------------------------------
    // Fixed parameters
    // ------------------------------------------------------------------

    /// Pin parameters to externally chosen values, replacing any previous
    /// pins. Pinned parameters are excluded from every search operator.
    pub fn set_fixed_parameters(
        &mut self,
        fixed: HashMap<String, ParameterValue>,
    ) -> PsResult<()> {
        let mut resolved = BTreeMap::new();
        for (name, value) in fixed {
            let index = self
                .parameters
                .index_of(&name)
                .ok_or_else(|| ConfigurationError::UnknownParameter { name: name.clone() })?;
            let domain = self.parameters.get(index).map(Parameter::domain);
            match domain {
                Some(domain) if domain.contains(&value) => {
                    resolved.insert(index, domain.widen(value));
                }
                _ => {
                    return Err(ConfigurationError::ValueOutOfDomain {
                        parameter: name,
                        value: value.to_string(),
                        domain: domain.map(|d| d.to_string()).unwrap_or_default(),
                    }
                    .into())
                }
            }
        }
        debug!(count = resolved.len(), "Pinned fixed parameters");
        self.fixed = resolved;
        Ok(())
    }

    pub fn fixed_parameters(&self) -> BTreeMap<&str, &ParameterValue> {
        self.fixed
            .iter()
            .map(|(index, value)| (self.parameter_name(*index), value))
            .collect()
    }

    pub fn is_fixed(&self, name: &str) -> bool {
        self.parameters
            .index_of(name)
            .map(|i| self.fixed.contains_key(&i))
            .unwrap_or(false)
    }

    fn pin_fixed(&self, config: &mut ParameterConfiguration) {
        for (index, value) in &self.fixed {
            config.set_parameter_value_unchecked(*index, Some(value.clone()));
        }
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    /// AND nodes reached from the start node through open gates whose
    /// sub-domain contains the configuration's value, in ascending id order.
    /// The start node is not included.
    pub fn active_and_nodes(&self, config: &ParameterConfiguration) -> Vec<NodeId> {
        self.collect_active(config, false)
    }

    fn collect_active(&self, config: &ParameterConfiguration, skip_fixed: bool) -> Vec<NodeId> {
        let done = self.reachable_done_set(config);
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| match node {
                Node::And { parameter, .. } => {
                    let id = NodeId::new(id as u32);
                    let skipped = skip_fixed && self.fixed.contains_key(parameter);
                    (done.contains(id) && !skipped).then_some(id)
                }
                _ => None,
            })
            .collect()
    }

    /// Done-set of a configuration: every open OR node marks the AND
    /// children holding its parameter's value as done.
    fn reachable_done_set(&self, config: &ParameterConfiguration) -> DoneSet {
        let mut done = self.done_set();
        let mut processed = vec![false; self.nodes.len()];
        let mut frontier: BTreeSet<NodeId> = self.children(self.start).iter().copied().collect();
        while let Some(or_node) = frontier.iter().copied().find(|id| self.is_active(*id, &done)) {
            frontier.remove(&or_node);
            processed[or_node.index()] = true;
            for &and_node in self.children(or_node) {
                let holds_value = self
                    .and_parts(and_node)
                    .is_some_and(|(p, d)| config.value_at(p).is_some_and(|v| d.contains(v)));
                if !holds_value {
                    continue;
                }
                done.insert(and_node);
                for child in self.children(and_node) {
                    if !processed[child.index()] {
                        frontier.insert(*child);
                    }
                }
            }
        }
        done
    }

    /// The sub-domain of the active AND node holding the configuration's
    /// value for `parameter`, or `None` when the parameter is inactive,
    /// fixed or unknown.
    pub fn get_constrained_parameter_domain(
        &self,
        config: &ParameterConfiguration,
        parameter: &str,
    ) -> Option<&Domain> {
        let index = self.parameters.index_of(parameter)?;
        if self.fixed.contains_key(&index) {
            return None;
        }
        let done = self.reachable_done_set(config);
        self.and_nodes[index]
            .iter()
            .filter(|id| done.contains(**id))
            .find_map(|id| self.and_parts(*id))
            .map(|(_, domain)| domain)
    }

    // ------------------------------------------------------------------
    // Sampling
    // ------------------------------------------------------------------

    /// Sample a configuration by walking the graph from the start node.
    ///
    /// Open OR nodes are taken in random order and a random AND child picks
    /// the sub-domain. A parameter reached a second time keeps its first
    /// value, which activates every sibling sub-domain containing it. Fixed
    /// parameters take part with their pinned values.
    pub fn get_random_configuration<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterConfiguration {
        let mut config = ParameterConfiguration::new(self.parameters.clone());
        self.pin_fixed(&mut config);

        let mut done = self.done_set();
        let mut processed = vec![false; self.nodes.len()];
        let mut frontier: BTreeSet<NodeId> = self.children(self.start).iter().copied().collect();

        loop {
            let open: Vec<NodeId> = frontier
                .iter()
                .copied()
                .filter(|id| self.is_active(*id, &done))
                .collect();
            if open.is_empty() {
                break;
            }
            let or_node = open[rng.gen_range(0..open.len())];
            frontier.remove(&or_node);
            processed[or_node.index()] = true;

            let alternatives = self.children(or_node);
            let chosen = alternatives[rng.gen_range(0..alternatives.len())];
            let Some((parameter, domain)) = self.and_parts(chosen) else {
                continue;
            };

            let activated: Vec<NodeId> = match config.value_at(parameter) {
                None => {
                    config.set_parameter_value_unchecked(parameter, Some(domain.random_value(rng)));
                    vec![chosen]
                }
                Some(existing) => alternatives
                    .iter()
                    .copied()
                    .filter(|id| {
                        self.and_parts(*id)
                            .is_some_and(|(_, d)| d.contains(existing))
                    })
                    .collect(),
            };
            for and_node in activated {
                done.insert(and_node);
                for child in self.children(and_node) {
                    if !processed[child.index()] {
                        frontier.insert(*child);
                    }
                }
            }
        }

        self.pin_fixed(&mut config);
        trace!(config = %config, "Sampled random configuration");
        config
    }

    // ------------------------------------------------------------------
    // Neighbourhoods
    // ------------------------------------------------------------------

    /// Neighbours that change one value within its current sub-domain.
    pub fn get_constrained_neighbourhood(
        &self,
        config: &ParameterConfiguration,
    ) -> Vec<ParameterConfiguration> {
        let active = self.collect_active(config, true);
        let mut neighbours = Vec::new();
        for (index, parameter) in self.parameters.iter().enumerate() {
            let nodes = self.active_domains(&active, index);
            let Some(current) = config.value_at(index) else {
                continue;
            };
            if nodes.is_empty() {
                continue;
            }
            for value in parameter.domain().discrete_values() {
                if value.approx_eq(current) || !nodes.iter().all(|d| d.contains(&value)) {
                    continue;
                }
                let mut neighbour = config.clone();
                neighbour.set_parameter_value_unchecked(index, Some(value));
                neighbours.push(neighbour);
            }
        }
        debug!(size = neighbours.len(), "Constrained neighbourhood");
        neighbours
    }

    /// Every configuration reachable by changing one parameter to another
    /// value of its domain, with dependents switched on or off as needed.
    pub fn get_neighbourhood(
        &self,
        config: &ParameterConfiguration,
    ) -> Vec<ParameterConfiguration> {
        let neighbours =
            self.neighbourhood_with(config, |parameter, _| parameter.domain().discrete_values());
        debug!(size = neighbours.len(), "Neighbourhood");
        neighbours
    }

    /// Like [`get_neighbourhood`](Self::get_neighbourhood), with candidate
    /// values drawn from the mutation distribution around the current value.
    /// Ordinal parameters are enumerated unless `gaussian_ordinal` is set.
    pub fn get_gaussian_neighbourhood<R: Rng + ?Sized>(
        &self,
        config: &ParameterConfiguration,
        rng: &mut R,
        settings: &GaussianNeighbourhood,
    ) -> Vec<ParameterConfiguration> {
        let neighbours = self.neighbourhood_with(config, |parameter, current| {
            let domain = parameter.domain();
            if !settings.gaussian_ordinal && domain.kind() == DomainKind::Ordinal {
                return domain.discrete_values();
            }
            let mut values = domain.gaussian_discrete_values(
                &mut *rng,
                current,
                settings.std_dev_for(parameter.name()),
                settings.samples_for(parameter.name()),
            );
            dedup_values(&mut values);
            values
        });
        debug!(size = neighbours.len(), "Gaussian neighbourhood");
        neighbours
    }

    fn neighbourhood_with<F>(
        &self,
        config: &ParameterConfiguration,
        mut candidates: F,
    ) -> Vec<ParameterConfiguration>
    where
        F: FnMut(&Parameter, &ParameterValue) -> Vec<ParameterValue>,
    {
        let assigned = self.reachable_done_set(config);

        let mut neighbours = Vec::new();
        for (index, parameter) in self.parameters.iter().enumerate() {
            if self.fixed.contains_key(&index) {
                continue;
            }
            let Some(current) = config.value_at(index) else {
                continue;
            };
            let old_domains: Vec<&Domain> = self.and_nodes[index]
                .iter()
                .filter(|id| assigned.contains(**id))
                .filter_map(|id| self.and_parts(*id))
                .map(|(_, domain)| domain)
                .collect();
            if old_domains.is_empty() {
                continue;
            }

            for value in candidates(parameter, current) {
                if value.approx_eq(current) {
                    continue;
                }
                if old_domains.iter().all(|d| d.contains(&value)) {
                    let mut neighbour = config.clone();
                    neighbour.set_parameter_value_unchecked(index, Some(value));
                    neighbours.push(neighbour);
                    continue;
                }
                match self.switch_sub_domain(config, &assigned, index, value) {
                    Some(neighbour) => neighbours.push(neighbour),
                    None => trace!(
                        parameter = parameter.name(),
                        "No sub-domain holds candidate value"
                    ),
                }
            }
        }
        neighbours
    }

    /// Move `parameter` into the open AND nodes holding `value`.
    ///
    /// OR nodes below the AND nodes it leaves whose gate closes lose their
    /// parameter, then the subtree under the new AND nodes is filled in
    /// deterministically: the lowest open OR node first, the first AND child,
    /// its first value.
    fn switch_sub_domain(
        &self,
        config: &ParameterConfiguration,
        assigned: &DoneSet,
        parameter: usize,
        value: ParameterValue,
    ) -> Option<ParameterConfiguration> {
        let mut assigned = assigned.clone();
        let mut left = Vec::new();
        for id in &self.and_nodes[parameter] {
            if assigned.contains(*id) {
                assigned.remove(*id);
                left.push(*id);
            }
        }
        let mut new_nodes = Vec::new();
        for or_node in &self.or_nodes[parameter] {
            if !self.is_active(*or_node, &assigned) {
                continue;
            }
            let holding: Vec<NodeId> = self
                .children(*or_node)
                .iter()
                .copied()
                .filter(|id| self.and_parts(*id).is_some_and(|(_, d)| d.contains(&value)))
                .collect();
            // every open decision point must accept the shared value
            if holding.is_empty() {
                return None;
            }
            new_nodes.extend(holding);
        }
        if new_nodes.is_empty() {
            return None;
        }
        for id in &new_nodes {
            assigned.insert(*id);
        }
        left.retain(|id| !new_nodes.contains(id));

        let mut neighbour = config.clone();
        neighbour.set_parameter_value_unchecked(parameter, Some(value));

        // closure below the AND nodes left behind, visited in topological order
        let mut closure = Vec::new();
        let mut seen = vec![false; self.nodes.len()];
        for id in &left {
            seen[id.index()] = true;
        }
        let mut queue: VecDeque<NodeId> = left.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            for child in self.children(id) {
                if !seen[child.index()] {
                    seen[child.index()] = true;
                    closure.push(*child);
                    queue.push_back(*child);
                }
            }
        }
        closure.sort_by_key(|id| self.topo_rank[id.index()]);

        for id in closure {
            let Some(Node::Or { parameter: dependent }) = self.nodes.get(id.index()) else {
                continue;
            };
            if self.is_active(id, &assigned) {
                continue;
            }
            for child in self.children(id) {
                if !new_nodes.contains(child) {
                    assigned.remove(*child);
                }
            }
            let still_assigned = self.and_nodes[*dependent]
                .iter()
                .any(|n| assigned.contains(*n));
            if *dependent != parameter && !still_assigned {
                neighbour.set_parameter_value_unchecked(*dependent, None);
            }
        }

        let mut processed = vec![false; self.nodes.len()];
        let mut frontier: BTreeSet<NodeId> = new_nodes
            .iter()
            .flat_map(|id| self.children(*id).iter().copied())
            .collect();
        while let Some(or_node) = frontier
            .iter()
            .copied()
            .find(|id| self.is_active(*id, &assigned))
        {
            frontier.remove(&or_node);
            processed[or_node.index()] = true;
            let alternatives = self.children(or_node);

            let dependent = self.nodes.get(or_node.index()).and_then(Node::parameter);
            let activated: Vec<NodeId> = match dependent {
                Some(dependent) => match neighbour.value_at(dependent).cloned() {
                    None => {
                        let first_alternative = alternatives.first().copied();
                        let Some((_, domain)) = first_alternative.and_then(|id| self.and_parts(id))
                        else {
                            continue;
                        };
                        let first = domain.discrete_values().into_iter().next();
                        neighbour.set_parameter_value_unchecked(dependent, first);
                        first_alternative.into_iter().collect()
                    }
                    // first assignment wins: keep the shared value
                    Some(existing) => alternatives
                        .iter()
                        .copied()
                        .filter(|id| {
                            self.and_parts(*id)
                                .is_some_and(|(_, d)| d.contains(&existing))
                        })
                        .collect(),
                },
                None => Vec::new(),
            };
            for and_node in activated {
                assigned.insert(and_node);
                for child in self.children(and_node) {
                    if !processed[child.index()] {
                        frontier.insert(*child);
                    }
                }
            }
        }

        Some(neighbour)
    }

    // ------------------------------------------------------------------
    // Random neighbours
    // ------------------------------------------------------------------

    /// Change one value within its current sub-domain.
    ///
    /// Returns `None` when no active, non-fixed parameter exists or no value
    /// different from the current one is available.
    pub fn get_random_neighbour<R: Rng + ?Sized>(
        &self,
        config: &ParameterConfiguration,
        rng: &mut R,
    ) -> Option<ParameterConfiguration> {
        self.random_neighbour_with(config, rng, |_, domain, _, _| domain.discrete_values())
    }

    /// [`get_random_neighbour`](Self::get_random_neighbour) with candidates
    /// drawn from the mutation distribution.
    pub fn get_gaussian_random_neighbour<R: Rng + ?Sized>(
        &self,
        config: &ParameterConfiguration,
        rng: &mut R,
        settings: &GaussianNeighbourhood,
    ) -> Option<ParameterConfiguration> {
        self.random_neighbour_with(config, rng, |name, domain, current, rng| {
            if !settings.gaussian_ordinal && domain.kind() == DomainKind::Ordinal {
                domain.discrete_values()
            } else {
                domain.gaussian_discrete_values(
                    rng,
                    current,
                    settings.std_dev_for(name),
                    settings.samples_for(name),
                )
            }
        })
    }

    fn random_neighbour_with<R, F>(
        &self,
        config: &ParameterConfiguration,
        rng: &mut R,
        mut candidates: F,
    ) -> Option<ParameterConfiguration>
    where
        R: Rng + ?Sized,
        F: FnMut(&str, &Domain, &ParameterValue, &mut R) -> Vec<ParameterValue>,
    {
        let active = self.collect_active(config, true);
        if active.is_empty() {
            debug!("No active parameter to move");
            return None;
        }
        let node = active[rng.gen_range(0..active.len())];
        let (parameter, domain) = self.and_parts(node)?;
        let current = config.value_at(parameter)?;
        let siblings = self.active_domains(&active, parameter);

        let mut pool = candidates(self.parameter_name(parameter), domain, current, rng);
        while !pool.is_empty() {
            let value = pool.swap_remove(rng.gen_range(0..pool.len()));
            if value.approx_eq(current) || !siblings.iter().all(|d| d.contains(&value)) {
                continue;
            }
            let mut neighbour = config.clone();
            neighbour.set_parameter_value_unchecked(parameter, Some(value));
            return Some(neighbour);
        }
        debug!(parameter = self.parameter_name(parameter), "Candidate pool exhausted");
        None
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Perturb each active, non-fixed parameter with probability
    /// `mutation_probability`.
    pub fn mutate_parameter_configuration<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        config: &mut ParameterConfiguration,
        std_dev_factor: f64,
        mutation_probability: f64,
    ) {
        let active = self.collect_active(config, true);
        let mut mutated = 0usize;
        let mut seen = BTreeSet::new();
        for node in &active {
            if rng.gen::<f64>() >= mutation_probability {
                continue;
            }
            let Some((parameter, domain)) = self.and_parts(*node) else {
                continue;
            };
            // a shared parameter moves once, and only within every active sub-domain
            if !seen.insert(parameter) {
                continue;
            }
            let Some(current) = config.value_at(parameter) else {
                continue;
            };
            let next = domain.mutated_value(rng, current, std_dev_factor);
            if !self.active_domains(&active, parameter).iter().all(|d| d.contains(&next)) {
                continue;
            }
            config.set_parameter_value_unchecked(parameter, Some(next));
            mutated += 1;
        }
        trace!(mutated, "Mutated configuration");
    }

    /// Mutation with std-dev factor 0.1 and per-parameter probability 0.05.
    pub fn mutate_with_defaults<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        config: &mut ParameterConfiguration,
    ) {
        self.mutate_parameter_configuration(
            rng,
            config,
            DEFAULT_STD_DEV_FACTOR,
            DEFAULT_MUTATION_PROBABILITY,
        );
    }

    fn active_domains(&self, active: &[NodeId], parameter: usize) -> Vec<&Domain> {
        active
            .iter()
            .filter_map(|id| self.and_parts(*id))
            .filter(|(p, _)| *p == parameter)
            .map(|(_, domain)| domain)
            .collect()
    }

    // ------------------------------------------------------------------
    // Crossover
    // ------------------------------------------------------------------

    /// Uniform crossover over connected components: each component comes
    /// whole from one parent, chosen by a fair coin.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        first: &ParameterConfiguration,
        second: &ParameterConfiguration,
        rng: &mut R,
    ) -> (ParameterConfiguration, ParameterConfiguration) {
        let swaps: Vec<bool> = (0..self.components.len())
            .map(|_| rng.gen::<f64>() < 0.5)
            .collect();
        self.recombine(first, second, &swaps)
    }

    /// Two-point crossover over component colours: colours between the two
    /// cut points are swapped, the rest are inherited unchanged.
    pub fn crossover_2point<R: Rng + ?Sized>(
        &self,
        first: &ParameterConfiguration,
        second: &ParameterConfiguration,
        rng: &mut R,
    ) -> (ParameterConfiguration, ParameterConfiguration) {
        let colours = self.components.len() + 1;
        if colours < 2 {
            return self.recombine(first, second, &[]);
        }
        let first_cut = rng.gen_range(0..colours / 2) + 1;
        let second_cut = rng.gen_range(0..colours / 2 + 1) + 1 + colours / 2;
        trace!(first_cut, second_cut, "Two-point crossover cuts");
        let swaps: Vec<bool> = (1..colours)
            .map(|colour| colour > first_cut && colour <= second_cut)
            .collect();
        self.recombine(first, second, &swaps)
    }

    fn recombine(
        &self,
        first: &ParameterConfiguration,
        second: &ParameterConfiguration,
        swaps: &[bool],
    ) -> (ParameterConfiguration, ParameterConfiguration) {
        let mut a = ParameterConfiguration::new(self.parameters.clone());
        let mut b = ParameterConfiguration::new(self.parameters.clone());
        for (members, swap) in self.components.iter().zip(swaps) {
            let (into_a, into_b) = if *swap { (second, first) } else { (first, second) };
            for &parameter in members {
                a.set_parameter_value_unchecked(parameter, into_a.value_at(parameter).cloned());
                b.set_parameter_value_unchecked(parameter, into_b.value_at(parameter).cloned());
            }
        }
        self.pin_fixed(&mut a);
        self.pin_fixed(&mut b);
        (a, b)
    }
}

fn dedup_values(values: &mut Vec<ParameterValue>) {
    let mut unique: Vec<ParameterValue> = Vec::with_capacity(values.len());
    for value in values.drain(..) {
        if !unique.iter().any(|u| u.approx_eq(&value)) {
            unique.push(value);
        }
    }
    *values = unique;
}
