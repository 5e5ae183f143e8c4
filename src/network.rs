// this file defines a struct to represent the road network built from the feed's locations.
// It's a wrapper around a petgraph graph whose nodes are identified by their coordinates.
use std::collections::HashMap;
use std::collections::HashSet;

use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::geometry::{GeoPoint, LineSegment};
use super::location::{Location, Measurement, Observation, ObservationIndex};
use super::paths::edge_cost;


#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    pub location_id: String,
    /// None if the segment had no reading, or flows weren't requested.
    pub flow: Option<f64>,
    /// The cost of traversing the edge during path search.
    pub time_cost: f64,
    /// Projected line for display.  Only set by `render::assign_geometry`.
    pub geometry: Option<LineSegment>,
}

impl RoadEdge {
    pub fn new(location_id: &str, flow: Option<f64>, time_cost: f64) -> RoadEdge {
        RoadEdge {
            location_id: String::from(location_id),
            flow,
            time_cost,
            geometry: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    graph: DiGraph<GeoPoint, RoadEdge>,
    node_idxs: HashMap<GeoPoint, NodeIndex>,
}

impl RoadNetwork {
    pub fn new() -> RoadNetwork {
        RoadNetwork::default()
    }

    /// Returns the index of the node at `point`, creating it if needed.
    pub fn add_node(&mut self, point: GeoPoint) -> NodeIndex {
        if let Some(idx) = self.node_idxs.get(&point) {
            return *idx;
        }
        let idx = self.graph.add_node(point);
        self.node_idxs.insert(point, idx);
        idx
    }

    /// Adds an edge between two points.  If the edge already exists, its data is replaced.
    pub fn add_segment(&mut self, from: GeoPoint, to: GeoPoint, edge: RoadEdge) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);
        self.graph.update_edge(from_idx, to_idx, edge);
    }

    pub fn graph(&self) -> &DiGraph<GeoPoint, RoadEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, point: &GeoPoint) -> Option<NodeIndex> {
        self.node_idxs.get(point).cloned()
    }

    pub fn node_position(&self, idx: NodeIndex) -> GeoPoint {
        self.graph[idx]
    }

    /// All nodes, in the order they were created.
    pub fn nodes(&self) -> Vec<GeoPoint> {
        self.graph.node_indices().map(|ni| self.graph[ni]).collect()
    }

    pub fn edge(&self, from: &GeoPoint, to: &GeoPoint) -> Option<&RoadEdge> {
        let from_idx = self.node_index(from)?;
        let to_idx = self.node_index(to)?;
        let edge_idx = self.graph.find_edge(from_idx, to_idx)?;
        self.graph.edge_weight(edge_idx)
    }

    pub fn out_degree(&self, point: &GeoPoint) -> usize {
        match self.node_index(point) {
            Some(idx) => self.graph.neighbors_directed(idx, Direction::Outgoing).count(),
            None => 0,
        }
    }

    /// Every edge as a (from, to) pair, sorted.  This order doesn't depend on how the graph was
    /// built, so it's the one to index matrix rows by.
    pub fn canonical_edges(&self) -> Vec<(GeoPoint, GeoPoint)> {
        let mut edges: Vec<(GeoPoint, GeoPoint)> = self.graph.edge_references()
            .map(|er| (self.graph[er.source()], self.graph[er.target()]))
            .collect();
        edges.sort();
        edges
    }

    /// The edges as lines, along with their flows, in canonical order.
    pub fn lines_and_flows(&self, missing_flow: f64) -> (Vec<(GeoPoint, GeoPoint)>, Vec<f64>) {
        let lines = self.canonical_edges();
        let flows = lines.iter()
            .map(|(from, to)| self.flow_for_segment(from, to).value_or(missing_flow))
            .collect();
        (lines, flows)
    }

    pub fn flow_for_segment(&self, from: &GeoPoint, to: &GeoPoint) -> Measurement {
        match self.edge(from, to).and_then(|edge| edge.flow) {
            Some(flow) => Measurement::Measured(flow),
            None => Measurement::Absent,
        }
    }

    /// Builds the subgraph induced by the endpoints of every edge passing within `radius` of
    /// `centre`.
    pub fn subgraph_within(&self, centre: &GeoPoint, radius: f64) -> RoadNetwork {
        let mut nodes_of_interest = HashSet::new();
        for er in self.graph.edge_references() {
            let segment = LineSegment::new(self.graph[er.source()], self.graph[er.target()]);
            if centre.distance_to_segment(&segment) <= radius {
                nodes_of_interest.insert(er.source());
                nodes_of_interest.insert(er.target());
            }
        }

        let mut subgraph = RoadNetwork::new();
        for ni in self.graph.node_indices() {
            if nodes_of_interest.contains(&ni) {
                subgraph.add_node(self.graph[ni]);
            }
        }
        for er in self.graph.edge_references() {
            if nodes_of_interest.contains(&er.source()) && nodes_of_interest.contains(&er.target()) {
                subgraph.add_segment(self.graph[er.source()], self.graph[er.target()],
                                     er.weight().clone());
            }
        }
        subgraph
    }

    /// Returns a copy of the network with `func` applied to every edge.
    pub fn map_edges<F>(&self, mut func: F) -> RoadNetwork
    where F: FnMut(&GeoPoint, &GeoPoint, &RoadEdge) -> RoadEdge
    {
        let mut mapped = self.clone();
        for er in self.graph.edge_references() {
            let new_edge = func(&self.graph[er.source()], &self.graph[er.target()], er.weight());
            mapped.graph[er.id()] = new_edge;
        }
        mapped
    }
}

impl PartialEq for RoadNetwork {
    fn eq(&self, other: &Self) -> bool {
        if self.nodes() != other.nodes() {
            return false;
        }
        let edges = self.canonical_edges();
        if edges != other.canonical_edges() {
            return false;
        }
        edges.iter().all(|(from, to)| self.edge(from, to) == other.edge(from, to))
    }
}


/// Builds the road graph, with one edge from each location's "from" point to its "to" point.
/// If two locations cover the same pair of points, the later one replaces the earlier one.
pub fn build_graph(locations: &[Location], observations: &[Observation], include_flow: bool,
                   assumed_speed: f64) -> RoadNetwork {
    let index = ObservationIndex::new(observations);
    let mut network = RoadNetwork::new();
    let mut num_flows = 0;
    for loc in locations {
        let flow = match include_flow {
            true => index.lookup(&loc.id).value(),
            false => None,
        };
        if flow.is_some() {
            num_flows += 1;
        }
        let time_cost = edge_cost(&loc.from, &loc.to, assumed_speed);
        network.add_segment(loc.from, loc.to, RoadEdge::new(&loc.id, flow, time_cost));
    }
    log::debug!("built network with {} nodes and {} edges, {} locations had flows",
                network.node_count(), network.edge_count(), num_flows);
    network
}
