use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use itertools::iproduct;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use super::a_star::astar_path;
use super::geometry::GeoPoint;
use super::network::RoadNetwork;
use super::RoutingConfig;


/// The average speed assumed when estimating the time remaining to a destination.
pub const HEURISTIC_SPEED: f64 = 70.;

/// A walk along directed edges, from its origin to its destination.
pub type Path = Vec<GeoPoint>;

/// The time taken to traverse the straight line between two points at a given speed.
pub fn edge_cost(node_a: &GeoPoint, node_b: &GeoPoint, assumed_speed: f64) -> f64 {
    node_a.euclidean_distance(node_b) / assumed_speed
}

pub fn heuristic(node_a: &GeoPoint, node_b: &GeoPoint) -> f64 {
    edge_cost(node_a, node_b, HEURISTIC_SPEED)
}

/// Flags each node as "low-degree" if it has at most one outgoing edge.
pub fn adjacency_precheck(network: &RoadNetwork) -> HashMap<GeoPoint, bool> {
    network.nodes().into_iter()
        .map(|node| (node, network.out_degree(&node) <= 1))
        .collect()
}

/// Converts a path specified as a list of nodes into a list of edges.
pub fn path_to_edges(path: &[GeoPoint]) -> Vec<(GeoPoint, GeoPoint)> {
    path.windows(2).map(|pair| (pair[0], pair[1])).collect()
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStats {
    /// Number of ordered pairs of distinct nodes.
    pub expected: usize,
    pub pruned: usize,
    pub attempted: usize,
    pub abandoned: usize,
    pub found: usize,
}

/// The best path found between each pair of nodes that has one.  Pairs with no path are simply
/// absent.  Iteration is ordered by (origin, destination).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSet {
    paths: BTreeMap<(GeoPoint, GeoPoint), Path>,
    stats: PathStats,
}

impl PathSet {
    pub fn from_paths(paths: BTreeMap<(GeoPoint, GeoPoint), Path>) -> PathSet {
        let found = paths.len();
        PathSet {
            paths,
            stats: PathStats{found, ..PathStats::default()},
        }
    }

    pub fn get(&self, origin: &GeoPoint, destination: &GeoPoint) -> Option<&Path> {
        self.paths.get(&(*origin, *destination))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(GeoPoint, GeoPoint), &Path)> {
        self.paths.iter()
    }

    pub fn route_keys(&self) -> Vec<(GeoPoint, GeoPoint)> {
        self.paths.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn stats(&self) -> &PathStats {
        &self.stats
    }
}


/// Computes a path for each ordered pair of distinct nodes, using A* over the edges' time costs.
///
/// If the config asks for it, pairs are only searched when both of their nodes are low-degree
/// according to `adjacency_precheck`.  This skips a lot of searches on large networks but can
/// discard pairs that do have a path.
///
/// Searches run in parallel.  If the config gives a deadline, pairs that haven't been started
/// when it passes are abandoned.
pub fn compute_all_pairs_paths<CC>(network: &RoadNetwork, cfg: &CC) -> PathSet
where CC: RoutingConfig + Sync
{
    let graph = network.graph();
    let low_degree = match cfg.get_prune_low_degree() {
        true => Some(adjacency_precheck(network)),
        false => None,
    };

    let all_pairs: Vec<(NodeIndex, NodeIndex)> =
        iproduct!(graph.node_indices(), graph.node_indices())
        .filter(|(origin, destination)| origin != destination)
        .collect();
    let expected = all_pairs.len();
    let pairs: Vec<(NodeIndex, NodeIndex)> = match &low_degree {
        Some(low_degree) => all_pairs.into_iter()
            .filter(|(origin, destination)|
                    low_degree[&graph[*origin]] && low_degree[&graph[*destination]])
            .collect(),
        None => all_pairs,
    };
    let pruned = expected - pairs.len();
    if pruned > 0 {
        log::debug!("adjacency precheck pruned {} of {} pairs", pruned, expected);
    }

    let deadline = cfg.get_deadline().and_then(|limit| Instant::now().checked_add(limit));
    let abandoned = AtomicUsize::new(0);
    let found: Vec<((GeoPoint, GeoPoint), Path)> = pairs.par_iter()
        .filter_map(|&(origin, destination)| {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    abandoned.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
            let goal_pos = graph[destination];
            let (_, path) = astar_path(graph, origin, destination,
                                       |er| er.weight().time_cost,
                                       |ni| cfg.estimated_time(&graph[ni], &goal_pos))?;
            let path: Path = path.into_iter().map(|ni| graph[ni]).collect();
            Some(((graph[origin], goal_pos), path))
        })
        .collect();

    let abandoned = abandoned.into_inner();
    if abandoned > 0 {
        log::warn!("deadline passed, abandoned {} of {} pairs", abandoned, pairs.len());
    }
    log::info!("Computed {} paths. Expected to compute {}", found.len(), expected);

    let stats = PathStats {
        expected,
        pruned,
        attempted: pairs.len() - abandoned,
        abandoned,
        found: found.len(),
    };
    PathSet {
        paths: found.into_iter().collect(),
        stats,
    }
}
