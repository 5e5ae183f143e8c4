use std::collections::HashMap;

use ndarray::prelude::*;

use super::error::{Error, Result};
use super::geometry::GeoPoint;
use super::network::RoadNetwork;
use super::paths::{path_to_edges, PathSet};


/// A fixed numbering of a network's edges, in `RoadNetwork::canonical_edges` order.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeIndexing {
    edges: Vec<(GeoPoint, GeoPoint)>,
    positions: HashMap<(GeoPoint, GeoPoint), usize>,
}

impl EdgeIndexing {
    pub fn new(network: &RoadNetwork) -> EdgeIndexing {
        let edges = network.canonical_edges();
        let positions = edges.iter().enumerate().map(|(ii, edge)| (*edge, ii)).collect();
        EdgeIndexing{edges, positions}
    }

    pub fn edges(&self) -> &[(GeoPoint, GeoPoint)] {
        &self.edges
    }

    pub fn position(&self, from: &GeoPoint, to: &GeoPoint) -> Option<usize> {
        self.positions.get(&(*from, *to)).cloned()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The observed flow on each edge, in this indexing's order.  Edges without a reading get
    /// `missing_flow`.
    pub fn flow_vector(&self, network: &RoadNetwork, missing_flow: f64) -> Array1<f64> {
        self.edges.iter()
            .map(|(from, to)| network.flow_for_segment(from, to).value_or(missing_flow))
            .collect()
    }
}


/// The edge-by-route incidence matrix.  Row i is edge i of `edge_indexing()`, and column j is the
/// route `routes()[j]`.
#[derive(Debug, Clone)]
pub struct RoutingMatrix {
    matrix: Array2<f64>,
    edge_indexing: EdgeIndexing,
    routes: Vec<(GeoPoint, GeoPoint)>,
}

impl RoutingMatrix {
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn edge_indexing(&self) -> &EdgeIndexing {
        &self.edge_indexing
    }

    pub fn routes(&self) -> &[(GeoPoint, GeoPoint)] {
        &self.routes
    }

    pub fn num_edges(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_routes(&self) -> usize {
        self.matrix.ncols()
    }
}


pub fn build_routing_matrix(paths: &PathSet, network: &RoadNetwork) -> Result<RoutingMatrix> {
    let edge_indexing = EdgeIndexing::new(network);
    let routes = paths.route_keys();

    // Our routing matrix has #edge rows and #routes columns
    let mut matrix = Array2::zeros((edge_indexing.len(), routes.len()));
    for (r_idx, ((origin, destination), path)) in paths.iter().enumerate() {
        for (from, to) in path_to_edges(path) {
            let e_idx = match edge_indexing.position(&from, &to) {
                Some(e_idx) => e_idx,
                None => return Err(Error::InternalConsistency {
                    origin: *origin,
                    destination: *destination,
                    from,
                    to,
                }),
            };
            matrix[[e_idx, r_idx]] = 1.;
        }
    }
    log::debug!("routing matrix has {} edges and {} routes", matrix.nrows(), matrix.ncols());

    Ok(RoutingMatrix{matrix, edge_indexing, routes})
}
