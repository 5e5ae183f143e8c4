use ndarray::prelude::*;
use petgraph::graphmap::DiGraphMap;

use super::error::{Error, Result};
use super::geometry::GeoPoint;


#[derive(Debug, Clone, PartialEq)]
pub struct RouteFlow {
    pub flow: f64,
    pub label: String,
}

impl RouteFlow {
    pub fn new(flow: f64) -> RouteFlow {
        RouteFlow{flow, label: format!("{:.1}", flow)}
    }
}

/// Routes with notable flow, as direct origin -> destination edges.
pub type RouteGraph = DiGraphMap<GeoPoint, RouteFlow>;


/// Builds a graph with an edge from origin to destination for every route whose estimated flow
/// is at least `min_flow`.  `routes` and `route_flows` are aligned by position, as with the
/// columns of a `RoutingMatrix`.
pub fn extract_above_threshold(routes: &[(GeoPoint, GeoPoint)], route_flows: &Array1<f64>,
                               min_flow: f64) -> Result<RouteGraph> {
    if routes.len() != route_flows.len() {
        return Err(Error::ShapeMismatch {
            expected: routes.len(),
            found: route_flows.len(),
        });
    }

    let mut route_graph = DiGraphMap::new();
    for ((origin, destination), flow) in routes.iter().zip(route_flows.iter()) {
        if *flow < min_flow {
            continue;
        }
        route_graph.add_edge(*origin, *destination, RouteFlow::new(*flow));
    }
    log::debug!("{} of {} routes have a flow of at least {}", route_graph.edge_count(),
                routes.len(), min_flow);
    Ok(route_graph)
}
