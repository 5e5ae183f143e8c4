// standard library imports
use std::time::Duration;

// imports of other modules from this crate
mod error;
pub use error::{Error, Result};

mod geometry;
pub use geometry::{GeoPoint, LineSegment};

mod config_utils;

mod location;
pub use location::{extract_endpoints, extract_identifier, extract_location, localise,
                   lookup_observation, observations_from_csv, parse_locations, Location,
                   Measurement, MeasurementKind, Observation, ObservationIndex,
                   ParseErrorPolicy, RawLocation};

mod datex;
pub use datex::{parse_locations_xml, parse_observations_xml, read_locations, read_observations};

mod network;
pub use network::{build_graph, RoadEdge, RoadNetwork};

mod a_star;
pub use a_star::astar_path;

mod paths;
pub use paths::{adjacency_precheck, compute_all_pairs_paths, edge_cost, heuristic,
                path_to_edges, Path, PathSet, PathStats, HEURISTIC_SPEED};

mod routing_matrix;
pub use routing_matrix::{build_routing_matrix, EdgeIndexing, RoutingMatrix};

mod linalg;

mod estimation;
pub use estimation::{estimate_dense, estimate_sparse, Solver};

mod threshold;
pub use threshold::{extract_above_threshold, RouteFlow, RouteGraph};

mod render;
pub use render::{assign_geometry, route_edges_for_display, EquirectangularProjection,
                 IdentityProjection, Projection, RenderEdge};

mod analysis;
pub use analysis::{AnalysisConfig, AnalysisResult, FlowAnalysis, RegionOfInterest};

#[cfg(test)]
mod test_utils;


/// Defines the settings the path search needs, whatever config they come from.
pub trait RoutingConfig {
    fn get_assumed_speed(&self) -> f64;
    fn get_heuristic_speed(&self) -> f64;
    fn get_prune_low_degree(&self) -> bool;
    fn get_deadline(&self) -> Option<Duration>;

    fn edge_time(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        return edge_cost(from, to, self.get_assumed_speed());
    }

    fn estimated_time(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        return edge_cost(from, to, self.get_heuristic_speed());
    }
}
