// The seam between the analysis and whatever draws it.  Projection into planar coordinates is
// supplied by the caller; path search never projects.
use super::geometry::{GeoPoint, LineSegment};
use super::network::{RoadEdge, RoadNetwork};
use super::threshold::RouteGraph;


static EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Maps longitude/latitude points into a planar coordinate system.
pub trait Projection {
    fn project(&self, point: &GeoPoint) -> GeoPoint;
}

pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, point: &GeoPoint) -> GeoPoint {
        *point
    }
}

/// Metres east and north of a reference point, treating the earth as flat near that point.
pub struct EquirectangularProjection {
    reference: GeoPoint,
    cos_ref_lat: f64,
}

impl EquirectangularProjection {
    pub fn new(reference: GeoPoint) -> EquirectangularProjection {
        let cos_ref_lat = reference.latitude.to_radians().cos();
        EquirectangularProjection{reference, cos_ref_lat}
    }
}

impl Projection for EquirectangularProjection {
    fn project(&self, point: &GeoPoint) -> GeoPoint {
        let dlon = (point.longitude - self.reference.longitude).to_radians();
        let dlat = (point.latitude - self.reference.latitude).to_radians();
        GeoPoint::new(EARTH_RADIUS_M * dlon * self.cos_ref_lat, EARTH_RADIUS_M * dlat)
    }
}

/// Returns a copy of the network where each edge has its projected line as its geometry, and the
/// line's length as its cost.
pub fn assign_geometry<PP: Projection>(network: &RoadNetwork, projection: &PP) -> RoadNetwork {
    network.map_edges(|from, to, edge| {
        let line = LineSegment::new(projection.project(from), projection.project(to));
        RoadEdge {
            time_cost: line.length(),
            geometry: Some(line),
            ..edge.clone()
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderEdge {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub flow: f64,
    pub label: String,
}

/// The routes to draw: those with more than `min_flow`, sorted by their endpoints.
pub fn route_edges_for_display(route_graph: &RouteGraph, min_flow: f64) -> Vec<RenderEdge> {
    let mut edges: Vec<RenderEdge> = route_graph.all_edges()
        .filter(|(_, _, rf)| rf.flow > min_flow)
        .map(|(from, to, rf)| RenderEdge{from, to, flow: rf.flow, label: rf.label.clone()})
        .collect();
    edges.sort_by(|aa, bb| (aa.from, aa.to).cmp(&(bb.from, bb.to)));
    edges
}
