use rand::Rng;

use super::geometry::GeoPoint;
use super::location::{Location, Observation};
use super::network::{build_graph, RoadNetwork};


/// Builds locations on a grid of unit-spaced points, with a one-way segment in each direction
/// between neighbouring points.  Each segment is kept with probability `keep_prob`, and kept
/// segments get a random flow.
pub fn random_grid_locations<RR: Rng>(num_x_nodes: usize, num_y_nodes: usize, keep_prob: f64,
                                      rng: &mut RR) -> (Vec<Location>, Vec<Observation>) {
    let mut locations = vec![];
    let mut observations = vec![];
    for ii in 0..num_x_nodes {
        for jj in 0..num_y_nodes {
            let here = GeoPoint::new(ii as f64, jj as f64);
            let mut neighbours = vec![];
            if ii + 1 < num_x_nodes {
                neighbours.push(GeoPoint::new((ii + 1) as f64, jj as f64));
            }
            if jj + 1 < num_y_nodes {
                neighbours.push(GeoPoint::new(ii as f64, (jj + 1) as f64));
            }
            for there in neighbours {
                for (from, to) in &[(here, there), (there, here)] {
                    if ! rng.gen_bool(keep_prob) {
                        continue;
                    }
                    let id = format!("{}-{}", locations.len(), from);
                    observations.push(Observation::new(&id, Some(rng.gen_range(0.0..100.0))));
                    locations.push(Location::new(&id, *from, *to));
                }
            }
        }
    }
    (locations, observations)
}

/// A random grid network whose edge costs equal their lengths.
pub fn random_grid_network<RR: Rng>(num_x_nodes: usize, num_y_nodes: usize, keep_prob: f64,
                                    rng: &mut RR) -> RoadNetwork {
    let (locations, observations) = random_grid_locations(num_x_nodes, num_y_nodes, keep_prob,
                                                          rng);
    build_graph(&locations, &observations, true, 1.)
}

/// The three-node network (0,0) -> (1,0) -> (1,1), with a flow of 10 on both segments.
pub fn corner_network() -> RoadNetwork {
    let locations = vec![
        Location::new("south", GeoPoint::new(0., 0.), GeoPoint::new(1., 0.)),
        Location::new("east", GeoPoint::new(1., 0.), GeoPoint::new(1., 1.)),
    ];
    let observations = vec![
        Observation::new("south", Some(10.)),
        Observation::new("east", Some(10.)),
    ];
    build_graph(&locations, &observations, true, 70.)
}
