use std::path::{Path, PathBuf};
use std::time::Duration;

use ndarray::prelude::*;
use yaml_rust::Yaml;
use yaml_rust::YamlLoader;

use super::config_utils;
use super::datex;
use super::error::{Error, Result};
use super::estimation::Solver;
use super::geometry::GeoPoint;
use super::location::{localise, observations_from_csv, parse_locations, MeasurementKind,
                      Observation, ParseErrorPolicy, RawLocation, Location};
use super::network::{build_graph, RoadNetwork};
use super::paths::{compute_all_pairs_paths, PathSet, HEURISTIC_SPEED};
use super::routing_matrix::{build_routing_matrix, RoutingMatrix};
use super::threshold::{extract_above_threshold, RouteGraph};
use super::RoutingConfig;


#[derive(Debug, Clone, PartialEq)]
pub struct RegionOfInterest {
    pub centre: GeoPoint,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub assumed_speed: f64,
    pub heuristic_speed: f64,
    /// The flow assumed on edges with no reading when estimating route flows.
    pub missing_flow: f64,
    pub include_flow: bool,
    pub prune_low_degree: bool,
    pub deadline_s: Option<f64>,
    pub min_flow: f64,
    pub solver: Solver,
    pub parse_errors: ParseErrorPolicy,
    pub measurement: MeasurementKind,
    pub roi: Option<RegionOfInterest>,
}

impl Default for AnalysisConfig {
    fn default() -> AnalysisConfig {
        AnalysisConfig {
            assumed_speed: HEURISTIC_SPEED,
            heuristic_speed: HEURISTIC_SPEED,
            missing_flow: 0.,
            include_flow: true,
            prune_low_degree: false,
            deadline_s: None,
            min_flow: 1.,
            solver: Solver::Sparse{sparsity: 10},
            parse_errors: ParseErrorPolicy::Skip,
            measurement: MeasurementKind::Flow,
            roi: None,
        }
    }
}

fn yaml_f64(yaml_cfg: &Yaml, key: &str, default: f64) -> Result<f64> {
    let value = &yaml_cfg[key];
    if value.is_badvalue() {
        return Ok(default);
    }
    match (value.as_f64(), value.as_i64()) {
        (Some(val), _) => Ok(val),
        (None, Some(val)) => Ok(val as f64),
        _ => Err(Error::Config(format!("{} must be a number", key))),
    }
}

fn yaml_bool(yaml_cfg: &Yaml, key: &str, default: bool) -> Result<bool> {
    let value = &yaml_cfg[key];
    if value.is_badvalue() {
        return Ok(default);
    }
    value.as_bool().ok_or_else(|| Error::Config(format!("{} must be true or false", key)))
}

fn yaml_str<'a>(yaml_cfg: &'a Yaml, key: &str) -> Result<Option<&'a str>> {
    let value = &yaml_cfg[key];
    if value.is_badvalue() {
        return Ok(None);
    }
    match value.as_str() {
        Some(val) => Ok(Some(val)),
        None => Err(Error::Config(format!("{} must be a string", key))),
    }
}

impl AnalysisConfig {
    /// Reads the config from a yaml mapping.  Any key that's left out takes its default value.
    pub fn from_yaml(yaml_cfg: &Yaml) -> Result<AnalysisConfig> {
        let default = AnalysisConfig::default();

        let solver = match yaml_str(yaml_cfg, "solver")? {
            None | Some("sparse") => {
                let sparsity = yaml_f64(yaml_cfg, "sparsity", 10.)?;
                if sparsity < 0. {
                    return Err(Error::Config(String::from("sparsity can't be negative")));
                }
                if sparsity.fract() != 0. || !sparsity.is_finite() {
                    return Err(Error::Config(format!("sparsity must be a whole number, not {}",
                                                     sparsity)));
                }
                Solver::Sparse{sparsity: sparsity as usize}
            }
            Some("dense") => Solver::Dense,
            Some(other) => return Err(Error::Config(format!("unknown solver {}", other))),
        };
        let parse_errors = match yaml_str(yaml_cfg, "parse_errors")? {
            None => default.parse_errors,
            Some(name) => ParseErrorPolicy::from_name(name).ok_or_else(
                || Error::Config(format!("unknown parse error policy {}", name)))?,
        };
        let measurement = match yaml_str(yaml_cfg, "measurement")? {
            None => default.measurement,
            Some(name) => MeasurementKind::from_name(name).ok_or_else(
                || Error::Config(format!("unknown measurement {}", name)))?,
        };
        let deadline_s = match yaml_cfg["deadline_s"].is_badvalue() {
            true => None,
            false => Some(yaml_f64(yaml_cfg, "deadline_s", 0.)?),
        };
        let roi_cfg = &yaml_cfg["dataset"]["roi"];
        let roi = match roi_cfg.is_badvalue() {
            true => None,
            false => Some(RegionOfInterest {
                centre: GeoPoint::new(yaml_f64(roi_cfg, "longitude", 0.)?,
                                      yaml_f64(roi_cfg, "latitude", 0.)?),
                radius: yaml_f64(roi_cfg, "radius", 0.)?,
            }),
        };

        return Ok(AnalysisConfig {
            assumed_speed: yaml_f64(yaml_cfg, "assumed_speed", default.assumed_speed)?,
            heuristic_speed: yaml_f64(yaml_cfg, "heuristic_speed", default.heuristic_speed)?,
            missing_flow: yaml_f64(yaml_cfg, "missing_flow", default.missing_flow)?,
            include_flow: yaml_bool(yaml_cfg, "include_flow", default.include_flow)?,
            prune_low_degree: yaml_bool(yaml_cfg, "prune_low_degree",
                                        default.prune_low_degree)?,
            deadline_s,
            min_flow: yaml_f64(yaml_cfg, "min_flow", default.min_flow)?,
            solver,
            parse_errors,
            measurement,
            roi,
        });
    }
}

impl RoutingConfig for AnalysisConfig {
    fn get_assumed_speed(&self) -> f64 {
        return self.assumed_speed;
    }

    fn get_heuristic_speed(&self) -> f64 {
        return self.heuristic_speed;
    }

    fn get_prune_low_degree(&self) -> bool {
        return self.prune_low_degree;
    }

    fn get_deadline(&self) -> Option<Duration> {
        // a limit too large to represent is no limit at all
        return self.deadline_s.and_then(|secs| Duration::try_from_secs_f64(secs.max(0.)).ok());
    }
}

fn load_yaml(config_path: &Path) -> Result<Yaml> {
    let file_contents = std::fs::read_to_string(config_path)?;
    let mut docs = YamlLoader::load_from_str(&file_contents)
        .map_err(|err| Error::Config(format!("failed to parse config as yaml: {}", err)))?;
    if docs.is_empty() {
        return Err(Error::Config(String::from("config file is empty")));
    }
    Ok(docs.swap_remove(0))
}


pub struct AnalysisResult {
    pub network: RoadNetwork,
    pub paths: PathSet,
    pub routing: RoutingMatrix,
    /// Observed flow on each edge, aligned with the routing matrix's rows.
    pub edge_flows: Array1<f64>,
    /// Estimated flow on each route, aligned with the routing matrix's columns.
    pub route_flows: Array1<f64>,
    pub route_graph: RouteGraph,
}

/// One snapshot of the feed, ready to be analysed.
pub struct FlowAnalysis {
    cfg: AnalysisConfig,
    locations: Vec<Location>,
    observations: Vec<Observation>,
}

impl FlowAnalysis {
    pub fn new(cfg: AnalysisConfig, raw_locations: &[RawLocation],
               observations: Vec<Observation>) -> Result<FlowAnalysis> {
        let mut locations = parse_locations(raw_locations, cfg.parse_errors)?;
        if let Some(roi) = &cfg.roi {
            let num_before = locations.len();
            locations = localise(&locations, &roi.centre, roi.radius);
            log::info!("{} of {} locations are within {} of {}", locations.len(), num_before,
                       roi.radius, roi.centre);
        }
        Ok(FlowAnalysis{cfg, locations, observations})
    }

    /// Sets up an analysis from a yaml config whose "dataset" section names the location and
    /// traffic data files.  Relative paths are taken from the config file's directory.
    pub fn from_cfg(config_path: &Path) -> Result<FlowAnalysis> {
        let yaml_cfg = load_yaml(config_path)?;
        let cfg = AnalysisConfig::from_yaml(&yaml_cfg)?;

        let dataset_cfg = &yaml_cfg["dataset"];
        if dataset_cfg.is_badvalue() {
            return Err(Error::Config(String::from("no dataset given in config")));
        }
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let locations_path = dataset_path(dataset_cfg, "locations_path", dir)?;
        let traffic_path = dataset_path(dataset_cfg, "traffic_path", dir)?;

        let raw_locations = datex::read_locations(&locations_path)?;
        let observations = match traffic_path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => observations_from_csv(&traffic_path)?,
            _ => datex::read_observations(&traffic_path, cfg.measurement)?,
        };
        FlowAnalysis::new(cfg, &raw_locations, observations)
    }

    pub fn get_cfg(&self) -> &AnalysisConfig {
        &self.cfg
    }

    pub fn get_locations(&self) -> &Vec<Location> {
        &self.locations
    }

    pub fn run(&self) -> Result<AnalysisResult> {
        log::debug!("build network");
        let network = build_graph(&self.locations, &self.observations, self.cfg.include_flow,
                                  self.cfg.assumed_speed);

        log::debug!("compute paths");
        let paths = compute_all_pairs_paths(&network, &self.cfg);

        log::debug!("build routing matrix");
        let routing = build_routing_matrix(&paths, &network)?;
        let edge_flows = routing.edge_indexing().flow_vector(&network, self.cfg.missing_flow);

        log::debug!("estimate route flows");
        let route_flows = self.cfg.solver.estimate(&edge_flows, routing.matrix())?;

        log::debug!("extract notable routes");
        let route_graph = extract_above_threshold(routing.routes(), &route_flows,
                                                  self.cfg.min_flow)?;

        Ok(AnalysisResult {
            network,
            paths,
            routing,
            edge_flows,
            route_flows,
            route_graph,
        })
    }
}

fn dataset_path(dataset_cfg: &Yaml, key: &str, dir: &Path) -> Result<PathBuf> {
    match yaml_str(dataset_cfg, key)? {
        Some(path) => Ok(config_utils::str_to_absolute_path(path, dir)),
        None => Err(Error::Config(format!("dataset has no {}", key))),
    }
}
