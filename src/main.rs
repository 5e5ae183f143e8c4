use std::path::Path;

use road_flow_inference::{route_edges_for_display, FlowAnalysis};
use env_logger;


fn main () {
    env_logger::init();
    let config_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: road_flow_inference <config.yaml>");
            std::process::exit(2);
        }
    };

    let result = FlowAnalysis::from_cfg(Path::new(&config_path))
        .and_then(|analysis| {
            let min_flow = analysis.get_cfg().min_flow;
            analysis.run().map(|result| (result, min_flow))
        });
    let (result, min_flow) = match result {
        Ok(val) => val,
        Err(err) => {
            log::error!("Analysis failed: {}", err);
            std::process::exit(1);
        }
    };

    let stats = result.paths.stats();
    println!("network: {} nodes, {} edges", result.network.node_count(),
             result.network.edge_count());
    println!("paths: {} of {} expected", stats.found, stats.expected);
    for edge in route_edges_for_display(&result.route_graph, min_flow) {
        println!("{} -> {}: {}", edge.from, edge.to, edge.label);
    }
}
