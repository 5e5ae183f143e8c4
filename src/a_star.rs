use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::{BinaryHeap, HashMap};
use std::cmp::Ordering;

use petgraph::algo::Measure;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::graph::EdgeReference;
use petgraph::visit::{EdgeRef, VisitMap, Visitable};


/// A* search from `start` to `goal`.  Based on the dijkstra implementation in the petgraph
/// library, with the heap ordered by cost so far plus `estimate_cost` of the remaining distance.
///
/// `edge_cost` must be non-negative, and `estimate_cost` should never overestimate the true
/// remaining cost, or the path found may not be the shortest.
///
/// Returns the cost of the path found along with its nodes (start and goal included), or `None`
/// if `goal` can't be reached from `start`.
pub fn astar_path<N, E, F, H, K>(
    graph: &DiGraph<N, E>,
    start: NodeIndex,
    goal: NodeIndex,
    mut edge_cost: F,
    mut estimate_cost: H,
) -> Option<(K, Vec<NodeIndex>)>
where
    F: FnMut(EdgeReference<E>) -> K,
    H: FnMut(NodeIndex) -> K,
    K: Measure + Copy,
{
    let mut visited = graph.visit_map();
    let mut scores = HashMap::new();
    let mut came_from = HashMap::new();
    let zero_score = K::default();
    scores.insert(start, zero_score);

    let mut visit_next = BinaryHeap::new();
    visit_next.push(Frontier{estimate: estimate_cost(start), node: start});
    while let Some(Frontier{node, ..}) = visit_next.pop() {
        if node == goal {
            let path = reconstruct_path(&came_from, goal);
            return Some((scores[&goal], path));
        }
        if visited.is_visited(&node) {
            continue;
        }
        let node_score = scores[&node];
        for edge in graph.edges(node) {
            let next = edge.target();
            if visited.is_visited(&next) {
                continue;
            }
            let next_score = node_score + edge_cost(edge);
            match scores.entry(next) {
                Occupied(ent) => {
                    if next_score < *ent.get() {
                        *ent.into_mut() = next_score;
                    } else {
                        continue;
                    }
                }
                Vacant(ent) => {
                    ent.insert(next_score);
                }
            }
            came_from.insert(next, node);
            visit_next.push(Frontier{estimate: next_score + estimate_cost(next), node: next});
        }
        visited.visit(node);
    }
    None
}

fn reconstruct_path(came_from: &HashMap<NodeIndex, NodeIndex>, goal: NodeIndex) -> Vec<NodeIndex> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = came_from.get(&current) {
        path.push(*prev);
        current = *prev;
    }
    path.reverse();
    path
}


/// An entry in the search frontier.  The heap pops the lowest estimate first, and among equal
/// estimates the lowest node index, so the path found doesn't depend on edge insertion order.
#[derive(Copy, Clone, Debug)]
struct Frontier<K> {
    estimate: K,
    node: NodeIndex,
}

impl<K: PartialOrd> Frontier<K> {
    fn is_nan(&self) -> bool {
        self.estimate.ne(&self.estimate)
    }
}

impl<K: PartialOrd> PartialEq for Frontier<K> {
    fn eq(&self, other: &Frontier<K>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd> Eq for Frontier<K> {}

impl<K: PartialOrd> PartialOrd for Frontier<K> {
    fn partial_cmp(&self, other: &Frontier<K>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: PartialOrd> Ord for Frontier<K> {
    fn cmp(&self, other: &Frontier<K>) -> Ordering {
        let by_estimate = match other.estimate.partial_cmp(&self.estimate) {
            Some(ord) => ord,
            // NaN goes to the back of the queue
            None => match (self.is_nan(), other.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                _ => Ordering::Greater,
            },
        };
        by_estimate.then_with(|| other.node.cmp(&self.node))
    }
}
