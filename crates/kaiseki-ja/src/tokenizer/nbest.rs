// N-best paths within a cost slack.
//
// The lattice is cut at bottleneck nodes: a node that is the only one ending
// at its end position while no node spans across it. Every full path passes
// through every bottleneck, so the stretches between consecutive bottlenecks
// can be ranked independently and the rankings merged afterwards.
//
// Each stretch is ranked by an A* search running backward from its last node.
// The forward Viterbi cost of a node is the exact cost of reaching it, which
// makes it a consistent heuristic: paths come out of the queue cheapest first.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::trace;

use super::lattice::{BOS, Lattice, UNREACHABLE};
use crate::connection::ConnectionCosts;
use crate::merger::{MultiSearchMerger, MultiSearchResult};
use crate::node::NodeType;

/// Up to `max_count` full paths costing at most best + `cost_slack`, as node
/// ids without BOS and EOS, cheapest first.
///
/// `lattice` must have had its forward pass run.
pub(crate) fn search(
    lattice: &Lattice,
    costs: &ConnectionCosts,
    max_count: usize,
    cost_slack: i64,
) -> MultiSearchResult<u32> {
    if max_count == 0 || lattice.best_cost().is_none() {
        return MultiSearchResult::new();
    }

    let cuts = bottlenecks(lattice);
    let mut stops = Vec::with_capacity(cuts.len() + 1);
    stops.push(BOS);
    stops.extend_from_slice(&cuts);
    let mut targets = cuts;
    targets.push(lattice.eos());
    trace!("n-best search over {} independent segments", targets.len());

    let segments: Vec<MultiSearchResult<u32>> = stops
        .iter()
        .zip(&targets)
        .map(|(&stop, &target)| segment_paths(lattice, costs, stop, target, max_count, cost_slack))
        .collect();
    MultiSearchMerger::new(max_count, cost_slack).merge(&segments)
}

/// Reachable nodes every full path goes through, in position order.
fn bottlenecks(lattice: &Lattice) -> Vec<u32> {
    let len = lattice.len();
    let reachable = |id: u32| lattice.cost(id) != UNREACHABLE;

    // spanning[q] counts nodes with start < q < end once prefix-summed
    let mut spanning = vec![0i32; len + 1];
    for (id, node) in lattice.nodes().iter().enumerate() {
        if node.is_boundary() || node.length < 2 || !reachable(id as u32) {
            continue;
        }
        spanning[node.start + 1] += 1;
        spanning[node.end()] -= 1;
    }

    let mut cuts = Vec::new();
    let mut open = 0;
    for (q, delta) in spanning.iter().enumerate().take(len).skip(1) {
        open += delta;
        if open != 0 {
            continue;
        }
        let mut ending = lattice.ending_at(q).iter().copied().filter(|&id| reachable(id));
        if let (Some(id), None) = (ending.next(), ending.next()) {
            cuts.push(id);
        }
    }
    cuts
}

/// A partial path, linked toward the segment's target.
#[derive(Debug, Clone, Copy)]
struct Step {
    node: u32,
    next: Option<usize>,
}

/// Paths from just after `stop` up to `target`, cheapest first. A path's
/// cost covers its nodes and every connection from `stop` on.
fn segment_paths(
    lattice: &Lattice,
    costs: &ConnectionCosts,
    stop: u32,
    target: u32,
    max_count: usize,
    cost_slack: i64,
) -> MultiSearchResult<u32> {
    let mut result = MultiSearchResult::new();
    let mut steps = vec![Step {
        node: target,
        next: None,
    }];
    // (priority, insertion order, cost from the node to target, step)
    let mut queue = BinaryHeap::new();
    queue.push(Reverse((lattice.cost(target), 0usize, 0i64, 0usize)));
    let mut order = 1usize;
    let mut limit = None;

    while let Some(Reverse((priority, _, cost, step))) = queue.pop() {
        if limit.is_some_and(|limit| priority > limit) {
            break;
        }
        let id = steps[step].node;
        if id == stop {
            if limit.is_none() {
                limit = Some(priority.saturating_add(cost_slack));
            }
            result.push(collect(lattice, &steps, step), cost);
            if result.len() == max_count {
                break;
            }
            continue;
        }

        let node = lattice.node(id);
        let cost = cost + lattice.weight(id);
        for &left in lattice.ending_at(node.start) {
            let left_cost = lattice.cost(left);
            if left_cost == UNREACHABLE {
                continue;
            }
            let cost = cost + costs.cost(lattice.node(left).right_id, node.left_id);
            steps.push(Step {
                node: left,
                next: Some(step),
            });
            queue.push(Reverse((left_cost + cost, order, cost, steps.len() - 1)));
            order += 1;
        }
    }
    result
}

fn collect(lattice: &Lattice, steps: &[Step], from: usize) -> Vec<u32> {
    let mut path = Vec::new();
    let mut next = steps[from].next;
    while let Some(step) = next {
        let id = steps[step].node;
        if lattice.node(id).node_type != NodeType::Eos {
            path.push(id);
        }
        next = steps[step].next;
    }
    path
}
