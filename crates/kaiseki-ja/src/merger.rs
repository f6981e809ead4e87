// Combine independently ranked partial results into one ranking.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hashbrown::HashSet;
use serde::Serialize;

/// One path and its total cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredPath<T> {
    pub tokens: Vec<T>,
    pub cost: i64,
}

/// Paths ordered by ascending cost. Equal costs keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiSearchResult<T> {
    paths: Vec<ScoredPath<T>>,
}

impl<T> MultiSearchResult<T> {
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    pub fn from_paths(mut paths: Vec<ScoredPath<T>>) -> Self {
        paths.sort_by_key(|p| p.cost);
        Self { paths }
    }

    /// Insert after every path costing the same or less.
    pub fn push(&mut self, tokens: Vec<T>, cost: i64) {
        let at = self.paths.partition_point(|p| p.cost <= cost);
        self.paths.insert(at, ScoredPath { tokens, cost });
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[ScoredPath<T>] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<ScoredPath<T>> {
        self.paths
    }

    pub fn best_cost(&self) -> Option<i64> {
        self.paths.first().map(|p| p.cost)
    }
}

impl<T> Default for MultiSearchResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenates partial results left to right, keeping the `max_count`
/// cheapest combinations whose cost stays within `cost_slack` of the
/// cheapest possible combination.
///
/// Ties are broken by the position of the contributing partials in their
/// inputs, earlier operands first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiSearchMerger {
    max_count: usize,
    cost_slack: i64,
}

impl MultiSearchMerger {
    pub fn new(max_count: usize, cost_slack: i64) -> Self {
        Self {
            max_count,
            cost_slack,
        }
    }

    pub fn merge<T: Clone>(&self, results: &[MultiSearchResult<T>]) -> MultiSearchResult<T> {
        if self.max_count == 0 || results.is_empty() || results.iter().any(|r| r.is_empty()) {
            return MultiSearchResult::new();
        }

        // suffix[k] = cheapest total of results[k..]
        let mut suffix = vec![0i64; results.len() + 1];
        for k in (0..results.len()).rev() {
            suffix[k] = suffix[k + 1] + results[k].paths[0].cost;
        }
        let upper = suffix[0].saturating_add(self.cost_slack);

        let mut builders: Vec<ScoredPath<T>> = results[0]
            .paths
            .iter()
            .take_while(|p| p.cost + suffix[1] <= upper)
            .take(self.max_count)
            .cloned()
            .collect();

        for (k, next) in results.iter().enumerate().skip(1) {
            builders = self.merge_pair(&builders, &next.paths, suffix[k + 1], upper);
        }
        MultiSearchResult { paths: builders }
    }

    /// Best-first walk over the (builder, next) cost grid. Both sides are
    /// sorted, so the frontier only grows right and down from popped cells.
    fn merge_pair<T: Clone>(
        &self,
        builders: &[ScoredPath<T>],
        next: &[ScoredPath<T>],
        remaining: i64,
        upper: i64,
    ) -> Vec<ScoredPath<T>> {
        let mut merged = Vec::new();
        if builders.is_empty() {
            return merged;
        }
        let mut heap = BinaryHeap::new();
        let mut visited = HashSet::new();
        heap.push(Reverse((builders[0].cost + next[0].cost, 0usize, 0usize)));
        visited.insert((0usize, 0usize));

        while let Some(Reverse((cost, i, j))) = heap.pop() {
            if cost + remaining > upper {
                break;
            }
            let mut tokens = Vec::with_capacity(builders[i].tokens.len() + next[j].tokens.len());
            tokens.extend_from_slice(&builders[i].tokens);
            tokens.extend_from_slice(&next[j].tokens);
            merged.push(ScoredPath { tokens, cost });
            if merged.len() == self.max_count {
                break;
            }
            for (a, b) in [(i + 1, j), (i, j + 1)] {
                if a < builders.len() && b < next.len() && visited.insert((a, b)) {
                    heap.push(Reverse((builders[a].cost + next[b].cost, a, b)));
                }
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(costs: &[i64], label: char) -> MultiSearchResult<String> {
        let mut r = MultiSearchResult::new();
        for (i, &c) in costs.iter().enumerate() {
            r.push(vec![format!("{label}{i}")], c);
        }
        r
    }

    fn costs(r: &MultiSearchResult<String>) -> Vec<i64> {
        r.paths().iter().map(|p| p.cost).collect()
    }

    #[test]
    fn reference_merge() {
        let merged = MultiSearchMerger::new(3, 8).merge(&[result(&[1, 2, 3], 'a'), result(&[1, 2], 'b')]);
        assert_eq!(costs(&merged), vec![2, 3, 3]);
        assert_eq!(merged.paths()[0].tokens, ["a0", "b0"]);
        // tie at 3: the earlier first operand wins
        assert_eq!(merged.paths()[1].tokens, ["a0", "b1"]);
        assert_eq!(merged.paths()[2].tokens, ["a1", "b0"]);
    }

    #[test]
    fn slack_prunes() {
        let merged = MultiSearchMerger::new(10, 1).merge(&[result(&[1, 2, 3], 'a'), result(&[1, 2], 'b')]);
        assert_eq!(costs(&merged), vec![2, 3, 3]);
        let merged = MultiSearchMerger::new(10, 0).merge(&[result(&[1, 2, 3], 'a'), result(&[1, 2], 'b')]);
        assert_eq!(costs(&merged), vec![2]);
    }

    #[test]
    fn three_way_merge_is_sorted() {
        let inputs = [result(&[0, 5], 'a'), result(&[1, 2, 4], 'b'), result(&[3, 3], 'c')];
        let merged = MultiSearchMerger::new(usize::MAX, i64::MAX).merge(&inputs);
        assert_eq!(merged.len(), 12);
        let c = costs(&merged);
        assert!(c.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(c[0], 4);
        assert_eq!(merged.paths()[0].tokens, ["a0", "b0", "c0"]);
    }

    #[test]
    fn single_input_is_truncated() {
        let merged = MultiSearchMerger::new(2, 100).merge(&[result(&[5, 1, 3], 'a')]);
        assert_eq!(costs(&merged), vec![1, 3]);
    }

    #[test]
    fn empty_operand_yields_nothing() {
        let merged = MultiSearchMerger::new(3, 8).merge(&[result(&[1], 'a'), MultiSearchResult::new()]);
        assert!(merged.is_empty());
        assert!(MultiSearchMerger::new(3, 8).merge::<String>(&[]).is_empty());
    }

    #[test]
    fn push_keeps_insertion_order_for_ties() {
        let r = result(&[2, 1, 2], 'a');
        let tokens: Vec<&str> = r.paths().iter().map(|p| p.tokens[0].as_str()).collect();
        assert_eq!(tokens, ["a1", "a0", "a2"]);
        assert_eq!(r.best_cost(), Some(1));
    }
}
