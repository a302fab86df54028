//! Collection route optimization over a complete graph of flagged bins.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::distance_km;
use crate::model::{Bin, Route};

/// Smallest saving (in km) that counts as an improvement during local search.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Default cap on full 2-opt sweeps.
pub const DEFAULT_TWO_OPT_PASSES: usize = 64;

/// Symmetric edge weights of the complete graph over a set of bins.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    size: usize,
    weights: Vec<f64>,
}

impl DistanceMatrix {
    /// Build the matrix, evaluating each unordered pair once.
    #[must_use]
    pub fn from_bins(bins: &[Bin]) -> Self {
        let size = bins.len();
        let mut weights = vec![0.0; size * size];

        for (row, from) in bins.iter().enumerate() {
            for (offset, to) in bins.iter().skip(row + 1).enumerate() {
                let col = row + 1 + offset;
                let km = distance_km(from.coordinate, to.coordinate);
                if let Some(slot) = weights.get_mut(row * size + col) {
                    *slot = km;
                }
                if let Some(slot) = weights.get_mut(col * size + row) {
                    *slot = km;
                }
            }
        }

        Self { size, weights }
    }

    /// Build a matrix from explicit row-major weights.
    ///
    /// Returns `None` unless `weights` holds exactly `size * size` entries.
    #[must_use]
    pub fn from_weights(size: usize, weights: Vec<f64>) -> Option<Self> {
        (weights.len() == size * size).then_some(Self { size, weights })
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Edge weight between two nodes; out-of-range nodes are infinitely far.
    #[must_use]
    pub fn weight(&self, from: usize, to: usize) -> f64 {
        if from >= self.size || to >= self.size {
            return f64::INFINITY;
        }
        self.weights
            .get(from * self.size + to)
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    /// Length of the open path visiting `order` front to back.
    #[must_use]
    pub fn path_length(&self, order: &[usize]) -> f64 {
        order
            .windows(2)
            .map(|pair| match pair {
                [from, to] => self.weight(*from, *to),
                _ => 0.0,
            })
            .sum()
    }
}

/// Strategy producing a visiting order over a complete graph.
///
/// Implementations must return a permutation of `0..matrix.len()` and must be
/// deterministic for identical matrices.
pub trait RouteSolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Compute a visiting order over all nodes.
    fn solve(&self, matrix: &DistanceMatrix) -> Vec<usize>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Greedy tour: start at node 0 and always move to the nearest unvisited node.
///
/// Ties go to the lowest node index.
pub struct NearestNeighbor;

impl RouteSolver for NearestNeighbor {
    fn name(&self) -> &'static str {
        "nearest-neighbor"
    }

    fn solve(&self, matrix: &DistanceMatrix) -> Vec<usize> {
        let size = matrix.len();
        if size == 0 {
            return Vec::new();
        }

        let mut visited = vec![false; size];
        let mut order = Vec::with_capacity(size);
        let mut current = 0;
        if let Some(flag) = visited.get_mut(current) {
            *flag = true;
        }
        order.push(current);

        while order.len() < size {
            let mut best: Option<(usize, f64)> = None;
            for (candidate, seen) in visited.iter().enumerate() {
                if *seen {
                    continue;
                }
                let km = matrix.weight(current, candidate);
                // strict comparison keeps the lowest index on ties
                if best.is_none_or(|(_, best_km)| km < best_km) {
                    best = Some((candidate, km));
                }
            }

            let Some((next, _)) = best else {
                break;
            };
            if let Some(flag) = visited.get_mut(next) {
                *flag = true;
            }
            order.push(next);
            current = next;
        }

        order
    }
}

#[derive(Debug, Clone, Copy)]
/// Nearest-neighbour start followed by open-path 2-opt improvement.
pub struct TwoOpt {
    /// Upper bound on full improvement sweeps.
    pub max_passes: usize,
}

impl Default for TwoOpt {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_TWO_OPT_PASSES,
        }
    }
}

impl TwoOpt {
    /// Improve `order` in place, returning the number of sweeps performed.
    ///
    /// Each sweep scans segment bounds `(start, end)` lexicographically and applies the
    /// first reversal that shortens the open path.
    pub fn improve(&self, matrix: &DistanceMatrix, order: &mut [usize]) -> usize {
        let len = order.len();
        if len < 3 {
            return 0;
        }

        let mut passes = 0;
        while passes < self.max_passes {
            passes += 1;
            let mut improved = false;

            for start in 0..len - 1 {
                for end in start + 1..len {
                    let saving = reversal_saving(matrix, order, start, end);
                    if saving > IMPROVEMENT_EPSILON
                        && let Some(segment) = order.get_mut(start..=end)
                    {
                        segment.reverse();
                        improved = true;
                    }
                }
            }

            if !improved {
                break;
            }
        }
        passes
    }
}

impl RouteSolver for TwoOpt {
    fn name(&self) -> &'static str {
        "two-opt"
    }

    fn solve(&self, matrix: &DistanceMatrix) -> Vec<usize> {
        let mut order = NearestNeighbor.solve(matrix);
        let before = matrix.path_length(&order);
        let passes = self.improve(matrix, &mut order);
        debug!(
            nodes = matrix.len(),
            passes,
            before_km = before,
            after_km = matrix.path_length(&order),
            "2-opt finished"
        );
        order
    }
}

// Path length saved by reversing order[start..=end]. Only the two boundary edges change.
fn reversal_saving(matrix: &DistanceMatrix, order: &[usize], start: usize, end: usize) -> f64 {
    let (Some(&first), Some(&last)) = (order.get(start), order.get(end)) else {
        return 0.0;
    };
    let before_node = start.checked_sub(1).and_then(|idx| order.get(idx)).copied();
    let after_node = order.get(end + 1).copied();

    let mut removed = 0.0;
    let mut added = 0.0;
    if let Some(prev) = before_node {
        removed += matrix.weight(prev, first);
        added += matrix.weight(prev, last);
    }
    if let Some(next) = after_node {
        removed += matrix.weight(last, next);
        added += matrix.weight(first, next);
    }
    removed - added
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Selectable route solver strategies.
pub enum SolverKind {
    /// [`NearestNeighbor`] only.
    NearestNeighbor,
    /// [`TwoOpt`] on top of nearest neighbour.
    #[default]
    TwoOpt,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown route solver: {0}")]
/// Returned when a solver name cannot be parsed.
pub struct SolverKindError(pub String);

impl FromStr for SolverKind {
    type Err = SolverKindError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().replace('_', "-").as_str() {
            "nearest-neighbor" | "nearest-neighbour" | "nn" => Ok(SolverKind::NearestNeighbor),
            "two-opt" | "2-opt" | "2opt" => Ok(SolverKind::TwoOpt),
            _ => Err(SolverKindError(raw.to_owned())),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            SolverKind::NearestNeighbor => "nearest-neighbor",
            SolverKind::TwoOpt => "two-opt",
        };
        write!(formatter, "{slug}")
    }
}

/// Route optimizer bound to a solver strategy.
#[derive(Clone)]
pub struct RouteOptimizer {
    solver: Arc<dyn RouteSolver>,
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        Self::new(Arc::new(TwoOpt::default()))
    }
}

impl fmt::Debug for RouteOptimizer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RouteOptimizer")
            .field("solver", &self.solver.name())
            .finish()
    }
}

impl RouteOptimizer {
    /// Create an optimizer using the given strategy.
    #[must_use]
    pub fn new(solver: Arc<dyn RouteSolver>) -> Self {
        Self { solver }
    }

    /// Create an optimizer for a configured strategy.
    #[must_use]
    pub fn from_kind(kind: SolverKind, two_opt_passes: usize) -> Self {
        match kind {
            SolverKind::NearestNeighbor => Self::new(Arc::new(NearestNeighbor)),
            SolverKind::TwoOpt => Self::new(Arc::new(TwoOpt {
                max_passes: two_opt_passes,
            })),
        }
    }

    /// Name of the active strategy.
    #[must_use]
    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Order `bins` into a low-cost visiting sequence.
    ///
    /// The result is a permutation of the input identifiers. No graph is built for fewer
    /// than two bins.
    #[must_use]
    pub fn optimize(&self, bins: &[Bin]) -> Route {
        match bins {
            [] => Route::default(),
            [only] => Route {
                stops: vec![only.id.clone()],
                distance_km: 0.0,
            },
            _ => {
                let matrix = DistanceMatrix::from_bins(bins);
                let order = self.solver.solve(&matrix);
                let distance_km = matrix.path_length(&order);
                let stops = order
                    .iter()
                    .filter_map(|idx| bins.get(*idx))
                    .map(|bin| bin.id.clone())
                    .collect();
                debug!(
                    solver = self.solver.name(),
                    bins = bins.len(),
                    distance_km,
                    "route optimized"
                );
                Route { stops, distance_km }
            }
        }
    }
}

/// Optimize with the default strategy (nearest neighbour plus 2-opt).
#[must_use]
pub fn optimize(bins: &[Bin]) -> Route {
    RouteOptimizer::default().optimize(bins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_matrix(positions: &[f64]) -> DistanceMatrix {
        let size = positions.len();
        let weights = positions
            .iter()
            .flat_map(|from| positions.iter().map(move |to| (from - to).abs()))
            .collect();
        DistanceMatrix::from_weights(size, weights).expect("square matrix")
    }

    #[test]
    fn nearest_neighbor_breaks_ties_by_lowest_index() {
        // node 0 is equidistant to 1 and 2
        let matrix = line_matrix(&[0.0, 1.0, -1.0]);
        assert_eq!(NearestNeighbor.solve(&matrix), vec![0, 1, 2], "tie goes to node 1");
    }

    #[test]
    fn two_opt_untangles_a_crossing() {
        // nearest neighbour from 0 walks 0 -> 1 -> 3 -> 2 and doubles back
        let matrix = line_matrix(&[0.0, 1.0, -1.5, 3.0]);
        let greedy = NearestNeighbor.solve(&matrix);
        let improved = TwoOpt::default().solve(&matrix);
        assert!(
            matrix.path_length(&improved) < matrix.path_length(&greedy),
            "2-opt should shorten {greedy:?}, got {improved:?}"
        );
        assert_eq!(matrix.path_length(&improved), 4.5, "optimal sweep from -1.5 to 3");
    }

    #[test]
    fn two_opt_respects_pass_cap() {
        let matrix = line_matrix(&[0.0, 1.0, -1.5, 3.0]);
        let mut order = vec![0, 1, 2, 3];
        let passes = TwoOpt { max_passes: 0 }.improve(&matrix, &mut order);
        assert_eq!(passes, 0, "no sweeps allowed");
        assert_eq!(order, vec![0, 1, 2, 3], "order untouched");
    }

    #[test]
    fn from_weights_rejects_non_square_input() {
        assert!(DistanceMatrix::from_weights(2, vec![0.0; 3]).is_none(), "3 != 2 * 2");
    }

    #[test]
    fn solver_kind_parses_common_spellings() {
        assert_eq!("2-opt".parse::<SolverKind>(), Ok(SolverKind::TwoOpt), "short form");
        assert_eq!(
            "Nearest_Neighbour".parse::<SolverKind>(),
            Ok(SolverKind::NearestNeighbor),
            "british spelling"
        );
        assert!("christofides".parse::<SolverKind>().is_err(), "unknown solver");
    }
}
