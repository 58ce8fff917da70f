use ndarray::prelude::*;

use crate::error::Error;

/// Cost added on top of the gating threshold for infeasible and padded cells.
const GATED_MARGIN: f32 = 1.0e-5;

/// Result of associating tracks (rows) with detections (columns).
///
/// Indices refer to the rows and columns of the cost matrix the assignment
/// was derived from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl Assignment {
    fn unmatched(rows: usize, cols: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..rows).collect(),
            unmatched_detections: (0..cols).collect(),
        }
    }

    fn from_matches(matches: Vec<(usize, usize)>, rows: usize, cols: usize) -> Self {
        let mut track_used = vec![false; rows];
        let mut detection_used = vec![false; cols];

        for &(row, col) in matches.iter() {
            track_used[row] = true;
            detection_used[col] = true;
        }

        Self {
            matches,
            unmatched_tracks: (0..rows).filter(|&i| !track_used[i]).collect(),
            unmatched_detections: (0..cols).filter(|&j| !detection_used[j]).collect(),
        }
    }
}

/// Solve linear assignment problem.
///
/// Parameters
/// ----------
/// cost_matrix : ArrayView2<f32>
///     The MxN cost matrix, where element (i, j) is the association cost
///     between the i-th track and the j-th detection.
/// max_distance : f32
///     Gating threshold. Associations with cost larger than this value are
///     disregarded and both sides are reported as unmatched.
///
/// Returns
/// -------
/// Assignment
///     Matched (track, detection) pairs with minimal total cost, plus the
///     unmatched track and detection indices.
///
pub fn min_cost_matching(cost_matrix: ArrayView2<'_, f32>, max_distance: f32) -> Result<Assignment, Error> {
    let (rows, cols) = cost_matrix.dim();

    if rows == 0 || cols == 0 {
        return Ok(Assignment::unmatched(rows, cols)); // Nothing to match.
    }

    let feasible = |x: f32| x.is_finite() && x <= max_distance;

    if let Some(matches) = unambiguous_matches(cost_matrix, &feasible) {
        return Ok(Assignment::from_matches(matches, rows, cols));
    }

    let n = rows.max(cols);
    let gated_cost = max_distance + GATED_MARGIN;

    let mut weights = vec![gated_cost; n * n];
    for ((row, col), &cost) in cost_matrix.indexed_iter() {
        if feasible(cost) {
            weights[row * n + col] = cost;
        }
    }

    let mut weights = munkres::WeightMatrix::from_row_vec(n, weights);
    let indices = munkres::solve_assignment(&mut weights)?;

    let mut matches: Vec<_> = indices
        .into_iter()
        .filter(|pos| pos.row < rows && pos.column < cols)
        .filter(|pos| feasible(cost_matrix[(pos.row, pos.column)]))
        .map(|pos| (pos.row, pos.column))
        .collect();

    matches.sort_unstable();

    Ok(Assignment::from_matches(matches, rows, cols))
}

// When every track and every detection has at most one feasible partner the
// feasible pairs are already the optimal assignment.
fn unambiguous_matches<F: Fn(f32) -> bool>(cost_matrix: ArrayView2<'_, f32>, feasible: &F) -> Option<Vec<(usize, usize)>> {
    let mut per_column = vec![0usize; cost_matrix.ncols()];
    let mut matches = vec![];

    for (row, axis) in cost_matrix.axis_iter(Axis(0)).enumerate() {
        let mut per_row = 0;

        for (col, &cost) in axis.iter().enumerate() {
            if feasible(cost) {
                per_row += 1;
                per_column[col] += 1;

                if per_row > 1 || per_column[col] > 1 {
                    return None;
                }

                matches.push((row, col));
            }
        }
    }

    Some(matches)
}
