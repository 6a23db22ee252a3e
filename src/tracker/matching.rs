//! Cost matrices and optimal track-to-detection assignment.

use lapjv::{lapjv, Matrix};
use nalgebra::DMatrix;

use crate::detection::Detection;
use crate::geometry::Rect;

/// Padding cost for the square matrix handed to the solver. Large enough to
/// never beat a real pair, finite so the solver accepts it.
const PAD_COST: f64 = 1_000_000.0;

/// Result of one assignment round. Indices refer to the rows (tracks) and
/// columns (detections) of the cost matrix handed in.
#[derive(Debug, Default)]
pub(crate) struct MatchResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Build the `|tracks| x |detections|` IoU cost matrix: `1 - IoU` between
/// each predicted box and each detection box.
pub(crate) fn iou_cost(predicted: &[Rect], detections: &[&Detection]) -> DMatrix<f64> {
    let mut cost = DMatrix::zeros(predicted.len(), detections.len());
    for (i, rect) in predicted.iter().enumerate() {
        for (j, det) in detections.iter().enumerate() {
            cost[(i, j)] = 1.0 - rect.iou(&det.rect);
        }
    }
    cost
}

/// Solve minimum-cost one-to-one assignment over `cost`, keeping only pairs
/// with cost at most `thresh`.
///
/// The rectangular matrix is padded to a square with `PAD_COST` before
/// handing it to the Jonker-Volgenant solver; padded pairs always fail the
/// threshold and fall out as unmatched. Ties resolve by input order through
/// the row-major layout, so the result is deterministic.
pub(crate) fn linear_assignment(cost: &DMatrix<f64>, thresh: f64) -> MatchResult {
    let n = cost.nrows();
    let m = cost.ncols();
    if n == 0 || m == 0 {
        return MatchResult {
            matches: Vec::new(),
            unmatched_tracks: (0..n).collect(),
            unmatched_detections: (0..m).collect(),
        };
    }

    let k = n.max(m);
    let mut data = vec![PAD_COST; k * k];
    for i in 0..n {
        for j in 0..m {
            data[i * k + j] = cost[(i, j)];
        }
    }

    // Shape is square by construction; the solver only errors on malformed
    // input, in which case the frame degrades to "nothing matched".
    let row_solution = Matrix::from_shape_vec((k, k), data)
        .ok()
        .and_then(|mat| lapjv(&mat).ok());
    let row_solution = match row_solution {
        Some((rows, _cols)) => rows,
        None => {
            log::warn!("assignment solver failed on {}x{} cost matrix", n, m);
            return MatchResult {
                matches: Vec::new(),
                unmatched_tracks: (0..n).collect(),
                unmatched_detections: (0..m).collect(),
            };
        }
    };

    let mut result = MatchResult::default();
    let mut det_matched = vec![false; m];
    for i in 0..n {
        let j = row_solution[i];
        if j < m && cost[(i, j)] <= thresh {
            result.matches.push((i, j));
            det_matched[j] = true;
        } else {
            result.unmatched_tracks.push(i);
        }
    }
    result.unmatched_detections = (0..m).filter(|&j| !det_matched[j]).collect();

    result
}
