//! Matching utilities for centroid tracking.

use ndarray::Array2;

use crate::tracker::rect::Rect;

/// Euclidean distance between the centroids of two boxes.
#[inline]
pub fn centroid_distance(a: &Rect, b: &Rect) -> f32 {
    nalgebra::distance(&a.center(), &b.center())
}

/// Compute the centroid distance matrix between tracks and detections.
///
/// Pairs whose labels differ get `f32::INFINITY`, so an entity can never be
/// matched to a detection of another category.
pub fn distance_matrix(tracks: &[(&str, Rect)], detections: &[(&str, Rect)]) -> Array2<f32> {
    let mut dists = Array2::from_elem((tracks.len(), detections.len()), f32::INFINITY);
    for (i, (t_label, t_box)) in tracks.iter().enumerate() {
        for (j, (d_label, d_box)) in detections.iter().enumerate() {
            if t_label == d_label {
                dists[[i, j]] = centroid_distance(t_box, d_box);
            }
        }
    }
    dists
}

/// A retained (row, col) pair and its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub distance: f32,
    pub row: usize,
    pub col: usize,
}

/// Collect every pair with `distance < gate`, sorted ascending by distance.
///
/// The sort is stable, so equal distances keep row-major order.
pub fn gated_candidates(dists: &Array2<f32>, gate: f32) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = dists
        .indexed_iter()
        .filter(|&(_, &d)| d.is_finite() && d < gate)
        .map(|((row, col), &distance)| Candidate { distance, row, col })
        .collect();
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates
}

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_rows: Vec<usize>,
    pub unmatched_cols: Vec<usize>,
}

/// Greedy minimum-distance assignment under a gate.
///
/// Scans the gated pairs shortest first and accepts a pair iff neither its row
/// nor its column was claimed by an earlier pair. Not optimal, but
/// O(n·m log(n·m)) and deterministic.
pub fn greedy_assignment(dists: &Array2<f32>, gate: f32) -> AssignmentResult {
    let (num_rows, num_cols) = dists.dim();
    let mut row_claimed = vec![false; num_rows];
    let mut col_claimed = vec![false; num_cols];
    let mut matches = Vec::new();

    for Candidate { row, col, .. } in gated_candidates(dists, gate) {
        if row_claimed[row] || col_claimed[col] {
            continue;
        }
        row_claimed[row] = true;
        col_claimed[col] = true;
        matches.push((row, col));
    }

    AssignmentResult {
        matches,
        unmatched_rows: unclaimed(&row_claimed),
        unmatched_cols: unclaimed(&col_claimed),
    }
}

fn unclaimed(claimed: &[bool]) -> Vec<usize> {
    claimed
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c { None } else { Some(i) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_distance() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(30, 40, 10, 10);
        assert!((centroid_distance(&a, &b) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_label_mismatch_is_infinite() {
        let tracks = [("cup", Rect::new(0, 0, 10, 10))];
        let dets = [
            ("bottle", Rect::new(0, 0, 10, 10)),
            ("cup", Rect::new(3, 4, 10, 10)),
        ];
        let m = distance_matrix(&tracks, &dets);
        assert!(m[[0, 0]].is_infinite());
        assert!((m[[0, 1]] - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_greedy_prefers_shortest_pair() {
        // Row 0 is closest to col 1; row 1 then takes col 0.
        let m = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 3.0, 1.5]).unwrap();
        let r = greedy_assignment(&m, 10.0);
        assert_eq!(r.matches, vec![(0, 1), (1, 0)]);
        assert!(r.unmatched_rows.is_empty());
        assert!(r.unmatched_cols.is_empty());
    }

    #[test]
    fn test_greedy_is_not_optimal() {
        // Optimal total is 2+2 but greedy takes the 1.0 first and leaves row 1 with 9.0.
        let m = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 2.0, 9.0]).unwrap();
        let r = greedy_assignment(&m, 5.0);
        assert_eq!(r.matches, vec![(0, 0)]);
        assert_eq!(r.unmatched_rows, vec![1]);
        assert_eq!(r.unmatched_cols, vec![1]);
    }

    #[test]
    fn test_gate_is_strict() {
        let m = Array2::from_shape_vec((1, 2), vec![5.0, 4.999]).unwrap();
        let c = gated_candidates(&m, 5.0);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].col, 1);
    }

    #[test]
    fn test_empty_inputs() {
        let r = greedy_assignment(&Array2::zeros((0, 3)), 1.0);
        assert!(r.matches.is_empty());
        assert_eq!(r.unmatched_cols, vec![0, 1, 2]);

        let r = greedy_assignment(&Array2::zeros((2, 0)), 1.0);
        assert_eq!(r.unmatched_rows, vec![0, 1]);
    }
}
