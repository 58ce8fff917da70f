use ndarray::prelude::*;

use crate::sort::{BBox, Detection, Ltrb};

const EPSILON: f32 = 1.0e-9;

/// Computer intersection over union of two boxes in `(x1, y1, x2, y2)` format.
///
/// Returns a value in [0, 1]. Boxes are scored as the filter sees them, with
/// sides clamped to `MIN_SIDE`, so a zero-width detection can still match the
/// track it started. Disjoint boxes and boxes with a non-finite corner score 0.
pub fn iou(a: &BBox<Ltrb>, b: &BBox<Ltrb>) -> f32 {
    if !a.is_finite() || !b.is_finite() {
        return 0.0;
    }

    let (a, b) = (a.clamped(), b.clamped());

    let i_xmin = a.left().max(b.left());
    let i_ymin = a.top().max(b.top());

    let i_xmax = a.right().min(b.right());
    let i_ymax = a.bottom().min(b.bottom());

    let intersection_area = (i_xmax - i_xmin).max(0.0) * (i_ymax - i_ymin).max(0.0);
    let union_area = a.area() + b.area() - intersection_area;

    if union_area <= EPSILON || !union_area.is_finite() {
        return 0.0;
    }

    intersection_area / union_area
}

///
/// Pairwise intersection over union between predicted track boxes (rows)
/// and detections (columns). Either side may be empty.
///
pub fn iou_matrix(track_boxes: &[BBox<Ltrb>], detections: &[Detection]) -> Array2<f32> {
    let mut matrix = Array2::zeros((track_boxes.len(), detections.len()));

    for (mut row, bbox) in matrix.axis_iter_mut(Axis(0)).zip(track_boxes.iter()) {
        for (cell, detection) in row.iter_mut().zip(detections.iter()) {
            *cell = iou(bbox, &detection.bbox);
        }
    }

    matrix
}

///
/// An intersection over union distance metric.
///
/// Returns a cost matrix of shape `track_boxes.len(), detections.len()` where
/// entry (i, j) is `1 - iou(track_boxes[i], detections[j])`.
///
pub fn iou_cost(track_boxes: &[BBox<Ltrb>], detections: &[Detection]) -> Array2<f32> {
    1.0 - iou_matrix(track_boxes, detections)
}
