use crate::sort::{BBox, Ltrb};

///
/// This class represents a bounding box detection in a single image.
/// Parameters
///
/// bbox : BBox in format `(x1, y1, x2, y2)`.
/// confidence : f32 - Detector confidence score.
/// class_id : Option<i32> - Detector class, passed through untouched.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltrb>,
    pub confidence: f32,
    pub class_id: Option<i32>,
}

impl Detection {
    #[inline]
    pub fn new(bbox: BBox<Ltrb>, confidence: f32, class_id: Option<i32>) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }

    /// Build a detection from a detector output row `[x1, y1, x2, y2, score, class_id]`.
    ///
    /// The class is rounded to the nearest integer; a negative or non-finite
    /// class becomes `None`.
    pub fn from_row(row: [f32; 6]) -> Self {
        let [x1, y1, x2, y2, score, class_id] = row;

        let class_id = if class_id.is_finite() && class_id >= 0.0 && class_id <= i32::MAX as f32 {
            Some(class_id.round() as i32)
        } else {
            None
        };

        Self::new(BBox::ltrb(x1, y1, x2, y2), score, class_id)
    }
}

#[test]
fn test_detection_from_row() {
    let det = Detection::from_row([10.0, 20.0, 50.0, 80.0, 0.75, 2.0]);

    assert_eq!(det.bbox, BBox::ltrb(10.0, 20.0, 50.0, 80.0));
    assert_eq!(det.confidence, 0.75);
    assert_eq!(det.class_id, Some(2));

    assert_eq!(Detection::from_row([0.0, 0.0, 1.0, 1.0, 0.5, 6.9999]).class_id, Some(7));
    assert_eq!(Detection::from_row([0.0, 0.0, 1.0, 1.0, 0.5, -1.0]).class_id, None);
    assert_eq!(Detection::from_row([0.0, 0.0, 1.0, 1.0, 0.5, std::f32::NAN]).class_id, None);
}
