use crate::sort::{BBox, Ltrb, TrackedObject};

/// How to choose between several vehicles that all contain the same plate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VehicleMatchPolicy {
    /// First containing vehicle in track list order.
    FirstMatch,
    /// Containing vehicle with the smallest box area.
    SmallestArea,
}

impl Default for VehicleMatchPolicy {
    fn default() -> Self {
        VehicleMatchPolicy::FirstMatch
    }
}

/// Find the vehicle whose box strictly contains the plate box.
///
/// Returns `None` when no vehicle contains the plate.
pub fn get_vehicle<'a>(plate: &BBox<Ltrb>, vehicles: &'a [TrackedObject]) -> Option<&'a TrackedObject> {
    vehicles.iter().find(|v| v.bbox.contains(plate))
}

/// Like [`get_vehicle`], but breaks ties by the smallest containing box.
/// Equal areas keep track list order.
pub fn get_vehicle_smallest<'a>(plate: &BBox<Ltrb>, vehicles: &'a [TrackedObject]) -> Option<&'a TrackedObject> {
    vehicles
        .iter()
        .filter(|v| v.bbox.contains(plate))
        .fold(None::<&TrackedObject>, |best, v| match best {
            Some(b) if b.bbox.area() <= v.bbox.area() => Some(b),
            _ => Some(v),
        })
}

impl VehicleMatchPolicy {
    pub fn resolve<'a>(self, plate: &BBox<Ltrb>, vehicles: &'a [TrackedObject]) -> Option<&'a TrackedObject> {
        match self {
            VehicleMatchPolicy::FirstMatch => get_vehicle(plate, vehicles),
            VehicleMatchPolicy::SmallestArea => get_vehicle_smallest(plate, vehicles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(x1: f32, y1: f32, x2: f32, y2: f32, track_id: u64) -> TrackedObject {
        TrackedObject {
            bbox: BBox::ltrb(x1, y1, x2, y2),
            track_id,
            class_id: Some(2),
        }
    }

    #[test]
    fn plate_resolves_to_containing_vehicle() {
        let vehicles = vec![vehicle(10.0, 10.0, 200.0, 200.0, 1), vehicle(300.0, 300.0, 400.0, 400.0, 2)];

        let found = get_vehicle(&BBox::ltrb(50.0, 50.0, 100.0, 80.0), &vehicles);
        assert_eq!(found.map(|v| v.track_id), Some(1));

        assert!(get_vehicle(&BBox::ltrb(500.0, 500.0, 550.0, 530.0), &vehicles).is_none());
    }

    #[test]
    fn touching_edges_do_not_count() {
        let vehicles = vec![vehicle(10.0, 10.0, 200.0, 200.0, 1)];

        assert!(get_vehicle(&BBox::ltrb(10.0, 50.0, 100.0, 80.0), &vehicles).is_none());
        assert!(get_vehicle(&BBox::ltrb(50.0, 50.0, 200.0, 80.0), &vehicles).is_none());
    }

    #[test]
    fn nested_vehicles() {
        let vehicles = vec![vehicle(0.0, 0.0, 500.0, 500.0, 1), vehicle(40.0, 40.0, 120.0, 120.0, 2)];
        let plate = BBox::ltrb(50.0, 50.0, 100.0, 80.0);

        assert_eq!(VehicleMatchPolicy::FirstMatch.resolve(&plate, &vehicles).map(|v| v.track_id), Some(1));
        assert_eq!(VehicleMatchPolicy::SmallestArea.resolve(&plate, &vehicles).map(|v| v.track_id), Some(2));
        assert_eq!(VehicleMatchPolicy::default(), VehicleMatchPolicy::FirstMatch);
    }
}
