pub mod record;
pub mod text;
pub mod vehicle;

pub use record::{FrameResults, PlateRecord, Watchlist};
pub use text::{complies_format, format_license, pick_candidate, read_license_plate, OcrCandidate, PlateText};
pub use vehicle::{get_vehicle, get_vehicle_smallest, VehicleMatchPolicy};
