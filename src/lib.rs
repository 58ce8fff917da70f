pub mod error;
pub mod plate;
pub mod sort;

pub use plate::{OcrCandidate, PlateRecord, PlateText};
pub use sort::{Detection, SortConfig, TrackedObject, Tracker};

use log::{debug, trace};
use plate::{pick_candidate, VehicleMatchPolicy};

use std::collections::HashMap;

/// COCO classes of car, motorcycle, airplane, bus, train and truck.
pub const COCO_VEHICLE_CLASSES: [i32; 6] = [2, 3, 4, 5, 6, 7];

/// Text recognition of a plate crop, supplied by the caller.
///
/// Candidates are normalized before validation and tried in the returned
/// order; the first valid one wins.
pub trait PlateReader {
    fn read(&mut self, plate: &Detection) -> Vec<OcrCandidate>;
}

impl<F> PlateReader for F
where
    F: FnMut(&Detection) -> Vec<OcrCandidate>,
{
    #[inline]
    fn read(&mut self, plate: &Detection) -> Vec<OcrCandidate> {
        self(plate)
    }
}

#[derive(Debug, Clone)]
pub struct AnprConfig {
    pub sort: SortConfig,
    /// Vehicle classes to track; empty keeps every detection.
    pub vehicle_classes: Vec<i32>,
    /// Only every `frame_skip`-th frame is processed.
    pub frame_skip: u64,
    pub match_policy: VehicleMatchPolicy,
}

impl AnprConfig {
    pub fn new() -> Self {
        Self {
            sort: SortConfig::new(),
            vehicle_classes: COCO_VEHICLE_CLASSES.to_vec(),
            frame_skip: 1,
            match_policy: VehicleMatchPolicy::FirstMatch,
        }
    }
}

impl Default for AnprConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything produced for one processed frame.
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub tracks: Vec<TrackedObject>,
    pub plates: Vec<PlateRecord>,
}

pub struct Anpr {
    config: AnprConfig,
    trackers: HashMap<String, Tracker>,
}

impl Anpr {
    pub fn new(config: AnprConfig) -> Self {
        Self {
            config,
            trackers: HashMap::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &AnprConfig {
        &self.config
    }

    #[inline]
    pub fn tracks(&self, src: &str) -> &[sort::Track] {
        self.trackers.get(src).map(|t| t.tracks()).unwrap_or(&[])
    }

    /// Forget the tracker of a finished stream.
    pub fn remove_source(&mut self, src: &str) -> Option<Tracker> {
        self.trackers.remove(src)
    }

    #[inline]
    pub fn should_process(&self, frame_nmr: u64) -> bool {
        self.config.frame_skip <= 1 || frame_nmr % self.config.frame_skip == 0
    }

    fn is_vehicle(&self, det: &Detection) -> bool {
        self.config.vehicle_classes.is_empty()
            || det.class_id.map_or(true, |c| self.config.vehicle_classes.contains(&c))
    }

    /// Track the vehicles of one frame of stream `src` and resolve its plates.
    ///
    /// Frames skipped by `frame_skip` leave the tracker untouched and produce
    /// an empty output. OCR runs only for plates assigned to a vehicle.
    pub fn process_frame<R: PlateReader>(
        &mut self,
        src: &str,
        frame_nmr: u64,
        vehicles: &[Detection],
        plates: &[Detection],
        reader: &mut R,
    ) -> FrameOutput {
        if !self.should_process(frame_nmr) {
            trace!("{}: skipping frame {}", src, frame_nmr);
            return FrameOutput::default();
        }

        let vehicles: Vec<_> = vehicles.iter().filter(|d| self.is_vehicle(d)).cloned().collect();

        let sort_config = &self.config.sort;
        let tracker = self
            .trackers
            .entry(src.to_string())
            .or_insert_with(|| Tracker::new(sort_config.clone()));

        let tracks = tracker.update(&vehicles);
        let policy = self.config.match_policy;

        let plates: Vec<_> = plates
            .iter()
            .map(|plate| {
                let vehicle = policy.resolve(&plate.bbox, &tracks).cloned();

                let candidates = match vehicle {
                    Some(_) => reader.read(plate),
                    None => vec![],
                };

                let (ocr_text, text, text_score) = match pick_candidate(&candidates) {
                    Some((raw, text)) => (Some(raw.text.clone()), PlateText::Valid(text), Some(raw.confidence)),
                    None => (None, PlateText::Invalid, None),
                };

                PlateRecord {
                    frame: frame_nmr,
                    plate: plate.clone(),
                    vehicle,
                    ocr_text,
                    text,
                    text_score,
                }
            })
            .collect();

        debug!(
            "{}: frame {}: {} tracks, {} plates, {} read",
            src,
            frame_nmr,
            tracks.len(),
            plates.len(),
            plates.iter().filter(|p| p.is_complete()).count()
        );

        FrameOutput { tracks, plates }
    }
}
