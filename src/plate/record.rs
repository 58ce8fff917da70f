use std::collections::{BTreeMap, HashSet};

use crate::plate::text::{format_license, normalize_candidate};
use crate::plate::PlateText;
use crate::sort::{Detection, TrackId, TrackedObject};

/// Outcome of processing one plate detection in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateRecord {
    pub frame: u64,
    pub plate: Detection,
    /// Vehicle containing the plate, `None` when unassigned.
    pub vehicle: Option<TrackedObject>,
    /// OCR reading the text was derived from, if any candidate was accepted.
    pub ocr_text: Option<String>,
    pub text: PlateText,
    pub text_score: Option<f32>,
}

impl PlateRecord {
    #[inline]
    pub fn vehicle_id(&self) -> Option<TrackId> {
        self.vehicle.as_ref().map(|v| v.track_id)
    }

    /// A record carrying both a vehicle and a valid plate text.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.vehicle.is_some() && self.text.is_valid()
    }
}

/// Complete plate reads, indexed by frame and then by vehicle track.
#[derive(Debug, Clone, Default)]
pub struct FrameResults {
    frames: BTreeMap<u64, BTreeMap<TrackId, PlateRecord>>,
}

impl FrameResults {
    pub fn new() -> Self {
        Default::default()
    }

    /// Store a record; incomplete records are ignored. A later record for the
    /// same vehicle in the same frame replaces the earlier one.
    pub fn insert(&mut self, record: PlateRecord) -> bool {
        match record.vehicle_id() {
            Some(track_id) if record.text.is_valid() => {
                self.frames.entry(record.frame).or_default().insert(track_id, record);
                true
            }
            _ => false,
        }
    }

    pub fn extend<I: IntoIterator<Item = PlateRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }

    #[inline]
    pub fn frame(&self, frame: u64) -> Option<&BTreeMap<TrackId, PlateRecord>> {
        self.frames.get(&frame)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlateRecord> {
        self.frames.values().flat_map(|f| f.values())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Highest scoring read of every vehicle seen so far.
    pub fn best_reads(&self) -> BTreeMap<TrackId, &PlateRecord> {
        let mut best: BTreeMap<TrackId, &PlateRecord> = BTreeMap::new();

        for record in self.iter() {
            if let Some(track_id) = record.vehicle_id() {
                let score = record.text_score.unwrap_or(0.0);

                best.entry(track_id)
                    .and_modify(|b| {
                        if b.text_score.unwrap_or(0.0) < score {
                            *b = record;
                        }
                    })
                    .or_insert(record);
            }
        }

        best
    }
}

/// Set of flagged plate numbers.
#[derive(Debug, Clone, Default)]
pub struct Watchlist {
    plates: HashSet<String>,
}

impl Watchlist {
    /// Build a watchlist; entries that are not valid plates are dropped.
    pub fn new<I, S>(plates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let plates = plates
            .into_iter()
            .filter_map(|p| match format_license(&normalize_candidate(p.as_ref())) {
                PlateText::Valid(text) => Some(text),
                PlateText::Invalid => None,
            })
            .collect();

        Self { plates }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.plates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    #[inline]
    pub fn is_flagged(&self, text: &PlateText) -> bool {
        text.as_str().map_or(false, |t| self.plates.contains(t))
    }

    /// Complete records whose plate is on the watchlist.
    pub fn flagged<'a, I>(&'a self, records: I) -> impl Iterator<Item = &'a PlateRecord> + 'a
    where
        I: IntoIterator<Item = &'a PlateRecord>,
        I::IntoIter: 'a,
    {
        records
            .into_iter()
            .filter(move |r| r.is_complete() && self.is_flagged(&r.text))
    }
}
