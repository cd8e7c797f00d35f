use beatmap_schema::{Note, NoteSet, LANE_COUNT};
use tracing::{debug, warn};

use crate::parser::SourceNote;
use crate::rng::Rng;
use crate::ConvertError;

/// How each output lane is cleaned after routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanePolicy {
    /// Walk the lane in file order and drop any note starting at or before the
    /// release of the last accepted note. Accepted notes never overlap.
    #[default]
    SuppressOverlap,
    /// Keep every well-formed note and stable-sort by start. Overlaps survive.
    SortOnly,
}

impl LanePolicy {
    fn clean(self, pending: Vec<Note>) -> Vec<Note> {
        match self {
            Self::SuppressOverlap => suppress_overlap(pending),
            Self::SortOnly => {
                let mut accepted: Vec<Note> =
                    pending.into_iter().filter(Note::is_well_formed).collect();
                accepted.sort_by_key(|note| note.start);
                accepted
            }
        }
    }
}

fn suppress_overlap(pending: Vec<Note>) -> Vec<Note> {
    let mut next = 0;
    let mut accepted = Vec::with_capacity(pending.len());
    for note in pending {
        if !note.is_well_formed() || note.start <= next {
            continue;
        }
        next = note.release_time();
        accepted.push(note);
    }
    accepted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Fixed(usize),
    /// 50/50 between two output lanes, drawn per note.
    Split(usize, usize),
}

impl Route {
    fn pick(self, rng: &mut impl Rng) -> usize {
        match self {
            Route::Fixed(lane) => lane,
            Route::Split(first, second) => {
                if rng.generate(0..=1) == 0 {
                    first
                } else {
                    second
                }
            }
        }
    }
}

const FOUR_LANES: [Route; 4] = [
    Route::Split(0, 1),
    Route::Fixed(2),
    Route::Fixed(3),
    Route::Split(4, 5),
];

const FIVE_LANES: [Route; 5] = [
    Route::Fixed(0),
    Route::Fixed(1),
    Route::Split(2, 3),
    Route::Fixed(4),
    Route::Fixed(5),
];

const SIX_LANES: [Route; 6] = [
    Route::Fixed(0),
    Route::Fixed(1),
    Route::Fixed(2),
    Route::Fixed(3),
    Route::Fixed(4),
    Route::Fixed(5),
];

fn routing_table(lane_count: u8) -> Option<&'static [Route]> {
    match lane_count {
        4 => Some(&FOUR_LANES),
        5 => Some(&FIVE_LANES),
        6 => Some(&SIX_LANES),
        _ => None,
    }
}

/// Six cleaned output lanes plus note totals taken after cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneSet {
    lanes: [Vec<Note>; LANE_COUNT],
    single_count: u32,
    hold_count: u32,
}

impl LaneSet {
    fn from_lanes(lanes: [Vec<Note>; LANE_COUNT]) -> Self {
        let (mut single_count, mut hold_count) = (0, 0);
        for note in lanes.iter().flatten() {
            if note.is_hold() {
                hold_count += 1;
            } else {
                single_count += 1;
            }
        }
        Self {
            lanes,
            single_count,
            hold_count,
        }
    }

    pub fn lanes(&self) -> &[Vec<Note>; LANE_COUNT] {
        &self.lanes
    }

    pub fn lane(&self, index: usize) -> &[Note] {
        self.lanes.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn single_count(&self) -> u32 {
        self.single_count
    }

    pub fn hold_count(&self) -> u32 {
        self.hold_count
    }

    pub fn total(&self) -> u32 {
        self.single_count + self.hold_count
    }

    pub fn into_note_set(self) -> NoteSet {
        NoteSet::from_lanes(self.single_count, self.hold_count, self.lanes)
    }
}

/// Routes `notes` from a `lane_count`-lane chart onto the six output lanes and
/// cleans every lane with `policy`.
///
/// Fails with `InvalidLaneCount` before routing anything when `lane_count` is
/// not 4, 5 or 6.
pub fn build_lanes(
    notes: &[SourceNote],
    lane_count: u8,
    policy: LanePolicy,
    mut rng: impl Rng,
) -> Result<LaneSet, ConvertError> {
    let table =
        routing_table(lane_count).ok_or_else(|| ConvertError::invalid_lane_count(lane_count))?;
    debug!("routing {} notes from {lane_count} lanes", notes.len());

    let mut routed: [Vec<Note>; LANE_COUNT] = Default::default();
    let mut stray = 0usize;
    for note in notes {
        let Some(route) = table.get(usize::from(note.channel)) else {
            stray += 1;
            continue;
        };
        routed[route.pick(&mut rng)].push(note.to_note());
    }
    if stray > 0 {
        warn!("{stray} notes reference a lane outside the {lane_count}-lane layout");
    }

    let lanes = LaneSet::from_lanes(routed.map(|pending| policy.clean(pending)));

    let dropped = notes.len() - stray - lanes.total() as usize;
    if dropped > 0 {
        warn!("{dropped} notes dropped while cleaning lanes ({policy:?})");
    }
    debug!(
        "lanes built: {} single, {} hold",
        lanes.single_count, lanes.hold_count
    );

    Ok(lanes)
}
