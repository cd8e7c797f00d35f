use serde::{Deserialize, Serialize};

pub type Milliseconds = u32;

pub const SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/im-yuuki/AnisetteProject/refs/heads/sdl2/scripts/beatmap.schema.json";
pub const SCHEMA_VERSION: u32 = 1;

/// Number of lanes in every exported chart.
pub const LANE_COUNT: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: u32,
    pub id: u32,
    pub title: String,
    pub artist: String,
    pub thumbnail: String,
    pub music: String,
    pub preview_point: Milliseconds,
    pub difficulty: u8,
    pub hp_drain: u8,
    pub notes: NoteSet,
}

impl Chart {
    /// True when `$schema` and `version` match what this crate writes.
    pub fn has_current_schema(&self) -> bool {
        self.schema == SCHEMA_URL && self.version == SCHEMA_VERSION
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NoteSet {
    pub single_note_count: u32,
    pub hold_note_count: u32,
    pub channel_0: Vec<Note>,
    pub channel_1: Vec<Note>,
    pub channel_2: Vec<Note>,
    pub channel_3: Vec<Note>,
    pub channel_4: Vec<Note>,
    pub channel_5: Vec<Note>,
}

impl NoteSet {
    pub fn from_lanes(
        single_note_count: u32,
        hold_note_count: u32,
        lanes: [Vec<Note>; LANE_COUNT],
    ) -> Self {
        let [channel_0, channel_1, channel_2, channel_3, channel_4, channel_5] = lanes;
        Self {
            single_note_count,
            hold_note_count,
            channel_0,
            channel_1,
            channel_2,
            channel_3,
            channel_4,
            channel_5,
        }
    }

    pub fn lanes(&self) -> [&[Note]; LANE_COUNT] {
        [
            &self.channel_0,
            &self.channel_1,
            &self.channel_2,
            &self.channel_3,
            &self.channel_4,
            &self.channel_5,
        ]
    }

    pub fn total_notes(&self) -> usize {
        self.lanes().iter().map(|lane| lane.len()).sum()
    }
}

/// One playable event. Serialized as a `[start, end]` pair, `end == 0` for taps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(Milliseconds, Milliseconds)",
    into = "(Milliseconds, Milliseconds)"
)]
pub struct Note {
    pub start: Milliseconds,
    pub end: Milliseconds,
}

impl Note {
    pub fn tap(start: Milliseconds) -> Self {
        Self { start, end: 0 }
    }

    pub fn hold(start: Milliseconds, end: Milliseconds) -> Self {
        Self { start, end }
    }

    pub fn is_hold(&self) -> bool {
        self.end > 0
    }

    /// A hold must end strictly after it starts.
    pub fn is_well_formed(&self) -> bool {
        self.end == 0 || self.end > self.start
    }

    /// Last tick occupied by the note.
    pub fn release_time(&self) -> Milliseconds {
        if self.is_hold() {
            self.end
        } else {
            self.start
        }
    }
}

impl From<(Milliseconds, Milliseconds)> for Note {
    fn from((start, end): (Milliseconds, Milliseconds)) -> Self {
        Self { start, end }
    }
}

impl From<Note> for (Milliseconds, Milliseconds) {
    fn from(note: Note) -> Self {
        (note.start, note.end)
    }
}
