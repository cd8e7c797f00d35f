use std::str::FromStr;

use beatmap_schema::{Milliseconds, Note};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ConvertError;

pub const MANIA_MODE: i64 = 3;
pub const MIN_LANES: u8 = 4;
pub const MAX_LANES: u8 = 6;

/// Value used for difficulty and hp drain when the chart omits them.
pub const DEFAULT_STAT: u8 = 10;
const STAT_FLOOR: f64 = 10.0;
const STAT_CEIL: f64 = 100.0;

const PLAYFIELD_WIDTH: i64 = 512;
const SINGLE_BIT: u32 = 1 << 0;
const HOLD_BIT: u32 = 1 << 7;
const MIN_HIT_OBJECT_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    General,
    Metadata,
    Difficulty,
    Events,
    HitObjects,
}

const SECTION_TAGS: [(&str, Section); 5] = [
    ("[General]", Section::General),
    ("[Metadata]", Section::Metadata),
    ("[Difficulty]", Section::Difficulty),
    ("[Events]", Section::Events),
    ("[HitObjects]", Section::HitObjects),
];

impl Section {
    fn from_tag(line: &str) -> Self {
        SECTION_TAGS
            .iter()
            .find(|(tag, _)| line.starts_with(tag))
            .map_or(Section::None, |(_, section)| *section)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartMetadata {
    pub id: u32,
    pub title: String,
    pub artist: String,
    pub thumbnail: String,
    pub music: String,
    pub preview_point: Milliseconds,
    pub difficulty: u8,
    pub hp_drain: u8,
    pub lane_count: u8,
}

impl Default for ChartMetadata {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            artist: String::new(),
            thumbnail: String::new(),
            music: String::new(),
            preview_point: 0,
            difficulty: DEFAULT_STAT,
            hp_drain: DEFAULT_STAT,
            lane_count: 0,
        }
    }
}

/// A note as it appears in the source chart, lane numbered within the declared lane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceNote {
    pub start: Milliseconds,
    pub end: Milliseconds,
    pub channel: u8,
}

impl SourceNote {
    pub fn is_hold(&self) -> bool {
        self.end > 0
    }

    pub fn to_note(self) -> Note {
        Note::hold(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowIssue {
    #[error("expected at least 6 fields, found {0}")]
    TooFewFields(usize),
    #[error("invalid {field}: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("type {0:#b} is neither a single nor a hold note")]
    UnknownNoteType(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: RowIssue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawChart {
    pub metadata: ChartMetadata,
    /// Notes in file order.
    pub notes: Vec<SourceNote>,
    pub skipped_rows: Vec<SkippedRow>,
}

pub fn parse_chart(src: &str) -> Result<RawChart, ConvertError> {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    let mut parser = ChartParser::default();
    let mut line_count = 0;

    for (i, raw_line) in src.lines().enumerate() {
        parser.feed(raw_line.trim(), i + 1)?;
        line_count = i + 1;
    }

    debug!("chart text has {line_count} lines");
    parser.finish()
}

struct ChartParser {
    section: Section,
    metadata: ChartMetadata,
    lane_count: Option<u8>,
    notes: Vec<SourceNote>,
    skipped_rows: Vec<SkippedRow>,
}

impl Default for ChartParser {
    fn default() -> Self {
        Self {
            section: Section::None,
            metadata: ChartMetadata::default(),
            lane_count: None,
            notes: Vec::new(),
            skipped_rows: Vec::new(),
        }
    }
}

impl ChartParser {
    fn feed(&mut self, line: &str, line_no: usize) -> Result<(), ConvertError> {
        if line.is_empty() || line.starts_with("//") {
            return Ok(());
        }

        if line.starts_with('[') {
            self.section = Section::from_tag(line);
            debug!("line {line_no}: switching to section {line} ({:?})", self.section);
            return Ok(());
        }

        match self.section {
            Section::None => Ok(()),
            Section::General => self.general_entry(line, line_no),
            Section::Metadata => {
                self.metadata_entry(line, line_no);
                Ok(())
            }
            Section::Difficulty => self.difficulty_entry(line, line_no),
            Section::Events => {
                self.event_row(line);
                Ok(())
            }
            Section::HitObjects => self.hit_object_row(line, line_no),
        }
    }

    fn general_entry(&mut self, line: &str, line_no: usize) -> Result<(), ConvertError> {
        let Some((key, value)) = key_value(line) else {
            return Ok(());
        };
        match key {
            "AudioFilename" => {
                self.metadata.music = value.to_string();
                debug!("music file: {value}");
            }
            "PreviewTime" => {
                // -1 marks "no preview" in the source format
                if let Some(t) = parse_value::<i64>(key, value, line_no) {
                    self.metadata.preview_point = Milliseconds::try_from(t.max(0)).unwrap_or(0);
                }
            }
            "Mode" => {
                if value.parse::<i64>().ok() != Some(MANIA_MODE) {
                    return Err(ConvertError::not_mania_mode(value, line_no));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn metadata_entry(&mut self, line: &str, line_no: usize) {
        let Some((key, value)) = key_value(line) else {
            return;
        };
        match key {
            "Title" => self.metadata.title = value.to_string(),
            "Artist" => self.metadata.artist = value.to_string(),
            "BeatmapID" => {
                if let Some(id) = parse_value(key, value, line_no) {
                    self.metadata.id = id;
                }
            }
            _ => return,
        }
        debug!("{key}: {value}");
    }

    fn difficulty_entry(&mut self, line: &str, line_no: usize) -> Result<(), ConvertError> {
        let Some((key, value)) = key_value(line) else {
            return Ok(());
        };
        match key {
            "CircleSize" => {
                let lanes = value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(f64::trunc)
                    .filter(|v| (f64::from(MIN_LANES)..=f64::from(MAX_LANES)).contains(v));
                let Some(lanes) = lanes else {
                    return Err(ConvertError::unsupported_lane_count(value, line_no));
                };
                self.lane_count = Some(lanes as u8);
                debug!("lane count: {lanes}");
            }
            "OverallDifficulty" => {
                if let Some(v) = parse_stat(key, value, line_no) {
                    self.metadata.difficulty = rescale_stat(v);
                }
            }
            "HPDrainRate" => {
                if let Some(v) = parse_stat(key, value, line_no) {
                    self.metadata.hp_drain = rescale_stat(v);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn event_row(&mut self, line: &str) {
        if !line.starts_with("0,0") {
            return;
        }
        if let Some(file) = line.split(',').nth(2) {
            self.metadata.thumbnail = unquote(file.trim()).to_string();
            debug!("thumbnail: {}", self.metadata.thumbnail);
        }
    }

    fn hit_object_row(&mut self, line: &str, line_no: usize) -> Result<(), ConvertError> {
        let lane_count = self
            .lane_count
            .ok_or_else(|| ConvertError::missing_lane_count(line_no))?;

        match parse_hit_object(line, lane_count) {
            Ok(note) => self.notes.push(note),
            Err(reason) => {
                warn!("line {line_no}: skipping hit object: {reason}");
                self.skipped_rows.push(SkippedRow {
                    line: line_no,
                    reason,
                });
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<RawChart, ConvertError> {
        let lane_count = self
            .lane_count
            .ok_or_else(|| ConvertError::missing_lane_count(0))?;
        let metadata = ChartMetadata {
            lane_count,
            ..self.metadata
        };

        info!(
            "parsed {}K chart \"{}\": {} notes, {} rows skipped",
            lane_count,
            metadata.title,
            self.notes.len(),
            self.skipped_rows.len()
        );

        Ok(RawChart {
            metadata,
            notes: self.notes,
            skipped_rows: self.skipped_rows,
        })
    }
}

/// `x,y,time,type,hitSound,endTime:hitSample`; only x, time, type and endTime are read.
fn parse_hit_object(line: &str, lane_count: u8) -> Result<SourceNote, RowIssue> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < MIN_HIT_OBJECT_FIELDS {
        return Err(RowIssue::TooFewFields(fields.len()));
    }

    let x: i64 = int_field("x", fields[0])?;
    let start: Milliseconds = int_field("time", fields[2])?;
    let flags: u32 = int_field("type", fields[3])?;

    let end = if flags & HOLD_BIT != 0 {
        let raw_end = fields[5].split(':').next().unwrap_or_default();
        int_field("endTime", raw_end)?
    } else if flags & SINGLE_BIT != 0 {
        0
    } else {
        return Err(RowIssue::UnknownNoteType(flags));
    };

    Ok(SourceNote {
        start,
        end,
        channel: lane_for_x(x, lane_count),
    })
}

fn lane_for_x(x: i64, lane_count: u8) -> u8 {
    let x = x.clamp(0, PLAYFIELD_WIDTH - 1);
    // x < 512, so the quotient is below lane_count
    (x * i64::from(lane_count) / PLAYFIELD_WIDTH) as u8
}

/// Maps a 0-10 source value onto the inverse 10-100 stat, e.g. 8.0 -> 20.
pub fn rescale_stat(value: f64) -> u8 {
    (100.0 - value * 10.0).round().clamp(STAT_FLOOR, STAT_CEIL) as u8
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

fn int_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, RowIssue> {
    value.parse().map_err(|_| RowIssue::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, line_no: usize) -> Option<T> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        warn!("line {line_no}: ignoring unparsable {key}: {value:?}");
    }
    parsed
}

fn parse_stat(key: &str, value: &str, line_no: usize) -> Option<f64> {
    parse_value::<f64>(key, value, line_no).filter(|v| v.is_finite())
}
