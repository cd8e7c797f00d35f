use std::{fs, path::Path};

use beatmap_schema::{Chart, SCHEMA_URL, SCHEMA_VERSION};
use tracing::info;

mod error;
pub mod parser;
pub mod remap;
pub mod rng;

pub use error::{ConvertError, ConvertErrorKind};
pub use parser::{parse_chart, ChartMetadata, RawChart, RowIssue, SkippedRow, SourceNote};
pub use remap::{build_lanes, LanePolicy, LaneSet};

/// File extension of the source chart format.
pub const CHART_EXTENSION: &str = "osu";

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub policy: LanePolicy,
    /// Seed for the lane-split coin flips. `None` seeds from the OS.
    pub seed: Option<u64>,
}

pub fn convert_file(path: impl AsRef<Path>) -> Result<Chart, ConvertError> {
    convert_file_with_options(path, ConvertOptions::default())
}

pub fn convert_file_with_options(
    path: impl AsRef<Path>,
    options: ConvertOptions,
) -> Result<Chart, ConvertError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        ConvertError::new("E2001", format!("failed to read input chart: {e}"), 0)
            .with_file(path.display().to_string())
    })?;
    convert_str_with_options(&src, options).map_err(|e| e.with_file(path.display().to_string()))
}

pub fn convert_str(src: &str) -> Result<Chart, ConvertError> {
    convert_str_with_options(src, ConvertOptions::default())
}

pub fn convert_str_with_options(src: &str, options: ConvertOptions) -> Result<Chart, ConvertError> {
    convert_str_with_rng(src, options.policy, rng::std_rng(options.seed))
}

pub fn convert_str_with_rng(
    src: &str,
    policy: LanePolicy,
    rng: impl rng::Rng,
) -> Result<Chart, ConvertError> {
    let raw = parse_chart(src)?;
    let lanes = build_lanes(&raw.notes, raw.metadata.lane_count, policy, rng)?;

    info!(
        "chart {} \"{}\": {} single, {} hold ({} of {} source notes kept)",
        raw.metadata.id,
        raw.metadata.title,
        lanes.single_count(),
        lanes.hold_count(),
        lanes.total(),
        raw.notes.len()
    );

    Ok(assemble_chart(raw.metadata, lanes))
}

fn assemble_chart(meta: ChartMetadata, lanes: LaneSet) -> Chart {
    Chart {
        schema: SCHEMA_URL.to_string(),
        version: SCHEMA_VERSION,
        id: meta.id,
        title: meta.title,
        artist: meta.artist,
        thumbnail: meta.thumbnail,
        music: meta.music,
        preview_point: meta.preview_point,
        difficulty: meta.difficulty,
        hp_drain: meta.hp_drain,
        notes: lanes.into_note_set(),
    }
}
