use std::{fs, path::Path};

use anyhow::Context;
use beatmap_schema::Chart;

mod library;

pub use library::{scan_library, ChartLibrary, LoadedChart, SortStrategy};

pub fn load_chart_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<Chart> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read chart: {}", path.display()))?;
    let chart: Chart = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse chart json: {}", path.display()))?;
    ensure_current_schema(chart).with_context(|| format!("invalid chart: {}", path.display()))
}

pub fn load_chart_json_from_str(json: &str) -> anyhow::Result<Chart> {
    let chart: Chart = serde_json::from_str(json).context("failed to parse chart json")?;
    ensure_current_schema(chart)
}

fn ensure_current_schema(chart: Chart) -> anyhow::Result<Chart> {
    anyhow::ensure!(
        chart.has_current_schema(),
        "unsupported schema {:?} version {}",
        chart.schema,
        chart.version
    );
    Ok(chart)
}
