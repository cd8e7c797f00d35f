use std::{
    cmp::Ordering,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use beatmap_schema::Chart;
use tracing::{debug, info, warn};

use crate::load_chart_json_from_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortStrategy {
    Id,
    Title,
    Artist,
    Difficulty,
    #[default]
    None,
}

impl SortStrategy {
    fn compare(self, a: &Chart, b: &Chart) -> Ordering {
        match self {
            SortStrategy::Id => a.id.cmp(&b.id),
            SortStrategy::Title => a.title.cmp(&b.title),
            SortStrategy::Artist => a.artist.cmp(&b.artist),
            SortStrategy::Difficulty => a.difficulty.cmp(&b.difficulty),
            SortStrategy::None => Ordering::Equal,
        }
    }
}

/// A chart together with the package directory its assets live in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChart {
    pub path: PathBuf,
    pub chart: Chart,
}

impl LoadedChart {
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn music_path(&self) -> PathBuf {
        self.dir().join(&self.chart.music)
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.dir().join(&self.chart.thumbnail)
    }
}

#[derive(Debug, Default)]
pub struct ChartLibrary {
    charts: Vec<LoadedChart>,
    index: HashMap<u32, usize>,
}

impl ChartLibrary {
    pub fn charts(&self) -> &[LoadedChart] {
        &self.charts
    }

    pub fn get(&self, id: u32) -> Option<&LoadedChart> {
        self.index.get(&id).map(|&i| &self.charts[i])
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

/// Loads every `*.json` chart one directory below `root`.
///
/// Files that fail to load are logged and left out.
pub fn scan_library(
    root: impl AsRef<Path>,
    sort: SortStrategy,
    ascending: bool,
) -> anyhow::Result<ChartLibrary> {
    let root = root.as_ref();
    info!("scanning charts in {}", root.display());

    let mut packages: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("failed to read chart root: {}", root.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    packages.sort();

    let mut charts = Vec::new();
    for package in packages {
        let Ok(entries) = fs::read_dir(&package) else {
            warn!("cannot read {}", package.display());
            continue;
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        for path in files {
            match load_chart_json_from_path(&path) {
                Ok(chart) => {
                    debug!("loaded chart {} from {}", chart.id, path.display());
                    charts.push(LoadedChart { path, chart });
                }
                Err(e) => warn!("skipping {}: {e:#}", path.display()),
            }
        }
    }

    if sort != SortStrategy::None {
        charts.sort_by(|a, b| {
            let ord = sort.compare(&a.chart, &b.chart);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    // first chart wins when two share an id
    let mut index = HashMap::with_capacity(charts.len());
    for (i, loaded) in charts.iter().enumerate() {
        index.entry(loaded.chart.id).or_insert(i);
    }

    info!("loaded {} charts", charts.len());
    Ok(ChartLibrary { charts, index })
}
