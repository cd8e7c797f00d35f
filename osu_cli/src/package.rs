use std::{
    collections::HashSet,
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::Context;
use beatmap_schema::Chart;
use osu_converter::{ConvertOptions, CHART_EXTENSION};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct PackageReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl PackageReport {
    pub fn summary(&self) -> String {
        format!(
            "{} charts converted, {} failed",
            self.converted.len(),
            self.failed.len()
        )
    }
}

pub fn write_chart_json(chart: &Chart, out_path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(chart).context("failed to serialize chart")?;
    fs::write(out_path, json)
        .with_context(|| format!("failed to write: {}", out_path.display()))?;
    info!("exported chart to {}", out_path.display());
    Ok(())
}

/// Converts every chart file directly inside `dir` into `out_dir/<id>.json`
/// and copies the music and thumbnail each chart references.
///
/// A chart that fails to convert or export is recorded and skipped.
pub fn convert_package(
    dir: &Path,
    out_dir: &Path,
    options: ConvertOptions,
) -> anyhow::Result<PackageReport> {
    let charts = list_charts(dir)?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut report = PackageReport::default();
    let mut written = HashSet::new();
    for path in charts {
        info!("processing chart {}", path.display());
        let result = osu_converter::convert_file_with_options(&path, options)
            .map_err(anyhow::Error::from)
            .and_then(|chart| {
                let name = output_file_name(&chart, &path, &written);
                let out_path = out_dir.join(&name);
                write_chart_json(&chart, &out_path)?;
                written.insert(name);
                copy_asset(dir, out_dir, &chart.music);
                copy_asset(dir, out_dir, &chart.thumbnail);
                Ok(out_path)
            });

        match result {
            Ok(out_path) => report.converted.push(out_path),
            Err(e) => {
                warn!("skipping {}: {e:#}", path.display());
                report.failed.push((path, format!("{e:#}")));
            }
        }
    }

    info!("{}: {}", dir.display(), report.summary());
    Ok(report)
}

/// Treats every subdirectory of `root` as an unpacked archive and converts it
/// into `out_root/<subdirectory name>/`.
pub fn convert_batch(
    root: &Path,
    out_root: &Path,
    options: ConvertOptions,
) -> anyhow::Result<Vec<(PathBuf, PackageReport)>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("failed to read directory: {}", root.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    let mut reports = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let Some(name) = dir.file_name() else {
            continue;
        };
        match convert_package(&dir, &out_root.join(name), options) {
            Ok(report) => reports.push((dir, report)),
            Err(e) => warn!("skipping package {}: {e:#}", dir.display()),
        }
    }
    Ok(reports)
}

fn list_charts(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut charts: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_chart_file(path))
        .collect();
    charts.sort();
    Ok(charts)
}

fn is_chart_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CHART_EXTENSION))
}

// Charts without a BeatmapID would all land on 0.json, and two charts sharing
// an id would overwrite each other.
fn output_file_name(chart: &Chart, source: &Path, written: &HashSet<String>) -> String {
    if chart.id != 0 {
        let name = format!("{}.json", chart.id);
        if !written.contains(&name) {
            return name;
        }
        warn!(
            "{} shares BeatmapID {} with an earlier chart, using its file name",
            source.display(),
            chart.id
        );
    }
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("chart");
    format!("{stem}.json")
}

fn copy_asset(src_dir: &Path, out_dir: &Path, name: &str) {
    if name.is_empty() {
        return;
    }
    // only plain relative names, so the copy stays inside both directories
    if !Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        warn!("refusing to copy asset outside the package: {name}");
        return;
    }
    let from = src_dir.join(name);
    let to = out_dir.join(name);
    if to.exists() {
        return;
    }
    if let Some(parent) = to.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("failed to create {}: {e}", parent.display());
            return;
        }
    }
    if let Err(e) = fs::copy(&from, &to) {
        warn!("failed to copy asset {}: {e}", from.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_files_match_extension_case_insensitively() {
        assert!(is_chart_file(Path::new("a/b/Song [4K].osu")));
        assert!(is_chart_file(Path::new("x.OSU")));
        assert!(!is_chart_file(Path::new("x.osb")));
        assert!(!is_chart_file(Path::new("osu")));
    }

    #[test]
    fn charts_without_id_fall_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let src = "[General]\nMode: 3\n[Difficulty]\nCircleSize:4\n[HitObjects]\n64,192,100,1,0,0:0:0:0:\n";
        let path = dir.path().join("Artist - Song (Hard).osu");
        fs::write(&path, src).unwrap();

        let chart = osu_converter::convert_file(&path).unwrap();
        assert_eq!(
            output_file_name(&chart, &path, &HashSet::new()),
            "Artist - Song (Hard).json"
        );
    }

    fn chart_src(id: u32, audio: &str) -> String {
        format!(
            "[General]\nAudioFilename: {audio}\nMode: 3\n[Metadata]\nBeatmapID:{id}\n\
             [Difficulty]\nCircleSize:4\n[HitObjects]\n64,192,100,1,0,0:0:0:0:\n"
        )
    }

    #[test]
    fn assets_outside_the_package_are_not_copied() {
        let root = tempfile::tempdir().unwrap();
        let pkg = root.path().join("a").join("b").join("pkg");
        let out = root.path().join("out");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(root.path().join("a").join("x.mp3"), "secret").unwrap();
        fs::write(pkg.join("chart.osu"), chart_src(7, "../../x.mp3")).unwrap();

        let report = convert_package(&pkg, &out, ConvertOptions::default()).unwrap();

        assert_eq!(report.converted, vec![out.join("7.json")]);
        assert!(report.failed.is_empty());
        assert!(!root.path().join("x.mp3").exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn nested_asset_names_are_copied() {
        let root = tempfile::tempdir().unwrap();
        let pkg = root.path().join("pkg");
        let out = root.path().join("out");
        fs::create_dir_all(pkg.join("audio")).unwrap();
        fs::write(pkg.join("audio").join("song.mp3"), "ogg").unwrap();
        fs::write(pkg.join("chart.osu"), chart_src(8, "audio/song.mp3")).unwrap();

        convert_package(&pkg, &out, ConvertOptions::default()).unwrap();

        assert_eq!(fs::read_to_string(out.join("audio").join("song.mp3")).unwrap(), "ogg");
    }

    #[test]
    fn charts_sharing_an_id_are_both_written() {
        let root = tempfile::tempdir().unwrap();
        let pkg = root.path().join("pkg");
        let out = root.path().join("out");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("easy.osu"), chart_src(42, "song.mp3")).unwrap();
        fs::write(pkg.join("hard.osu"), chart_src(42, "song.mp3")).unwrap();

        let report = convert_package(&pkg, &out, ConvertOptions::default()).unwrap();

        assert_eq!(report.converted, vec![out.join("42.json"), out.join("hard.json")]);
        assert!(out.join("42.json").is_file());
        assert!(out.join("hard.json").is_file());
    }
}
