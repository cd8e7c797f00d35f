use std::{fs, path::Path, process::Command};

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

fn chart_src(id: u32, mode: u32, circle_size: u32) -> String {
    format!(
        "osu file format v14\n\n[General]\nAudioFilename: audio.mp3\nPreviewTime: 100\nMode: {mode}\n\n[Metadata]\nTitle:T{id}\nArtist:A\nBeatmapID:{id}\n\n[Difficulty]\nHPDrainRate:5\nCircleSize:{circle_size}\nOverallDifficulty:8\n\n[Events]\n0,0,\"bg.jpg\",0,0\n\n[HitObjects]\n64,192,1000,1,0,0:0:0:0:\n448,192,2000,128,0,2500:0:0:0:0:\n"
    )
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_osu_cli"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("OSU_CLI_SEED")
        .output()
        .unwrap()
}

fn write_package(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("easy.osu"), chart_src(11, 3, 4)).unwrap();
    fs::write(dir.join("hard.osu"), chart_src(12, 3, 6)).unwrap();
    fs::write(dir.join("taiko.osu"), chart_src(13, 1, 4)).unwrap();
    fs::write(dir.join("notes.txt"), "not a chart").unwrap();
    fs::write(dir.join("audio.mp3"), b"ID3 fake audio").unwrap();
    fs::write(dir.join("bg.jpg"), b"fake image").unwrap();
}

#[test]
fn convert_error_output_format_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("std.osu");
    fs::write(&input, chart_src(1, 0, 4)).unwrap();

    let output = run(&["convert", input.to_str().unwrap()]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: convert failed: "));
    assert!(stderr.contains("Caused by:"));
    assert!(stderr.contains("E1001: not a mania chart (Mode: 0) (line 6)"));
}

#[test]
fn convert_missing_input_file_is_e2001() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.osu");

    let output = run(&["convert", missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: convert failed: "));
    assert!(stderr.contains("E2001: failed to read input chart:"));
    assert!(stderr.contains("(line 0)"));
}

#[test]
fn convert_success_writes_output_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.osu");
    let output_path = dir.path().join("out.json");
    fs::write(&input, chart_src(7, 3, 4)).unwrap();

    let out = run(&[
        "convert",
        input.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--seed",
        "3",
    ]);

    assert!(out.status.success());
    let json = fs::read_to_string(&output_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["$schema"], beatmap_schema::SCHEMA_URL);
    assert_eq!(v["id"], 7);
    assert_eq!(v["difficulty"], 20);
    assert_eq!(v["hp_drain"], 50);
    assert_eq!(v["notes"]["single_note_count"], 1);
    assert_eq!(v["notes"]["hold_note_count"], 1);
}

#[test]
fn convert_without_output_writes_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("chart.osu");
    fs::write(&input, chart_src(8, 3, 5)).unwrap();

    let out = run(&["convert", input.to_str().unwrap(), "--policy", "sort-only"]);

    assert!(out.status.success());
    assert!(dir.path().join("chart.json").exists());
}

#[test]
fn same_seed_gives_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.osu");
    let mut src = chart_src(9, 3, 4);
    for i in 0..50 {
        src.push_str(&format!("64,192,{},1,0,0:0:0:0:\n", 3000 + i * 100));
    }
    fs::write(&input, src).unwrap();

    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    for out in [&a, &b] {
        let status = run(&[
            "convert",
            input.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--seed",
            "42",
        ])
        .status;
        assert!(status.success());
    }
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn help_mentions_subcommands() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("convert"));
    assert!(stdout.contains("package"));
    assert!(stdout.contains("batch"));
    assert!(stdout.contains("Usage: osu_cli"));
}

#[test]
fn convert_output_write_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.osu");
    fs::write(&input, chart_src(7, 3, 4)).unwrap();
    let output_path = dir.path().join("missing_dir").join("out.json");

    let out = run(&["convert", input.to_str().unwrap(), "-o", output_path.to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("Error: failed to write:"));
    assert!(stderr.contains("out.json"));
    assert!(stderr.contains("Caused by:"));
}

#[test]
fn package_converts_valid_charts_and_copies_assets() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("pkg");
    let out = dir.path().join("out");
    write_package(&pkg);

    let output = run(&["package", pkg.to_str().unwrap(), "-o", out.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("2 charts converted, 1 failed"));

    assert!(out.join("11.json").exists());
    assert!(out.join("12.json").exists());
    assert!(!out.join("13.json").exists());
    assert_eq!(fs::read(out.join("audio.mp3")).unwrap(), b"ID3 fake audio");
    assert_eq!(fs::read(out.join("bg.jpg")).unwrap(), b"fake image");
    assert!(!out.join("notes.txt").exists());

    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("taiko.osu"));
}

#[test]
fn batch_processes_each_package_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("songs");
    let out = dir.path().join("beatmaps");
    write_package(&root.join("first"));
    fs::create_dir_all(root.join("second")).unwrap();
    fs::write(root.join("second").join("only.osu"), chart_src(21, 3, 5)).unwrap();
    fs::write(root.join("stray.osu"), chart_src(99, 3, 4)).unwrap();

    let output = run(&["batch", root.to_str().unwrap(), "-o", out.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(out.join("first").join("11.json").exists());
    assert!(out.join("second").join("21.json").exists());
    // the music file is missing from "second"; that is logged, not fatal
    assert!(!out.join("second").join("audio.mp3").exists());
    assert!(!out.join("99.json").exists());
}
