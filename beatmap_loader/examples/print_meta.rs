use std::path::PathBuf;

use beatmap_loader::SortStrategy;
use clap::Parser;

/// Print chart metadata from one exported chart, or list a whole chart directory.
#[derive(Debug, Parser)]
struct Args {
    path: PathBuf,
    #[arg(long, value_enum, default_value_t = SortStrategy::None)]
    sort: SortStrategy,
    #[arg(long)]
    descending: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.path.is_dir() {
        let library = beatmap_loader::scan_library(&args.path, args.sort, !args.descending)?;
        for loaded in library.charts() {
            let c = &loaded.chart;
            println!("{}\t{}\t{}\t{}", c.id, c.title, c.artist, c.difficulty);
        }
        return Ok(());
    }

    let chart = beatmap_loader::load_chart_json_from_path(args.path)?;
    println!("id={}", chart.id);
    println!("title={}", chart.title);
    println!("artist={}", chart.artist);
    println!("difficulty={}", chart.difficulty);
    println!("hp_drain={}", chart.hp_drain);
    println!("single_note_count={}", chart.notes.single_note_count);
    println!("hold_note_count={}", chart.notes.hold_note_count);
    Ok(())
}
