//! rekordusb: inspect Pioneer DJ USB exports
//!
//! Thin front-end over rekordusb-core for poking at export.pdb,
//! exportExt.pdb, and ANLZ analysis files from a terminal.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;

use rekordusb_core::{Database, PlaylistId, TrackId};

#[derive(Parser)]
#[command(name = "rekordusb")]
#[command(about = "Read-only inspector for Pioneer DJ USB exports")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log records as JSON lines (timestamp, level, message, source)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show table statistics for an export.pdb
    Info {
        /// Path to export.pdb
        pdb: PathBuf,
    },

    /// List tracks
    Tracks {
        /// Path to export.pdb
        pdb: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the playlist tree and playlist contents
    Playlists {
        /// Path to export.pdb
        pdb: PathBuf,
    },

    /// Show cue points for one track
    Cues {
        /// Path to export.pdb
        pdb: PathBuf,

        /// Directory containing ANLZ files (e.g. PIONEER/USBANLZ)
        anlz_dir: PathBuf,

        /// Track id to inspect; omit to list every analyzed track count
        #[arg(long)]
        track: Option<u64>,
    },

    /// List tags and categories from an exportExt.pdb
    Tags {
        /// Path to exportExt.pdb
        ext_pdb: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_max_level(level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .compact()
            .with_max_level(level)
            .init();
    }

    match cli.command {
        Command::Info { pdb } => info(&pdb),
        Command::Tracks { pdb, json } => tracks(&pdb, json),
        Command::Playlists { pdb } => playlists(&pdb),
        Command::Cues {
            pdb,
            anlz_dir,
            track,
        } => cues(&pdb, &anlz_dir, track),
        Command::Tags { ext_pdb } => tags(&ext_pdb),
    }
}

fn info(pdb: &PathBuf) -> anyhow::Result<()> {
    let db = Database::open(pdb).with_context(|| format!("opening {}", pdb.display()))?;

    println!("{}", pdb.display());
    println!("  Tracks:    {}", db.track_count());
    println!("  Artists:   {}", db.artist_count());
    println!("  Albums:    {}", db.album_count());
    println!("  Genres:    {}", db.genre_count());
    println!("  Playlists: {}", db.playlist_count());
    Ok(())
}

fn tracks(pdb: &PathBuf, json: bool) -> anyhow::Result<()> {
    let db = Database::open(pdb).with_context(|| format!("opening {}", pdb.display()))?;

    if json {
        let rows: Vec<_> = db
            .all_track_ids()
            .into_iter()
            .filter_map(|id| db.get_track(id))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<6} {:<32} {:<8} {:<6} {:<6}",
        "ID", "Title", "BPM", "Time", "Year"
    );
    println!("{}", "-".repeat(62));
    for id in db.all_track_ids() {
        let Some(track) = db.get_track(id) else { continue };
        println!(
            "{:<6} {:<32} {:<8.2} {:<6} {:<6}",
            track.id.0,
            truncate(&track.title, 31),
            track.bpm(),
            format_duration(track.duration_seconds),
            track.year,
        );
    }
    Ok(())
}

fn playlists(pdb: &PathBuf) -> anyhow::Result<()> {
    let db = Database::open(pdb).with_context(|| format!("opening {}", pdb.display()))?;

    print_folder(&db, PlaylistId(0), 0);
    Ok(())
}

fn print_folder(db: &Database, folder: PlaylistId, depth: usize) {
    let Some(children) = db.get_playlist_folder(folder) else {
        return;
    };
    for child in children {
        if child.id.0 == 0 {
            continue; // gap sentinel
        }
        let indent = "  ".repeat(depth);
        if child.is_folder {
            println!("{indent}{}/", child.name);
            print_folder(db, child.id, depth + 1);
        } else {
            let len = db
                .get_playlist(child.id)
                .map(|tracks| tracks.iter().filter(|t| t.0 != 0).count())
                .unwrap_or(0);
            println!("{indent}{} ({len} tracks)", child.name);
        }
    }
}

fn cues(pdb: &PathBuf, anlz_dir: &PathBuf, track: Option<u64>) -> anyhow::Result<()> {
    let mut db = Database::open(pdb).with_context(|| format!("opening {}", pdb.display()))?;
    let loaded = db.load_analysis_dir(anlz_dir);
    println!(
        "Loaded {loaded} ANLZ files covering {} tracks",
        db.analyzed_track_count()
    );

    let Some(track_id) = track else {
        return Ok(());
    };
    let id = TrackId(track_id);
    let title = db
        .get_track(id)
        .map(|t| t.title.clone())
        .unwrap_or_else(|| "<unknown track>".into());

    println!("\nCue points for #{track_id} {title}:");
    for cue in db.get_cue_points_for_track(id) {
        let slot = if cue.is_hot_cue() {
            format!("hot cue {}", cue.hot_cue_number)
        } else {
            "memory".into()
        };
        let mut line = format!(
            "  {:>8.2}s  {:<8} {}",
            cue.time_seconds(),
            cue.cue_type.as_str(),
            slot
        );
        if cue.is_loop() {
            line.push_str(&format!("  loop {}ms", cue.loop_duration_ms()));
        }
        if !cue.comment.is_empty() {
            line.push_str(&format!("  \"{}\"", cue.comment));
        }
        println!("{line}");
    }
    Ok(())
}

fn tags(ext_pdb: &PathBuf) -> anyhow::Result<()> {
    let db =
        Database::open_ext(ext_pdb).with_context(|| format!("opening {}", ext_pdb.display()))?;

    for &category_id in db.tag_categories() {
        let name = db
            .get_tag_category(category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("<unnamed>");
        println!("{name}:");
        for &tag_id in db.tags_in_category(category_id) {
            if let Some(tag) = db.get_tag(tag_id) {
                let tracks = db.find_tracks_by_tag(tag_id).len();
                println!("  {} ({tracks} tracks)", tag.name);
            }
        }
    }
    Ok(())
}

fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 1).collect();
        format!("{cut}…")
    }
}
