//! Minuet — play a notated track from a score file until interrupted.

use std::path::PathBuf;
use std::sync::mpsc;

use clap::Parser;

use minuet::engine::SynthEngine;
use minuet::player::TrackPlayer;
use minuet::score::Score;

#[derive(Parser)]
#[command(name = "minuet", version, about = "A miniature music-notation sequencer")]
struct Args {
    /// Path to the score YAML file (instruments + tracks).
    score: PathBuf,

    /// Name of the track to play.
    track: Option<String>,

    /// List the score's tracks and instruments, then exit.
    #[arg(long)]
    list: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let score = match Score::load(&args.score) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if args.list {
        list_score(&score);
        return;
    }

    let Some(track_name) = args.track else {
        eprintln!("no track named; use --list to see what the score holds");
        std::process::exit(2);
    };

    let engine = match SynthEngine::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("failed to start audio engine: {e}");
            std::process::exit(1);
        }
    };

    let player = TrackPlayer::new(engine, score);
    let playback = match player.play(&track_name) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!(
        "minuet v{} — playing '{track_name}' ({} parts), Ctrl-C to stop",
        env!("CARGO_PKG_VERSION"),
        playback.part_count()
    );

    // Park until Ctrl-C, then wind the sequencers down.
    let (tx, rx) = mpsc::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = tx.send(());
    }) {
        eprintln!("failed to install signal handler: {e}");
        std::process::exit(1);
    }
    let _ = rx.recv();

    println!("stopping...");
    playback.stop();
}

fn list_score(score: &Score) {
    let mut tracks: Vec<_> = score.tracks.iter().collect();
    tracks.sort_by_key(|(name, _)| name.clone());
    println!("tracks:");
    for (name, track) in tracks {
        println!("  {name} — {} BPM, {} parts", track.bpm, track.parts.len());
    }

    let mut instruments: Vec<_> = score.instruments.iter().collect();
    instruments.sort_by_key(|(key, _)| key.clone());
    println!("instruments:");
    for (key, instrument) in instruments {
        println!("  {key} — {:?}", instrument.waveform);
    }
}
