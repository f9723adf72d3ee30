//! vlc-connector command line
//!
//! Plays, records and inspects media through the connector. The playback
//! loop polls position and duration on a timer, which is all a seek display
//! needs from the player.

use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vlc_connector::cli::{Args, Commands};
use vlc_connector::config::{Config, EngineBackend};
use vlc_connector::engine::{MemoryEngine, PlayerEvent};
use vlc_connector::{
    AudioCodec, Deinterlacing, ErrorReporter, Instance, Media, MediaPlayer, Meta, MetaManager, Mux,
    Ratio, State, Track, VideoCodec, VlcError,
};

/// How long `tracks` waits for the input to open
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct TrackReport {
    video: Vec<Track>,
    audio: Vec<Track>,
    subtitles: Vec<Track>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("vlc-connector.toml").exists() {
                info!("Found vlc-connector.toml in current directory, loading...");
                Config::from_file("vlc-connector.toml")?
            } else {
                Config::default()
            }
        }
    };
    if let Some(backend) = &args.backend {
        config.engine.backend = parse_backend(backend)?;
    }
    config.validate()?;

    if let Commands::Version = args.command {
        println!("vlc-connector {}", Instance::version());
    }

    // The memory engine only moves its clock when told to
    let clock = match config.engine.backend {
        EngineBackend::Memory => Some(Rc::new(MemoryEngine::new())),
        EngineBackend::Libvlc => None,
    };
    let instance = match &clock {
        Some(engine) => Instance::with_config(engine.clone(), &config.engine)?,
        None => Instance::from_config(&config.engine)?,
    };
    let clock = clock.as_deref();

    match args.command {
        Commands::Version => {
            println!("engine {}", instance.lib_version());
        }
        Commands::Play {
            input,
            remote,
            volume,
            aspect,
            deinterlace,
            subtitles,
            duration,
        } => {
            let media = Media::new(&instance, &input, !remote);
            let mut player = MediaPlayer::new(&instance);
            player.open(&media);
            ensure_ok("open")?;

            player.audio().set_volume(volume.unwrap_or(config.playback.volume));
            let ratio = match aspect {
                Some(aspect) => Some(parse_ratio(&aspect)?),
                None => config.playback.aspect_ratio,
            };
            if let Some(ratio) = ratio {
                player.video().set_aspect_ratio(ratio);
            }
            let filter = match deinterlace {
                Some(filter) => Some(parse_deinterlace(&filter)?),
                None => config.playback.deinterlace,
            };
            if let Some(filter) = filter {
                player.video().set_deinterlace(filter);
            }
            if let Some(subtitles) = subtitles {
                if !player.subtitle().set_subtitle_file(&subtitles) {
                    warn!("Subtitle file {} was not loaded", subtitles.display());
                }
            }

            let poll = Duration::from_millis(config.playback.poll_interval_ms);
            let state = run_playback(&player, clock, poll, duration.map(Duration::from_secs)).await?;
            info!("Playback finished in state {:?}", state);
        }
        Commands::Record {
            input,
            name,
            remote,
            output_dir,
            mux,
            audio_codec,
            video_codec,
            duplicate,
            duration,
        } => {
            let output_dir = output_dir.unwrap_or(config.recording.output_dir.clone());
            std::fs::create_dir_all(&output_dir)?;
            let mux = match mux {
                Some(mux) => parse_mux(&mux)?,
                None => config.recording.mux,
            };
            let audio_codec = match audio_codec {
                Some(codec) => Some(parse_audio_codec(&codec)?),
                None => config.recording.audio_codec,
            };
            let video_codec = match video_codec {
                Some(codec) => Some(parse_video_codec(&codec)?),
                None => config.recording.video_codec,
            };

            let media = Media::new(&instance, &input, !remote);
            let output = match (audio_codec, video_codec) {
                (None, None) if duplicate || config.recording.duplicate => {
                    media.duplicate(&name, &output_dir, mux)
                }
                (None, None) => media.record(&name, &output_dir, mux),
                (audio, video) => media.record_transcoded(
                    &name,
                    &output_dir,
                    mux,
                    audio.unwrap_or(AudioCodec::Mpeg4Audio),
                    video.unwrap_or(VideoCodec::H264),
                ),
            };

            let mut player = MediaPlayer::new(&instance);
            player.open(&media);
            ensure_ok("open")?;

            let poll = Duration::from_millis(config.playback.poll_interval_ms);
            run_playback(&player, clock, poll, duration.map(Duration::from_secs)).await?;
            println!("{}", output.display());
        }
        Commands::Tracks { input, remote, json } => {
            let media = Media::new(&instance, &input, !remote);
            let mut player = MediaPlayer::new(&instance);
            player.open(&media);
            ensure_ok("open")?;
            wait_for_input(&player, Duration::from_millis(config.playback.poll_interval_ms)).await?;

            let report = TrackReport {
                video: player.video().tracks(),
                audio: player.audio().tracks(),
                subtitles: player.subtitle().subtitles(),
            };
            player.stop();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_tracks("Video", &report.video);
                print_tracks("Audio", &report.audio);
                print_tracks("Subtitles", &report.subtitles);
            }
        }
        Commands::Meta {
            input,
            set,
            save,
            json,
        } => {
            let media = Media::new(&instance, &input, true);
            ensure_ok("media")?;
            let meta = MetaManager::new(&media);

            for assignment in &set {
                let (field, value) = parse_assignment(assignment)?;
                meta.set(field, value);
            }
            if save {
                if !meta.save() {
                    return Err(last_error_or("Metadata could not be saved").into());
                }
                info!("Saved metadata of {}", input);
            }

            let fields = meta.all();
            if json {
                println!("{}", serde_json::to_string_pretty(&fields)?);
            } else if fields.is_empty() {
                println!("No metadata found.");
            } else {
                for (field, value) in &fields {
                    println!("{:<15} {}", format!("{:?}", field), value);
                }
            }
        }
    }

    Ok(())
}

/// Poll the player until it stops, ends, fails, or the time limit passes
async fn run_playback(
    player: &MediaPlayer<'_>,
    clock: Option<&MemoryEngine>,
    poll: Duration,
    limit: Option<Duration>,
) -> Result<State> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let started = Instant::now();
    let mut ticker = tokio::time::interval(poll);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping playback");
                player.stop();
                break;
            }
        }

        if let Some(engine) = clock {
            engine.advance(poll.as_millis() as i64);
        }
        for event in player.drain_events() {
            debug!("Player event: {:?}", event);
            if event == PlayerEvent::EncounteredError {
                warn!("Engine reported a playback error");
            }
        }

        let length = player.length();
        let time = player.time();
        if length > 0 {
            pb.set_length(length as u64);
        }
        if time >= 0 {
            pb.set_position(time as u64);
        }
        pb.set_message(format!("{} / {}", format_time(time), format_time(length)));

        let state = player.state();
        if state.is_terminal() || state == State::Stopped {
            break;
        }
        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            info!("Time limit reached, stopping playback");
            player.stop();
            break;
        }
    }

    pb.finish_and_clear();
    Ok(player.state())
}

/// Wait until the player has an input to describe
async fn wait_for_input(player: &MediaPlayer<'_>, poll: Duration) -> Result<()> {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(poll.min(Duration::from_millis(100)));
    loop {
        ticker.tick().await;
        match player.state() {
            State::Playing | State::Paused => return Ok(()),
            State::Error => return Err(last_error_or("The input could not be opened").into()),
            state if started.elapsed() >= OPEN_TIMEOUT => {
                return Err(VlcError::Config(format!("Input still {:?} after {:?}", state, OPEN_TIMEOUT)).into());
            }
            _ => {}
        }
    }
}

/// Turn an error left by the last call into a failure of the command
fn ensure_ok(step: &str) -> Result<()> {
    match ErrorReporter::take_last_error() {
        Some(error) => Err(anyhow::anyhow!("{} failed: {}", step, error)),
        None => Ok(()),
    }
}

fn last_error_or(fallback: &str) -> VlcError {
    ErrorReporter::take_last_error().unwrap_or_else(|| VlcError::Config(fallback.to_string()))
}

fn print_tracks(kind: &str, tracks: &[Track]) {
    println!("\n{} tracks:", kind);
    if tracks.is_empty() {
        println!("  (none)");
    }
    for track in tracks {
        println!("  {:>5}  {}", track.id, track.name);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".vlc-connector").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "vlc-connector.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    debug!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("vlc-connector.log").display()
    );

    Ok(())
}

/// Format milliseconds as m:ss, `--:--` when unknown
fn format_time(millis: i64) -> String {
    if millis < 0 {
        return "--:--".to_string();
    }
    let seconds = millis / 1000;
    if seconds < 3600 {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    } else {
        format!("{}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
    }
}

fn parse_backend(name: &str) -> Result<EngineBackend> {
    match name.to_lowercase().as_str() {
        "memory" => Ok(EngineBackend::Memory),
        "libvlc" => Ok(EngineBackend::Libvlc),
        _ => Err(VlcError::Config(format!(
            "Invalid backend '{}'. Valid backends: memory, libvlc",
            name
        ))
        .into()),
    }
}

fn parse_mux(name: &str) -> Result<Mux> {
    Mux::from_engine(&name.to_lowercase()).ok_or_else(|| {
        let valid: Vec<_> = Mux::all().map(|m| m.as_str()).collect();
        VlcError::Config(format!("Invalid mux '{}'. Valid values: {}", name, valid.join(", "))).into()
    })
}

fn parse_audio_codec(name: &str) -> Result<AudioCodec> {
    AudioCodec::from_engine(&name.to_lowercase()).ok_or_else(|| {
        let valid: Vec<_> = AudioCodec::all().map(|c| c.as_str()).collect();
        VlcError::Config(format!("Invalid audio codec '{}'. Valid values: {}", name, valid.join(", ")))
            .into()
    })
}

fn parse_video_codec(name: &str) -> Result<VideoCodec> {
    VideoCodec::from_engine(&name.to_lowercase()).ok_or_else(|| {
        let valid: Vec<_> = VideoCodec::all().map(|c| c.as_str()).collect();
        VlcError::Config(format!("Invalid video codec '{}'. Valid values: {}", name, valid.join(", ")))
            .into()
    })
}

fn parse_ratio(name: &str) -> Result<Ratio> {
    let ratio = if name.eq_ignore_ascii_case("original") {
        Ratio::Original
    } else {
        Ratio::from_engine(Some(name))
    };
    match ratio {
        Ratio::Unknown => Err(VlcError::Config(format!("Invalid aspect ratio '{}'", name)).into()),
        ratio => Ok(ratio),
    }
}

fn parse_deinterlace(name: &str) -> Result<Deinterlacing> {
    let value = if name.eq_ignore_ascii_case("off") { None } else { Some(name) };
    Deinterlacing::from_engine(value).ok_or_else(|| {
        let valid: Vec<_> = Deinterlacing::all().filter_map(|d| d.as_engine()).collect();
        VlcError::Config(format!(
            "Invalid deinterlace filter '{}'. Valid values: off, {}",
            name,
            valid.join(", ")
        ))
        .into()
    })
}

/// Split `field=value`, matching the field name case-insensitively
fn parse_assignment(assignment: &str) -> Result<(Meta, &str)> {
    let (field, value) = assignment
        .split_once('=')
        .ok_or_else(|| VlcError::Config(format!("Expected field=value, got '{}'", assignment)))?;
    let meta = Meta::all()
        .find(|m| format!("{:?}", m).eq_ignore_ascii_case(field.trim()))
        .ok_or_else(|| VlcError::Config(format!("Unknown metadata field '{}'", field)))?;
    Ok((meta, value))
}
