use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Engine backend, overriding the configuration (memory, libvlc)
    #[arg(long)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a file or stream until it ends
    Play {
        /// Local path, or a URL with --remote
        input: String,

        /// Treat the input as a URL instead of a local path
        #[arg(long)]
        remote: bool,

        /// Volume in percent (0-200)
        #[arg(long)]
        volume: Option<i32>,

        /// Aspect ratio preset, e.g. 16:9
        #[arg(long)]
        aspect: Option<String>,

        /// Deinterlace filter, e.g. yadif
        #[arg(long)]
        deinterlace: Option<String>,

        /// External subtitle file
        #[arg(long)]
        subtitles: Option<PathBuf>,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Record a file or stream to disk
    Record {
        /// Local path, or a URL with --remote
        input: String,

        /// Output file name, without extension
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        remote: bool,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Container (ts, ps, mp4, ogg, avi)
        #[arg(short, long)]
        mux: Option<String>,

        /// Audio codec to transcode to (none, mpga, mp3, mp4a, vorb, flac)
        #[arg(long)]
        audio_codec: Option<String>,

        /// Video codec to transcode to (none, mp2v, mp4v, h264, theo)
        #[arg(long)]
        video_codec: Option<String>,

        /// Keep displaying the stream while recording
        #[arg(long)]
        duplicate: bool,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// List the video, audio and subtitle tracks of a media
    Tracks {
        input: String,

        #[arg(long)]
        remote: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change the metadata of a media
    Meta {
        input: String,

        /// Set a field, e.g. --set title=Intro (repeatable)
        #[arg(long)]
        set: Vec<String>,

        /// Write the changes back to the file
        #[arg(long)]
        save: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show connector and engine versions
    Version,
}
