//! vlc-connector - Object-oriented playback core over the VLC engine
//!
//! An [`Instance`] owns the engine; [`Media`] and [`MediaPlayer`] borrow it.
//! The [`Video`], [`Audio`] and [`Subtitle`] facets are narrow views over a
//! player's handle. Failing calls never panic or return errors: they answer
//! with a documented sentinel and leave the error in [`ErrorReporter`].

pub mod audio;
pub mod cli;
pub mod config;
pub mod engine;
pub mod enums;
pub mod error;
pub mod instance;
pub mod media;
pub mod meta;
pub mod player;
pub mod subtitle;
pub mod tracks;
pub mod video;

pub use audio::Audio;
pub use enums::{AudioCodec, Deinterlacing, Meta, Mux, Ratio, State, VideoCodec};
pub use error::{ErrorReporter, Result, VlcError};
pub use instance::Instance;
pub use media::Media;
pub use meta::MetaManager;
pub use player::{MediaPlayer, PlayerCore};
pub use subtitle::Subtitle;
pub use tracks::Track;
pub use video::Video;
