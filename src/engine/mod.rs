// Native engine boundary
//
// The rest of the crate reaches the playback engine only through the
// `Engine` trait. Every method is one native call: handles go in, plain
// values come out, and failures are left in the engine's error slot for
// `ErrorReporter` to collect. Two backends are provided:
// - Memory: in-process engine with simulated transport, used by tests and dry runs
// - LibVlc: the system libvlc through the `vlc` crate (cargo feature `libvlc`)

pub mod memory;
#[cfg(feature = "libvlc")]
pub mod libvlc;

use crossbeam_channel::Sender;
use tracing::info;

pub use memory::{MediaProfile, MemoryEngine};

use crate::config::{EngineBackend, EngineConfig};
use crate::enums::{Meta, State};
use crate::error::{Result, VlcError};

/// Engine instance handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u64);

/// Media handle; each handle value carries one engine reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaHandle(u64);

/// Player handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerHandle(u64);

macro_rules! raw_handle {
    ($($name:ident),*) => {
        $(
            impl $name {
                /// Rebuild a handle from a backend registry key
                pub fn from_raw(raw: u64) -> Self {
                    Self(raw)
                }

                pub fn raw(&self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

raw_handle!(InstanceHandle, MediaHandle, PlayerHandle);

/// One node of the engine's track description list
///
/// The engine hands these out as a singly linked list in engine order; the
/// first node is usually the "Disable" pseudo-track with id `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescription {
    pub id: i32,
    pub name: String,
    pub next: Option<Box<TrackDescription>>,
}

impl TrackDescription {
    /// Build a list from `(id, name)` pairs; `None` when there are no pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i32, S)>,
        I::IntoIter: DoubleEndedIterator,
        S: Into<String>,
    {
        pairs.into_iter().rev().fold(None, |next, (id, name)| {
            Some(TrackDescription {
                id,
                name: name.into(),
                next: next.map(Box::new),
            })
        })
    }

    pub fn next(&self) -> Option<&TrackDescription> {
        self.next.as_deref()
    }
}

/// Notification emitted by the engine for a player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    MediaChanged,
    Opening,
    Buffering(f32),
    Playing,
    Paused,
    Stopped,
    EndReached,
    EncounteredError,
    TimeChanged(i64),
    PositionChanged(f32),
    LengthChanged(i64),
    SeekableChanged(bool),
}

impl PlayerEvent {
    /// Player state this event moves to, if it is a state change
    pub fn state(&self) -> Option<State> {
        match self {
            PlayerEvent::MediaChanged => Some(State::Idle),
            PlayerEvent::Opening => Some(State::Opening),
            PlayerEvent::Buffering(_) => Some(State::Buffering),
            PlayerEvent::Playing => Some(State::Playing),
            PlayerEvent::Paused => Some(State::Paused),
            PlayerEvent::Stopped => Some(State::Stopped),
            PlayerEvent::EndReached => Some(State::Ended),
            PlayerEvent::EncounteredError => Some(State::Error),
            _ => None,
        }
    }
}

/// Handle-based call boundary of the native playback engine
///
/// String arguments that the engine accepts as "unset" (aspect ratio, crop
/// geometry, deinterlace filter) use the empty string for that meaning.
#[cfg_attr(test, mockall::automock)]
pub trait Engine {
    /// Pending error message of the last failed call
    fn errmsg(&self) -> Option<String>;
    fn clearerr(&self);

    fn instance_new(&self, args: &[String]) -> Option<InstanceHandle>;
    fn instance_release(&self, instance: InstanceHandle);
    /// Engine version string
    fn version(&self) -> String;
    fn set_user_agent(&self, instance: InstanceHandle, name: &str, http: &str);

    fn media_new_path(&self, instance: InstanceHandle, path: &str) -> Option<MediaHandle>;
    fn media_new_location(&self, instance: InstanceHandle, mrl: &str) -> Option<MediaHandle>;
    fn media_release(&self, media: MediaHandle);
    fn media_mrl(&self, media: MediaHandle) -> Option<String>;
    fn media_add_option(&self, media: MediaHandle, option: &str);
    fn media_meta(&self, media: MediaHandle, meta: Meta) -> Option<String>;
    fn media_set_meta(&self, media: MediaHandle, meta: Meta, value: &str);
    fn media_save_meta(&self, media: MediaHandle) -> bool;

    fn player_new(&self, instance: InstanceHandle) -> Option<PlayerHandle>;
    fn player_release(&self, player: PlayerHandle);
    /// Bind a media (the player takes its own reference) or unbind with `None`
    fn player_set_media(&self, player: PlayerHandle, media: Option<MediaHandle>);
    /// Currently bound media; the returned handle carries a fresh reference
    fn player_media(&self, player: PlayerHandle) -> Option<MediaHandle>;
    fn player_attach_events(&self, player: PlayerHandle, sender: Sender<PlayerEvent>) -> bool;
    fn player_play(&self, player: PlayerHandle) -> i32;
    fn player_set_pause(&self, player: PlayerHandle, pause: bool);
    fn player_stop(&self, player: PlayerHandle);
    fn player_state(&self, player: PlayerHandle) -> State;
    fn player_length(&self, player: PlayerHandle) -> i64;
    fn player_time(&self, player: PlayerHandle) -> i64;
    fn player_set_time(&self, player: PlayerHandle, time: i64);
    fn player_position(&self, player: PlayerHandle) -> f32;
    fn player_set_position(&self, player: PlayerHandle, position: f32);
    fn player_is_seekable(&self, player: PlayerHandle) -> bool;

    fn audio_volume(&self, player: PlayerHandle) -> i32;
    fn audio_set_volume(&self, player: PlayerHandle, volume: i32) -> i32;
    fn audio_mute(&self, player: PlayerHandle) -> i32;
    fn audio_set_mute(&self, player: PlayerHandle, mute: bool);
    fn audio_toggle_mute(&self, player: PlayerHandle);
    fn audio_track_count(&self, player: PlayerHandle) -> i32;
    fn audio_track(&self, player: PlayerHandle) -> i32;
    fn audio_set_track(&self, player: PlayerHandle, track: i32) -> i32;
    fn audio_track_description(&self, player: PlayerHandle) -> Option<TrackDescription>;

    fn video_track_count(&self, player: PlayerHandle) -> i32;
    fn video_track(&self, player: PlayerHandle) -> i32;
    fn video_set_track(&self, player: PlayerHandle, track: i32) -> i32;
    fn video_track_description(&self, player: PlayerHandle) -> Option<TrackDescription>;
    fn video_spu_count(&self, player: PlayerHandle) -> i32;
    fn video_spu(&self, player: PlayerHandle) -> i32;
    fn video_set_spu(&self, player: PlayerHandle, spu: i32) -> i32;
    fn video_spu_description(&self, player: PlayerHandle) -> Option<TrackDescription>;
    fn video_set_subtitle_file(&self, player: PlayerHandle, path: &str) -> bool;
    fn video_aspect_ratio(&self, player: PlayerHandle) -> Option<String>;
    fn video_set_aspect_ratio(&self, player: PlayerHandle, ratio: &str);
    fn video_crop_geometry(&self, player: PlayerHandle) -> Option<String>;
    fn video_set_crop_geometry(&self, player: PlayerHandle, geometry: &str);
    fn video_set_deinterlace(&self, player: PlayerHandle, mode: &str);
    fn video_teletext(&self, player: PlayerHandle) -> i32;
    fn video_set_teletext(&self, player: PlayerHandle, page: i32);
    fn video_toggle_teletext(&self, player: PlayerHandle);
}

/// Engine implementation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineImplementation {
    Memory,
    LibVlc,
}

impl From<EngineBackend> for EngineImplementation {
    fn from(backend: EngineBackend) -> Self {
        match backend {
            EngineBackend::Memory => EngineImplementation::Memory,
            EngineBackend::Libvlc => EngineImplementation::LibVlc,
        }
    }
}

/// Factory for creating engine backends
pub struct EngineFactory;

impl EngineFactory {
    /// Create an engine based on implementation type
    pub fn create_engine(implementation: EngineImplementation) -> Result<Box<dyn Engine>> {
        match implementation {
            EngineImplementation::Memory => Ok(Box::new(MemoryEngine::new())),
            EngineImplementation::LibVlc => Self::create_libvlc(),
        }
    }

    /// Create the engine selected by configuration
    pub fn from_config(config: &EngineConfig) -> Result<Box<dyn Engine>> {
        info!("Selecting engine backend: {:?}", config.backend);
        Self::create_engine(config.backend.into())
    }

    #[cfg(feature = "libvlc")]
    fn create_libvlc() -> Result<Box<dyn Engine>> {
        Ok(Box::new(libvlc::LibVlcEngine::new()))
    }

    #[cfg(not(feature = "libvlc"))]
    fn create_libvlc() -> Result<Box<dyn Engine>> {
        Err(VlcError::UnsupportedBackend(
            "libvlc (rebuild with --features libvlc)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_description_from_pairs_keeps_order() {
        let list = TrackDescription::from_pairs(vec![(-1, "Disable"), (3, "English"), (4, "French")])
            .unwrap();
        assert_eq!(list.id, -1);
        let second = list.next().unwrap();
        assert_eq!(second.name, "English");
        assert_eq!(second.next().unwrap().id, 4);
        assert!(second.next().unwrap().next().is_none());
    }

    #[test]
    fn test_track_description_from_no_pairs() {
        assert!(TrackDescription::from_pairs(Vec::<(i32, String)>::new()).is_none());
    }

    #[test]
    fn test_event_states() {
        assert_eq!(PlayerEvent::Opening.state(), Some(State::Opening));
        assert_eq!(PlayerEvent::EndReached.state(), Some(State::Ended));
        assert_eq!(PlayerEvent::TimeChanged(10).state(), None);
    }

    #[test]
    fn test_factory_creates_memory_engine() {
        let engine = EngineFactory::create_engine(EngineImplementation::Memory).unwrap();
        assert!(engine.version().contains("memory"));
    }

    #[cfg(not(feature = "libvlc"))]
    #[test]
    fn test_factory_rejects_libvlc_without_feature() {
        let result = EngineFactory::create_engine(EngineImplementation::LibVlc);
        assert!(matches!(result, Err(VlcError::UnsupportedBackend(_))));
    }
}
