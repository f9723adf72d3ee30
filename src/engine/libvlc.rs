// libvlc backend (cargo feature `libvlc`)
//
// Objects are owned through the `vlc` crate's `Instance`, `Media` and
// `MediaPlayer`, which release their native reference on drop. Calls the safe
// API does not cover (error slot, track lists, spu, teletext, geometry) go
// through `vlc::sys` on the objects' raw pointers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crossbeam_channel::Sender;
use tracing::{debug, warn};
use vlc::{sys, EventType, MediaPlayerAudioEx};

use super::{Engine, InstanceHandle, MediaHandle, PlayerEvent, PlayerHandle, TrackDescription};
use crate::enums::{Meta, State};

/// Events forwarded to the player's channel. Time, position and length are
/// polled rather than pushed.
const PLAYER_EVENTS: [EventType; 8] = [
    EventType::MediaPlayerMediaChanged,
    EventType::MediaPlayerOpening,
    EventType::MediaPlayerBuffering,
    EventType::MediaPlayerPlaying,
    EventType::MediaPlayerPaused,
    EventType::MediaPlayerStopped,
    EventType::MediaPlayerEndReached,
    EventType::MediaPlayerEncounteredError,
];

#[derive(Default)]
struct Registry {
    next_id: u64,
    instances: HashMap<u64, vlc::Instance>,
    /// One `vlc::Media` per handle, so each handle owns one native reference
    media: HashMap<u64, vlc::Media>,
    players: HashMap<u64, vlc::MediaPlayer>,
    /// Error for handles this backend does not know
    error: Option<String>,
}

impl Registry {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn add_media(&mut self, media: Option<vlc::Media>) -> Option<MediaHandle> {
        let media = media?;
        let id = self.allocate();
        self.media.insert(id, media);
        Some(MediaHandle::from_raw(id))
    }
}

/// Engine backed by the system libvlc
///
/// Not `Send`: libvlc objects are only touched from the thread that owns the
/// registry. Player events arrive on libvlc's own threads and are forwarded
/// through crossbeam channels.
pub struct LibVlcEngine {
    registry: RefCell<Registry>,
}

impl Default for LibVlcEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LibVlcEngine {
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry::default()),
        }
    }

    fn fail(&self, message: &str) {
        self.registry.borrow_mut().error = Some(message.to_string());
    }

    fn with_instance<T>(&self, instance: InstanceHandle, default: T, f: impl FnOnce(&vlc::Instance) -> T) -> T {
        let registry = self.registry.borrow();
        match registry.instances.get(&instance.raw()) {
            Some(instance) => f(instance),
            None => {
                drop(registry);
                self.fail("Invalid instance handle");
                default
            }
        }
    }

    fn with_media<T>(&self, media: MediaHandle, default: T, f: impl FnOnce(&vlc::Media) -> T) -> T {
        let registry = self.registry.borrow();
        match registry.media.get(&media.raw()) {
            Some(media) => f(media),
            None => {
                drop(registry);
                self.fail("Invalid media handle");
                default
            }
        }
    }

    fn with_player<T>(&self, player: PlayerHandle, default: T, f: impl FnOnce(&vlc::MediaPlayer) -> T) -> T {
        let registry = self.registry.borrow();
        match registry.players.get(&player.raw()) {
            Some(player) => f(player),
            None => {
                drop(registry);
                self.fail("Invalid player handle");
                default
            }
        }
    }

    fn media_player_new(&self, instance: InstanceHandle) -> Option<vlc::MediaPlayer> {
        self.with_instance(instance, None, vlc::MediaPlayer::new)
    }
}

fn translate(event: vlc::Event) -> Option<PlayerEvent> {
    match event {
        vlc::Event::MediaPlayerMediaChanged => Some(PlayerEvent::MediaChanged),
        vlc::Event::MediaPlayerOpening => Some(PlayerEvent::Opening),
        vlc::Event::MediaPlayerBuffering(cache) => Some(PlayerEvent::Buffering(cache)),
        vlc::Event::MediaPlayerPlaying => Some(PlayerEvent::Playing),
        vlc::Event::MediaPlayerPaused => Some(PlayerEvent::Paused),
        vlc::Event::MediaPlayerStopped => Some(PlayerEvent::Stopped),
        vlc::Event::MediaPlayerEndReached => Some(PlayerEvent::EndReached),
        vlc::Event::MediaPlayerEncounteredError => Some(PlayerEvent::EncounteredError),
        _ => None,
    }
}

fn to_state(state: vlc::State) -> State {
    match state {
        vlc::State::Opening => State::Opening,
        vlc::State::Buffering => State::Buffering,
        vlc::State::Playing => State::Playing,
        vlc::State::Paused => State::Paused,
        vlc::State::Stopped => State::Stopped,
        vlc::State::Ended => State::Ended,
        vlc::State::Error => State::Error,
        _ => State::Idle,
    }
}

fn to_meta(meta: Meta) -> vlc::Meta {
    match meta {
        Meta::Title => vlc::Meta::Title,
        Meta::Artist => vlc::Meta::Artist,
        Meta::Genre => vlc::Meta::Genre,
        Meta::Copyright => vlc::Meta::Copyright,
        Meta::Album => vlc::Meta::Album,
        Meta::TrackNumber => vlc::Meta::TrackNumber,
        Meta::Description => vlc::Meta::Description,
        Meta::Rating => vlc::Meta::Rating,
        Meta::Date => vlc::Meta::Date,
        Meta::Setting => vlc::Meta::Setting,
        Meta::Url => vlc::Meta::URL,
        Meta::Language => vlc::Meta::Language,
        Meta::NowPlaying => vlc::Meta::NowPlaying,
        Meta::Publisher => vlc::Meta::Publisher,
        Meta::EncodedBy => vlc::Meta::EncodedBy,
        Meta::ArtworkUrl => vlc::Meta::ArtworkURL,
        Meta::TrackId => vlc::Meta::TrackID,
    }
}

fn to_cstring(value: &str) -> CString {
    CString::new(value.replace('\0', "")).unwrap_or_default()
}

/// Empty strings mean "unset" and are passed as NULL
fn optional_cstring(value: &str) -> Option<CString> {
    (!value.is_empty()).then(|| to_cstring(value))
}

/// Copy a libvlc-owned string and free it
fn take_string(raw: *mut c_char) -> Option<String> {
    if raw.is_null() {
        return None;
    }
    // SAFETY: non-null strings returned by libvlc getters are NUL terminated
    // and must be released with `libvlc_free`.
    unsafe {
        let value = CStr::from_ptr(raw).to_string_lossy().into_owned();
        sys::libvlc_free(raw.cast());
        Some(value)
    }
}

/// Copy a native track description list into an owned one and release it
fn take_descriptions(raw: *mut sys::libvlc_track_description_t) -> Option<TrackDescription> {
    let mut pairs = Vec::new();
    let mut node = raw;
    // SAFETY: the list is ours until released below; nodes are only read
    // while it is alive.
    unsafe {
        while !node.is_null() {
            let name = if (*node).psz_name.is_null() {
                String::new()
            } else {
                CStr::from_ptr((*node).psz_name).to_string_lossy().into_owned()
            };
            pairs.push(((*node).i_id, name));
            node = (*node).p_next;
        }
        if !raw.is_null() {
            sys::libvlc_track_description_list_release(raw);
        }
    }
    TrackDescription::from_pairs(pairs)
}

impl Engine for LibVlcEngine {
    fn errmsg(&self) -> Option<String> {
        if let Some(message) = self.registry.borrow().error.clone() {
            return Some(message);
        }
        // SAFETY: libvlc_errmsg returns a thread-local string or NULL.
        unsafe {
            let raw = sys::libvlc_errmsg();
            if raw.is_null() {
                None
            } else {
                Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
            }
        }
    }

    fn clearerr(&self) {
        self.registry.borrow_mut().error = None;
        // SAFETY: no arguments; clears libvlc's thread-local error.
        unsafe { sys::libvlc_clearerr() }
    }

    fn instance_new(&self, args: &[String]) -> Option<InstanceHandle> {
        let instance = vlc::Instance::with_args(Some(args.to_vec()))?;
        let mut registry = self.registry.borrow_mut();
        let id = registry.allocate();
        registry.instances.insert(id, instance);
        debug!("libvlc instance {} created", id);
        Some(InstanceHandle::from_raw(id))
    }

    fn instance_release(&self, instance: InstanceHandle) {
        if self.registry.borrow_mut().instances.remove(&instance.raw()).is_none() {
            warn!("release of unknown libvlc instance {}", instance.raw());
        }
    }

    fn version(&self) -> String {
        vlc::version()
    }

    fn set_user_agent(&self, instance: InstanceHandle, name: &str, http: &str) {
        self.with_instance(instance, (), |instance| {
            let (name, http) = (to_cstring(name), to_cstring(http));
            // SAFETY: live instance; both strings outlive the call and are copied.
            unsafe { sys::libvlc_set_user_agent(instance.raw(), name.as_ptr(), http.as_ptr()) }
        })
    }

    fn media_new_path(&self, instance: InstanceHandle, path: &str) -> Option<MediaHandle> {
        let media = self.with_instance(instance, None, |instance| vlc::Media::new_path(instance, path));
        self.registry.borrow_mut().add_media(media)
    }

    fn media_new_location(&self, instance: InstanceHandle, mrl: &str) -> Option<MediaHandle> {
        let media = self.with_instance(instance, None, |instance| vlc::Media::new_location(instance, mrl));
        self.registry.borrow_mut().add_media(media)
    }

    fn media_release(&self, media: MediaHandle) {
        if self.registry.borrow_mut().media.remove(&media.raw()).is_none() {
            self.fail("Invalid media handle");
        }
    }

    fn media_mrl(&self, media: MediaHandle) -> Option<String> {
        self.with_media(media, None, |media| media.mrl())
    }

    fn media_add_option(&self, media: MediaHandle, option: &str) {
        self.with_media(media, (), |media| {
            let option = to_cstring(option);
            // SAFETY: live media; libvlc copies the option string.
            unsafe { sys::libvlc_media_add_option(media.raw(), option.as_ptr()) }
        })
    }

    fn media_meta(&self, media: MediaHandle, meta: Meta) -> Option<String> {
        self.with_media(media, None, |media| media.get_meta(to_meta(meta)))
    }

    fn media_set_meta(&self, media: MediaHandle, meta: Meta, value: &str) {
        self.with_media(media, (), |media| media.set_meta(to_meta(meta), value))
    }

    fn media_save_meta(&self, media: MediaHandle) -> bool {
        self.with_media(media, false, |media| media.save_meta())
    }

    fn player_new(&self, instance: InstanceHandle) -> Option<PlayerHandle> {
        let player = self.media_player_new(instance)?;
        let mut registry = self.registry.borrow_mut();
        let id = registry.allocate();
        registry.players.insert(id, player);
        Some(PlayerHandle::from_raw(id))
    }

    fn player_release(&self, player: PlayerHandle) {
        if self.registry.borrow_mut().players.remove(&player.raw()).is_none() {
            self.fail("Invalid player handle");
        }
    }

    fn player_set_media(&self, player: PlayerHandle, media: Option<MediaHandle>) {
        let registry = self.registry.borrow();
        let Some(target) = registry.players.get(&player.raw()) else {
            drop(registry);
            return self.fail("Invalid player handle");
        };
        match media {
            Some(handle) => match registry.media.get(&handle.raw()) {
                Some(media) => target.set_media(media),
                None => {
                    drop(registry);
                    self.fail("Invalid media handle");
                }
            },
            // SAFETY: live player; a NULL media unbinds it.
            None => unsafe { sys::libvlc_media_player_set_media(target.raw(), ptr::null_mut()) },
        }
    }

    fn player_media(&self, player: PlayerHandle) -> Option<MediaHandle> {
        let media = self.with_player(player, None, |player| player.get_media());
        self.registry.borrow_mut().add_media(media)
    }

    fn player_attach_events(&self, player: PlayerHandle, sender: Sender<PlayerEvent>) -> bool {
        self.with_player(player, false, |player| {
            let manager = player.event_manager();
            PLAYER_EVENTS.into_iter().all(|kind| {
                let sender = sender.clone();
                manager
                    .attach(kind, move |event, _| {
                        if let Some(event) = translate(event) {
                            let _ = sender.send(event);
                        }
                    })
                    .is_ok()
            })
        })
    }

    fn player_play(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |player| if player.play().is_ok() { 0 } else { -1 })
    }

    fn player_set_pause(&self, player: PlayerHandle, pause: bool) {
        self.with_player(player, (), |player| player.set_pause(pause))
    }

    fn player_stop(&self, player: PlayerHandle) {
        self.with_player(player, (), |player| player.stop())
    }

    fn player_state(&self, player: PlayerHandle) -> State {
        self.with_player(player, State::Idle, |player| to_state(player.state()))
    }

    fn player_length(&self, player: PlayerHandle) -> i64 {
        // SAFETY: live player.
        self.with_player(player, -1, |player| unsafe { sys::libvlc_media_player_get_length(player.raw()) })
    }

    fn player_time(&self, player: PlayerHandle) -> i64 {
        self.with_player(player, -1, |player| player.get_time().unwrap_or(-1))
    }

    fn player_set_time(&self, player: PlayerHandle, time: i64) {
        self.with_player(player, (), |player| player.set_time(time))
    }

    fn player_position(&self, player: PlayerHandle) -> f32 {
        self.with_player(player, -1.0, |player| player.get_position().unwrap_or(-1.0))
    }

    fn player_set_position(&self, player: PlayerHandle, position: f32) {
        self.with_player(player, (), |player| player.set_position(position))
    }

    fn player_is_seekable(&self, player: PlayerHandle) -> bool {
        self.with_player(player, false, |player| player.is_seekable())
    }

    fn audio_volume(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |player| player.get_volume())
    }

    fn audio_set_volume(&self, player: PlayerHandle, volume: i32) -> i32 {
        self.with_player(player, -1, |player| if player.set_volume(volume).is_ok() { 0 } else { -1 })
    }

    fn audio_mute(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |player| player.get_mute().map_or(-1, i32::from))
    }

    fn audio_set_mute(&self, player: PlayerHandle, mute: bool) {
        self.with_player(player, (), |player| player.set_mute(mute))
    }

    fn audio_toggle_mute(&self, player: PlayerHandle) {
        self.with_player(player, (), |player| player.toggle_mute())
    }

    // SAFETY for the raw calls below: `with_player` only hands out live players.

    fn audio_track_count(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_audio_get_track_count(p.raw()) })
    }

    fn audio_track(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_audio_get_track(p.raw()) })
    }

    fn audio_set_track(&self, player: PlayerHandle, track: i32) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_audio_set_track(p.raw(), track) })
    }

    fn audio_track_description(&self, player: PlayerHandle) -> Option<TrackDescription> {
        self.with_player(player, None, |p| {
            take_descriptions(unsafe { sys::libvlc_audio_get_track_description(p.raw()) })
        })
    }

    fn video_track_count(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_video_get_track_count(p.raw()) })
    }

    fn video_track(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_video_get_track(p.raw()) })
    }

    fn video_set_track(&self, player: PlayerHandle, track: i32) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_video_set_track(p.raw(), track) })
    }

    fn video_track_description(&self, player: PlayerHandle) -> Option<TrackDescription> {
        self.with_player(player, None, |p| {
            take_descriptions(unsafe { sys::libvlc_video_get_track_description(p.raw()) })
        })
    }

    fn video_spu_count(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_video_get_spu_count(p.raw()) })
    }

    fn video_spu(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_video_get_spu(p.raw()) })
    }

    fn video_set_spu(&self, player: PlayerHandle, spu: i32) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_video_set_spu(p.raw(), spu) })
    }

    fn video_spu_description(&self, player: PlayerHandle) -> Option<TrackDescription> {
        self.with_player(player, None, |p| {
            take_descriptions(unsafe { sys::libvlc_video_get_spu_description(p.raw()) })
        })
    }

    fn video_set_subtitle_file(&self, player: PlayerHandle, path: &str) -> bool {
        let path = to_cstring(path);
        self.with_player(player, false, |p| unsafe {
            sys::libvlc_video_set_subtitle_file(p.raw(), path.as_ptr()) != 0
        })
    }

    fn video_aspect_ratio(&self, player: PlayerHandle) -> Option<String> {
        self.with_player(player, None, |p| {
            take_string(unsafe { sys::libvlc_video_get_aspect_ratio(p.raw()) })
        })
    }

    fn video_set_aspect_ratio(&self, player: PlayerHandle, ratio: &str) {
        let ratio = optional_cstring(ratio);
        self.with_player(player, (), |p| unsafe {
            sys::libvlc_video_set_aspect_ratio(p.raw(), ratio.as_ref().map_or(ptr::null(), |r| r.as_ptr()))
        })
    }

    fn video_crop_geometry(&self, player: PlayerHandle) -> Option<String> {
        self.with_player(player, None, |p| {
            take_string(unsafe { sys::libvlc_video_get_crop_geometry(p.raw()) })
        })
    }

    fn video_set_crop_geometry(&self, player: PlayerHandle, geometry: &str) {
        let geometry = optional_cstring(geometry);
        self.with_player(player, (), |p| unsafe {
            sys::libvlc_video_set_crop_geometry(p.raw(), geometry.as_ref().map_or(ptr::null(), |g| g.as_ptr()))
        })
    }

    fn video_set_deinterlace(&self, player: PlayerHandle, mode: &str) {
        let mode = optional_cstring(mode);
        self.with_player(player, (), |p| unsafe {
            sys::libvlc_video_set_deinterlace(p.raw(), mode.as_ref().map_or(ptr::null(), |m| m.as_ptr()))
        })
    }

    fn video_teletext(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |p| unsafe { sys::libvlc_video_get_teletext(p.raw()) })
    }

    fn video_set_teletext(&self, player: PlayerHandle, page: i32) {
        self.with_player(player, (), |p| unsafe { sys::libvlc_video_set_teletext(p.raw(), page) })
    }

    fn video_toggle_teletext(&self, player: PlayerHandle) {
        self.with_player(player, (), |p| unsafe { sys::libvlc_toggle_teletext(p.raw()) })
    }
}

impl Drop for LibVlcEngine {
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        // Players hold media references, and both hold the instance
        registry.players.clear();
        registry.media.clear();
        registry.instances.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_and_states_translate() {
        assert_eq!(
            translate(vlc::Event::MediaPlayerBuffering(42.0)),
            Some(PlayerEvent::Buffering(42.0))
        );
        assert_eq!(translate(vlc::Event::MediaPlayerEndReached), Some(PlayerEvent::EndReached));
        assert_eq!(to_state(vlc::State::NothingSpecial), State::Idle);
        assert_eq!(to_state(vlc::State::Ended), State::Ended);
    }

    #[test]
    fn test_unknown_handles_fill_the_error_slot() {
        let engine = LibVlcEngine::new();
        engine.media_release(MediaHandle::from_raw(7));
        assert_eq!(engine.errmsg().as_deref(), Some("Invalid media handle"));
        engine.clearerr();
        assert_eq!(engine.player_play(PlayerHandle::from_raw(7)), -1);
        assert_eq!(engine.errmsg().as_deref(), Some("Invalid player handle"));
        engine.clearerr();
    }

    #[test]
    fn test_empty_strings_are_passed_as_null() {
        assert!(optional_cstring("").is_none());
        assert_eq!(optional_cstring("16:9").unwrap().to_str().ok(), Some("16:9"));
        assert_eq!(to_cstring("a\0b").to_str().ok(), Some("ab"));
    }
}
