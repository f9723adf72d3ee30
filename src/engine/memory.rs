use std::cell::RefCell;
use std::collections::HashMap;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use super::{Engine, InstanceHandle, MediaHandle, PlayerEvent, PlayerHandle, TrackDescription};
use crate::enums::{Meta, State};

/// What the memory engine pretends to find inside a media resource
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProfile {
    /// Duration in milliseconds
    pub length: i64,
    pub seekable: bool,
    /// Opening the resource fails and the player lands in `Error`
    pub broken: bool,
    pub video_tracks: Vec<(i32, String)>,
    pub audio_tracks: Vec<(i32, String)>,
    pub subtitle_tracks: Vec<(i32, String)>,
}

impl Default for MediaProfile {
    fn default() -> Self {
        Self {
            length: 60_000,
            seekable: true,
            broken: false,
            video_tracks: vec![(-1, "Disable".to_string()), (0, "Track 1".to_string())],
            audio_tracks: vec![(-1, "Disable".to_string()), (1, "Track 1".to_string())],
            subtitle_tracks: Vec::new(),
        }
    }
}

impl MediaProfile {
    /// Profile of a resource that cannot be opened
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }
}

struct MediaEntry {
    mrl: String,
    options: Vec<String>,
    meta: HashMap<Meta, String>,
    profile: MediaProfile,
    refs: u32,
}

struct PlayerEntry {
    media: Option<u64>,
    state: State,
    time: i64,
    volume: i32,
    muted: bool,
    video_track: i32,
    audio_track: i32,
    spu: i32,
    extra_subtitles: Vec<(i32, String)>,
    aspect_ratio: Option<String>,
    crop_geometry: Option<String>,
    deinterlace: Option<String>,
    teletext_page: i32,
    teletext_transparent: bool,
    senders: Vec<Sender<PlayerEvent>>,
}

impl PlayerEntry {
    fn new() -> Self {
        Self {
            media: None,
            state: State::Idle,
            time: 0,
            volume: 100,
            muted: false,
            video_track: -1,
            audio_track: -1,
            spu: -1,
            extra_subtitles: Vec::new(),
            aspect_ratio: None,
            crop_geometry: None,
            deinterlace: None,
            teletext_page: 100,
            teletext_transparent: false,
            senders: Vec::new(),
        }
    }

    /// An input exists once the media has been opened and until it stops
    fn has_input(&self) -> bool {
        matches!(
            self.state,
            State::Opening | State::Buffering | State::Playing | State::Paused
        )
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    calls: u64,
    error: Option<String>,
    user_agent: Option<(String, String)>,
    instances: HashMap<u64, Vec<String>>,
    media: HashMap<u64, MediaEntry>,
    players: HashMap<u64, PlayerEntry>,
    profiles: HashMap<String, MediaProfile>,
}

impl Registry {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("memory engine error: {}", message);
        self.error = Some(message);
    }

    fn new_media(&mut self, instance: InstanceHandle, source: &str, mrl: String) -> Option<MediaHandle> {
        if !self.instances.contains_key(&instance.raw()) {
            self.fail("Invalid instance handle");
            return None;
        }
        if source.is_empty() {
            self.fail("Cannot create media from an empty location");
            return None;
        }
        let profile = self.profiles.get(source).cloned().unwrap_or_default();
        let id = self.allocate();
        self.media.insert(
            id,
            MediaEntry {
                mrl,
                options: Vec::new(),
                meta: HashMap::new(),
                profile,
                refs: 1,
            },
        );
        Some(MediaHandle::from_raw(id))
    }

    fn release_media(&mut self, id: u64) {
        let gone = match self.media.get_mut(&id) {
            Some(entry) => {
                entry.refs = entry.refs.saturating_sub(1);
                entry.refs == 0
            }
            None => {
                self.fail("Invalid media handle");
                false
            }
        };
        if gone {
            self.media.remove(&id);
        }
    }

    fn player(&mut self, player: PlayerHandle) -> Option<&mut PlayerEntry> {
        if self.players.contains_key(&player.raw()) {
            self.players.get_mut(&player.raw())
        } else {
            self.fail("Invalid player handle");
            None
        }
    }

    /// Player and the profile of its bound media
    fn player_with_profile(&mut self, player: PlayerHandle) -> Option<(&mut PlayerEntry, Option<MediaProfile>)> {
        let media = self.player(player)?.media;
        let profile = media.and_then(|id| self.media.get(&id)).map(|m| m.profile.clone());
        self.players.get_mut(&player.raw()).map(|p| (p, profile))
    }

    fn open(&mut self, player: PlayerHandle) -> i32 {
        let Some((entry, profile)) = self.player_with_profile(player) else {
            return -1;
        };
        let Some(profile) = profile else {
            self.fail("No media to play");
            return -1;
        };

        match entry.state {
            State::Playing | State::Opening | State::Buffering => return 0,
            State::Paused => {
                entry.state = State::Playing;
                entry.emit(PlayerEvent::Playing);
                return 0;
            }
            _ => {}
        }

        entry.time = 0;
        entry.state = State::Opening;
        entry.emit(PlayerEvent::Opening);

        if profile.broken {
            entry.state = State::Error;
            entry.emit(PlayerEvent::EncounteredError);
            return 0;
        }

        entry.state = State::Playing;
        entry.video_track = first_track(&profile.video_tracks);
        entry.audio_track = first_track(&profile.audio_tracks);
        entry.spu = -1;
        entry.emit(PlayerEvent::Playing);
        entry.emit(PlayerEvent::LengthChanged(profile.length));
        entry.emit(PlayerEvent::SeekableChanged(profile.seekable));
        0
    }

    fn seek(&mut self, player: PlayerHandle, target: impl FnOnce(i64) -> i64) {
        let Some((entry, profile)) = self.player_with_profile(player) else {
            return;
        };
        let profile = match profile {
            Some(profile) if entry.has_input() => profile,
            _ => {
                self.fail("No active input");
                return;
            }
        };
        if !profile.seekable {
            self.fail("Input is not seekable");
            return;
        }
        entry.time = target(profile.length).clamp(0, profile.length.max(0));
        let position = position_of(entry.time, profile.length);
        let time = entry.time;
        entry.emit(PlayerEvent::TimeChanged(time));
        entry.emit(PlayerEvent::PositionChanged(position));
    }

    fn tracks(&mut self, player: PlayerHandle, kind: TrackKind) -> Option<Vec<(i32, String)>> {
        let (entry, profile) = self.player_with_profile(player)?;
        if !entry.has_input() {
            return None;
        }
        let profile = profile?;
        let tracks = match kind {
            TrackKind::Video => profile.video_tracks,
            TrackKind::Audio => profile.audio_tracks,
            TrackKind::Subtitle => {
                let mut tracks = profile.subtitle_tracks;
                if !entry.extra_subtitles.is_empty() && tracks.is_empty() {
                    tracks.push((-1, "Disable".to_string()));
                }
                tracks.extend(entry.extra_subtitles.iter().cloned());
                tracks
            }
        };
        Some(tracks)
    }

    fn select_track(&mut self, player: PlayerHandle, kind: TrackKind, id: i32) -> i32 {
        let Some(tracks) = self.tracks(player, kind) else {
            if !self.error_pending() {
                self.fail("No active input");
            }
            return -1;
        };
        if !tracks.iter().any(|(track, _)| *track == id) {
            self.fail(format!("Track identifier not found: {}", id));
            return -1;
        }
        if let Some(entry) = self.players.get_mut(&player.raw()) {
            match kind {
                TrackKind::Video => entry.video_track = id,
                TrackKind::Audio => entry.audio_track = id,
                TrackKind::Subtitle => entry.spu = id,
            }
        }
        0
    }

    fn error_pending(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Clone, Copy)]
enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

fn first_track(tracks: &[(i32, String)]) -> i32 {
    tracks.iter().map(|(id, _)| *id).find(|id| *id >= 0).unwrap_or(-1)
}

fn position_of(time: i64, length: i64) -> f32 {
    if length > 0 {
        time as f32 / length as f32
    } else {
        0.0
    }
}

/// In-process engine with a handle registry and a simulated transport
///
/// Media are reference counted the way the native engine counts them, so a
/// player keeps its bound media alive after the caller's `Media` is dropped.
/// Time only moves when [`MemoryEngine::advance`] is called.
pub struct MemoryEngine {
    registry: RefCell<Registry>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry::default()),
        }
    }

    /// Describe the resource behind a path or location before it is opened
    pub fn register_profile<S: Into<String>>(&self, location: S, profile: MediaProfile) {
        self.registry
            .borrow_mut()
            .profiles
            .insert(location.into(), profile);
    }

    /// Move the clock of every playing player forward
    pub fn advance(&self, millis: i64) {
        let mut registry = self.registry.borrow_mut();
        let Registry { players, media, .. } = &mut *registry;
        for entry in players.values_mut() {
            if entry.state != State::Playing {
                continue;
            }
            let Some(length) = entry.media.and_then(|id| media.get(&id)).map(|m| m.profile.length) else {
                continue;
            };
            entry.time = (entry.time + millis).min(length);
            let time = entry.time;
            entry.emit(PlayerEvent::TimeChanged(time));
            entry.emit(PlayerEvent::PositionChanged(position_of(time, length)));
            if time >= length {
                entry.state = State::Ended;
                entry.emit(PlayerEvent::EndReached);
            }
        }
    }

    /// Leave an error in the engine slot, as a failing native call would
    pub fn inject_error<S: Into<String>>(&self, message: S) {
        self.registry.borrow_mut().error = Some(message.into());
    }

    /// Number of boundary calls made so far
    pub fn native_calls(&self) -> u64 {
        self.registry.borrow().calls
    }

    /// Options queued on a media, in the order they were added
    pub fn media_options(&self, media: MediaHandle) -> Vec<String> {
        self.registry
            .borrow()
            .media
            .get(&media.raw())
            .map(|m| m.options.clone())
            .unwrap_or_default()
    }

    /// Outstanding references on a media; zero once it has been freed
    pub fn media_refs(&self, media: MediaHandle) -> u32 {
        self.registry
            .borrow()
            .media
            .get(&media.raw())
            .map(|m| m.refs)
            .unwrap_or(0)
    }

    pub fn live_players(&self) -> usize {
        self.registry.borrow().players.len()
    }

    pub fn live_instances(&self) -> usize {
        self.registry.borrow().instances.len()
    }

    pub fn user_agent(&self) -> Option<(String, String)> {
        self.registry.borrow().user_agent.clone()
    }

    fn call(&self) -> std::cell::RefMut<'_, Registry> {
        let mut registry = self.registry.borrow_mut();
        registry.calls += 1;
        registry
    }

    fn with_player<T>(&self, player: PlayerHandle, default: T, f: impl FnOnce(&mut PlayerEntry) -> T) -> T {
        match self.call().player(player) {
            Some(entry) => f(entry),
            None => default,
        }
    }

    fn count(&self, player: PlayerHandle, kind: TrackKind) -> i32 {
        self.call()
            .tracks(player, kind)
            .map(|t| t.len() as i32)
            .unwrap_or(0)
    }

    fn description(&self, player: PlayerHandle, kind: TrackKind) -> Option<TrackDescription> {
        self.call()
            .tracks(player, kind)
            .and_then(TrackDescription::from_pairs)
    }

    fn current(&self, player: PlayerHandle, kind: TrackKind) -> i32 {
        self.with_player(player, -1, |entry| {
            if !entry.has_input() {
                return -1;
            }
            match kind {
                TrackKind::Video => entry.video_track,
                TrackKind::Audio => entry.audio_track,
                TrackKind::Subtitle => entry.spu,
            }
        })
    }
}

impl Engine for MemoryEngine {
    fn errmsg(&self) -> Option<String> {
        self.call().error.clone()
    }

    fn clearerr(&self) {
        self.call().error = None;
    }

    fn instance_new(&self, args: &[String]) -> Option<InstanceHandle> {
        let mut registry = self.call();
        if let Some(bad) = args.iter().find(|a| !a.starts_with("--")) {
            registry.fail(format!("Unknown argument: {}", bad));
            return None;
        }
        let id = registry.allocate();
        registry.instances.insert(id, args.to_vec());
        Some(InstanceHandle::from_raw(id))
    }

    fn instance_release(&self, instance: InstanceHandle) {
        let mut registry = self.call();
        if registry.instances.remove(&instance.raw()).is_none() {
            registry.fail("Invalid instance handle");
        } else if !registry.players.is_empty() || !registry.media.is_empty() {
            warn!(
                "memory engine instance released with {} players and {} media alive",
                registry.players.len(),
                registry.media.len()
            );
        }
    }

    fn version(&self) -> String {
        drop(self.call());
        format!("{} (memory engine)", env!("CARGO_PKG_VERSION"))
    }

    fn set_user_agent(&self, _instance: InstanceHandle, name: &str, http: &str) {
        self.call().user_agent = Some((name.to_string(), http.to_string()));
    }

    fn media_new_path(&self, instance: InstanceHandle, path: &str) -> Option<MediaHandle> {
        self.call().new_media(instance, path, format!("file://{}", path))
    }

    fn media_new_location(&self, instance: InstanceHandle, mrl: &str) -> Option<MediaHandle> {
        self.call().new_media(instance, mrl, mrl.to_string())
    }

    fn media_release(&self, media: MediaHandle) {
        self.call().release_media(media.raw());
    }

    fn media_mrl(&self, media: MediaHandle) -> Option<String> {
        let mut registry = self.call();
        match registry.media.get(&media.raw()) {
            Some(entry) => Some(entry.mrl.clone()),
            None => {
                registry.fail("Invalid media handle");
                None
            }
        }
    }

    fn media_add_option(&self, media: MediaHandle, option: &str) {
        let mut registry = self.call();
        match registry.media.get_mut(&media.raw()) {
            Some(entry) => entry.options.push(option.to_string()),
            None => registry.fail("Invalid media handle"),
        }
    }

    fn media_meta(&self, media: MediaHandle, meta: Meta) -> Option<String> {
        let mut registry = self.call();
        match registry.media.get(&media.raw()) {
            Some(entry) => entry.meta.get(&meta).cloned(),
            None => {
                registry.fail("Invalid media handle");
                None
            }
        }
    }

    fn media_set_meta(&self, media: MediaHandle, meta: Meta, value: &str) {
        let mut registry = self.call();
        match registry.media.get_mut(&media.raw()) {
            Some(entry) => {
                entry.meta.insert(meta, value.to_string());
            }
            None => registry.fail("Invalid media handle"),
        }
    }

    fn media_save_meta(&self, media: MediaHandle) -> bool {
        let mut registry = self.call();
        let saved = registry.media.contains_key(&media.raw());
        if !saved {
            registry.fail("Invalid media handle");
        }
        saved
    }

    fn player_new(&self, instance: InstanceHandle) -> Option<PlayerHandle> {
        let mut registry = self.call();
        if !registry.instances.contains_key(&instance.raw()) {
            registry.fail("Invalid instance handle");
            return None;
        }
        let id = registry.allocate();
        registry.players.insert(id, PlayerEntry::new());
        Some(PlayerHandle::from_raw(id))
    }

    fn player_release(&self, player: PlayerHandle) {
        let mut registry = self.call();
        match registry.players.remove(&player.raw()) {
            Some(entry) => {
                if let Some(media) = entry.media {
                    registry.release_media(media);
                }
            }
            None => registry.fail("Invalid player handle"),
        }
    }

    fn player_set_media(&self, player: PlayerHandle, media: Option<MediaHandle>) {
        let mut registry = self.call();
        if let Some(handle) = media {
            match registry.media.get_mut(&handle.raw()) {
                Some(entry) => entry.refs += 1,
                None => {
                    registry.fail("Invalid media handle");
                    return;
                }
            }
        }
        let previous = match registry.player(player) {
            Some(entry) => {
                let previous = entry.media.take();
                entry.media = media.map(|m| m.raw());
                entry.state = State::Idle;
                entry.time = 0;
                entry.video_track = -1;
                entry.audio_track = -1;
                entry.spu = -1;
                entry.extra_subtitles.clear();
                entry.emit(PlayerEvent::MediaChanged);
                previous
            }
            None => {
                if let Some(handle) = media {
                    registry.release_media(handle.raw());
                }
                return;
            }
        };
        if let Some(previous) = previous {
            registry.release_media(previous);
        }
    }

    fn player_media(&self, player: PlayerHandle) -> Option<MediaHandle> {
        let mut registry = self.call();
        let media = registry.player(player)?.media?;
        if let Some(entry) = registry.media.get_mut(&media) {
            entry.refs += 1;
        }
        Some(MediaHandle::from_raw(media))
    }

    fn player_attach_events(&self, player: PlayerHandle, sender: Sender<PlayerEvent>) -> bool {
        self.with_player(player, false, |entry| {
            entry.senders.push(sender);
            true
        })
    }

    fn player_play(&self, player: PlayerHandle) -> i32 {
        self.call().open(player)
    }

    fn player_set_pause(&self, player: PlayerHandle, pause: bool) {
        self.with_player(player, (), |entry| match (entry.state, pause) {
            (State::Playing, true) => {
                entry.state = State::Paused;
                entry.emit(PlayerEvent::Paused);
            }
            (State::Paused, false) => {
                entry.state = State::Playing;
                entry.emit(PlayerEvent::Playing);
            }
            _ => {}
        })
    }

    fn player_stop(&self, player: PlayerHandle) {
        self.with_player(player, (), |entry| {
            if entry.media.is_some() {
                entry.state = State::Stopped;
                entry.time = 0;
                entry.emit(PlayerEvent::Stopped);
            }
        })
    }

    fn player_state(&self, player: PlayerHandle) -> State {
        self.with_player(player, State::Idle, |entry| entry.state)
    }

    fn player_length(&self, player: PlayerHandle) -> i64 {
        match self.call().player_with_profile(player) {
            Some((entry, Some(profile))) if entry.has_input() => profile.length,
            _ => -1,
        }
    }

    fn player_time(&self, player: PlayerHandle) -> i64 {
        self.with_player(player, -1, |entry| if entry.has_input() { entry.time } else { -1 })
    }

    fn player_set_time(&self, player: PlayerHandle, time: i64) {
        self.call().seek(player, |_| time);
    }

    fn player_position(&self, player: PlayerHandle) -> f32 {
        match self.call().player_with_profile(player) {
            Some((entry, Some(profile))) if entry.has_input() => position_of(entry.time, profile.length),
            _ => -1.0,
        }
    }

    fn player_set_position(&self, player: PlayerHandle, position: f32) {
        self.call()
            .seek(player, |length| (position.clamp(0.0, 1.0) as f64 * length as f64) as i64);
    }

    fn player_is_seekable(&self, player: PlayerHandle) -> bool {
        match self.call().player_with_profile(player) {
            Some((entry, Some(profile))) => entry.has_input() && profile.seekable,
            _ => false,
        }
    }

    fn audio_volume(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |entry| entry.volume)
    }

    fn audio_set_volume(&self, player: PlayerHandle, volume: i32) -> i32 {
        let mut registry = self.call();
        if !(0..=200).contains(&volume) {
            registry.fail(format!("Volume out of range: {}", volume));
            return -1;
        }
        match registry.player(player) {
            Some(entry) => {
                entry.volume = volume;
                0
            }
            None => -1,
        }
    }

    fn audio_mute(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |entry| entry.muted as i32)
    }

    fn audio_set_mute(&self, player: PlayerHandle, mute: bool) {
        self.with_player(player, (), |entry| entry.muted = mute)
    }

    fn audio_toggle_mute(&self, player: PlayerHandle) {
        self.with_player(player, (), |entry| entry.muted = !entry.muted)
    }

    fn audio_track_count(&self, player: PlayerHandle) -> i32 {
        self.count(player, TrackKind::Audio)
    }

    fn audio_track(&self, player: PlayerHandle) -> i32 {
        self.current(player, TrackKind::Audio)
    }

    fn audio_set_track(&self, player: PlayerHandle, track: i32) -> i32 {
        self.call().select_track(player, TrackKind::Audio, track)
    }

    fn audio_track_description(&self, player: PlayerHandle) -> Option<TrackDescription> {
        self.description(player, TrackKind::Audio)
    }

    fn video_track_count(&self, player: PlayerHandle) -> i32 {
        self.count(player, TrackKind::Video)
    }

    fn video_track(&self, player: PlayerHandle) -> i32 {
        self.current(player, TrackKind::Video)
    }

    fn video_set_track(&self, player: PlayerHandle, track: i32) -> i32 {
        self.call().select_track(player, TrackKind::Video, track)
    }

    fn video_track_description(&self, player: PlayerHandle) -> Option<TrackDescription> {
        self.description(player, TrackKind::Video)
    }

    fn video_spu_count(&self, player: PlayerHandle) -> i32 {
        self.count(player, TrackKind::Subtitle)
    }

    fn video_spu(&self, player: PlayerHandle) -> i32 {
        self.current(player, TrackKind::Subtitle)
    }

    fn video_set_spu(&self, player: PlayerHandle, spu: i32) -> i32 {
        self.call().select_track(player, TrackKind::Subtitle, spu)
    }

    fn video_spu_description(&self, player: PlayerHandle) -> Option<TrackDescription> {
        self.description(player, TrackKind::Subtitle)
    }

    fn video_set_subtitle_file(&self, player: PlayerHandle, path: &str) -> bool {
        let mut registry = self.call();
        let Some(entry) = registry.player(player) else {
            return false;
        };
        if !entry.has_input() {
            registry.fail("No active input");
            return false;
        }
        let next_id = entry
            .extra_subtitles
            .iter()
            .map(|(id, _)| *id)
            .max()
            .unwrap_or(0)
            .max(1000)
            + 1;
        let name = std::path::Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());
        entry.extra_subtitles.push((next_id, name));
        entry.spu = next_id;
        true
    }

    fn video_aspect_ratio(&self, player: PlayerHandle) -> Option<String> {
        self.with_player(player, None, |entry| entry.aspect_ratio.clone())
    }

    fn video_set_aspect_ratio(&self, player: PlayerHandle, ratio: &str) {
        self.with_player(player, (), |entry| entry.aspect_ratio = non_empty(ratio))
    }

    fn video_crop_geometry(&self, player: PlayerHandle) -> Option<String> {
        self.with_player(player, None, |entry| entry.crop_geometry.clone())
    }

    fn video_set_crop_geometry(&self, player: PlayerHandle, geometry: &str) {
        self.with_player(player, (), |entry| entry.crop_geometry = non_empty(geometry))
    }

    fn video_set_deinterlace(&self, player: PlayerHandle, mode: &str) {
        self.with_player(player, (), |entry| entry.deinterlace = non_empty(mode))
    }

    fn video_teletext(&self, player: PlayerHandle) -> i32 {
        self.with_player(player, -1, |entry| entry.teletext_page)
    }

    fn video_set_teletext(&self, player: PlayerHandle, page: i32) {
        self.with_player(player, (), |entry| entry.teletext_page = page)
    }

    fn video_toggle_teletext(&self, player: PlayerHandle) {
        self.with_player(player, (), |entry| {
            entry.teletext_transparent = !entry.teletext_transparent
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl MemoryEngine {
    /// Deinterlace filter currently applied to a player
    pub fn deinterlace(&self, player: PlayerHandle) -> Option<String> {
        self.registry
            .borrow()
            .players
            .get(&player.raw())
            .and_then(|p| p.deinterlace.clone())
    }

    pub fn teletext_transparent(&self, player: PlayerHandle) -> bool {
        self.registry
            .borrow()
            .players
            .get(&player.raw())
            .map(|p| p.teletext_transparent)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn setup() -> (MemoryEngine, InstanceHandle) {
        let engine = MemoryEngine::new();
        let instance = engine.instance_new(&[]).unwrap();
        (engine, instance)
    }

    #[test]
    fn test_instance_rejects_malformed_arguments() {
        let engine = MemoryEngine::new();
        assert!(engine.instance_new(&["intf=dummy".to_string()]).is_none());
        assert!(engine.errmsg().unwrap().contains("intf=dummy"));
    }

    #[test]
    fn test_player_holds_media_reference() {
        let (engine, instance) = setup();
        let media = engine.media_new_path(instance, "/videos/a.mkv").unwrap();
        let player = engine.player_new(instance).unwrap();

        engine.player_set_media(player, Some(media));
        assert_eq!(engine.media_refs(media), 2);

        engine.media_release(media);
        assert_eq!(engine.media_refs(media), 1);

        engine.player_release(player);
        assert_eq!(engine.media_refs(media), 0);
    }

    #[test]
    fn test_play_emits_opening_then_playing() {
        let (engine, instance) = setup();
        let media = engine.media_new_path(instance, "clip.mp4").unwrap();
        let player = engine.player_new(instance).unwrap();
        let (tx, rx) = unbounded();
        engine.player_attach_events(player, tx);
        engine.player_set_media(player, Some(media));

        assert_eq!(engine.player_play(player), 0);
        let states: Vec<State> = rx.try_iter().filter_map(|e| e.state()).collect();
        assert_eq!(states, vec![State::Idle, State::Opening, State::Playing]);
    }

    #[test]
    fn test_play_without_media_fails() {
        let (engine, instance) = setup();
        let player = engine.player_new(instance).unwrap();
        assert_eq!(engine.player_play(player), -1);
        assert_eq!(engine.errmsg().as_deref(), Some("No media to play"));
    }

    #[test]
    fn test_broken_media_ends_in_error() {
        let (engine, instance) = setup();
        engine.register_profile("broken.avi", MediaProfile::broken());
        let media = engine.media_new_path(instance, "broken.avi").unwrap();
        let player = engine.player_new(instance).unwrap();
        engine.player_set_media(player, Some(media));
        engine.player_play(player);
        assert_eq!(engine.player_state(player), State::Error);
    }

    #[test]
    fn test_advance_reaches_end() {
        let (engine, instance) = setup();
        engine.register_profile(
            "short.ogg",
            MediaProfile {
                length: 1_000,
                ..MediaProfile::default()
            },
        );
        let media = engine.media_new_path(instance, "short.ogg").unwrap();
        let player = engine.player_new(instance).unwrap();
        engine.player_set_media(player, Some(media));
        engine.player_play(player);

        engine.advance(400);
        assert_eq!(engine.player_time(player), 400);
        engine.advance(1_000);
        assert_eq!(engine.player_state(player), State::Ended);
    }

    #[test]
    fn test_tracks_need_an_input() {
        let (engine, instance) = setup();
        let media = engine.media_new_path(instance, "clip.mp4").unwrap();
        let player = engine.player_new(instance).unwrap();
        engine.player_set_media(player, Some(media));

        assert_eq!(engine.video_track_count(player), 0);
        assert!(engine.video_track_description(player).is_none());

        engine.player_play(player);
        assert_eq!(engine.video_track_count(player), 2);
        assert_eq!(engine.video_track(player), 0);
        assert_eq!(engine.video_set_track(player, 7), -1);
        assert!(engine.errmsg().unwrap().contains("7"));
    }

    #[test]
    fn test_calls_are_counted() {
        let (engine, _instance) = setup();
        let before = engine.native_calls();
        engine.version();
        assert_eq!(engine.native_calls(), before + 1);
    }
}
