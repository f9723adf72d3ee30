use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, info, warn};

use crate::audio::Audio;
use crate::engine::{Engine, MediaHandle, PlayerEvent, PlayerHandle};
use crate::enums::State;
use crate::error::ErrorReporter;
use crate::instance::Instance;
use crate::media::Media;
use crate::subtitle::Subtitle;
use crate::video::Video;

/// Borrowed view of a player for the facets
///
/// The handle is only present while the player has media bound, so a facet
/// built from an unbound player answers with its sentinel values without
/// making any native call.
#[derive(Clone, Copy)]
pub struct PlayerCore<'p> {
    engine: &'p dyn Engine,
    handle: Option<PlayerHandle>,
}

impl<'p> PlayerCore<'p> {
    pub fn new(engine: &'p dyn Engine, handle: Option<PlayerHandle>) -> Self {
        Self { engine, handle }
    }

    pub fn handle(&self) -> Option<PlayerHandle> {
        self.handle
    }

    pub fn engine(&self) -> &'p dyn Engine {
        self.engine
    }

    /// Guarded native call
    ///
    /// Without a handle the sentinel is returned and a null-handle error is
    /// left in the reporter. With one, the call runs and any engine error it
    /// raised is collected afterwards.
    pub(crate) fn call<T>(
        &self,
        operation: &'static str,
        sentinel: T,
        f: impl FnOnce(&dyn Engine, PlayerHandle) -> T,
    ) -> T {
        let Some(handle) = self.handle else {
            ErrorReporter::null_handle(operation);
            return sentinel;
        };
        ErrorReporter::begin(self.engine);
        let value = f(self.engine, handle);
        ErrorReporter::check(self.engine, operation);
        value
    }
}

impl std::fmt::Debug for PlayerCore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCore").field("handle", &self.handle).finish()
    }
}

/// Playback transport for one media at a time
///
/// The player takes its own engine reference on the media it is given, so the
/// caller's [`Media`] may be dropped while playback continues. Engine
/// notifications arrive on a channel, see [`MediaPlayer::events`].
pub struct MediaPlayer<'i> {
    instance: &'i Instance,
    handle: Option<PlayerHandle>,
    media: Option<MediaHandle>,
    events: Receiver<PlayerEvent>,
}

impl<'i> MediaPlayer<'i> {
    pub fn new(instance: &'i Instance) -> Self {
        let engine = instance.engine();
        let (sender, events) = unbounded();

        ErrorReporter::begin(engine);
        let handle = engine.player_new(instance.core());
        ErrorReporter::check(engine, "player new");

        if let Some(handle) = handle {
            if !engine.player_attach_events(handle, sender) {
                warn!("Player events could not be attached");
            }
            ErrorReporter::check(engine, "player attach events");
            debug!("Player created: {:?}", handle);
        }

        Self {
            instance,
            handle,
            media: None,
            events,
        }
    }

    fn engine(&self) -> &'i dyn Engine {
        self.instance.engine()
    }

    /// Player handle for the facets; absent until media is bound
    ///
    /// The view borrows the player, so it cannot outlive it.
    pub fn core(&self) -> PlayerCore<'_> {
        let handle = self.media.and(self.handle);
        PlayerCore::new(self.engine(), handle)
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Bind `media` and start playing it
    pub fn open(&mut self, media: &Media<'_>) {
        if self.bind(media) {
            info!("Opening {}", media.current_location());
            self.play();
        }
    }

    /// Bind `media` without starting playback
    pub fn open_only(&mut self, media: &Media<'_>) {
        if self.bind(media) {
            info!("Loaded {}", media.current_location());
        }
    }

    fn bind(&mut self, media: &Media<'_>) -> bool {
        let Some(handle) = self.handle else {
            ErrorReporter::null_handle("player set media");
            return false;
        };
        let Some(media_handle) = media.core() else {
            ErrorReporter::null_handle("player set media");
            return false;
        };
        ErrorReporter::begin(self.engine());
        self.engine().player_set_media(handle, Some(media_handle));
        if ErrorReporter::check(self.engine(), "player set media") {
            return false;
        }
        self.media = Some(media_handle);
        true
    }

    pub fn play(&self) {
        self.core().call("play", (), |engine, player| {
            if engine.player_play(player) != 0 {
                warn!("Playback could not be started");
            }
        })
    }

    pub fn pause(&self) {
        self.core()
            .call("pause", (), |engine, player| engine.player_set_pause(player, true))
    }

    pub fn resume(&self) {
        self.core()
            .call("resume", (), |engine, player| engine.player_set_pause(player, false))
    }

    /// Pause when playing, resume when paused
    pub fn toggle_pause(&self) {
        match self.state() {
            State::Playing => self.pause(),
            State::Paused => self.resume(),
            state => debug!("Nothing to toggle in state {:?}", state),
        }
    }

    pub fn stop(&self) {
        self.core().call("stop", (), |engine, player| engine.player_stop(player))
    }

    pub fn state(&self) -> State {
        self.core()
            .call("player state", State::Idle, |engine, player| engine.player_state(player))
    }

    /// Playback time in milliseconds, `-1` without an input
    pub fn time(&self) -> i64 {
        self.core()
            .call("player time", -1, |engine, player| engine.player_time(player))
    }

    pub fn set_time(&self, time: i64) {
        self.core()
            .call("set time", (), |engine, player| engine.player_set_time(player, time))
    }

    /// Media length in milliseconds, `-1` when unknown
    pub fn length(&self) -> i64 {
        self.core()
            .call("player length", -1, |engine, player| engine.player_length(player))
    }

    /// Playback position in `0.0..=1.0`, `-1.0` without an input
    pub fn position(&self) -> f32 {
        self.core()
            .call("player position", -1.0, |engine, player| engine.player_position(player))
    }

    pub fn set_position(&self, position: f32) {
        self.core().call("set position", (), |engine, player| {
            engine.player_set_position(player, position)
        })
    }

    pub fn seekable(&self) -> bool {
        self.core()
            .call("player seekable", false, |engine, player| engine.player_is_seekable(player))
    }

    /// Media bound to the player, as a new owner of one engine reference
    pub fn current_media(&self) -> Option<Media<'i>> {
        let handle = self.handle?;
        ErrorReporter::begin(self.engine());
        let media = self.engine().player_media(handle);
        ErrorReporter::check(self.engine(), "player media");
        media.map(|media| Media::wrap(self.instance, media))
    }

    /// Receiver for engine notifications; clones share one queue
    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.events.clone()
    }

    /// Everything queued since the last drain
    pub fn drain_events(&self) -> Vec<PlayerEvent> {
        self.events.try_iter().collect()
    }

    /// Video facet, borrowing the player
    ///
    /// A facet cannot outlive the player it was taken from:
    ///
    /// ```compile_fail
    /// use std::rc::Rc;
    /// use vlc_connector::engine::MemoryEngine;
    /// use vlc_connector::{Instance, MediaPlayer};
    ///
    /// let instance = Instance::new(Rc::new(MemoryEngine::new()), &[]).unwrap();
    /// let player = MediaPlayer::new(&instance);
    /// let video = player.video();
    /// drop(player);
    /// video.track_count();
    /// ```
    pub fn video(&self) -> Video<'_> {
        Video::new(self.core())
    }

    pub fn audio(&self) -> Audio<'_> {
        Audio::new(self.core())
    }

    pub fn subtitle(&self) -> Subtitle<'_> {
        Subtitle::new(self.core())
    }
}

impl Drop for MediaPlayer<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Releasing player {:?}", handle);
            self.engine().player_release(handle);
            ErrorReporter::check(self.engine(), "player release");
        }
    }
}

impl std::fmt::Debug for MediaPlayer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPlayer")
            .field("handle", &self.handle)
            .field("media", &self.media)
            .finish()
    }
}
