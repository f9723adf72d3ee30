use tracing::debug;

use crate::player::PlayerCore;
use crate::tracks::{self, Track, TrackKind};

/// Volume, mute and audio tracks of a player
#[derive(Debug, Clone, Copy)]
pub struct Audio<'p> {
    core: PlayerCore<'p>,
}

impl<'p> Audio<'p> {
    pub fn new(core: PlayerCore<'p>) -> Self {
        Self { core }
    }

    /// Volume in percent, `-1` without a player
    pub fn volume(&self) -> i32 {
        self.core
            .call("audio volume", -1, |engine, player| engine.audio_volume(player))
    }

    /// Set the volume, `0..=200`; out-of-range values are refused by the engine
    pub fn set_volume(&self, volume: i32) {
        debug!("Volume -> {}", volume);
        self.core.call("set volume", (), |engine, player| {
            engine.audio_set_volume(player, volume);
        })
    }

    pub fn is_muted(&self) -> bool {
        self.core
            .call("audio mute", false, |engine, player| engine.audio_mute(player) > 0)
    }

    pub fn set_mute(&self, mute: bool) {
        self.core
            .call("set mute", (), |engine, player| engine.audio_set_mute(player, mute))
    }

    pub fn toggle_mute(&self) {
        self.core
            .call("toggle mute", (), |engine, player| engine.audio_toggle_mute(player))
    }

    pub fn track_count(&self) -> i32 {
        tracks::count(&self.core, TrackKind::Audio)
    }

    pub fn track_description(&self) -> Vec<String> {
        tracks::names(&self.core, TrackKind::Audio)
    }

    pub fn track_ids(&self) -> Vec<i32> {
        tracks::ids(&self.core, TrackKind::Audio)
    }

    pub fn tracks(&self) -> Vec<Track> {
        tracks::tracks(&self.core, TrackKind::Audio)
    }

    pub fn track(&self) -> i32 {
        tracks::current(&self.core, TrackKind::Audio)
    }

    pub fn set_track(&self, id: i32) {
        debug!("Audio track -> {}", id);
        tracks::select(&self.core, TrackKind::Audio, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MediaProfile, MemoryEngine, MockEngine};
    use crate::error::ErrorReporter;
    use crate::instance::Instance;
    use crate::media::Media;
    use crate::player::MediaPlayer;
    use std::rc::Rc;

    fn setup() -> (Rc<MemoryEngine>, Instance) {
        let engine = Rc::new(MemoryEngine::new());
        let instance = Instance::new(engine.clone(), &[]).unwrap();
        (engine, instance)
    }

    #[test]
    fn test_unbound_sentinels() {
        let engine = MockEngine::new();
        let audio = Audio::new(PlayerCore::new(&engine, None));
        assert_eq!(audio.volume(), -1);
        assert!(!audio.is_muted());
        assert_eq!(audio.track_count(), -1);
        assert_eq!(audio.track(), -1);
        assert!(audio.tracks().is_empty());
        audio.set_volume(50);
        audio.toggle_mute();
    }

    #[test]
    fn test_volume_and_mute() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);

        let audio = player.audio();
        assert_eq!(audio.volume(), 100);
        audio.set_volume(150);
        assert_eq!(audio.volume(), 150);

        audio.set_volume(300);
        assert!(ErrorReporter::last_error().unwrap().contains("Volume out of range"));
        assert_eq!(audio.volume(), 150);

        audio.set_mute(true);
        assert!(audio.is_muted());
        audio.toggle_mute();
        assert!(!audio.is_muted());
    }

    #[test]
    fn test_select_audio_track_by_id() {
        let (engine, instance) = setup();
        engine.register_profile(
            "dub.mkv",
            MediaProfile {
                audio_tracks: vec![
                    (-1, "Disable".to_string()),
                    (2, "English".to_string()),
                    (5, "Japanese".to_string()),
                ],
                ..Default::default()
            },
        );
        let media = Media::new(&instance, "dub.mkv", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);

        let audio = player.audio();
        assert_eq!(audio.track_description(), vec!["Disable", "English", "Japanese"]);
        assert_eq!(audio.track(), 2);

        // identifiers, not positions
        audio.set_track(5);
        assert_eq!(audio.track(), 5);
        audio.set_track(1);
        assert_eq!(audio.track(), 5);
    }
}
