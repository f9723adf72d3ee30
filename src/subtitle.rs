use std::path::Path;

use tracing::debug;

use crate::player::PlayerCore;
use crate::tracks::{self, Track, TrackKind};

/// Subtitle tracks, external subtitle files and teletext of a player
#[derive(Debug, Clone, Copy)]
pub struct Subtitle<'p> {
    core: PlayerCore<'p>,
}

impl<'p> Subtitle<'p> {
    pub fn new(core: PlayerCore<'p>) -> Self {
        Self { core }
    }

    pub fn subtitle_count(&self) -> i32 {
        tracks::count(&self.core, TrackKind::Subtitle)
    }

    pub fn subtitle_description(&self) -> Vec<String> {
        tracks::names(&self.core, TrackKind::Subtitle)
    }

    pub fn subtitle_ids(&self) -> Vec<i32> {
        tracks::ids(&self.core, TrackKind::Subtitle)
    }

    pub fn subtitles(&self) -> Vec<Track> {
        tracks::tracks(&self.core, TrackKind::Subtitle)
    }

    /// Active subtitle identifier, `-1` when disabled or without a player
    pub fn subtitle(&self) -> i32 {
        tracks::current(&self.core, TrackKind::Subtitle)
    }

    pub fn set_subtitle(&self, id: i32) {
        debug!("Subtitle -> {}", id);
        tracks::select(&self.core, TrackKind::Subtitle, id)
    }

    /// Load and activate an external subtitle file
    pub fn set_subtitle_file(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        debug!("Subtitle file: {}", path);
        self.core.call("set subtitle file", false, |engine, player| {
            engine.video_set_subtitle_file(player, &path)
        })
    }

    pub fn teletext_page(&self) -> i32 {
        self.core
            .call("teletext page", -1, |engine, player| engine.video_teletext(player))
    }

    pub fn set_teletext_page(&self, page: i32) {
        self.core
            .call("set teletext page", (), |engine, player| engine.video_set_teletext(player, page))
    }

    pub fn toggle_teletext_transparency(&self) {
        self.core.call("toggle teletext transparency", (), |engine, player| {
            engine.video_toggle_teletext(player)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MemoryEngine, MockEngine};
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
        let subtitle = Subtitle::new(PlayerCore::new(&engine, None));
        assert_eq!(subtitle.subtitle_count(), -1);
        assert_eq!(subtitle.subtitle(), -1);
        assert!(subtitle.subtitle_ids().is_empty());
        assert_eq!(subtitle.teletext_page(), -1);
        assert!(!subtitle.set_subtitle_file(Path::new("/tmp/movie.srt")));
        subtitle.toggle_teletext_transparency();
    }

    #[test]
    fn test_subtitle_file_becomes_active_track() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);

        let subtitle = player.subtitle();
        assert_eq!(subtitle.subtitle_count(), 0);

        assert!(subtitle.set_subtitle_file(Path::new("/tmp/movie.srt")));
        assert_eq!(subtitle.subtitle_description(), vec!["Disable", "movie.srt"]);
        assert_eq!(subtitle.subtitle_ids(), vec![-1, 1001]);
        assert_eq!(subtitle.subtitle(), 1001);

        subtitle.set_subtitle(-1);
        assert_eq!(subtitle.subtitle(), -1);
    }

    #[test]
    fn test_subtitle_file_needs_an_input() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open_only(&media);

        assert!(!player.subtitle().set_subtitle_file(Path::new("/tmp/movie.srt")));
        assert!(ErrorReporter::last_error().unwrap().contains("No active input"));
    }

    #[test]
    fn test_teletext() {
        let (engine, instance) = setup();
        let media = Media::new(&instance, "dvb.ts", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);
        let handle = player.core().handle().unwrap();

        let subtitle = player.subtitle();
        assert_eq!(subtitle.teletext_page(), 100);
        subtitle.set_teletext_page(888);
        assert_eq!(subtitle.teletext_page(), 888);

        subtitle.toggle_teletext_transparency();
        assert!(engine.teletext_transparent(handle));
    }
}
