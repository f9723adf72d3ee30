use tracing::{debug, warn};

use crate::enums::{Deinterlacing, Ratio};
use crate::error::{ErrorReporter, VlcError};
use crate::player::PlayerCore;
use crate::tracks::{self, Track, TrackKind};

/// Video tracks, geometry and filters of a player
///
/// Borrows the player's handle; it cannot outlive the
/// [`MediaPlayer`](crate::MediaPlayer) it was taken from.
#[derive(Debug, Clone, Copy)]
pub struct Video<'p> {
    core: PlayerCore<'p>,
}

impl<'p> Video<'p> {
    pub fn new(core: PlayerCore<'p>) -> Self {
        Self { core }
    }

    /// Number of video tracks; `-1` without a player, `0` without an input
    pub fn track_count(&self) -> i32 {
        tracks::count(&self.core, TrackKind::Video)
    }

    pub fn track_description(&self) -> Vec<String> {
        tracks::names(&self.core, TrackKind::Video)
    }

    /// Track identifiers, in the same order as [`track_description`](Self::track_description)
    pub fn track_ids(&self) -> Vec<i32> {
        tracks::ids(&self.core, TrackKind::Video)
    }

    pub fn tracks(&self) -> Vec<Track> {
        tracks::tracks(&self.core, TrackKind::Video)
    }

    pub fn track(&self) -> i32 {
        tracks::current(&self.core, TrackKind::Video)
    }

    /// Select a track by engine identifier
    pub fn set_track(&self, id: i32) {
        debug!("Video track -> {}", id);
        tracks::select(&self.core, TrackKind::Video, id)
    }

    /// Current aspect ratio; `Unknown` without a player or for a custom engine value
    pub fn aspect_ratio(&self) -> Ratio {
        self.core.call("aspect ratio", Ratio::Unknown, |engine, player| {
            Ratio::from_engine(engine.video_aspect_ratio(player).as_deref())
        })
    }

    pub fn set_aspect_ratio(&self, ratio: Ratio) {
        let Some(value) = Self::preset(ratio, "aspect ratio") else {
            return;
        };
        self.core.call("set aspect ratio", (), |engine, player| {
            engine.video_set_aspect_ratio(player, value)
        })
    }

    /// Current crop geometry; `Unknown` without a player or for a custom engine value
    pub fn crop_geometry(&self) -> Ratio {
        self.core.call("crop geometry", Ratio::Unknown, |engine, player| {
            Ratio::from_engine(engine.video_crop_geometry(player).as_deref())
        })
    }

    pub fn set_crop_geometry(&self, ratio: Ratio) {
        let Some(value) = Self::preset(ratio, "crop geometry") else {
            return;
        };
        self.core.call("set crop geometry", (), |engine, player| {
            engine.video_set_crop_geometry(player, value)
        })
    }

    pub fn set_deinterlace(&self, mode: Deinterlacing) {
        let value = mode.as_engine().unwrap_or("");
        self.core.call("set deinterlace", (), |engine, player| {
            engine.video_set_deinterlace(player, value)
        })
    }

    /// Engine spelling of a ratio; `Original` is the empty string
    fn preset(ratio: Ratio, what: &'static str) -> Option<&'static str> {
        let value = ratio.as_engine();
        if value.is_none() {
            warn!("Ignoring unrecognized {}", what);
            ErrorReporter::record(VlcError::UnknownPreset(what));
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MemoryEngine, MockEngine, PlayerHandle, TrackDescription};
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
    fn test_unbound_player_sentinels_issue_no_native_call() {
        // A mock without expectations panics on any call
        let engine = MockEngine::new();
        let video = Video::new(PlayerCore::new(&engine, None));

        assert_eq!(video.track_count(), -1);
        assert_eq!(video.track(), -1);
        assert!(video.track_description().is_empty());
        assert!(video.track_ids().is_empty());
        assert_eq!(video.aspect_ratio(), Ratio::Unknown);
        assert_eq!(video.crop_geometry(), Ratio::Unknown);
        video.set_track(1);
        video.set_aspect_ratio(Ratio::R16x9);
        video.set_deinterlace(Deinterlacing::Yadif);
        assert!(ErrorReporter::last_error().unwrap().contains("null handle"));
    }

    #[test]
    fn test_tracks_of_playing_media() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);

        let video = player.video();
        assert_eq!(video.track_count(), 2);
        assert_eq!(video.track_description(), vec!["Disable", "Track 1"]);
        assert_eq!(video.track_ids(), vec![-1, 0]);
        assert_eq!(video.track(), 0);

        video.set_track(-1);
        assert_eq!(video.track(), -1);
    }

    #[test]
    fn test_descriptions_and_ids_agree() {
        let (engine, instance) = setup();
        engine.register_profile(
            "multi.mkv",
            crate::engine::MediaProfile {
                video_tracks: vec![
                    (-1, "Disable".to_string()),
                    (3, "Main".to_string()),
                    (7, "Angle 2".to_string()),
                ],
                ..Default::default()
            },
        );
        let media = Media::new(&instance, "multi.mkv", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);

        let video = player.video();
        let names = video.track_description();
        let ids = video.track_ids();
        assert_eq!(names.len(), ids.len());
        let tracks = video.tracks();
        assert_eq!(tracks.iter().map(|t| t.id).collect::<Vec<_>>(), ids);
        assert_eq!(tracks.into_iter().map(|t| t.name).collect::<Vec<_>>(), names);
    }

    #[test]
    fn test_unknown_track_id_is_reported() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);

        player.video().set_track(42);
        assert!(ErrorReporter::last_error().unwrap().contains("Track identifier not found: 42"));
        assert_eq!(player.video().track(), 0);
    }

    #[test]
    fn test_no_tracks_once_stopped() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);
        player.stop();

        let video = player.video();
        assert_eq!(video.track_count(), 0);
        assert!(video.track_description().is_empty());
    }

    #[test]
    fn test_aspect_ratio_round_trip() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open_only(&media);

        let video = player.video();
        for ratio in Ratio::all() {
            video.set_aspect_ratio(ratio);
            assert_eq!(video.aspect_ratio(), ratio);
            video.set_crop_geometry(ratio);
            assert_eq!(video.crop_geometry(), ratio);
        }
    }

    #[test]
    fn test_custom_engine_ratio_is_unknown() {
        let mut engine = MockEngine::new();
        engine
            .expect_video_aspect_ratio()
            .times(1)
            .returning(|_| Some("7:3".to_string()));
        engine.expect_clearerr().return_const(());
        engine.expect_errmsg().returning(|| None);
        let video = Video::new(PlayerCore::new(&engine, Some(PlayerHandle::from_raw(1))));

        assert_eq!(video.aspect_ratio(), Ratio::Unknown);
    }

    fn mismatched_engine(count: i32, ids: &'static [i32]) -> MockEngine {
        let mut engine = MockEngine::new();
        engine.expect_clearerr().return_const(());
        engine.expect_errmsg().returning(|| None);
        engine.expect_video_track_count().returning(move |_| count);
        engine.expect_video_track_description().returning(move |_| {
            TrackDescription::from_pairs(ids.iter().map(|&id| (id, format!("Track {}", id))))
        });
        engine
    }

    #[test]
    fn test_count_smaller_than_list_bounds_enumeration() {
        let engine = mismatched_engine(1, &[-1, 0, 4]);
        let video = Video::new(PlayerCore::new(&engine, Some(PlayerHandle::from_raw(1))));

        assert_eq!(video.track_description(), vec!["Track -1".to_string()]);
        assert_eq!(video.track_ids(), vec![-1]);
    }

    #[test]
    fn test_count_larger_than_list_stops_at_list_end() {
        let engine = mismatched_engine(3, &[-1, 0]);
        let video = Video::new(PlayerCore::new(&engine, Some(PlayerHandle::from_raw(1))));

        assert_eq!(
            video.track_description(),
            vec!["Track -1".to_string(), "Track 0".to_string()]
        );
        assert_eq!(video.track_ids(), vec![-1, 0]);
        assert!(ErrorReporter::last_error().is_none());
    }

    #[test]
    fn test_unknown_ratio_is_not_forwarded() {
        let (_engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open_only(&media);

        let video = player.video();
        video.set_aspect_ratio(Ratio::R4x3);
        video.set_aspect_ratio(Ratio::Unknown);
        assert!(matches!(
            ErrorReporter::take_last_error(),
            Some(VlcError::UnknownPreset("aspect ratio"))
        ));
        assert_eq!(video.aspect_ratio(), Ratio::R4x3);
    }

    #[test]
    fn test_deinterlace_filter_reaches_engine() {
        let (engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let mut player = MediaPlayer::new(&instance);
        player.open(&media);

        let handle = player.core().handle().unwrap();
        player.video().set_deinterlace(Deinterlacing::Yadif2x);
        assert_eq!(engine.deinterlace(handle), Some("yadif2x".to_string()));
        player.video().set_deinterlace(Deinterlacing::Disabled);
        assert_eq!(engine.deinterlace(handle), None);
    }
}
