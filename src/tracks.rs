// Track enumeration shared by the video, audio and subtitle facets
//
// The engine describes tracks as a linked list and separately reports a track
// count. The list is walked lazily and bounded by the count, which is read
// once per enumeration: a count that changes mid-walk cannot make the
// description and id sequences disagree.

use serde::Serialize;

use crate::engine::{Engine, PlayerHandle, TrackDescription};
use crate::player::PlayerCore;

/// Track as reported by the engine
///
/// `id` is the engine's track identifier, which is what `set_track` takes.
/// It is not the position of the track in the enumerated sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

impl TrackKind {
    fn count_operation(self) -> &'static str {
        match self {
            TrackKind::Video => "video track count",
            TrackKind::Audio => "audio track count",
            TrackKind::Subtitle => "subtitle count",
        }
    }

    fn describe_operation(self) -> &'static str {
        match self {
            TrackKind::Video => "video track description",
            TrackKind::Audio => "audio track description",
            TrackKind::Subtitle => "subtitle description",
        }
    }

    fn get_operation(self) -> &'static str {
        match self {
            TrackKind::Video => "video track",
            TrackKind::Audio => "audio track",
            TrackKind::Subtitle => "subtitle",
        }
    }

    fn set_operation(self) -> &'static str {
        match self {
            TrackKind::Video => "set video track",
            TrackKind::Audio => "set audio track",
            TrackKind::Subtitle => "set subtitle",
        }
    }

    fn count(self, engine: &dyn Engine, player: PlayerHandle) -> i32 {
        match self {
            TrackKind::Video => engine.video_track_count(player),
            TrackKind::Audio => engine.audio_track_count(player),
            TrackKind::Subtitle => engine.video_spu_count(player),
        }
    }

    fn list(self, engine: &dyn Engine, player: PlayerHandle) -> Option<TrackDescription> {
        match self {
            TrackKind::Video => engine.video_track_description(player),
            TrackKind::Audio => engine.audio_track_description(player),
            TrackKind::Subtitle => engine.video_spu_description(player),
        }
    }

    fn current(self, engine: &dyn Engine, player: PlayerHandle) -> i32 {
        match self {
            TrackKind::Video => engine.video_track(player),
            TrackKind::Audio => engine.audio_track(player),
            TrackKind::Subtitle => engine.video_spu(player),
        }
    }

    fn select(self, engine: &dyn Engine, player: PlayerHandle, id: i32) -> i32 {
        match self {
            TrackKind::Video => engine.video_set_track(player, id),
            TrackKind::Audio => engine.audio_set_track(player, id),
            TrackKind::Subtitle => engine.video_set_spu(player, id),
        }
    }
}

/// Lazy walk over a track description list
///
/// The head node is always yielded; further nodes are yielded while fewer
/// than `count` nodes have been produced and the list has not run out.
pub struct TrackWalk<'a> {
    node: Option<&'a TrackDescription>,
    remaining: usize,
}

impl<'a> TrackWalk<'a> {
    pub fn new(head: Option<&'a TrackDescription>, count: i32) -> Self {
        Self {
            node: head,
            remaining: count.max(1) as usize,
        }
    }
}

impl<'a> Iterator for TrackWalk<'a> {
    type Item = &'a TrackDescription;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.node?;
        self.remaining -= 1;
        self.node = node.next();
        Some(node)
    }
}

/// Number of tracks, `-1` when there is no player
pub(crate) fn count(core: &PlayerCore<'_>, kind: TrackKind) -> i32 {
    core.call(kind.count_operation(), -1, |engine, player| kind.count(engine, player))
}

/// Tracks in engine order; empty when there is no player
pub(crate) fn tracks(core: &PlayerCore<'_>, kind: TrackKind) -> Vec<Track> {
    core.call(kind.describe_operation(), Vec::new(), |engine, player| {
        let list = kind.list(engine, player);
        let count = kind.count(engine, player);
        TrackWalk::new(list.as_ref(), count)
            .map(|node| Track {
                id: node.id,
                name: node.name.clone(),
            })
            .collect()
    })
}

pub(crate) fn names(core: &PlayerCore<'_>, kind: TrackKind) -> Vec<String> {
    tracks(core, kind).into_iter().map(|t| t.name).collect()
}

pub(crate) fn ids(core: &PlayerCore<'_>, kind: TrackKind) -> Vec<i32> {
    tracks(core, kind).into_iter().map(|t| t.id).collect()
}

/// Identifier of the active track, `-1` when there is no player
pub(crate) fn current(core: &PlayerCore<'_>, kind: TrackKind) -> i32 {
    core.call(kind.get_operation(), -1, |engine, player| kind.current(engine, player))
}

pub(crate) fn select(core: &PlayerCore<'_>, kind: TrackKind, id: i32) {
    core.call(kind.set_operation(), (), |engine, player| {
        kind.select(engine, player, id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: i32) -> Option<TrackDescription> {
        TrackDescription::from_pairs((0..n).map(|i| (i - 1, format!("Track {}", i))).collect::<Vec<_>>())
    }

    #[test]
    fn test_walk_is_bounded_by_count() {
        let head = list(4);
        let ids: Vec<i32> = TrackWalk::new(head.as_ref(), 2).map(|t| t.id).collect();
        assert_eq!(ids, vec![-1, 0]);
    }

    #[test]
    fn test_walk_is_bounded_by_list() {
        let head = list(2);
        assert_eq!(TrackWalk::new(head.as_ref(), 5).count(), 2);
    }

    #[test]
    fn test_walk_yields_head_for_single_or_zero_count() {
        let head = list(3);
        assert_eq!(TrackWalk::new(head.as_ref(), 1).count(), 1);
        assert_eq!(TrackWalk::new(head.as_ref(), 0).count(), 1);
    }

    #[test]
    fn test_walk_of_empty_list() {
        assert_eq!(TrackWalk::new(None, 3).count(), 0);
    }
}
