// Engine vocabularies
//
// Each preset the engine understands as a string is a closed enum here, with
// an explicit table mapping every variant to the engine's spelling. The table
// order is the engine's preset order, so `all()` doubles as the index list a
// GUI combo box would show.

use serde::{Deserialize, Serialize};

/// Output container used by duplicate and record outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mux {
    #[serde(rename = "ts")]
    Ts,
    #[serde(rename = "ps")]
    Ps,
    #[serde(rename = "mp4")]
    Mp4,
    #[serde(rename = "ogg")]
    Ogg,
    #[serde(rename = "avi")]
    Avi,
}

impl Mux {
    const TABLE: [(Mux, &'static str); 5] = [
        (Mux::Ts, "ts"),
        (Mux::Ps, "ps"),
        (Mux::Mp4, "mp4"),
        (Mux::Ogg, "ogg"),
        (Mux::Avi, "avi"),
    ];

    pub fn all() -> impl Iterator<Item = Mux> {
        Self::TABLE.iter().map(|(m, _)| *m)
    }

    /// Engine mux name, also used as the output file extension
    pub fn as_str(&self) -> &'static str {
        lookup(&Self::TABLE, self)
    }

    pub fn from_engine(value: &str) -> Option<Self> {
        reverse(&Self::TABLE, value)
    }
}

/// Audio codec for transcoded recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCodec {
    #[serde(rename = "none")]
    NoAudio,
    #[serde(rename = "mpga")]
    Mpeg2Audio,
    #[serde(rename = "mp3")]
    Mp3,
    #[serde(rename = "mp4a")]
    Mpeg4Audio,
    #[serde(rename = "vorb")]
    Vorbis,
    #[serde(rename = "flac")]
    Flac,
}

impl AudioCodec {
    const TABLE: [(AudioCodec, &'static str); 6] = [
        (AudioCodec::NoAudio, "none"),
        (AudioCodec::Mpeg2Audio, "mpga"),
        (AudioCodec::Mp3, "mp3"),
        (AudioCodec::Mpeg4Audio, "mp4a"),
        (AudioCodec::Vorbis, "vorb"),
        (AudioCodec::Flac, "flac"),
    ];

    pub fn all() -> impl Iterator<Item = AudioCodec> {
        Self::TABLE.iter().map(|(c, _)| *c)
    }

    pub fn as_str(&self) -> &'static str {
        lookup(&Self::TABLE, self)
    }

    pub fn from_engine(value: &str) -> Option<Self> {
        reverse(&Self::TABLE, value)
    }
}

/// Video codec for transcoded recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    #[serde(rename = "none")]
    NoVideo,
    #[serde(rename = "mp2v")]
    Mpeg2Video,
    #[serde(rename = "mp4v")]
    Mpeg4Video,
    #[serde(rename = "h264")]
    H264,
    #[serde(rename = "theo")]
    Theora,
}

impl VideoCodec {
    const TABLE: [(VideoCodec, &'static str); 5] = [
        (VideoCodec::NoVideo, "none"),
        (VideoCodec::Mpeg2Video, "mp2v"),
        (VideoCodec::Mpeg4Video, "mp4v"),
        (VideoCodec::H264, "h264"),
        (VideoCodec::Theora, "theo"),
    ];

    pub fn all() -> impl Iterator<Item = VideoCodec> {
        Self::TABLE.iter().map(|(c, _)| *c)
    }

    pub fn as_str(&self) -> &'static str {
        lookup(&Self::TABLE, self)
    }

    pub fn from_engine(value: &str) -> Option<Self> {
        reverse(&Self::TABLE, value)
    }
}

/// Aspect ratio and crop geometry presets
///
/// `Unknown` stands for any geometry string the engine reports that is not
/// one of the presets (custom crops such as `"640x480+0+0"`). It has no
/// engine spelling and cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ratio {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "16:9")]
    R16x9,
    #[serde(rename = "16:10")]
    R16x10,
    #[serde(rename = "185:100")]
    R185x100,
    #[serde(rename = "221:100")]
    R221x100,
    #[serde(rename = "235:100")]
    R235x100,
    #[serde(rename = "239:100")]
    R239x100,
    #[serde(rename = "5:3")]
    R5x3,
    #[serde(rename = "4:3")]
    R4x3,
    #[serde(rename = "5:4")]
    R5x4,
    #[serde(rename = "1:1")]
    R1x1,
    #[serde(skip)]
    Unknown,
}

impl Ratio {
    const TABLE: [(Ratio, &'static str); 11] = [
        (Ratio::Original, ""),
        (Ratio::R16x9, "16:9"),
        (Ratio::R16x10, "16:10"),
        (Ratio::R185x100, "185:100"),
        (Ratio::R221x100, "221:100"),
        (Ratio::R235x100, "235:100"),
        (Ratio::R239x100, "239:100"),
        (Ratio::R5x3, "5:3"),
        (Ratio::R4x3, "4:3"),
        (Ratio::R5x4, "5:4"),
        (Ratio::R1x1, "1:1"),
    ];

    /// Presets in engine order. `Unknown` is not a preset.
    pub fn all() -> impl Iterator<Item = Ratio> {
        Self::TABLE.iter().map(|(r, _)| *r)
    }

    /// Engine spelling; `None` for `Unknown`.
    pub fn as_engine(&self) -> Option<&'static str> {
        Self::TABLE
            .iter()
            .find(|(r, _)| r == self)
            .map(|(_, s)| *s)
    }

    /// Map an engine geometry string back to a preset.
    ///
    /// A missing value means the engine runs with the source geometry.
    pub fn from_engine(value: Option<&str>) -> Self {
        let value = value.unwrap_or("");
        Self::TABLE
            .iter()
            .find(|(_, s)| *s == value)
            .map(|(r, _)| *r)
            .unwrap_or(Ratio::Unknown)
    }

    /// Position in the preset list, `None` for `Unknown`
    pub fn index(&self) -> Option<usize> {
        Self::TABLE.iter().position(|(r, _)| r == self)
    }
}

/// Deinterlacing filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deinterlacing {
    #[serde(rename = "disabled")]
    Disabled,
    #[serde(rename = "discard")]
    Discard,
    #[serde(rename = "blend")]
    Blend,
    #[serde(rename = "mean")]
    Mean,
    #[serde(rename = "bob")]
    Bob,
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "x")]
    X,
    #[serde(rename = "yadif")]
    Yadif,
    #[serde(rename = "yadif2x")]
    Yadif2x,
}

impl Deinterlacing {
    const TABLE: [(Deinterlacing, &'static str); 9] = [
        (Deinterlacing::Disabled, ""),
        (Deinterlacing::Discard, "discard"),
        (Deinterlacing::Blend, "blend"),
        (Deinterlacing::Mean, "mean"),
        (Deinterlacing::Bob, "bob"),
        (Deinterlacing::Linear, "linear"),
        (Deinterlacing::X, "x"),
        (Deinterlacing::Yadif, "yadif"),
        (Deinterlacing::Yadif2x, "yadif2x"),
    ];

    pub fn all() -> impl Iterator<Item = Deinterlacing> {
        Self::TABLE.iter().map(|(d, _)| *d)
    }

    /// Engine filter name; `None` turns deinterlacing off.
    pub fn as_engine(&self) -> Option<&'static str> {
        match lookup(&Self::TABLE, self) {
            "" => None,
            name => Some(name),
        }
    }

    pub fn from_engine(value: Option<&str>) -> Option<Self> {
        reverse(&Self::TABLE, value.unwrap_or(""))
    }
}

/// Player states, in the engine's numeric order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum State {
    #[default]
    Idle,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error,
}

impl State {
    pub fn from_engine(value: i32) -> Self {
        match value {
            1 => State::Opening,
            2 => State::Buffering,
            3 => State::Playing,
            4 => State::Paused,
            5 => State::Stopped,
            6 => State::Ended,
            7 => State::Error,
            _ => State::Idle,
        }
    }

    pub fn as_engine(&self) -> i32 {
        match self {
            State::Idle => 0,
            State::Opening => 1,
            State::Buffering => 2,
            State::Playing => 3,
            State::Paused => 4,
            State::Stopped => 5,
            State::Ended => 6,
            State::Error => 7,
        }
    }

    /// `Ended` and `Error` hold until another media is bound.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Ended | State::Error)
    }
}

/// Media meta fields, in the engine's numeric order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Meta {
    Title,
    Artist,
    Genre,
    Copyright,
    Album,
    TrackNumber,
    Description,
    Rating,
    Date,
    Setting,
    Url,
    Language,
    NowPlaying,
    Publisher,
    EncodedBy,
    ArtworkUrl,
    TrackId,
}

impl Meta {
    const ALL: [Meta; 17] = [
        Meta::Title,
        Meta::Artist,
        Meta::Genre,
        Meta::Copyright,
        Meta::Album,
        Meta::TrackNumber,
        Meta::Description,
        Meta::Rating,
        Meta::Date,
        Meta::Setting,
        Meta::Url,
        Meta::Language,
        Meta::NowPlaying,
        Meta::Publisher,
        Meta::EncodedBy,
        Meta::ArtworkUrl,
        Meta::TrackId,
    ];

    pub fn all() -> impl Iterator<Item = Meta> {
        Self::ALL.iter().copied()
    }

    pub fn as_engine(&self) -> i32 {
        Self::ALL.iter().position(|m| m == self).unwrap_or(0) as i32
    }
}

fn lookup<T: PartialEq>(table: &[(T, &'static str)], value: &T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| v == value)
        .map(|(_, s)| *s)
        .unwrap_or("")
}

fn reverse<T: Copy>(table: &[(T, &'static str)], value: &str) -> Option<T> {
    table.iter().find(|(_, s)| *s == value).map(|(v, _)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_round_trip_for_every_preset() {
        for ratio in Ratio::all() {
            assert_eq!(Ratio::from_engine(ratio.as_engine()), ratio);
        }
    }

    #[test]
    fn test_ratio_unknown_geometry() {
        assert_eq!(Ratio::from_engine(Some("640x480+0+0")), Ratio::Unknown);
        assert_eq!(Ratio::Unknown.as_engine(), None);
        assert_eq!(Ratio::Unknown.index(), None);
        assert_eq!(Ratio::from_engine(None), Ratio::Original);
        assert_eq!(Ratio::R4x3.index(), Some(8));
    }

    #[test]
    fn test_deinterlacing_disabled_has_no_filter_name() {
        assert_eq!(Deinterlacing::Disabled.as_engine(), None);
        assert_eq!(Deinterlacing::Yadif2x.as_engine(), Some("yadif2x"));
        assert_eq!(Deinterlacing::from_engine(None), Some(Deinterlacing::Disabled));
        assert_eq!(Deinterlacing::from_engine(Some("sharpen")), None);
    }

    #[test]
    fn test_every_filter_name_maps_back() {
        assert_eq!(Deinterlacing::all().count(), 9);
        for filter in Deinterlacing::all() {
            assert_eq!(Deinterlacing::from_engine(filter.as_engine()), Some(filter));
        }
    }

    #[test]
    fn test_state_numeric_mapping() {
        for value in 0..8 {
            assert_eq!(State::from_engine(value).as_engine(), value);
        }
        assert_eq!(State::from_engine(42), State::Idle);
        assert!(State::Ended.is_terminal());
        assert!(!State::Stopped.is_terminal());
    }

    #[test]
    fn test_mux_names_are_extensions() {
        assert_eq!(Mux::Mp4.as_str(), "mp4");
        assert_eq!(Mux::from_engine("ogg"), Some(Mux::Ogg));
        assert_eq!(Mux::all().count(), 5);
        assert_eq!(AudioCodec::Mpeg4Audio.as_str(), "mp4a");
        assert_eq!(VideoCodec::from_engine("h264"), Some(VideoCodec::H264));
    }

    #[test]
    fn test_meta_numeric_order() {
        assert_eq!(Meta::Title.as_engine(), 0);
        assert_eq!(Meta::TrackId.as_engine(), 16);
    }
}
