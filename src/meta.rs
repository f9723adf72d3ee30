use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::engine::{Engine, MediaHandle};
use crate::enums::Meta;
use crate::error::ErrorReporter;
use crate::media::Media;

/// Reads and writes the metadata tags of a media
///
/// Values are strings in the engine's own format. A media without a native
/// handle reads as empty and refuses to save.
pub struct MetaManager<'m> {
    engine: &'m dyn Engine,
    handle: Option<MediaHandle>,
}

impl<'m> MetaManager<'m> {
    pub fn new(media: &'m Media<'_>) -> Self {
        Self {
            engine: media.instance().engine(),
            handle: media.core(),
        }
    }

    /// Tag value, empty when unset or unavailable
    pub fn get(&self, meta: Meta) -> String {
        let Some(handle) = self.handle else {
            ErrorReporter::null_handle("media meta");
            return String::new();
        };
        ErrorReporter::begin(self.engine);
        let value = self.engine.media_meta(handle, meta);
        ErrorReporter::check(self.engine, "media meta");
        value.unwrap_or_default()
    }

    /// Change a tag in memory; [`save`](Self::save) writes it to the file
    pub fn set(&self, meta: Meta, value: &str) {
        let Some(handle) = self.handle else {
            ErrorReporter::null_handle("media set meta");
            return;
        };
        debug!("Meta {:?} = {}", meta, value);
        ErrorReporter::begin(self.engine);
        self.engine.media_set_meta(handle, meta, value);
        ErrorReporter::check(self.engine, "media set meta");
    }

    pub fn save(&self) -> bool {
        let Some(handle) = self.handle else {
            ErrorReporter::null_handle("media save meta");
            return false;
        };
        ErrorReporter::begin(self.engine);
        let saved = self.engine.media_save_meta(handle);
        ErrorReporter::check(self.engine, "media save meta");
        if saved {
            info!("Metadata saved");
        }
        saved
    }

    /// Every non-empty tag, keyed by field
    pub fn all(&self) -> BTreeMap<Meta, String> {
        Meta::all()
            .map(|meta| (meta, self.get(meta)))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }

    pub fn title(&self) -> String {
        self.get(Meta::Title)
    }

    pub fn set_title(&self, title: &str) {
        self.set(Meta::Title, title)
    }

    pub fn artist(&self) -> String {
        self.get(Meta::Artist)
    }

    pub fn set_artist(&self, artist: &str) {
        self.set(Meta::Artist, artist)
    }

    pub fn album(&self) -> String {
        self.get(Meta::Album)
    }

    pub fn set_album(&self, album: &str) {
        self.set(Meta::Album, album)
    }

    pub fn genre(&self) -> String {
        self.get(Meta::Genre)
    }

    pub fn set_genre(&self, genre: &str) {
        self.set(Meta::Genre, genre)
    }

    pub fn description(&self) -> String {
        self.get(Meta::Description)
    }

    pub fn set_description(&self, description: &str) {
        self.set(Meta::Description, description)
    }

    /// Release year, `0` when missing or not a number
    pub fn year(&self) -> i32 {
        self.get(Meta::Date).trim().parse().unwrap_or(0)
    }

    pub fn set_year(&self, year: i32) {
        self.set(Meta::Date, &year.to_string())
    }

    /// Track number, `0` when missing or not a number
    pub fn number(&self) -> i32 {
        self.get(Meta::TrackNumber).trim().parse().unwrap_or(0)
    }

    pub fn set_number(&self, number: i32) {
        self.set(Meta::TrackNumber, &number.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::instance::Instance;
    use std::rc::Rc;

    fn instance() -> Instance {
        Instance::new(Rc::new(MemoryEngine::new()), &[]).unwrap()
    }

    #[test]
    fn test_set_and_read_back() {
        let instance = instance();
        let media = Media::new(&instance, "song.ogg", true);
        let meta = MetaManager::new(&media);

        meta.set_title("Intro");
        meta.set_artist("Someone");
        meta.set_year(1999);
        meta.set_number(3);

        assert_eq!(meta.title(), "Intro");
        assert_eq!(meta.artist(), "Someone");
        assert_eq!(meta.year(), 1999);
        assert_eq!(meta.number(), 3);
        assert_eq!(meta.album(), "");
        assert!(meta.save());

        let all = meta.all();
        assert_eq!(all.len(), 4);
        assert_eq!(all.get(&Meta::Title).map(String::as_str), Some("Intro"));
    }

    #[test]
    fn test_non_numeric_year_is_zero() {
        let instance = instance();
        let media = Media::new(&instance, "song.ogg", true);
        let meta = MetaManager::new(&media);
        meta.set(Meta::Date, "circa 1970");
        assert_eq!(meta.year(), 0);
    }

    #[test]
    fn test_null_media_reads_empty() {
        let instance = instance();
        let media = Media::new(&instance, "", true);
        let meta = MetaManager::new(&media);

        assert_eq!(meta.title(), "");
        meta.set_genre("Jazz");
        assert!(!meta.save());
        assert!(ErrorReporter::last_error().unwrap().contains("null handle"));
    }
}
