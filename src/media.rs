use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::engine::{Engine, MediaHandle};
use crate::enums::{AudioCodec, Mux, VideoCodec};
use crate::error::ErrorReporter;
use crate::instance::Instance;

/// Location reported by a media whose native handle could not be created
pub const UNKNOWN_LOCATION: &str = ":::";

/// One playable resource: a local file, a URL, or an adopted native handle
///
/// The media owns one engine reference and releases it on drop. Options
/// (including the ones set by [`duplicate`](Media::duplicate) and
/// [`record`](Media::record)) only take effect if they are queued before the
/// media is handed to a player.
pub struct Media<'i> {
    instance: &'i Instance,
    handle: Option<MediaHandle>,
    location: OnceCell<String>,
}

impl<'i> Media<'i> {
    /// Create a media from a path (`local_file`) or an MRL
    pub fn new(instance: &'i Instance, location: &str, local_file: bool) -> Self {
        let engine = instance.engine();
        ErrorReporter::begin(engine);
        let handle = if local_file {
            engine.media_new_path(instance.core(), location)
        } else {
            engine.media_new_location(instance.core(), location)
        };
        ErrorReporter::check(engine, "media new");

        let location = match handle {
            Some(_) => {
                debug!("Media created for {}", location);
                OnceCell::from(location.to_string())
            }
            None => OnceCell::from(UNKNOWN_LOCATION.to_string()),
        };

        Self {
            instance,
            handle,
            location,
        }
    }

    /// Create a media from a remote location
    pub fn remote(instance: &'i Instance, location: &str) -> Self {
        Self::new(instance, location, false)
    }

    /// Adopt an existing media handle; its reference now belongs to this media
    pub fn wrap(instance: &'i Instance, handle: MediaHandle) -> Self {
        Self {
            instance,
            handle: Some(handle),
            location: OnceCell::new(),
        }
    }

    pub fn core(&self) -> Option<MediaHandle> {
        self.handle
    }

    pub(crate) fn instance(&self) -> &'i Instance {
        self.instance
    }

    fn engine(&self) -> &'i dyn Engine {
        self.instance.engine()
    }

    /// Location the media was created from, or the engine's MRL for adopted handles
    pub fn current_location(&self) -> String {
        self.location
            .get_or_init(|| {
                let Some(handle) = self.handle else {
                    return UNKNOWN_LOCATION.to_string();
                };
                ErrorReporter::begin(self.engine());
                let mrl = self.engine().media_mrl(handle);
                ErrorReporter::check(self.engine(), "media mrl");
                mrl.unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
            })
            .clone()
    }

    /// Queue an engine option (`:key=value`) for the next playback
    pub fn set_option(&self, option: &str) {
        let Some(handle) = self.handle else {
            ErrorReporter::null_handle("media add option");
            return;
        };
        debug!("Media option: {}", option);
        ErrorReporter::begin(self.engine());
        self.engine().media_add_option(handle, option);
        ErrorReporter::check(self.engine(), "media add option");
    }

    /// Write the stream to `path/name.<mux>` while still displaying it
    ///
    /// Returns the output file the engine was told to write. Nothing checks
    /// that the file is actually produced.
    pub fn duplicate(&self, name: &str, path: &Path, mux: Mux) -> PathBuf {
        let output = output_file(name, path, mux);
        let parameters = std_output(mux, &output);
        info!("Duplicating {} to {}", self.current_location(), output.display());

        self.set_option(":sout-all");
        self.set_option(&format!(":sout=#duplicate{{dst=display,dst=\"{}\"}}", parameters));
        output
    }

    /// Write the stream to `path/name.<mux>` without transcoding
    pub fn record(&self, name: &str, path: &Path, mux: Mux) -> PathBuf {
        let output = output_file(name, path, mux);
        let parameters = std_output(mux, &output);
        info!("Recording {} to {}", self.current_location(), output.display());

        self.set_option(":sout-all");
        self.set_option(&format!(":sout=#{}", parameters));
        output
    }

    /// Write the stream to `path/name.<mux>`, transcoding audio and video
    ///
    /// Experimental: the engine may silently ignore codec combinations it
    /// cannot produce for the chosen mux.
    pub fn record_transcoded(
        &self,
        name: &str,
        path: &Path,
        mux: Mux,
        audio_codec: AudioCodec,
        video_codec: VideoCodec,
    ) -> PathBuf {
        let output = output_file(name, path, mux);
        let parameters = format!(
            "transcode{{vcodec={},acodec={}}}:{}",
            video_codec.as_str(),
            audio_codec.as_str(),
            std_output(mux, &output)
        );
        info!(
            "Recording {} to {} ({}/{})",
            self.current_location(),
            output.display(),
            video_codec.as_str(),
            audio_codec.as_str()
        );

        self.set_option(":sout-all");
        self.set_option(&format!(":sout=#{}", parameters));
        output
    }
}

impl Drop for Media<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine().media_release(handle);
            ErrorReporter::check(self.engine(), "media release");
        }
    }
}

impl std::fmt::Debug for Media<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Media")
            .field("handle", &self.handle)
            .field("location", &self.location.get())
            .finish()
    }
}

fn output_file(name: &str, path: &Path, mux: Mux) -> PathBuf {
    path.join(format!("{}.{}", name, mux.as_str()))
}

fn std_output(mux: Mux, output: &Path) -> String {
    format!("std{{access=file,mux={},dst='{}'}}", mux.as_str(), output.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use std::rc::Rc;

    fn setup() -> (Rc<MemoryEngine>, Instance) {
        let engine = Rc::new(MemoryEngine::new());
        let instance = Instance::new(engine.clone(), &[]).unwrap();
        (engine, instance)
    }

    fn instance() -> Instance {
        setup().1
    }

    #[test]
    fn test_failed_creation_reports_sentinel_location() {
        let instance = instance();
        let media = Media::new(&instance, "", true);
        assert!(media.core().is_none());
        assert_eq!(media.current_location(), UNKNOWN_LOCATION);
        assert!(ErrorReporter::last_error().is_some());
    }

    #[test]
    fn test_location_is_cached_from_creation() {
        let instance = instance();
        let media = Media::new(&instance, "sample.mp4", true);
        assert_eq!(media.current_location(), "sample.mp4");

        let remote = Media::remote(&instance, "http://example.com/stream.ts");
        assert_eq!(remote.current_location(), "http://example.com/stream.ts");
    }

    #[test]
    fn test_wrapped_media_queries_engine_location() {
        let instance = instance();
        let handle = instance
            .engine()
            .media_new_path(instance.core(), "/videos/clip.mkv")
            .unwrap();
        let media = Media::wrap(&instance, handle);
        assert_eq!(media.current_location(), "file:///videos/clip.mkv");
    }

    #[test]
    fn test_duplicate_before_playback() {
        let (engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let output = media.duplicate("out", Path::new("/tmp"), Mux::Mp4);

        assert_eq!(output, PathBuf::from("/tmp/out.mp4"));
        assert_eq!(
            engine.media_options(media.core().unwrap()),
            vec![
                ":sout-all".to_string(),
                ":sout=#duplicate{dst=display,dst=\"std{access=file,mux=mp4,dst='/tmp/out.mp4'}\"}"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_record_and_transcode_options() {
        let (engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let output = media.record("capture", Path::new("/tmp"), Mux::Ts);
        assert_eq!(output, PathBuf::from("/tmp/capture.ts"));

        let transcoded = Media::new(&instance, "sample.mp4", true);
        let output = transcoded.record_transcoded(
            "capture",
            Path::new("/tmp"),
            Mux::Ogg,
            AudioCodec::Vorbis,
            VideoCodec::Theora,
        );
        assert_eq!(output, PathBuf::from("/tmp/capture.ogg"));
        assert_eq!(
            engine.media_options(transcoded.core().unwrap())[1],
            ":sout=#transcode{vcodec=theo,acodec=vorb}:std{access=file,mux=ogg,dst='/tmp/capture.ogg'}"
        );
        assert_eq!(
            engine.media_options(media.core().unwrap())[1],
            ":sout=#std{access=file,mux=ts,dst='/tmp/capture.ts'}"
        );
    }

    #[test]
    fn test_drop_releases_reference_once() {
        let (engine, instance) = setup();
        let media = Media::new(&instance, "sample.mp4", true);
        let handle = media.core().unwrap();
        assert_eq!(engine.media_refs(handle), 1);
        drop(media);
        assert_eq!(engine.media_refs(handle), 0);
    }

    #[test]
    fn test_set_option_on_null_media_is_guarded() {
        let instance = instance();
        let media = Media::new(&instance, "", false);
        media.set_option(":no-audio");
        assert!(ErrorReporter::last_error().unwrap().contains("null handle"));
    }
}
