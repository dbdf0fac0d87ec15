//! Screen-recording capture for mobile sessions.
//!
//! The device encodes the video; this layer only starts/stops the
//! recording through the backend and lands the returned MP4 bytes under
//! `videos/<test_id>.mp4`. Backends without a recording surface degrade to
//! a logged skip — requesting video on a desktop run is a configuration
//! wrinkle, not a test failure.

use crate::backend::Backend;
use crate::result::{PilotError, PilotResult};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Captures one recording per test on a backend handle
#[derive(Debug)]
pub struct VideoRecorder {
    videos_dir: PathBuf,
    active: bool,
}

impl VideoRecorder {
    /// Recorder writing into `videos_dir`
    #[must_use]
    pub fn new(videos_dir: impl Into<PathBuf>) -> Self {
        Self {
            videos_dir: videos_dir.into(),
            active: false,
        }
    }

    /// Whether a recording is in flight
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Start recording. Unsupported backends log and skip.
    pub fn start<B: Backend>(&mut self, backend: &mut B) {
        match backend.start_recording() {
            Ok(()) => self.active = true,
            Err(e) => {
                warn!(kind = %backend.kind(), error = %e, "video capture unavailable; skipped");
            }
        }
    }

    /// Stop recording and write the capture for `test_id`.
    ///
    /// Returns the written path, or `None` when nothing was recording.
    ///
    /// # Errors
    ///
    /// I/O errors writing the file, or a recording error from the backend.
    pub fn stop_and_save<B: Backend>(
        &mut self,
        backend: &mut B,
        test_id: &str,
    ) -> PilotResult<Option<PathBuf>> {
        if !self.active {
            return Ok(None);
        }
        self.active = false;
        let bytes = backend.stop_recording()?;
        if bytes.is_empty() {
            return Err(PilotError::Recording {
                message: "device returned an empty recording".to_string(),
            });
        }
        std::fs::create_dir_all(&self.videos_dir)?;
        let path = self.videos_dir.join(format!("{}.mp4", sanitize(test_id)));
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), "recording saved");
        Ok(Some(path))
    }
}

/// Make a test id filesystem-safe
fn sanitize(test_id: &str) -> String {
    test_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    #[test]
    fn test_sanitize_flattens_separators() {
        assert_eq!(sanitize("android::calculator::sum"), "android__calculator__sum");
        assert_eq!(sanitize("plain_name-1"), "plain_name-1");
    }

    #[test]
    fn test_capture_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockBackend::mobile();
        mock.set_recording_bytes(vec![0, 0, 0, 0x18, b'f', b't', b'y', b'p']);

        let mut recorder = VideoRecorder::new(dir.path());
        recorder.start(&mut mock);
        assert!(recorder.is_active());

        let path = recorder
            .stop_and_save(&mut mock, "android::calculator::sum")
            .unwrap()
            .unwrap();
        assert!(path.ends_with("android__calculator__sum.mp4"));
        assert_eq!(std::fs::read(path).unwrap().len(), 8);
        assert!(!recorder.is_active());
    }

    #[test]
    fn test_unsupported_backend_skips() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockBackend::desktop();

        let mut recorder = VideoRecorder::new(dir.path());
        recorder.start(&mut mock);
        assert!(!recorder.is_active());
        let saved = recorder.stop_and_save(&mut mock, "web::x").unwrap();
        assert!(saved.is_none());
    }

    #[test]
    fn test_empty_recording_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockBackend::mobile();
        mock.set_recording_bytes(Vec::new());

        let mut recorder = VideoRecorder::new(dir.path());
        recorder.start(&mut mock);
        let err = recorder.stop_and_save(&mut mock, "android::x").unwrap_err();
        assert!(matches!(err, PilotError::Recording { .. }));
    }
}
