use crate::config::{AudioConfig, FILE_PLACEHOLDER};
use crate::error::{JournalError, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

pub trait ImagePicker {
    /// Zero or one image as an embeddable reference. A blank `source` means the
    /// user cancelled.
    fn pick(&mut self, source: &str) -> Result<Option<String>>;
}

pub trait AudioRecorder {
    fn is_recording(&self) -> bool;
    fn start(&mut self) -> Result<()>;
    /// Returns a playable reference, or `None` when nothing was recording.
    fn stop(&mut self) -> Result<Option<String>>;
    fn play(&mut self, reference: &str) -> Result<()>;
}

/// Reads an image file from disk and inlines it as a `data:` URI.
pub struct FileImagePicker;

impl ImagePicker for FileImagePicker {
    fn pick(&mut self, source: &str) -> Result<Option<String>> {
        let source = source.trim();
        if source.is_empty() {
            return Ok(None);
        }
        let path = Path::new(source);
        let mime = image_mime(path).ok_or_else(|| {
            JournalError::Media(format!("{} is not a supported image", path.display()))
        })?;
        let bytes = fs::read(path).map_err(|e| JournalError::storage(path, e))?;
        Ok(Some(data_uri(mime, &bytes)))
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Records and plays voice notes through external commands from the config.
pub struct CommandRecorder {
    config: AudioConfig,
    dir: PathBuf,
    recording: Option<(Child, PathBuf)>,
    player: Option<Child>,
}

impl CommandRecorder {
    pub fn new(config: AudioConfig, dir: impl Into<PathBuf>) -> Self {
        CommandRecorder {
            config,
            dir: dir.into(),
            recording: None,
            player: None,
        }
    }

    fn spawn(template: &[String], file: &Path) -> Result<Child> {
        let (program, args) = template
            .split_first()
            .ok_or_else(|| JournalError::Media("audio command is not configured".to_string()))?;
        let file = file.to_string_lossy();
        Command::new(program)
            .args(args.iter().map(|a| a.replace(FILE_PLACEHOLDER, &file)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| JournalError::Media(format!("failed to run {program}: {e}")))
    }
}

impl AudioRecorder for CommandRecorder {
    fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    fn start(&mut self) -> Result<()> {
        if self.recording.is_some() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|e| JournalError::storage(&self.dir, e))?;
        let file = self
            .dir
            .join(format!("voice-{}.wav", Local::now().timestamp_millis()));
        let child = Self::spawn(&self.config.record_command, &file)?;
        tracing::info!("Recording voice note to {}", file.display());
        self.recording = Some((child, file));
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<String>> {
        let Some((mut child, file)) = self.recording.take() else {
            return Ok(None);
        };
        if let Err(e) = child.kill() {
            tracing::warn!("Recorder had already exited: {}", e);
        }
        child
            .wait()
            .map_err(|e| JournalError::Media(format!("failed to stop recorder: {e}")))?;
        Ok(Some(file.to_string_lossy().into_owned()))
    }

    fn play(&mut self, reference: &str) -> Result<()> {
        if let Some(mut previous) = self.player.take() {
            let _ = previous.kill();
            let _ = previous.wait();
        }
        let path = Path::new(reference);
        if !path.exists() {
            return Err(JournalError::Media(format!(
                "voice note {} is missing",
                path.display()
            )));
        }
        self.player = Some(Self::spawn(&self.config.play_command, path)?);
        Ok(())
    }
}

impl Drop for CommandRecorder {
    fn drop(&mut self) {
        for child in self
            .recording
            .as_mut()
            .map(|(c, _)| c)
            .into_iter()
            .chain(self.player.as_mut())
        {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn picker_inlines_image_as_data_uri() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cat.PNG");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let picked = FileImagePicker.pick(path.to_str().unwrap()).unwrap();
        assert_eq!(picked.as_deref(), Some("data:image/png;base64,AQID"));
    }

    #[test]
    fn picker_blank_source_is_cancel() {
        assert_eq!(FileImagePicker.pick("  ").unwrap(), None);
    }

    #[test]
    fn picker_rejects_non_images() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "x").unwrap();
        assert!(matches!(
            FileImagePicker.pick(path.to_str().unwrap()),
            Err(JournalError::Media(_))
        ));
    }

    #[test]
    fn unconfigured_recorder_reports_media_error() {
        let temp = TempDir::new().unwrap();
        let mut recorder = CommandRecorder::new(AudioConfig::default(), temp.path());
        assert!(matches!(recorder.start(), Err(JournalError::Media(_))));
        assert!(!recorder.is_recording());
        assert_eq!(recorder.stop().unwrap(), None);
    }
}
