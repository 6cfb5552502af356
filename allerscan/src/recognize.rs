use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{ScanError, ScanResult};

/// Handle to an image the recognizer may read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    path: PathBuf,
}

impl ImageHandle {
    /// Opens a handle, failing if the image does not exist
    pub fn open(path: impl Into<PathBuf>) -> ScanResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(ScanError::image_not_found(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Which recognizer to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerKind {
    /// Run the `tesseract` command
    #[default]
    Tesseract,
    /// Read text recognized ahead of time from a `.txt` file
    Sidecar,
}

impl std::str::FromStr for RecognizerKind {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "sidecar" => Ok(Self::Sidecar),
            other => Err(ScanError::config_error(format!("Unknown recognizer: {}", other))),
        }
    }
}

/// Turns an image into text
pub trait Recognizer {
    fn recognize(&self, image: &ImageHandle) -> ScanResult<String>;
}

/// Recognizes text with the `tesseract` command-line engine
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
    language: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(language: Option<String>) -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            language,
        }
    }

    /// Uses a specific tesseract binary instead of the one on `PATH`
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &ImageHandle) -> ScanResult<String> {
        let mut command = Command::new(&self.program);
        command.arg(image.path()).arg("stdout");
        if let Some(language) = &self.language {
            command.arg("-l").arg(language);
        }

        info!("Running {} on {}", self.program.display(), image.path().display());
        let output = command.output().map_err(|e| {
            ScanError::recognition(format!("Failed to run {}: {}", self.program.display(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Recognition failed for {}: {}", image.path().display(), stderr.trim());
            return Err(ScanError::recognition(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Recognized {} bytes of text", text.len());
        Ok(text)
    }
}

/// Reads text recognized ahead of time.
///
/// For `label.png` the text is read from `label.png.txt`; a `.txt` image path
/// is read directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarRecognizer;

impl SidecarRecognizer {
    pub fn new() -> Self {
        Self
    }

    pub fn sidecar_path(image: &Path) -> PathBuf {
        if image.extension().is_some_and(|ext| ext == "txt") {
            return image.to_path_buf();
        }
        let mut path = image.as_os_str().to_owned();
        path.push(".txt");
        PathBuf::from(path)
    }
}

impl Recognizer for SidecarRecognizer {
    fn recognize(&self, image: &ImageHandle) -> ScanResult<String> {
        let path = Self::sidecar_path(image.path());
        debug!("Reading recognized text from {}", path.display());
        std::fs::read_to_string(&path).map_err(|e| {
            ScanError::recognition(format!("No recognized text at {}: {}", path.display(), e))
        })
    }
}

/// Creates a recognizer for the given kind
pub fn create_recognizer(kind: RecognizerKind, language: Option<String>) -> Box<dyn Recognizer> {
    match kind {
        RecognizerKind::Tesseract => Box::new(TesseractRecognizer::new(language)),
        RecognizerKind::Sidecar => Box::new(SidecarRecognizer::new()),
    }
}
