//! OCR engine boundary
//!
//! Text recognition itself is an external capability. The checkpoint ships
//! one adapter that shells out to a configured command, in the same way the
//! local plate detector is wired in elsewhere in the project.

use std::process::Command;

use image::{GrayImage, ImageFormat};
use log::debug;
use serde::{Deserialize, Serialize};

use gatewatch_types::VisionFault;

/// One text hit reported by the OCR engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrCandidate {
    /// Polygon around the text, in crop coordinates
    #[serde(rename = "box", default)]
    pub bbox: Vec<[f32; 2]>,
    pub text: String,
    #[serde(alias = "prob", alias = "probability")]
    pub confidence: f32,
}

impl OcrCandidate {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox: Vec::new(),
            text: text.into(),
            confidence,
        }
    }
}

/// Reads text from a binarized plate crop
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<OcrCandidate>, VisionFault>;
}

/// Runs an external OCR command on a temporary PNG.
///
/// The command is called as `<command> --image <path>` and must print a JSON
/// array of `{"box": [[x, y], ...], "text": "...", "confidence": 0.9}` objects.
#[derive(Debug, Clone)]
pub struct CommandTextRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandTextRecognizer {
    /// Parse a shell-style command line such as `python3 ocr.py --lang pt`
    pub fn from_command_line(command: &str) -> Result<Self, VisionFault> {
        let mut parts = shell_words::split(command).map_err(|e| {
            VisionFault::InvalidParameter(format!("invalid OCR command {:?}: {}", command, e))
        })?;
        if parts.is_empty() {
            return Err(VisionFault::InvalidParameter("OCR command is empty".to_string()));
        }
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl TextRecognizer for CommandTextRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<OcrCandidate>, VisionFault> {
        let crop = tempfile::Builder::new()
            .prefix("gatewatch_plate_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| VisionFault::Ocr(format!("cannot create temp file: {}", e)))?;
        image.save_with_format(crop.path(), ImageFormat::Png)?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--image")
            .arg(crop.path())
            .output()
            .map_err(|e| VisionFault::Ocr(format!("{} failed to start: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VisionFault::Ocr(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_candidates(&stdout)
    }
}

/// Parse OCR command output, tolerating surrounding log noise or code fences.
///
/// Log lines may carry their own brackets (`[INFO] ...`), so every `[` is
/// tried from the left and the first one that opens a candidate array wins.
pub fn parse_candidates(output: &str) -> Result<Vec<OcrCandidate>, VisionFault> {
    let output = output.trim();
    if output.is_empty() {
        return Ok(Vec::new());
    }

    let mut last_error = None;
    for (start, _) in output.match_indices('[') {
        match first_array(&output[start..]) {
            Ok(candidates) => {
                debug!("OCR returned {} candidates", candidates.len());
                return Ok(candidates);
            }
            Err(e) => last_error = Some(e),
        }
    }

    let reason = match last_error {
        Some(e) => e.to_string(),
        None => "no JSON array in output".to_string(),
    };
    Err(VisionFault::Ocr(format!("unreadable OCR output: {}", reason)))
}

/// Deserialize the array at the start of `text`, ignoring whatever follows it
fn first_array(text: &str) -> serde_json::Result<Vec<OcrCandidate>> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Vec<OcrCandidate>>();
    match stream.next() {
        Some(result) => result,
        None => Err(serde::de::Error::custom("empty input")),
    }
}
