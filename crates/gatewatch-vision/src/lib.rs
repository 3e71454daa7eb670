//! Vision module - plate localization and reading from camera frames

pub mod annotate;
pub mod geometry;
pub mod locator;
pub mod ocr;
pub mod pipeline;
pub mod reader;

pub use annotate::annotate_observation;
pub use locator::{LocatorConfig, PlateLocator};
pub use ocr::{CommandTextRecognizer, OcrCandidate, TextRecognizer};
pub use pipeline::RecognitionPipeline;
pub use reader::{PlateReader, ReaderConfig};
