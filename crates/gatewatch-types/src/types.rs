//! Shared data types for the checkpoint

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single camera frame (RGB8).
///
/// Frames are handed to the core by the frame source and dropped after the
/// decision for that tick; nothing in the core keeps one around.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
        }
    }

    /// Decode a frame from an image file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let image = image::open(path)?;
        Ok(Self::from_dynamic(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }
}

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Four-cornered plate region, corners in contour order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Axis-aligned bounds as (min_x, min_y, max_x, max_y), inclusive
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        let xs = self.corners.iter().map(|p| p.x);
        let ys = self.corners.iter().map(|p| p.y);
        (
            xs.clone().min().unwrap_or(0),
            ys.clone().min().unwrap_or(0),
            xs.max().unwrap_or(0),
            ys.max().unwrap_or(0),
        )
    }

    /// True when the corners do not span a 2-D area
    pub fn is_degenerate(&self) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        if min_x == max_x || min_y == max_y {
            return true;
        }
        self.corners[0] == self.corners[3]
    }
}

/// One plate read from one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateObservation {
    /// Normalized plate text
    pub text: String,
    /// OCR probability in [0, 1]
    pub confidence: f32,
    pub region: Quad,
}

/// Authorization status of a registered vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VehicleStatus {
    #[default]
    Authorized,
    Blocked,
    Suspect,
}

impl VehicleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Authorized => "AUTHORIZED",
            VehicleStatus::Blocked => "BLOCKED",
            VehicleStatus::Suspect => "SUSPECT",
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = Error;

    /// Accepts the English labels and the legacy registry labels.
    /// An empty value means the registration default (authorized).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "" | "AUTHORIZED" | "AUTORIZADO" => Ok(VehicleStatus::Authorized),
            "BLOCKED" | "BLOQUEADO" => Ok(VehicleStatus::Blocked),
            "SUSPECT" | "SUSPEITO" => Ok(VehicleStatus::Suspect),
            _ => Err(Error::UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for VehicleStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VehicleStatus> for String {
    fn from(status: VehicleStatus) -> Self {
        status.label().to_string()
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Registered vehicle as returned by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// License plate (unique key, normalized)
    pub plate: String,
    #[serde(default)]
    pub owner: String,
    /// Free-form category (e.g. "STAFF", "STUDENT", "VISITOR")
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub note: String,
}

impl VehicleRecord {
    pub fn new(plate: impl Into<String>, status: VehicleStatus) -> Self {
        Self {
            plate: plate.into(),
            owner: String::new(),
            category: String::new(),
            status,
            note: String::new(),
        }
    }
}

/// One campus visit. Open while `exit_time` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub id: u64,
    pub plate: String,
    pub date: NaiveDate,
    pub entry_time: NaiveTime,
    #[serde(default)]
    pub exit_time: Option<NaiveTime>,
}

impl AccessEvent {
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Time between entry and exit; `None` while open, never negative
    pub fn dwell(&self) -> Option<Duration> {
        self.exit_time
            .map(|exit| (exit - self.entry_time).to_std().unwrap_or_default())
    }
}

/// Decision emitted for each processed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionEvent {
    NoObservation,
    UnknownVehicle {
        plate: String,
    },
    BlockedAlert {
        plate: String,
    },
    Entry {
        plate: String,
        time: NaiveDateTime,
    },
    Exit {
        plate: String,
        time: NaiveDateTime,
        #[serde(with = "duration_secs")]
        dwell: Duration,
    },
    DuplicateIgnored {
        plate: String,
    },
}

impl DecisionEvent {
    pub fn plate(&self) -> Option<&str> {
        match self {
            DecisionEvent::NoObservation => None,
            DecisionEvent::UnknownVehicle { plate }
            | DecisionEvent::BlockedAlert { plate }
            | DecisionEvent::Entry { plate, .. }
            | DecisionEvent::Exit { plate, .. }
            | DecisionEvent::DuplicateIgnored { plate } => Some(plate),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DecisionEvent::NoObservation => "NO_OBSERVATION",
            DecisionEvent::UnknownVehicle { .. } => "UNKNOWN_VEHICLE",
            DecisionEvent::BlockedAlert { .. } => "BLOCKED_ALERT",
            DecisionEvent::Entry { .. } => "ENTRY",
            DecisionEvent::Exit { .. } => "EXIT",
            DecisionEvent::DuplicateIgnored { .. } => "DUPLICATE_IGNORED",
        }
    }
}

impl std::fmt::Display for DecisionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionEvent::NoObservation => write!(f, "no plate in frame"),
            DecisionEvent::UnknownVehicle { plate } => write!(f, "{}: unregistered visitor", plate),
            DecisionEvent::BlockedAlert { plate } => write!(f, "ALERT: {} is BLOCKED", plate),
            DecisionEvent::Entry { plate, time } => {
                write!(f, "{}: entry at {}", plate, time.format("%H:%M:%S"))
            }
            DecisionEvent::Exit { plate, time, dwell } => write!(
                f,
                "{}: exit at {} (stayed {})",
                plate,
                time.format("%H:%M:%S"),
                format_dwell(*dwell)
            ),
            DecisionEvent::DuplicateIgnored { plate } => write!(f, "{}: duplicate read ignored", plate),
        }
    }
}

/// Format a dwell as H:MM:SS
pub fn format_dwell(dwell: Duration) -> String {
    let secs = dwell.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_legacy_labels() {
        assert_eq!("bloqueado".parse::<VehicleStatus>().unwrap(), VehicleStatus::Blocked);
        assert_eq!("SUSPEITO".parse::<VehicleStatus>().unwrap(), VehicleStatus::Suspect);
        assert_eq!("".parse::<VehicleStatus>().unwrap(), VehicleStatus::Authorized);
    }

    #[test]
    fn test_status_rejects_unknown() {
        let err = "VIP".parse::<VehicleStatus>().unwrap_err();
        assert!(matches!(err, Error::UnknownStatus(ref s) if s == "VIP"));
    }

    #[test]
    fn test_vehicle_record_rejects_unknown_status_in_json() {
        let json = r#"{"plate":"ABC1234","status":"MAYBE"}"#;
        assert!(serde_json::from_str::<VehicleRecord>(json).is_err());
    }

    #[test]
    fn test_dwell_of_open_and_closed_event() {
        let mut event = AccessEvent {
            id: 1,
            plate: "ABC1234".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            entry_time: NaiveTime::from_hms_opt(8, 5, 0).unwrap(),
            exit_time: None,
        };
        assert!(event.is_open());
        assert_eq!(event.dwell(), None);

        event.exit_time = NaiveTime::from_hms_opt(9, 0, 0);
        assert_eq!(event.dwell(), Some(Duration::from_secs(55 * 60)));
    }

    #[test]
    fn test_exit_event_serializes_dwell_in_seconds() {
        let event = DecisionEvent::Exit {
            plate: "ABC1234".to_string(),
            time: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            dwell: Duration::from_secs(3300),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "EXIT");
        assert_eq!(json["dwell"], 3300);
        assert_eq!(event.to_string(), "ABC1234: exit at 09:00:00 (stayed 0:55:00)");
    }

    #[test]
    fn test_degenerate_quad() {
        let flat = Quad::new([
            Point::new(0, 5),
            Point::new(10, 5),
            Point::new(20, 5),
            Point::new(30, 5),
        ]);
        assert!(flat.is_degenerate());

        let rect = Quad::new([
            Point::new(0, 0),
            Point::new(0, 10),
            Point::new(30, 10),
            Point::new(30, 0),
        ]);
        assert!(!rect.is_degenerate());
        assert_eq!(rect.bounds(), (0, 0, 30, 10));
    }
}
