//! Vehicle registry loader from TOML or CSV
//!
//! TOML files hold a `[[vehicles]]` array; CSV files carry a
//! `plate,owner,category,status,note` header. Plates are normalized on load
//! and a plate listed twice is rejected.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use gatewatch_domain::model::normalize_plate;
use gatewatch_types::{ConfigError, Error, Result, VehicleRecord, VehicleStatus};

/// Registry row before status parsing
#[derive(Debug, Deserialize)]
struct RawVehicle {
    plate: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    note: String,
}

impl RawVehicle {
    fn into_record(self) -> Result<VehicleRecord> {
        let status: VehicleStatus = self.status.parse()?;
        Ok(VehicleRecord {
            plate: normalize_plate(&self.plate),
            owner: self.owner.trim().to_string(),
            category: self.category.trim().to_string(),
            status,
            note: self.note.trim().to_string(),
        })
    }
}

/// Container for parsing vehicles.toml
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    vehicles: Vec<RawVehicle>,
}

/// Registry file layout, picked from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    Toml,
    Csv,
}

impl RegistryFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::Registry(format!(
                "unsupported registry file (expected .toml or .csv): {}",
                path.display()
            ))),
        }
    }
}

/// Load every record from a registry file, keyed by normalized plate
pub fn load_from_file(path: &Path) -> Result<HashMap<String, VehicleRecord>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    match RegistryFormat::from_path(path)? {
        RegistryFormat::Toml => {
            let content = fs::read_to_string(path)?;
            load_toml_str(&content)
        }
        RegistryFormat::Csv => {
            let file = fs::File::open(path)?;
            load_csv_reader(file)
        }
    }
}

/// Load registry records from TOML text
pub fn load_toml_str(content: &str) -> Result<HashMap<String, VehicleRecord>> {
    let parsed: RegistryFile = toml::from_str(content).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to parse vehicle registry TOML: {}",
            e
        )))
    })?;
    index(parsed.vehicles)
}

/// Load registry records from CSV with a header row
pub fn load_csv_reader<R: Read>(reader: R) -> Result<HashMap<String, VehicleRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<RawVehicle>() {
        rows.push(row?);
    }
    index(rows)
}

fn index(rows: Vec<RawVehicle>) -> Result<HashMap<String, VehicleRecord>> {
    let mut vehicles = HashMap::with_capacity(rows.len());
    for raw in rows {
        let record = raw.into_record()?;
        if record.plate.is_empty() {
            return Err(Error::Registry("registry row with an empty plate".to_string()));
        }
        if vehicles.contains_key(&record.plate) {
            return Err(Error::Registry(format!(
                "plate {} is listed more than once",
                record.plate
            )));
        }
        vehicles.insert(record.plate.clone(), record);
    }
    Ok(vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TOML: &str = r#"
[[vehicles]]
plate = "abc-1234"
owner = "Ana Souza"
category = "STAFF"
status = "AUTORIZADO"

[[vehicles]]
plate = "XYZ9K88"
status = "BLOCKED"
note = "expired permit"

[[vehicles]]
plate = "QWE5678"
"#;

    const TEST_CSV: &str = "plate,owner,category,status,note\n\
ABC1234,Ana Souza,STAFF,Authorized,\n\
XYZ 9K88,,VISITOR,Suspeito,checked twice\n";

    #[test]
    fn test_load_toml_str() {
        let vehicles = load_toml_str(TEST_TOML).unwrap();
        assert_eq!(vehicles.len(), 3);

        let ana = &vehicles["ABC1234"];
        assert_eq!(ana.owner, "Ana Souza");
        assert_eq!(ana.status, VehicleStatus::Authorized);
        assert_eq!(vehicles["XYZ9K88"].status, VehicleStatus::Blocked);
        assert_eq!(vehicles["QWE5678"].status, VehicleStatus::Authorized);
    }

    #[test]
    fn test_load_csv_reader() {
        let vehicles = load_csv_reader(TEST_CSV.as_bytes()).unwrap();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles["XYZ9K88"].status, VehicleStatus::Suspect);
        assert_eq!(vehicles["XYZ9K88"].note, "checked twice");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let toml = "[[vehicles]]\nplate = \"ABC1234\"\nstatus = \"MAYBE\"\n";
        assert!(matches!(load_toml_str(toml), Err(Error::UnknownStatus(_))));
    }

    #[test]
    fn test_duplicate_plate_rejected() {
        let csv = "plate,owner,category,status,note\nABC1234,,,,\nabc-1234,,,,\n";
        assert!(matches!(load_csv_reader(csv.as_bytes()), Err(Error::Registry(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(RegistryFormat::from_path(Path::new("fleet.TOML")).unwrap(), RegistryFormat::Toml);
        assert_eq!(RegistryFormat::from_path(Path::new("fleet.csv")).unwrap(), RegistryFormat::Csv);
        assert!(RegistryFormat::from_path(Path::new("fleet.xlsx")).is_err());
    }
}
