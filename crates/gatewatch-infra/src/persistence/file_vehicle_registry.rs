//! File-based vehicle registry

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, PoisonError};

use log::info;

use gatewatch_domain::model::normalize_plate;
use gatewatch_domain::repository::VehicleRegistry;
use gatewatch_types::{Result, VehicleRecord};

use crate::registry_loader;

/// Registry loaded from a TOML or CSV file, held in memory
pub struct FileVehicleRegistry {
    path: PathBuf,
    vehicles: RwLock<HashMap<String, VehicleRecord>>,
}

impl FileVehicleRegistry {
    pub fn open(path: PathBuf) -> Result<Self> {
        let vehicles = registry_loader::load_from_file(&path)?;
        info!("loaded {} vehicles from {}", vehicles.len(), path.display());
        Ok(Self {
            path,
            vehicles: RwLock::new(vehicles),
        })
    }

    /// Build a registry from records already in memory
    pub fn from_records(records: impl IntoIterator<Item = VehicleRecord>) -> Self {
        let vehicles = records
            .into_iter()
            .map(|mut v| {
                v.plate = normalize_plate(&v.plate);
                (v.plate.clone(), v)
            })
            .collect();
        Self {
            path: PathBuf::new(),
            vehicles: RwLock::new(vehicles),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file; on error the current contents stay in place
    pub fn reload(&self) -> Result<usize> {
        let vehicles = registry_loader::load_from_file(&self.path)?;
        let count = vehicles.len();
        *self.vehicles.write().unwrap_or_else(PoisonError::into_inner) = vehicles;
        info!("reloaded {} vehicles from {}", count, self.path.display());
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, VehicleRecord>> {
        self.vehicles.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VehicleRegistry for FileVehicleRegistry {
    fn find(&self, plate: &str) -> Result<Option<VehicleRecord>> {
        Ok(self.read().get(&normalize_plate(plate)).cloned())
    }
}
