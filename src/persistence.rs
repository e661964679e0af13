//! Save and load rotations and bucketers to/from disk.
//!
//! Requires the `persistence` feature flag. A reloaded rotation or bucketer
//! assigns exactly the same buckets as the one that was saved.

use std::path::Path;

use crate::bucketer::{BucketerConfig, LshBucketer};
use crate::error::{LshError, Result};
use crate::rotation::RandomRotation;

impl RandomRotation {
    /// Serialize the rotation to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Deserialize a rotation from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let loaded: RandomRotation =
            serde_json::from_str(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        Self::from_matrix(loaded.matrix().to_owned())
    }

    /// Serialize the rotation to a compact bincode file.
    pub fn save_bincode(&self, path: &Path) -> Result<()> {
        let bytes =
            bincode::serialize(self).map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Deserialize a rotation from a bincode file.
    pub fn load_bincode(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let loaded: RandomRotation =
            bincode::deserialize(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        Self::from_matrix(loaded.matrix().to_owned())
    }
}

/// On-disk form of a bucketer: its config plus the sampled rotation.
#[derive(serde::Serialize, serde::Deserialize)]
struct StoredBucketer {
    config: BucketerConfig,
    rotation: RandomRotation,
}

impl StoredBucketer {
    fn from_bucketer(bucketer: &LshBucketer) -> Self {
        Self {
            config: bucketer.config(),
            rotation: bucketer.rotation().clone(),
        }
    }

    fn into_bucketer(self) -> Result<LshBucketer> {
        let rotation = RandomRotation::from_matrix(self.rotation.matrix().to_owned())?;
        LshBucketer::from_parts(self.config, rotation)
    }
}

impl LshBucketer {
    /// Serialize the config and rotation to a JSON file.
    ///
    /// Label state and metrics are not saved.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&StoredBucketer::from_bucketer(self))
            .map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Deserialize a bucketer from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let stored: StoredBucketer =
            serde_json::from_str(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        stored.into_bucketer()
    }

    /// Serialize the config and rotation to a compact bincode file.
    pub fn save_bincode(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(&StoredBucketer::from_bucketer(self))
            .map_err(|e| LshError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Deserialize a bucketer from a bincode file.
    pub fn load_bincode(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let stored: StoredBucketer =
            bincode::deserialize(&data).map_err(|e| LshError::Serialization(e.to_string()))?;
        stored.into_bucketer()
    }
}
