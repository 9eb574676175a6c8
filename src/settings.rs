use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::error::{AttentionError, Result};
use crate::fixation::FixationConfig;
use crate::models::DensityMode;
use crate::semantic::{PatchGrid, PatchSize};
use crate::timeline::TimelineConfig;
use crate::log_warn;

const ENABLE_LOGS: bool = true;

/// Caller-supplied analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// px/s
    pub velocity_threshold: f64,
    /// s
    pub min_fixation_duration: f64,
    pub min_stay_duration: f64,
    pub max_stay_duration: f64,
    pub patch_size: u32,
    pub top_n_classes: usize,
    pub density_mode: DensityMode,
    pub image_width: u32,
    pub image_height: u32,
    pub timeline_cache_ttl_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            velocity_threshold: 1.15,
            min_fixation_duration: 0.0,
            min_stay_duration: 0.2,
            max_stay_duration: 5.0,
            patch_size: 40,
            top_n_classes: 15,
            density_mode: DensityMode::Attention,
            image_width: 800,
            image_height: 600,
            timeline_cache_ttl_secs: 90,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(AttentionError::InvalidSettings(reason));

        if !self.velocity_threshold.is_finite() || self.velocity_threshold <= 0.0 {
            return invalid(format!(
                "velocity_threshold must be positive, got {}",
                self.velocity_threshold
            ));
        }
        if !self.min_fixation_duration.is_finite() || self.min_fixation_duration < 0.0 {
            return invalid(format!(
                "min_fixation_duration must be non-negative, got {}",
                self.min_fixation_duration
            ));
        }
        if !self.min_stay_duration.is_finite() || !self.max_stay_duration.is_finite() {
            return invalid("stay durations must be finite".to_string());
        }
        if self.min_stay_duration < 0.0 || self.min_stay_duration > self.max_stay_duration {
            return invalid(format!(
                "stay window [{}, {}] is empty",
                self.min_stay_duration, self.max_stay_duration
            ));
        }
        PatchSize::try_from(self.patch_size)?;
        if self.image_width == 0 || self.image_height == 0 {
            return invalid(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.image_width, self.image_height
            ));
        }
        if self.timeline_cache_ttl_secs == 0 {
            return invalid("timeline_cache_ttl_secs must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn fixation_config(&self) -> FixationConfig {
        FixationConfig {
            velocity_threshold: self.velocity_threshold,
            min_duration: self.min_fixation_duration,
        }
    }

    pub fn timeline_config(&self) -> TimelineConfig {
        TimelineConfig {
            min_stay_duration: self.min_stay_duration,
            max_stay_duration: self.max_stay_duration,
        }
    }

    pub fn default_patch_size(&self) -> Result<PatchSize> {
        PatchSize::try_from(self.patch_size)
    }

    pub fn grid(&self, patch_size: PatchSize) -> PatchGrid {
        PatchGrid::new(patch_size, self.image_width, self.image_height)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.timeline_cache_ttl_secs)
    }
}

/// Analysis settings persisted as JSON.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AnalysisSettings>,
}

impl SettingsStore {
    /// Load from `path`; a missing, unparsable or invalid file yields defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<AnalysisSettings>(&contents) {
                Ok(settings) => match settings.validate() {
                    Ok(()) => settings,
                    Err(err) => {
                        log_warn!("ignoring invalid settings in {}: {err}", path.display());
                        AnalysisSettings::default()
                    }
                },
                Err(err) => {
                    log_warn!("ignoring unreadable settings in {}: {err}", path.display());
                    AnalysisSettings::default()
                }
            }
        } else {
            AnalysisSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> AnalysisSettings {
        self.read().clone()
    }

    /// Validate, swap in and persist new settings.
    pub fn update(&self, settings: AnalysisSettings) -> Result<()> {
        settings.validate()?;
        {
            let mut guard = self.write();
            *guard = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: AnalysisSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))?;
        data.validate()?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &AnalysisSettings) -> Result<()> {
        let serialized =
            serde_json::to_string_pretty(data).context("Failed to serialize settings")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, AnalysisSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AnalysisSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
