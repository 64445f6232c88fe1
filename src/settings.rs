use crate::mask::model::{ClassId, TipShape};
use crate::mask::painter::{BrushPainter, DEFAULT_INTERPOLATION_THRESHOLD};
use crate::mask::raster::Raster;
use crate::mask::store::AnnotationStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "mask_painter.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PainterSettings {
    #[serde(default = "default_interpolation_threshold")]
    pub interpolation_threshold: f32,
    #[serde(default)]
    pub default_tip_shape: TipShape,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_interpolation_threshold() -> f32 {
    DEFAULT_INTERPOLATION_THRESHOLD
}

impl Default for PainterSettings {
    fn default() -> Self {
        Self {
            interpolation_threshold: default_interpolation_threshold(),
            default_tip_shape: TipShape::default(),
            debug_logging: false,
            log_file: None,
        }
    }
}

impl PainterSettings {
    /// Loads settings from `path`. A missing or blank file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read painter settings file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut loaded: PainterSettings = serde_json::from_str(&content)
            .with_context(|| format!("deserialize painter settings file {}", path.display()))?;
        loaded.sanitize();
        Ok(loaded)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("create painter settings folder {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("serialize painter settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("write painter settings file {}", path.display()))?;
        Ok(())
    }

    pub fn sanitize(&mut self) {
        if !self.interpolation_threshold.is_finite() || self.interpolation_threshold < 0.0 {
            tracing::warn!(
                value = self.interpolation_threshold,
                "invalid interpolation threshold, using default"
            );
            self.interpolation_threshold = default_interpolation_threshold();
        }
    }

    /// Starts a stroke with the configured tip shape and threshold.
    pub fn begin_stroke<S: AnnotationStore>(
        &self,
        raster: &mut Raster,
        store: &S,
        class_id: ClassId,
        is_eraser: bool,
    ) -> Result<BrushPainter> {
        let painter =
            BrushPainter::new(raster, store, class_id, self.default_tip_shape, is_eraser)?;
        Ok(painter.with_interpolation_threshold(self.interpolation_threshold))
    }

    pub fn init_logging(&self) {
        crate::logging::init(self.debug_logging, self.log_file.clone());
    }
}
