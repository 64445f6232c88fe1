use crate::mask::model::{RasterId, ViewId};
use crate::mask::raster::Raster;
use anyhow::{bail, Context, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Owns the single raster of each view. Rasters are created on the first
/// mask paint request for a view and live until the view is removed.
#[derive(Debug, Default)]
pub struct SurfaceRasters {
    rasters: HashMap<ViewId, Raster>,
    last_raster_id: u64,
}

impl SurfaceRasters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, view: ViewId, width: u32, height: u32) -> Result<&mut Raster> {
        match self.rasters.entry(view) {
            Entry::Occupied(entry) => {
                let raster = entry.into_mut();
                if raster.width() != width || raster.height() != height {
                    bail!(
                        "view {view:?} already has a {}x{} raster, requested {width}x{height}",
                        raster.width(),
                        raster.height()
                    );
                }
                Ok(raster)
            }
            Entry::Vacant(entry) => {
                let id = RasterId(self.last_raster_id + 1);
                let raster = Raster::new(id, view, width, height)
                    .with_context(|| format!("create raster for view {view:?}"))?;
                self.last_raster_id = id.0;
                Ok(entry.insert(raster))
            }
        }
    }

    pub fn get(&self, view: ViewId) -> Option<&Raster> {
        self.rasters.get(&view)
    }

    pub fn get_mut(&mut self, view: ViewId) -> Option<&mut Raster> {
        self.rasters.get_mut(&view)
    }

    pub fn remove(&mut self, view: ViewId) -> Option<Raster> {
        let removed = self.rasters.remove(&view);
        if let Some(raster) = &removed {
            tracing::debug!(view = ?view, raster = ?raster.id(), "dropped view raster");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}
