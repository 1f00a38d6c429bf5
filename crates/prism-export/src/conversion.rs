//! Conversion service metadata and the process-wide in-progress flag.
//!
//! The conversion service itself is remote; only the request options and
//! the reply shape live here.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stats::StatsBounds;
use crate::writer::ExportFormat;

static CONVERSION_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

/// Placement options sent with a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Keep the model where it was authored; disables centering and grounding.
    pub preserve_position: bool,
    pub center_model: bool,
    pub ground_model: bool,
    /// Rotate Z-up content to Y-up.
    pub rotate_to_y_up: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            preserve_position: false,
            center_model: true,
            ground_model: true,
            rotate_to_y_up: false,
        }
    }
}

impl ConversionOptions {
    /// Centering after `preserve_position` is taken into account.
    pub fn centers(&self) -> bool {
        self.center_model && !self.preserve_position
    }

    /// Grounding after `preserve_position` is taken into account.
    pub fn grounds(&self) -> bool {
        self.ground_model && !self.preserve_position
    }
}

/// Reply from the conversion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Where the converted model can be fetched.
    pub url: String,
    pub format: ExportFormat,
    /// File size in bytes.
    pub size: u64,
    pub mesh_count: usize,
    pub bounds: StatsBounds,
}

/// Marks a conversion as running until dropped.
#[derive(Debug)]
#[must_use = "the conversion is marked finished as soon as the guard is dropped"]
pub struct ConversionGuard {
    _private: (),
}

impl Drop for ConversionGuard {
    fn drop(&mut self) {
        CONVERSION_IN_PROGRESS.store(false, Ordering::Release);
        debug!("conversion finished");
    }
}

/// Mark a conversion as started.
///
/// Returns `None` while another conversion holds the flag. The flag is
/// cleared when the returned guard drops, whether the conversion completed,
/// failed or was abandoned.
pub fn begin_conversion() -> Option<ConversionGuard> {
    CONVERSION_IN_PROGRESS
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .ok()?;
    debug!("conversion started");
    Some(ConversionGuard { _private: () })
}

/// Whether a conversion is currently running.
pub fn is_conversion_in_progress() -> bool {
    CONVERSION_IN_PROGRESS.load(Ordering::Acquire)
}
