//! Blink-on-select highlight as a timed state machine over a material's
//! emissive fields.

use std::time::Duration;

use prism_paint::Color;
use prism_scene::{MaterialId, SceneError, SceneGraph};
use tracing::debug;

use crate::error::Result;

/// One scheduled state change, `delay` after the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkStep {
    pub delay: Duration,
    pub on: bool,
}

impl BlinkStep {
    pub const fn new(delay: Duration, on: bool) -> Self {
        Self { delay, on }
    }
}

/// Default pattern: three flashes of 150 ms.
pub fn default_pattern() -> Vec<BlinkStep> {
    let period = Duration::from_millis(150);
    let mut steps = Vec::with_capacity(6);
    for flash in 0..3 {
        let delay = if flash == 0 { Duration::ZERO } else { period };
        steps.push(BlinkStep::new(delay, true));
        steps.push(BlinkStep::new(period, false));
    }
    steps
}

/// A running highlight on one material.
///
/// The emissive color and intensity found at start are written back when
/// the sequence finishes or is cancelled.
#[derive(Debug)]
pub struct BlinkHighlight {
    material: MaterialId,
    steps: Vec<BlinkStep>,
    cursor: usize,
    pending: Duration,
    color: Color,
    intensity: f32,
    saved: (Color, f32),
    finished: bool,
}

impl BlinkHighlight {
    /// Capture the material's emissive state and prepare the sequence.
    pub fn start<G: SceneGraph>(
        scene: &G,
        material: MaterialId,
        color: Color,
        intensity: f32,
        steps: Vec<BlinkStep>,
    ) -> Result<Self> {
        let current = scene
            .material(material)
            .ok_or(SceneError::UnknownMaterial(material))?;
        Ok(Self {
            material,
            steps,
            cursor: 0,
            pending: Duration::ZERO,
            color,
            intensity,
            saved: (current.emissive, current.emissive_intensity),
            finished: false,
        })
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance the clock, applying every step that came due.
    ///
    /// Returns `true` while the sequence is still running.
    pub fn advance<G: SceneGraph>(&mut self, scene: &mut G, elapsed: Duration) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        self.pending += elapsed;

        while let Some(step) = self.steps.get(self.cursor).copied() {
            if self.pending < step.delay {
                return Ok(true);
            }
            self.pending -= step.delay;
            self.cursor += 1;
            self.set_lit(scene, step.on)?;
        }

        self.restore(scene)?;
        Ok(false)
    }

    /// Stop early and restore the saved emissive state.
    pub fn cancel<G: SceneGraph>(mut self, scene: &mut G) -> Result<()> {
        if !self.finished {
            debug!(material = %self.material, "highlight cancelled");
            self.restore(scene)?;
        }
        Ok(())
    }

    fn set_lit<G: SceneGraph>(&self, scene: &mut G, on: bool) -> Result<()> {
        let (color, intensity) = if on {
            (self.color, self.intensity)
        } else {
            self.saved
        };
        let material = scene
            .material_mut(self.material)
            .ok_or(SceneError::UnknownMaterial(self.material))?;
        material.emissive = color;
        material.emissive_intensity = intensity;
        material.mark_dirty();
        Ok(())
    }

    fn restore<G: SceneGraph>(&mut self, scene: &mut G) -> Result<()> {
        self.finished = true;
        self.set_lit(scene, false)
    }
}
