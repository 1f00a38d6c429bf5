//! Placement applied to converted models before they are shown.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use prism_scene::{BoundingBox, Scene};
use tracing::debug;

use crate::conversion::ConversionOptions;

/// Reorient, center and ground `scene` by adjusting its root transforms.
///
/// Returns the world bounds after placement.
pub fn apply_positioning(scene: &mut Scene, options: &ConversionOptions) -> BoundingBox {
    if options.rotate_to_y_up {
        premultiply_roots(scene, Mat4::from_rotation_x(-FRAC_PI_2));
    }

    let bounds = scene.compute_bounds();
    let center = bounds.center();
    let mut offset = Vec3::ZERO;
    if options.centers() {
        offset.x = -center.x;
        offset.z = -center.z;
        if !options.grounds() {
            offset.y = -center.y;
        }
    }
    if options.grounds() {
        offset.y = -bounds.min.y;
    }

    if offset != Vec3::ZERO {
        premultiply_roots(scene, Mat4::from_translation(offset));
    }
    debug!(?offset, rotated = options.rotate_to_y_up, "positioned model");

    BoundingBox {
        min: bounds.min + offset,
        max: bounds.max + offset,
    }
}

fn premultiply_roots(scene: &mut Scene, matrix: Mat4) {
    let roots = scene.roots.clone();
    for root in roots {
        if let Some(node) = scene.node_mut(root) {
            node.transform = matrix * node.transform;
        }
    }
}
