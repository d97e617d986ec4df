//! Cached data/pixel coordinate transforms.

use crate::backend::{AxesId, Backend};
use kurbo::{Affine, Point};

/// A snapshot of an axes' data-to-pixel transform and its inverse.
///
/// Transforms go stale when axes are resized or their limits change, so
/// callers refresh at well-defined moments (motion initiation, resize,
/// mouse release) and use the cached pair for every conversion during a
/// drag. This keeps a whole drag consistent even if the host mutates
/// limits mid-motion.
#[derive(Debug, Clone, Copy)]
pub struct CoordCache {
    forward: Affine,
    inverse: Affine,
}

impl CoordCache {
    pub fn capture(backend: &dyn Backend, axes: AxesId) -> Self {
        let forward = backend.axes_transform(axes);
        Self {
            forward,
            inverse: forward.inverse(),
        }
    }

    pub fn refresh(&mut self, backend: &dyn Backend, axes: AxesId) {
        *self = Self::capture(backend, axes);
    }

    pub fn data_to_px(&self, data: Point) -> Point {
        self.forward * data
    }

    pub fn px_to_data(&self, pixel: Point) -> Point {
        self.inverse * pixel
    }
}
