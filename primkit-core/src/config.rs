/// Tessellation quality and draw configuration
use std::f32::consts::TAU;

use crate::buffer::{StorageClass, UnlockPolicy};
use crate::flags::{PrimFlag, PrimFlags};

/// Default quality factor for curved shapes
pub const DEFAULT_QUALITY: u32 = 10;

const MIN_ELLIPSE_SEGMENTS: usize = 8;
const MIN_ARC_SEGMENTS: usize = 2;
const MIN_SPLINE_POINTS: usize = 4;

/// Configuration shared by the tessellator and dispatcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimConfig {
    pub quality: u32,
    pub flags: PrimFlags,
    pub unlock_policy: UnlockPolicy,
    pub transient_storage: StorageClass,
}

impl Default for PrimConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            flags: PrimFlags::default(),
            unlock_policy: UnlockPolicy::Strict,
            transient_storage: StorageClass::Software,
        }
    }
}

impl PrimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_flag(mut self, flag: PrimFlag, value: bool) -> Self {
        self.flags.set(flag, value);
        self
    }

    pub fn with_unlock_policy(mut self, policy: UnlockPolicy) -> Self {
        self.unlock_policy = policy;
        self
    }

    pub fn with_transient_storage(mut self, storage: StorageClass) -> Self {
        self.transient_storage = storage;
        self
    }

    pub fn get_flag(&self, flag: PrimFlag) -> bool {
        self.flags.get(flag)
    }

    pub fn set_flag(&mut self, flag: PrimFlag, value: bool) {
        self.flags.set(flag, value);
    }

    /// Segments for a full ellipse at the given on-screen scale.
    pub fn ellipse_segments(&self, rx: f32, ry: f32, scale: f32) -> usize {
        let size = (scale * (rx.abs() + ry.abs()) / 2.0).max(0.0);
        let segments = self.quality as f32 * size.sqrt();
        (segments as usize).max(MIN_ELLIPSE_SEGMENTS)
    }

    /// Segments for an arc sweeping `delta_theta` radians.
    pub fn arc_segments(&self, r: f32, delta_theta: f32, scale: f32) -> usize {
        let size = (scale * r.abs()).max(0.0);
        let segments = (delta_theta / TAU).abs() * self.quality as f32 * size.sqrt();
        (segments as usize).max(MIN_ARC_SEGMENTS)
    }

    /// Sample points for a spline whose control polygon is `control_length` long.
    pub fn spline_points(&self, control_length: f32, scale: f32) -> usize {
        let size = (scale * control_length).max(0.0);
        let points = self.quality as f32 * size.sqrt();
        (points as usize).max(MIN_SPLINE_POINTS)
    }
}
