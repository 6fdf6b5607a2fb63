//! Shared constants for tessel-mesh-cpu. Centralizes common magic numbers.

/// Brightest block light level.
pub const MAX_LIGHT: u8 = 15;
/// Visual-only floor so unlit faces stay readable.
pub(crate) const MIN_VISUAL_LIGHT: u8 = 3;

// Directional shading per facing
pub(crate) const SHADE_TOP: f32 = 1.0;
pub(crate) const SHADE_BOTTOM: f32 = 0.5;
pub(crate) const SHADE_X: f32 = 0.6;
pub(crate) const SHADE_Z: f32 = 0.8;

// Initial reserve when a layer is first touched during baking
pub(crate) const INITIAL_QUAD_CAP: usize = 32;
