use crate::Vec3;

/// Threshold below which every component must fall for a vector to count as near zero.
const NEAR_ZERO: f32 = 1e-8;

/// Extra vector predicates the renderer needs on top of glam.
pub trait Vec3Ext {
    /// True if every component is within `1e-8` of zero.
    ///
    /// Used to catch degenerate scatter directions.
    fn near_zero(&self) -> bool;
}

impl Vec3Ext for Vec3 {
    #[inline]
    fn near_zero(&self) -> bool {
        self.x.abs() < NEAR_ZERO && self.y.abs() < NEAR_ZERO && self.z.abs() < NEAR_ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_zero() {
        assert!(Vec3::ZERO.near_zero());
        assert!(Vec3::splat(1e-9).near_zero());
        assert!(!Vec3::new(0.0, 1e-7, 0.0).near_zero());
        assert!(!Vec3::new(-1.0, 0.0, 0.0).near_zero());
    }
}
