use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box.
///
/// Stored as its minimum and maximum corners. Boxes are only ever merged
/// and tested here; no acceleration tree is built from them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from its min and max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box enclosing both inputs.
    ///
    /// Component-wise min of the mins and max of the maxes, so the
    /// operation is commutative and associative.
    pub fn merge(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Slab method: the running interval is shrunk axis by axis and the
    /// test fails as soon as it becomes empty.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        let ray_orig = r.origin();
        let ray_dir = r.direction();

        for axis in 0..3 {
            let adinv = 1.0 / ray_dir[axis];
            let mut t0 = (self.min[axis] - ray_orig[axis]) * adinv;
            let mut t1 = (self.max[axis] - ray_orig[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));

        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_merge() {
        let box1 = Aabb::new(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let box2 = Aabb::new(Vec3::new(3.0, -1.0, 3.0), Vec3::new(10.0, 4.0, 10.0));
        let merged = Aabb::merge(&box1, &box2);

        assert_eq!(merged.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(merged.max, Vec3::new(10.0, 5.0, 10.0));
    }

    #[test]
    fn test_aabb_merge_commutative_associative() {
        let a = Aabb::new(Vec3::new(-1.0, 2.0, 0.0), Vec3::new(1.0, 3.0, 0.5));
        let b = Aabb::new(Vec3::new(0.0, -4.0, 1.0), Vec3::new(2.0, 0.0, 2.0));
        let c = Aabb::new(Vec3::new(-3.0, 1.0, -2.0), Vec3::new(0.0, 1.5, 0.0));

        assert_eq!(Aabb::merge(&a, &b), Aabb::merge(&b, &a));
        assert_eq!(
            Aabb::merge(&Aabb::merge(&a, &b), &c),
            Aabb::merge(&a, &Aabb::merge(&b, &c))
        );
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Interval ends before the box
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 0.0);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 3.0)));
    }
}
