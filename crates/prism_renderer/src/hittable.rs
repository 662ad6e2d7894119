//! Hittable trait, HitRecord and the scene aggregate.

use crate::{Material, MovingSphere, Ray, Sphere};
use prism_math::{Aabb, Interval, Vec3};

/// Record of a ray-object intersection.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (unit length, always points against ray)
    pub normal: Vec3,
    /// Material of the object that was hit
    pub material: &'a Material,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record at parameter `t`, orienting `outward_normal` against the ray.
    pub fn new(ray: &Ray, t: f32, outward_normal: Vec3, material: &'a Material) -> Self {
        let mut rec = Self {
            p: ray.at(t),
            normal: outward_normal,
            material,
            t,
            front_face: true,
        };
        rec.set_face_normal(ray, outward_normal);
        rec
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        // If the ray and normal point in the same direction, we're inside
        self.front_face = ray.direction().dot(outward_normal) < 0.0;

        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection of `ray` with this object inside `ray_t` (inclusive).
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>>;

    /// Box enclosing the object over the time range `[time0, time1]`.
    ///
    /// `None` means the object is unbounded or empty.
    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb>;
}

/// Every kind of scene object.
#[derive(Debug, Clone)]
pub enum Object {
    Sphere(Sphere),
    MovingSphere(MovingSphere),
    List(ObjectList),
}

impl Hittable for Object {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        match self {
            Object::Sphere(sphere) => sphere.hit(ray, ray_t),
            Object::MovingSphere(sphere) => sphere.hit(ray, ray_t),
            Object::List(list) => list.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        match self {
            Object::Sphere(sphere) => sphere.bounding_box(time0, time1),
            Object::MovingSphere(sphere) => sphere.bounding_box(time0, time1),
            Object::List(list) => list.bounding_box(time0, time1),
        }
    }
}

impl From<Sphere> for Object {
    fn from(sphere: Sphere) -> Self {
        Object::Sphere(sphere)
    }
}

impl From<MovingSphere> for Object {
    fn from(sphere: MovingSphere) -> Self {
        Object::MovingSphere(sphere)
    }
}

impl From<ObjectList> for Object {
    fn from(list: ObjectList) -> Self {
        Object::List(list)
    }
}

/// An ordered list of objects, intersected by linear scan.
#[derive(Debug, Clone, Default)]
pub struct ObjectList {
    objects: Vec<Object>,
}

impl ObjectList {
    /// Create a new empty list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: impl Into<Object>) {
        self.objects.push(object.into());
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over the objects in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.objects.iter()
    }
}

impl<'l> IntoIterator for &'l ObjectList {
    type Item = &'l Object;
    type IntoIter = std::slice::Iter<'l, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

impl Hittable for ObjectList {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let mut closest_so_far = ray_t.max;
        let mut nearest = None;

        for object in &self.objects {
            let interval = Interval::new(ray_t.min, closest_so_far);
            if let Some(rec) = object.hit(ray, interval) {
                closest_so_far = rec.t;
                nearest = Some(rec);
            }
        }

        nearest
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        let mut objects = self.objects.iter();
        let first = objects.next()?.bounding_box(time0, time1)?;

        objects.try_fold(first, |acc, object| {
            object
                .bounding_box(time0, time1)
                .map(|bbox| Aabb::merge(&acc, &bbox))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lambertian;
    use std::sync::Arc;

    fn grey() -> Arc<Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)).into())
    }

    fn everywhere() -> Interval {
        Interval::new(0.001, f32::INFINITY)
    }

    #[test]
    fn test_empty_list_never_hits() {
        let list = ObjectList::new();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);

        assert!(list.hit(&ray, everywhere()).is_none());
        assert!(list.bounding_box(0.0, 1.0).is_none());
    }

    #[test]
    fn test_nearest_hit_independent_of_order() {
        let material = grey();
        let near = Sphere::new(Vec3::new(0.0, 0.0, -2.0), 0.5, material.clone());
        let far = Sphere::new(Vec3::new(0.0, 0.0, -6.0), 0.5, material.clone());
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);

        let mut front_first = ObjectList::new();
        front_first.add(near.clone());
        front_first.add(far.clone());

        let mut back_first = ObjectList::new();
        back_first.add(far);
        back_first.add(near);

        let a = front_first.hit(&ray, everywhere()).map(|rec| rec.t);
        let b = back_first.hit(&ray, everywhere()).map(|rec| rec.t);

        assert_eq!(a, b);
        assert!((a.unwrap_or_default() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_nearest_hit_not_beyond_any_member() {
        let material = grey();
        let mut list = ObjectList::new();
        for i in 0..8 {
            let z = -3.0 - i as f32 * 1.7;
            let x = (i as f32 * 0.13).sin() * 0.3;
            list.add(Sphere::new(Vec3::new(x, 0.0, z), 0.8, material.clone()));
        }
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.05, 0.0, -1.0), 0.0);

        let nearest = list.hit(&ray, everywhere()).map(|rec| rec.t);
        assert!(nearest.is_some());
        for object in &list {
            if let Some(rec) = object.hit(&ray, everywhere()) {
                assert!(nearest.unwrap_or(f32::INFINITY) <= rec.t);
            }
        }
    }

    #[test]
    fn test_list_bounding_box_merges_members() {
        let material = grey();
        let mut list = ObjectList::new();
        list.add(Sphere::new(Vec3::new(-2.0, 0.0, 0.0), 1.0, material.clone()));
        list.add(Sphere::new(Vec3::new(3.0, 1.0, 0.0), 0.5, material));

        let bbox = list.bounding_box(0.0, 1.0);
        assert_eq!(
            bbox,
            Some(Aabb::new(Vec3::new(-3.0, -1.0, -1.0), Vec3::new(3.5, 1.5, 1.0)))
        );
    }

    #[test]
    fn test_nested_empty_list_is_unbounded() {
        let mut list = ObjectList::new();
        list.add(Sphere::new(Vec3::ZERO, 1.0, grey()));
        list.add(ObjectList::new());

        assert!(list.bounding_box(0.0, 1.0).is_none());
    }

    #[test]
    fn test_face_normal_against_ray() {
        let material = Material::from(Lambertian::new(Vec3::ONE));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.0);

        let front = HitRecord::new(&ray, 1.0, Vec3::new(0.0, 0.0, -1.0), &material);
        assert!(front.front_face);
        assert_eq!(front.normal, Vec3::new(0.0, 0.0, -1.0));

        let back = HitRecord::new(&ray, 1.0, Vec3::new(0.0, 0.0, 1.0), &material);
        assert!(!back.front_face);
        assert_eq!(back.normal, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(back.p, Vec3::new(0.0, 0.0, 1.0));
    }
}
