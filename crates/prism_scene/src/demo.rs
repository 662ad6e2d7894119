//! Built-in demo scene.

use std::sync::Arc;

use prism_math::sample::{gen_f32, gen_range, random_in_cube};
use prism_math::Vec3;
use prism_renderer::{Color, Dielectric, Lambertian, Material, Metal, MovingSphere, ObjectList, Sphere};
use rand::RngCore;

/// Spheres scattered over a large ground sphere, with three big spheres
/// (glass, diffuse, mirror) in the middle.
///
/// A third of the small spheres are diffuse and bounce upwards over the
/// shutter interval `[0, 1]`.
pub fn random_scene(rng: &mut dyn RngCore) -> ObjectList {
    let mut world = ObjectList::new();

    let ground: Arc<Material> = Arc::new(Lambertian::new(Color::splat(0.5)).into());
    world.add(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground));

    let clearing = Vec3::new(4.0, 0.2, 0.0);
    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f32(rng);
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(rng),
                0.2,
                b as f32 + 0.9 * gen_f32(rng),
            );

            if (center - clearing).length() <= 0.9 {
                continue;
            }

            if choose_mat < 0.33 {
                // Diffuse, moving
                let albedo = random_in_cube(rng, 0.0, 1.0) * random_in_cube(rng, 0.0, 1.0);
                let material = Arc::new(Lambertian::new(albedo).into());
                let center1 = center + Vec3::new(0.0, gen_range(rng, 0.0, 0.5), 0.0);
                world.add(MovingSphere::new(center, center1, 0.0, 1.0, 0.2, material));
            } else if choose_mat < 0.66 {
                // Metal
                let albedo = random_in_cube(rng, 0.5, 1.0);
                let fuzz = gen_range(rng, 0.0, 0.5);
                world.add(Sphere::new(center, 0.2, Arc::new(Metal::new(albedo, fuzz).into())));
            } else {
                // Glass
                world.add(Sphere::new(center, 0.2, Arc::new(Dielectric::new(1.5).into())));
            }
        }
    }

    let glass = Arc::new(Dielectric::new(1.5).into());
    world.add(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, glass));

    let diffuse = Arc::new(Lambertian::new(Color::new(0.4, 0.2, 0.1)).into());
    world.add(Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0, diffuse));

    let mirror = Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0).into());
    world.add(Sphere::new(Vec3::new(4.0, 1.0, 0.0), 1.0, mirror));

    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_renderer::{Hittable, Object};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_scene_layout() {
        let mut rng = StdRng::seed_from_u64(42);
        let world = random_scene(&mut rng);

        // Ground + at most 22x22 small spheres + 3 big ones
        assert!(world.len() > 4);
        assert!(world.len() <= 1 + 22 * 22 + 3);

        let objects: Vec<_> = world.iter().collect();
        match objects[0] {
            Object::Sphere(ground) => {
                assert_eq!(ground.center(), Vec3::new(0.0, -1000.0, 0.0));
                assert_eq!(ground.radius(), 1000.0);
            }
            _ => panic!("ground must be a static sphere"),
        }
        match objects[objects.len() - 1] {
            Object::Sphere(mirror) => {
                assert_eq!(mirror.center(), Vec3::new(4.0, 1.0, 0.0));
                assert!(matches!(**mirror.material(), Material::Metal(ref m) if m.fuzz() == 0.0));
            }
            _ => panic!("last sphere must be the mirror"),
        }
    }

    #[test]
    fn test_small_spheres_avoid_clearing() {
        let mut rng = StdRng::seed_from_u64(7);
        let world = random_scene(&mut rng);
        let clearing = Vec3::new(4.0, 0.2, 0.0);

        for object in world.iter().skip(1) {
            match object {
                Object::Sphere(s) if s.radius() == 0.2 => {
                    assert!((s.center() - clearing).length() > 0.9);
                    assert!(!matches!(**s.material(), Material::Lambertian(_)));
                }
                Object::MovingSphere(s) => {
                    let (c0, c1) = s.centers();
                    assert!((c0 - clearing).length() > 0.9);
                    assert_eq!(c0.x, c1.x);
                    assert_eq!(c0.z, c1.z);
                    assert!(c1.y >= c0.y && c1.y <= c0.y + 0.5);
                    assert_eq!(s.times(), (0.0, 1.0));
                    assert!(matches!(**s.material(), Material::Lambertian(_)));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_random_scene_is_seeded() {
        let a = random_scene(&mut StdRng::seed_from_u64(3));
        let b = random_scene(&mut StdRng::seed_from_u64(3));

        assert_eq!(a.len(), b.len());
        assert_eq!(a.bounding_box(0.0, 1.0), b.bounding_box(0.0, 1.0));
        assert!(a.bounding_box(0.0, 1.0).is_some());
    }
}
