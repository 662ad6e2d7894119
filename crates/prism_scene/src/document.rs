//! Scene document reading and writing.
//!
//! A scene document is a JSON tree holding the render settings, the camera
//! and the list of objects:
//!
//! ```json
//! {
//!   "renderer": {
//!     "image_width": 480, "image_height": 400, "samples_per_pixel": 100,
//!     "aspect_ratio": 1.2, "max_depth": 50,
//!     "camera": { "aperture": 0.1, "vertical_fov": 20.0, ... }
//!   },
//!   "objects": [
//!     { "Sphere": { "radius": 1.0, "center": {...}, "material": {...} } }
//!   ]
//! }
//! ```
//!
//! Objects and materials are single-key maps whose key names the kind.
//! Every field is required and loading is all-or-nothing.

use std::path::Path;
use std::sync::Arc;

use log::info;
use prism_math::Vec3;
use prism_renderer::{
    CameraConfig, Dielectric, Engine, EngineError, Lambertian, Material, Metal, MovingSphere,
    Object, ObjectList, RenderConfig, Sphere,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors that can occur while reading a scene document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Missing element `{element}` in {context}")]
    MissingElement { element: String, context: String },

    #[error("Unknown {kind} `{tag}`")]
    UnknownTag { kind: &'static str, tag: String },

    #[error("Malformed number for `{field}`: {value}")]
    MalformedNumber { field: String, value: String },

    #[error("Invalid render settings: {0}")]
    Settings(#[from] EngineError),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Everything a scene document describes.
#[derive(Debug, Clone)]
pub struct SceneDocument {
    pub settings: RenderConfig,
    pub camera: CameraConfig,
    pub world: ObjectList,
}

impl SceneDocument {
    /// Capture the settings, camera and scene of an engine.
    pub fn from_engine(engine: &Engine) -> Self {
        Self {
            settings: engine.config().clone(),
            camera: engine.camera().config().clone(),
            world: engine.world().clone(),
        }
    }

    /// Build an engine ready to render this document.
    pub fn into_engine(self) -> DocumentResult<Engine> {
        let mut engine = Engine::new(self.settings, self.camera)?;
        engine.set_world(self.world)?;
        Ok(engine)
    }
}

/// Load a scene document from a file.
pub fn load<P: AsRef<Path>>(path: P) -> DocumentResult<SceneDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let doc = load_from_str(&content)?;
    info!("Loaded {} objects from {}", doc.world.len(), path.display());
    Ok(doc)
}

/// Load a scene document from a string.
pub fn load_from_str(content: &str) -> DocumentResult<SceneDocument> {
    let root: Value = serde_json::from_str(content)?;
    let root = as_map(&root, "document", "root")?;

    let renderer = as_map(child(root, "renderer", "document")?, "renderer", "document")?;
    let settings = read_settings(renderer)?;
    let camera = read_camera(as_map(
        child(renderer, "camera", "renderer")?,
        "camera",
        "renderer",
    )?)?;

    let objects = child(root, "objects", "document")?;
    let objects = objects
        .as_array()
        .ok_or_else(|| missing("objects", "document"))?;

    let mut world = ObjectList::new();
    for object in objects {
        world.add(read_object(object)?);
    }

    Ok(SceneDocument {
        settings,
        camera,
        world,
    })
}

/// Write a scene document to a file.
pub fn save<P: AsRef<Path>>(doc: &SceneDocument, path: P) -> DocumentResult<()> {
    let path = path.as_ref();
    std::fs::write(path, to_string(doc)?)?;
    info!("Saved {} objects to {}", doc.world.len(), path.display());
    Ok(())
}

/// Serialize a scene document to pretty-printed JSON.
pub fn to_string(doc: &SceneDocument) -> DocumentResult<String> {
    let settings = &doc.settings;
    let camera = &doc.camera;

    let root = json!({
        "renderer": {
            "image_width": settings.image_width,
            "image_height": settings.image_height,
            "samples_per_pixel": settings.samples_per_pixel,
            "aspect_ratio": settings.aspect_ratio,
            "max_depth": settings.max_depth,
            "camera": {
                "aperture": camera.aperture,
                "vertical_fov": camera.vfov,
                "aspect_ratio": camera.aspect_ratio,
                "focus_distance": camera.focus_dist,
                "shutter_open": camera.time0,
                "shutter_close": camera.time1,
                "look_from": point(camera.look_from),
                "look_at": point(camera.look_at),
                "vup": point(camera.vup),
            },
        },
        "objects": doc.world.iter().map(write_object).collect::<Vec<_>>(),
    });

    Ok(serde_json::to_string_pretty(&root)?)
}

// ===== Writing =====

fn point(v: Vec3) -> Value {
    json!({ "x": v.x, "y": v.y, "z": v.z })
}

fn color(c: Vec3) -> Value {
    json!({ "r": c.x, "g": c.y, "b": c.z })
}

fn write_material(material: &Material) -> Value {
    match material {
        Material::Lambertian(m) => json!({
            "LambertianMateriau": { "color": color(m.albedo()) }
        }),
        Material::Metal(m) => json!({
            "MetalMateriau": { "color": color(m.albedo()), "fuzz": m.fuzz() }
        }),
        Material::Dielectric(m) => json!({
            "DielectricMateriau": { "refraction_index": m.ior() }
        }),
    }
}

fn write_object(object: &Object) -> Value {
    match object {
        Object::Sphere(sphere) => json!({
            "Sphere": {
                "radius": sphere.radius(),
                "center": point(sphere.center()),
                "material": write_material(sphere.material()),
            }
        }),
        Object::MovingSphere(sphere) => {
            let (center0, center1) = sphere.centers();
            let (time0, time1) = sphere.times();
            json!({
                "Moving_Sphere": {
                    "radius": sphere.radius(),
                    "center0": point(center0),
                    "center1": point(center1),
                    "time0": time0,
                    "time1": time1,
                    "material": write_material(sphere.material()),
                }
            })
        }
        // Written for completeness; nested lists are rejected when reading
        Object::List(list) => json!({
            "ObjectList": list.iter().map(write_object).collect::<Vec<_>>()
        }),
    }
}

// ===== Reading =====

fn missing(element: &str, context: &str) -> DocumentError {
    DocumentError::MissingElement {
        element: element.to_string(),
        context: context.to_string(),
    }
}

fn as_map<'v>(value: &'v Value, element: &str, context: &str) -> DocumentResult<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| missing(element, context))
}

fn child<'v>(map: &'v Map<String, Value>, key: &str, context: &str) -> DocumentResult<&'v Value> {
    map.get(key).ok_or_else(|| missing(key, context))
}

fn number(map: &Map<String, Value>, key: &str, context: &str) -> DocumentResult<f32> {
    let value = child(map, key, context)?;
    value
        .as_f64()
        .map(|n| n as f32)
        .ok_or_else(|| DocumentError::MalformedNumber {
            field: format!("{context}.{key}"),
            value: value.to_string(),
        })
}

/// An integer setting no smaller than `min`.
fn integer(map: &Map<String, Value>, key: &str, context: &str, min: u32) -> DocumentResult<u32> {
    let value = child(map, key, context)?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n >= min)
        .ok_or_else(|| DocumentError::MalformedNumber {
            field: format!("{context}.{key}"),
            value: value.to_string(),
        })
}

fn triple(
    map: &Map<String, Value>,
    key: &str,
    context: &str,
    names: [&str; 3],
) -> DocumentResult<Vec3> {
    let inner = as_map(child(map, key, context)?, key, context)?;
    let context = format!("{context}.{key}");
    Ok(Vec3::new(
        number(inner, names[0], &context)?,
        number(inner, names[1], &context)?,
        number(inner, names[2], &context)?,
    ))
}

fn read_point(map: &Map<String, Value>, key: &str, context: &str) -> DocumentResult<Vec3> {
    triple(map, key, context, ["x", "y", "z"])
}

fn read_color(map: &Map<String, Value>, context: &str) -> DocumentResult<Vec3> {
    triple(map, "color", context, ["r", "g", "b"])
}

/// Split a single-key map into its tag and body.
fn tagged<'v>(
    value: &'v Value,
    kind: &'static str,
    context: &str,
) -> DocumentResult<(&'v str, &'v Value)> {
    let map = match value {
        Value::Object(map) => map,
        Value::Array(_) => {
            return Err(DocumentError::UnknownTag {
                kind,
                tag: "list".to_string(),
            })
        }
        _ => return Err(missing(kind, context)),
    };

    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((tag, body)), None) => Ok((tag.as_str(), body)),
        (None, _) => Err(missing(kind, context)),
        (Some(_), Some(_)) => Err(DocumentError::UnknownTag {
            kind,
            tag: map.keys().cloned().collect::<Vec<_>>().join(","),
        }),
    }
}

fn read_settings(renderer: &Map<String, Value>) -> DocumentResult<RenderConfig> {
    let context = "renderer";
    Ok(RenderConfig {
        image_width: integer(renderer, "image_width", context, 1)?,
        image_height: integer(renderer, "image_height", context, 1)?,
        samples_per_pixel: integer(renderer, "samples_per_pixel", context, 1)?,
        max_depth: integer(renderer, "max_depth", context, 0)?,
        aspect_ratio: number(renderer, "aspect_ratio", context)?,
        ..RenderConfig::default()
    })
}

fn read_camera(camera: &Map<String, Value>) -> DocumentResult<CameraConfig> {
    let context = "camera";
    Ok(CameraConfig {
        look_from: read_point(camera, "look_from", context)?,
        look_at: read_point(camera, "look_at", context)?,
        vup: read_point(camera, "vup", context)?,
        vfov: number(camera, "vertical_fov", context)?,
        aspect_ratio: number(camera, "aspect_ratio", context)?,
        aperture: number(camera, "aperture", context)?,
        focus_dist: number(camera, "focus_distance", context)?,
        time0: number(camera, "shutter_open", context)?,
        time1: number(camera, "shutter_close", context)?,
    })
}

fn read_material(value: &Value, context: &str) -> DocumentResult<Arc<Material>> {
    let (tag, body) = tagged(value, "material", context)?;

    let material: Material = match tag {
        "LambertianMateriau" => {
            let body = as_map(body, tag, context)?;
            Lambertian::new(read_color(body, tag)?).into()
        }
        "MetalMateriau" => {
            let body = as_map(body, tag, context)?;
            Metal::new(read_color(body, tag)?, number(body, "fuzz", tag)?).into()
        }
        "DielectricMateriau" => {
            let body = as_map(body, tag, context)?;
            Dielectric::new(number(body, "refraction_index", tag)?).into()
        }
        _ => {
            return Err(DocumentError::UnknownTag {
                kind: "material",
                tag: tag.to_string(),
            })
        }
    };
    Ok(Arc::new(material))
}

fn read_object(value: &Value) -> DocumentResult<Object> {
    let (tag, body) = tagged(value, "object", "objects")?;

    match tag {
        "Sphere" => {
            let body = as_map(body, tag, "objects")?;
            Ok(Sphere::new(
                read_point(body, "center", tag)?,
                number(body, "radius", tag)?,
                read_material(child(body, "material", tag)?, tag)?,
            )
            .into())
        }
        "Moving_Sphere" => {
            let body = as_map(body, tag, "objects")?;
            Ok(MovingSphere::new(
                read_point(body, "center0", tag)?,
                read_point(body, "center1", tag)?,
                number(body, "time0", tag)?,
                number(body, "time1", tag)?,
                number(body, "radius", tag)?,
                read_material(child(body, "material", tag)?, tag)?,
            )
            .into())
        }
        // Includes nested object lists
        _ => Err(DocumentError::UnknownTag {
            kind: "object",
            tag: tag.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_renderer::Hittable;

    const SCENE: &str = r#"
{
  "renderer": {
    "image_width": 320, "image_height": 200, "samples_per_pixel": 8,
    "aspect_ratio": 1.6, "max_depth": 12,
    "camera": {
      "aperture": 0.5, "vertical_fov": 30.0, "aspect_ratio": 1.6,
      "focus_distance": 7.5, "shutter_open": 0.0, "shutter_close": 1.0,
      "look_from": {"x": 1, "y": 2, "z": 3},
      "look_at": {"x": 0, "y": 0, "z": -1},
      "vup": {"x": 0, "y": 1, "z": 0}
    }
  },
  "objects": [
    {"Sphere": {"radius": 1000.0, "center": {"x": 0, "y": -1000, "z": 0},
      "material": {"LambertianMateriau": {"color": {"r": 0.5, "g": 0.5, "b": 0.5}}}}},
    {"Moving_Sphere": {"radius": 0.2, "center0": {"x": 1, "y": 0.2, "z": 1},
      "center1": {"x": 1, "y": 0.5, "z": 1}, "time0": 0.0, "time1": 1.0,
      "material": {"MetalMateriau": {"color": {"r": 0.7, "g": 0.6, "b": 0.5}, "fuzz": 0.1}}}},
    {"Sphere": {"radius": 1.0, "center": {"x": 0, "y": 1, "z": 0},
      "material": {"DielectricMateriau": {"refraction_index": 1.5}}}}
  ]
}
"#;

    fn without(path: &[&str]) -> String {
        let mut root: Value = serde_json::from_str(SCENE).unwrap();
        let (last, parents) = path.split_last().unwrap();
        let mut node = &mut root;
        for key in parents {
            node = node.get_mut(*key).unwrap();
        }
        node.as_object_mut().unwrap().remove(*last);
        root.to_string()
    }

    #[test]
    fn test_load_scene() {
        let doc = load_from_str(SCENE).unwrap();

        assert_eq!(doc.settings.image_width, 320);
        assert_eq!(doc.settings.image_height, 200);
        assert_eq!(doc.settings.samples_per_pixel, 8);
        assert_eq!(doc.settings.max_depth, 12);
        assert!((doc.settings.aspect_ratio - 1.6).abs() < 1e-6);

        assert_eq!(doc.camera.look_from, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(doc.camera.look_at, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(doc.camera.vfov, 30.0);
        assert_eq!(doc.camera.focus_dist, 7.5);
        assert_eq!(doc.camera.aperture, 0.5);
        assert_eq!((doc.camera.time0, doc.camera.time1), (0.0, 1.0));

        assert_eq!(doc.world.len(), 3);
        let kinds: Vec<_> = doc
            .world
            .iter()
            .map(|object| match object {
                Object::Sphere(s) => match **s.material() {
                    Material::Lambertian(_) => "lambertian",
                    Material::Dielectric(_) => "dielectric",
                    Material::Metal(_) => "metal",
                },
                Object::MovingSphere(s) => {
                    assert_eq!(s.times(), (0.0, 1.0));
                    assert!(matches!(**s.material(), Material::Metal(ref m) if (m.fuzz() - 0.1).abs() < 1e-6));
                    "moving"
                }
                Object::List(_) => "list",
            })
            .collect();
        assert_eq!(kinds, ["lambertian", "moving", "dielectric"]);
    }

    #[test]
    fn test_round_trip() {
        let doc = load_from_str(SCENE).unwrap();
        let text = to_string(&doc).unwrap();
        let again = load_from_str(&text).unwrap();

        assert_eq!(again.settings, doc.settings);
        assert_eq!(again.camera, doc.camera);
        assert_eq!(again.world.len(), doc.world.len());
        assert_eq!(
            again.world.bounding_box(0.0, 1.0),
            doc.world.bounding_box(0.0, 1.0)
        );
        for (a, b) in again.world.iter().zip(doc.world.iter()) {
            match (a, b) {
                (Object::Sphere(a), Object::Sphere(b)) => {
                    assert_eq!(a.center(), b.center());
                    assert_eq!(a.radius(), b.radius());
                    assert_eq!(a.material(), b.material());
                }
                (Object::MovingSphere(a), Object::MovingSphere(b)) => {
                    assert_eq!(a.centers(), b.centers());
                    assert_eq!(a.times(), b.times());
                    assert_eq!(a.material(), b.material());
                }
                _ => panic!("object kinds differ"),
            }
        }
    }

    #[test]
    fn test_missing_elements() {
        for path in [
            &["renderer"][..],
            &["objects"][..],
            &["renderer", "camera"][..],
            &["renderer", "max_depth"][..],
            &["renderer", "camera", "vup"][..],
        ] {
            let err = load_from_str(&without(path)).unwrap_err();
            let last = path[path.len() - 1];
            assert!(
                matches!(&err, DocumentError::MissingElement { element, .. } if element == last),
                "{path:?}: {err}"
            );
        }
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(matches!(
            load_from_str("[1, 2, 3]"),
            Err(DocumentError::MissingElement { .. })
        ));
        assert!(matches!(
            load_from_str("{ not json"),
            Err(DocumentError::Syntax(_))
        ));
    }

    #[test]
    fn test_unknown_object_tag() {
        let text = SCENE.replacen("\"Moving_Sphere\"", "\"Cube\"", 1);
        match load_from_str(&text) {
            Err(DocumentError::UnknownTag { kind, tag }) => {
                assert_eq!(kind, "object");
                assert_eq!(tag, "Cube");
            }
            other => panic!("expected unknown tag, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_material_tag() {
        let text = SCENE.replacen("DielectricMateriau", "GlassMateriau", 1);
        assert!(matches!(
            load_from_str(&text),
            Err(DocumentError::UnknownTag { kind: "material", .. })
        ));
    }

    #[test]
    fn test_nested_list_rejected() {
        let mut inner = ObjectList::new();
        inner.add(Sphere::new(
            Vec3::ZERO,
            1.0,
            Arc::new(Dielectric::new(1.5).into()),
        ));
        let mut doc = load_from_str(SCENE).unwrap();
        doc.world.add(inner);

        let text = to_string(&doc).unwrap();
        assert!(matches!(
            load_from_str(&text),
            Err(DocumentError::UnknownTag { kind: "object", .. })
        ));
    }

    fn with_objects(objects: Value) -> String {
        let mut root: Value = serde_json::from_str(SCENE).unwrap();
        root["objects"] = objects;
        root.to_string()
    }

    #[test]
    fn test_unknown_tag_with_non_map_body() {
        for (objects, expected_kind, expected_tag) in [
            (json!([{ "ObjectList": [] }]), "object", "ObjectList"),
            (json!([{ "Cube": 5 }]), "object", "Cube"),
            (
                json!([{ "Sphere": {
                    "radius": 1.0,
                    "center": { "x": 0, "y": 0, "z": 0 },
                    "material": { "ChromeMateriau": 1 }
                } }]),
                "material",
                "ChromeMateriau",
            ),
        ] {
            match load_from_str(&with_objects(objects)) {
                Err(DocumentError::UnknownTag { kind, tag }) => {
                    assert_eq!(kind, expected_kind);
                    assert_eq!(tag, expected_tag);
                }
                other => panic!("expected unknown {expected_tag}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_known_tag_with_non_map_body_is_missing() {
        let text = with_objects(json!([{ "Sphere": 5 }]));
        assert!(matches!(
            load_from_str(&text),
            Err(DocumentError::MissingElement { .. })
        ));
    }

    #[test]
    fn test_malformed_numbers() {
        let text = SCENE.replacen("\"fuzz\": 0.1", "\"fuzz\": \"rough\"", 1);
        match load_from_str(&text) {
            Err(DocumentError::MalformedNumber { field, value }) => {
                assert_eq!(field, "MetalMateriau.fuzz");
                assert_eq!(value, "\"rough\"");
            }
            other => panic!("expected malformed number, got {other:?}"),
        }

        let text = SCENE.replacen("\"image_width\": 320", "\"image_width\": -5", 1);
        assert!(matches!(
            load_from_str(&text),
            Err(DocumentError::MalformedNumber { .. })
        ));

        let text = SCENE.replacen("\"samples_per_pixel\": 8", "\"samples_per_pixel\": 0", 1);
        assert!(matches!(
            load_from_str(&text),
            Err(DocumentError::MalformedNumber { .. })
        ));
    }

    #[test]
    fn test_engine_round_trip() {
        let engine = load_from_str(SCENE).unwrap().into_engine().unwrap();
        assert_eq!(engine.image_width(), 320);
        assert_eq!(engine.samples_per_pixel(), 8);
        assert_eq!(engine.world().len(), 3);
        assert_eq!(engine.camera().config().focus_dist, 7.5);

        let doc = SceneDocument::from_engine(&engine);
        assert_eq!(doc.settings, *engine.config());
        assert_eq!(doc.world.len(), 3);
    }

    #[test]
    fn test_save_and_load_file() {
        let doc = load_from_str(SCENE).unwrap();
        let path = std::env::temp_dir().join(format!("prism_scene_{}.json", std::process::id()));

        save(&doc, &path).unwrap();
        let loaded = load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.settings, doc.settings);
        assert_eq!(loaded.world.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("prism_scene_does_not_exist.json");
        assert!(matches!(load(&path), Err(DocumentError::Io(_))));
    }
}
