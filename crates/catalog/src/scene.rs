//! Scene object model: the objects, types, and behaviors an expression can
//! address.

use crate::SceneQuery;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// A behavior attached to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorInstance {
    /// Name used in expressions (`Player.Physics::Speed()` → `Physics`).
    pub name: String,
    /// Behavior type, the key of behavior-bound catalog entries.
    #[serde(rename = "type")]
    pub behavior_type: String,
}

/// An object with its declared type and attached behaviors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object name; may contain spaces (written with `~` in expressions).
    pub name: String,
    /// Object type, the key of object-bound catalog entries.
    #[serde(rename = "type")]
    pub object_type: String,
    /// Attached behaviors.
    #[serde(default)]
    pub behaviors: Vec<BehaviorInstance>,
}

impl SceneObject {
    /// An object with no behaviors.
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            behaviors: Vec::new(),
        }
    }

    /// Attach a behavior (builder pattern).
    #[must_use]
    pub fn with_behavior(
        mut self,
        name: impl Into<String>,
        behavior_type: impl Into<String>,
    ) -> Self {
        self.behaviors.push(BehaviorInstance {
            name: name.into(),
            behavior_type: behavior_type.into(),
        });
        self
    }
}

/// Errors raised while loading a scene description.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The document is not valid JSON (after JSONC stripping).
    #[error("invalid scene JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Two objects in the same list share a name.
    #[error("duplicate {list} object '{name}'")]
    DuplicateObject {
        /// `"scene"` or `"global"`.
        list: &'static str,
        /// The repeated name.
        name: String,
    },
}

/// Objects visible to an expression: scene objects first, then global ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Objects of the current scene.
    #[serde(default)]
    objects: Vec<SceneObject>,
    /// Objects shared by every scene of the game.
    #[serde(default)]
    global_objects: Vec<SceneObject>,

    /// Object name → object (lazily initialized).
    #[serde(skip)]
    by_name: OnceLock<HashMap<String, (bool, usize)>>,
}

impl Scene {
    /// Build a scene from scene and global objects.
    pub fn new(
        objects: Vec<SceneObject>,
        global_objects: Vec<SceneObject>,
    ) -> Result<Self, SceneError> {
        let scene = Self {
            objects,
            global_objects,
            by_name: OnceLock::new(),
        };
        scene.validate()?;
        Ok(scene)
    }

    /// Parse a scene from JSONC text.
    pub fn from_jsonc(text: &str) -> Result<Self, SceneError> {
        let scene: Scene = serde_json::from_str(&gdexpr_jsonc::strip_jsonc(text))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Scene objects, in document order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Global objects, in document order.
    pub fn global_objects(&self) -> &[SceneObject] {
        &self.global_objects
    }

    fn validate(&self) -> Result<(), SceneError> {
        for (list, objects) in [("scene", &self.objects), ("global", &self.global_objects)] {
            let mut names = std::collections::HashSet::new();
            for o in objects {
                if !names.insert(o.name.as_str()) {
                    return Err(SceneError::DuplicateObject {
                        list,
                        name: o.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up an object by name; scene objects shadow global ones.
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        let by_name = self.by_name.get_or_init(|| {
            let mut m = HashMap::new();
            for (i, o) in self.global_objects.iter().enumerate() {
                m.insert(o.name.clone(), (true, i));
            }
            for (i, o) in self.objects.iter().enumerate() {
                m.insert(o.name.clone(), (false, i));
            }
            m
        });
        by_name.get(name).map(|&(global, i)| {
            if global {
                &self.global_objects[i]
            } else {
                &self.objects[i]
            }
        })
    }

    fn all_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().chain(self.global_objects.iter())
    }
}

impl SceneQuery for Scene {
    fn type_of_object(&self, object: &str) -> Option<&str> {
        self.object(object).map(|o| o.object_type.as_str())
    }

    fn type_of_behavior(&self, object: &str, behavior: &str) -> Option<&str> {
        fn attached<'s>(o: &'s SceneObject, behavior: &str) -> Option<&'s str> {
            o.behaviors
                .iter()
                .find(|b| b.name == behavior)
                .map(|b| b.behavior_type.as_str())
        }
        self.object(object)
            .and_then(|o| attached(o, behavior))
            .or_else(|| self.all_objects().find_map(|o| attached(o, behavior)))
    }

    fn behaviors_attached_to(&self, object: &str) -> Vec<&str> {
        self.object(object)
            .map(|o| o.behaviors.iter().map(|b| b.name.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(
            vec![
                SceneObject::new("Player", "Sprite").with_behavior("Physics", "PhysicsBehavior"),
                SceneObject::new("Enemy Ship", "Sprite"),
            ],
            vec![
                SceneObject::new("Player", "TextObject"),
                SceneObject::new("Hud", "TextObject").with_behavior("Tween", "TweenBehavior"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn scene_objects_shadow_global_objects() {
        let s = scene();
        assert_eq!(s.type_of_object("Player"), Some("Sprite"));
        assert_eq!(s.type_of_object("Hud"), Some("TextObject"));
        assert_eq!(s.type_of_object("Enemy Ship"), Some("Sprite"));
        assert_eq!(s.type_of_object("Nobody"), None);
    }

    #[test]
    fn behavior_type_falls_back_to_any_object_with_that_behavior() {
        let s = scene();
        assert_eq!(s.type_of_behavior("Player", "Physics"), Some("PhysicsBehavior"));
        // Enemy Ship has no Tween, but the type is still known from Hud.
        assert_eq!(s.type_of_behavior("Enemy Ship", "Tween"), Some("TweenBehavior"));
        assert!(!s.has_behavior("Enemy Ship", "Tween"));
        assert_eq!(s.type_of_behavior("Player", "Missing"), None);
    }

    #[test]
    fn behaviors_attached_lists_names() {
        let s = scene();
        assert_eq!(s.behaviors_attached_to("Player"), vec!["Physics"]);
        assert!(s.behaviors_attached_to("Nobody").is_empty());
    }

    #[test]
    fn loads_from_jsonc() {
        let s = Scene::from_jsonc(
            r#"{
              // scene objects
              "objects": [
                { "name": "Player", "type": "Sprite",
                  "behaviors": [ { "name": "Physics", "type": "PhysicsBehavior" } ] },
              ],
            }"#,
        )
        .unwrap();
        assert_eq!(s.objects().len(), 1);
        assert!(s.global_objects().is_empty());
        assert!(s.has_behavior("Player", "Physics"));
    }

    #[test]
    fn duplicate_object_names_are_rejected() {
        let err = Scene::new(
            vec![SceneObject::new("A", "Sprite"), SceneObject::new("A", "Text")],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "duplicate scene object 'A'");
    }

    #[test]
    fn empty_scene_knows_nothing() {
        let s = Scene::default();
        assert_eq!(s.type_of_object("Player"), None);
        assert_eq!(s.type_of_behavior("Player", "Physics"), None);
    }
}
