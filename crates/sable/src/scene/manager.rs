//! Named scenes and scene switching.
//!
//! At most one scene is active. [`SceneManager::load_scene`] only records the
//! request; the switch happens at the end of the next
//! [`update`](SceneManager::update), after the current scene finished its
//! frame:
//!
//! ```text
//! update ─▶ active.update() ─▶ pending? ─▶ old.unload() ─▶ new.load()
//! ```

use std::collections::HashMap;

use super::Scene;
use crate::context::Frame;
use crate::ecs::EntityId;
use crate::error::EngineError;
use crate::render::Surface;

#[derive(Default)]
pub struct SceneManager {
    scenes: HashMap<String, Scene>,
    active: Option<String>,
    pending: Option<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene under its name.
    pub fn add_scene(&mut self, scene: Scene) -> Result<(), EngineError> {
        if scene.name().is_empty() {
            log::error!("Cannot add a scene with an empty name");
            return Err(EngineError::EmptySceneName);
        }
        if self.scenes.contains_key(scene.name()) {
            log::error!("Scene '{}' is already registered", scene.name());
            return Err(EngineError::DuplicateScene(scene.name().to_string()));
        }
        log::debug!("Registered scene '{}'", scene.name());
        self.scenes.insert(scene.name().to_string(), scene);
        Ok(())
    }

    /// Unregister a scene. The active scene cannot be removed.
    pub fn remove_scene(&mut self, name: &str) -> Option<Scene> {
        if self.active.as_deref() == Some(name) {
            log::warn!("Cannot remove active scene '{name}'");
            return None;
        }
        if self.pending.as_deref() == Some(name) {
            self.pending = None;
        }
        self.scenes.remove(name)
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Scene> {
        self.active.as_deref().and_then(|name| self.scenes.get(name))
    }

    pub fn active_mut(&mut self) -> Option<&mut Scene> {
        let name = self.active.as_deref()?;
        self.scenes.get_mut(name)
    }

    /// Request a switch to `name` at the end of the next update. A later
    /// request replaces an earlier one.
    pub fn load_scene(&mut self, name: impl Into<String>) {
        self.pending = Some(name.into());
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Move a live entity (with its subtree) from one scene into another. It
    /// becomes live in the target at that scene's next flush.
    pub fn move_entity(&mut self, id: EntityId, from: &str, to: &str) -> bool {
        self.transfer(id, from, to, None)
    }

    /// Parent `child`, live in scene `from`, to `parent`, live in scene `to`.
    /// Across scenes the child and its subtree are re-spawned into `to` under
    /// `parent`, keeping their world positions.
    pub fn set_parent(&mut self, child: EntityId, from: &str, parent: EntityId, to: &str) -> bool {
        if from == to {
            return self
                .scenes
                .get_mut(from)
                .is_some_and(|scene| scene.set_parent(child, parent));
        }
        self.transfer(child, from, to, Some(parent))
    }

    fn transfer(&mut self, id: EntityId, from: &str, to: &str, parent: Option<EntityId>) -> bool {
        if from == to || !self.scenes.contains_key(to) {
            log::warn!("Cannot move entity {id} from '{from}' to '{to}'");
            return false;
        }
        let anchor = match parent {
            Some(parent) => match self.scenes.get(to).and_then(|s| s.entity(parent)) {
                Some(entity) => Some((parent, entity.position())),
                None => {
                    log::warn!("Cannot parent entity {id} to {parent}: not live in scene '{to}'");
                    return false;
                }
            },
            None => None,
        };
        let Some(mut entity) = self.scenes.get_mut(from).and_then(|s| s.detach(id)) else {
            log::warn!("Entity {id} is not live in scene '{from}'");
            return false;
        };

        let Some(target) = self.scenes.get_mut(to) else {
            return false;
        };
        match anchor {
            Some((parent, origin)) => {
                entity.transform_mut().rebase(origin);
                target.spawn_child(parent, entity).is_some()
            }
            None => target.spawn(entity).is_some(),
        }
    }

    /// Run the active scene's frame, then apply a pending switch.
    pub fn update(&mut self, frame: &mut Frame<'_>, surface: &mut dyn Surface) {
        if let Some(scene) = self.active_mut() {
            scene.update(frame, surface);
        }
        self.apply_pending(frame);
    }

    fn apply_pending(&mut self, frame: &mut Frame<'_>) {
        let Some(next) = self.pending.take() else {
            return;
        };
        if !self.scenes.contains_key(&next) {
            log::warn!("Scene '{next}' not found, keeping the current scene");
            return;
        }

        if let Some(scene) = self.active_mut() {
            scene.unload(frame);
        }
        if let Some(scene) = self.scenes.get_mut(&next) {
            scene.load(frame);
        }
        log::info!("Switched to scene '{next}'");
        self.active = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneSettings;
    use crate::ecs::Runtime;
    use crate::input::InputState;
    use crate::math::Vec2;
    use crate::render::HeadlessSurface;
    use crate::task::TaskScheduler;
    use crate::time::Time;

    struct Rig {
        time: Time,
        input: InputState,
        tasks: TaskScheduler,
        surface: HeadlessSurface,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                time: Time::new(),
                input: InputState::new(),
                tasks: TaskScheduler::new(),
                surface: HeadlessSurface::default(),
            }
        }

        fn update(&mut self, scenes: &mut SceneManager) {
            let mut frame = Frame::new(&self.time, &self.input, &mut self.tasks);
            scenes.update(&mut frame, &mut self.surface);
        }
    }

    fn manager(runtime: &Runtime, names: &[&str]) -> SceneManager {
        let mut scenes = SceneManager::new();
        for name in names {
            scenes
                .add_scene(Scene::new(runtime, *name, SceneSettings::default()))
                .unwrap();
        }
        scenes
    }

    #[test]
    fn rejects_empty_and_duplicate_names() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["menu"]);

        assert!(matches!(
            scenes.add_scene(Scene::new(&runtime, "", SceneSettings::default())),
            Err(EngineError::EmptySceneName)
        ));
        assert!(matches!(
            scenes.add_scene(Scene::new(&runtime, "menu", SceneSettings::default())),
            Err(EngineError::DuplicateScene(name)) if name == "menu"
        ));
    }

    #[test]
    fn switch_happens_after_the_frame() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["menu", "level"]);
        let mut rig = Rig::new();

        scenes.load_scene("menu");
        assert!(scenes.active().is_none());
        rig.update(&mut scenes);
        assert_eq!(scenes.active_name(), Some("menu"));
        assert!(scenes.scene("menu").unwrap().is_loaded());

        scenes.load_scene("level");
        rig.update(&mut scenes);
        assert_eq!(scenes.active_name(), Some("level"));
        assert!(!scenes.scene("menu").unwrap().is_loaded());
        assert!(scenes.scene("level").unwrap().is_loaded());
    }

    #[test]
    fn unknown_scene_keeps_current() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["menu"]);
        let mut rig = Rig::new();
        scenes.load_scene("menu");
        rig.update(&mut scenes);

        scenes.load_scene("nowhere");
        rig.update(&mut scenes);

        assert_eq!(scenes.active_name(), Some("menu"));
        assert!(scenes.pending().is_none());
    }

    #[test]
    fn active_scene_cannot_be_removed() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["menu", "level"]);
        scenes.load_scene("menu");
        Rig::new().update(&mut scenes);

        assert!(scenes.remove_scene("menu").is_none());
        assert!(scenes.remove_scene("level").is_some());
        assert!(!scenes.contains("level"));
    }

    #[test]
    fn entities_move_between_scenes() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["a", "b"]);
        let mut rig = Rig::new();
        let id = scenes
            .scene_mut("a")
            .unwrap()
            .spawn(runtime.entity("traveller").at(2.0, 2.0))
            .unwrap();
        scenes.load_scene("a");
        rig.update(&mut scenes);
        assert!(scenes.scene("a").unwrap().contains(id));

        assert!(scenes.move_entity(id, "a", "b"));
        assert!(!scenes.scene("a").unwrap().contains(id));

        scenes.load_scene("b");
        rig.update(&mut scenes);
        let scene = scenes.scene("b").unwrap();
        assert_eq!(scene.entity(id).unwrap().position(), Vec2::new(2.0, 2.0));
        assert!(!scenes.move_entity(id, "a", "b"));
    }

    #[test]
    fn parenting_across_scenes_respawns_the_child() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["a", "b"]);
        let mut rig = Rig::new();
        let leaf = runtime.entity("leaf").at(0.0, 1.0);
        let leaf_id = leaf.id();
        let child = scenes
            .scene_mut("a")
            .unwrap()
            .spawn(runtime.entity("child").at(5.0, 5.0).with_child(leaf))
            .unwrap();
        let anchor = scenes
            .scene_mut("b")
            .unwrap()
            .spawn(runtime.entity("anchor").at(2.0, 0.0))
            .unwrap();
        scenes.load_scene("a");
        rig.update(&mut scenes);
        scenes.load_scene("b");
        rig.update(&mut scenes);

        assert!(scenes.set_parent(child, "a", anchor, "b"));
        assert!(!scenes.scene("a").unwrap().contains(child));
        assert!(!scenes.scene("a").unwrap().contains(leaf_id));
        rig.update(&mut scenes);

        let scene = scenes.scene("b").unwrap();
        assert_eq!(scene.children(anchor), &[child]);
        assert_eq!(scene.children(child), &[leaf_id]);
        let moved = scene.entity(child).unwrap();
        assert_eq!(moved.position(), Vec2::new(5.0, 5.0));
        assert_eq!(moved.transform().local_position(), Vec2::new(3.0, 5.0));
        assert_eq!(scene.entity(leaf_id).unwrap().position(), Vec2::new(5.0, 6.0));
    }

    #[test]
    fn parenting_across_scenes_needs_a_live_parent() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["a", "b"]);
        let mut rig = Rig::new();
        let child = scenes
            .scene_mut("a")
            .unwrap()
            .spawn(runtime.entity("child"))
            .unwrap();
        scenes.load_scene("a");
        rig.update(&mut scenes);

        let stranger = runtime.entity("stranger").id();
        assert!(!scenes.set_parent(child, "a", stranger, "b"));
        assert!(scenes.scene("a").unwrap().contains(child));
    }

    #[test]
    fn parenting_within_one_scene_keeps_it_there() {
        let runtime = Runtime::with_builtins();
        let mut scenes = manager(&runtime, &["a"]);
        let mut rig = Rig::new();
        let scene = scenes.scene_mut("a").unwrap();
        let parent = scene.spawn(runtime.entity("parent").at(1.0, 0.0)).unwrap();
        let child = scene.spawn(runtime.entity("child").at(4.0, 0.0)).unwrap();
        scenes.load_scene("a");
        rig.update(&mut scenes);

        assert!(scenes.set_parent(child, "a", parent, "a"));
        assert_eq!(scenes.scene("a").unwrap().children(parent), &[child]);
    }
}
