//! Flat, ordered set of drawable entities
//!
//! The scene never owns what it draws: whoever builds an entity keeps a
//! handle to it and registers a clone of that handle here.

use std::cell::RefCell;
use std::rc::Rc;

use super::state::Render;
use crate::platform::Surface;

/// Shared handle to a drawable entity
pub type EntityHandle = Rc<RefCell<dyn Render>>;

/// Entities drawn back to front in insertion order
#[derive(Default)]
pub struct Scene {
    entities: Vec<EntityHandle>,
}

/// Identity of a handle, ignoring the vtable half of the fat pointer
fn addr(entity: &EntityHandle) -> *const () {
    Rc::as_ptr(entity) as *const ()
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. Adding the same entity twice is a no-op;
    /// two distinct entities with equal contents are both kept.
    /// Returns whether the entity was inserted.
    pub fn add(&mut self, entity: EntityHandle) -> bool {
        if self.contains(&entity) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub fn contains(&self, entity: &EntityHandle) -> bool {
        let target = addr(entity);
        self.entities.iter().any(|e| addr(e) == target)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Draw every entity once, first-added first
    pub fn render_all(&self, surface: &mut dyn Surface) {
        for entity in &self.entities {
            entity.borrow().render(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{DrawCommand, RecordingSurface};
    use crate::sim::state::{Ground, Role};

    fn fill_ops(commands: &[DrawCommand]) -> Vec<&'static str> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { .. } => Some("rect"),
                DrawCommand::FillCircle { .. } => Some("circle"),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_renders_in_insertion_order() {
        let ground = Rc::new(RefCell::new(Ground::new(0.0, 80.0, 100.0, 20.0)));
        let role = Rc::new(RefCell::new(Role::new(5.0, 5.0, 75.0)));

        let mut scene = Scene::new();
        assert!(scene.add(ground));
        assert!(scene.add(role.clone()));

        let mut surface = RecordingSurface::new(100.0, 100.0);
        scene.render_all(&mut surface);
        assert_eq!(fill_ops(&surface.take()), vec!["rect", "circle"]);

        // Reversed registration draws the ball first
        let mut reversed = Scene::new();
        reversed.add(role);
        reversed.add(Rc::new(RefCell::new(Ground::new(0.0, 80.0, 100.0, 20.0))));
        reversed.render_all(&mut surface);
        assert_eq!(fill_ops(&surface.take()), vec!["circle", "rect"]);
    }

    #[test]
    fn test_same_entity_added_once() {
        let role: EntityHandle = Rc::new(RefCell::new(Role::new(5.0, 5.0, 5.0)));
        let mut scene = Scene::new();

        assert!(scene.add(role.clone()));
        assert!(!scene.add(role.clone()));
        assert_eq!(scene.len(), 1);
        assert!(scene.contains(&role));

        let mut surface = RecordingSurface::new(10.0, 10.0);
        scene.render_all(&mut surface);
        assert_eq!(fill_ops(&surface.take()), vec!["circle"]);
    }

    #[test]
    fn test_equal_values_are_distinct_entities() {
        let mut scene = Scene::new();
        assert!(scene.add(Rc::new(RefCell::new(Role::new(5.0, 5.0, 5.0)))));
        assert!(scene.add(Rc::new(RefCell::new(Role::new(5.0, 5.0, 5.0)))));
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_render_sees_current_state() {
        let role = Rc::new(RefCell::new(Role::new(5.0, 5.0, 5.0)));
        let mut scene = Scene::new();
        scene.add(role.clone());

        role.borrow_mut().pos.x = 42.0;

        let mut surface = RecordingSurface::new(100.0, 100.0);
        scene.render_all(&mut surface);
        assert!(surface.take().contains(&DrawCommand::FillCircle {
            cx: 42.0,
            cy: 5.0,
            radius: 5.0
        }));
    }

    #[test]
    fn test_empty_scene_draws_nothing() {
        let scene = Scene::new();
        assert!(scene.is_empty());
        let mut surface = RecordingSurface::new(10.0, 10.0);
        scene.render_all(&mut surface);
        assert!(surface.commands().is_empty());
    }
}
