use tracing::debug;

use crate::error::Result;
use crate::region::StudyRegion;
use crate::scene::Scene;
use crate::window::DateWindow;

/// Filter handed to a [`SceneStore`] for one window.
#[derive(Clone, Copy, Debug)]
pub struct SceneQuery<'a> {
    pub region: &'a StudyRegion,
    pub window: DateWindow,
    /// Scenes must report cloud cover strictly below this value.
    pub cloud_threshold: f64,
    /// Metadata property holding the scene's cloud-cover percentage.
    pub cloud_attribute: &'a str,
}

impl SceneQuery<'_> {
    /// Whether a scene passes the region, date, and cloud-cover filters.
    ///
    /// A scene without the cloud attribute never matches.
    pub fn matches(&self, scene: &Scene) -> bool {
        let clear_enough = match scene.property(self.cloud_attribute) {
            Some(cover) => cover < self.cloud_threshold,
            None => false,
        };
        clear_enough
            && self.window.contains(&scene.acquired)
            && self.region.intersects(&scene.footprint)
    }
}

/// A queryable scene archive.
///
/// Failures (unreachable store, unreadable scene) are returned to the
/// caller; the pipeline isolates them per window.
pub trait SceneStore: Send + Sync {
    fn query(&self, query: &SceneQuery<'_>) -> Result<Vec<Scene>>;
}

/// Scene store holding every scene in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    scenes: Vec<Scene>,
}

impl InMemoryStore {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }
}

impl SceneStore for InMemoryStore {
    fn query(&self, query: &SceneQuery<'_>) -> Result<Vec<Scene>> {
        let matched: Vec<Scene> = self
            .scenes
            .iter()
            .filter(|scene| query.matches(scene))
            .cloned()
            .collect();
        debug!(
            window = %query.window,
            matched = matched.len(),
            total = self.scenes.len(),
            "In-memory scene query"
        );
        Ok(matched)
    }
}
