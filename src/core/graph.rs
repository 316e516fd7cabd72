/// Story graph: loading, integrity validation, lookup, and authoring lint.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::schema::story::{ChoiceId, Scene, SceneId, Story};

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("start scene '{0}' does not exist")]
    UnknownStartScene(SceneId),
    #[error("choice '{choice}' in scene '{scene}' targets missing scene '{target}'")]
    DanglingChoice {
        scene: SceneId,
        choice: ChoiceId,
        target: SceneId,
    },
    #[error("scene '{0}' is declared more than once")]
    DuplicateScene(SceneId),
    #[error("scene '{scene}' declares choice '{choice}' more than once")]
    DuplicateChoice { scene: SceneId, choice: ChoiceId },
    #[error("scene '{scene}' declares text '{text}' more than once")]
    DuplicateText { scene: SceneId, text: String },
    #[error("scene '{0}' has no text blocks")]
    EmptyScene(SceneId),
    #[error("scene not found: {0}")]
    SceneNotFound(SceneId),
}

/// Authoring problems that do not stop a story from loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryWarning {
    /// No choices and not marked as an ending: playback would idle forever.
    DeadEnd(SceneId),
    /// Not reachable from the start scene through any chain of choices.
    Unreachable(SceneId),
    /// Marked as an ending but still offers choices, so the ending never fires.
    EndingWithChoices(SceneId),
    /// A choice carries a condition, which playback does not evaluate.
    ConditionIgnored { scene: SceneId, choice: ChoiceId },
}

impl fmt::Display for StoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadEnd(id) => write!(
                f,
                "Scene '{}' has no choices and is not an ending (dead end)",
                id
            ),
            Self::Unreachable(id) => {
                write!(f, "Scene '{}' is unreachable from the start scene", id)
            }
            Self::EndingWithChoices(id) => write!(
                f,
                "Scene '{}' is an ending but offers choices; the ending will never fire",
                id
            ),
            Self::ConditionIgnored { scene, choice } => write!(
                f,
                "Choice '{}' in scene '{}' has a condition, which is not evaluated",
                choice, scene
            ),
        }
    }
}

/// A validated, read-only story graph.
///
/// Construction is the only place integrity is checked: once a
/// `StoryGraph` exists, every choice target and the start scene resolve.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    id: String,
    title: String,
    description: String,
    start_scene: SceneId,
    scenes: FxHashMap<SceneId, Scene>,
    order: Vec<SceneId>,
}

impl StoryGraph {
    /// Load and validate a story from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<StoryGraph, StoryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a story from a RON string.
    pub fn parse_ron(input: &str) -> Result<StoryGraph, StoryError> {
        let story: Story = ron::from_str(input)?;
        Self::from_story(story)
    }

    /// Validate an already-parsed story.
    pub fn from_story(story: Story) -> Result<StoryGraph, StoryError> {
        let mut scenes = FxHashMap::default();
        let mut order = Vec::with_capacity(story.scenes.len());

        for scene in story.scenes {
            if scene.texts.is_empty() {
                return Err(StoryError::EmptyScene(scene.id));
            }

            let mut text_ids = FxHashSet::default();
            for text in &scene.texts {
                if !text_ids.insert(text.id.as_str()) {
                    return Err(StoryError::DuplicateText {
                        scene: scene.id.clone(),
                        text: text.id.clone(),
                    });
                }
            }

            let mut choice_ids = FxHashSet::default();
            for choice in &scene.choices {
                if !choice_ids.insert(&choice.id) {
                    return Err(StoryError::DuplicateChoice {
                        scene: scene.id.clone(),
                        choice: choice.id.clone(),
                    });
                }
            }

            if scenes.contains_key(&scene.id) {
                return Err(StoryError::DuplicateScene(scene.id));
            }
            order.push(scene.id.clone());
            scenes.insert(scene.id.clone(), scene);
        }

        if !scenes.contains_key(&story.start_scene) {
            return Err(StoryError::UnknownStartScene(story.start_scene));
        }

        // Check edges in declaration order so the first reported error is stable
        for id in &order {
            let scene = &scenes[id];
            for choice in &scene.choices {
                if !scenes.contains_key(&choice.target) {
                    return Err(StoryError::DanglingChoice {
                        scene: scene.id.clone(),
                        choice: choice.id.clone(),
                        target: choice.target.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            story = %story.id,
            scenes = order.len(),
            start = %story.start_scene,
            "story graph validated"
        );

        Ok(StoryGraph {
            id: story.id,
            title: story.title,
            description: story.description,
            start_scene: story.start_scene,
            scenes,
            order,
        })
    }

    /// Look up a scene by id.
    pub fn resolve_scene(&self, id: &SceneId) -> Result<&Scene, StoryError> {
        self.scenes
            .get(id)
            .ok_or_else(|| StoryError::SceneNotFound(id.clone()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start_scene(&self) -> &SceneId {
        &self.start_scene
    }

    pub fn scene_count(&self) -> usize {
        self.order.len()
    }

    /// Scenes in declaration order.
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.order.iter().map(move |id| &self.scenes[id])
    }

    /// Every scene reachable from the start scene, the start scene included.
    pub fn reachable_from_start(&self) -> FxHashSet<SceneId> {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(self.start_scene.clone());
        queue.push_back(&self.start_scene);

        while let Some(id) = queue.pop_front() {
            for choice in &self.scenes[id].choices {
                if seen.insert(choice.target.clone()) {
                    queue.push_back(&choice.target);
                }
            }
        }
        seen
    }

    /// Authoring-time checks the runtime deliberately does not enforce.
    pub fn lint(&self) -> Vec<StoryWarning> {
        let reachable = self.reachable_from_start();
        let mut warnings = Vec::new();

        for scene in self.scenes() {
            if scene.is_dead_end() {
                warnings.push(StoryWarning::DeadEnd(scene.id.clone()));
            }
            if scene.is_ending && !scene.choices.is_empty() {
                warnings.push(StoryWarning::EndingWithChoices(scene.id.clone()));
            }
            if !reachable.contains(&scene.id) {
                warnings.push(StoryWarning::Unreachable(scene.id.clone()));
            }
            for choice in &scene.choices {
                if choice.condition.is_some() {
                    warnings.push(StoryWarning::ConditionIgnored {
                        scene: scene.id.clone(),
                        choice: choice.id.clone(),
                    });
                }
            }
        }
        warnings
    }
}
