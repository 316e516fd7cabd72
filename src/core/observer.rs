/// Outbound notifications from playback.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use crate::schema::story::SceneId;

/// Receives fire-and-forget notifications from a `Playback`.
pub trait PlaybackObserver {
    /// A scene finished settling and its first text is starting.
    fn scene_changed(&mut self, _scene: &SceneId) {}

    /// An ending scene's final text completed.
    fn story_ended(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    SceneChanged { scene: SceneId },
    StoryEnded,
}

/// An observer that queues notifications for later polling.
///
/// Clones share the same queue: hand one clone to the playback builder and
/// keep another to drain.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    inner: Rc<RefCell<Vec<Notification>>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl PlaybackObserver for NotificationQueue {
    fn scene_changed(&mut self, scene: &SceneId) {
        self.inner.borrow_mut().push(Notification::SceneChanged {
            scene: scene.clone(),
        });
    }

    fn story_ended(&mut self) {
        self.inner.borrow_mut().push(Notification::StoryEnded);
    }
}
