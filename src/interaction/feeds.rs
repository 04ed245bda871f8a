use std::collections::HashSet;

use crate::drawing::DrawingId;

/// Host pointer feeds a drawing may listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    MouseDown,
    MouseUp,
}

/// Subscribe/unsubscribe capability handed to the state machine.
///
/// Both operations must be idempotent: transitions clean up redundantly.
pub trait EventFeeds {
    fn subscribe(&mut self, feed: Feed, drawing: DrawingId);

    fn unsubscribe(&mut self, feed: Feed, drawing: DrawingId);
}

/// Which drawings currently listen to which feed
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    entries: HashSet<(Feed, DrawingId)>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self, feed: Feed, drawing: DrawingId) -> bool {
        self.entries.contains(&(feed, drawing))
    }

    /// Drop every subscription of one drawing
    pub fn remove_drawing(&mut self, drawing: DrawingId) {
        self.entries.retain(|(_, id)| *id != drawing);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl EventFeeds for Subscriptions {
    fn subscribe(&mut self, feed: Feed, drawing: DrawingId) {
        self.entries.insert((feed, drawing));
    }

    fn unsubscribe(&mut self, feed: Feed, drawing: DrawingId) {
        self.entries.remove(&(feed, drawing));
    }
}
