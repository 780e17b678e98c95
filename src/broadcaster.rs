use crate::shared::Shared;

/// A component that learns from each resolved bit.
pub trait Component {
    /// Adapt to the bit in `shared.cursor.y`. The cursor already includes
    /// that bit.
    fn update(&mut self, shared: &mut Shared);
}

/// Components that took part in predicting the current bit.
///
/// Subscribing takes the component's exclusive borrow for the lifetime of
/// the broadcaster, so a component cannot be subscribed twice, and nothing
/// can predict with it again until the broadcast has run.
pub struct UpdateBroadcaster<'a> {
    subscribers:  Vec<&'a mut dyn Component>,
    capacity:     usize,
}
impl<'a> UpdateBroadcaster<'a> {
    pub fn with_capacity(capacity: usize) -> UpdateBroadcaster<'a> {
        UpdateBroadcaster {
            subscribers:  Vec::with_capacity(capacity),
            capacity,
        }
    }
    pub fn subscribe(&mut self, component: &'a mut dyn Component) {
        assert!(self.subscribers.len() < self.capacity, "too many subscribers");
        self.subscribers.push(component);
    }
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
    /// Update every subscriber once.
    pub fn broadcast_update(self, shared: &mut Shared) {
        for component in self.subscribers {
            component.update(shared);
        }
    }
}

/// Result of the predict phase: the probability that the next bit is 1,
/// and the components to update once the bit is known.
pub struct Prediction<'a> {
    pub p:         i32,
    participants:  UpdateBroadcaster<'a>,
}
impl<'a> Prediction<'a> {
    pub fn new(p: i32, participants: UpdateBroadcaster<'a>) -> Prediction<'a> {
        debug_assert!((0..4096).contains(&p));
        Prediction { p, participants }
    }
    /// Commit phase. Call after pushing the resolved bit to the cursor.
    pub fn commit(self, shared: &mut Shared) {
        self.participants.broadcast_update(shared);
    }
}
