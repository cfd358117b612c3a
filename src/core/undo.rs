use std::collections::VecDeque;

use crate::models::{Profile, SwipeDirection};

/// Default number of decisions kept for undo
pub const UNDO_CAPACITY: usize = 10;

/// A decided candidate that can be taken back
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub profile: Profile,
    pub direction: SwipeDirection,
}

/// Bounded drop-oldest ring of recent decisions
#[derive(Debug)]
pub struct UndoBuffer {
    entries: VecDeque<UndoEntry>,
    capacity: usize,
}

impl UndoBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, profile: Profile, direction: SwipeDirection) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(UndoEntry { profile, direction });
    }

    /// Most recent decision first
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for UndoBuffer {
    fn default() -> Self {
        Self::new(UNDO_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dog(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            owner_id: "o".to_string(),
            name: String::new(),
            age: 2,
            size: "SMALL".to_string(),
            energy_level: "LOW".to_string(),
            breed: "Pug".to_string(),
            location: None,
            photo_urls: vec![],
            bio: None,
        }
    }

    #[test]
    fn test_drops_oldest_at_capacity() {
        let mut buffer = UndoBuffer::new(3);
        for id in ["a", "b", "c", "d"] {
            buffer.push(dog(id), SwipeDirection::Like);
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.pop().unwrap().profile.id, "d");
        assert_eq!(buffer.pop().unwrap().profile.id, "c");
        assert_eq!(buffer.pop().unwrap().profile.id, "b");
        assert!(buffer.pop().is_none());
    }

    #[test]
    fn test_keeps_direction() {
        let mut buffer = UndoBuffer::default();
        buffer.push(dog("a"), SwipeDirection::SuperLike);
        assert_eq!(buffer.pop().unwrap().direction, SwipeDirection::SuperLike);
    }
}
