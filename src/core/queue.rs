use std::collections::{HashSet, VecDeque};

use crate::core::filters::passes_filter;
use crate::core::ports::LocationProvider;
use crate::models::{Coordinates, FilterState, Profile};

/// Default queue bound: one full batch on top of the low-water mark
pub const DEFAULT_QUEUE_CAPACITY: usize = 25;

/// Ordered, bounded buffer of undecided candidates plus the session dedup cache
///
/// Every profile id that has ever been enqueued this session stays in the
/// dedup cache until [`ProfileQueue::clear`], so nothing is offered twice.
/// Candidates arriving while the queue is full are dropped without being
/// marked seen, so a later batch can offer them again.
#[derive(Debug)]
pub struct ProfileQueue {
    items: VecDeque<Profile>,
    seen: HashSet<String>,
    capacity: usize,
}

impl Default for ProfileQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl ProfileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY)),
            seen: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Filter, deduplicate and append a batch of candidates
    ///
    /// # Arguments
    /// * `candidates` - Raw batch from the profile source
    /// * `filter` - Current user filters
    /// * `origin` - The user's last known position, if any
    /// * `locator` - Computes distances when both positions are known
    ///
    /// # Returns
    /// Number of profiles appended
    pub fn enqueue(
        &mut self,
        candidates: Vec<Profile>,
        filter: &FilterState,
        origin: Option<Coordinates>,
        locator: &dyn LocationProvider,
    ) -> usize {
        let mut appended = 0;

        for profile in candidates {
            if self.items.len() >= self.capacity {
                break;
            }
            if self.seen.contains(&profile.id) {
                continue;
            }

            let distance_km = match (origin, profile.location) {
                (Some(from), Some(to)) => Some(locator.distance_km(from, to)),
                _ => None,
            };

            if !passes_filter(&profile, filter, distance_km) {
                continue;
            }

            self.seen.insert(profile.id.clone());
            self.items.push_back(profile);
            appended += 1;
        }

        appended
    }

    /// Remove and return the head
    pub fn dequeue_next(&mut self) -> Option<Profile> {
        self.items.pop_front()
    }

    /// Put an already vetted profile back at the head, ignoring the bound
    pub fn push_front(&mut self, profile: Profile) {
        self.seen.insert(profile.id.clone());
        self.items.push_front(profile);
    }

    /// Record an id as seen without enqueuing it
    pub fn mark_seen(&mut self, id: impl Into<String>) {
        self.seen.insert(id.into());
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn peek(&self) -> Option<&Profile> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all queued profiles and forget everything seen
    pub fn clear(&mut self) {
        self.items.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::EngineError;

    struct FixedDistance(f64);

    #[async_trait]
    impl LocationProvider for FixedDistance {
        async fn last_known_location(&self) -> Result<Option<Coordinates>, EngineError> {
            Ok(None)
        }

        fn distance_km(&self, _a: Coordinates, _b: Coordinates) -> f64 {
            self.0
        }
    }

    fn create_candidate(id: &str, age: u8) -> Profile {
        Profile {
            id: id.to_string(),
            owner_id: format!("owner-{}", id),
            name: format!("Dog {}", id),
            age,
            size: "MEDIUM".to_string(),
            energy_level: "HIGH".to_string(),
            breed: "Collie".to_string(),
            location: Some(Coordinates::new(52.52, 13.40)),
            photo_urls: vec![],
            bio: None,
        }
    }

    fn origin() -> Option<Coordinates> {
        Some(Coordinates::new(52.50, 13.40))
    }

    #[test]
    fn test_enqueue_filters_and_dedups() {
        let mut queue = ProfileQueue::new();
        let mut filter = FilterState::permissive();
        filter.max_age = 10;

        let batch = vec![
            create_candidate("1", 3),
            create_candidate("2", 12), // Too old
            create_candidate("1", 3),  // Duplicate within batch
            create_candidate("3", 5),
        ];

        let added = queue.enqueue(batch, &filter, origin(), &FixedDistance(1.0));
        assert_eq!(added, 2);
        assert_eq!(queue.len(), 2);

        // Already seen ids are not added again
        let again = queue.enqueue(vec![create_candidate("3", 5)], &filter, origin(), &FixedDistance(1.0));
        assert_eq!(again, 0);
    }

    #[test]
    fn test_rejected_candidates_are_not_marked_seen() {
        let mut queue = ProfileQueue::new();
        let filter = FilterState::permissive();

        let added = queue.enqueue(vec![create_candidate("far", 3)], &filter, origin(), &FixedDistance(500.0));
        assert_eq!(added, 0);
        assert!(!queue.has_seen("far"));
    }

    #[test]
    fn test_unknown_origin_skips_distance() {
        let mut queue = ProfileQueue::new();
        let filter = FilterState::permissive();

        let added = queue.enqueue(vec![create_candidate("1", 3)], &filter, None, &FixedDistance(500.0));
        assert_eq!(added, 1);
    }

    #[test]
    fn test_push_front_restores_head() {
        let mut queue = ProfileQueue::new();
        let filter = FilterState::permissive();
        queue.enqueue(
            vec![create_candidate("1", 3), create_candidate("2", 3)],
            &filter,
            None,
            &FixedDistance(0.0),
        );

        let head = queue.dequeue_next().unwrap();
        assert_eq!(head.id, "1");
        queue.push_front(head);
        assert_eq!(queue.peek().map(|p| p.id.as_str()), Some("1"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_clear_forgets_seen() {
        let mut queue = ProfileQueue::new();
        let filter = FilterState::permissive();
        queue.enqueue(vec![create_candidate("1", 3)], &filter, None, &FixedDistance(0.0));
        queue.mark_seen("self");

        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.has_seen("1"));
        assert!(!queue.has_seen("self"));
    }

    #[test]
    fn test_enqueue_stops_at_capacity() {
        let mut queue = ProfileQueue::with_capacity(2);
        let filter = FilterState::permissive();

        let batch = vec![
            create_candidate("1", 3),
            create_candidate("2", 3),
            create_candidate("3", 3),
        ];
        let added = queue.enqueue(batch, &filter, None, &FixedDistance(0.0));

        assert_eq!(added, 2);
        assert_eq!(queue.len(), 2);
        // Overflow is not remembered, so it can be offered again later
        assert!(!queue.has_seen("3"));

        queue.dequeue_next();
        let added = queue.enqueue(vec![create_candidate("3", 3)], &filter, None, &FixedDistance(0.0));
        assert_eq!(added, 1);
    }
}
