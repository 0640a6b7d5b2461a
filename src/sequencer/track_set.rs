use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use super::pattern::Pattern;

// The patterns one transport drives. Clones share the same list, so the
// front-end and the scheduler thread can each hold one.
#[derive(Clone, Debug, Default)]
pub struct TrackSet {
    tracks: Arc<RwLock<Vec<Arc<Pattern>>>>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    // appends; adding the same pattern twice gives it two slots
    pub fn add(&self, pattern: Arc<Pattern>) {
        self.tracks.write().push(pattern);
    }

    // drops the first slot holding this exact pattern, if any
    pub fn remove(&self, pattern: &Arc<Pattern>) -> bool {
        let mut tracks = self.tracks.write();
        match tracks.iter().position(|p| Arc::ptr_eq(p, pattern)) {
            Some(index) => {
                tracks.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.read().is_empty()
    }

    // owned copy of the list, in insertion order
    pub fn snapshot(&self) -> Vec<Arc<Pattern>> {
        self.tracks.read().clone()
    }

    // held for one scheduler pass; membership edits wait until it's done
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Pattern>>> {
        self.tracks.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::sample::Sample;

    fn pattern(name: &str) -> Arc<Pattern> {
        Arc::new(Pattern::new(Arc::new(Sample::new(name, 'x', format!("{name}.wav")))))
    }

    #[test]
    fn add_keeps_insertion_order_and_duplicates() {
        let set = TrackSet::new();
        let (a, b) = (pattern("a"), pattern("b"));
        set.add(Arc::clone(&a));
        set.add(Arc::clone(&b));
        set.add(Arc::clone(&a));

        let names: Vec<String> = set.snapshot().iter().map(|p| p.sample().name().to_string()).collect();
        assert_eq!(names, ["a", "b", "a"]);
    }

    #[test]
    fn remove_takes_first_match_only() {
        let set = TrackSet::new();
        let (a, b) = (pattern("a"), pattern("b"));
        set.add(Arc::clone(&a));
        set.add(Arc::clone(&b));
        set.add(Arc::clone(&a));

        assert!(set.remove(&a));
        let snap = set.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(Arc::ptr_eq(&snap[0], &b));
        assert!(Arc::ptr_eq(&snap[1], &a));
    }

    #[test]
    fn removing_absent_pattern_is_a_no_op() {
        let set = TrackSet::new();
        set.add(pattern("a"));
        // same name, different pattern
        assert!(!set.remove(&pattern("a")));
        assert_eq!(set.len(), 1);

        let empty = TrackSet::new();
        assert!(!empty.remove(&pattern("a")));
        assert!(empty.is_empty());
    }

    #[test]
    fn clones_share_membership() {
        let set = TrackSet::new();
        let other = set.clone();
        set.add(pattern("a"));
        assert_eq!(other.len(), 1);
    }
}
