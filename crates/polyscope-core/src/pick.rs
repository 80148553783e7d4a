//! Pick index allocation.
//!
//! Every pickable structure owns a contiguous range of global pick indices.
//! The pick pass writes `range.start + local_index` into the pick buffer, and a
//! hit is mapped back to `(type_name, name, local_index)` through the allocator.
//! Index 0 is reserved for the background.

use std::collections::HashMap;

/// A contiguous block of global pick indices owned by one structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickRange {
    /// First global index of the range.
    pub start: u64,
    /// Number of indices in the range.
    pub count: u64,
}

impl PickRange {
    /// Returns true if `global` falls inside this range.
    #[must_use]
    pub fn contains(&self, global: u64) -> bool {
        global >= self.start && global < self.start + self.count
    }
}

/// Hands out disjoint pick index ranges for the lifetime of a session.
#[derive(Debug)]
pub struct PickAllocator {
    ranges: HashMap<(String, String), PickRange>,
    next_global_index: u64,
}

impl Default for PickAllocator {
    fn default() -> Self {
        Self {
            ranges: HashMap::new(),
            next_global_index: 1, // 0 is reserved for background
        }
    }
}

impl PickAllocator {
    /// Creates an allocator with no ranges handed out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a range of `count` indices for the given structure.
    ///
    /// A structure asking again for the same count keeps its existing range,
    /// so repeated pick preparation does not leak indices. A different count
    /// releases the old range and allocates a fresh one.
    pub fn request_range(&mut self, type_name: &str, name: &str, count: u64) -> u64 {
        let key = (type_name.to_string(), name.to_string());
        if let Some(existing) = self.ranges.get(&key) {
            if existing.count == count {
                return existing.start;
            }
        }

        let start = self.next_global_index;
        self.next_global_index += count;
        self.ranges.insert(key, PickRange { start, count });
        log::debug!("pick range [{start}, {}) assigned to {type_name} '{name}'", start + count);
        start
    }

    /// Returns the range currently owned by a structure.
    #[must_use]
    pub fn range(&self, type_name: &str, name: &str) -> Option<PickRange> {
        self.ranges
            .get(&(type_name.to_string(), name.to_string()))
            .copied()
    }

    /// Releases the range owned by a structure.
    pub fn release(&mut self, type_name: &str, name: &str) {
        self.ranges
            .remove(&(type_name.to_string(), name.to_string()));
    }

    /// Maps a global index to `(type_name, name, local_index)`.
    #[must_use]
    pub fn lookup(&self, global: u64) -> Option<(&str, &str, u64)> {
        self.ranges
            .iter()
            .find(|(_, range)| range.contains(global))
            .map(|((type_name, name), range)| {
                (type_name.as_str(), name.as_str(), global - range.start)
            })
    }

    /// Forgets every range. Indices are not reused after a reset.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_are_disjoint_and_skip_background() {
        let mut alloc = PickAllocator::new();
        let a = alloc.request_range("Cuboid Network", "a", 10);
        let b = alloc.request_range("Cuboid Network", "b", 5);

        assert_eq!(a, 1);
        assert_eq!(b, 11);
        assert_eq!(alloc.lookup(0), None);
        assert_eq!(alloc.lookup(1), Some(("Cuboid Network", "a", 0)));
        assert_eq!(alloc.lookup(10), Some(("Cuboid Network", "a", 9)));
        assert_eq!(alloc.lookup(11), Some(("Cuboid Network", "b", 0)));
        assert_eq!(alloc.lookup(16), None);
    }

    #[test]
    fn test_same_count_reuses_range() {
        let mut alloc = PickAllocator::new();
        let first = alloc.request_range("T", "x", 4);
        let second = alloc.request_range("T", "x", 4);
        assert_eq!(first, second);

        let resized = alloc.request_range("T", "x", 6);
        assert_ne!(resized, first);
        assert_eq!(alloc.range("T", "x"), Some(PickRange { start: resized, count: 6 }));
    }

    #[test]
    fn test_release() {
        let mut alloc = PickAllocator::new();
        let start = alloc.request_range("T", "x", 3);
        alloc.release("T", "x");
        assert_eq!(alloc.lookup(start), None);
        assert!(alloc.range("T", "x").is_none());
    }
}
