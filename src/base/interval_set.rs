//! Sorted, non-overlapping sets of integer ranges.
//!
//! Used for token-type sets on automaton transitions and for follow sets.
//! Adjacent and overlapping ranges are merged on insertion, so two sets with
//! the same members always have the same interval representation.

use std::fmt;

/// A closed range `[start, end]` of integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub start: i32,
    pub end: i32,
}

impl Interval {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, value: i32) -> bool {
        self.start <= value && value <= self.end
    }

    /// Number of members in this interval
    pub fn len(&self) -> usize {
        (i64::from(self.end) - i64::from(self.start) + 1) as usize
    }
}

/// A set of integers stored as sorted, merged intervals.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set containing a single value.
    pub fn of(value: i32) -> Self {
        Self::of_range(value, value)
    }

    /// A set containing `start..=end` (empty if `start > end`).
    pub fn of_range(start: i32, end: i32) -> Self {
        let mut set = Self::new();
        set.add_range(start, end);
        set
    }

    pub fn add(&mut self, value: i32) {
        self.add_range(value, value);
    }

    /// Add `start..=end`, merging with any overlapping or adjacent interval.
    pub fn add_range(&mut self, start: i32, end: i32) {
        if start > end {
            return;
        }
        let mut merged = Interval::new(start, end);

        // First interval whose end touches or passes the new start
        let i = self
            .intervals
            .partition_point(|iv| i64::from(iv.end) + 1 < i64::from(merged.start));

        while i < self.intervals.len()
            && i64::from(self.intervals[i].start) <= i64::from(merged.end) + 1
        {
            let absorbed = self.intervals.remove(i);
            merged.start = merged.start.min(absorbed.start);
            merged.end = merged.end.max(absorbed.end);
        }

        self.intervals.insert(i, merged);
    }

    /// Union `other` into this set.
    pub fn add_all(&mut self, other: &IntervalSet) {
        for iv in &other.intervals {
            self.add_range(iv.start, iv.end);
        }
    }

    pub fn contains(&self, value: i32) -> bool {
        let i = self.intervals.partition_point(|iv| iv.end < value);
        self.intervals.get(i).is_some_and(|iv| iv.contains(value))
    }

    /// All values in `min..=max` that are not in this set.
    pub fn complement(&self, min: i32, max: i32) -> IntervalSet {
        let mut result = IntervalSet::new();
        let mut cursor = i64::from(min);
        let max = i64::from(max);

        for iv in &self.intervals {
            if i64::from(iv.end) < cursor {
                continue;
            }
            if i64::from(iv.start) > max {
                break;
            }
            if i64::from(iv.start) > cursor {
                result.add_range(cursor as i32, iv.start - 1);
            }
            cursor = i64::from(iv.end) + 1;
        }
        if cursor <= max {
            result.add_range(cursor as i32, max as i32);
        }

        result
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of members (not intervals).
    pub fn len(&self) -> usize {
        self.intervals.iter().map(Interval::len).sum()
    }

    /// The only member, if the set has exactly one.
    pub fn single(&self) -> Option<i32> {
        match self.intervals.as_slice() {
            [iv] if iv.start == iv.end => Some(iv.start),
            _ => None,
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Iterate over all members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.intervals.iter().flat_map(|iv| iv.start..=iv.end)
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }
}

impl FromIterator<i32> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut set = IntervalSet::new();
        for value in iter {
            set.add(value);
        }
        set
    }
}

impl fmt::Debug for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, iv) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if iv.start == iv.end {
                write!(f, "{}", iv.start)?;
            } else {
                write!(f, "{}..{}", iv.start, iv.end)?;
            }
        }
        write!(f, "}}")
    }
}
