//! Sorted sets of disjoint integer ranges.
//!
//! Token types and code points are stored as inclusive `[a, b]` intervals. The
//! interval list is always sorted ascending and no two stored intervals overlap
//! or touch; `add` merges as it inserts.

use std::fmt;
use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::token::{Vocabulary, EOF, EPSILON};

/// The set of all 21-bit code points, frozen.
pub static COMPLETE_CHAR_SET: Lazy<IntervalSet> =
    Lazy::new(|| IntervalSet::of_range(0, 0x10FFFF).frozen());

/// The frozen empty set.
pub static EMPTY_SET: Lazy<IntervalSet> = Lazy::new(|| IntervalSet::new().frozen());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntervalSetError {
    #[error("can't alter a read-only interval set")]
    ReadOnly,
    #[error("can't unfreeze a read-only interval set")]
    Unfreeze,
}

/// An inclusive range `[a, b]`. Empty when `b < a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub a: i32,
    pub b: i32,
}

impl Interval {
    pub const INVALID: Interval = Interval { a: -1, b: -2 };

    pub const fn new(a: i32, b: i32) -> Self {
        Interval { a, b }
    }

    /// Number of elements covered.
    pub fn len(&self) -> usize {
        if self.b < self.a {
            0
        } else {
            (i64::from(self.b) - i64::from(self.a) + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.b < self.a
    }

    pub fn contains(&self, v: i32) -> bool {
        self.a <= v && v <= self.b
    }

    /// True when the two ranges touch without overlapping.
    pub fn adjacent(&self, other: &Interval) -> bool {
        i64::from(self.a) == i64::from(other.b) + 1 || i64::from(self.b) + 1 == i64::from(other.a)
    }

    pub fn disjoint(&self, other: &Interval) -> bool {
        self.b < other.a || self.a > other.b
    }

    pub fn union(&self, other: &Interval) -> Interval {
        Interval::new(self.a.min(other.a), self.b.max(other.b))
    }

    pub fn intersection(&self, other: &Interval) -> Interval {
        Interval::new(self.a.max(other.a), self.b.min(other.b))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.a, self.b)
    }
}

/// A mutable set of integers stored as sorted, disjoint, non-adjacent intervals.
///
/// Equality and hashing only look at the stored intervals; the read-only flag
/// is not part of a set's identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
    #[serde(skip)]
    read_only: bool,
}

impl PartialEq for IntervalSet {
    fn eq(&self, other: &Self) -> bool {
        self.intervals == other.intervals
    }
}

impl Eq for IntervalSet {}

impl Hash for IntervalSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.intervals.hash(state);
    }
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(v: i32) -> Self {
        Self::of_range(v, v)
    }

    pub fn of_range(a: i32, b: i32) -> Self {
        let mut set = Self::new();
        set.insert(Interval::new(a, b));
        set
    }

    pub fn from_values<I: IntoIterator<Item = i32>>(values: I) -> Self {
        let mut set = Self::new();
        for v in values {
            set.insert(Interval::new(v, v));
        }
        set
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Freeze (or keep unfrozen) this set. A frozen set cannot be thawed.
    pub fn set_read_only(&mut self, read_only: bool) -> Result<(), IntervalSetError> {
        if self.read_only && !read_only {
            return Err(IntervalSetError::Unfreeze);
        }
        self.read_only = read_only;
        Ok(())
    }

    /// Consume and return the set frozen.
    pub fn frozen(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn check_writable(&self) -> Result<(), IntervalSetError> {
        if self.read_only {
            Err(IntervalSetError::ReadOnly)
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) -> Result<(), IntervalSetError> {
        self.check_writable()?;
        self.intervals.clear();
        Ok(())
    }

    pub fn add_one(&mut self, v: i32) -> Result<(), IntervalSetError> {
        self.add(Interval::new(v, v))
    }

    pub fn add_range(&mut self, a: i32, b: i32) -> Result<(), IntervalSetError> {
        self.add(Interval::new(a, b))
    }

    /// Add an interval, merging it with any stored interval it overlaps or touches.
    pub fn add(&mut self, addition: Interval) -> Result<(), IntervalSetError> {
        self.check_writable()?;
        self.insert(addition);
        Ok(())
    }

    pub fn add_all(&mut self, other: &IntervalSet) -> Result<(), IntervalSetError> {
        self.check_writable()?;
        for interval in &other.intervals {
            self.insert(*interval);
        }
        Ok(())
    }

    /// Merging insert without the read-only check, for sets built in-crate.
    pub(crate) fn insert(&mut self, addition: Interval) {
        if addition.is_empty() {
            return;
        }
        let mut i = 0;
        while i < self.intervals.len()
            && i64::from(self.intervals[i].b) + 1 < i64::from(addition.a)
        {
            i += 1;
        }
        let first = i;
        let mut merged = addition;
        while i < self.intervals.len()
            && i64::from(self.intervals[i].a) <= i64::from(merged.b) + 1
        {
            merged = merged.union(&self.intervals[i]);
            i += 1;
        }
        self.intervals.splice(first..i, std::iter::once(merged));
    }

    pub(crate) fn insert_all(&mut self, other: &IntervalSet) {
        for interval in &other.intervals {
            self.insert(*interval);
        }
    }

    /// Remove a single element, shrinking or splitting the interval holding it.
    pub fn remove(&mut self, el: i32) -> Result<(), IntervalSetError> {
        self.check_writable()?;
        self.delete(el);
        Ok(())
    }

    pub(crate) fn delete(&mut self, el: i32) {
        let Some(i) = self.index_of(el) else {
            return;
        };
        let Interval { a, b } = self.intervals[i];
        if a == b {
            self.intervals.remove(i);
        } else if el == a {
            self.intervals[i].a = a + 1;
        } else if el == b {
            self.intervals[i].b = b - 1;
        } else {
            self.intervals[i].b = el - 1;
            self.intervals.insert(i + 1, Interval::new(el + 1, b));
        }
    }

    fn index_of(&self, el: i32) -> Option<usize> {
        self.intervals
            .binary_search_by(|iv| {
                if iv.b < el {
                    std::cmp::Ordering::Less
                } else if iv.a > el {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
    }

    pub fn contains(&self, el: i32) -> bool {
        self.index_of(el).is_some()
    }

    /// Elements of `self` that are not in `other`.
    pub fn subtract(&self, other: &IntervalSet) -> IntervalSet {
        let mut result = Vec::with_capacity(self.intervals.len());
        let mut j = 0;
        for &interval in &self.intervals {
            let mut current = interval;
            let mut alive = true;
            while j < other.intervals.len() && other.intervals[j].b < current.a {
                j += 1;
            }
            let mut k = j;
            while alive && k < other.intervals.len() && other.intervals[k].a <= current.b {
                let cut = other.intervals[k];
                if cut.a > current.a {
                    result.push(Interval::new(current.a, cut.a - 1));
                }
                if cut.b >= current.b {
                    alive = false;
                } else {
                    current.a = cut.b + 1;
                    k += 1;
                }
            }
            if alive {
                result.push(current);
            }
        }
        IntervalSet {
            intervals: result,
            read_only: false,
        }
    }

    /// Elements in `vocabulary` that are not in `self`.
    pub fn complement(&self, vocabulary: &IntervalSet) -> IntervalSet {
        vocabulary.subtract(self)
    }

    pub fn complement_range(&self, min: i32, max: i32) -> IntervalSet {
        self.complement(&IntervalSet::of_range(min, max))
    }

    /// Intersection.
    pub fn and(&self, other: &IntervalSet) -> IntervalSet {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.intervals.len() && j < other.intervals.len() {
            let mine = self.intervals[i];
            let theirs = other.intervals[j];
            let overlap = mine.intersection(&theirs);
            if !overlap.is_empty() {
                result.push(overlap);
            }
            if mine.b < theirs.b {
                i += 1;
            } else {
                j += 1;
            }
        }
        IntervalSet {
            intervals: result,
            read_only: false,
        }
    }

    /// Union.
    pub fn or(&self, other: &IntervalSet) -> IntervalSet {
        let mut result = IntervalSet {
            intervals: self.intervals.clone(),
            read_only: false,
        };
        result.insert_all(other);
        result
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_nil(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of elements (not intervals).
    pub fn size(&self) -> usize {
        self.intervals.iter().map(Interval::len).sum()
    }

    pub fn min_element(&self) -> Option<i32> {
        self.intervals.first().map(|iv| iv.a)
    }

    pub fn max_element(&self) -> Option<i32> {
        self.intervals.last().map(|iv| iv.b)
    }

    pub fn single_element(&self) -> Option<i32> {
        match self.intervals.as_slice() {
            [only] if only.a == only.b => Some(only.a),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.intervals.iter().flat_map(|iv| iv.a..=iv.b)
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }

    /// Render elements through a vocabulary, e.g. `{'+', INT, <EOF>}`.
    pub fn to_string_with(&self, vocabulary: &Vocabulary) -> String {
        if self.intervals.is_empty() {
            return "{}".to_string();
        }
        let names: Vec<String> = self
            .iter()
            .map(|t| match t {
                EOF => "<EOF>".to_string(),
                EPSILON => "<EPSILON>".to_string(),
                _ => vocabulary.display_name(t),
            })
            .collect();
        if self.size() > 1 {
            format!("{{{}}}", names.join(", "))
        } else {
            names.join(", ")
        }
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.intervals.is_empty() {
            return write!(f, "{{}}");
        }
        let parts: Vec<String> = self
            .intervals
            .iter()
            .map(|iv| {
                if iv.a == iv.b {
                    if iv.a == EOF {
                        "<EOF>".to_string()
                    } else {
                        iv.a.to_string()
                    }
                } else {
                    format!("{}..{}", iv.a, iv.b)
                }
            })
            .collect();
        if self.size() > 1 {
            write!(f, "{{{}}}", parts.join(", "))
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

impl FromIterator<i32> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        Self::from_values(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn set(ranges: &[(i32, i32)]) -> IntervalSet {
        let mut s = IntervalSet::new();
        for &(a, b) in ranges {
            s.add_range(a, b).unwrap();
        }
        s
    }

    fn assert_canonical(s: &IntervalSet) {
        for pair in s.intervals().windows(2) {
            assert!(
                i64::from(pair[0].b) + 1 < i64::from(pair[1].a),
                "intervals {} and {} overlap or touch",
                pair[0],
                pair[1]
            );
        }
        for iv in s.intervals() {
            assert!(iv.a <= iv.b);
        }
    }

    #[test]
    fn adjacent_ranges_merge() {
        let s = set(&[(1, 3), (4, 6)]);
        assert_eq!(s.intervals(), &[Interval::new(1, 6)]);
    }

    #[test]
    fn bridging_range_merges_neighbours() {
        let s = set(&[(1, 2), (10, 12), (20, 22), (3, 19)]);
        assert_eq!(s.intervals(), &[Interval::new(1, 22)]);
    }

    #[test]
    fn remove_splits_interval() {
        let mut s = set(&[(1, 5)]);
        s.remove(3).unwrap();
        assert_eq!(s.intervals(), &[Interval::new(1, 2), Interval::new(4, 5)]);
        s.remove(1).unwrap();
        s.remove(5).unwrap();
        assert_eq!(s.intervals(), &[Interval::new(2, 2), Interval::new(4, 4)]);
    }

    #[rstest]
    #[case(&[(1, 10)], &[(3, 4)], &[(1, 2), (5, 10)])]
    #[case(&[(1, 10)], &[(0, 20)], &[])]
    #[case(&[(1, 3), (7, 9)], &[(2, 8)], &[(1, 1), (9, 9)])]
    #[case(&[(1, 3)], &[(5, 6)], &[(1, 3)])]
    fn subtract_cases(
        #[case] left: &[(i32, i32)],
        #[case] right: &[(i32, i32)],
        #[case] expected: &[(i32, i32)],
    ) {
        let result = set(left).subtract(&set(right));
        assert_eq!(result, set(expected));
    }

    #[test]
    fn and_or_complement() {
        let a = set(&[(1, 5), (10, 15)]);
        let b = set(&[(4, 11)]);
        assert_eq!(a.and(&b), set(&[(4, 5), (10, 11)]));
        assert_eq!(a.or(&b), set(&[(1, 15)]));
        assert_eq!(b.complement_range(1, 20), set(&[(1, 3), (12, 20)]));
    }

    #[test]
    fn frozen_set_rejects_mutation() {
        let mut s = set(&[(1, 2)]);
        s.set_read_only(true).unwrap();
        assert_eq!(s.add_one(7), Err(IntervalSetError::ReadOnly));
        assert_eq!(s.remove(1), Err(IntervalSetError::ReadOnly));
        assert_eq!(s.set_read_only(false), Err(IntervalSetError::Unfreeze));
        assert!(EMPTY_SET.is_read_only());
    }

    #[test]
    fn equality_ignores_read_only_flag() {
        let mut a = set(&[(1, 2)]);
        let b = set(&[(1, 2)]);
        a.set_read_only(true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn display_forms() {
        assert_eq!(set(&[]).to_string(), "{}");
        assert_eq!(set(&[(3, 3)]).to_string(), "3");
        assert_eq!(set(&[(-1, -1), (1, 4)]).to_string(), "{<EOF>, 1..4}");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(i32, i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-2i32..60, 0i32..8).prop_map(|(a, len)| Op::Add(a, a + len)),
            (-2i32..70).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn matches_brute_force_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut s = IntervalSet::new();
            let mut model = BTreeSet::new();
            for op in &ops {
                match *op {
                    Op::Add(a, b) => {
                        s.add_range(a, b).unwrap();
                        model.extend(a..=b);
                    }
                    Op::Remove(v) => {
                        s.remove(v).unwrap();
                        model.remove(&v);
                    }
                }
                assert_canonical(&s);
            }
            for v in -4..80 {
                prop_assert_eq!(s.contains(v), model.contains(&v), "membership of {}", v);
            }
            prop_assert_eq!(s.size(), model.len());
        }

        #[test]
        fn subtract_and_intersect_agree_with_model(
            left in prop::collection::vec((0i32..50, 0i32..6), 0..8),
            right in prop::collection::vec((0i32..50, 0i32..6), 0..8),
        ) {
            let a: IntervalSet = left.iter().flat_map(|&(x, l)| x..=x + l).collect();
            let b: IntervalSet = right.iter().flat_map(|&(x, l)| x..=x + l).collect();
            let diff = a.subtract(&b);
            let both = a.and(&b);
            assert_canonical(&diff);
            assert_canonical(&both);
            for v in 0..60 {
                prop_assert_eq!(diff.contains(v), a.contains(v) && !b.contains(v));
                prop_assert_eq!(both.contains(v), a.contains(v) && b.contains(v));
            }
        }
    }
}
