//! Grouped reductions with first-seen group order.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::AddAssign;

/// Built-in reductions over a group's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Number of observations.
    Count,
    /// Sum of observations.
    Sum,
    /// Arithmetic mean of observations.
    Mean,
}

/// Running total for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<K, T> {
    pub key: K,
    pub sum: T,
    pub count: u64,
}

impl<K> Group<K, f64> {
    /// Value of `op` for this group. `Mean` of an empty group is `None`.
    pub fn reduce(&self, op: ReduceOp) -> Option<f64> {
        match op {
            ReduceOp::Count => Some(self.count as f64),
            ReduceOp::Sum => Some(self.sum),
            ReduceOp::Mean => (self.count > 0).then(|| self.sum / self.count as f64),
        }
    }
}

/// Accumulates `(key, value)` observations into per-key totals.
///
/// Groups are kept in the order their key was first seen, so a stable sort over
/// [`Self::into_groups`] breaks ties by first appearance.
#[derive(Debug, Clone)]
pub struct GroupedReducer<K, T> {
    positions: HashMap<K, usize>,
    groups: Vec<Group<K, T>>,
}

impl<K, T> Default for GroupedReducer<K, T> {
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<K, T> GroupedReducer<K, T>
where
    K: Hash + Eq + Clone,
    T: Copy + Default + AddAssign,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation to `key`'s group.
    pub fn push(&mut self, key: K, value: T) {
        let idx = match self.positions.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.positions.insert(key.clone(), idx);
                self.groups.push(Group {
                    key,
                    sum: T::default(),
                    count: 0,
                });
                idx
            }
        };
        let group = &mut self.groups[idx];
        group.sum += value;
        group.count += 1;
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in first-seen order.
    pub fn into_groups(self) -> Vec<Group<K, T>> {
        self.groups
    }
}

/// Arithmetic mean, or `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_u64), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Stable descending sort by `value`, truncated to `n` items.
pub fn top_n<T, F>(mut items: Vec<T>, n: usize, value: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| value(b).total_cmp(&value(a)));
    items.truncate(n);
    items
}

/// Stable ascending sort by `value`, truncated to `n` items.
pub fn bottom_n<T, F>(mut items: Vec<T>, n: usize, value: F) -> Vec<T>
where
    F: Fn(&T) -> u64,
{
    items.sort_by_key(|item| value(item));
    items.truncate(n);
    items
}
