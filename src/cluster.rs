//! # Clusters
//!
//! A cluster groups the records that upstream matching judged to describe the same
//! entity. Cluster identifiers come from a generator owned by the caller, so ids are
//! reproducible across runs and independent between pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A group of same-entity records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster<C, T> {
    pub id: C,
    pub elements: Vec<T>,
}

impl<C, T> Cluster<C, T> {
    pub fn new(id: C) -> Self {
        Self {
            id,
            elements: Vec::new(),
        }
    }

    pub fn with_elements(id: C, elements: Vec<T>) -> Self {
        Self { id, elements }
    }

    pub fn add(&mut self, record: T) {
        self.elements.push(record);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn contains(&self, record: &T) -> bool
    where
        T: PartialEq,
    {
        self.elements.contains(record)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// Combine two clusters under a freshly generated id.
    ///
    /// Clusters with the same id are the same cluster; merging them returns `self`
    /// unchanged.
    pub fn merge<G>(self, ids: &mut G, other: Cluster<C, T>) -> Cluster<C, T>
    where
        C: PartialEq,
        G: ClusterIdGenerator<C, T>,
    {
        if self.id == other.id {
            return self;
        }
        let mut elements = self.elements;
        elements.extend(other.elements);
        let id = ids.next_id(&elements);
        Cluster { id, elements }
    }
}

impl<'a, C, T> IntoIterator for &'a Cluster<C, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<C: fmt::Display, T> fmt::Display for Cluster<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{} ({} records)", self.id, self.elements.len())
    }
}

/// Produces the id of a new or merged cluster from its elements
pub trait ClusterIdGenerator<C, T> {
    fn next_id(&mut self, elements: &[T]) -> C;
}

impl<C, T, F> ClusterIdGenerator<C, T> for F
where
    F: FnMut(&[T]) -> C,
{
    fn next_id(&mut self, elements: &[T]) -> C {
        self(elements)
    }
}

/// Counter-based ids, starting at zero
#[derive(Debug, Clone, Default)]
pub struct SequentialIds<C> {
    next: C,
}

impl<C> SequentialIds<C> {
    pub fn starting_at(next: C) -> Self {
        Self { next }
    }
}

macro_rules! sequential_ids {
    ($($ty:ty),*) => {
        $(
            impl SequentialIds<$ty> {
                /// Take the next id without looking at any elements
                pub fn allocate(&mut self) -> $ty {
                    let id = self.next;
                    self.next += 1;
                    id
                }
            }

            impl<T> ClusterIdGenerator<$ty, T> for SequentialIds<$ty> {
                fn next_id(&mut self, _elements: &[T]) -> $ty {
                    self.allocate()
                }
            }
        )*
    };
}

sequential_ids!(u32, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_basics() {
        let mut cluster: Cluster<u32, &str> = Cluster::new(1);
        assert!(cluster.is_empty());
        cluster.add("a");
        cluster.add("b");
        assert_eq!(cluster.len(), 2);
        assert_eq!(cluster.get(1), Some(&"b"));
        assert!(cluster.contains(&"a"));
        assert!(!cluster.contains(&"c"));
        assert_eq!(cluster.to_string(), "C1 (2 records)");
    }

    #[test]
    fn test_merge_generates_new_id() {
        let mut ids = SequentialIds::<u64>::starting_at(10);
        let left = Cluster::with_elements(ids.allocate(), vec![1, 2]);
        let right = Cluster::with_elements(ids.allocate(), vec![3]);
        let merged = left.merge(&mut ids, right);
        assert_eq!(merged.id, 12);
        assert_eq!(merged.elements, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_with_same_cluster_is_noop() {
        let mut ids = SequentialIds::<u32>::default();
        let cluster = Cluster::with_elements(7u32, vec!["x"]);
        let merged = cluster.clone().merge(&mut ids, cluster.clone());
        assert_eq!(merged, cluster);
        assert_eq!(ids.allocate(), 0);
    }

    #[test]
    fn test_closure_generator() {
        let mut by_size = |elements: &[u8]| format!("size-{}", elements.len());
        let merged = Cluster::with_elements("a".to_string(), vec![1u8])
            .merge(&mut by_size, Cluster::with_elements("b".to_string(), vec![2, 3]));
        assert_eq!(merged.id, "size-3");
    }

    #[test]
    fn test_independent_generators() {
        let mut a = SequentialIds::<u32>::default();
        let mut b = SequentialIds::<u32>::default();
        assert_eq!(a.allocate(), b.allocate());
        assert_eq!(a.allocate(), 1);
    }
}
