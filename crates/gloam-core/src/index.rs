//! Category index over a container's direct children.
//!
//! A [`CategoryIndex`] keeps one bucket holding every member ([`Bucket::All`])
//! plus one bucket per category label any member carries. Membership is
//! updated as a unit: a node is either in `All` and in exactly the buckets of
//! its categories, or in none of them.
//!
//! Buckets are `BTreeSet<NodeId>`, so iteration is ascending by id. That
//! makes "first match" query results reproducible without making insertion
//! order meaningful.
//!
//! The same structure doubles as an entity's perception snapshot.
//!
//! # Example
//!
//! ```
//! use gloam_core::index::{Bucket, CategoryIndex};
//! use gloam_core::NodeId;
//!
//! let mut index = CategoryIndex::new();
//! index.insert(NodeId::new(3), ["solid", "visible"]);
//! index.insert(NodeId::new(4), ["visible"]);
//!
//! assert_eq!(index.bucket_len(Bucket::All), 2);
//! assert_eq!(index.members("solid".into()).collect::<Vec<_>>(), vec![NodeId::new(3)]);
//!
//! index.remove(NodeId::new(3));
//! assert!(!index.contains("visible".into(), NodeId::new(3)));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::node::NodeId;

/// Selects a bucket of a [`CategoryIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket<'a> {
    /// Every member
    All,
    /// Members carrying this category
    Category(&'a str),
}

impl<'a> From<&'a str> for Bucket<'a> {
    fn from(category: &'a str) -> Self {
        Self::Category(category)
    }
}

/// Category-bucketed membership set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    all: BTreeSet<NodeId>,
    buckets: BTreeMap<String, BTreeSet<NodeId>>,
}

impl CategoryIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` to `All` and to one bucket per category, creating buckets on demand.
    pub fn insert<I, S>(&mut self, id: NodeId, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.all.insert(id);
        for category in categories {
            let category = category.as_ref();
            if let Some(bucket) = self.buckets.get_mut(category) {
                bucket.insert(id);
            } else {
                self.buckets
                    .insert(category.to_string(), BTreeSet::from([id]));
            }
        }
    }

    /// Removes `id` from `All` and from every bucket it appears in.
    ///
    /// Empty buckets are dropped. Returns whether `id` was a member.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let was_member = self.all.remove(&id);
        self.buckets.retain(|_, bucket| {
            bucket.remove(&id);
            !bucket.is_empty()
        });
        was_member
    }

    /// Moves `id` from its current category buckets to `categories`.
    ///
    /// A non-member is inserted.
    pub fn reindex<I, S>(&mut self, id: NodeId, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove(id);
        self.insert(id, categories);
    }

    /// Members of a bucket in ascending id order. Unknown buckets are empty.
    pub fn members(&self, bucket: Bucket<'_>) -> impl Iterator<Item = NodeId> + '_ {
        self.bucket(bucket).into_iter().flatten().copied()
    }

    /// Whether `id` is in the bucket.
    #[must_use]
    pub fn contains(&self, bucket: Bucket<'_>, id: NodeId) -> bool {
        self.bucket(bucket).is_some_and(|set| set.contains(&id))
    }

    /// Number of members in a bucket.
    #[must_use]
    pub fn bucket_len(&self, bucket: Bucket<'_>) -> usize {
        self.bucket(bucket).map_or(0, BTreeSet::len)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the index has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Category buckets that currently hold `id`.
    #[must_use]
    pub fn buckets_of(&self, id: NodeId) -> BTreeSet<&str> {
        self.buckets
            .iter()
            .filter(|(_, bucket)| bucket.contains(&id))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Names of the non-empty category buckets.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// The `All` bucket.
    #[must_use]
    pub fn all(&self) -> &BTreeSet<NodeId> {
        &self.all
    }

    fn bucket(&self, bucket: Bucket<'_>) -> Option<&BTreeSet<NodeId>> {
        match bucket {
            Bucket::All => Some(&self.all),
            Bucket::Category(category) => self.buckets.get(category),
        }
    }
}
