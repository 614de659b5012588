//! Group tags attached to indexed sub-geometries.
//!
//! A [`SegmentIndexCollection`](crate::SegmentIndexCollection) tags each member
//! with a [`Group`]: closed members get their own [`Group::Id`], open members
//! share [`Group::Ungrouped`]. Proximity queries report the set of groups that
//! reach the minimum distance as a [`GroupSet`].

use std::fmt;

use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    /// Sentinel shared by every member that has no identity of its own.
    Ungrouped,
    Id(u32),
}

impl Group {
    #[inline]
    pub fn is_explicit(self) -> bool { matches!(self, Group::Id(_)) }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Ungrouped => write!(f, "Ungrouped"),
            Group::Id(id) => write!(f, "Group({id})"),
        }
    }
}

/// Sorted, deduplicated set of groups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupSet(SmallVec<[Group; 4]>);

impl GroupSet {
    #[inline]
    pub fn new() -> Self { Self(SmallVec::new()) }

    pub fn single(group: Group) -> Self {
        let mut set = Self::new();
        set.0.push(group);
        set
    }

    pub fn insert(&mut self, group: Group) {
        if let Err(pos) = self.0.binary_search(&group) {
            self.0.insert(pos, group);
        }
    }

    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    #[inline]
    pub fn contains(&self, group: Group) -> bool { self.0.binary_search(&group).is_ok() }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Group> + '_ { self.0.iter() }

    /// Groups present in both sets, in order.
    pub fn shared<'a>(&'a self, other: &'a GroupSet) -> impl Iterator<Item = Group> + 'a {
        self.0.iter().copied().filter(move |g| other.contains(*g))
    }
}

impl FromIterator<Group> for GroupSet {
    fn from_iter<I: IntoIterator<Item = Group>>(iter: I) -> Self {
        let mut set = GroupSet::new();
        for group in iter {
            set.insert(group);
        }
        set
    }
}
