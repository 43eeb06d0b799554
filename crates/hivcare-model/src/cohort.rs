//! Patient identifiers and cohorts

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt;

/// Identifier of a patient in the host EMR
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub u32);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PatientId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A set of patients under evaluation
///
/// Iteration is always in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cohort {
    members: BTreeSet<PatientId>,
}

impl Cohort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: PatientId) -> bool {
        self.members.insert(id)
    }

    pub fn contains(&self, id: PatientId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PatientId> + '_ {
        self.members.iter().copied()
    }

    /// Keep only members matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(PatientId) -> bool) {
        self.members.retain(|id| keep(*id));
    }

    /// Members present in both cohorts
    pub fn intersection(&self, other: &Cohort) -> Cohort {
        self.members.intersection(&other.members).copied().collect()
    }

    /// Members present in either cohort
    pub fn union(&self, other: &Cohort) -> Cohort {
        self.members.union(&other.members).copied().collect()
    }

    /// Members of this cohort absent from `other`
    pub fn difference(&self, other: &Cohort) -> Cohort {
        self.members.difference(&other.members).copied().collect()
    }
}

impl FromIterator<PatientId> for Cohort {
    fn from_iter<I: IntoIterator<Item = PatientId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<u32> for Cohort {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        iter.into_iter().map(PatientId).collect()
    }
}

impl Extend<PatientId> for Cohort {
    fn extend<I: IntoIterator<Item = PatientId>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Cohort {
    type Item = &'a PatientId;
    type IntoIter = btree_set::Iter<'a, PatientId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl IntoIterator for Cohort {
    type Item = PatientId;
    type IntoIter = btree_set::IntoIter<PatientId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let a: Cohort = [1u32, 2, 3].into_iter().collect();
        let b: Cohort = [2u32, 3, 4].into_iter().collect();

        assert_eq!(a.intersection(&b), [2u32, 3].into_iter().collect());
        assert_eq!(a.union(&b).len(), 4);
        assert_eq!(a.difference(&b), [1u32].into_iter().collect());
    }

    #[test]
    fn test_iteration_is_ordered() {
        let cohort: Cohort = [9u32, 1, 5].into_iter().collect();
        let ids: Vec<u32> = cohort.iter().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 5, 9]);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let cohort: Cohort = [3u32, 1].into_iter().collect();
        assert_eq!(serde_json::to_string(&cohort).unwrap(), "[1,3]");
    }
}
