//! Group index construction
//!
//! Records are grouped once into lists of row indices. Statistics are computed
//! per group and scattered back to the original rows, so the record order and
//! count never change.

use crate::record::Record;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Row indices partitioned by a grouping key
///
/// Groups are stored in order of first appearance so iteration is deterministic.
#[derive(Debug, Clone)]
pub struct Groups {
    members: Vec<Vec<usize>>,
    n_records: usize,
}

impl Groups {
    /// Group by crop (cross-state cohort)
    pub fn by_crop(records: &[Record]) -> Self {
        Self::build(records, |r| r.crop.as_str())
    }

    /// Group by state
    pub fn by_state(records: &[Record]) -> Self {
        Self::build(records, |r| r.state.as_str())
    }

    /// Group by (state, crop), each group ordered ascending by year
    ///
    /// Rows sharing a year keep their input order.
    pub fn by_system(records: &[Record]) -> Self {
        let mut groups = Self::build(records, |r| (r.state.as_str(), r.crop.as_str()));
        for members in &mut groups.members {
            members.sort_by_key(|&idx| records[idx].year);
        }
        groups
    }

    fn build<'a, K, F>(records: &'a [Record], key: F) -> Self
    where
        K: Eq + Hash,
        F: Fn(&'a Record) -> K,
    {
        let mut slot: FxHashMap<K, usize> = FxHashMap::default();
        let mut members: Vec<Vec<usize>> = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            let next = members.len();
            let group = *slot.entry(key(record)).or_insert(next);
            if group == next {
                members.push(Vec::new());
            }
            members[group].push(idx);
        }

        Self {
            members,
            n_records: records.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.members.iter().map(|m| m.as_slice())
    }

    /// Apply a per-group computation and scatter the results back to row order
    ///
    /// `f` receives the member indices of one group and must return one value
    /// per member, in the same order. Groups are processed in parallel; the
    /// scatter is sequential so the output does not depend on scheduling.
    pub fn transform<T, F>(&self, f: F) -> Vec<T>
    where
        T: Clone + Default + Send,
        F: Fn(&[usize]) -> Vec<T> + Sync,
    {
        let per_group: Vec<Vec<T>> = self.members.par_iter().map(|m| f(m.as_slice())).collect();

        let mut out = vec![T::default(); self.n_records];
        for (members, values) in self.members.iter().zip(per_group) {
            debug_assert_eq!(members.len(), values.len());
            for (&idx, value) in members.iter().zip(values) {
                out[idx] = value;
            }
        }
        out
    }
}

/// Values of one column restricted to a group, in member order
pub fn gather<T: Copy>(column: &[T], members: &[usize]) -> Vec<T> {
    members.iter().map(|&idx| column[idx]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(state: &str, crop: &str, year: i32) -> Record {
        Record::new(state, crop, year)
    }

    #[test]
    fn test_by_system_orders_by_year() {
        let records = vec![
            rec("punjab", "rice", 2003),
            rec("kerala", "rice", 2001),
            rec("punjab", "rice", 2001),
            rec("punjab", "rice", 2002),
        ];
        let groups = Groups::by_system(&records);
        let collected: Vec<Vec<usize>> = groups.iter().map(|m| m.to_vec()).collect();
        assert_eq!(collected, vec![vec![2, 3, 0], vec![1]]);
    }

    #[test]
    fn test_by_crop_spans_states() {
        let records = vec![
            rec("punjab", "rice", 2001),
            rec("kerala", "maize", 2001),
            rec("kerala", "rice", 2001),
        ];
        let groups = Groups::by_crop(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.n_records(), 3);
        let first: Vec<usize> = groups.iter().next().unwrap().to_vec();
        assert_eq!(first, vec![0, 2]);
    }

    #[test]
    fn test_transform_scatters_to_row_order() {
        let records = vec![
            rec("a", "rice", 2002),
            rec("b", "rice", 2001),
            rec("a", "rice", 2001),
        ];
        let groups = Groups::by_system(&records);
        // Rank within group by year
        let ranks: Vec<usize> = groups.transform(|m| (0..m.len()).collect());
        assert_eq!(ranks, vec![1, 0, 0]);
    }

    #[test]
    fn test_gather() {
        let column = vec![10, 20, 30];
        assert_eq!(gather(&column, &[2, 0]), vec![30, 10]);
    }
}
