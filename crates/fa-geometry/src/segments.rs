//! Segment labels: groups of elements driven at one common force.

use crate::error::GeometryResult;
use fa_core::ensure_len;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-element segment label.
///
/// Elements sharing a positive label form a segment. Labels `<= 0` mean
/// "not segmented" and never couple elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segmentation {
    labels: Vec<i64>,
}

impl Segmentation {
    pub fn new(labels: Vec<i64>) -> Self {
        Self { labels }
    }

    /// Every element in its own segment (labels `1..=n`).
    pub fn unsegmented(n: usize) -> Self {
        Self::new((1..=n as i64).collect())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    pub fn max_label(&self) -> Option<i64> {
        self.labels.iter().copied().max()
    }

    /// Segments whose members must be driven equally for this mask.
    ///
    /// Returns, in ascending label order, the member indices of every
    /// segment with at least two members none of which is retracted.
    pub fn coupled_groups(&self, retracted: &[bool]) -> GeometryResult<Vec<Vec<usize>>> {
        ensure_len(retracted, self.labels.len(), "retraction mask")?;

        let mut by_label: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in self.labels.iter().enumerate() {
            if label > 0 {
                by_label.entry(label).or_default().push(i);
            }
        }

        Ok(by_label
            .into_values()
            .filter(|members| members.len() > 1 && members.iter().all(|&i| !retracted[i]))
            .collect())
    }
}

impl From<Vec<i64>> for Segmentation {
    fn from(labels: Vec<i64>) -> Self {
        Self::new(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsegmented_has_no_groups() {
        let seg = Segmentation::unsegmented(5);
        assert_eq!(seg.labels(), &[1, 2, 3, 4, 5]);
        assert!(seg.coupled_groups(&[false; 5]).unwrap().is_empty());
    }

    #[test]
    fn groups_in_label_order() {
        let seg = Segmentation::new(vec![3, 1, 3, 1, 2]);
        let groups = seg.coupled_groups(&[false; 5]).unwrap();
        assert_eq!(groups, vec![vec![1, 3], vec![0, 2]]);
    }

    #[test]
    fn retracted_member_drops_whole_segment() {
        let seg = Segmentation::new(vec![1, 1, 1, 2, 2]);
        let groups = seg
            .coupled_groups(&[false, true, false, false, false])
            .unwrap();
        assert_eq!(groups, vec![vec![3, 4]]);
    }

    #[test]
    fn non_positive_labels_never_couple() {
        let seg = Segmentation::new(vec![0, 0, -1, -1]);
        assert_eq!(seg.max_label(), Some(0));
        assert!(seg.coupled_groups(&[false; 4]).unwrap().is_empty());
    }

    #[test]
    fn mask_length_checked() {
        let seg = Segmentation::new(vec![1, 1]);
        assert!(seg.coupled_groups(&[false]).is_err());
    }
}
