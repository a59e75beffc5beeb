//! Insertion policy and sibling-order integrity checks

use crate::models::Theory;
use serde::Serialize;
use std::collections::BTreeMap;

/// Order index for a theory appended to a sibling group
///
/// One past the current maximum, or `0` for an empty group.
pub fn next_order_index(current_max: Option<i64>) -> i64 {
    current_max.map_or(0, |max| max + 1)
}

/// A sibling group whose order indices are not exactly `0..count`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupViolation {
    pub skill_id: Option<i64>,
    pub parent_id: Option<i64>,
    /// Order indices found, sorted ascending
    pub order_indices: Vec<i64>,
}

/// Find every sibling group that breaks contiguity
///
/// Groups are keyed by `(skill_id, parent_id)`; the result is sorted by that
/// key so repeated checks produce identical output.
pub fn contiguity_violations(rows: &[Theory]) -> Vec<GroupViolation> {
    let mut groups: BTreeMap<(Option<i64>, Option<i64>), Vec<i64>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.skill_id, row.parent_id))
            .or_default()
            .push(row.order_index);
    }

    groups
        .into_iter()
        .filter_map(|((skill_id, parent_id), mut order_indices)| {
            order_indices.sort_unstable();
            let contiguous = order_indices
                .iter()
                .enumerate()
                .all(|(position, &index)| index == position as i64);
            (!contiguous).then_some(GroupViolation {
                skill_id,
                parent_id,
                order_indices,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theory(id: i64, parent_id: Option<i64>, order_index: i64) -> Theory {
        Theory {
            id,
            title: "t".to_string(),
            content: "c".to_string(),
            difficulty_level: 0,
            order_index,
            parent_id,
            skill_id: Some(1),
        }
    }

    #[test]
    fn test_next_order_index() {
        assert_eq!(next_order_index(None), 0);
        assert_eq!(next_order_index(Some(0)), 1);
        assert_eq!(next_order_index(Some(2)), 3);
    }

    #[test]
    fn test_contiguous_groups_pass() {
        let rows = vec![
            theory(1, None, 1),
            theory(2, None, 0),
            theory(3, Some(1), 0),
        ];
        assert!(contiguity_violations(&rows).is_empty());
    }

    #[test]
    fn test_gaps_and_duplicates_are_reported() {
        let rows = vec![
            theory(1, None, 0),
            theory(2, None, 2),
            theory(3, Some(1), 0),
            theory(4, Some(1), 0),
        ];

        let violations = contiguity_violations(&rows);

        assert_eq!(
            violations,
            vec![
                GroupViolation {
                    skill_id: Some(1),
                    parent_id: None,
                    order_indices: vec![0, 2],
                },
                GroupViolation {
                    skill_id: Some(1),
                    parent_id: Some(1),
                    order_indices: vec![0, 0],
                },
            ]
        );
    }
}
