//! Sibling renumbering for moves and deletions
//!
//! The reorder engine never patches a single order index in place. It loads
//! the affected sibling groups, rearranges them in memory, renumbers each
//! group `0..N-1`, and emits a [`Placement`] for every row whose
//! `(parent_id, order_index)` pair changed. The store applies the placements
//! inside one transaction.

use crate::models::Theory;
use serde::{Deserialize, Serialize};

/// New position of one theory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub theory_id: i64,
    pub parent_id: Option<i64>,
    pub order_index: i64,
}

/// Result of planning a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Rows to rewrite (unchanged rows are omitted)
    pub placements: Vec<Placement>,

    /// Final position of the moved theory in its destination group
    pub final_index: i64,

    /// Source and destination were the same sibling group
    pub same_group: bool,
}

impl MovePlan {
    pub fn is_noop(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Clamp a requested index into `[0, len]`
///
/// Negative requests prepend, requests past the end append.
pub fn clamp_index(requested: i64, len: usize) -> usize {
    if requested <= 0 {
        return 0;
    }
    usize::try_from(requested).map_or(len, |index| index.min(len))
}

fn renumber(group: &[&Theory], parent_id: Option<i64>, out: &mut Vec<Placement>) {
    for (position, theory) in group.iter().enumerate() {
        let order_index = position as i64;
        if theory.order_index != order_index || theory.parent_id != parent_id {
            out.push(Placement {
                theory_id: theory.id,
                parent_id,
                order_index,
            });
        }
    }
}

/// Plan relocating `target` under `new_parent_id` at `new_index`
///
/// * `source_group` - the target's current sibling group, in display order
/// * `destination_group` - the `(skill, new_parent_id)` group, in display order
///
/// Both groups may contain the target; it is filtered out before insertion.
/// When the groups are the same only one renumbering pass is produced.
pub fn plan_move(
    target: &Theory,
    new_parent_id: Option<i64>,
    new_index: i64,
    source_group: &[Theory],
    destination_group: &[Theory],
) -> MovePlan {
    let same_group = target.parent_id == new_parent_id;
    let mut placements = Vec::new();

    if !same_group {
        let remaining: Vec<&Theory> = source_group.iter().filter(|t| t.id != target.id).collect();
        renumber(&remaining, target.parent_id, &mut placements);
    }

    let mut destination: Vec<&Theory> = destination_group
        .iter()
        .filter(|t| t.id != target.id)
        .collect();
    let position = clamp_index(new_index, destination.len());
    destination.insert(position, target);
    renumber(&destination, new_parent_id, &mut placements);

    MovePlan {
        placements,
        final_index: position as i64,
        same_group,
    }
}

/// Plan closing the gap left by removing `removed_id` from a sibling group
pub fn plan_gap_close(group: &[Theory], removed_id: i64) -> Vec<Placement> {
    let remaining: Vec<&Theory> = group.iter().filter(|t| t.id != removed_id).collect();
    let parent_id = remaining.first().and_then(|t| t.parent_id);
    let mut placements = Vec::new();
    renumber(&remaining, parent_id, &mut placements);
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theory(id: i64, parent_id: Option<i64>, order_index: i64) -> Theory {
        Theory {
            id,
            title: format!("T{}", id),
            content: "c".to_string(),
            difficulty_level: 0,
            order_index,
            parent_id,
            skill_id: Some(1),
        }
    }

    fn placement(theory_id: i64, parent_id: Option<i64>, order_index: i64) -> Placement {
        Placement {
            theory_id,
            parent_id,
            order_index,
        }
    }

    fn apply(rows: &mut [Theory], plan: &[Placement]) {
        for placement in plan {
            let row = rows
                .iter_mut()
                .find(|t| t.id == placement.theory_id)
                .unwrap();
            row.parent_id = placement.parent_id;
            row.order_index = placement.order_index;
        }
    }

    #[test]
    fn test_clamp_index_bounds() {
        assert_eq!(clamp_index(-5, 3), 0);
        assert_eq!(clamp_index(0, 3), 0);
        assert_eq!(clamp_index(2, 3), 2);
        assert_eq!(clamp_index(3, 3), 3);
        assert_eq!(clamp_index(999, 3), 3);
        assert_eq!(clamp_index(i64::MAX, 0), 0);
    }

    #[test]
    fn test_move_across_parents_renumbers_both_groups() {
        // A = 1 with [X=10, Y=11, Z=12], B = 2 with [W=20]
        let group_a = vec![
            theory(10, Some(1), 0),
            theory(11, Some(1), 1),
            theory(12, Some(1), 2),
        ];
        let group_b = vec![theory(20, Some(2), 0)];

        let plan = plan_move(&group_a[0], Some(2), 0, &group_a, &group_b);

        assert!(!plan.same_group);
        assert_eq!(plan.final_index, 0);

        let mut rows: Vec<Theory> = group_a.iter().chain(group_b.iter()).cloned().collect();
        apply(&mut rows, &plan.placements);

        let position = |id: i64| {
            let t = rows.iter().find(|t| t.id == id).unwrap();
            (t.parent_id, t.order_index)
        };
        assert_eq!(position(11), (Some(1), 0));
        assert_eq!(position(12), (Some(1), 1));
        assert_eq!(position(10), (Some(2), 0));
        assert_eq!(position(20), (Some(2), 1));
    }

    #[test]
    fn test_move_within_group_single_pass() {
        let group = vec![
            theory(1, None, 0),
            theory(2, None, 1),
            theory(3, None, 2),
        ];

        let plan = plan_move(&group[0], None, 2, &group, &group);

        assert!(plan.same_group);
        assert_eq!(plan.final_index, 2);
        assert_eq!(
            plan.placements,
            vec![
                placement(2, None, 0),
                placement(3, None, 1),
                placement(1, None, 2),
            ]
        );
    }

    #[test]
    fn test_move_clamps_to_end() {
        let target = theory(9, Some(5), 0);
        let destination = vec![
            theory(1, Some(6), 0),
            theory(2, Some(6), 1),
            theory(3, Some(6), 2),
        ];

        let plan = plan_move(&target, Some(6), 999, std::slice::from_ref(&target), &destination);

        assert_eq!(plan.final_index, 3);
        assert_eq!(plan.placements, vec![placement(9, Some(6), 3)]);
    }

    #[test]
    fn test_move_to_current_position_is_noop() {
        let group = vec![theory(1, None, 0), theory(2, None, 1)];
        let plan = plan_move(&group[1], None, 1, &group, &group);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_move_repairs_existing_gaps() {
        let group = vec![theory(1, None, 0), theory(2, None, 4), theory(3, None, 9)];
        let plan = plan_move(&group[0], None, 0, &group, &group);

        let mut rows = group.clone();
        apply(&mut rows, &plan.placements);
        let indices: Vec<i64> = rows.iter().map(|t| t.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_gap_close_after_removal() {
        let group = vec![theory(1, Some(7), 0), theory(2, Some(7), 1), theory(3, Some(7), 2)];

        let plan = plan_gap_close(&group, 1);

        assert_eq!(
            plan,
            vec![placement(2, Some(7), 0), placement(3, Some(7), 1)]
        );
        assert!(plan_gap_close(&group, 3).is_empty());
    }
}
