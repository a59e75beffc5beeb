//! Breadth-first tree assembly
//!
//! Materialization works level by level: the caller fetches the roots of a
//! skill, then repeatedly fetches every child of the current frontier in a
//! single query. [`TreeAssembler`] owns the arena of rows seen so far and
//! attaches each level to already-materialized parents, so the number of
//! store round trips is bounded by tree depth rather than node count.
//!
//! Rows whose parent was never materialized are unreachable from any root
//! and are dropped without error.

use crate::models::{Theory, TheoryTree};
use std::collections::{HashMap, HashSet};

struct Slot {
    theory: Theory,
    children: Vec<i64>,
}

/// Arena of materialized theories keyed by id
pub struct TreeAssembler {
    roots: Vec<i64>,
    slots: HashMap<i64, Slot>,
}

impl TreeAssembler {
    /// Seed the arena with the root level
    ///
    /// `roots` must already be in display order. Returns the assembler and
    /// the first frontier (the root ids).
    pub fn from_roots(roots: Vec<Theory>) -> (Self, Vec<i64>) {
        let mut assembler = Self {
            roots: Vec::with_capacity(roots.len()),
            slots: HashMap::with_capacity(roots.len()),
        };

        for root in roots {
            if assembler.slots.contains_key(&root.id) {
                continue;
            }
            assembler.roots.push(root.id);
            assembler.slots.insert(
                root.id,
                Slot {
                    theory: root,
                    children: Vec::new(),
                },
            );
        }

        let frontier = assembler.roots.clone();
        (assembler, frontier)
    }

    /// Attach one level of children and return the next frontier
    ///
    /// `level` must be ordered by `order_index`; the relative order of each
    /// parent's children is preserved.
    pub fn attach_level(&mut self, level: Vec<Theory>) -> Vec<i64> {
        let mut next_frontier = Vec::with_capacity(level.len());

        for child in level {
            let Some(parent_id) = child.parent_id else {
                continue;
            };
            if self.slots.contains_key(&child.id) {
                continue;
            }
            let Some(parent) = self.slots.get_mut(&parent_id) else {
                tracing::debug!(
                    "Skipping theory {} whose parent {} is not materialized",
                    child.id,
                    parent_id
                );
                continue;
            };

            parent.children.push(child.id);
            next_frontier.push(child.id);
            self.slots.insert(
                child.id,
                Slot {
                    theory: child,
                    children: Vec::new(),
                },
            );
        }

        next_frontier
    }

    /// Number of theories materialized so far
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consume the arena and build the nested forest in display order
    pub fn into_forest(mut self) -> Vec<TheoryTree> {
        let roots = std::mem::take(&mut self.roots);
        roots
            .into_iter()
            .filter_map(|id| Self::build(id, &mut self.slots))
            .collect()
    }

    fn build(id: i64, slots: &mut HashMap<i64, Slot>) -> Option<TheoryTree> {
        let slot = slots.remove(&id)?;
        let children = slot
            .children
            .into_iter()
            .filter_map(|child_id| Self::build(child_id, slots))
            .collect();

        Some(TheoryTree {
            node: slot.theory,
            children,
        })
    }
}

fn display_order(rows: &mut [Theory]) {
    rows.sort_by_key(|t| (t.order_index, t.id));
}

/// Materialize a skill's forest from an in-memory row set
///
/// Runs the same level-by-level expansion as the store-backed materializer,
/// which makes it usable for rebuilding a flattened tree and for checking
/// that both paths agree.
pub fn assemble(skill_id: i64, rows: &[Theory]) -> Vec<TheoryTree> {
    let mut roots: Vec<Theory> = rows
        .iter()
        .filter(|t| t.is_in_group(skill_id, None))
        .cloned()
        .collect();
    display_order(&mut roots);

    let (mut assembler, mut frontier) = TreeAssembler::from_roots(roots);

    while !frontier.is_empty() {
        let parents: HashSet<i64> = frontier.iter().copied().collect();
        let mut level: Vec<Theory> = rows
            .iter()
            .filter(|t| t.parent_id.is_some_and(|p| parents.contains(&p)))
            .cloned()
            .collect();
        if level.is_empty() {
            break;
        }
        display_order(&mut level);
        frontier = assembler.attach_level(level);
    }

    assembler.into_forest()
}

/// Flatten a forest back into rows (pre-order)
pub fn flatten(forest: &[TheoryTree]) -> Vec<Theory> {
    fn walk(tree: &TheoryTree, out: &mut Vec<Theory>) {
        out.push(tree.node.clone());
        for child in &tree.children {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for tree in forest {
        walk(tree, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theory(id: i64, parent_id: Option<i64>, order_index: i64) -> Theory {
        Theory {
            id,
            title: format!("Theory {}", id),
            content: format!("Content {}", id),
            difficulty_level: 0,
            order_index,
            parent_id,
            skill_id: Some(1),
        }
    }

    fn ids(forest: &[TheoryTree]) -> Vec<i64> {
        forest.iter().map(|t| t.node.id).collect()
    }

    #[test]
    fn test_roots_and_children_follow_order_index() {
        let rows = vec![
            theory(1, None, 1),
            theory(2, None, 0),
            theory(3, Some(1), 1),
            theory(4, Some(1), 0),
            theory(5, Some(4), 0),
        ];

        let forest = assemble(1, &rows);

        assert_eq!(ids(&forest), vec![2, 1]);
        assert_eq!(ids(&forest[1].children), vec![4, 3]);
        assert_eq!(ids(&forest[1].children[0].children), vec![5]);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn test_empty_skill_yields_empty_forest() {
        assert!(assemble(1, &[]).is_empty());
        assert!(assemble(2, &[theory(1, None, 0)]).is_empty());
    }

    #[test]
    fn test_orphans_are_excluded() {
        let rows = vec![
            theory(1, None, 0),
            theory(2, Some(1), 0),
            // Parent 99 does not exist
            theory(3, Some(99), 0),
            // Child of the orphan is unreachable as well
            theory(4, Some(3), 0),
        ];

        let forest = assemble(1, &rows);
        let flat = flatten(&forest);

        assert_eq!(flat.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_cycle_without_root_is_unreachable() {
        let rows = vec![
            theory(1, None, 0),
            theory(2, Some(3), 0),
            theory(3, Some(2), 0),
        ];

        let forest = assemble(1, &rows);
        assert_eq!(flatten(&forest).len(), 1);
    }

    #[test]
    fn test_attach_level_skips_unknown_parents() {
        let (mut assembler, frontier) = TreeAssembler::from_roots(vec![theory(1, None, 0)]);
        assert_eq!(frontier, vec![1]);

        let next = assembler.attach_level(vec![theory(2, Some(1), 0), theory(3, Some(42), 0)]);

        assert_eq!(next, vec![2]);
        assert_eq!(assembler.len(), 2);
    }

    #[test]
    fn test_flatten_then_assemble_round_trips() {
        let rows = vec![
            theory(10, None, 0),
            theory(11, Some(10), 0),
            theory(12, Some(10), 1),
            theory(13, Some(12), 0),
            theory(14, None, 1),
        ];

        let forest = assemble(1, &rows);
        let rebuilt = assemble(1, &flatten(&forest));

        assert_eq!(forest, rebuilt);
    }
}
