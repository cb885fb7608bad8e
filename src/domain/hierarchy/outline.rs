//! Browsing state over a hierarchy tree.

use serde::Serialize;

use super::{HierarchyNode, Level, node_at};
use crate::domain::dmc::BuildParams;

/// One visible row of an [`Outline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Index path of the row's node in the tree.
    pub path: Vec<usize>,
    /// Level of the row's node.
    pub level: Level,
    /// Whether the row's children are currently shown.
    pub expanded: bool,
}

/// The visible rows of a tree browser.
///
/// Rows form a flat sequence in display order. Expanding a row inserts its
/// children directly after it; collapsing removes the rows that follow it for
/// as long as they are deeper than the collapsed row, stopping at the first row
/// at or above its level.
#[derive(Debug, Clone)]
pub struct Outline<'a> {
    tree: &'a [HierarchyNode],
    rows: Vec<Row>,
}

impl<'a> Outline<'a> {
    /// Creates an outline showing only the top-level nodes.
    #[must_use]
    pub fn new(tree: &'a [HierarchyNode]) -> Self {
        let rows = tree
            .iter()
            .enumerate()
            .map(|(index, node)| Row {
                path: vec![index],
                level: node.level(),
                expanded: false,
            })
            .collect();
        Self { tree, rows }
    }

    /// The visible rows, in display order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The node shown by a row.
    #[must_use]
    pub fn node(&self, row: &Row) -> Option<&'a HierarchyNode> {
        node_at(self.tree, &row.path)
    }

    /// Shows the children of the row at `index`.
    ///
    /// Returns `false` if the row does not exist, has no children or is
    /// already expanded.
    pub fn expand(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        if row.expanded {
            return false;
        }
        let Some(node) = self.node(row) else {
            return false;
        };
        if node.children().is_empty() {
            return false;
        }

        let children: Vec<Row> = node
            .children()
            .iter()
            .enumerate()
            .map(|(child_index, child)| {
                let mut path = row.path.clone();
                path.push(child_index);
                Row {
                    path,
                    level: child.level(),
                    expanded: false,
                }
            })
            .collect();

        self.rows[index].expanded = true;
        self.rows.splice(index + 1..index + 1, children);
        true
    }

    /// Hides every row below the row at `index`.
    ///
    /// Returns `false` if the row does not exist or is not expanded.
    pub fn collapse(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        if !row.expanded {
            return false;
        }

        let level = row.level;
        let end = self.rows[index + 1..]
            .iter()
            .position(|next| !next.level.is_deeper_than(level))
            .map_or(self.rows.len(), |offset| index + 1 + offset);

        self.rows.drain(index + 1..end);
        self.rows[index].expanded = false;
        true
    }

    /// Expands a collapsed row or collapses an expanded one.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.rows.get(index) {
            Some(row) if row.expanded => self.collapse(index),
            Some(_) => self.expand(index),
            None => false,
        }
    }
}

/// The system and subsystem picked in a hierarchy browser.
///
/// This is plain application state: it is produced from a tree and a path,
/// and consumed when building codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// The selected system code.
    pub system: Option<String>,
    /// The selected subsystem code.
    pub subsystem: Option<String>,
    /// Label of the selected node.
    pub label: Option<String>,
}

impl Selection {
    /// Selects the node at `path`.
    ///
    /// Selecting a group selects nothing; selecting a system clears the
    /// subsystem. Returns `None` if the path does not exist.
    #[must_use]
    pub fn from_path(tree: &[HierarchyNode], path: &[usize]) -> Option<Self> {
        let target = node_at(tree, path)?;
        let mut selection = Self {
            label: Some(target.label().to_string()),
            ..Self::default()
        };

        for depth in 1..=path.len() {
            let node = node_at(tree, &path[..depth])?;
            match node.level() {
                Level::Group => {}
                Level::System => selection.system = Some(node.code().to_string()),
                Level::Subsystem => selection.subsystem = Some(node.code().to_string()),
            }
        }

        Some(selection)
    }

    /// Copies the selected codes into code-building parameters.
    ///
    /// Fields without a selection are left as they are.
    pub fn apply(&self, params: &mut BuildParams) {
        if let Some(system) = &self.system {
            params.system.clone_from(system);
        }
        if let Some(subsystem) = &self.subsystem {
            params.subsystem.clone_from(subsystem);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hierarchy::tests::sample_tree;

    fn titles(outline: &Outline<'_>) -> Vec<String> {
        outline
            .rows()
            .iter()
            .map(|row| outline.node(row).unwrap().title().to_string())
            .collect()
    }

    #[test]
    fn starts_with_top_level_rows() {
        let tree = sample_tree();
        let outline = Outline::new(&tree);
        assert_eq!(titles(&outline), ["Airframe", "Powerplant"]);
    }

    #[test]
    fn expand_inserts_children_after_row() {
        let tree = sample_tree();
        let mut outline = Outline::new(&tree);

        assert!(outline.expand(0));
        assert!(outline.expand(1));

        assert_eq!(
            titles(&outline),
            [
                "Airframe",
                "Landing gear",
                "Brake Assembly",
                "Steering",
                "Air conditioning",
                "Powerplant"
            ]
        );
        assert_eq!(outline.rows()[2].path, vec![0, 0, 0]);
    }

    #[test]
    fn expand_twice_or_on_leaf_is_noop() {
        let tree = sample_tree();
        let mut outline = Outline::new(&tree);
        assert!(outline.expand(0));
        assert!(!outline.expand(0));
        // "Air conditioning" has no subsystems.
        assert!(!outline.expand(2));
        assert!(!outline.expand(42));
    }

    #[test]
    fn collapse_removes_deeper_rows_only() {
        let tree = sample_tree();
        let mut outline = Outline::new(&tree);
        outline.expand(0);
        outline.expand(1);
        outline.expand(5);

        assert!(outline.collapse(0));

        assert_eq!(titles(&outline), ["Airframe", "Powerplant", "Power plant"]);
        assert!(!outline.rows()[0].expanded);
    }

    #[test]
    fn collapse_system_keeps_sibling_systems() {
        let tree = sample_tree();
        let mut outline = Outline::new(&tree);
        outline.expand(0);
        outline.expand(1);

        assert!(outline.collapse(1));

        assert_eq!(
            titles(&outline),
            ["Airframe", "Landing gear", "Air conditioning", "Powerplant"]
        );
    }

    #[test]
    fn collapse_last_row_runs_to_end() {
        let tree = sample_tree();
        let mut outline = Outline::new(&tree);
        outline.expand(1);
        outline.expand(2);
        assert_eq!(outline.rows().len(), 4);

        assert!(outline.collapse(1));
        assert_eq!(titles(&outline), ["Airframe", "Powerplant"]);
    }

    #[test]
    fn toggle_round_trips() {
        let tree = sample_tree();
        let mut outline = Outline::new(&tree);
        assert!(outline.toggle(0));
        assert_eq!(outline.rows().len(), 4);
        assert!(outline.toggle(0));
        assert_eq!(outline.rows().len(), 2);
        assert!(!outline.collapse(0));
    }

    #[test]
    fn selection_from_subsystem_path() {
        let tree = sample_tree();
        let selection = Selection::from_path(&tree, &[0, 0, 0]).unwrap();
        assert_eq!(selection.system.as_deref(), Some("32"));
        assert_eq!(selection.subsystem.as_deref(), Some("40"));
        assert_eq!(selection.label.as_deref(), Some("32-40 - Brake Assembly"));
    }

    #[test]
    fn selection_feeds_build_params() {
        let tree = sample_tree();
        let mut params = BuildParams {
            subsystem: "00".to_string(),
            ..BuildParams::default()
        };

        Selection::from_path(&tree, &[1, 0])
            .unwrap()
            .apply(&mut params);

        assert_eq!(params.system, "71");
        assert_eq!(params.subsystem, "00");
    }

    #[test]
    fn selection_of_missing_path_is_none() {
        assert!(Selection::from_path(&sample_tree(), &[3]).is_none());
    }
}
