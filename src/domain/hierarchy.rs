//! Classification hierarchy used to pick system and subsystem codes.
//!
//! Classification sources come in several shapes (see [`SourceSchema`]); all of
//! them are normalised into one tree of [`HierarchyNode`]s with three levels:
//! group → system → subsystem. The tree is built once per source and never
//! mutated afterwards. [`search`] returns a pruned copy, and [`Outline`] keeps
//! the expand/collapse state of a browser as an explicit value.

mod outline;
mod schema;

use serde::{Deserialize, Serialize};

pub use outline::{Outline, Row, Selection};
pub use schema::{BuildReport, SkipReason, Skipped, SourceSchema, UnknownSchemaError, build};

/// A level of the classification hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Top level grouping of systems.
    Group,
    /// A system within a group.
    System,
    /// A subsystem within a system. Always a leaf.
    Subsystem,
}

/// Depth of each level; deeper levels have larger ranks.
const LEVEL_ORDER: [(Level, u8); 3] =
    [(Level::Group, 0), (Level::System, 1), (Level::Subsystem, 2)];

impl Level {
    /// The position of this level in the group < system < subsystem ordering.
    #[must_use]
    pub fn rank(self) -> u8 {
        LEVEL_ORDER
            .iter()
            .find_map(|&(level, rank)| (level == self).then_some(rank))
            .unwrap_or(u8::MAX)
    }

    /// Whether this level sits strictly below `other`.
    #[must_use]
    pub fn is_deeper_than(self, other: Self) -> bool {
        self.rank() > other.rank()
    }
}

/// One node of the classification tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    level: Level,
    code: String,
    title: String,
    definition: String,
    children: Vec<HierarchyNode>,
    full_code: String,
    label: String,
}

impl HierarchyNode {
    /// Creates a group node holding the given systems.
    #[must_use]
    pub fn group(
        code: impl Into<String>,
        title: impl Into<String>,
        definition: impl Into<String>,
        systems: Vec<Self>,
    ) -> Self {
        debug_assert!(systems.iter().all(|node| node.level == Level::System));
        let code = code.into();
        Self::new(
            Level::Group,
            code.clone(),
            code,
            title.into(),
            definition.into(),
            systems,
        )
    }

    /// Creates a system node holding the given subsystems.
    #[must_use]
    pub fn system(
        code: impl Into<String>,
        title: impl Into<String>,
        definition: impl Into<String>,
        subsystems: Vec<Self>,
    ) -> Self {
        debug_assert!(subsystems.iter().all(|node| node.level == Level::Subsystem));
        let code = code.into();
        Self::new(
            Level::System,
            code.clone(),
            code,
            title.into(),
            definition.into(),
            subsystems,
        )
    }

    /// Creates a subsystem node. Subsystems never have children.
    #[must_use]
    pub fn subsystem(
        system_code: &str,
        code: impl Into<String>,
        title: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        let code = code.into();
        let full_code = format!("{system_code}-{code}");
        Self::new(
            Level::Subsystem,
            code,
            full_code,
            title.into(),
            definition.into(),
            Vec::new(),
        )
    }

    fn new(
        level: Level,
        code: String,
        full_code: String,
        title: String,
        definition: String,
        children: Vec<Self>,
    ) -> Self {
        let label = if full_code.is_empty() {
            title.clone()
        } else {
            format!("{full_code} - {title}")
        };
        Self {
            level,
            code,
            title,
            definition,
            children,
            full_code,
            label,
        }
    }

    /// The level of this node.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// The node's own code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The node's title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The node's definition text, empty when the source has none.
    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Child nodes, in source order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// The code qualified by its parent system, e.g. `21-10` for a subsystem.
    #[must_use]
    pub fn full_code(&self) -> &str {
        &self.full_code
    }

    /// The display label that search matches against.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    fn with_children(&self, children: Vec<Self>) -> Self {
        Self {
            children,
            ..self.clone_shallow()
        }
    }

    fn clone_shallow(&self) -> Self {
        Self {
            level: self.level,
            code: self.code.clone(),
            title: self.title.clone(),
            definition: self.definition.clone(),
            children: Vec::new(),
            full_code: self.full_code.clone(),
            label: self.label.clone(),
        }
    }
}

/// Searches the tree for nodes whose label contains `query`, ignoring case.
///
/// A node is kept if it matches or any of its descendants do. A matching node
/// keeps its whole subtree; an ancestor kept only for its descendants keeps
/// just the children that were themselves kept. The source tree is not
/// modified. An empty query returns the whole tree.
#[must_use]
pub fn search(tree: &[HierarchyNode], query: &str) -> Vec<HierarchyNode> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return tree.to_vec();
    }
    tree.iter()
        .filter_map(|node| prune(node, &query))
        .collect()
}

fn prune(node: &HierarchyNode, query: &str) -> Option<HierarchyNode> {
    if node.label.to_lowercase().contains(query) {
        return Some(node.clone());
    }

    let children: Vec<_> = node
        .children
        .iter()
        .filter_map(|child| prune(child, query))
        .collect();

    (!children.is_empty()).then(|| node.with_children(children))
}

/// Returns the node at the given index path, if it exists.
#[must_use]
pub fn node_at<'a>(tree: &'a [HierarchyNode], path: &[usize]) -> Option<&'a HierarchyNode> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(tree.get(*first)?, |node, &index| node.children.get(index))
}

/// Finds the index path of the first node with the given full code.
#[must_use]
pub fn find(tree: &[HierarchyNode], full_code: &str) -> Option<Vec<usize>> {
    tree.iter().enumerate().find_map(|(index, node)| {
        if node.full_code == full_code {
            return Some(vec![index]);
        }
        find(&node.children, full_code).map(|mut path| {
            path.insert(0, index);
            path
        })
    })
}
