//! Category forest built from API24's flat category listing.
//!
//! Nodes live in an arena and refer to each other by index, so a node can be
//! enriched through [`CategoryTree::node_mut`] after it has been attached and
//! the change is visible when walking down from its parent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::slug::to_slug;

/// A single upstream category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// API24 category id, kept as a string to round-trip whatever the API sends.
    pub id: String,
    pub name: String,
    /// Always `to_slug(name)` at construction time.
    pub slug: String,
    pub parent_id: Option<String>,
}

impl Category {
    /// Builds a category and derives its slug from `name`.
    ///
    /// An empty `parent_id` is treated as absent.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            slug: to_slug(&name),
            name,
            parent_id: parent_id.filter(|p| !p.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: Category,
    /// Shop-side term id, filled in once the category has been persisted.
    pub term_id: Option<i64>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl CategoryNode {
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

impl CategoryTree {
    /// Builds the forest from a flat list in one pass over the input.
    ///
    /// A record whose `parent_id` is absent or unknown becomes a root. When
    /// several records share an id, the first one owns the id for parent
    /// lookups; later duplicates still appear in the forest. Parent cycles
    /// are broken by promoting the earliest record of the cycle to a root,
    /// so every node is reachable from exactly one root.
    #[must_use]
    pub fn build(flat: Vec<Category>) -> Self {
        let mut index = HashMap::with_capacity(flat.len());
        for (idx, category) in flat.iter().enumerate() {
            index.entry(category.id.clone()).or_insert(idx);
        }

        let mut parents: Vec<Option<usize>> = flat
            .iter()
            .map(|c| c.parent_id.as_ref().and_then(|p| index.get(p).copied()))
            .collect();

        break_cycles(&flat, &mut parents);

        let mut nodes: Vec<CategoryNode> = flat
            .into_iter()
            .zip(parents.iter().copied())
            .map(|(category, parent)| CategoryNode {
                category,
                term_id: None,
                parent,
                children: Vec::new(),
            })
            .collect();

        let mut roots = Vec::new();
        for (idx, parent) in parents.into_iter().enumerate() {
            match parent {
                Some(p) => nodes[p].children.push(idx),
                None => roots.push(idx),
            }
        }

        Self {
            nodes,
            roots,
            index,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, idx: usize) -> Option<&CategoryNode> {
        self.nodes.get(idx)
    }

    #[must_use]
    pub fn children(&self, idx: usize) -> &[usize] {
        self.nodes.get(idx).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CategoryNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Whether the node at `idx` is the one that owns its id, i.e. the first
    /// record seen with that id.
    #[must_use]
    pub fn owns_id(&self, idx: usize) -> bool {
        self.nodes
            .get(idx)
            .and_then(|n| self.index.get(&n.category.id))
            .is_some_and(|&owner| owner == idx)
    }

    pub fn node_mut(&mut self, idx: usize) -> Option<&mut CategoryNode> {
        self.nodes.get_mut(idx)
    }

    /// Node indices in pre-order: every parent precedes its children and
    /// siblings keep input order.
    #[must_use]
    pub fn walk(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        order
    }
}

/// Detects parent cycles and detaches the earliest member of each one.
fn break_cycles(flat: &[Category], parents: &mut [Option<usize>]) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parents.len()];
    for start in 0..parents.len() {
        if state[start] != UNSEEN {
            continue;
        }
        let mut path = Vec::new();
        let mut cursor = Some(start);
        while let Some(idx) = cursor {
            if state[idx] != UNSEEN {
                break;
            }
            state[idx] = ON_PATH;
            path.push(idx);
            cursor = parents[idx];
        }

        if let Some(hit) = cursor.filter(|&idx| state[idx] == ON_PATH) {
            let cycle_start = path.iter().position(|&idx| idx == hit).unwrap_or(0);
            if let Some(&promoted) = path[cycle_start..].iter().min() {
                tracing::warn!(
                    category_id = %flat[promoted].id,
                    name = %flat[promoted].name,
                    cycle_len = path.len() - cycle_start,
                    "category parent chain loops back on itself; treating as root"
                );
                parents[promoted] = None;
            }
        }

        for idx in path {
            state[idx] = DONE;
        }
    }
}

#[cfg(test)]
#[path = "category_tree_test.rs"]
mod tests;
