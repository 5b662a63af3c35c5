use std::collections::HashMap;

use crate::error::StructuralError;
use crate::model::Node;

#[derive(Clone, Debug)]
struct TreeNode {
    id: String,
    name: String,
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,
}

/// Strict rooted tree over a node set, read-only once built.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    index_by_id: HashMap<String, usize>,
    root: usize,
    preorder: Vec<usize>,
}

impl Tree {
    pub fn build(nodes: &[Node]) -> Result<Self, StructuralError> {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(StructuralError::DuplicateId {
                    id: node.id.clone(),
                });
            }
        }

        let roots = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent_id.is_none())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        let root = match roots.as_slice() {
            [] => return Err(StructuralError::MissingRoot),
            [root] => *root,
            _ => {
                let mut ids = roots
                    .iter()
                    .map(|&index| nodes[index].id.clone())
                    .collect::<Vec<_>>();
                ids.sort();
                return Err(StructuralError::MultipleRoots { ids });
            }
        };

        let mut tree_nodes = nodes
            .iter()
            .map(|node| TreeNode {
                id: node.id.clone(),
                name: node.name.clone(),
                parent: None,
                children: Vec::new(),
                depth: 0,
            })
            .collect::<Vec<_>>();

        for (index, node) in nodes.iter().enumerate() {
            let Some(parent_id) = &node.parent_id else {
                continue;
            };
            let Some(&parent) = index_by_id.get(parent_id) else {
                return Err(StructuralError::MissingParent {
                    id: node.id.clone(),
                    parent_id: parent_id.clone(),
                });
            };
            if parent == index {
                return Err(StructuralError::Cycle {
                    id: node.id.clone(),
                });
            }
            tree_nodes[index].parent = Some(parent);
            tree_nodes[parent].children.push(index);
        }

        for index in 0..tree_nodes.len() {
            let mut children = std::mem::take(&mut tree_nodes[index].children);
            children.sort_by(|&a, &b| {
                tree_nodes[a]
                    .name
                    .cmp(&tree_nodes[b].name)
                    .then_with(|| tree_nodes[a].id.cmp(&tree_nodes[b].id))
            });
            tree_nodes[index].children = children;
        }

        let mut preorder = Vec::with_capacity(tree_nodes.len());
        let mut visited = vec![false; tree_nodes.len()];
        let mut stack = vec![(root, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            visited[index] = true;
            tree_nodes[index].depth = depth;
            preorder.push(index);
            for &child in tree_nodes[index].children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        // Every node has a parent and there is one root, so anything unreached hangs off a cycle.
        if let Some(index) = visited.iter().position(|seen| !seen) {
            return Err(StructuralError::Cycle {
                id: tree_nodes[index].id.clone(),
            });
        }

        log::debug!(
            "Built tree: {} nodes, {} leaves",
            tree_nodes.len(),
            tree_nodes.iter().filter(|node| node.children.is_empty()).count()
        );

        Ok(Self {
            nodes: tree_nodes,
            index_by_id,
            root,
            preorder,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_id(&self) -> &str {
        &self.nodes[self.root].id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn id_at(&self, index: usize) -> &str {
        &self.nodes[index].id
    }

    pub fn children_of(&self, id: &str) -> Vec<&str> {
        self.index_of(id)
            .map(|index| {
                self.nodes[index]
                    .children
                    .iter()
                    .map(|&child| self.id_at(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.index_of(id).map(|index| self.nodes[index].depth)
    }

    /// Unknown ids are not leaves.
    pub fn is_leaf(&self, id: &str) -> bool {
        self.index_of(id)
            .is_some_and(|index| self.nodes[index].children.is_empty())
    }

    /// Root-to-node path, inclusive at both ends.
    pub fn ancestors_of(&self, id: &str) -> Option<Vec<&str>> {
        let index = self.index_of(id)?;
        Some(
            self.ancestor_indices(index)
                .into_iter()
                .map(|ancestor| self.id_at(ancestor))
                .collect(),
        )
    }

    pub fn lowest_common_ancestor(&self, a: &str, b: &str) -> Option<&str> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        Some(self.id_at(self.lca_index(a, b)))
    }

    /// Node ids from `source` up to the lowest common ancestor and back down to `target`.
    pub fn path_between(&self, source: &str, target: &str) -> Option<Vec<&str>> {
        let source = self.index_of(source)?;
        let target = self.index_of(target)?;
        Some(
            self.path_indices(source, target)
                .into_iter()
                .map(|index| self.id_at(index))
                .collect(),
        )
    }

    /// Leaves in depth-first order, honouring child ordering.
    pub fn leaves(&self) -> Vec<&str> {
        self.preorder
            .iter()
            .filter(|&&index| self.nodes[index].children.is_empty())
            .map(|&index| self.id_at(index))
            .collect()
    }

    pub(crate) fn preorder(&self) -> &[usize] {
        &self.preorder
    }

    pub(crate) fn children_at(&self, index: usize) -> &[usize] {
        &self.nodes[index].children
    }

    pub(crate) fn depth_at(&self, index: usize) -> usize {
        self.nodes[index].depth
    }

    pub(crate) fn ancestor_indices(&self, index: usize) -> Vec<usize> {
        let mut path = vec![index];
        let mut cursor = index;
        while let Some(parent) = self.nodes[cursor].parent {
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
        path
    }

    fn lca_index(&self, a: usize, b: usize) -> usize {
        let a_path = self.ancestor_indices(a);
        let b_path = self.ancestor_indices(b);
        a_path
            .iter()
            .zip(&b_path)
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(&common, _)| common)
            .unwrap_or(self.root)
    }

    pub(crate) fn path_indices(&self, source: usize, target: usize) -> Vec<usize> {
        let source_path = self.ancestor_indices(source);
        let target_path = self.ancestor_indices(target);
        let shared = source_path
            .iter()
            .zip(&target_path)
            .take_while(|(x, y)| x == y)
            .count()
            .max(1);

        let mut path = source_path[shared - 1..]
            .iter()
            .rev()
            .copied()
            .collect::<Vec<_>>();
        path.extend_from_slice(&target_path[shared..]);
        path
    }
}
