//! Prefix tree builder / 路径树构建
//!
//! Folds a flat key listing into directories and files. Nodes live in an
//! arena indexed by their full cumulative prefix ("docs/images"), so two
//! same-named segments at different depths never collide and a key seen
//! twice never creates a second node. The arena is dropped after `build`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::{is_placeholder, key_segments, DELIMITER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// Tree node, `path` is the last segment only / 树节点（只含最后一段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn file(path: &str) -> Self {
        Self { path: path.to_string(), kind: NodeKind::File, children: Vec::new() }
    }

    pub fn directory(path: &str, children: Vec<TreeNode>) -> Self {
        Self { path: path.to_string(), kind: NodeKind::Directory, children }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Total nodes in this subtree / 子树节点数
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

struct ArenaNode {
    segment: String,
    kind: NodeKind,
    children: Vec<usize>,
}

/// Incremental builder / 树构建器
#[derive(Default)]
pub struct TreeBuilder {
    nodes: Vec<ArenaNode>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one key / 插入一个键
    pub fn insert(&mut self, key: &str) {
        let segments = key_segments(key);
        let Some(last) = segments.len().checked_sub(1) else {
            return;
        };
        // "docs/" names a directory even without children
        let trailing_dir = is_placeholder(key);

        let mut prefix = String::with_capacity(key.len());
        let mut parent: Option<usize> = None;

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                prefix.push(DELIMITER);
            }
            prefix.push_str(segment);

            let is_leaf = i == last && !trailing_dir;
            let kind = if is_leaf { NodeKind::File } else { NodeKind::Directory };

            let id = match self.index.get(&prefix) {
                Some(&id) => {
                    // a file that turns out to have descendants becomes a directory
                    if kind == NodeKind::Directory {
                        self.nodes[id].kind = NodeKind::Directory;
                    }
                    id
                }
                None => {
                    let id = self.nodes.len();
                    self.nodes.push(ArenaNode {
                        segment: segment.to_string(),
                        kind,
                        children: Vec::new(),
                    });
                    match parent {
                        Some(p) => self.nodes[p].children.push(id),
                        None => self.roots.push(id),
                    }
                    self.index.insert(prefix.clone(), id);
                    id
                }
            };
            parent = Some(id);
        }
    }

    /// Materialize owned nodes / 生成树
    pub fn build(self) -> Vec<TreeNode> {
        self.roots.iter().map(|&id| self.materialize(id)).collect()
    }

    fn materialize(&self, id: usize) -> TreeNode {
        let node = &self.nodes[id];
        TreeNode {
            path: node.segment.clone(),
            kind: node.kind,
            children: node.children.iter().map(|&c| self.materialize(c)).collect(),
        }
    }
}

/// Build a tree from full keys / 从键列表构建树
pub fn build_tree<I, S>(keys: I) -> Vec<TreeNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TreeBuilder::new();
    for key in keys {
        builder.insert(key.as_ref());
    }
    builder.build()
}
