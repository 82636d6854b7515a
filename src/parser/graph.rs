//! Resolution of the flat Textract block graph into a tree.
//!
//! Textract reports blocks as a flat list linked by `CHILD` relationships.
//! [`BlockGraph`] indexes the list, locates the single PAGE block and walks
//! the relationships into an arena-backed [`ResolvedTree`] whose nodes each
//! have exactly one parent.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::block::{Block, BlockKind};
use super::options::ParseOptions;

/// Index of a node inside a [`ResolvedTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A block placed in the tree.
#[derive(Debug, Clone)]
pub struct ResolvedNode<'a> {
    block: &'a Block,
    children: Vec<NodeId>,
    depth: usize,
}

impl<'a> ResolvedNode<'a> {
    /// The source block.
    pub fn block(&self) -> &'a Block {
        self.block
    }

    /// Block identifier.
    pub fn id(&self) -> &'a str {
        &self.block.id
    }

    /// Block type.
    pub fn kind(&self) -> &'a BlockKind {
        &self.block.block_type
    }

    /// Children in reading order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Distance from the root (root = 0).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Tree of blocks rooted at the PAGE block.
///
/// Nodes are stored in depth-first pre-order; the root is always the first
/// node.
#[derive(Debug, Clone)]
pub struct ResolvedTree<'a> {
    nodes: Vec<ResolvedNode<'a>>,
    blocks: &'a [Block],
    index: HashMap<&'a str, usize>,
}

impl<'a> ResolvedTree<'a> {
    /// The PAGE node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> &ResolvedNode<'a> {
        &self.nodes[id.0]
    }

    /// Children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ResolvedNode<'a>> + '_ {
        self.nodes[id.0].children.iter().map(|c| &self.nodes[c.0])
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a resolved tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ResolvedNode<'a>)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Look up any input block by identifier, placed in the tree or not.
    ///
    /// Cells reference words owned by lines and tables reference merged
    /// cells; those links are followed through here.
    pub fn lookup(&self, id: &str) -> Option<&'a Block> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    /// Count nodes of a given block type.
    pub fn count_kind(&self, kind: &BlockKind) -> usize {
        self.nodes.iter().filter(|n| n.kind() == kind).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    OnPath,
    Done,
}

enum Step {
    Enter {
        block: usize,
        parent: Option<(usize, NodeId)>,
    },
    Exit(usize),
}

/// Identifier index over a block collection.
pub struct BlockGraph<'a> {
    blocks: &'a [Block],
    index: HashMap<&'a str, usize>,
    options: ParseOptions,
}

impl<'a> BlockGraph<'a> {
    /// Index the blocks by identifier.
    pub fn new(blocks: &'a [Block], options: ParseOptions) -> Result<Self> {
        let mut index = HashMap::with_capacity(blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            if index.insert(block.id.as_str(), i).is_some() {
                return Err(Error::DuplicateIdentifier(block.id.clone()));
            }
        }
        Ok(Self {
            blocks,
            index,
            options,
        })
    }

    /// Look up a block by identifier.
    pub fn get(&self, id: &str) -> Option<&'a Block> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    /// Number of indexed blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if there are no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Position of the single PAGE block.
    pub fn find_root(&self) -> Result<usize> {
        let mut pages = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.block_type == BlockKind::Page);

        let (root, first) = pages.next().ok_or(Error::MissingRoot)?;
        if let Some((_, second)) = pages.next() {
            return Err(Error::MultipleRoots {
                count: 2 + pages.count(),
                first: first.id.clone(),
                second: second.id.clone(),
            });
        }
        Ok(root)
    }

    /// Effective child lists, one per block.
    ///
    /// Strict mode keeps every edge and rejects unknown targets. Lenient mode
    /// lets each block keep at most one parent: the claimant deepest in the
    /// page > region > line > word hierarchy, first come first served on ties.
    fn child_lists(&self) -> Result<Vec<Vec<usize>>> {
        let lenient = self.options.is_lenient();
        let mut lists: Vec<Vec<usize>> = vec![Vec::new(); self.blocks.len()];
        let mut owner: Vec<Option<usize>> = vec![None; self.blocks.len()];

        for (parent, block) in self.blocks.iter().enumerate() {
            // merged cells only point at cells their table already lists
            if block.block_type == BlockKind::MergedCell {
                continue;
            }
            for child_id in block.child_ids() {
                let Some(&child) = self.index.get(child_id) else {
                    if lenient {
                        log::warn!(
                            "Dropping reference from {} to unknown block {}",
                            block.id,
                            child_id
                        );
                        continue;
                    }
                    return Err(Error::DanglingReference {
                        parent: block.id.clone(),
                        child: child_id.to_string(),
                    });
                };

                if lists[parent].contains(&child) {
                    log::debug!("Block {} lists child {} twice", block.id, child_id);
                    continue;
                }

                if !lenient {
                    lists[parent].push(child);
                    continue;
                }

                match owner[child] {
                    None => {
                        owner[child] = Some(parent);
                        lists[parent].push(child);
                    }
                    Some(prev) => {
                        let prev_level = self.blocks[prev].block_type.level();
                        if block.block_type.level() > prev_level {
                            log::warn!(
                                "Block {} moves from {} to {}",
                                child_id,
                                self.blocks[prev].id,
                                block.id
                            );
                            lists[prev].retain(|&c| c != child);
                            owner[child] = Some(parent);
                            lists[parent].push(child);
                        } else {
                            log::warn!(
                                "Block {} already belongs to {}, ignoring edge from {}",
                                child_id,
                                self.blocks[prev].id,
                                block.id
                            );
                        }
                    }
                }
            }
        }

        Ok(lists)
    }

    /// Back edge among the blocks the walk from the root never reached.
    fn find_detached_cycle(&self, lists: &[Vec<usize>], state: &[Visit]) -> Option<(usize, usize)> {
        let mut color: Vec<Visit> = state
            .iter()
            .map(|s| match s {
                Visit::Unseen => Visit::Unseen,
                _ => Visit::Done,
            })
            .collect();

        for start in 0..self.blocks.len() {
            if color[start] != Visit::Unseen {
                continue;
            }
            color[start] = Visit::OnPath;
            let mut stack = vec![(start, 0usize)];
            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let Some(&child) = lists[node].get(top.1) else {
                    color[node] = Visit::Done;
                    stack.pop();
                    continue;
                };
                top.1 += 1;
                match color[child] {
                    Visit::OnPath => return Some((node, child)),
                    Visit::Unseen => {
                        color[child] = Visit::OnPath;
                        stack.push((child, 0));
                    }
                    Visit::Done => {}
                }
            }
        }
        None
    }

    /// Resolve the graph into a tree rooted at the PAGE block.
    pub fn resolve(&self) -> Result<ResolvedTree<'a>> {
        let root = self.find_root()?;
        let lists = self.child_lists()?;
        let lenient = self.options.is_lenient();

        let mut state = vec![Visit::Unseen; self.blocks.len()];
        let mut parent_of: Vec<Option<usize>> = vec![None; self.blocks.len()];
        let mut nodes: Vec<ResolvedNode<'a>> = Vec::with_capacity(self.blocks.len());
        let mut stack = vec![Step::Enter {
            block: root,
            parent: None,
        }];

        while let Some(step) = stack.pop() {
            let (block, parent) = match step {
                Step::Exit(block) => {
                    state[block] = Visit::Done;
                    continue;
                }
                Step::Enter { block, parent } => (block, parent),
            };
            let parent_block = parent.map(|(p, _)| p);

            match state[block] {
                Visit::Unseen => {}
                Visit::OnPath => {
                    return Err(Error::CycleDetected {
                        parent: parent_block
                            .map(|p| self.blocks[p].id.clone())
                            .unwrap_or_default(),
                        child: self.blocks[block].id.clone(),
                    });
                }
                Visit::Done => {
                    let first = parent_of[block]
                        .map(|p| self.blocks[p].id.clone())
                        .unwrap_or_default();
                    let second = parent_block
                        .map(|p| self.blocks[p].id.clone())
                        .unwrap_or_default();
                    if lenient {
                        log::warn!(
                            "Block {} already placed under {}, ignoring edge from {}",
                            self.blocks[block].id,
                            first,
                            second
                        );
                        continue;
                    }
                    return Err(Error::SharedChild {
                        child: self.blocks[block].id.clone(),
                        first_parent: first,
                        second_parent: second,
                    });
                }
            }

            state[block] = Visit::OnPath;
            parent_of[block] = parent_block;

            let id = NodeId(nodes.len());
            let depth = match parent {
                Some((_, pid)) => nodes[pid.0].depth + 1,
                None => 0,
            };
            nodes.push(ResolvedNode {
                block: &self.blocks[block],
                children: Vec::new(),
                depth,
            });
            if let Some((_, pid)) = parent {
                nodes[pid.0].children.push(id);
            }

            stack.push(Step::Exit(block));
            for &child in lists[block].iter().rev() {
                stack.push(Step::Enter {
                    block: child,
                    parent: Some((block, id)),
                });
            }
        }

        // merged cells hang off a placed table by reference
        for (i, block) in self.blocks.iter().enumerate() {
            if state[i] == Visit::Unseen {
                continue;
            }
            for merged in block.merged_cell_ids() {
                if let Some(&m) = self.index.get(merged) {
                    if state[m] == Visit::Unseen {
                        state[m] = Visit::Done;
                    }
                }
            }
        }

        // a cycle the walk never entered is still a cycle
        if let Some((parent, child)) = self.find_detached_cycle(&lists, &state) {
            return Err(Error::CycleDetected {
                parent: self.blocks[parent].id.clone(),
                child: self.blocks[child].id.clone(),
            });
        }

        let mut unreachable = self
            .blocks
            .iter()
            .zip(&state)
            .filter(|(_, s)| **s == Visit::Unseen)
            .map(|(b, _)| b.id.as_str());
        if let Some(first) = unreachable.next() {
            let count = 1 + unreachable.count();
            if !lenient {
                return Err(Error::Unreachable {
                    count,
                    first: first.to_string(),
                });
            }
            log::warn!(
                "Skipping {} block(s) not reachable from the PAGE block (first: {})",
                count,
                first
            );
        }

        log::debug!(
            "Resolved {} of {} blocks into a tree",
            nodes.len(),
            self.blocks.len()
        );
        Ok(ResolvedTree {
            nodes,
            blocks: self.blocks,
            index: self.index.clone(),
        })
    }
}

/// Resolve blocks into a tree in one call.
pub fn resolve<'a>(blocks: &'a [Block], options: &ParseOptions) -> Result<ResolvedTree<'a>> {
    BlockGraph::new(blocks, options.clone())?.resolve()
}
