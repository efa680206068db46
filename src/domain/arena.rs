//! Arena-backed forest of administrative divisions.
//!
//! Nodes live in a generational arena and are addressed from the outside by
//! [`DivisionId`]. Every node keeps an explicit parent pointer and a child list
//! sorted by name, plus nested-set bounds (`tree`, `lft`, `rgt`) and `depth`.
//! Bounds are scoped per tree: a mutation renumbers only the trees it touches.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::entities::{
    validate_name, Division, DivisionId, DivisionRecord, SubtreeBounds, DIVISION_NAME_MAX,
};
use crate::domain::error::{DomainError, DomainResult, EntityKind};

#[derive(Debug, Clone)]
struct TreeNode {
    id: DivisionId,
    name: String,
    /// Index of parent node in the arena, None for root nodes
    parent: Option<Index>,
    /// Child indices, kept sorted by name
    children: Vec<Index>,
    depth: u32,
    tree: DivisionId,
    lft: u32,
    rgt: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TreeNode {
    fn bounds(&self) -> SubtreeBounds {
        SubtreeBounds {
            tree: self.tree,
            lft: self.lft,
            rgt: self.rgt,
        }
    }
}

/// Forest of divisions with name-ordered children and nested-set bounds.
#[derive(Debug, Clone)]
pub struct DivisionForest {
    arena: Arena<TreeNode>,
    ids: HashMap<DivisionId, Index>,
    names: HashMap<String, DivisionId>,
    /// Root indices, kept sorted by name
    roots: Vec<Index>,
    last_id: u64,
}

impl Default for DivisionForest {
    fn default() -> Self {
        Self::new()
    }
}

impl DivisionForest {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            ids: HashMap::new(),
            names: HashMap::new(),
            roots: Vec::new(),
            last_id: 0,
        }
    }

    /// Rebuild a forest from flat rows. Rows may come in any order.
    pub fn from_records(records: Vec<DivisionRecord>) -> DomainResult<Self> {
        let mut forest = Self::new();
        let mut pending = records;
        while !pending.is_empty() {
            let before = pending.len();
            let (ready, waiting): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|r| r.parent_id.map_or(true, |p| forest.contains(p)));
            for record in ready {
                forest.restore(record)?;
            }
            pending = waiting;
            if pending.len() == before {
                // Dangling parent reference or a cycle in the rows
                let orphan = &pending[0];
                let parent = orphan.parent_id.unwrap_or(orphan.id);
                return Err(DomainError::not_found(EntityKind::Division, parent));
            }
        }
        debug!("from_records: restored {} divisions", forest.len());
        Ok(forest)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Highest id ever handed out, deleted divisions included.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Never hand out an id at or below `floor`.
    pub fn reserve_ids_through(&mut self, floor: u64) {
        self.last_id = self.last_id.max(floor);
    }

    pub fn contains(&self, id: DivisionId) -> bool {
        self.ids.contains_key(&id)
    }

    pub fn get(&self, id: DivisionId) -> DomainResult<Division> {
        let idx = self.index_of(id)?;
        Ok(self.snapshot(idx))
    }

    pub fn find_by_name(&self, name: &str) -> Option<Division> {
        self.names
            .get(name.trim())
            .and_then(|id| self.ids.get(id))
            .map(|&idx| self.snapshot(idx))
    }

    /// Divisions from the root down to `id`, inclusive.
    #[instrument(level = "trace", skip(self))]
    pub fn path(&self, id: DivisionId) -> DomainResult<Vec<Division>> {
        let mut current = Some(self.index_of(id)?);
        let mut path = Vec::new();
        while let Some(idx) = current {
            path.push(self.snapshot(idx));
            current = self.arena[idx].parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Root-to-node names joined by `/`, e.g. `China/Zhejiang/Hangzhou`.
    pub fn display_path(&self, id: DivisionId) -> DomainResult<String> {
        let names: Vec<String> = self.path(id)?.into_iter().map(|d| d.name).collect();
        Ok(names.join("/"))
    }

    /// Direct children ordered by name.
    pub fn children(&self, id: DivisionId) -> DomainResult<Vec<Division>> {
        let idx = self.index_of(id)?;
        Ok(self.arena[idx]
            .children
            .iter()
            .map(|&c| self.snapshot(c))
            .collect())
    }

    /// Root divisions ordered by name.
    pub fn roots(&self) -> Vec<Division> {
        self.roots.iter().map(|&r| self.snapshot(r)).collect()
    }

    /// Strict descendant test answered from the nested-set bounds.
    pub fn is_descendant_of(
        &self,
        candidate: DivisionId,
        ancestor: DivisionId,
    ) -> DomainResult<bool> {
        let candidate = self.arena[self.index_of(candidate)?].bounds();
        let ancestor = self.arena[self.index_of(ancestor)?].bounds();
        Ok(ancestor.strictly_contains(&candidate))
    }

    /// All divisions below `id` in display order, excluding `id` itself.
    pub fn descendants(&self, id: DivisionId) -> DomainResult<Vec<Division>> {
        let idx = self.index_of(id)?;
        Ok(self
            .subtree_indices(idx)
            .into_iter()
            .skip(1)
            .map(|i| self.snapshot(i))
            .collect())
    }

    /// Whole forest in display order: roots by name, each tree in pre-order.
    pub fn iter(&self) -> DepthFirst<'_> {
        DepthFirst::new(self, self.roots.iter().rev().copied().collect())
    }

    /// Flat rows in display order, parents always before their children.
    pub fn records(&self) -> Vec<DivisionRecord> {
        self.iter().map(|d| DivisionRecord::from(&d)).collect()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn insert(&mut self, name: &str, parent: Option<DivisionId>) -> DomainResult<Division> {
        let name = validate_name(name, DIVISION_NAME_MAX)?;
        if self.names.contains_key(&name) {
            return Err(DomainError::DuplicateName(name));
        }
        let parent_idx = parent.map(|p| self.index_of(p)).transpose()?;

        self.last_id += 1;
        let id = DivisionId(self.last_id);
        let now = Utc::now();
        let idx = self.attach_new(id, name, parent_idx, now, now);
        Ok(self.snapshot(idx))
    }

    /// Re-insert a persisted row keeping its id and timestamps.
    pub fn restore(&mut self, record: DivisionRecord) -> DomainResult<Division> {
        let name = validate_name(&record.name, DIVISION_NAME_MAX)?;
        if self.ids.contains_key(&record.id) {
            return Err(DomainError::DuplicateId {
                kind: EntityKind::Division,
                id: record.id.0,
            });
        }
        if self.names.contains_key(&name) {
            return Err(DomainError::DuplicateName(name));
        }
        let parent_idx = record.parent_id.map(|p| self.index_of(p)).transpose()?;

        self.last_id = self.last_id.max(record.id.0);
        let idx = self.attach_new(
            record.id,
            name,
            parent_idx,
            record.created_at,
            record.updated_at,
        );
        Ok(self.snapshot(idx))
    }

    /// Re-parent `id` under `new_parent` (or make it a root).
    #[instrument(level = "debug", skip(self))]
    pub fn move_to(
        &mut self,
        id: DivisionId,
        new_parent: Option<DivisionId>,
    ) -> DomainResult<Division> {
        let idx = self.index_of(id)?;
        let parent_idx = new_parent.map(|p| self.index_of(p)).transpose()?;

        if let (Some(p), Some(target)) = (parent_idx, new_parent) {
            if p == idx || self.arena[idx].bounds().strictly_contains(&self.arena[p].bounds()) {
                return Err(DomainError::CycleDetected {
                    node: id.0,
                    target: target.0,
                });
            }
        }
        if self.arena[idx].parent == parent_idx {
            debug!("move_to: {} already under {:?}", id, new_parent);
            return Ok(self.snapshot(idx));
        }

        let old_root = self.tree_root(idx);
        self.unlink(idx);
        self.link(idx, parent_idx);
        self.arena[idx].updated_at = Utc::now();

        let new_root = self.tree_root(idx);
        if old_root != idx && old_root != new_root {
            self.renumber(old_root);
        }
        self.renumber(new_root);
        Ok(self.snapshot(idx))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, id: DivisionId, new_name: &str) -> DomainResult<Division> {
        let idx = self.index_of(id)?;
        let new_name = validate_name(new_name, DIVISION_NAME_MAX)?;
        if self.arena[idx].name == new_name {
            return Ok(self.snapshot(idx));
        }
        if self.names.contains_key(&new_name) {
            return Err(DomainError::DuplicateName(new_name));
        }

        let old_name = std::mem::replace(&mut self.arena[idx].name, new_name.clone());
        self.names.remove(&old_name);
        self.names.insert(new_name, id);
        self.arena[idx].updated_at = Utc::now();

        // Sibling order depends on the name
        let parent = self.arena[idx].parent;
        self.unlink(idx);
        self.link(idx, parent);
        let root = self.tree_root(idx);
        self.renumber(root);
        Ok(self.snapshot(idx))
    }

    /// Remove `id` and its whole subtree. Returns the removed divisions in
    /// display order, `id` first.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: DivisionId) -> DomainResult<Vec<Division>> {
        let idx = self.index_of(id)?;
        let subtree = self.subtree_indices(idx);
        let removed: Vec<Division> = subtree.iter().map(|&i| self.snapshot(i)).collect();

        let root = self.tree_root(idx);
        self.unlink(idx);
        for i in subtree {
            if let Some(node) = self.arena.remove(i) {
                self.ids.remove(&node.id);
                self.names.remove(&node.name);
            }
        }
        if root != idx {
            self.renumber(root);
        }
        debug!("remove: {} divisions removed", removed.len());
        Ok(removed)
    }

    fn index_of(&self, id: DivisionId) -> DomainResult<Index> {
        self.ids
            .get(&id)
            .copied()
            .ok_or_else(|| DomainError::not_found(EntityKind::Division, id))
    }

    fn snapshot(&self, idx: Index) -> Division {
        let node = &self.arena[idx];
        Division {
            id: node.id,
            name: node.name.clone(),
            parent_id: node.parent.map(|p| self.arena[p].id),
            created_at: node.created_at,
            updated_at: node.updated_at,
            depth: node.depth,
            bounds: node.bounds(),
        }
    }

    fn attach_new(
        &mut self,
        id: DivisionId,
        name: String,
        parent: Option<Index>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Index {
        let node = TreeNode {
            id,
            name: name.clone(),
            parent: None,
            children: Vec::new(),
            depth: 0,
            tree: id,
            lft: 1,
            rgt: 2,
            created_at,
            updated_at,
        };
        let idx = self.arena.insert(node);
        self.ids.insert(id, idx);
        self.names.insert(name, id);
        self.link(idx, parent);

        let root = self.tree_root(idx);
        self.renumber(root);
        idx
    }

    /// Insert `idx` into the sibling list of `parent` at its name position.
    fn link(&mut self, idx: Index, parent: Option<Index>) {
        let name = self.arena[idx].name.clone();
        let siblings = match parent {
            Some(p) => &self.arena[p].children,
            None => &self.roots,
        };
        let pos = siblings.partition_point(|&s| self.arena[s].name < name);
        match parent {
            Some(p) => self.arena[p].children.insert(pos, idx),
            None => self.roots.insert(pos, idx),
        }
        self.arena[idx].parent = parent;
    }

    fn unlink(&mut self, idx: Index) {
        match self.arena[idx].parent {
            Some(p) => self.arena[p].children.retain(|&c| c != idx),
            None => self.roots.retain(|&r| r != idx),
        }
        self.arena[idx].parent = None;
    }

    fn tree_root(&self, mut idx: Index) -> Index {
        while let Some(parent) = self.arena[idx].parent {
            idx = parent;
        }
        idx
    }

    fn subtree_indices(&self, idx: Index) -> Vec<Index> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            out.push(current);
            // Push children in reverse order for name-ordered traversal
            stack.extend(self.arena[current].children.iter().rev().copied());
        }
        out
    }

    /// Assign `tree`, `depth`, `lft` and `rgt` for every node under `root`.
    fn renumber(&mut self, root: Index) {
        let tree = self.arena[root].id;
        let mut counter = 0u32;
        let mut stack: Vec<(Index, u32, bool)> = vec![(root, 0, false)];
        while let Some((idx, depth, visited)) = stack.pop() {
            counter += 1;
            let node = &mut self.arena[idx];
            if visited {
                node.rgt = counter;
                continue;
            }
            node.lft = counter;
            node.depth = depth;
            node.tree = tree;
            stack.push((idx, depth, true));
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1, false));
            }
        }
        debug!("renumber: tree {} has {} nodes", tree, counter / 2);
    }
}

/// Pre-order iterator over divisions, children visited in name order.
pub struct DepthFirst<'a> {
    forest: &'a DivisionForest,
    stack: Vec<Index>,
}

impl<'a> DepthFirst<'a> {
    fn new(forest: &'a DivisionForest, stack: Vec<Index>) -> Self {
        Self { forest, stack }
    }
}

impl Iterator for DepthFirst<'_> {
    type Item = Division;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = self.forest.arena.get(current)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some(self.forest.snapshot(current))
    }
}
