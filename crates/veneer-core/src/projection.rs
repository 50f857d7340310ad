//! Visible-row projection over a lazily loaded tree.
//!
//! Tree and list skins never walk their data model during paint. They keep
//! a [`VisibleRows`]: a flattened, depth-first, parents-before-children
//! sequence of the rows that are currently eligible for rendering (every
//! ancestor expanded; the root is implicitly expanded and never shown
//! itself). Each edit produces a minimal [`RowPatch`] so the skin can turn
//! it into an equally minimal repaint region instead of redrawing the world.
//!
//! Nodes are loaded from the model on first need and kept after a collapse,
//! so re-expanding a branch is instant and remembers which descendants were
//! expanded.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::{SmallVec, smallvec};

new_key_type! {
    pub struct NodeKey;
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        const SELECTED = 1;
        const HIGHLIGHTED = 2;
        const DISABLED = 4;
        // structural bits; only expand/collapse and loading touch these
        const EXPANDED = 8;
        const BRANCH = 16;
        const LOADED = 32;
    }
}

/// Row payload: a stable identity plus the text the renderer shows. Models
/// with richer values key them off `id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeItem {
    pub id: u64,
    pub text: String,
}

impl TreeItem {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Read-side adapter over the host's hierarchical data. The projection pulls
/// items lazily; the host reports edits through the `VisibleRows` ops after
/// mutating the model.
pub trait TreeModel {
    fn root(&self) -> TreeItem;
    fn is_branch(&self, item: &TreeItem) -> bool;
    fn child_count(&self, parent: &TreeItem) -> usize;
    fn child(&self, parent: &TreeItem, index: usize) -> TreeItem;

    /// Identity comparison: same node, possibly with mutated content.
    fn same_item(&self, a: &TreeItem, b: &TreeItem) -> bool {
        a.id == b.id
    }
}

/// Minimal description of how one edit changed the visible sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowPatch {
    Inserted { row: usize, len: usize },
    Removed { row: usize, len: usize },
    Updated { row: usize },
    Reset,
}

pub type Patches = SmallVec<[RowPatch; 2]>;

struct Node {
    parent: Option<NodeKey>,
    depth: u16,
    item: TreeItem,
    flags: NodeFlags,
    children: Vec<NodeKey>,
}

#[derive(Clone, Copy)]
pub struct Row<'a> {
    pub key: NodeKey,
    pub depth: u16,
    pub flags: NodeFlags,
    pub item: &'a TreeItem,
}

impl Row<'_> {
    pub fn is_branch(&self) -> bool {
        self.flags.contains(NodeFlags::BRANCH)
    }

    pub fn is_expanded(&self) -> bool {
        self.flags.contains(NodeFlags::EXPANDED)
    }
}

pub struct VisibleRows {
    model: Rc<dyn TreeModel>,
    arena: SlotMap<NodeKey, Node>,
    root: NodeKey,
    visible: Vec<NodeKey>,
}

impl VisibleRows {
    pub fn new(model: Rc<dyn TreeModel>) -> Self {
        let mut this = Self {
            model,
            arena: SlotMap::with_key(),
            root: NodeKey::default(),
            visible: Vec::new(),
        };
        this.rebuild();
        this
    }

    /// Replaces the backing model wholesale; all expansion state is lost.
    pub fn set_root(&mut self, model: Rc<dyn TreeModel>) -> Patches {
        self.model = model;
        self.rebuild();
        smallvec![RowPatch::Reset]
    }

    fn rebuild(&mut self) {
        self.arena.clear();
        self.visible.clear();
        let item = self.model.root();
        self.root = self.arena.insert(Node {
            parent: None,
            depth: 0,
            item,
            flags: NodeFlags::BRANCH | NodeFlags::EXPANDED,
            children: Vec::new(),
        });
        self.ensure_loaded(self.root);
        self.visible = self.arena[self.root].children.clone();
        log::debug!("visible rows rebuilt: {} top-level rows", self.visible.len());
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// # Panics
    /// Panics when `row` is out of the visible range.
    pub fn row(&self, row: usize) -> Row<'_> {
        assert!(
            row < self.visible.len(),
            "row {row} out of bounds ({} visible)",
            self.visible.len()
        );
        let key = self.visible[row];
        let n = &self.arena[key];
        Row {
            key,
            depth: n.depth,
            flags: n.flags,
            item: &n.item,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.visible.len()).map(|i| self.row(i))
    }

    /// Child-index path from the root down to a visible row.
    pub fn path_of(&self, row: usize) -> Vec<usize> {
        let mut key = self.row(row).key;
        let mut path = Vec::new();
        while let Some(parent) = self.arena[key].parent {
            let index = self.arena[parent]
                .children
                .iter()
                .position(|k| *k == key)
                .expect("child is listed under its parent");
            path.push(index);
            key = parent;
        }
        path.reverse();
        path
    }

    fn new_node(&mut self, parent: NodeKey, depth: u16, item: TreeItem) -> NodeKey {
        let mut flags = NodeFlags::empty();
        if self.model.is_branch(&item) {
            flags.insert(NodeFlags::BRANCH);
        }
        self.arena.insert(Node {
            parent: Some(parent),
            depth,
            item,
            flags,
            children: Vec::new(),
        })
    }

    fn ensure_loaded(&mut self, key: NodeKey) {
        if self.arena[key].flags.contains(NodeFlags::LOADED) {
            return;
        }
        let parent_item = self.arena[key].item.clone();
        let depth = self.arena[key].depth + 1;
        let count = self.model.child_count(&parent_item);
        let mut children = Vec::with_capacity(count);
        for i in 0..count {
            let item = self.model.child(&parent_item, i);
            children.push(self.new_node(key, depth, item));
        }
        let node = &mut self.arena[key];
        node.children = children;
        node.flags.insert(NodeFlags::LOADED);
    }

    /// Resolves a child-index path, loading branches along the way.
    ///
    /// # Panics
    /// Panics when an index is out of bounds or descends through a leaf.
    fn resolve(&mut self, path: &[usize]) -> NodeKey {
        let mut key = self.root;
        for &index in path {
            assert!(
                self.arena[key].flags.contains(NodeFlags::BRANCH),
                "tree path descends through a leaf"
            );
            self.ensure_loaded(key);
            let children = &self.arena[key].children;
            assert!(
                index < children.len(),
                "tree path index {index} out of bounds ({} children)",
                children.len()
            );
            key = children[index];
        }
        key
    }

    fn visible_index(&self, key: NodeKey) -> Option<usize> {
        self.visible.iter().position(|k| *k == key)
    }

    /// All ancestors expanded (the node itself need not be a branch).
    fn ancestors_expanded(&self, key: NodeKey) -> bool {
        let mut cur = self.arena[key].parent;
        while let Some(p) = cur {
            if !self.arena[p].flags.contains(NodeFlags::EXPANDED) {
                return false;
            }
            cur = self.arena[p].parent;
        }
        true
    }

    /// Whether the children of `key` belong in the visible sequence.
    fn shows_children(&self, key: NodeKey) -> bool {
        self.arena[key].flags.contains(NodeFlags::EXPANDED) && self.ancestors_expanded(key)
    }

    /// One past the last row of the visible subtree rooted at `row`.
    fn subtree_end(&self, row: usize) -> usize {
        let depth = self.arena[self.visible[row]].depth;
        let mut end = row + 1;
        while end < self.visible.len() && self.arena[self.visible[end]].depth > depth {
            end += 1;
        }
        end
    }

    /// Marks a branch expanded. When the branch is showing, its children's
    /// visible subtrees are spliced in right after it via a worklist walk, so
    /// descendants that kept their expanded flag across an earlier collapse
    /// reappear in one patch.
    pub fn expand(&mut self, path: &[usize]) -> Patches {
        let key = self.resolve(path);
        assert!(
            self.arena[key].flags.contains(NodeFlags::BRANCH),
            "expand on a leaf node"
        );
        if self.arena[key].flags.contains(NodeFlags::EXPANDED) {
            return Patches::new();
        }
        self.arena[key].flags.insert(NodeFlags::EXPANDED);
        if !self.ancestors_expanded(key) {
            return Patches::new(); // hidden: structure only
        }
        self.ensure_loaded(key);

        let at = match self.visible_index(key) {
            Some(row) => row + 1,
            None => {
                debug_assert!(key == self.root);
                0
            }
        };
        let mut buf: Vec<NodeKey> = Vec::new();
        let mut stack: Vec<NodeKey> = self.arena[key].children.iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            buf.push(k);
            if self.arena[k].flags.contains(NodeFlags::EXPANDED) {
                self.ensure_loaded(k);
                let children = self.arena[k].children.clone();
                stack.extend(children.iter().rev().copied());
            }
        }
        let len = buf.len();
        if len == 0 {
            return Patches::new();
        }
        self.visible.splice(at..at, buf);
        smallvec![RowPatch::Inserted { row: at, len }]
    }

    /// Clears a branch's expanded flag and removes its whole visible subtree
    /// as one contiguous range. Loaded children are retained for instant
    /// re-expansion.
    pub fn collapse(&mut self, path: &[usize]) -> Patches {
        assert!(
            !path.is_empty(),
            "the root is implicitly expanded and cannot collapse"
        );
        let key = self.resolve(path);
        assert!(
            self.arena[key].flags.contains(NodeFlags::BRANCH),
            "collapse on a leaf node"
        );
        if !self.arena[key].flags.contains(NodeFlags::EXPANDED) {
            return Patches::new();
        }
        self.arena[key].flags.remove(NodeFlags::EXPANDED);
        let Some(row) = self.visible_index(key) else {
            return Patches::new();
        };
        let end = self.subtree_end(row);
        let start = row + 1;
        if end == start {
            return Patches::new();
        }
        self.visible.drain(start..end);
        smallvec![RowPatch::Removed {
            row: start,
            len: end - start,
        }]
    }

    /// Expands a collapsed visible branch or collapses an expanded one.
    pub fn toggle(&mut self, row: usize) -> Patches {
        let path = self.path_of(row);
        if self.row(row).is_expanded() {
            self.collapse(&path)
        } else {
            self.expand(&path)
        }
    }

    /// The model grew a child at `index` under `parent_path`; mirror it.
    /// The insertion row accounts for earlier siblings' expanded subtrees by
    /// skipping to the preceding sibling's subtree end.
    pub fn insert_child(&mut self, parent_path: &[usize], index: usize) -> Patches {
        let pkey = self.resolve(parent_path);
        assert!(
            self.arena[pkey].flags.contains(NodeFlags::BRANCH),
            "insert under a leaf node"
        );
        if !self.arena[pkey].flags.contains(NodeFlags::LOADED) {
            return Patches::new(); // children materialize wholesale on first load
        }
        assert!(
            index <= self.arena[pkey].children.len(),
            "insert index out of bounds"
        );
        let parent_item = self.arena[pkey].item.clone();
        let item = self.model.child(&parent_item, index);
        let depth = self.arena[pkey].depth + 1;
        let new_key = self.new_node(pkey, depth, item);
        self.arena[pkey].children.insert(index, new_key);

        if !self.shows_children(pkey) {
            return Patches::new();
        }
        let row = if index == 0 {
            match self.visible_index(pkey) {
                Some(parent_row) => parent_row + 1,
                None => 0, // root
            }
        } else {
            let prev = self.arena[pkey].children[index - 1];
            let prev_row = self
                .visible_index(prev)
                .expect("siblings of a shown child are shown");
            self.subtree_end(prev_row)
        };
        self.visible.insert(row, new_key);
        smallvec![RowPatch::Inserted { row, len: 1 }]
    }

    /// The model dropped `count` children starting at `index`; the visible
    /// range spanning their entire subtrees (expanded descendants included)
    /// comes out as one removal.
    pub fn remove_children(&mut self, parent_path: &[usize], index: usize, count: usize) -> Patches {
        let pkey = self.resolve(parent_path);
        if count == 0 || !self.arena[pkey].flags.contains(NodeFlags::LOADED) {
            return Patches::new();
        }
        let children = &self.arena[pkey].children;
        assert!(
            index + count <= children.len(),
            "remove range {index}..{} out of bounds ({} children)",
            index + count,
            children.len()
        );
        let removed: Vec<NodeKey> = children[index..index + count].to_vec();

        let mut patches = Patches::new();
        if self.shows_children(pkey) {
            let first_row = self
                .visible_index(removed[0])
                .expect("children of a shown branch are shown");
            let last_row = self
                .visible_index(*removed.last().expect("count > 0"))
                .expect("children of a shown branch are shown");
            let end = self.subtree_end(last_row);
            self.visible.drain(first_row..end);
            patches.push(RowPatch::Removed {
                row: first_row,
                len: end - first_row,
            });
        }
        self.arena[pkey].children.drain(index..index + count);
        for key in removed {
            self.dispose(key);
        }
        patches
    }

    /// The model changed the child at `index`. Same identity means an
    /// in-place mutation (one-row repaint); a new identity means the
    /// branch/leaf kind may have changed, so the slot is replaced.
    pub fn update_child(&mut self, parent_path: &[usize], index: usize) -> Patches {
        let pkey = self.resolve(parent_path);
        if !self.arena[pkey].flags.contains(NodeFlags::LOADED) {
            return Patches::new();
        }
        assert!(
            index < self.arena[pkey].children.len(),
            "update index out of bounds"
        );
        let parent_item = self.arena[pkey].item.clone();
        let fresh = self.model.child(&parent_item, index);
        let ckey = self.arena[pkey].children[index];
        if self.model.same_item(&self.arena[ckey].item, &fresh) {
            self.arena[ckey].item = fresh;
            return match self.visible_index(ckey) {
                Some(row) => smallvec![RowPatch::Updated { row }],
                None => Patches::new(),
            };
        }
        let mut patches = self.remove_children(parent_path, index, 1);
        patches.extend(self.insert_child(parent_path, index));
        patches
    }

    /// Flips presentation flags (selected/highlighted/disabled) on a row.
    ///
    /// # Panics
    /// Panics when asked to touch structural flags; expansion changes go
    /// through [`VisibleRows::expand`] / [`VisibleRows::collapse`].
    pub fn set_row_flags(&mut self, row: usize, which: NodeFlags, on: bool) -> Patches {
        assert!(
            !which.intersects(NodeFlags::EXPANDED | NodeFlags::BRANCH | NodeFlags::LOADED),
            "structural flags change through expand/collapse"
        );
        let key = self.row(row).key;
        let flags = &mut self.arena[key].flags;
        let before = *flags;
        flags.set(which, on);
        if *flags == before {
            Patches::new()
        } else {
            smallvec![RowPatch::Updated { row }]
        }
    }

    fn dispose(&mut self, key: NodeKey) {
        let children = std::mem::take(&mut self.arena[key].children);
        for c in children {
            self.dispose(c);
        }
        self.arena.remove(key);
    }

    /// Debug aid: asserts the structural invariants. The visible sequence
    /// must equal a preorder walk of the expanded arena (which rules out
    /// ancestor/descendant interleaving and pins the length), and depths
    /// must be parent + 1.
    pub fn check_invariants(&self) {
        let mut expect = Vec::new();
        let mut stack: Vec<NodeKey> = self.arena[self.root]
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(k) = stack.pop() {
            expect.push(k);
            let n = &self.arena[k];
            if n.flags.contains(NodeFlags::EXPANDED) && n.flags.contains(NodeFlags::LOADED) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        assert_eq!(
            self.visible, expect,
            "visible rows diverge from the expanded-preorder walk"
        );
        for &k in &self.visible {
            let parent = self.arena[k].parent.expect("visible rows are not the root");
            assert_eq!(self.arena[k].depth, self.arena[parent].depth + 1);
        }
    }

    /// Comma-joined row texts; handy in tests and logs.
    pub fn dump(&self) -> String {
        self.rows()
            .map(|r| r.item.text.clone())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// In-memory model, for fixtures and small static trees.

/// Declarative node used to build a [`StaticModel`].
#[derive(Clone, Debug)]
pub struct StaticNode {
    text: String,
    children: Option<Vec<StaticNode>>,
}

impl StaticNode {
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: None,
        }
    }

    pub fn branch(text: impl Into<String>, children: Vec<StaticNode>) -> Self {
        Self {
            text: text.into(),
            children: Some(children),
        }
    }
}

struct Entry {
    id: u64,
    text: String,
    children: Option<Vec<Entry>>,
}

/// Mutable in-memory tree model. Mutators follow the listener discipline:
/// change the model first, then report the edit to the projection.
pub struct StaticModel {
    next_id: Cell<u64>,
    root: RefCell<Entry>,
}

impl StaticModel {
    pub fn new(children: Vec<StaticNode>) -> Rc<Self> {
        let model = Self {
            next_id: Cell::new(1),
            root: RefCell::new(Entry {
                id: 0,
                text: String::new(),
                children: Some(Vec::new()),
            }),
        };
        let built: Vec<Entry> = children.into_iter().map(|n| model.build(n)).collect();
        model.root.borrow_mut().children = Some(built);
        Rc::new(model)
    }

    fn build(&self, node: StaticNode) -> Entry {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Entry {
            id,
            text: node.text,
            children: node
                .children
                .map(|c| c.into_iter().map(|n| self.build(n)).collect()),
        }
    }

    fn with_entry<R>(&self, path: &[usize], f: impl FnOnce(&mut Entry) -> R) -> R {
        let mut root = self.root.borrow_mut();
        let mut entry: &mut Entry = &mut *root;
        for &index in path {
            entry = &mut entry
                .children
                .as_mut()
                .expect("path descends through a leaf")[index];
        }
        f(entry)
    }

    pub fn insert(&self, parent_path: &[usize], index: usize, node: StaticNode) {
        let built = self.build(node);
        self.with_entry(parent_path, |e| {
            e.children
                .as_mut()
                .expect("insert under a leaf")
                .insert(index, built);
        });
    }

    pub fn remove(&self, parent_path: &[usize], index: usize, count: usize) {
        self.with_entry(parent_path, |e| {
            e.children
                .as_mut()
                .expect("remove under a leaf")
                .drain(index..index + count);
        });
    }

    /// In-place mutation: text changes, identity stays.
    pub fn rename(&self, path: &[usize], text: impl Into<String>) {
        self.with_entry(path, |e| e.text = text.into());
    }

    /// Replacement: the slot gets a brand-new identity (and possibly kind).
    pub fn replace(&self, parent_path: &[usize], index: usize, node: StaticNode) {
        let built = self.build(node);
        self.with_entry(parent_path, |e| {
            e.children.as_mut().expect("replace under a leaf")[index] = built;
        });
    }

    pub fn child_count_at(&self, path: &[usize]) -> usize {
        self.with_entry(path, |e| e.children.as_ref().map_or(0, Vec::len))
    }

    fn find<'a>(entry: &'a Entry, id: u64) -> Option<&'a Entry> {
        if entry.id == id {
            return Some(entry);
        }
        entry
            .children
            .as_ref()?
            .iter()
            .find_map(|c| Self::find(c, id))
    }

    fn with_found<R>(&self, id: u64, f: impl FnOnce(&Entry) -> R) -> R {
        let root = self.root.borrow();
        let entry = Self::find(&root, id).expect("item id no longer in the model");
        f(entry)
    }
}

impl TreeModel for StaticModel {
    fn root(&self) -> TreeItem {
        TreeItem::new(0, "")
    }

    fn is_branch(&self, item: &TreeItem) -> bool {
        self.with_found(item.id, |e| e.children.is_some())
    }

    fn child_count(&self, parent: &TreeItem) -> usize {
        self.with_found(parent.id, |e| e.children.as_ref().map_or(0, Vec::len))
    }

    fn child(&self, parent: &TreeItem, index: usize) -> TreeItem {
        self.with_found(parent.id, |e| {
            let c = &e.children.as_ref().expect("child of a leaf")[index];
            TreeItem::new(c.id, c.text.clone())
        })
    }
}
