//! 2D R-tree over record bounding rectangles.
//!
//! The index stores nothing but `(rectangle, record id)` pairs; geometry lives
//! in the store. Every answer it gives is a candidate set, a conservative
//! superset that the query layer refines with exact predicates.
//!
//! ## Structure
//!
//! - Leaves hold `(rect, id)` entries, branches hold `(rect, child)` entries,
//!   and each stored rectangle is the tight union of what it covers.
//! - Every non-root node keeps between `min_entries` and `max_entries`
//!   entries; all leaves sit at the same depth.
//!
//! ## Algorithms
//!
//! 1. **Insert**: descend into the child needing the least area enlargement
//!    (ties: smaller area, then lower position). Overflowing nodes are split
//!    with Guttman's quadratic split, the new sibling propagates upward, and
//!    the tree only grows in height at the root.
//! 2. **Delete**: descend through children whose rectangle covers the entry's
//!    rectangle, remove the leaf entry, then condense: any node left under
//!    `min_entries` is cut out and its remaining entries are re-inserted from
//!    the root. A root branch with a single child collapses.
//! 3. **Bulk load**: sort-tile-recursive packing, bottom-up, with group sizes
//!    spread evenly so packed nodes honour the same fan-out bounds.
//!
//! ## Example
//!
//! ```rust
//! use geoquery::compute::spatial::SpatialIndex;
//! use geoquery::RecordId;
//! use geo::{Rect, coord};
//!
//! let mut index = SpatialIndex::new(2, 8)?;
//! for i in 0..100u64 {
//!     let c = coord! { x: i as f64, y: (i % 10) as f64 };
//!     index.insert(RecordId(i), Rect::new(c, c));
//! }
//!
//! let query = Rect::new(coord! { x: 10.0, y: 0.0 }, coord! { x: 12.0, y: 9.0 });
//! let mut hits = index.search(&query);
//! hits.sort();
//! assert_eq!(hits, vec![RecordId(10), RecordId(11), RecordId(12)]);
//! # Ok::<(), geoquery::GeoQueryError>(())
//! ```

use crate::compute::bbox;
use crate::compute::validation::validate_fanout;
use crate::config::Config;
use crate::error::Result;
use geo::Rect;
use geoquery_types::RecordId;
use smallvec::{SmallVec, smallvec};

/// A leaf entry: one record's bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    pub id: RecordId,
    pub rect: Rect,
}

impl IndexEntry {
    pub fn new(id: RecordId, rect: Rect) -> Self {
        Self { id, rect }
    }
}

#[derive(Debug, Clone)]
struct Child {
    rect: Rect,
    node: Box<Node>,
}

impl Child {
    /// Wrap a node, computing its tight rectangle. Empty nodes yield `None`.
    fn wrap(node: Node) -> Option<Child> {
        node.rect().map(|rect| Child {
            rect,
            node: Box::new(node),
        })
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Vec<IndexEntry>),
    Branch(Vec<Child>),
}

impl Node {
    fn len(&self) -> usize {
        match self {
            Node::Leaf(entries) => entries.len(),
            Node::Branch(children) => children.len(),
        }
    }

    fn rect(&self) -> Option<Rect> {
        match self {
            Node::Leaf(entries) => bbox::union_all(entries.iter().map(|e| &e.rect)),
            Node::Branch(children) => bbox::union_all(children.iter().map(|c| &c.rect)),
        }
    }

    /// Move every leaf entry of this subtree into `out`.
    fn drain_into(self, out: &mut Vec<IndexEntry>) {
        match self {
            Node::Leaf(entries) => out.extend(entries),
            Node::Branch(children) => {
                for child in children {
                    child.node.drain_into(out);
                }
            }
        }
    }

    fn count_nodes(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(children) => {
                1 + children.iter().map(|c| c.node.count_nodes()).sum::<usize>()
            }
        }
    }
}

/// Anything the split and packing routines can place by rectangle.
trait Bounded {
    fn bounds(&self) -> Rect;
}

impl Bounded for IndexEntry {
    fn bounds(&self) -> Rect {
        self.rect
    }
}

impl Bounded for Child {
    fn bounds(&self) -> Rect {
        self.rect
    }
}

fn margin(rect: &Rect) -> f64 {
    rect.width() + rect.height()
}

/// Growth of `rect` when extended by `other`: area first, half-perimeter to
/// separate ties between zero-area rectangles.
fn growth(rect: &Rect, other: &Rect) -> (f64, f64) {
    let u = bbox::union(rect, other);
    (bbox::area(&u) - bbox::area(rect), margin(&u) - margin(rect))
}

/// Index of the child needing the least enlargement to take `rect`.
fn choose_subtree(children: &[Child], rect: &Rect) -> usize {
    let mut best = 0;
    let mut best_cost = (f64::INFINITY, f64::INFINITY);
    for (i, child) in children.iter().enumerate() {
        let cost = (
            bbox::enlargement(&child.rect, rect),
            bbox::area(&child.rect),
        );
        if cost < best_cost {
            best_cost = cost;
            best = i;
        }
    }
    best
}

/// Guttman's quadratic split. Both groups end up with at least `min_entries`.
fn quadratic_split<T: Bounded>(mut items: Vec<T>, min_entries: usize) -> (Vec<T>, Vec<T>) {
    let n = items.len();
    let (mut seed_a, mut seed_b) = (0, 1);
    let mut worst = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for i in 0..n {
        let a = items[i].bounds();
        for j in (i + 1)..n {
            let b = items[j].bounds();
            let u = bbox::union(&a, &b);
            let waste = (
                bbox::area(&u) - bbox::area(&a) - bbox::area(&b),
                margin(&u) - margin(&a) - margin(&b),
            );
            if waste > worst {
                worst = waste;
                seed_a = i;
                seed_b = j;
            }
        }
    }

    // seed_a < seed_b, so removing the higher index first keeps seed_a valid.
    let second = items.swap_remove(seed_b);
    let first = items.swap_remove(seed_a);
    let mut rect_a = first.bounds();
    let mut rect_b = second.bounds();
    let mut group_a = vec![first];
    let mut group_b = vec![second];

    while !items.is_empty() {
        if group_a.len() + items.len() <= min_entries {
            group_a.append(&mut items);
            break;
        }
        if group_b.len() + items.len() <= min_entries {
            group_b.append(&mut items);
            break;
        }

        let mut next = 0;
        let mut best_diff = f64::NEG_INFINITY;
        for (i, item) in items.iter().enumerate() {
            let r = item.bounds();
            let diff = (bbox::enlargement(&rect_a, &r) - bbox::enlargement(&rect_b, &r)).abs();
            if diff > best_diff {
                best_diff = diff;
                next = i;
            }
        }

        let item = items.swap_remove(next);
        let r = item.bounds();
        let (ga, gb) = (growth(&rect_a, &r), growth(&rect_b, &r));
        let to_a = if ga != gb {
            ga < gb
        } else if bbox::area(&rect_a) != bbox::area(&rect_b) {
            bbox::area(&rect_a) < bbox::area(&rect_b)
        } else {
            group_a.len() <= group_b.len()
        };

        if to_a {
            rect_a = bbox::union(&rect_a, &r);
            group_a.push(item);
        } else {
            rect_b = bbox::union(&rect_b, &r);
            group_b.push(item);
        }
    }

    (group_a, group_b)
}

/// Insert below `node`; returns the new sibling when `node` had to split.
fn insert_into(
    node: &mut Node,
    entry: IndexEntry,
    min_entries: usize,
    max_entries: usize,
) -> Option<Node> {
    match node {
        Node::Leaf(entries) => {
            entries.push(entry);
            if entries.len() <= max_entries {
                return None;
            }
            let (left, right) = quadratic_split(std::mem::take(entries), min_entries);
            log::debug!("Split leaf into {} + {} entries", left.len(), right.len());
            *entries = left;
            Some(Node::Leaf(right))
        }
        Node::Branch(children) => {
            let idx = choose_subtree(children, &entry.rect);
            let sibling = insert_into(&mut children[idx].node, entry, min_entries, max_entries);

            let Some(sibling) = sibling else {
                children[idx].rect = bbox::union(&children[idx].rect, &entry.rect);
                return None;
            };

            if let Some(rect) = children[idx].node.rect() {
                children[idx].rect = rect;
            }
            children.extend(Child::wrap(sibling));
            if children.len() <= max_entries {
                return None;
            }
            let (left, right) = quadratic_split(std::mem::take(children), min_entries);
            log::debug!(
                "Split branch into {} + {} children",
                left.len(),
                right.len()
            );
            *children = left;
            Some(Node::Branch(right))
        }
    }
}

/// Remove `id` below `node`, cutting out underfull descendants into `orphans`.
fn remove_from(
    node: &mut Node,
    id: RecordId,
    rect: &Rect,
    min_entries: usize,
    orphans: &mut Vec<IndexEntry>,
) -> bool {
    match node {
        Node::Leaf(entries) => match entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                entries.remove(pos);
                true
            }
            None => false,
        },
        Node::Branch(children) => {
            for i in 0..children.len() {
                if !bbox::contains_rect(&children[i].rect, rect) {
                    continue;
                }
                if !remove_from(&mut children[i].node, id, rect, min_entries, orphans) {
                    continue;
                }

                if children[i].node.len() < min_entries {
                    let underfull = children.remove(i);
                    let before = orphans.len();
                    underfull.node.drain_into(orphans);
                    log::debug!(
                        "Condensed underfull node; {} entries queued for reinsertion",
                        orphans.len() - before
                    );
                } else if let Some(rect) = children[i].node.rect() {
                    children[i].rect = rect;
                }
                return true;
            }
            false
        }
    }
}

/// Split `items` into `parts` consecutive runs whose sizes differ by at most one.
fn split_even<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    let n = items.len();
    let parts = parts.clamp(1, n.max(1));
    let (base, extra) = (n / parts, n % parts);
    let mut iter = items.into_iter();
    (0..parts)
        .map(|i| iter.by_ref().take(base + usize::from(i < extra)).collect())
        .collect()
}

/// Sort-tile-recursive grouping of one tree level.
fn pack<T: Bounded>(mut items: Vec<T>, max_entries: usize) -> Vec<Vec<T>> {
    let groups = items.len().div_ceil(max_entries);
    let mut slices = 1usize;
    while slices * slices < groups {
        slices += 1;
    }

    let by_x = |a: &T, b: &T| {
        bbox::center(&a.bounds())
            .x
            .partial_cmp(&bbox::center(&b.bounds()).x)
            .unwrap_or(std::cmp::Ordering::Equal)
    };
    let by_y = |a: &T, b: &T| {
        bbox::center(&a.bounds())
            .y
            .partial_cmp(&bbox::center(&b.bounds()).y)
            .unwrap_or(std::cmp::Ordering::Equal)
    };

    items.sort_by(by_x);
    let mut out = Vec::with_capacity(groups);
    for mut slice in split_even(items, slices) {
        slice.sort_by(by_y);
        let chunks = slice.len().div_ceil(max_entries);
        out.extend(split_even(slice, chunks));
    }
    out
}

/// R-tree over `(rectangle, id)` pairs.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    root: Node,
    /// Number of levels; 1 when the root is a leaf
    height: usize,
    len: usize,
    min_entries: usize,
    max_entries: usize,
}

impl SpatialIndex {
    /// Create an empty index.
    ///
    /// Fails with `InvalidConfig` unless `min_entries` is at least one and
    /// `max_entries` at least `2 * min_entries`.
    pub fn new(min_entries: usize, max_entries: usize) -> Result<Self> {
        validate_fanout(min_entries, max_entries)?;
        Ok(Self::empty(min_entries, max_entries))
    }

    pub fn with_config(config: &Config) -> Result<Self> {
        Self::new(config.min_entries, config.max_entries)
    }

    fn empty(min_entries: usize, max_entries: usize) -> Self {
        Self {
            root: Node::Leaf(Vec::new()),
            height: 1,
            len: 0,
            min_entries,
            max_entries,
        }
    }

    /// Build a packed tree from `entries` in one pass. Fan-out bounds are
    /// checked as in [`SpatialIndex::new`].
    pub fn bulk_load(
        min_entries: usize,
        max_entries: usize,
        entries: Vec<IndexEntry>,
    ) -> Result<Self> {
        let mut index = Self::new(min_entries, max_entries)?;
        let len = entries.len();
        if len <= max_entries {
            index.root = Node::Leaf(entries);
            index.len = len;
            return Ok(index);
        }

        let mut level: Vec<Node> = pack(entries, max_entries)
            .into_iter()
            .map(Node::Leaf)
            .collect();
        let mut height = 1;
        while level.len() > max_entries {
            let children: Vec<Child> = level.into_iter().filter_map(Child::wrap).collect();
            level = pack(children, max_entries)
                .into_iter()
                .map(Node::Branch)
                .collect();
            height += 1;
        }

        index.root = if level.len() == 1 {
            level.pop().unwrap_or(Node::Leaf(Vec::new()))
        } else {
            height += 1;
            Node::Branch(level.into_iter().filter_map(Child::wrap).collect())
        };
        index.height = height;
        index.len = len;
        log::debug!(
            "Bulk loaded {} entries into a tree of height {}",
            len,
            height
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    /// Rectangle covering every indexed entry, `None` when empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.root.rect()
    }

    pub fn clear(&mut self) {
        self.root = Node::Leaf(Vec::new());
        self.height = 1;
        self.len = 0;
    }

    /// Insert an entry. The caller guarantees `id` is not already present.
    pub fn insert(&mut self, id: RecordId, rect: Rect) {
        let entry = IndexEntry::new(id, rect);
        let split = insert_into(&mut self.root, entry, self.min_entries, self.max_entries);
        if let Some(sibling) = split {
            let old_root = std::mem::replace(&mut self.root, Node::Leaf(Vec::new()));
            let children: Vec<Child> = [old_root, sibling]
                .into_iter()
                .filter_map(Child::wrap)
                .collect();
            self.root = Node::Branch(children);
            self.height += 1;
            log::debug!("Root split; tree height is now {}", self.height);
        }
        self.len += 1;
    }

    /// Remove the entry for `id`, which must have been inserted with `rect`.
    /// Returns `false` when no such entry exists.
    pub fn delete(&mut self, id: RecordId, rect: &Rect) -> bool {
        let mut orphans = Vec::new();
        if !remove_from(&mut self.root, id, rect, self.min_entries, &mut orphans) {
            return false;
        }
        self.len -= 1 + orphans.len();
        self.collapse_root();
        for orphan in orphans {
            self.insert(orphan.id, orphan.rect);
        }
        true
    }

    fn collapse_root(&mut self) {
        while matches!(&self.root, Node::Branch(children) if children.len() <= 1) {
            let old_root = std::mem::replace(&mut self.root, Node::Leaf(Vec::new()));
            if let Node::Branch(mut children) = old_root
                && let Some(only) = children.pop()
            {
                self.root = *only.node;
                self.height -= 1;
                log::debug!("Root collapsed; tree height is now {}", self.height);
            } else {
                self.height = 1;
            }
        }
    }

    /// Ids of every entry whose rectangle intersects `query` (closed).
    /// Order is unspecified.
    pub fn search(&self, query: &Rect) -> Vec<RecordId> {
        let mut out = Vec::new();
        let mut stack: SmallVec<[&Node; 32]> = smallvec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(entries) => out.extend(
                    entries
                        .iter()
                        .filter(|e| bbox::intersects(&e.rect, query))
                        .map(|e| e.id),
                ),
                Node::Branch(children) => stack.extend(
                    children
                        .iter()
                        .filter(|c| bbox::intersects(&c.rect, query))
                        .map(|c| c.node.as_ref()),
                ),
            }
        }
        out
    }

    /// Every entry in the index, in tree order.
    pub fn entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: SmallVec<[&Node; 32]> = smallvec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(entries) => out.extend_from_slice(entries),
                Node::Branch(children) => stack.extend(children.iter().map(|c| c.node.as_ref())),
            }
        }
        out
    }
}

impl Default for SpatialIndex {
    /// Empty index with the default fan-out of [`Config`].
    fn default() -> Self {
        Self::empty(Config::DEFAULT_MIN_ENTRIES, Config::DEFAULT_MAX_ENTRIES)
    }
}
