//! An array-backed B-tree vector.
//!
//! This is the indexed store behind the live bracket set: positional
//! `insert`/`remove` in `O(B log n)`, plus cheap in-order range iteration.
//! Elements are owned by the tree and addressed by index only, so there are
//! no aliased mutable references for callers to misuse.

use arrayvec::ArrayVec;

#[derive(Clone, Debug)]
pub struct TreeVec<T, const B: usize> {
    root: Box<Node<T, B>>,
    len: usize,
}

#[derive(Clone, Debug)]
enum Node<T, const B: usize> {
    Leaf {
        data: ArrayVec<T, B>,
    },
    Internal {
        size: ArrayVec<usize, B>,
        children: ArrayVec<Box<Node<T, B>>, B>,
    },
}

enum Insertion<T, const B: usize> {
    Fit,
    Split(Box<Node<T, B>>),
}

enum Removal {
    Fit,
    Underflow,
}

enum Merge {
    Absorbed,
    Rebalanced,
}

/// Finds the child holding `offset`, returning its index and the offset
/// relative to that child.
fn child_at(sizes: &[usize], mut offset: usize) -> Option<(usize, usize)> {
    for (idx, &size) in sizes.iter().enumerate() {
        if size > offset {
            return Some((idx, offset));
        }
        offset -= size;
    }
    None
}

impl<T, const B: usize> Node<T, B> {
    fn subtree_size(&self) -> usize {
        match self {
            Node::Leaf { data } => data.len(),
            Node::Internal { size, .. } => size.iter().copied().sum(),
        }
    }

    fn get(&self, offset: usize) -> Option<&T> {
        match self {
            Node::Leaf { data } => data.get(offset),
            Node::Internal { size, children } => {
                let (idx, offset) = child_at(size, offset)?;
                children[idx].get(offset)
            }
        }
    }

    fn get_mut(&mut self, offset: usize) -> Option<&mut T> {
        match self {
            Node::Leaf { data } => data.get_mut(offset),
            Node::Internal { size, children } => {
                let (idx, offset) = child_at(size, offset)?;
                children[idx].get_mut(offset)
            }
        }
    }

    fn insert(&mut self, offset: usize, element: T) -> Insertion<T, B> {
        match self {
            Node::Leaf { data } => {
                if data.is_full() {
                    let mut right: ArrayVec<T, B> = data.drain(B / 2..).collect();
                    if offset <= B / 2 {
                        data.insert(offset, element);
                    } else {
                        right.insert(offset - B / 2, element);
                    }
                    Insertion::Split(Box::new(Node::Leaf { data: right }))
                } else {
                    data.insert(offset, element);
                    Insertion::Fit
                }
            }
            Node::Internal { size, children } => {
                // An insertion at a child boundary goes into the left child,
                // hence the offset shuffling.
                let (idx, offset) = if offset > 0 {
                    // unwrap: if this fails, it's out-of-bounds
                    let (idx, offset) = child_at(size, offset - 1).unwrap();
                    (idx, offset + 1)
                } else {
                    (0, 0)
                };
                match children[idx].insert(offset, element) {
                    Insertion::Fit => {
                        size[idx] += 1;
                        Insertion::Fit
                    }
                    Insertion::Split(node) => {
                        size[idx] = children[idx].subtree_size();

                        if children.is_full() {
                            let mut right_children: ArrayVec<_, B> =
                                children.drain(B / 2..).collect();
                            let mut right_size: ArrayVec<_, B> = size.drain(B / 2..).collect();
                            if idx < B / 2 {
                                size.insert(idx + 1, node.subtree_size());
                                children.insert(idx + 1, node);
                            } else {
                                right_size.insert(idx + 1 - B / 2, node.subtree_size());
                                right_children.insert(idx + 1 - B / 2, node);
                            }
                            Insertion::Split(Box::new(Node::Internal {
                                size: right_size,
                                children: right_children,
                            }))
                        } else {
                            size.insert(idx + 1, node.subtree_size());
                            children.insert(idx + 1, node);
                            Insertion::Fit
                        }
                    }
                }
            }
        }
    }

    fn merge_from_right(&mut self, right_sibling: &mut Node<T, B>) -> Merge {
        match (self, right_sibling) {
            (Node::Leaf { data: left }, Node::Leaf { data: right }) => {
                debug_assert!(right.len() >= left.len());
                if left.len() + right.len() <= B {
                    left.extend(right.drain(..));
                    Merge::Absorbed
                } else {
                    let count = (right.len() - left.len()) / 2;
                    debug_assert!(count > 0);
                    left.extend(right.drain(..count));
                    Merge::Rebalanced
                }
            }
            (
                Node::Internal {
                    size: left_size,
                    children: left_children,
                },
                Node::Internal {
                    size: right_size,
                    children: right_children,
                },
            ) => {
                if left_children.len() + right_children.len() <= B {
                    left_size.extend(right_size.drain(..));
                    left_children.extend(right_children.drain(..));
                    Merge::Absorbed
                } else {
                    let count = (right_children.len() - left_children.len()) / 2;
                    debug_assert!(count > 0);
                    left_children.extend(right_children.drain(..count));
                    left_size.extend(right_size.drain(..count));
                    Merge::Rebalanced
                }
            }
            _ => unreachable!(),
        }
    }

    fn merge_from_left(&mut self, left_sibling: &mut Node<T, B>) -> Merge {
        match (left_sibling, self) {
            (Node::Leaf { data: left }, Node::Leaf { data: right }) => {
                debug_assert!(right.len() <= left.len());
                if left.len() + right.len() <= B {
                    left.extend(right.drain(..));
                    std::mem::swap(left, right);
                    Merge::Absorbed
                } else {
                    // Unlike merge_from_right, here we only move a single
                    // element from the left to the right. Safe rust makes it
                    // tricky to efficiently move more; ideally we'd also be
                    // rebalancing here.
                    right.insert(0, left.pop().unwrap());
                    Merge::Rebalanced
                }
            }
            (
                Node::Internal {
                    size: left_size,
                    children: left_children,
                },
                Node::Internal {
                    size: right_size,
                    children: right_children,
                },
            ) => {
                if left_children.len() + right_children.len() <= B {
                    left_size.extend(right_size.drain(..));
                    left_children.extend(right_children.drain(..));
                    std::mem::swap(left_children, right_children);
                    std::mem::swap(left_size, right_size);
                    Merge::Absorbed
                } else {
                    right_children.insert(0, left_children.pop().unwrap());
                    right_size.insert(0, left_size.pop().unwrap());
                    Merge::Rebalanced
                }
            }
            _ => unreachable!(),
        }
    }

    fn remove(&mut self, offset: usize) -> Removal {
        match self {
            Node::Leaf { data } => {
                data.remove(offset);
                if data.len() < B / 2 {
                    Removal::Underflow
                } else {
                    Removal::Fit
                }
            }
            Node::Internal { size, children } => {
                let (idx, offset) = child_at(size, offset).unwrap();
                size[idx] -= 1;
                match children[idx].remove(offset) {
                    Removal::Fit => Removal::Fit,
                    Removal::Underflow => {
                        if idx + 1 < children.len() {
                            let (a, b) = children.split_at_mut(idx + 1);
                            let cur = a.last_mut().unwrap();
                            let next = b.first_mut().unwrap();

                            match cur.merge_from_right(next) {
                                Merge::Absorbed => {
                                    size[idx] = cur.subtree_size();
                                    children.remove(idx + 1);
                                    size.remove(idx + 1);
                                    if children.len() < B / 2 {
                                        Removal::Underflow
                                    } else {
                                        Removal::Fit
                                    }
                                }
                                Merge::Rebalanced => {
                                    size[idx] = cur.subtree_size();
                                    size[idx + 1] = next.subtree_size();
                                    Removal::Fit
                                }
                            }
                        } else {
                            debug_assert!(idx > 0);

                            let (a, b) = children.split_at_mut(idx);
                            let prev = a.last_mut().unwrap();
                            let cur = b.first_mut().unwrap();

                            match cur.merge_from_left(prev) {
                                Merge::Absorbed => {
                                    size[idx] = cur.subtree_size();
                                    children.remove(idx - 1);
                                    size.remove(idx - 1);
                                    if children.len() < B / 2 {
                                        Removal::Underflow
                                    } else {
                                        Removal::Fit
                                    }
                                }
                                Merge::Rebalanced => {
                                    size[idx - 1] = prev.subtree_size();
                                    size[idx] = cur.subtree_size();
                                    Removal::Fit
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn check_invariants(&self, is_root: bool) {
        match self {
            Node::Leaf { data } => {
                if !is_root {
                    assert!(data.len() >= B / 2);
                }
            }
            Node::Internal { size, children } => {
                assert_eq!(size.len(), children.len());
                if !is_root {
                    assert!(size.len() >= B / 2);
                }
                for (child, size) in children.iter().zip(size) {
                    assert_eq!(child.subtree_size(), *size);
                    child.check_invariants(false);
                }
            }
        }
    }
}

impl<T, const B: usize> Default for TreeVec<T, B> {
    fn default() -> Self {
        Self {
            root: Box::new(Node::Leaf {
                data: ArrayVec::new(),
            }),
            len: 0,
        }
    }
}

impl<T, const B: usize> TreeVec<T, B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.root.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.root.get_mut(index)
    }

    /// Inserts `element` before position `index`.
    ///
    /// Panics if `index > self.len()`.
    pub fn insert(&mut self, index: usize, element: T) {
        if let Insertion::Split(node) = self.root.insert(index, element) {
            // The old root splits in two; both halves become children of a
            // fresh root.
            let mut old_root = Box::new(Node::Internal {
                size: ArrayVec::new(),
                children: ArrayVec::new(),
            });
            std::mem::swap(&mut old_root, &mut self.root);

            let Node::Internal { size, children } = &mut *self.root else {
                unreachable!();
            };
            size.push(old_root.subtree_size());
            size.push(node.subtree_size());
            children.push(old_root);
            children.push(node);
        }
        self.len += 1;
    }

    /// Removes the element at `index`.
    ///
    /// Panics if `index >= self.len()`.
    pub fn remove(&mut self, index: usize) {
        self.root.remove(index);
        self.len -= 1;

        if let Node::Internal { children, .. } = &mut *self.root {
            if children.len() == 1 {
                // unwrap: an internal node always has children
                self.root = children.pop().unwrap();
            }
        }
    }

    /// The index of the partition point according to the given predicate (the
    /// index of the first element for which the predicate is false).
    ///
    /// Like `slice::partition_point`, all elements satisfying the predicate
    /// must sit before all elements failing it.
    pub fn partition_point<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        if let Node::Leaf { data } = &*self.root {
            return data.partition_point(pred);
        }

        // A plain binary search over positions; each probe costs a tree
        // descent, so this is O(log^2 n).
        let mut end = self.len();
        if end == 0 {
            return 0;
        }
        let mut start = 0usize;

        while end > start + 1 {
            let mid = (start + end) / 2;
            if pred(&self[mid]) {
                start = mid;
            } else {
                end = mid;
            }
        }
        if pred(&self[start]) {
            start + 1
        } else {
            start
        }
    }

    pub fn iter(&self) -> Iter<'_, T, B> {
        self.range(..)
    }

    pub fn range(&self, range: impl std::ops::RangeBounds<usize>) -> Iter<'_, T, B> {
        let (start, end) = self.resolve(range);
        let mut ret = Iter {
            stack: Vec::new(),
            leaf: [].iter(),
            remaining: end - start,
        };
        ret.descend_to(&*self.root, start);
        ret
    }

    pub fn range_mut(&mut self, range: impl std::ops::RangeBounds<usize>) -> IterMut<'_, T, B> {
        let (start, end) = self.resolve(range);
        let mut ret = IterMut {
            stack: Vec::new(),
            leaf: [].iter_mut(),
            remaining: end - start,
        };
        ret.descend_to(&mut *self.root, start);
        ret
    }

    fn resolve(&self, range: impl std::ops::RangeBounds<usize>) -> (usize, usize) {
        let start = match range.start_bound() {
            std::ops::Bound::Included(x) => *x,
            std::ops::Bound::Excluded(x) => *x + 1,
            std::ops::Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            std::ops::Bound::Included(x) => *x + 1,
            std::ops::Bound::Excluded(x) => *x,
            std::ops::Bound::Unbounded => self.len(),
        };
        if start > end || end > self.len() {
            panic!("out of bounds");
        }
        (start, end)
    }

    pub fn check_invariants(&self) {
        self.root.check_invariants(true);
        assert_eq!(self.root.subtree_size(), self.len);
    }
}

impl<T, const B: usize> std::ops::Index<usize> for TreeVec<T, B> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.get(index).unwrap()
    }
}

impl<T, const B: usize> std::ops::IndexMut<usize> for TreeVec<T, B> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index).unwrap()
    }
}

pub struct Iter<'a, T, const B: usize> {
    stack: Vec<std::slice::Iter<'a, Box<Node<T, B>>>>,
    leaf: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T, const B: usize> Iter<'a, T, B> {
    fn descend(&mut self, mut node: &'a Node<T, B>) {
        loop {
            match node {
                Node::Leaf { data } => {
                    self.leaf = data.iter();
                    return;
                }
                Node::Internal { children, .. } => {
                    let mut children = children.iter();
                    // unwrap: internal nodes are always non-empty
                    node = children.next().unwrap();
                    self.stack.push(children);
                }
            }
        }
    }

    fn descend_to(&mut self, mut node: &'a Node<T, B>, mut offset: usize) {
        loop {
            match node {
                Node::Leaf { data } => {
                    self.leaf = data[offset..].iter();
                    return;
                }
                Node::Internal { children, size } => {
                    let Some((idx, child_offset)) = child_at(size, offset) else {
                        return;
                    };
                    offset = child_offset;
                    let mut children = children[idx..].iter();
                    // unwrap: child_at always returns a valid index into children
                    node = children.next().unwrap();
                    self.stack.push(children);
                }
            }
        }
    }
}

impl<'a, T, const B: usize> Iterator for Iter<'a, T, B> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if let Some(ret) = self.leaf.next() {
            Some(ret)
        } else {
            loop {
                let stack_top = self.stack.last_mut()?;

                let Some(next_node) = stack_top.next() else {
                    self.stack.pop();
                    continue;
                };

                self.descend(next_node);
                return self.leaf.next();
            }
        }
    }
}

pub struct IterMut<'a, T, const B: usize> {
    stack: Vec<std::slice::IterMut<'a, Box<Node<T, B>>>>,
    leaf: std::slice::IterMut<'a, T>,
    remaining: usize,
}

impl<'a, T, const B: usize> IterMut<'a, T, B> {
    fn descend(&mut self, mut node: &'a mut Node<T, B>) {
        loop {
            match node {
                Node::Leaf { data } => {
                    self.leaf = data.iter_mut();
                    return;
                }
                Node::Internal { children, .. } => {
                    let mut children = children.iter_mut();
                    // unwrap: internal nodes are always non-empty
                    node = children.next().unwrap();
                    self.stack.push(children);
                }
            }
        }
    }

    fn descend_to(&mut self, mut node: &'a mut Node<T, B>, mut offset: usize) {
        loop {
            match node {
                Node::Leaf { data } => {
                    self.leaf = data[offset..].iter_mut();
                    return;
                }
                Node::Internal { children, size } => {
                    let Some((idx, child_offset)) = child_at(size, offset) else {
                        return;
                    };
                    offset = child_offset;
                    let mut children = children[idx..].iter_mut();
                    // unwrap: child_at always returns a valid index into children
                    node = children.next().unwrap();
                    self.stack.push(children);
                }
            }
        }
    }
}

impl<'a, T, const B: usize> Iterator for IterMut<'a, T, B> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if let Some(ret) = self.leaf.next() {
            Some(ret)
        } else {
            loop {
                let stack_top = self.stack.last_mut()?;

                let Some(next_node) = stack_top.next() else {
                    self.stack.pop();
                    continue;
                };

                self.descend(next_node);
                return self.leaf.next();
            }
        }
    }
}
