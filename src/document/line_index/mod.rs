//! Incremental line/offset tracking.
//!
//! [`LineIndex`] keeps one AVL tree node per line. Nodes live in an arena and
//! link to each other by index. Every node stores only *differential* counters
//! (characters and lines in its left subtree), so a rotation touches O(1)
//! counters and an edit only walks the parent chains of the lines it touches.
//!
//! ```text
//!              [off=6 line=2 | "cd\n"]
//!              /                     \
//!   [off=0 line=0 | "ab\n"]     [off=0 line=0 | "ef"]
//!              \
//!   [off=0 line=0 | "\n\n"...]
//! ```
//!
//! Offsets and lengths count Unicode scalar values. The last line is always
//! present and never has a delimiter.


use std::fmt;

use super::delimiter::{LineDelimiter, next_delimiter, split_lines};
use crate::error::{InvariantViolation, LineIndexError};

type NodeId = usize;

/// Offset and pure length (delimiter excluded) of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineRegion {
    pub offset: usize,
    pub length: usize,
}

impl LineRegion {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// One line as yielded by [`LineIndex::lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub offset: usize,
    /// Length including the delimiter.
    pub length: usize,
    pub delimiter: Option<LineDelimiter>,
}

impl LineInfo {
    /// Length without the delimiter.
    pub fn pure_length(&self) -> usize {
        self.length - self.delimiter.map_or(0, |d| d.len())
    }
}

#[derive(Debug, Clone)]
struct Node {
    /// Lines in the left subtree.
    line: usize,
    /// Characters in the left subtree.
    offset: usize,
    /// Characters in this line, delimiter included.
    length: usize,
    delimiter: Option<LineDelimiter>,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    balance: i8,
}

impl Node {
    fn new(length: usize, delimiter: Option<LineDelimiter>) -> Self {
        Self {
            line: 0,
            offset: 0,
            length,
            delimiter,
            parent: None,
            left: None,
            right: None,
            balance: 0,
        }
    }

    fn pure_length(&self) -> usize {
        self.length - self.delimiter.map_or(0, |d| d.len())
    }
}

/// A node located by an offset or line query.
#[derive(Debug, Clone, Copy)]
struct Located {
    node: NodeId,
    /// Absolute offset where the line starts.
    start: usize,
    line: usize,
}

/// Balanced tree of lines supporting O(log n) offset/line conversion and
/// incremental updates.
#[derive(Clone)]
pub struct LineIndex {
    nodes: Vec<Node>,
    /// Released arena slots, reused by later insertions.
    free: Vec<NodeId>,
    root: NodeId,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LineIndex {
    /// An index for the empty document: one empty, delimiter-less line.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(0, None)],
            free: Vec::new(),
            root: 0,
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut index = Self::new();
        index.set_text(text);
        index
    }

    /// Rebuild the tree from scratch for `text`.
    ///
    /// Builds a perfectly balanced tree bottom-up in O(n) instead of inserting
    /// line by line.
    pub fn set_text(&mut self, text: &str) {
        let lines = split_lines(text);
        self.nodes.clear();
        self.free.clear();
        self.nodes.reserve(lines.len());

        let mut prefix = Vec::with_capacity(lines.len() + 1);
        prefix.push(0usize);
        for (length, _) in &lines {
            prefix.push(prefix[prefix.len() - 1] + length);
        }

        for &(length, delimiter) in &lines {
            self.nodes.push(Node::new(length, delimiter));
        }

        let (root, _) = self.build_balanced(0, lines.len(), None, &prefix);
        self.root = root.unwrap_or(0);

        tracing::trace!(lines = lines.len(), "line index rebuilt");
        self.debug_check();
    }

    /// Links arena slots `lo..hi` (already in line order) into a balanced
    /// subtree; returns its root and height.
    fn build_balanced(
        &mut self,
        lo: usize,
        hi: usize,
        parent: Option<NodeId>,
        prefix: &[usize],
    ) -> (Option<NodeId>, i32) {
        if lo >= hi {
            return (None, 0);
        }
        let mid = lo + (hi - lo) / 2;
        let (left, left_height) = self.build_balanced(lo, mid, Some(mid), prefix);
        let (right, right_height) = self.build_balanced(mid + 1, hi, Some(mid), prefix);

        let node = &mut self.nodes[mid];
        node.parent = parent;
        node.left = left;
        node.right = right;
        node.line = mid - lo;
        node.offset = prefix[mid] - prefix[lo];
        node.balance = (right_height - left_height) as i8;

        (Some(mid), left_height.max(right_height) + 1)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Total number of lines, at least 1.
    pub fn line_count(&self) -> usize {
        let mut lines = 0;
        let mut current = Some(self.root);
        while let Some(id) = current {
            let node = &self.nodes[id];
            lines += node.line + 1;
            current = node.right;
        }
        lines
    }

    /// Document length in characters.
    pub fn len(&self) -> usize {
        let mut length = 0;
        let mut current = Some(self.root);
        while let Some(id) = current {
            let node = &self.nodes[id];
            length += node.offset + node.length;
            current = node.right;
        }
        length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn line_offset(&self, line: usize) -> Result<usize, LineIndexError> {
        Ok(self.locate_line(line)?.start)
    }

    /// Length of `line` including its delimiter.
    pub fn line_length(&self, line: usize) -> Result<usize, LineIndexError> {
        let located = self.locate_line(line)?;
        Ok(self.nodes[located.node].length)
    }

    /// `None` for the last line, which never has a delimiter.
    pub fn line_delimiter(&self, line: usize) -> Result<Option<LineDelimiter>, LineIndexError> {
        let located = self.locate_line(line)?;
        Ok(self.nodes[located.node].delimiter)
    }

    /// Line containing `offset`. An offset between two lines belongs to the
    /// line starting there; the document length maps to the last line.
    pub fn line_of_offset(&self, offset: usize) -> Result<usize, LineIndexError> {
        Ok(self.locate_offset(offset)?.line)
    }

    /// Offset and pure length of `line`.
    ///
    /// `line == line_count()` is accepted when the last line is non-empty and
    /// yields an empty region at the end of the document.
    pub fn line_information(&self, line: usize) -> Result<LineRegion, LineIndexError> {
        match self.locate_line(line) {
            Ok(located) => Ok(LineRegion::new(
                located.start,
                self.nodes[located.node].pure_length(),
            )),
            Err(err) => {
                if line > 0 && line == self.line_count() {
                    let last = self.locate_line(line - 1)?;
                    let length = self.nodes[last.node].length;
                    if length > 0 {
                        return Ok(LineRegion::new(last.start + length, 0));
                    }
                }
                Err(err)
            }
        }
    }

    pub fn line_information_of_offset(&self, offset: usize) -> Result<LineRegion, LineIndexError> {
        let located = self.locate_offset(offset)?;
        Ok(LineRegion::new(
            located.start,
            self.nodes[located.node].pure_length(),
        ))
    }

    /// Number of lines touched by `offset..offset + length`; 1 when empty.
    pub fn line_count_in_range(&self, offset: usize, length: usize) -> Result<usize, LineIndexError> {
        if length == 0 {
            return Ok(1);
        }
        let start = self.line_of_offset(offset)?;
        let end = self.line_of_offset(offset + length)?;
        Ok(end - start + 1)
    }

    /// All lines in document order.
    pub fn lines(&self) -> Lines<'_> {
        Lines {
            index: self,
            next: Some(self.successor_down(self.root)),
            offset: 0,
        }
    }

    fn locate_offset(&self, offset: usize) -> Result<Located, LineIndexError> {
        let mut remaining = offset;
        let mut line = 0;
        let mut current = Some(self.root);

        while let Some(id) = current {
            let node = &self.nodes[id];
            if remaining < node.offset {
                current = node.left;
                continue;
            }
            remaining -= node.offset;
            line += node.line;
            if remaining < node.length || (remaining == node.length && node.right.is_none()) {
                return Ok(Located {
                    node: id,
                    start: offset - remaining,
                    line,
                });
            }
            remaining -= node.length;
            line += 1;
            current = node.right;
        }

        Err(LineIndexError::OffsetOutOfBounds {
            offset,
            length: self.len(),
        })
    }

    fn locate_line(&self, line: usize) -> Result<Located, LineIndexError> {
        let mut remaining = line;
        let mut offset = 0;
        let mut current = Some(self.root);

        while let Some(id) = current {
            let node = &self.nodes[id];
            if remaining == node.line {
                return Ok(Located {
                    node: id,
                    start: offset + node.offset,
                    line,
                });
            }
            if remaining < node.line {
                current = node.left;
            } else {
                remaining -= node.line + 1;
                offset += node.offset + node.length;
                current = node.right;
            }
        }

        Err(LineIndexError::LineOutOfBounds {
            line,
            line_count: self.line_count(),
        })
    }

    /// The delimiter character at `offset`, if that character belongs to a
    /// line delimiter.
    fn delimiter_char_at(&self, offset: usize) -> Option<char> {
        let located = self.locate_offset(offset).ok()?;
        let node = &self.nodes[located.node];
        let delimiter = node.delimiter?;
        let within = (offset - located.start).checked_sub(node.pure_length())?;
        delimiter.as_str().chars().nth(within)
    }

    // =========================================================================
    // EDITING
    // =========================================================================

    /// Replace `length` characters at `offset` with `text`.
    ///
    /// Runs in time proportional to the number of lines touched plus
    /// O(log n) rebalancing per inserted or removed line.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), LineIndexError> {
        let document_length = self.len();
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= document_length)
            .ok_or(LineIndexError::OffsetOutOfBounds {
                offset: offset.saturating_add(length),
                length: document_length,
            })?;

        // A `\r` before the edit or a `\n` after it may pair up with the
        // inserted text (or stop pairing up with removed text). Pull those
        // characters into the edit so both boundaries fall outside any `\r\n`.
        let mut start = offset;
        let mut chars = Vec::with_capacity(text.len() + 2);
        if start > 0 && self.delimiter_char_at(start - 1) == Some('\r') {
            start -= 1;
            chars.push('\r');
        }
        chars.extend(text.chars());
        let mut end = end;
        if self.delimiter_char_at(end) == Some('\n') {
            end += 1;
            chars.push('\n');
        }

        tracing::trace!(offset = start, length = end - start, inserted = chars.len(), "line index replace");
        self.replace_chars(start, end - start, &chars)?;
        self.debug_check();
        Ok(())
    }

    fn replace_chars(&mut self, offset: usize, length: usize, text: &[char]) -> Result<(), LineIndexError> {
        let first = self.locate_offset(offset)?;
        let first_end = first.start + self.nodes[first.node].length;

        let last = if offset + length < first_end {
            first.node
        } else {
            self.locate_offset(offset + length)?.node
        };

        let first_line_delta = first_end - offset;
        if first.node == last {
            self.replace_within(first.node, text, length, first_line_delta);
        } else {
            self.replace_spanning(first.node, last, text, length, first_line_delta);
        }
        Ok(())
    }

    /// Edit confined to one line; `length < first_line_delta`.
    fn replace_within(&mut self, node: NodeId, text: &[char], length: usize, first_line_delta: usize) {
        let Some(found) = next_delimiter(text, 0) else {
            self.update_length(node, text.len() as isize - length as isize);
            return;
        };

        // Split off what follows the edit on the original line
        let remainder = first_line_delta - length;
        let remainder_delimiter = self.nodes[node].delimiter;

        let mut consumed = found.end();
        self.update_length(node, consumed as isize - first_line_delta as isize);
        self.nodes[node].delimiter = Some(found.delimiter);

        let mut node = node;
        while let Some(found) = next_delimiter(text, consumed) {
            let line_length = found.end() - consumed;
            node = self.insert_after(node, line_length, Some(found.delimiter));
            consumed = found.end();
        }

        self.insert_after(node, remainder + text.len() - consumed, remainder_delimiter);
    }

    /// Edit spanning from `node` to `last`; `length >= first_line_delta`.
    fn replace_spanning(
        &mut self,
        node: NodeId,
        last: NodeId,
        text: &[char],
        length: usize,
        first_line_delta: usize,
    ) {
        let mut length = length;

        // Interior lines disappear entirely
        let mut successor = self.successor(node);
        while let Some(interior) = successor.filter(|s| *s != last) {
            let interior_length = self.nodes[interior].length;
            length -= interior_length;
            successor = self.successor(interior);
            self.update_length(interior, -(interior_length as isize));
        }

        let Some(found) = next_delimiter(text, 0) else {
            self.join(node, last, text.len() as isize - length as isize);
            return;
        };

        let mut consumed = found.end();
        self.update_length(node, consumed as isize - first_line_delta as isize);
        self.nodes[node].delimiter = Some(found.delimiter);
        length -= first_line_delta;

        let mut node = node;
        while let Some(found) = next_delimiter(text, consumed) {
            let line_length = found.end() - consumed;
            node = self.insert_after(node, line_length, Some(found.delimiter));
            consumed = found.end();
        }

        self.update_length(last, text.len() as isize - consumed as isize - length as isize);
    }

    /// Merge `one` into the following line `two`, adjusting the result by `delta`.
    fn join(&mut self, one: NodeId, two: NodeId, delta: isize) {
        let one_length = self.nodes[one].length as isize;
        self.update_length(one, -one_length);
        self.update_length(two, one_length + delta);
    }

    /// Adjust a line's length and its parent chain; a delimited line that
    /// drops to zero characters is removed from the tree.
    fn update_length(&mut self, node: NodeId, delta: isize) {
        let entry = &mut self.nodes[node];
        entry.length = entry.length.wrapping_add_signed(delta);

        let delete = entry.length == 0 && entry.delimiter.is_some();
        let line_delta = if delete { -1 } else { 0 };

        if delta != 0 || line_delta != 0 {
            self.update_parent_chain(node, None, delta, line_delta);
        }
        if delete {
            self.delete(node);
        }
    }

    /// Apply deltas to every ancestor of `from` (up to `to`, exclusive) that
    /// reaches `from` through its left subtree.
    fn update_parent_chain(
        &mut self,
        from: NodeId,
        to: Option<NodeId>,
        delta_length: isize,
        delta_lines: isize,
    ) {
        let mut child = from;
        let mut parent = self.nodes[from].parent;
        while parent != to {
            let Some(id) = parent else { break };
            let node = &mut self.nodes[id];
            if node.left == Some(child) {
                node.offset = node.offset.wrapping_add_signed(delta_length);
                node.line = node.line.wrapping_add_signed(delta_lines);
            }
            child = id;
            parent = node.parent;
        }
    }

    fn insert_after(&mut self, node: NodeId, length: usize, delimiter: Option<LineDelimiter>) -> NodeId {
        let added = self.alloc(length, delimiter);

        match self.nodes[node].right {
            None => self.set_child(Some(node), Some(added), false),
            Some(right) => {
                let leftmost = self.successor_down(right);
                self.set_child(Some(leftmost), Some(added), true);
            }
        }

        self.update_parent_chain(added, None, length as isize, 1);
        self.update_parent_balance_after_insertion(added);
        added
    }

    /// Remove a zero-length node. Counters along its parent chain must
    /// already be updated; go through `update_length` instead of calling this.
    fn delete(&mut self, node: NodeId) {
        let Node {
            parent,
            left,
            right,
            line,
            offset,
            balance,
            ..
        } = self.nodes[node];
        let is_left = parent.is_none_or(|p| self.nodes[p].left == Some(node));

        let (to_update, lost_left) = match (left, right) {
            (None, _) | (_, None) => {
                // At most one child: splice it in
                self.set_child(parent, left.or(right), is_left);
                (parent, is_left)
            }
            (Some(left), Some(right)) if self.nodes[right].left.is_none() => {
                // Right child has no left child: it takes over node's place
                self.set_child(parent, Some(right), is_left);
                self.set_child(Some(right), Some(left), true);
                let replacement = &mut self.nodes[right];
                replacement.line = line;
                replacement.offset = offset;
                replacement.balance = balance;
                (Some(right), false)
            }
            (Some(left), Some(right)) => {
                // Promote the in-order successor
                let successor = self.successor_down(right);
                let successor_parent = self.nodes[successor].parent;
                let successor_length = self.nodes[successor].length as isize;

                self.update_parent_chain(successor, Some(node), -successor_length, -1);

                let successor_right = self.nodes[successor].right;
                self.set_child(successor_parent, successor_right, true);

                let right = self.nodes[node].right.unwrap_or(right);
                self.set_child(Some(successor), Some(right), false);
                self.set_child(Some(successor), Some(left), true);
                self.set_child(parent, Some(successor), is_left);

                let promoted = &mut self.nodes[successor];
                promoted.line = line;
                promoted.offset = offset;
                promoted.balance = balance;
                (successor_parent, true)
            }
        };

        self.release(node);
        self.update_parent_balance_after_deletion(to_update, lost_left);
    }

    // =========================================================================
    // TREE PLUMBING
    // =========================================================================

    fn alloc(&mut self, length: usize, delimiter: Option<LineDelimiter>) -> NodeId {
        let node = Node::new(length, delimiter);
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, node: NodeId) {
        let entry = &mut self.nodes[node];
        entry.parent = None;
        entry.left = None;
        entry.right = None;
        self.free.push(node);
    }

    /// Link `child` under `parent` (or make it the root), fixing the parent pointer.
    fn set_child(&mut self, parent: Option<NodeId>, child: Option<NodeId>, is_left: bool) {
        match parent {
            None => match child {
                Some(child) => self.root = child,
                None => self.root = self.alloc(0, None),
            },
            Some(parent) => {
                if is_left {
                    self.nodes[parent].left = child;
                } else {
                    self.nodes[parent].right = child;
                }
            }
        }
        if let Some(child) = child {
            self.nodes[child].parent = parent;
        }
    }

    fn successor(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes[node].right {
            Some(right) => Some(self.successor_down(right)),
            None => self.successor_up(node),
        }
    }

    /// First ancestor reached from its left subtree.
    fn successor_up(&self, node: NodeId) -> Option<NodeId> {
        let mut child = node;
        let mut parent = self.nodes[node].parent;
        while let Some(id) = parent {
            if self.nodes[id].left == Some(child) {
                return Some(id);
            }
            child = id;
            parent = self.nodes[id].parent;
        }
        None
    }

    /// Leftmost node of a subtree.
    fn successor_down(&self, node: NodeId) -> NodeId {
        let mut node = node;
        while let Some(left) = self.nodes[node].left {
            node = left;
        }
        node
    }

    /// `node` moves down-left, its right child takes its place.
    fn rotate_left(&mut self, node: NodeId) {
        let Some(child) = self.nodes[node].right else {
            return;
        };
        let parent = self.nodes[node].parent;
        let is_left = parent.is_none_or(|p| self.nodes[p].left == Some(node));

        self.set_child(parent, Some(child), is_left);
        let child_left = self.nodes[child].left;
        self.set_child(Some(node), child_left, false);
        self.set_child(Some(child), Some(node), true);

        // node and its left subtree now sit in child's left subtree
        let (line, offset, length) = {
            let n = &self.nodes[node];
            (n.line, n.offset, n.length)
        };
        let child = &mut self.nodes[child];
        child.line += line + 1;
        child.offset += offset + length;
    }

    /// `node` moves down-right, its left child takes its place.
    fn rotate_right(&mut self, node: NodeId) {
        let Some(child) = self.nodes[node].left else {
            return;
        };
        let parent = self.nodes[node].parent;
        let is_left = parent.is_none_or(|p| self.nodes[p].left == Some(node));

        self.set_child(parent, Some(child), is_left);
        let child_right = self.nodes[child].right;
        self.set_child(Some(node), child_right, true);
        self.set_child(Some(child), Some(node), false);

        // node keeps only what was in child's right subtree
        let (line, offset, length) = {
            let c = &self.nodes[child];
            (c.line, c.offset, c.length)
        };
        let node = &mut self.nodes[node];
        node.line -= line + 1;
        node.offset -= offset + length;
    }

    fn set_balance(&mut self, node: NodeId, balance: i8) {
        self.nodes[node].balance = balance;
    }

    fn single_left_rotation(&mut self, node: NodeId, parent: NodeId) {
        self.rotate_left(parent);
        self.set_balance(node, 0);
        self.set_balance(parent, 0);
    }

    fn single_right_rotation(&mut self, node: NodeId, parent: NodeId) {
        self.rotate_right(parent);
        self.set_balance(node, 0);
        self.set_balance(parent, 0);
    }

    /// Right around `node`, then left around `parent`.
    fn right_left_rotation(&mut self, node: NodeId, parent: NodeId) {
        let Some(child) = self.nodes[node].left else {
            return;
        };
        self.rotate_right(node);
        self.rotate_left(parent);
        match self.nodes[child].balance {
            1 => {
                self.set_balance(node, 0);
                self.set_balance(parent, -1);
                self.set_balance(child, 0);
            }
            0 => {
                self.set_balance(node, 0);
                self.set_balance(parent, 0);
            }
            _ => {
                self.set_balance(node, 1);
                self.set_balance(parent, 0);
                self.set_balance(child, 0);
            }
        }
    }

    /// Left around `node`, then right around `parent`.
    fn left_right_rotation(&mut self, node: NodeId, parent: NodeId) {
        let Some(child) = self.nodes[node].right else {
            return;
        };
        self.rotate_left(node);
        self.rotate_right(parent);
        match self.nodes[child].balance {
            -1 => {
                self.set_balance(node, 0);
                self.set_balance(parent, 1);
                self.set_balance(child, 0);
            }
            0 => {
                self.set_balance(node, 0);
                self.set_balance(parent, 0);
            }
            _ => {
                self.set_balance(node, -1);
                self.set_balance(parent, 0);
                self.set_balance(child, 0);
            }
        }
    }

    /// `node`'s parent leans +2 after an insertion below `node`.
    fn rebalance_after_insertion_right(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node].parent else {
            return;
        };
        match self.nodes[node].balance {
            1 => self.single_left_rotation(node, parent),
            -1 => self.right_left_rotation(node, parent),
            _ => {}
        }
    }

    /// `node`'s parent leans -2 after an insertion below `node`.
    fn rebalance_after_insertion_left(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node].parent else {
            return;
        };
        match self.nodes[node].balance {
            -1 => self.single_right_rotation(node, parent),
            1 => self.left_right_rotation(node, parent),
            _ => {}
        }
    }

    /// `node`'s parent leans +2 after a deletion in its left subtree.
    /// Returns true when the subtree height is unchanged.
    fn rebalance_after_deletion_left(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes[node].parent else {
            return true;
        };
        match self.nodes[node].balance {
            1 => {
                self.single_left_rotation(node, parent);
                false
            }
            -1 => {
                self.right_left_rotation(node, parent);
                false
            }
            _ => {
                self.rotate_left(parent);
                self.set_balance(node, -1);
                self.set_balance(parent, 1);
                true
            }
        }
    }

    /// `node`'s parent leans -2 after a deletion in its right subtree.
    /// Returns true when the subtree height is unchanged.
    fn rebalance_after_deletion_right(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes[node].parent else {
            return true;
        };
        match self.nodes[node].balance {
            -1 => {
                self.single_right_rotation(node, parent);
                false
            }
            1 => {
                self.left_right_rotation(node, parent);
                false
            }
            _ => {
                self.rotate_right(parent);
                self.set_balance(node, 1);
                self.set_balance(parent, -1);
                true
            }
        }
    }

    fn update_parent_balance_after_deletion(&mut self, node: Option<NodeId>, was_left_child: bool) {
        let mut current = node;
        let mut was_left_child = was_left_child;

        while let Some(id) = current {
            if was_left_child {
                self.nodes[id].balance += 1;
            } else {
                self.nodes[id].balance -= 1;
            }

            let parent = self.nodes[id].parent;
            if let Some(parent) = parent {
                was_left_child = self.nodes[parent].left == Some(id);
            }

            match self.nodes[id].balance {
                1 | -1 => return,
                -2 => {
                    if let Some(left) = self.nodes[id].left {
                        if self.rebalance_after_deletion_right(left) {
                            return;
                        }
                    }
                }
                2 => {
                    if let Some(right) = self.nodes[id].right {
                        if self.rebalance_after_deletion_left(right) {
                            return;
                        }
                    }
                }
                _ => {}
            }

            current = parent;
        }
    }

    fn update_parent_balance_after_insertion(&mut self, node: NodeId) {
        let mut node = node;
        let mut parent = self.nodes[node].parent;

        while let Some(id) = parent {
            if self.nodes[id].left == Some(node) {
                self.nodes[id].balance -= 1;
            } else {
                self.nodes[id].balance += 1;
            }

            match self.nodes[id].balance {
                1 | -1 => {
                    node = id;
                    parent = self.nodes[id].parent;
                    continue;
                }
                -2 => self.rebalance_after_insertion_left(node),
                2 => self.rebalance_after_insertion_right(node),
                _ => {}
            }
            return;
        }
    }

    // =========================================================================
    // CONSISTENCY CHECKS
    // =========================================================================

    /// Recompute every node's counters, height and links from scratch and
    /// compare them with the stored values.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.nodes[self.root].parent.is_some() {
            return Err(InvariantViolation::new(self.root, "root has a parent"));
        }
        self.check_subtree(self.root)?;

        let mut undelimited = 0;
        let mut count = 0;
        let mut current = Some(self.successor_down(self.root));
        while let Some(id) = current {
            let node = &self.nodes[id];
            count += 1;
            match node.delimiter {
                None => undelimited += 1,
                Some(delimiter) if node.length < delimiter.len() => {
                    return Err(InvariantViolation::new(id, "line shorter than its delimiter"));
                }
                Some(_) => {}
            }
            current = self.successor(id);
            if current.is_none() && node.delimiter.is_some() {
                return Err(InvariantViolation::new(id, "last line has a delimiter"));
            }
        }
        if undelimited != 1 {
            return Err(InvariantViolation::new(
                self.root,
                format!("{undelimited} lines without delimiter"),
            ));
        }
        if count + self.free.len() != self.nodes.len() {
            return Err(InvariantViolation::new(self.root, "arena slots leaked"));
        }
        Ok(())
    }

    /// Returns (height, characters, lines) of the subtree.
    fn check_subtree(&self, id: NodeId) -> Result<(i32, usize, usize), InvariantViolation> {
        let node = &self.nodes[id];

        let (left_height, left_chars, left_lines) = match node.left {
            Some(left) => {
                if self.nodes[left].parent != Some(id) {
                    return Err(InvariantViolation::new(left, "broken parent link"));
                }
                self.check_subtree(left)?
            }
            None => (0, 0, 0),
        };
        let (right_height, right_chars, right_lines) = match node.right {
            Some(right) => {
                if self.nodes[right].parent != Some(id) {
                    return Err(InvariantViolation::new(right, "broken parent link"));
                }
                self.check_subtree(right)?
            }
            None => (0, 0, 0),
        };

        let balance = right_height - left_height;
        if !(-1..=1).contains(&balance) || i32::from(node.balance) != balance {
            return Err(InvariantViolation::new(
                id,
                format!("stored balance {} but heights give {}", node.balance, balance),
            ));
        }
        if node.offset != left_chars {
            return Err(InvariantViolation::new(
                id,
                format!("stored offset {} but left subtree has {}", node.offset, left_chars),
            ));
        }
        if node.line != left_lines {
            return Err(InvariantViolation::new(
                id,
                format!("stored line {} but left subtree has {}", node.line, left_lines),
            ));
        }

        Ok((
            left_height.max(right_height) + 1,
            left_chars + node.length + right_chars,
            left_lines + 1 + right_lines,
        ))
    }

    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        if let Err(violation) = self.check_invariants() {
            panic!("{violation}");
        }
    }
}

impl fmt::Debug for LineIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lines()).finish()
    }
}

/// Iterator over the lines of a [`LineIndex`].
pub struct Lines<'a> {
    index: &'a LineIndex,
    next: Option<NodeId>,
    offset: usize,
}

impl Iterator for Lines<'_> {
    type Item = LineInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = &self.index.nodes[id];
        let info = LineInfo {
            offset: self.offset,
            length: node.length,
            delimiter: node.delimiter,
        };
        self.offset += node.length;
        self.next = self.index.successor(id);
        Some(info)
    }
}
