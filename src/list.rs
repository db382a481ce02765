//! Intrusive recency list used by the LRU table.
//!
//! A doubly linked list with heap-allocated sentinel nodes at both ends, so
//! every real node always has a non-null neighbour on each side and splicing
//! never branches on "first" or "last". Nodes are handed out as raw pointers;
//! the owning table keeps them in its key map and must only pass back pointers
//! that this list produced and has not yet released.
//!
//! ```text
//!   head ⇄ [most recent] ⇄ ... ⇄ [least recent] ⇄ tail
//! ```
//!
//! The list itself is unbounded. Capacity is enforced by the caller popping
//! from the back.

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr;

/// A node in the list.
pub(crate) struct Entry<T> {
    /// Uninitialized only in the two sentinel nodes.
    val: mem::MaybeUninit<T>,
    prev: *mut Entry<T>,
    next: *mut Entry<T>,
}

impl<T> Entry<T> {
    fn new(val: T) -> Self {
        Entry {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    fn new_sigil() -> Self {
        Entry {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Borrows the node's value.
    ///
    /// # Safety
    ///
    /// Must not be called on a sentinel node.
    pub(crate) unsafe fn get_value(&self) -> &T {
        // SAFETY: caller guarantees this is not a sentinel.
        unsafe { self.val.assume_init_ref() }
    }

    /// Moves the value out of a node released by the list.
    ///
    /// # Safety
    ///
    /// Must not be called on a sentinel node.
    pub(crate) unsafe fn into_value(self: Box<Self>) -> T {
        let entry = *self;
        // SAFETY: caller guarantees this is not a sentinel.
        unsafe { entry.val.assume_init() }
    }
}

/// Doubly linked list ordered from most to least recently touched.
pub(crate) struct List<T> {
    len: usize,
    head: *mut Entry<T>,
    tail: *mut Entry<T>,
}

impl<T> List<T> {
    pub(crate) fn new() -> List<T> {
        let head = Box::into_raw(Box::new(Entry::new_sigil()));
        let tail = Box::into_raw(Box::new(Entry::new_sigil()));

        // SAFETY: head and tail are freshly allocated and valid.
        unsafe {
            (*head).next = tail;
            (*tail).prev = head;
        }

        List { len: 0, head, tail }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocates a node for `v` at the front and returns its pointer.
    pub(crate) fn push_front(&mut self, v: T) -> *mut Entry<T> {
        let node = Box::into_raw(Box::new(Entry::new(v)));
        // SAFETY: node is newly allocated and not linked into any list.
        unsafe { self.attach(node) };
        self.len += 1;
        node
    }

    /// Unlinks and returns the least recently touched node.
    pub(crate) fn pop_back(&mut self) -> Option<Box<Entry<T>>> {
        // SAFETY: tail is valid for the lifetime of the list.
        let last = unsafe { (*self.tail).prev };
        if last == self.head {
            return None;
        }
        // SAFETY: last is a real node linked into this list.
        unsafe {
            self.detach(last);
            self.len -= 1;
            Some(Box::from_raw(last))
        }
    }

    /// Unlinks `node` and hands ownership back to the caller.
    ///
    /// # Safety
    ///
    /// `node` must have been returned by [`push_front`](Self::push_front) on
    /// this list and not released since.
    pub(crate) unsafe fn remove(&mut self, node: *mut Entry<T>) -> Option<Box<Entry<T>>> {
        if node.is_null() || node == self.head || node == self.tail {
            return None;
        }
        // SAFETY: caller guarantees node is linked into this list.
        unsafe {
            self.detach(node);
            self.len -= 1;
            Some(Box::from_raw(node))
        }
    }

    /// Splices `node` to the front.
    ///
    /// # Safety
    ///
    /// Same contract as [`remove`](Self::remove).
    pub(crate) unsafe fn move_to_front(&mut self, node: *mut Entry<T>) {
        if node.is_null() || node == self.head || node == self.tail {
            return;
        }
        // SAFETY: caller guarantees node is linked into this list.
        unsafe {
            if (*self.head).next == node {
                return;
            }
            self.detach(node);
            self.attach(node);
        }
    }

    /// Drops every node and its value.
    pub(crate) fn clear(&mut self) {
        while let Some(node) = self.pop_back() {
            // SAFETY: pop_back never yields a sentinel.
            drop(unsafe { node.into_value() });
        }
    }

    /// Iterates from most to least recently touched.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: head is valid for the lifetime of the list.
            next: unsafe { (*self.head).next },
            tail: self.tail,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    unsafe fn detach(&mut self, node: *mut Entry<T>) {
        // SAFETY: a linked node always has valid neighbours.
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    unsafe fn attach(&mut self, node: *mut Entry<T>) {
        // SAFETY: head is valid and node is not linked anywhere.
        unsafe {
            (*node).next = (*self.head).next;
            (*node).prev = self.head;
            (*self.head).next = node;
            (*(*node).next).prev = node;
        }
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the sentinels were allocated in `new` and are freed only here.
        unsafe {
            drop(Box::from_raw(self.head));
            drop(Box::from_raw(self.tail));
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("len", &self.len).finish()
    }
}

/// Front-to-back iterator over list values.
pub(crate) struct Iter<'a, T> {
    next: *mut Entry<T>,
    tail: *mut Entry<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.next == self.tail || self.remaining == 0 {
            return None;
        }
        // SAFETY: next is a real node; the shared borrow of the list keeps it alive.
        unsafe {
            let node = &*self.next;
            self.next = node.next;
            self.remaining -= 1;
            Some(node.get_value())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
