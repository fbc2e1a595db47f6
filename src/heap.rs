//! Thread-safe, comparator-driven binary heap.
//!
//! The heap is array-backed and 0-indexed: `parent(i) = (i - 1) / 2`,
//! `left(i) = 2i + 1`, `right(i) = 2i + 2`. Ordering comes entirely from the
//! caller's `less(a, b)` comparator; the element for which no other element is
//! `less` sits at the root.
//!
//! All operations take one exclusive lock around the whole structure. There is
//! no internal fine-grained locking and no lock-free fast path.
//!
//! # Example
//!
//! ```rust
//! use dupfind::heap::Heap;
//!
//! let heap = Heap::with_comparator(|a: &u32, b: &u32| a < b);
//! heap.push(3);
//! heap.push(1);
//! heap.push(2);
//! assert_eq!(heap.pop().unwrap(), 1);
//! assert_eq!(heap.len(), 2);
//! ```

use crate::error::{Error, Result};
use parking_lot::Mutex;

/// Strict "ranks ahead of" comparator.
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

const INITIAL_CAPACITY: usize = 64;

/// Builder that refuses to produce a heap without a comparator.
pub struct HeapBuilder<T> {
    less: Option<Comparator<T>>,
    capacity: usize,
}

impl<T> HeapBuilder<T> {
    pub fn new() -> Self {
        Self {
            less: None,
            capacity: INITIAL_CAPACITY,
        }
    }

    pub fn comparator<F>(mut self, less: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.less = Some(Box::new(less));
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the heap.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if no comparator was supplied.
    pub fn build(self) -> Result<Heap<T>> {
        let less = self
            .less
            .ok_or_else(|| Error::Configuration("heap requires a comparator".to_string()))?;
        Ok(Heap {
            less,
            items: Mutex::new(Vec::with_capacity(self.capacity)),
        })
    }
}

impl<T> Default for HeapBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Array-backed binary heap guarded by a single mutex.
pub struct Heap<T> {
    less: Comparator<T>,
    items: Mutex<Vec<T>>,
}

impl<T> Heap<T> {
    /// Creates a heap ordered by `less`.
    pub fn with_comparator<F>(less: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            less: Box::new(less),
            items: Mutex::new(Vec::with_capacity(INITIAL_CAPACITY)),
        }
    }

    pub fn builder() -> HeapBuilder<T> {
        HeapBuilder::new()
    }

    /// Inserts a value and restores the heap property by sifting it up.
    ///
    /// Storage grows geometrically (the backing `Vec` doubles), so pushes are
    /// amortised O(log n).
    pub fn push(&self, value: T) {
        let mut items = self.items.lock();
        items.push(value);
        let last = items.len() - 1;
        self.sift_up(&mut items, last);
    }

    /// Removes and returns the root.
    ///
    /// # Errors
    /// Returns [`Error::EmptyHeap`] when there is nothing to pop.
    pub fn pop(&self) -> Result<T> {
        let mut items = self.items.lock();
        if items.is_empty() {
            return Err(Error::EmptyHeap);
        }
        let root = items.swap_remove(0);
        if !items.is_empty() {
            self.sift_down(&mut items, 0);
        }
        Ok(root)
    }

    /// Number of values currently held.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    fn sift_up(&self, items: &mut [T], mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !(self.less)(&items[i], &items[parent]) {
                break;
            }
            items.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&self, items: &mut [T], mut i: usize) {
        let len = items.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            if left >= len {
                break;
            }
            // prefer the left child on ties
            let child = if right < len && (self.less)(&items[right], &items[left]) {
                right
            } else {
                left
            };
            if !(self.less)(&items[child], &items[i]) {
                break;
            }
            items.swap(i, child);
            i = child;
        }
    }

    #[cfg(test)]
    fn holds_heap_property(&self) -> bool {
        let items = self.items.lock();
        (1..items.len()).all(|i| !(self.less)(&items[i], &items[(i - 1) / 2]))
    }
}

impl<T: Clone> Heap<T> {
    /// Returns a copy of the root without removing it.
    pub fn peek(&self) -> Option<T> {
        self.items.lock().first().cloned()
    }
}
