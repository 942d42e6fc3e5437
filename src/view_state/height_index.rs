//! HeightIndex - O(log n) prefix sums and lower_bound via Fenwick tree
//!
//! Provides efficient operations for computing cumulative row heights and finding
//! the row covering a vertical offset (scroll position).
//!
//! Rows can be dropped from the front (buffer eviction). Dropped slots are zeroed in
//! place and the tree is rebuilt once dead slots outnumber live ones, so eviction is
//! O(log n) amortized per row.
//!
//! # Complexity
//!
//! - `set`: O(log n)
//! - `prefix_sum`: O(log n)
//! - `lower_bound`: O(log² n)
//! - `push`: O(log n) amortized
//! - `remove_front`: O(k log n) amortized
//! - `total`: O(log n)
//! - `len`: O(1)
//! - `clear`: O(1)

/// Fenwick tree over row heights.
///
/// Indices in the public API are logical: 0 is the oldest live row.
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick tree backing storage over physical slots.
    tree: Vec<isize>,
    /// Height of every physical slot; evicted slots hold 0.
    heights: Vec<usize>,
    /// Physical slot of logical row 0.
    base: usize,
}

impl HeightIndex {
    /// Creates a new HeightIndex with the given initial capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// # use livelog::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::new(100);
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            heights: Vec::with_capacity(capacity),
            base: 0,
        }
    }

    /// Sets the height at the given index and returns the previous height.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use livelog::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(10);
    /// index.push(5);
    /// assert_eq!(index.set(0, 10), 5);
    /// assert_eq!(index.prefix_sum(0), 10);
    /// ```
    pub fn set(&mut self, index: usize, height: usize) -> usize {
        let slot = self.slot(index);
        let previous = std::mem::replace(&mut self.heights[slot], height);
        let delta = height as isize - previous as isize;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, slot, delta);
        }
        previous
    }

    /// Height of the row at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn height(&self, index: usize) -> usize {
        self.heights[self.slot(index)]
    }

    /// Returns the cumulative height up to and including the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use livelog::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(10);
    /// index.push(3);
    /// index.push(4);
    /// index.push(5);
    /// assert_eq!(index.prefix_sum(0), 3);
    /// assert_eq!(index.prefix_sum(1), 7);
    /// assert_eq!(index.prefix_sum(2), 12);
    /// ```
    pub fn prefix_sum(&self, index: usize) -> usize {
        let slot = self.slot(index);
        // Evicted slots are zero, so the physical prefix equals the logical one.
        fenwick::array::prefix_sum(&self.tree, slot).max(0) as usize
    }

    /// Vertical offset at which the row at `index` starts.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn offset_of(&self, index: usize) -> usize {
        self.prefix_sum(index) - self.height(index)
    }

    /// Binary search for the first index where `prefix_sum(index) > value`.
    ///
    /// Returns the index of the row containing the given vertical offset.
    ///
    /// # Returns
    ///
    /// - `Some(index)` if there exists an index where `prefix_sum(index) > value`
    /// - `None` if `value >= total()` or the index is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use livelog::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(10);
    /// index.push(10);  // [0..10)
    /// index.push(20);  // [10..30)
    /// index.push(15);  // [30..45)
    ///
    /// assert_eq!(index.lower_bound(0), Some(0));
    /// assert_eq!(index.lower_bound(10), Some(1));
    /// assert_eq!(index.lower_bound(30), Some(2));
    /// assert_eq!(index.lower_bound(45), None);
    /// ```
    pub fn lower_bound(&self, value: usize) -> Option<usize> {
        let mut left = 0;
        let mut right = self.len();

        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > value {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.len()).then_some(left)
    }

    /// Returns the total height of all live rows.
    pub fn total(&self) -> usize {
        match self.len() {
            0 => 0,
            len => self.prefix_sum(len - 1),
        }
    }

    /// Returns the number of live rows.
    pub fn len(&self) -> usize {
        self.heights.len() - self.base
    }

    /// Returns true if the index contains no live rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a new row with the given height.
    ///
    /// # Examples
    ///
    /// ```
    /// # use livelog::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(1);
    /// index.push(5);
    /// index.push(3);
    /// index.push(2);
    /// assert_eq!(index.len(), 3);
    /// assert_eq!(index.total(), 10);
    /// ```
    pub fn push(&mut self, height: usize) {
        let slot = self.heights.len();
        self.heights.push(height);
        if slot >= self.tree.len() {
            // Fenwick nodes past the old end cover earlier slots, so growing
            // in place would leave them missing those sums.
            self.rebuild(self.tree.len().max(1) * 2);
        } else {
            fenwick::array::update(&mut self.tree, slot, height as isize);
        }
    }

    /// Drops the `count` oldest rows and returns their combined height.
    ///
    /// Logical indices shift down by `count`. Dropping more rows than exist
    /// empties the index.
    ///
    /// # Examples
    ///
    /// ```
    /// # use livelog::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(4);
    /// for h in [2, 3, 4, 5] {
    ///     index.push(h);
    /// }
    /// assert_eq!(index.remove_front(2), 5);
    /// assert_eq!(index.len(), 2);
    /// assert_eq!(index.prefix_sum(0), 4);
    /// assert_eq!(index.total(), 9);
    /// ```
    pub fn remove_front(&mut self, count: usize) -> usize {
        let count = count.min(self.len());
        let mut removed = 0;
        for slot in self.base..self.base + count {
            let height = std::mem::take(&mut self.heights[slot]);
            if height != 0 {
                fenwick::array::update(&mut self.tree, slot, -(height as isize));
            }
            removed += height;
        }
        self.base += count;

        if self.base > self.len() {
            self.heights.drain(..self.base);
            self.base = 0;
            self.rebuild(self.tree.len());
        }
        removed
    }

    /// Clears all rows, resetting to empty state.
    ///
    /// Retains allocated capacity for reuse.
    pub fn clear(&mut self) {
        self.tree.iter_mut().for_each(|node| *node = 0);
        self.heights.clear();
        self.base = 0;
    }

    fn slot(&self, index: usize) -> usize {
        assert!(
            index < self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );
        self.base + index
    }

    fn rebuild(&mut self, capacity: usize) {
        let capacity = capacity.max(self.heights.len());
        self.tree.clear();
        self.tree.resize(capacity, 0);
        for (slot, &height) in self.heights.iter().enumerate() {
            if height != 0 {
                fenwick::array::update(&mut self.tree, slot, height as isize);
            }
        }
    }
}
