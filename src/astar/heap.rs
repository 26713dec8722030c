//! An indexed binary min-heap used as the open set of the A* search.
//!
//! Unlike [std::collections::BinaryHeap] every resident item is tracked by a
//! slot index so that an item already in the heap can have its priority
//! improved in place, rather than pushing a duplicate and filtering stale
//! entries later.
//!
//! The parent and children of an item at index `i` are found with integer
//! division:
//!
//! ```text
//! parent      = (i - 1) / 2
//! left child  = 2i + 1
//! right child = 2i + 2
//! ```
//!

use std::cmp::Ordering;

/// Something which can live inside a [PriorityHeap]
pub trait HeapItem: Copy {
	/// A dense key identifying the item, must be less than the capacity of
	/// the heap it is inserted into. Two items with the same key are the
	/// same item, possibly with different priorities
	fn heap_key(&self) -> usize;
	/// Compare the priority of two items, [Ordering::Less] means `self`
	/// should be extracted before `other`
	fn priority_cmp(&self, other: &Self) -> Ordering;
}

/// Fixed capacity binary min-heap with O(log n) insert, extract and
/// decrease-key
#[derive(Clone, Debug)]
pub struct PriorityHeap<T: HeapItem> {
	/// Resident items, only the first `count` entries are valid
	items: Vec<T>,
	/// For each key the index of the slot it occupies, [None] when the item is not in the heap
	slots: Vec<Option<usize>>,
}

impl<T: HeapItem> PriorityHeap<T> {
	/// Create an empty heap able to hold items with keys in `0..capacity`
	pub fn with_capacity(capacity: usize) -> Self {
		PriorityHeap {
			items: Vec::with_capacity(capacity),
			slots: vec![None; capacity],
		}
	}
	/// Maximum number of items the heap can hold
	pub fn get_capacity(&self) -> usize {
		self.slots.len()
	}
	/// Number of items currently in the heap
	pub fn len(&self) -> usize {
		self.items.len()
	}
	/// Whether the heap holds no items
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
	/// Peek at the highest priority item
	pub fn peek(&self) -> Option<&T> {
		self.items.first()
	}
	/// Add an item into the next free slot and sift it up to its place
	pub fn insert(&mut self, item: T) {
		let key = item.heap_key();
		if key >= self.slots.len() {
			panic!(
				"Cannot insert into PriorityHeap, key {} is outside of the capacity {}",
				key,
				self.slots.len()
			);
		}
		if self.slots[key].is_some() {
			panic!(
				"Cannot insert into PriorityHeap, key {} is already resident, use `update_item` instead",
				key
			);
		}
		let index = self.items.len();
		self.items.push(item);
		self.slots[key] = Some(index);
		self.sift_up(index);
	}
	/// Remove and return the highest priority item. The last item is moved
	/// into the root slot and sifted down
	pub fn extract_min(&mut self) -> Option<T> {
		if self.items.is_empty() {
			return None;
		}
		let root = self.items.swap_remove(0);
		self.slots[root.heap_key()] = None;
		if !self.items.is_empty() {
			self.slots[self.items[0].heap_key()] = Some(0);
			self.sift_down(0);
		}
		Some(root)
	}
	/// Replace a resident item with a copy carrying an improved priority and
	/// sift it upwards.
	///
	/// Only valid for priority increases (a smaller cost), an item whose
	/// priority got worse would need sifting down and is left out of place
	pub fn update_item(&mut self, item: T) {
		let Some(index) = self.slot_of(&item) else {
			panic!(
				"Cannot update item with key {}, it is not in the PriorityHeap",
				item.heap_key()
			);
		};
		self.items[index] = item;
		self.sift_up(index);
	}
	/// Whether the slot recorded for `item` currently holds the same item
	pub fn contains(&self, item: &T) -> bool {
		self.slot_of(item).is_some()
	}
	/// Find the current slot of an item
	fn slot_of(&self, item: &T) -> Option<usize> {
		let index = (*self.slots.get(item.heap_key())?)?;
		match self.items.get(index) {
			Some(resident) if resident.heap_key() == item.heap_key() => Some(index),
			_ => None,
		}
	}
	/// Move the item at `index` towards the root while it outranks its parent
	fn sift_up(&mut self, mut index: usize) {
		while index > 0 {
			let parent = (index - 1) / 2;
			if self.items[index].priority_cmp(&self.items[parent]) == Ordering::Less {
				self.swap(index, parent);
				index = parent;
			} else {
				break;
			}
		}
	}
	/// Move the item at `index` towards the leaves while a child outranks it
	fn sift_down(&mut self, mut index: usize) {
		let count = self.items.len();
		loop {
			let left = index * 2 + 1;
			let right = index * 2 + 2;
			if left >= count {
				return;
			}
			// pick the higher priority child, left wins ties
			let mut swap_index = left;
			if right < count
				&& self.items[right].priority_cmp(&self.items[left]) == Ordering::Less
			{
				swap_index = right;
			}
			if self.items[swap_index].priority_cmp(&self.items[index]) == Ordering::Less {
				self.swap(index, swap_index);
				index = swap_index;
			} else {
				return;
			}
		}
	}
	/// Swap two slots and fix up their recorded indices
	fn swap(&mut self, a: usize, b: usize) {
		self.items.swap(a, b);
		self.slots[self.items[a].heap_key()] = Some(a);
		self.slots[self.items[b].heap_key()] = Some(b);
	}
}
