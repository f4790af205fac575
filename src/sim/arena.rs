//! Generational slot arena
//!
//! Dense storage with stable handles. Removed slots go on a free list and are
//! reused, but every reuse bumps the slot's generation so handles to the old
//! occupant stop resolving instead of aliasing the new one.
//!
//! # Example
//!
//! ```ignore
//! let mut arena: Arena<Agent> = Arena::new();
//! let handle = arena.insert(agent);
//!
//! if let Some(agent) = arena.get_mut(handle) {
//!     agent.kill();
//! }
//!
//! arena.remove(handle);
//! assert!(arena.get(handle).is_none());
//! ```

use std::fmt;

// ============================================================================
// Handle
// ============================================================================

/// Stable reference to an arena slot.
///
/// A handle stays valid until its value is removed. After that it never
/// resolves again, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentHandle {
    index: u32,
    generation: u32,
}

impl AgentHandle {
    /// Slot index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// ============================================================================
// Slot
// ============================================================================

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    /// Free slot linking to the next free one (`usize::MAX` ends the list)
    Vacant { generation: u32, next_free: usize },
}

impl<T> Slot<T> {
    fn generation(&self) -> u32 {
        match self {
            Self::Occupied { generation, .. } | Self::Vacant { generation, .. } => *generation,
        }
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Slot arena with generational handles.
///
/// | Operation | Time Complexity |
/// |-----------|-----------------|
/// | `insert`  | O(1) amortized  |
/// | `remove`  | O(1)            |
/// | `get`     | O(1)            |
/// | `iter`    | O(capacity)     |
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: usize,
    len: usize,
}

impl<T> Arena<T> {
    const NONE: usize = usize::MAX;

    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an arena with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: Self::NONE,
            len: 0,
        }
    }

    /// Store a value and return its handle. Reuses the most recently freed
    /// slot if there is one.
    pub fn insert(&mut self, value: T) -> AgentHandle {
        self.len += 1;

        if let Some(Slot::Vacant {
            generation,
            next_free,
        }) = self.slots.get(self.free_head)
        {
            let index = self.free_head;
            let generation = generation.wrapping_add(1);
            self.free_head = *next_free;
            self.slots[index] = Slot::Occupied { generation, value };
            return AgentHandle {
                index: index as u32,
                generation,
            };
        }

        let index = self.slots.len();
        self.slots.push(Slot::Occupied {
            generation: 0,
            value,
        });
        AgentHandle {
            index: index as u32,
            generation: 0,
        }
    }

    /// Remove and return the value behind `handle`.
    ///
    /// Returns `None` for stale or unknown handles.
    pub fn remove(&mut self, handle: AgentHandle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let index = handle.index();
        let vacant = Slot::Vacant {
            generation: handle.generation,
            next_free: self.free_head,
        };
        let slot = std::mem::replace(&mut self.slots[index], vacant);
        self.free_head = index;
        self.len -= 1;

        match slot {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Shared access to the value behind `handle`.
    #[must_use]
    #[inline]
    pub fn get(&self, handle: AgentHandle) -> Option<&T> {
        match self.slots.get(handle.index()) {
            Some(Slot::Occupied { generation, value }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Mutable access to the value behind `handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index()) {
            Some(Slot::Occupied { generation, value }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Whether `handle` still refers to a live value.
    #[must_use]
    #[inline]
    pub fn contains(&self, handle: AgentHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live values.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no values.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, live or free.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over live values with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => Some((
                    AgentHandle {
                        index: index as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Vacant { .. } => None,
            })
    }

    /// Iterate mutably over live values with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (AgentHandle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => Some((
                    AgentHandle {
                        index: index as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Vacant { .. } => None,
            })
    }

    /// Handles of every live value, collected so the arena can be mutated
    /// while walking them.
    #[must_use]
    pub fn handles(&self) -> Vec<AgentHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Remove every value. Generations are kept so old handles stay stale.
    pub fn clear(&mut self) {
        self.free_head = Self::NONE;
        for index in (0..self.slots.len()).rev() {
            let generation = self.slots[index].generation();
            self.slots[index] = Slot::Vacant {
                generation,
                next_free: self.free_head,
            };
            self.free_head = index;
        }
        self.len = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
