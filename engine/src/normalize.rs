//! Position arithmetic over in-memory ordered lists.
//!
//! Every function here treats the slice order as the source of truth: stored
//! `sort_order` values are only compared to decide which items need a write,
//! never trusted to define the sequence.

use crate::{Error, Item, OrderStore, Position, Result};

/// Dense zero-based renumbering of ordered lists.
pub struct Normalizer;

impl Normalizer {
    /// Assign `sort_order = index` to every item and return the indices of
    /// the items whose value changed.
    pub fn renumber(items: &mut [Item]) -> Result<Vec<usize>> {
        let mut changed = Vec::new();
        for (index, item) in items.iter_mut().enumerate() {
            let position = position_at(index)?;
            if item.sort_order != position {
                item.sort_order = position;
                changed.push(index);
            }
        }
        Ok(changed)
    }

    /// Renumber `items` and persist the ones that changed, touching their
    /// `updated_at`. Returns the number of writes.
    pub fn normalize<S: OrderStore>(
        store: &mut S,
        items: &mut [Item],
        timestamp: crate::Timestamp,
    ) -> Result<usize> {
        let changed = Self::renumber(items)?;
        if changed.is_empty() {
            return Ok(0);
        }
        let dirty: Vec<Item> = changed
            .iter()
            .map(|&index| {
                let item = &mut items[index];
                item.updated_at = timestamp;
                item.clone()
            })
            .collect();
        store.persist_all(&dirty)?;
        Ok(dirty.len())
    }

    /// Verify that positions are exactly `{0, .., n-1}`.
    pub fn check_dense(items: &[Item]) -> Result<()> {
        let mut seen = vec![false; items.len()];
        for item in items {
            let slot = item.sort_order as usize;
            if slot >= items.len() {
                return Self::violation(format!(
                    "position {} out of range for {} items (item {})",
                    item.sort_order,
                    items.len(),
                    item.id
                ));
            }
            if seen[slot] {
                return Self::violation(format!(
                    "duplicate position {} (item {})",
                    item.sort_order, item.id
                ));
            }
            seen[slot] = true;
        }
        Ok(())
    }

    fn violation(message: String) -> Result<()> {
        tracing::error!(%message, "ordering invariant violated");
        Err(Error::InvariantViolation(message))
    }
}

/// Convert a list index into a stored position.
pub fn position_at(index: usize) -> Result<Position> {
    Position::try_from(index).map_err(|_| {
        Error::InvariantViolation(format!("index {index} exceeds the largest position"))
    })
}

/// Clamp a requested insert position into `[0, len]`; `None` means tail.
pub fn insert_index(requested: Option<i64>, len: usize) -> usize {
    match requested {
        None => len,
        Some(p) if p <= 0 => 0,
        Some(p) => (p as u64).min(len as u64) as usize,
    }
}

/// Clamp a requested move target into `[0, len - 1]`.
///
/// `len` must be non-zero.
pub fn move_index(requested: i64, len: usize) -> usize {
    debug_assert!(len > 0);
    let last = len.saturating_sub(1);
    if requested <= 0 {
        0
    } else {
        (requested as u64).min(last as u64) as usize
    }
}

/// Remove the element at `from` and reinsert it at `to`.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to {
        return;
    }
    let element = items.remove(from);
    items.insert(to, element);
}
