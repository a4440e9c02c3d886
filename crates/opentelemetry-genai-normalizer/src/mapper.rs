//! Applies a mapping table to one attribute collection.

use crate::attributes::AttributeMap;
use crate::table::MappingTable;
use crate::value::AttributeValue;
use std::ops::AddAssign;
use std::sync::Arc;

/// Counters describing what a call to [`AttributeMapper::apply`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingOutcome {
    /// Values copied to a canonical key.
    pub copied: usize,
    /// Matches skipped because the destination was already set.
    pub skipped: usize,
    /// Source attributes removed after a copy.
    pub dropped: usize,
}

impl AddAssign for MappingOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.copied += rhs.copied;
        self.skipped += rhs.skipped;
        self.dropped += rhs.dropped;
    }
}

/// A match captured before any mutation.
struct PendingCopy<'t> {
    source: String,
    destination: &'t str,
    value: AttributeValue,
    destination_existed: bool,
}

/// Rewrites attribute keys according to a [`MappingTable`].
///
/// The mapper is cheap to clone and holds no per-call state; the table is
/// shared read-only.
#[derive(Debug, Clone)]
pub struct AttributeMapper {
    table: Arc<MappingTable>,
    overwrite: bool,
    drop_original: bool,
}

impl AttributeMapper {
    /// Creates a mapper.
    ///
    /// * `overwrite` - replace a destination attribute that is already present
    /// * `drop_original` - remove the source attribute after a copy
    pub fn new(table: impl Into<Arc<MappingTable>>, overwrite: bool, drop_original: bool) -> Self {
        Self {
            table: table.into(),
            overwrite,
            drop_original,
        }
    }

    /// Returns the mapping table.
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Returns whether existing destinations are overwritten.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Returns whether source attributes are removed after a copy.
    pub fn drop_original(&self) -> bool {
        self.drop_original
    }

    /// Normalises `attrs` in place.
    ///
    /// Matches are collected in one pass before anything is written, so a rule
    /// never observes the effect of another rule from the same call. Matches
    /// are then applied in the collection's stored order: with
    /// `overwrite = false` the first source present for a destination wins,
    /// with `overwrite = true` the last one does.
    ///
    /// For each match:
    /// - identity rules are ignored;
    /// - if overwriting is off and the destination existed before the call,
    ///   or was written earlier in this call, nothing happens (no copy, no
    ///   drop);
    /// - otherwise the captured value is copied to the destination, and the
    ///   source is removed when `drop_original` is set.
    pub fn apply<M>(&self, attrs: &mut M) -> MappingOutcome
    where
        M: AttributeMap + ?Sized,
    {
        let mut outcome = MappingOutcome::default();
        if self.table.is_empty() {
            return outcome;
        }

        let pending: Vec<PendingCopy<'_>> = attrs
            .entries()
            .filter_map(|(key, value)| {
                let destination = self.table.destination(key)?;
                Some(PendingCopy {
                    source: key.to_string(),
                    destination,
                    value,
                    destination_existed: attrs.contains_key(destination),
                })
            })
            .collect();

        for PendingCopy {
            source,
            destination,
            value,
            destination_existed,
        } in pending
        {
            if source == destination {
                continue;
            }

            // A pre-existing destination stays protected even if another
            // rule dropped it as a source.
            if !self.overwrite && (destination_existed || attrs.contains_key(destination)) {
                outcome.skipped += 1;
                continue;
            }

            attrs.put(destination, value);
            outcome.copied += 1;

            if self.drop_original && attrs.delete(&source) {
                outcome.dropped += 1;
            }
        }

        outcome
    }
}
