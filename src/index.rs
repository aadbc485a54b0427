//! The date index: sorted unique timestamps with partial-key resolution.
//!
//! A [`DateIndex`] is immutable. Clones and derived sub-indices share one
//! reference-counted timestamp buffer and differ only in the window they
//! expose, so slicing a container never copies its labels. Operations that
//! change the set of labels ([`DateIndex::shift`], [`DateIndex::with_inserted`],
//! [`DateIndex::select`] on scattered positions) build a new buffer.

use crate::error::{Error, Result};
use crate::frequency::Frequency;
use crate::key::{Key, Upper};
use crate::range::DateRange;
use crate::resolve::{Labels, Selection};
use crate::timestamp::Timestamp;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::Arc;

/// What raw construction does with repeated instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Duplicates {
    /// Keep the first occurrence.
    #[default]
    Drop,
    /// Fail with [`Error::DuplicateTimestamp`].
    Reject,
}

#[derive(Debug, Clone)]
pub struct DateIndex {
    stamps: Arc<[Timestamp]>,
    window: Range<usize>,
    frequency: Option<Frequency>,
}

impl DateIndex {
    /// Wraps timestamps generated by `frequency` as a regular index.
    ///
    /// Fails with [`Error::InvalidSpecification`] unless every timestamp is
    /// the `advance` of its predecessor.
    pub fn from_range(stamps: Vec<Timestamp>, frequency: Frequency) -> Result<Self> {
        for (i, pair) in stamps.windows(2).enumerate() {
            let expected = frequency.advance(&pair[0])?;
            if expected != pair[1] {
                return Err(Error::InvalidSpecification(format!(
                    "position {} holds {} but {frequency} steps {} to {expected}",
                    i + 1,
                    pair[1],
                    pair[0],
                )));
            }
        }
        Ok(Self::build(stamps, Some(frequency)))
    }

    pub fn date_range(range: &DateRange) -> Result<Self> {
        Self::from_range(range.generate()?, range.frequency())
    }

    /// Sorts (stably) and deduplicates arbitrary timestamps.
    ///
    /// The result is irregular; see [`DateIndex::infer_frequency`].
    pub fn from_raw(stamps: impl IntoIterator<Item = Timestamp>) -> Self {
        Self::sorted(stamps.into_iter().collect())
    }

    /// Like [`DateIndex::from_raw`] but repeated instants are an error.
    pub fn from_raw_unique(stamps: impl IntoIterator<Item = Timestamp>) -> Result<Self> {
        Self::from_raw_with(stamps, Duplicates::Reject)
    }

    pub fn from_raw_with(
        stamps: impl IntoIterator<Item = Timestamp>,
        duplicates: Duplicates,
    ) -> Result<Self> {
        let mut stamps: Vec<Timestamp> = stamps.into_iter().collect();
        if duplicates == Duplicates::Reject {
            stamps.sort();
            if let Some(pair) = stamps.windows(2).find(|pair| pair[0] == pair[1]) {
                return Err(Error::DuplicateTimestamp(pair[1]));
            }
        }
        Ok(Self::sorted(stamps))
    }

    /// Sorts `(label, value)` pairs by label and splits them into an index and
    /// the values in index order.
    ///
    /// The sort is stable, so under [`Duplicates::Drop`] the first value given
    /// for an instant is the one kept.
    pub fn from_labeled<V>(
        pairs: impl IntoIterator<Item = (Timestamp, V)>,
        duplicates: Duplicates,
    ) -> Result<(Self, Vec<V>)> {
        let mut pairs: Vec<(Timestamp, V)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let mut stamps: Vec<Timestamp> = Vec::with_capacity(pairs.len());
        let mut values = Vec::with_capacity(pairs.len());
        for (stamp, value) in pairs {
            if stamps.last() == Some(&stamp) {
                match duplicates {
                    Duplicates::Drop => continue,
                    Duplicates::Reject => return Err(Error::DuplicateTimestamp(stamp)),
                }
            }
            stamps.push(stamp);
            values.push(value);
        }
        log::debug!("labeled index of {} timestamps", stamps.len());
        Ok((Self::build(stamps, None), values))
    }

    pub fn empty() -> Self {
        Self::build(Vec::new(), None)
    }

    /// Marks the index regular when one frequency generates all of its timestamps.
    ///
    /// An index that fits no frequency is returned unchanged.
    pub fn infer_frequency(self) -> Self {
        if self.frequency.is_some() {
            return self;
        }
        let frequency = Frequency::infer(self.as_slice());
        log::debug!("inferred frequency {:?} for {} timestamps", frequency, self.len());
        Self { frequency, ..self }
    }

    fn sorted(mut stamps: Vec<Timestamp>) -> Self {
        stamps.sort();
        let before = stamps.len();
        stamps.dedup();
        log::debug!(
            "raw index of {} timestamps ({} duplicates dropped)",
            stamps.len(),
            before - stamps.len(),
        );
        Self::build(stamps, None)
    }

    fn build(stamps: Vec<Timestamp>, frequency: Option<Frequency>) -> Self {
        let window = 0..stamps.len();
        Self {
            stamps: stamps.into(),
            window,
            frequency,
        }
    }

    pub fn as_slice(&self) -> &[Timestamp] {
        &self.stamps[self.window.clone()]
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Timestamp> {
        self.as_slice().get(position)
    }

    pub fn first(&self) -> Option<&Timestamp> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&Timestamp> {
        self.as_slice().last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Timestamp> {
        self.as_slice().iter()
    }

    /// Generating frequency of a regular index.
    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    pub fn is_regular(&self) -> bool {
        self.frequency.is_some()
    }

    /// Whether both indices are views of the same timestamp buffer.
    pub fn shares_storage(&self, other: &DateIndex) -> bool {
        Arc::ptr_eq(&self.stamps, &other.stamps)
    }

    /// Position of an exact instant.
    pub fn position(&self, timestamp: &Timestamp) -> Option<usize> {
        if let Some(position) = self.closed_form_position(timestamp) {
            return position;
        }
        self.as_slice().binary_search(timestamp).ok()
    }

    pub fn contains(&self, timestamp: &Timestamp) -> bool {
        self.position(timestamp).is_some()
    }

    /// Direct position arithmetic for regular indices with a fixed step.
    ///
    /// The outer `None` means the shortcut does not apply.
    fn closed_form_position(&self, timestamp: &Timestamp) -> Option<Option<usize>> {
        let step = self.frequency?.fixed_step()?.num_nanoseconds()? as i128;
        let first = self.first()?;
        let offset = timestamp.nanos_since(first);
        if offset < 0 || offset % step != 0 {
            return Some(None);
        }
        let position = usize::try_from(offset / step).ok().filter(|p| *p < self.len());
        Some(position.filter(|p| self.as_slice()[*p] == *timestamp))
    }

    /// Matches a key against the index.
    ///
    /// Full keys match one instant. Partial keys match every instant in
    /// `[floor, ceil)` of their precision and collapse to [`Selection::Exact`]
    /// when only one position falls inside. Range keys always yield a
    /// [`Selection::Range`], even over a single position.
    ///
    /// Key timestamps without an offset are read in the offset of the
    /// index's first timestamp.
    pub fn resolve(&self, key: &Key) -> Selection {
        match self.first().and_then(|first| first.offset()) {
            Some(offset) => self.resolve_local(&key.in_offset(offset)),
            None => self.resolve_local(key),
        }
    }

    fn resolve_local(&self, key: &Key) -> Selection {
        match key {
            Key::Full(timestamp) => self
                .position(timestamp)
                .map_or(Selection::NotFound, Selection::Exact),
            Key::Partial(..) => match self.span(&key.lower(), &key.upper()) {
                span if span.is_empty() => Selection::NotFound,
                span if span.len() == 1 => Selection::Exact(span.start),
                span => Selection::Range(span),
            },
            Key::Range(..) => match self.span(&key.lower(), &key.upper()) {
                span if span.is_empty() => Selection::NotFound,
                span => Selection::Range(span),
            },
        }
    }

    /// Resolves many keys in parallel; resolution only reads the index.
    pub fn resolve_many(&self, keys: &[Key]) -> Vec<Selection> {
        keys.par_iter().map(|key| self.resolve(key)).collect()
    }

    fn span(&self, lower: &Timestamp, upper: &Upper) -> Range<usize> {
        let stamps = self.as_slice();
        let start = stamps.partition_point(|t| t < lower);
        let end = match upper {
            Upper::Inclusive(bound) => stamps.partition_point(|t| t <= bound),
            Upper::Exclusive(bound) => stamps.partition_point(|t| t < bound),
            Upper::Unbounded => stamps.len(),
        };
        start..end.max(start)
    }

    /// View over a contiguous run of positions sharing this index's storage.
    ///
    /// A contiguous run of a regular index is itself regular.
    pub fn slice(&self, positions: Range<usize>) -> Result<Self> {
        if positions.start > positions.end || positions.end > self.len() {
            return Err(Error::OutOfRange(format!(
                "positions {positions:?} of an index of length {}",
                self.len()
            )));
        }
        Ok(Self {
            stamps: Arc::clone(&self.stamps),
            window: self.window.start + positions.start..self.window.start + positions.end,
            frequency: self.frequency,
        })
    }

    /// Sub-index over arbitrary ordered positions.
    ///
    /// Contiguous positions give a shared view; anything else is copied and
    /// marked irregular.
    pub fn select(&self, positions: &[usize]) -> Result<Self> {
        let contiguous = positions.windows(2).all(|pair| pair[1] == pair[0] + 1);
        if contiguous {
            let start = positions.first().copied().unwrap_or(0);
            return self.slice(start..start + positions.len());
        }
        if !positions.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(Error::InvalidSpecification(
                "positions must be strictly increasing".to_string(),
            ));
        }
        let stamps = positions
            .iter()
            .map(|&p| {
                self.get(p)
                    .copied()
                    .ok_or_else(|| Error::OutOfRange(format!("position {p}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::build(stamps, None))
    }

    /// A new regular index moved by `periods` steps of its frequency.
    pub fn shift(&self, periods: i64) -> Result<Self> {
        let frequency = self.frequency.ok_or_else(|| {
            Error::InvalidSpecification("only a regular index can be shifted".to_string())
        })?;
        let Some(first) = self.first() else {
            return Ok(Self::build(Vec::new(), Some(frequency)));
        };
        let mut start = *first;
        for _ in 0..periods.unsigned_abs() {
            start = if periods > 0 {
                frequency.advance(&start)?
            } else {
                frequency.retreat(&start)?
            };
        }
        let stamps = DateRange::new(frequency).start(start).periods(self.len()).generate()?;
        Ok(Self::build(stamps, Some(frequency)))
    }

    /// A new index that also contains `timestamp`; the receiver is untouched.
    ///
    /// Inserting a new instant gives an irregular index. An instant already
    /// present returns an equal index with the same regularity.
    pub fn with_inserted(&self, timestamp: Timestamp) -> Self {
        let mut stamps = self.as_slice().to_vec();
        match stamps.binary_search(&timestamp) {
            Ok(_) => self.clone(),
            Err(at) => {
                stamps.insert(at, timestamp);
                Self::build(stamps, None)
            }
        }
    }
}

impl Labels for DateIndex {
    fn len(&self) -> usize {
        DateIndex::len(self)
    }

    fn resolve(&self, key: &Key) -> Selection {
        DateIndex::resolve(self, key)
    }

    fn is_date(&self) -> bool {
        true
    }
}

/// Indices are equal when they hold the same instants; regularity metadata is not compared.
impl PartialEq for DateIndex {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for DateIndex {}

impl<'a> IntoIterator for &'a DateIndex {
    type Item = &'a Timestamp;
    type IntoIter = std::slice::Iter<'a, Timestamp>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
