use crate::error::{Error, Result};
use crate::index::{DateIndex, Duplicates};
use crate::key::IntoKey;
use crate::resolve::{self, Lookup, Selection};
use crate::storage::{self, AssignPayload, Storage};
use crate::timestamp::Timestamp;
use std::marker::PhantomData;

/// A column of values labelled by a [`DateIndex`].
///
/// Values live in any [`Storage`]; `Vec<T>` is the default.
///
/// # Example
///
/// ```
/// use datetime_index::{AssignPayload, DateIndex, DateRange, Frequency, Lookup, Timestamp, Vector};
///
/// let index = DateIndex::date_range(
///     &DateRange::new(Frequency::Daily).start(Timestamp::parse("2012")?).periods(5),
/// )?;
/// let mut vector = Vector::new(vec![1, 2, 3, 4, 5], index)?;
/// vector.set("2012-1-4", AssignPayload::Scalar(666))?;
/// assert_eq!(vector.values(), &[1, 2, 3, 666, 5]);
/// assert_eq!(vector.get("2012-1-4")?, Lookup::Single(666));
/// # Ok::<(), datetime_index::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T, S = Vec<T>> {
    values: S,
    index: DateIndex,
    item: PhantomData<T>,
}

impl<T: Clone> Vector<T> {
    /// Builds a vector from `(label, value)` pairs given in any order.
    ///
    /// Each value stays with its label; the pairs are sorted stably by label.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Timestamp, T)>,
        duplicates: Duplicates,
    ) -> Result<Self> {
        let (index, values) = DateIndex::from_labeled(pairs, duplicates)?;
        Self::new(values, index)
    }
}

impl<T: Clone, S: Storage<Item = T>> Vector<T, S> {
    /// `values[i]` is labelled by `index[i]`.
    pub fn new(values: S, index: DateIndex) -> Result<Self> {
        if values.len() != index.len() {
            return Err(Error::LengthMismatch {
                expected: index.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            values,
            index,
            item: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &S {
        &self.values
    }

    pub fn index(&self) -> &DateIndex {
        &self.index
    }

    pub fn into_values(self) -> S {
        self.values
    }

    /// `(label, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, &T)> {
        self.index
            .iter()
            .enumerate()
            .filter_map(|(position, label)| Some((label, self.values.get(position)?)))
    }

    /// Reads the element at an exact match, or the sub-vector a partial or range key covers.
    pub fn get(&self, key: impl IntoKey) -> Result<Lookup<T, Vector<T, S>>> {
        match resolve::locate(&self.index, key)? {
            Selection::Exact(position) => self
                .values
                .get(position)
                .cloned()
                .map(Lookup::Single)
                .ok_or_else(|| Error::OutOfRange(format!("position {position}"))),
            selection => Ok(Lookup::Slice(self.take(selection.positions())?)),
        }
    }

    /// Like [`Vector::get`] with a key that matches nothing read as `None`.
    pub fn try_get(&self, key: impl IntoKey) -> Result<Option<Lookup<T, Vector<T, S>>>> {
        match self.get(key) {
            Ok(found) => Ok(Some(found)),
            Err(Error::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Writes through a key. No positions are created for unmatched keys.
    pub fn set(&mut self, key: impl IntoKey, payload: AssignPayload<T>) -> Result<()> {
        let selection = resolve::locate(&self.index, key)?;
        storage::assign(&mut self.values, selection.positions(), payload)
    }

    /// Sub-vector over contiguous positions, sharing the index storage.
    pub fn take(&self, positions: std::ops::Range<usize>) -> Result<Vector<T, S>> {
        Ok(Vector {
            values: self.values.slice(positions.clone())?,
            index: self.index.slice(positions)?,
            item: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{Anchor, Frequency};
    use crate::range::DateRange;
    use std::collections::VecDeque;

    fn hourly() -> Vector<i32> {
        let range = DateRange::new(Frequency::Hourly)
            .start(Timestamp::from_ymd(2012, 4, 4).unwrap())
            .end(Timestamp::from_ymd(2012, 4, 7).unwrap());
        let index = DateIndex::date_range(&range).unwrap();
        Vector::new(vec![23; index.len()], index).unwrap()
    }

    #[test]
    fn complete_date_returns_the_element() {
        let vector = hourly();
        assert_eq!(vector.get("2012-4-4 22:00:00").unwrap(), Lookup::Single(23));
        let native = chrono::NaiveDate::from_ymd_opt(2012, 4, 4)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        assert_eq!(vector.get(native).unwrap(), Lookup::Single(23));
    }

    #[test]
    fn partial_date_returns_a_slice() {
        let vector = hourly();
        let slice = vector.get("2012-4-4").unwrap().slice().unwrap();
        let expected_index = DateIndex::date_range(
            &DateRange::new(Frequency::Hourly)
                .start(Timestamp::from_ymd(2012, 4, 4).unwrap())
                .periods(24),
        )
        .unwrap();
        assert_eq!(slice, Vector::new(vec![23; 24], expected_index).unwrap());
        assert!(slice.index().shares_storage(vector.index()));
        assert!(slice.index().is_regular());
    }

    #[test]
    fn range_returns_a_slice_over_both_days() {
        let vector = hourly();
        let both = vector.get("2012-4-4"..="2012-4-5").unwrap().slice().unwrap();
        assert_eq!(both.len(), 48);
        assert_eq!(both.index().last(), Some(&Timestamp::from_ymd_hms(2012, 4, 5, 23, 0, 0).unwrap()));
    }

    #[test]
    fn exact_write_changes_one_element() {
        let index = DateIndex::date_range(
            &DateRange::new(Frequency::Daily)
                .start(Timestamp::parse("2012").unwrap())
                .periods(5),
        )
        .unwrap();
        let mut vector = Vector::new(vec![1, 2, 3, 4, 5], index.clone()).unwrap();
        vector.set("2012-1-4", AssignPayload::Scalar(666)).unwrap();
        assert_eq!(vector, Vector::new(vec![1, 2, 3, 666, 5], index).unwrap());
    }

    #[test]
    fn partial_write_broadcasts() {
        let index = DateIndex::date_range(
            &DateRange::new(Frequency::Monthly(Anchor::Begin))
                .start(Timestamp::parse("2012").unwrap())
                .periods(100),
        )
        .unwrap();
        let pattern: Vec<i32> = (1..=10).cycle().take(100).collect();
        let mut vector = Vector::new(pattern, index).unwrap();
        vector.set("2012", AssignPayload::Scalar(666)).unwrap();

        let mut expected = vec![666; 12];
        expected.extend(3..=10);
        expected.extend((1..=10).cycle().take(80));
        assert_eq!(vector.values(), expected.as_slice());

        let read = vector.get("2012").unwrap().slice().unwrap();
        assert!(read.values().iter().all(|v| *v == 666));
    }

    #[test]
    fn sequence_write_checks_length_first() {
        let mut vector = hourly();
        let err = vector.set("2012-4-4", AssignPayload::from(vec![1; 23])).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 24, actual: 23 }));
        assert!(vector.values().iter().all(|v| *v == 23));

        vector.set("2012-4-5", AssignPayload::Sequence((0..24).collect())).unwrap();
        assert_eq!(vector.get("2012-4-5 05").unwrap(), Lookup::Single(5));
    }

    #[test]
    fn unmatched_keys_fail_without_insertion() {
        let mut vector = hourly();
        assert!(matches!(vector.get("2013"), Err(Error::KeyNotFound(_))));
        assert!(matches!(vector.set("2013", AssignPayload::Scalar(1)), Err(Error::KeyNotFound(_))));
        assert_eq!(vector.try_get("2013").unwrap(), None);
        assert!(matches!(vector.get("2013-xx"), Err(Error::Parse { .. })));
        assert_eq!(vector.len(), 73);
    }

    #[test]
    fn pairs_in_file_order_keep_their_labels() {
        let pairs = [
            (Timestamp::from_ymd(2012, 3, 1).unwrap(), 30),
            (Timestamp::from_ymd(2012, 1, 1).unwrap(), 10),
            (Timestamp::from_ymd(2012, 2, 1).unwrap(), 20),
        ];
        let vector = Vector::from_pairs(pairs, Duplicates::Reject).unwrap();
        assert_eq!(vector.get("2012-1-1").unwrap(), Lookup::Single(10));
        assert_eq!(vector.get("2012-3").unwrap(), Lookup::Single(30));
        assert_eq!(vector.values(), &[10, 20, 30]);
    }

    /// Storage that keeps values in a ring buffer.
    #[derive(Debug, Clone, PartialEq)]
    struct Ring(VecDeque<i32>);

    impl Storage for Ring {
        type Item = i32;

        fn len(&self) -> usize {
            self.0.len()
        }

        fn get(&self, position: usize) -> Option<&i32> {
            self.0.get(position)
        }

        fn set(&mut self, position: usize, value: i32) -> Result<()> {
            let slot = self
                .0
                .get_mut(position)
                .ok_or_else(|| Error::OutOfRange(format!("position {position}")))?;
            *slot = value;
            Ok(())
        }

        fn slice<I: IntoIterator<Item = usize>>(&self, positions: I) -> Result<Self> {
            positions
                .into_iter()
                .map(|p| self.0.get(p).copied().ok_or_else(|| Error::OutOfRange(format!("position {p}"))))
                .collect::<Result<VecDeque<_>>>()
                .map(Ring)
        }
    }

    #[test]
    fn other_storage_behind_the_same_keys() {
        let index = DateIndex::date_range(
            &DateRange::new(Frequency::Daily)
                .start(Timestamp::parse("2012").unwrap())
                .periods(40),
        )
        .unwrap();
        let mut vector = Vector::new(Ring((0..40).collect()), index).unwrap();
        vector.set("2012-2", AssignPayload::Scalar(-1)).unwrap();
        assert_eq!(vector.get("2012-1-31").unwrap(), Lookup::Single(30));

        let february = vector.get("2012-2").unwrap().slice().unwrap();
        assert_eq!(february.values(), &Ring(VecDeque::from(vec![-1; 9])));
        assert_eq!(february.iter().count(), 9);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let index = DateIndex::from_raw([Timestamp::from_ymd(2012, 1, 1).unwrap()]);
        assert!(matches!(
            Vector::new(vec![1, 2], index),
            Err(Error::LengthMismatch { expected: 1, actual: 2 })
        ));
    }
}
