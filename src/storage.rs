//! What container adapters need from the values they label.

use crate::error::{Error, Result};

/// Positional value storage behind a vector or a dataframe.
pub trait Storage: Sized {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, position: usize) -> Option<&Self::Item>;

    fn set(&mut self, position: usize, value: Self::Item) -> Result<()>;

    /// New storage holding the values at `positions`, in that order.
    fn slice<I: IntoIterator<Item = usize>>(&self, positions: I) -> Result<Self>;
}

impl<T: Clone> Storage for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, position: usize) -> Option<&T> {
        self.as_slice().get(position)
    }

    fn set(&mut self, position: usize, value: T) -> Result<()> {
        let length = Vec::len(self);
        let slot = self
            .get_mut(position)
            .ok_or_else(|| Error::OutOfRange(format!("position {position} of {length}")))?;
        *slot = value;
        Ok(())
    }

    fn slice<I: IntoIterator<Item = usize>>(&self, positions: I) -> Result<Self> {
        positions
            .into_iter()
            .map(|position| {
                Storage::get(self, position)
                    .cloned()
                    .ok_or_else(|| Error::OutOfRange(format!("position {position} of {}", Vec::len(self))))
            })
            .collect()
    }
}

/// Value written through a key: one value broadcast to every resolved
/// position, or one value per position.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignPayload<V> {
    Scalar(V),
    Sequence(Vec<V>),
}

impl<V: Clone> AssignPayload<V> {
    /// Expands the payload to exactly `count` values.
    ///
    /// Fails with [`Error::LengthMismatch`] before anything is written when a
    /// sequence does not have `count` elements.
    pub fn broadcast(self, count: usize) -> Result<Vec<V>> {
        match self {
            AssignPayload::Scalar(value) => Ok(vec![value; count]),
            AssignPayload::Sequence(values) if values.len() == count => Ok(values),
            AssignPayload::Sequence(values) => Err(Error::LengthMismatch {
                expected: count,
                actual: values.len(),
            }),
        }
    }

    /// Payload elements (one for a scalar).
    pub fn values(&self) -> &[V] {
        match self {
            AssignPayload::Scalar(value) => std::slice::from_ref(value),
            AssignPayload::Sequence(values) => values,
        }
    }
}

impl<V> From<Vec<V>> for AssignPayload<V> {
    fn from(values: Vec<V>) -> Self {
        AssignPayload::Sequence(values)
    }
}

/// Writes the broadcast payload into `storage` at `positions`.
pub(crate) fn assign<S: Storage>(
    storage: &mut S,
    positions: std::ops::Range<usize>,
    payload: AssignPayload<S::Item>,
) -> Result<()>
where
    S::Item: Clone,
{
    if positions.end > storage.len() {
        return Err(Error::OutOfRange(format!(
            "positions {positions:?} of {}",
            storage.len()
        )));
    }
    let values = payload.broadcast(positions.len())?;
    for (position, value) in positions.zip(values) {
        storage.set(position, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_broadcasts_to_every_position() {
        let mut values = vec![1, 2, 3, 4, 5];
        assign(&mut values, 1..4, AssignPayload::Scalar(0)).unwrap();
        assert_eq!(values, vec![1, 0, 0, 0, 5]);
    }

    #[test]
    fn short_sequence_leaves_storage_untouched() {
        let mut values = vec![1, 2, 3, 4, 5];
        let err = assign(&mut values, 0..3, AssignPayload::from(vec![9, 9])).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 3, actual: 2 }));
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn slice_copies_in_position_order() {
        let values = vec!["a", "b", "c", "d"];
        assert_eq!(values.slice([3, 1]).unwrap(), vec!["d", "b"]);
        assert!(values.slice(2..5).is_err());
    }
}
