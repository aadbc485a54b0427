//! Maps lookup keys to positions for container adapters.

use crate::error::{Error, Result};
use crate::key::{IntoKey, Key};
use std::ops::Range;

/// Outcome of matching a key against an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Exact(usize),
    /// Contiguous positions in index order.
    Range(Range<usize>),
    NotFound,
}

impl Selection {
    /// Positions covered by the selection, in index order.
    pub fn positions(&self) -> Range<usize> {
        match self {
            Selection::Exact(position) => *position..*position + 1,
            Selection::Range(range) => range.clone(),
            Selection::NotFound => 0..0,
        }
    }

    pub fn len(&self) -> usize {
        self.positions().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::NotFound)
    }
}

/// Positional lookup capability shared by every index kind a container can carry.
pub trait Labels {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve(&self, key: &Key) -> Selection;

    /// Whether date literals make sense against this index.
    fn is_date(&self) -> bool {
        false
    }
}

/// Resolves `key` against `index`, failing with [`Error::KeyNotFound`] when nothing matches.
pub fn locate<L: Labels + ?Sized>(index: &L, key: impl IntoKey) -> Result<Selection> {
    if !index.is_date() {
        return Err(Error::InvalidSpecification(
            "date keys need a date-typed index".to_string(),
        ));
    }
    let key = key.into_key()?;
    match index.resolve(&key) {
        Selection::NotFound => Err(Error::KeyNotFound(key.to_string())),
        selection => Ok(selection),
    }
}

/// Read result of a container lookup: one element for an exact match, a
/// narrower container for a range.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<One, Many> {
    Single(One),
    Slice(Many),
}

impl<One, Many> Lookup<One, Many> {
    pub fn single(self) -> Option<One> {
        match self {
            Lookup::Single(one) => Some(one),
            Lookup::Slice(_) => None,
        }
    }

    pub fn slice(self) -> Option<Many> {
        match self {
            Lookup::Single(_) => None,
            Lookup::Slice(many) => Some(many),
        }
    }
}
