//! Two-dimensional container with date labels on both axes.
//!
//! Rows are labelled by `index`, columns by `order`. Values are stored
//! column-major: `columns[j]` is one [`Storage`] holding the cells of column `j`.

use crate::error::{Error, Result};
use crate::index::{DateIndex, Duplicates};
use crate::key::IntoKey;
use crate::resolve::{self, Lookup, Selection};
use crate::storage::{self, AssignPayload, Storage};
use crate::timestamp::Timestamp;
use crate::vector::Vector;
use std::marker::PhantomData;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame<T, S = Vec<T>> {
    columns: Vec<S>,
    index: DateIndex,
    order: DateIndex,
    item: PhantomData<T>,
}

impl<T: Clone> DataFrame<T> {
    /// Builds a frame from rows given in any label order.
    ///
    /// Each row holds one cell per column of `order` and stays with its label.
    pub fn from_labeled_rows(
        rows: impl IntoIterator<Item = (Timestamp, Vec<T>)>,
        order: DateIndex,
        duplicates: Duplicates,
    ) -> Result<Self> {
        let (index, rows) = DateIndex::from_labeled(rows, duplicates)?;
        let width = order.len();
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(Error::LengthMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        let mut columns: Vec<Vec<T>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
        for row in rows {
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        Self::new(columns, index, order)
    }
}

impl<T: Clone, S: Storage<Item = T> + Clone> DataFrame<T, S> {
    /// `columns[j]` is labelled by `order[j]`; each column holds one value per row of `index`.
    pub fn new(columns: Vec<S>, index: DateIndex, order: DateIndex) -> Result<Self> {
        if columns.len() != order.len() {
            return Err(Error::LengthMismatch {
                expected: order.len(),
                actual: columns.len(),
            });
        }
        if let Some(column) = columns.iter().find(|c| c.len() != index.len()) {
            return Err(Error::LengthMismatch {
                expected: index.len(),
                actual: column.len(),
            });
        }
        Ok(Self {
            columns,
            index,
            order,
            item: PhantomData,
        })
    }

    /// Builds a frame from columns given in any label order.
    ///
    /// Columns are reordered by label; two columns with the same label fail
    /// with [`Error::DuplicateTimestamp`].
    pub fn from_labeled_columns(
        labeled: impl IntoIterator<Item = (Timestamp, S)>,
        index: DateIndex,
    ) -> Result<Self> {
        let (order, columns) = DateIndex::from_labeled(labeled, Duplicates::Reject)?;
        Self::new(columns, index, order)
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Row labels.
    pub fn index(&self) -> &DateIndex {
        &self.index
    }

    /// Column labels.
    pub fn order(&self) -> &DateIndex {
        &self.order
    }

    pub fn columns(&self) -> &[S] {
        &self.columns
    }

    /// One column as a vector, or the sub-frame of every column the key covers.
    pub fn column(&self, key: impl IntoKey) -> Result<Lookup<Vector<T, S>, DataFrame<T, S>>> {
        match resolve::locate(&self.order, key)? {
            Selection::Exact(position) => {
                let column = self
                    .columns
                    .get(position)
                    .cloned()
                    .ok_or_else(|| Error::OutOfRange(format!("column {position}")))?;
                Ok(Lookup::Single(Vector::new(column, self.index.clone())?))
            }
            selection => Ok(Lookup::Slice(self.take_columns(selection.positions())?)),
        }
    }

    /// One row as a vector labelled by the column order, or the sub-frame of every row the key covers.
    pub fn row(&self, key: impl IntoKey) -> Result<Lookup<Vector<T>, DataFrame<T, S>>> {
        match resolve::locate(&self.index, key)? {
            Selection::Exact(position) => {
                let cells = self
                    .columns
                    .iter()
                    .map(|column| {
                        column
                            .get(position)
                            .cloned()
                            .ok_or_else(|| Error::OutOfRange(format!("row {position}")))
                    })
                    .collect::<Result<Vec<T>>>()?;
                Ok(Lookup::Single(Vector::new(cells, self.order.clone())?))
            }
            selection => Ok(Lookup::Slice(self.take_rows(selection.positions())?)),
        }
    }

    /// Replaces every column the key covers.
    ///
    /// A [`AssignPayload::Scalar`] column is copied into each covered column;
    /// a [`AssignPayload::Sequence`] supplies one column per covered column.
    /// Every supplied column must have one value per row.
    pub fn set_column(&mut self, key: impl IntoKey, payload: AssignPayload<S>) -> Result<()> {
        let selection = resolve::locate(&self.order, key)?;
        let rows = self.nrows();
        if let Some(column) = payload.values().iter().find(|c| c.len() != rows) {
            return Err(Error::LengthMismatch {
                expected: rows,
                actual: column.len(),
            });
        }
        storage::assign(&mut self.columns, selection.positions(), payload)
    }

    /// Sets every cell of every column the key covers to `value`.
    pub fn fill_column(&mut self, key: impl IntoKey, value: T) -> Result<()> {
        let selection = resolve::locate(&self.order, key)?;
        let rows = self.nrows();
        for position in selection.positions() {
            let column = self
                .columns
                .get_mut(position)
                .ok_or_else(|| Error::OutOfRange(format!("column {position}")))?;
            for row in 0..rows {
                column.set(row, value.clone())?;
            }
        }
        Ok(())
    }

    /// Replaces every row the key covers; each supplied row has one value per column.
    pub fn set_row(&mut self, key: impl IntoKey, payload: AssignPayload<Vec<T>>) -> Result<()> {
        let selection = resolve::locate(&self.index, key)?;
        let width = self.ncols();
        if let Some(row) = payload.values().iter().find(|r| r.len() != width) {
            return Err(Error::LengthMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        let positions = selection.positions();
        let rows = payload.broadcast(positions.len())?;
        for (position, row) in positions.zip(rows) {
            for (column, cell) in self.columns.iter_mut().zip(row) {
                column.set(position, cell)?;
            }
        }
        Ok(())
    }

    fn take_columns(&self, positions: Range<usize>) -> Result<DataFrame<T, S>> {
        Ok(DataFrame {
            columns: self.columns.slice(positions.clone())?,
            index: self.index.clone(),
            order: self.order.slice(positions)?,
            item: PhantomData,
        })
    }

    fn take_rows(&self, positions: Range<usize>) -> Result<DataFrame<T, S>> {
        Ok(DataFrame {
            columns: self
                .columns
                .iter()
                .map(|column| column.slice(positions.clone()))
                .collect::<Result<_>>()?,
            index: self.index.slice(positions)?,
            order: self.order.clone(),
            item: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::Frequency;
    use crate::range::DateRange;

    fn day(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    struct Fixture {
        frame: DataFrame<i64>,
        a: Vec<i64>,
        b: Vec<i64>,
        c: Vec<i64>,
    }

    /// Three columns labelled 2012-01-03, 2013-02-03 and 2012-03-03 over 100 daily rows.
    fn fixture() -> Fixture {
        let index = DateIndex::date_range(
            &DateRange::new(Frequency::Daily)
                .start(Timestamp::parse("2012-2-1").unwrap())
                .periods(100),
        )
        .unwrap();
        let a: Vec<i64> = (1..=5).cycle().take(100).collect();
        let b: Vec<i64> = a.iter().map(|v| v * 3).collect();
        let c: Vec<i64> = a.iter().map(|v| v * 10).collect();
        let frame = DataFrame::from_labeled_columns(
            [
                (day(2012, 1, 3), a.clone()),
                (day(2013, 2, 3), b.clone()),
                (day(2012, 3, 3), c.clone()),
            ],
            index,
        )
        .unwrap();
        Fixture { frame, a, b, c }
    }

    #[test]
    fn labeled_columns_are_sorted_by_label() {
        let Fixture { frame, a, b, c } = fixture();
        assert_eq!(frame.columns(), &[a, c, b]);
        assert!(!frame.order().is_regular());
    }

    #[test]
    fn complete_column_key_returns_one_vector() {
        let Fixture { frame, b, c, .. } = fixture();
        let index = frame.index().clone();
        assert_eq!(
            frame.column("2013-2-3").unwrap(),
            Lookup::Single(Vector::new(b, index.clone()).unwrap())
        );
        assert_eq!(
            frame.column("2012-3-3").unwrap(),
            Lookup::Single(Vector::new(c, index).unwrap())
        );
    }

    #[test]
    fn partial_column_key_returns_a_frame() {
        let Fixture { frame, a, c, .. } = fixture();
        let expected = DataFrame::new(
            vec![a, c],
            frame.index().clone(),
            DateIndex::from_raw([day(2012, 1, 3), day(2012, 3, 3)]),
        )
        .unwrap();
        assert_eq!(frame.column("2012").unwrap(), Lookup::Slice(expected));
    }

    #[test]
    fn column_writes_replace_whole_columns() {
        let Fixture { mut frame, a, b, .. } = fixture();
        frame.set_column("2012-3-3", AssignPayload::Scalar(a.clone())).unwrap();
        assert_eq!(frame.columns(), &[a.clone(), a.clone(), b.clone()]);

        frame.set_column("2012", AssignPayload::Scalar(b.clone())).unwrap();
        assert_eq!(frame.columns(), &[b.clone(), b.clone(), b.clone()]);

        frame
            .set_column("2012", AssignPayload::Sequence(vec![a.clone(), vec![0; 100]]))
            .unwrap();
        assert_eq!(frame.columns(), &[a, vec![0; 100], b]);
    }

    #[test]
    fn column_write_shape_errors_leave_frame_untouched() {
        let Fixture { mut frame, .. } = fixture();
        let before = frame.clone();
        assert!(matches!(
            frame.set_column("2012", AssignPayload::Sequence(vec![vec![1; 100]])),
            Err(Error::LengthMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            frame.set_column("2012", AssignPayload::Scalar(vec![1; 99])),
            Err(Error::LengthMismatch { expected: 100, actual: 99 })
        ));
        assert!(matches!(
            frame.set_column("2014", AssignPayload::Scalar(vec![1; 100])),
            Err(Error::KeyNotFound(_))
        ));
        assert_eq!(frame, before);
    }

    #[test]
    fn fill_broadcasts_a_cell_value() {
        let Fixture { mut frame, b, .. } = fixture();
        frame.fill_column("2012", 7).unwrap();
        assert_eq!(frame.columns(), &[vec![7; 100], vec![7; 100], b]);
    }

    #[test]
    fn complete_row_key_returns_a_row_vector() {
        let Fixture { frame, .. } = fixture();
        let row = frame.row("2012-2-1").unwrap().single().unwrap();
        assert_eq!(row.values(), &[1, 10, 3]);
        assert_eq!(row.index(), frame.order());
    }

    #[test]
    fn partial_row_key_returns_a_frame() {
        let Fixture { frame, a, b, c } = fixture();
        let rows = frame.row("2012-2").unwrap().slice().unwrap();
        let index = DateIndex::date_range(
            &DateRange::new(Frequency::Daily)
                .start(Timestamp::parse("2012-2-1").unwrap())
                .periods(29),
        )
        .unwrap();
        let expected = DataFrame::from_labeled_columns(
            [
                (day(2012, 1, 3), a[..29].to_vec()),
                (day(2013, 2, 3), b[..29].to_vec()),
                (day(2012, 3, 3), c[..29].to_vec()),
            ],
            index,
        )
        .unwrap();
        assert_eq!(rows, expected);
        assert!(rows.index().is_regular());
    }

    #[test]
    fn row_writes_broadcast_across_rows() {
        let Fixture { mut frame, .. } = fixture();
        frame.set_row("2012-2-2", AssignPayload::Scalar(vec![0, 0, 0])).unwrap();
        assert_eq!(frame.row("2012-2-2").unwrap().single().unwrap().values(), &[0, 0, 0]);

        frame.set_row("2012-2", AssignPayload::Scalar(vec![9, 8, 7])).unwrap();
        let february = frame.row("2012-2").unwrap().slice().unwrap();
        assert!(february.columns()[0].iter().all(|v| *v == 9));
        assert_eq!(frame.row("2012-3-1").unwrap().single().unwrap().values(), &[5, 50, 15]);

        assert!(matches!(
            frame.set_row("2012-3-1", AssignPayload::Scalar(vec![1, 2])),
            Err(Error::LengthMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn labeled_rows_keep_cells_with_their_labels() {
        let order = DateIndex::from_raw([day(2012, 1, 3), day(2012, 3, 3)]);
        let frame = DataFrame::from_labeled_rows(
            [
                (day(2012, 2, 3), vec![3, 30]),
                (day(2012, 2, 1), vec![1, 10]),
                (day(2012, 2, 2), vec![2, 20]),
            ],
            order,
            Duplicates::Reject,
        )
        .unwrap();
        assert_eq!(frame.columns(), &[vec![1, 2, 3], vec![10, 20, 30]]);
        assert_eq!(frame.row("2012-2-3").unwrap().single().unwrap().values(), &[3, 30]);
        assert!(matches!(
            DataFrame::from_labeled_rows(
                [(day(2012, 2, 1), vec![1])],
                DateIndex::from_raw([day(2012, 1, 3), day(2012, 3, 3)]),
                Duplicates::Drop,
            ),
            Err(Error::LengthMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn shape_is_validated_on_construction() {
        let index = DateIndex::from_raw([day(2012, 1, 1), day(2012, 1, 2)]);
        let order = DateIndex::from_raw([day(2012, 1, 1)]);
        assert!(DataFrame::new(vec![vec![1, 2]], index.clone(), order.clone()).is_ok());
        assert!(DataFrame::new(vec![vec![1]], index.clone(), order.clone()).is_err());
        assert!(DataFrame::new(vec![vec![1, 2], vec![3, 4]], index, order).is_err());
        assert!(matches!(
            DataFrame::from_labeled_columns(
                [(day(2012, 1, 1), vec![1]), (day(2012, 1, 1), vec![2])],
                DateIndex::from_raw([day(2012, 1, 1)]),
            ),
            Err(Error::DuplicateTimestamp(_))
        ));
    }
}
