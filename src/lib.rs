//! Date-aware ordered indexes for labelled containers.
//!
//! A [`DateIndex`] is a sorted sequence of [`Timestamp`]s, either generated by
//! a [`Frequency`] through a [`DateRange`] or built from raw data. Keys may be
//! complete timestamps, partial dates such as `"2012-4"` that cover every
//! matching instant, or inclusive ranges between two such literals.
//! [`Vector`] and [`DataFrame`] read and write their values through these keys.
//!
//! ```
//! use datetime_index::{DateIndex, DateRange, Frequency, Key, Selection, Timestamp};
//!
//! let index = DateIndex::date_range(
//!     &DateRange::new(Frequency::Hourly)
//!         .start(Timestamp::parse("2012-4-4")?)
//!         .end(Timestamp::parse("2012-4-7 23:00")?),
//! )?;
//! assert_eq!(index.resolve(&Key::parse("2012-4-4")?), Selection::Range(0..24));
//! # Ok::<(), datetime_index::Error>(())
//! ```

pub mod error;
pub mod frame;
pub mod frequency;
pub mod index;
pub mod key;
pub mod range;
pub mod resolve;
pub mod storage;
pub mod store;
pub mod timestamp;
pub mod vector;

pub use error::{Error, Result};
pub use frame::DataFrame;
pub use frequency::{Anchor, Frequency, TimeUnit};
pub use index::{DateIndex, Duplicates};
pub use key::{IntoKey, Key, Upper};
pub use range::{DateRange, generate};
pub use resolve::{Labels, Lookup, Selection, locate};
pub use storage::{AssignPayload, Storage};
pub use store::{load_index, read_series_csv, read_timestamps_csv, save_index};
pub use timestamp::{Precision, Timestamp};
pub use vector::Vector;
