use datetime_index::{
    Anchor, AssignPayload, DataFrame, DateIndex, DateRange, Duplicates, Error, Frequency, Key, Lookup,
    Selection, Timestamp, Vector,
};
use std::io::Write;

fn ts(literal: &str) -> Timestamp {
    Timestamp::parse(literal).unwrap()
}

#[test]
fn daily_range_resolves_complete_and_partial_keys() -> datetime_index::Result<()> {
    let index = DateIndex::date_range(&DateRange::new(Frequency::Daily).start(ts("2012-2-1")).periods(100))?;
    assert_eq!(index.len(), 100);
    assert_eq!(index.last(), Some(&ts("2012-5-10")));
    assert_eq!(index.resolve(&Key::parse("2012-2-3")?), Selection::Exact(2));
    assert_eq!(index.resolve(&Key::parse("2012-2")?), Selection::Range(0..29));
    assert_eq!(index.resolve(&Key::parse("2012-3..2012-4")?), Selection::Range(29..90));
    assert_eq!(index.resolve(&Key::parse("2013")?), Selection::NotFound);
    Ok(())
}

#[test]
fn anchored_monthly_ranges_cover_one_year_per_year_key() -> datetime_index::Result<()> {
    for anchor in [Anchor::Begin, Anchor::End] {
        let index = DateIndex::date_range(
            &DateRange::new(Frequency::Monthly(anchor)).start(ts("2012")).periods(100),
        )?;
        assert_eq!(index.resolve(&Key::parse("2012")?), Selection::Range(0..12));
        assert_eq!(index.resolve(&Key::parse("2019")?), Selection::Range(84..96));
    }
    Ok(())
}

#[test]
fn csv_input_feeds_an_irregular_vector() -> datetime_index::Result<()> {
    let mut file = tempfile::NamedTempFile::new().map_err(Error::Io)?;
    writeln!(file, "timestamp,price").map_err(Error::Io)?;
    for (stamp, price) in [
        ("2012-03-02 10:15", 3),
        ("2012-01-10 09:30", 1),
        ("2012-01-31 16:00", 2),
        ("2012-03-02 10:15", 9),
    ] {
        writeln!(file, "{stamp},{price}").map_err(Error::Io)?;
    }
    file.flush().map_err(Error::Io)?;

    let rows: Vec<(_, f64)> = datetime_index::read_series_csv(file.path(), "timestamp", "price")?;
    let mut prices = Vector::from_pairs(rows, Duplicates::Drop)?;
    assert_eq!(prices.len(), 3);
    assert!(!prices.index().is_regular());
    assert_eq!(prices.values(), &[1.0, 2.0, 3.0]);
    assert_eq!(prices.get("2012-1-31")?, Lookup::Single(2.0));

    let january = prices.get("2012-1")?.slice().expect("two january rows");
    assert_eq!(january.values(), &[1.0, 2.0]);
    assert_eq!(prices.get("2012-3")?, Lookup::Single(3.0));

    prices.set("2012-1", AssignPayload::Sequence(vec![10.0, 20.0]))?;
    assert_eq!(prices.values(), &[10.0, 20.0, 3.0]);
    assert!(matches!(
        prices.set("2012-1", AssignPayload::Sequence(vec![0.0])),
        Err(Error::LengthMismatch { expected: 2, actual: 1 })
    ));
    Ok(())
}

#[test]
fn saved_index_reloads_behind_a_vector() -> datetime_index::Result<()> {
    let dir = tempfile::tempdir().map_err(Error::Io)?;
    let index = DateIndex::date_range(
        &DateRange::new(Frequency::Hourly).start(ts("2012-4-4")).end(ts("2012-4-7 23:00")),
    )?;
    let idx_path = datetime_index::save_index(&index, dir.path().join("hourly.csv"))?;
    let loaded = datetime_index::load_index(&idx_path)?;
    assert_eq!(loaded.frequency(), Some(Frequency::Hourly));

    let mut vector = Vector::new((0..96).collect::<Vec<i32>>(), loaded)?;
    vector.set("2012-4-5", AssignPayload::Scalar(-1))?;
    assert_eq!(vector.get("2012-4-5 13:00")?, Lookup::Single(-1));
    assert_eq!(vector.get("2012-4-6 00:00")?, Lookup::Single(48));
    Ok(())
}

#[test]
fn dataframe_selects_on_both_axes() -> datetime_index::Result<()> {
    let rows = DateIndex::date_range(&DateRange::new(Frequency::Daily).start(ts("2012-2-1")).periods(100))?;
    let mut frame = DataFrame::from_labeled_columns(
        [
            (ts("2012-1-3"), vec![1; 100]),
            (ts("2013-2-3"), vec![3; 100]),
            (ts("2012-3-3"), vec![10; 100]),
        ],
        rows,
    )?;
    let order: Vec<Timestamp> = frame.order().iter().copied().collect();
    assert_eq!(order, vec![ts("2012-1-3"), ts("2012-3-3"), ts("2013-2-3")]);

    let year = frame.column("2012")?.slice().expect("two columns in 2012");
    assert_eq!(year.ncols(), 2);

    let february = frame.row("2012-2")?.slice().expect("february rows");
    assert_eq!(february.nrows(), 29);
    assert_eq!(february.ncols(), 3);

    frame.fill_column("2013-2-3", 0)?;
    let row = frame.row("2012-5-10")?.single().expect("one row");
    assert_eq!(row.values(), &[1, 10, 0]);
    Ok(())
}
