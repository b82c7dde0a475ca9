use crate::Result;
use crate::facts::{Record, ScrapeTable};
use ohno::IntoAppError;
use serde::Serialize;
use std::io::Write;

/// Write a table as CSV, header row first.
pub fn generate<R: Record, W: Write>(table: &ScrapeTable<R>, writer: W) -> Result<()> {
    generate_rows(R::COLUMNS, table, writer)
}

/// Write arbitrary serializable rows as CSV under the given header.
///
/// The header is written even when there are no rows.
pub fn generate_rows<'a, T, W>(columns: &[&str], rows: impl IntoIterator<Item = &'a T>, writer: W) -> Result<()>
where
    T: Serialize + 'a,
    W: Write,
{
    let mut csv_writer = ::csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(columns).into_app_err("unable to write CSV header")?;

    for row in rows {
        csv_writer.serialize(row).into_app_err("unable to write CSV row")?;
    }

    csv_writer.flush().into_app_err("unable to flush CSV output")?;
    Ok(())
}
