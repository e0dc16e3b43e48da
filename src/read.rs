use crate::data::{Error, RawRecord, REQUIRED_COLUMNS};
use anyhow::Context;

/// Field separator of the published dataset.
pub const DEFAULT_DELIMITER: u8 = b';';

/// CSV importer for `RawRecord`s. The header row must carry every column in
/// `REQUIRED_COLUMNS`; anything else in the file is ignored.
pub(crate) fn read_raw_records<R: std::io::Read>(
    reader: R,
    delimiter: u8,
) -> Result<Vec<RawRecord>, anyhow::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("Failed to read header row")?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing).into());
    }
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result.context("Failed to read record")?;
        records.push(record);
    }
    tracing::debug!("read {} raw records", records.len());
    Ok(records)
}
