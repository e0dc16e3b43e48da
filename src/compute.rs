use crate::data::{
    AggregatedResult, AggregatedRow, Dimension, Error, Record, Summary, Table, CURRENCY_SCALE,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Sums `author`'s payments along `dimension`.
///
/// This happens in two stages that must stay apart: grouping is done on the raw cell
/// values (`"10 - Saúde"`), and only once the groups are final are the display labels
/// derived from them. Two codes sharing a name therefore stay two groups.
pub(crate) fn aggregate(
    table: &Table,
    author: &str,
    dimension: Dimension,
) -> Result<AggregatedResult, Error> {
    if !table.contains_author(author) {
        return Err(Error::NotFound(author.to_string()));
    }
    let groups = group_sum(table.by_author(author), dimension)
        .ok_or_else(|| Error::AmountOverflow(author.to_string()))?;
    let mut rows: Vec<AggregatedRow> = groups
        .into_iter()
        .map(|(path, amount)| AggregatedRow {
            label: display_label(&path, dimension),
            path: path.into_iter().map(String::from).collect(),
            amount,
        })
        .collect();
    if dimension.ranked() {
        // stable, so equal amounts keep their key order
        rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    }
    tracing::debug!("{} groups for {author:?} along {dimension}", rows.len());
    Ok(AggregatedResult {
        author: author.to_string(),
        dimension,
        rows,
    })
}

/// Every key path that has at least one record, with the sum of its amounts. `None`
/// when a sum doesn't fit in a `Decimal`.
fn group_sum<'a, I>(records: I, dimension: Dimension) -> Option<BTreeMap<Vec<&'a str>, Decimal>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: BTreeMap<Vec<&'a str>, Decimal> = BTreeMap::new();
    for record in records {
        let path = dimension
            .columns()
            .iter()
            .map(|column| record.category(*column))
            .collect();
        let sum = groups.entry(path).or_default();
        *sum = sum.checked_add(record.amount_paid)?;
    }
    Some(groups)
}

fn display_label(path: &[&str], dimension: Dimension) -> String {
    let leaf = path.last().copied().unwrap_or_default();
    strip_code(leaf, dimension.label_prefix_len())
}

/// Drops the fixed-width `"0500 - "`-style code in front of a label.
fn strip_code(value: &str, width: usize) -> String {
    if width == 0 {
        return value.to_string();
    }
    value.chars().skip(width).collect::<String>().trim().to_string()
}

pub(crate) fn total_paid(table: &Table, author: &str) -> Result<Decimal, Error> {
    if !table.contains_author(author) {
        return Err(Error::NotFound(author.to_string()));
    }
    checked_sum(table.by_author(author).map(|r| r.amount_paid))
        .ok_or_else(|| Error::AmountOverflow(author.to_string()))
}

/// Like `Sum`, but `None` instead of a panic on overflow.
pub(crate) fn checked_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

pub(crate) fn summarize(table: &Table, author: &str) -> Result<Summary, Error> {
    let total_paid = total_paid(table, author)?;
    Ok(Summary {
        author: author.to_string(),
        records: table.by_author(author).count(),
        total_paid,
        total_paid_millions: (total_paid / dec!(1_000_000)).round_dp(CURRENCY_SCALE),
    })
}
