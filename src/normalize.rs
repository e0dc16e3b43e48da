use crate::{
    data::{Error, RawRecord, Record, SignPolicy, Table},
    read::read_raw_records,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a locale-formatted currency cell (`1.234,56`): `.` groups thousands, `,` marks
/// decimals and `-` may appear anywhere as a sign marker. An empty cell is zero.
pub(crate) fn parse_amount(raw: &str, policy: SignPolicy) -> Result<Decimal, rust_decimal::Error> {
    let negative = raw.contains('-');
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '.' && *c != '-')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let amount = if cleaned.is_empty() {
        Decimal::ZERO
    } else if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        // `Decimal` reads a lone "." as zero
        return Err(rust_decimal::Error::ErrorString(format!("no digits in {raw:?}")));
    } else {
        Decimal::from_str(&cleaned)?
    };
    Ok(match policy {
        SignPolicy::Negate if negative => -amount,
        _ => amount,
    })
}

/// `None` for anything that isn't a valid `YYYY-MM-DD` date.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Turns raw rows into the immutable `Table`. A bad date only loses the date; a bad
/// amount fails the whole load since it would silently corrupt every sum it lands in.
pub(crate) fn normalize<I>(raw_rows: I, policy: SignPolicy) -> Result<Table, Error>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut records = Vec::new();
    let mut undated = 0usize;
    for (index, raw) in raw_rows.into_iter().enumerate() {
        let amount_paid =
            parse_amount(&raw.amount_paid, policy).map_err(|_| Error::InvalidAmount {
                record: index + 1,
                value: raw.amount_paid.clone(),
            })?;
        let date = parse_date(&raw.date);
        if date.is_none() {
            undated += 1;
        }
        records.push(Record {
            date,
            amount_paid,
            author: raw.author,
            agency: raw.agency,
            budget_action: raw.budget_action,
            function: raw.function,
            subfunction: raw.subfunction,
            program: raw.program,
            beneficiary_state: raw.beneficiary_state,
        });
    }
    if undated > 0 {
        tracing::debug!("{undated} of {} records have no valid date", records.len());
    }
    Ok(Table::new(records))
}

/// Reads and normalizes a whole source in one go.
pub(crate) fn load_table<R: std::io::Read>(
    reader: R,
    delimiter: u8,
    policy: SignPolicy,
) -> Result<Table, anyhow::Error> {
    let raw = read_raw_records(reader, delimiter)?;
    let table = normalize(raw, policy)?;
    tracing::info!(
        "loaded {} records from {} authors",
        table.len(),
        table.authors().len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use crate::{
        data::{Error, RawRecord, SignPolicy},
        normalize::{load_table, normalize, parse_amount, parse_date},
        read::DEFAULT_DELIMITER,
    };
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn raw(date: &str, amount: &str) -> RawRecord {
        RawRecord {
            date: date.into(),
            amount_paid: amount.into(),
            author: "A".into(),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1.234,56", SignPolicy::Strip), Ok(dec!(1234.56)));
        assert_eq!(parse_amount("-1.234,56", SignPolicy::Strip), Ok(dec!(1234.56)));
        assert_eq!(parse_amount("1.234,56-", SignPolicy::Strip), Ok(dec!(1234.56)));
        assert_eq!(parse_amount("", SignPolicy::Strip), Ok(dec!(0)));
        assert_eq!(parse_amount("100", SignPolicy::Strip), Ok(dec!(100)));
        assert_eq!(parse_amount("1.000.000,01", SignPolicy::Strip), Ok(dec!(1000000.01)));
    }

    #[test]
    fn test_parse_amount_negate() {
        assert_eq!(parse_amount("-1.234,56", SignPolicy::Negate), Ok(dec!(-1234.56)));
        assert_eq!(parse_amount("500,00-", SignPolicy::Negate), Ok(dec!(-500)));
        assert_eq!(parse_amount("500,00", SignPolicy::Negate), Ok(dec!(500)));
    }

    #[test]
    fn test_parse_amount_garbage() {
        assert!(parse_amount("R$ 10,00", SignPolicy::Strip).is_err());
        assert!(parse_amount("1,2,3", SignPolicy::Strip).is_err());
        assert!(parse_amount("n/a", SignPolicy::Strip).is_err());
        assert!(parse_amount(",", SignPolicy::Strip).is_err());
        assert!(parse_amount("-,", SignPolicy::Negate).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-03-25"), NaiveDate::from_ymd_opt(2025, 3, 25));
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_normalize() {
        let table = normalize(
            [raw("2025-03-25", "1.000,00"), raw("not-a-date", "-300,50")],
            SignPolicy::Strip,
        )
        .unwrap();
        let records = table.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount_paid, dec!(1000));
        assert_eq!(records[0].month(), Some(3));
        assert_eq!(records[0].year(), Some(2025));
        assert_eq!(records[1].date, None);
        assert_eq!(records[1].month(), None);
        assert_eq!(records[1].year(), None);
        assert_eq!(records[1].amount_paid, dec!(300.50));
        assert!(records.iter().all(|r| !r.amount_paid.is_sign_negative()));
    }

    #[test]
    fn test_normalize_bad_amount() {
        assert_eq!(
            normalize(
                [raw("2025-01-01", "1,00"), raw("2025-01-01", "abc")],
                SignPolicy::Strip
            )
            .unwrap_err(),
            Error::InvalidAmount {
                record: 2,
                value: "abc".into()
            }
        );
    }

    #[test]
    fn test_load_table() {
        let csv = "\
Data;Valor Pago;Autor da Emenda;Órgão;Ação Orçamentária;Função (Área de Atuação);Subfunção (Especificação da Área de Atuação);Programa Orçamentário;UF DO FAVORECIDO
2025-03-25;1.000,00;B;O;AC;10 - Saúde;302 - Hospital;5018 - Atenção;RJ
2025-03-26;-250,00;A;O;AC;10 - Saúde;302 - Hospital;5018 - Atenção;RJ
";
        let table = load_table(csv.as_bytes(), DEFAULT_DELIMITER, SignPolicy::Negate).unwrap();
        assert_eq!(table.authors(), ["A", "B"]);
        assert_eq!(table.records()[1].amount_paid, dec!(-250));
    }
}
