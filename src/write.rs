use crate::data::{AggregatedResult, Table};
use std::io::Write;

/// CSV exporter for one aggregation
pub(crate) fn write_aggregate<W: Write>(
    writer: W,
    result: &AggregatedResult,
) -> Result<(), anyhow::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in &result.rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Dumps the whole normalized table, derived columns included
pub(crate) fn write_table<W: Write>(
    writer: W,
    table: &Table,
    delimiter: u8,
) -> Result<(), anyhow::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    for record in table.records() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub(crate) fn write_authors<W: Write>(
    mut writer: W,
    table: &Table,
) -> Result<(), anyhow::Error> {
    for author in table.authors() {
        writeln!(writer, "{author}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_aggregate, write_authors, write_table};
    use crate::{
        compute::aggregate,
        data::{Dimension, SignPolicy},
        normalize::load_table,
        read::DEFAULT_DELIMITER,
    };

    const SOURCE: &str = "\
Data;Valor Pago;Autor da Emenda;Órgão;Ação Orçamentária;Função (Área de Atuação);Subfunção (Especificação da Área de Atuação);Programa Orçamentário;UF DO FAVORECIDO
2025-03-25;1.000,5;B;36000 - Saúde;2E90 - Apoio;10 - Saúde;302 - Hospital;5018 - Atenção Especializada;RJ
bad;-250,00;A;36000 - Saúde;2E90 - Apoio;10 - Saúde;302 - Hospital;5018 - Atenção Especializada;RJ
2025-04-01;250,00;A;36000 - Saúde;2E90 - Apoio;10 - Saúde;302 - Hospital;5018 - Atenção Especializada;RJ
";

    #[test]
    fn test_write_aggregate() {
        let table = load_table(SOURCE.as_bytes(), DEFAULT_DELIMITER, SignPolicy::Strip).unwrap();
        let result = aggregate(&table, "A", Dimension::AgencyAndAction).unwrap();
        let mut out = Vec::new();
        write_aggregate(&mut out, &result).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\
path,label,amount
36000 - Saúde > 2E90 - Apoio > 10 - Saúde > 302 - Hospital,302 - Hospital,500.00
"
        );

        let result = aggregate(&table, "B", Dimension::Program).unwrap();
        let mut out = Vec::new();
        write_aggregate(&mut out, &result).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\
path,label,amount
5018 - Atenção Especializada,Atenção Especializada,1000.50
"
        );
    }

    #[test]
    fn test_write_table() {
        let table = load_table(SOURCE.as_bytes(), DEFAULT_DELIMITER, SignPolicy::Strip).unwrap();
        let mut out = Vec::new();
        write_table(&mut out, &table, DEFAULT_DELIMITER).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with(";UF DO FAVORECIDO;Mes;Ano"));
        assert!(lines[1].starts_with("2025-03-25;1000.50;B;"));
        assert!(lines[1].ends_with(";RJ;3;2025"));
        assert!(lines[2].starts_with(";250.00;A;"));
        assert!(lines[2].ends_with(";RJ;;"));
    }

    #[test]
    fn test_write_authors() {
        let table = load_table(SOURCE.as_bytes(), DEFAULT_DELIMITER, SignPolicy::Strip).unwrap();
        let mut out = Vec::new();
        write_authors(&mut out, &table).unwrap();
        assert_eq!(out, b"A\nB\n");
    }
}
