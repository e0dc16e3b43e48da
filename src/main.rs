use anyhow::Context;
use cli::{Args, Command};
use compute::{aggregate, summarize};
use config::{Config, DEFAULT_CONFIG_FILE};
use data::{Error, SignPolicy, Table};
use normalize::load_table;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use write::{write_aggregate, write_authors, write_table};

mod cli;
mod compute;
mod config;
mod data;
mod normalize;
mod read;
mod write;

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse_args();
    if args.command == Command::InitConfig {
        return init_config();
    }
    init_logging(&args);

    let mut config = Config::load_or_default(args.config.as_deref())?;
    merge_args(&mut config, &args);

    let path = PathBuf::from(&config.source.path);
    let delimiter = config.source.delimiter_byte()?;
    let policy = SignPolicy::from(&config.normalize);
    tracing::debug!("loading {} with {policy:?}", path.display());
    let table = load_table(
        std::fs::File::open(&path)
            .with_context(|| format!("Failed to open dataset: {}", path.display()))?,
        delimiter,
        policy,
    )
    .with_context(|| format!("Failed to load dataset: {}", path.display()))?;

    match &args.command {
        Command::Authors => write_authors(std::io::stdout().lock(), &table)?,
        Command::Summary { author } => {
            let author = select_author(&table, author.as_deref(), &config)?;
            let summary = summarize(&table, &author)?;
            println!("{}", summary.author);
            println!("R$ {} milhões", summary.total_paid_millions);
            println!("total pago: R$ {}", summary.total_paid);
            println!("registros: {}", summary.records);
        }
        Command::Aggregate { author, dimension } => {
            let author = select_author(&table, author.as_deref(), &config)?;
            let dimension = dimension.unwrap_or(config.report.default_dimension);
            let result = aggregate(&table, &author, dimension)?;
            eprintln!(
                "{} de {} no ano {}",
                result.dimension.title(),
                result.author,
                config.report.year
            );
            if let Some(total) = result.total() {
                tracing::info!("{} groups, R$ {total} in total", result.rows.len());
            }
            write_aggregate(std::io::stdout().lock(), &result)?;
        }
        Command::Table => write_table(std::io::stdout().lock(), &table, delimiter)?,
        // handled before the dataset is loaded
        Command::InitConfig => {}
    }
    Ok(())
}

/// Initialize logging on stderr, `RUST_LOG` taking precedence over the flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(args.log_level().into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn init_config() -> Result<(), anyhow::Error> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{DEFAULT_CONFIG_FILE} already exists. Remove it first or edit it manually.");
    }
    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("Failed to write {DEFAULT_CONFIG_FILE}"))?;
    println!("Created {DEFAULT_CONFIG_FILE} with default settings.");
    Ok(())
}

fn merge_args(config: &mut Config, args: &Args) {
    if let Some(data) = &args.data {
        config.source.path = data.display().to_string();
    }
    if let Some(delimiter) = args.delimiter {
        config.source.delimiter = delimiter;
    }
    if args.treat_sign_as_negation {
        config.normalize.treat_sign_as_negation = true;
    }
}

/// An explicitly requested author must exist; the configured default may not, in
/// which case the first author in sorted order stands in for it.
fn select_author(
    table: &Table,
    requested: Option<&str>,
    config: &Config,
) -> Result<String, Error> {
    if let Some(author) = requested {
        return if table.contains_author(author) {
            Ok(author.to_string())
        } else {
            Err(Error::NotFound(author.to_string()))
        };
    }
    if let Some(author) = config.report.default_author.as_deref() {
        if table.contains_author(author) {
            return Ok(author.to_string());
        }
        tracing::warn!("default author {author:?} is not in the dataset");
    }
    table
        .authors()
        .first()
        .map(|a| a.to_string())
        .ok_or_else(|| Error::NotFound(String::new()))
}

#[cfg(test)]
mod tests {
    use super::{merge_args, select_author};
    use crate::{
        cli::Args,
        config::Config,
        data::{Error, RawRecord, SignPolicy},
        normalize::normalize,
    };
    use clap::Parser;

    fn table(authors: &[&str]) -> crate::data::Table {
        normalize(
            authors.iter().map(|a| RawRecord {
                author: a.to_string(),
                amount_paid: "1,00".into(),
                ..RawRecord::default()
            }),
            SignPolicy::Strip,
        )
        .unwrap()
    }

    #[test]
    fn test_select_author() {
        let config = Config::default();
        let t = table(&["ZÉ", "BANCADA DO RIO DE JANEIRO", "ANA"]);
        assert_eq!(
            select_author(&t, None, &config),
            Ok("BANCADA DO RIO DE JANEIRO".to_string())
        );
        assert_eq!(select_author(&t, Some("ZÉ"), &config), Ok("ZÉ".to_string()));
        assert_eq!(
            select_author(&t, Some("NINGUÉM"), &config),
            Err(Error::NotFound("NINGUÉM".into()))
        );
        let t = table(&["ZÉ", "ANA"]);
        assert_eq!(select_author(&t, None, &config), Ok("ANA".to_string()));
    }

    #[test]
    fn test_merge_args() {
        let mut config = Config::default();
        let args = Args::parse_from([
            "emendas",
            "--data",
            "dados.csv",
            "--treat-sign-as-negation",
            "authors",
        ]);
        merge_args(&mut config, &args);
        assert_eq!(config.source.path, "dados.csv");
        assert_eq!(config.source.delimiter, ';');
        assert_eq!(SignPolicy::from(&config.normalize), SignPolicy::Negate);
    }
}
