mod telemetry;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ipoteka_core::{
    compute_quote, extract_as_of, render_report, validate, LookupData, ParsedRequest, QuoteResult,
};
use serde::Serialize;

/// Shortest request worth extracting.
const MIN_INPUT_CHARS: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "ipoteka",
    about = "Расчет ипотечного страхования по текстовому запросу",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Lookup data file (YAML); the bundled tariffs are used otherwise
    #[arg(long, global = true, env = "IPOTEKA_LOOKUP")]
    lookup: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, validate and price a request
    Quote(RequestArgs),
    /// Show what was extracted from a request, without pricing
    Extract(RequestArgs),
    /// Load and check the lookup data
    CheckData,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Request text; read from --file or stdin when omitted
    text: Option<String>,

    /// Read the request from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Evaluation date for borrower ages (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Serialize)]
struct QuoteOutput<'a> {
    request: &'a ParsedRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote: Option<&'a QuoteResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = telemetry::init(&cli.log_level) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Request failed");
            eprintln!("Произошла ошибка при обработке запроса: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let owned;
    let lookup: &LookupData = match &cli.lookup {
        Some(path) => {
            owned = LookupData::from_yaml_file(path)
                .with_context(|| format!("failed to load lookup data from {}", path.display()))?;
            &owned
        }
        None => LookupData::bundled().context("failed to load bundled lookup data")?,
    };

    match cli.command {
        Command::Quote(args) => quote(&args, lookup),
        Command::Extract(args) => extract(&args, lookup),
        Command::CheckData => {
            println!(
                "Справочник {}: банков {}, таблиц жизни {}",
                lookup.version,
                lookup.banks.len(),
                lookup.life_tables.len()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn quote(args: &RequestArgs, lookup: &LookupData) -> Result<ExitCode> {
    let text = read_request(args)?;
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let request = extract_as_of(&text, &lookup.banks, as_of);

    let (quote, errors) = match validate(&request, lookup) {
        Ok(()) => (Some(compute_quote(&request, lookup)?), Vec::new()),
        Err(errors) => (None, errors),
    };
    let code = if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    };

    match args.format {
        OutputFormat::Text => match &quote {
            Some(quote) => print!("{}", render_report(quote)),
            None => {
                println!("Не удалось рассчитать: в запросе не хватает данных");
                for error in &errors {
                    println!("- {}", error);
                }
            }
        },
        format => {
            let output = QuoteOutput {
                request: &request,
                quote: quote.as_ref(),
                errors,
            };
            print_structured(&output, format)?;
        }
    }
    Ok(code)
}

fn extract(args: &RequestArgs, lookup: &LookupData) -> Result<ExitCode> {
    let text = read_request(args)?;
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let request = extract_as_of(&text, &lookup.banks, as_of);

    match args.format {
        // Extraction has no report of its own; text falls back to YAML.
        OutputFormat::Text | OutputFormat::Yaml => print_structured(&request, OutputFormat::Yaml)?,
        OutputFormat::Json => print_structured(&request, OutputFormat::Json)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("failed to encode JSON")?,
        OutputFormat::Yaml | OutputFormat::Text => {
            serde_yaml::to_string(value).context("failed to encode YAML")?
        }
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn read_request(args: &RequestArgs) -> Result<String> {
    let text = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };
    if text.trim().chars().count() < MIN_INPUT_CHARS {
        bail!("Введите текст запроса");
    }
    Ok(text)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
