//! Transaction loader for the canonical record schema
//!
//! CSV with a `date,description,amount` header (plus optional
//! `extended_details`, `statement_description`, `category` columns) or a JSON
//! array of objects with the same fields. Amounts are stored as absolute values.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Transaction;

/// Supported input encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Guess from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown input format: {}", s)),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read every transaction from `path` in one pass.
///
/// `format` overrides detection by extension; unknown extensions are read as CSV.
pub fn load_transactions(path: &Path, format: Option<InputFormat>) -> Result<Vec<Transaction>> {
    let format = format
        .or_else(|| InputFormat::from_path(path))
        .unwrap_or(InputFormat::Csv);
    let reader = BufReader::new(File::open(path)?);

    let transactions = match format {
        InputFormat::Csv => parse_csv(reader)?,
        InputFormat::Json => parse_json(reader)?,
    };

    debug!(
        "Loaded {} transactions from {} ({})",
        transactions.len(),
        path.display(),
        format
    );
    Ok(transactions)
}

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    extended_details: Option<usize>,
    statement_description: Option<usize>,
    category: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::Import(format!("Missing required column: {}", name)))
        };

        Ok(Self {
            date: require("date")?,
            description: require("description")?,
            amount: require("amount")?,
            extended_details: find("extended_details"),
            statement_description: find("statement_description"),
            category: find("category"),
        })
    }
}

/// Parse canonical CSV
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = result?;

        let field = |idx: usize| record.get(idx).unwrap_or("");
        let optional = |idx: Option<usize>| {
            idx.map(field)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let date = parse_date(field(columns.date)).map_err(|e| at_line(line, e))?;
        let amount = parse_amount(field(columns.amount)).map_err(|e| at_line(line, e))?;

        transactions.push(Transaction {
            date,
            description: field(columns.description).trim().to_string(),
            extended_details: optional(columns.extended_details),
            statement_description: optional(columns.statement_description),
            amount: amount.abs(),
            category: optional(columns.category),
        });
    }

    Ok(transactions)
}

/// Amounts in JSON may be numbers or formatted strings
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct RawRecord {
    date: String,
    description: String,
    amount: RawAmount,
    #[serde(default)]
    extended_details: Option<String>,
    #[serde(default)]
    statement_description: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Parse a JSON array of canonical records
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let records: Vec<RawRecord> = serde_json::from_reader(reader)?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let record = i + 1;
            let date = parse_date(&raw.date).map_err(|e| at_record(record, e))?;
            let amount = match raw.amount {
                RawAmount::Number(n) => n,
                RawAmount::Text(s) => parse_amount(&s).map_err(|e| at_record(record, e))?,
            };
            let non_empty =
                |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

            Ok(Transaction {
                date,
                description: raw.description.trim().to_string(),
                extended_details: non_empty(raw.extended_details),
                statement_description: non_empty(raw.statement_description),
                amount: amount.abs(),
                category: non_empty(raw.category),
            })
        })
        .collect()
}

fn at_line(line: usize, err: Error) -> Error {
    Error::Import(format!("Line {}: {}", line, detail(err)))
}

fn at_record(record: usize, err: Error) -> Error {
    Error::Import(format!("Record {}: {}", record, detail(err)))
}

fn detail(err: Error) -> String {
    match err {
        Error::Import(msg) => msg,
        other => other.to_string(),
    }
}

/// Parse a date string trying multiple formats
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    let amount = cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))?;

    if !amount.is_finite() {
        return Err(Error::InvalidData(format!("Amount is not a finite number: {}", s)));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("01/15/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date(" 2024-01-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date("15th Jan").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("(42.00)").unwrap(), -42.0);
        assert!(parse_amount("twelve").is_err());
        assert!(matches!(parse_amount("NaN"), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_parse_csv_optional_columns() {
        let data = "\
date,description,amount,extended_details,statement_description,category
2024-01-15,PAYPAL *GRUBHUB,23.40,,GRUBHUB ORDER,
01/16/2024,NETFLIX.COM,\"(15.99)\",Streaming plan,,Entertainment
";
        let txs = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].description, "PAYPAL *GRUBHUB");
        assert_eq!(txs[0].extended_details, None);
        assert_eq!(txs[0].statement_description.as_deref(), Some("GRUBHUB ORDER"));
        assert_eq!(txs[0].category, None);
        assert_eq!(txs[1].amount, 15.99);
        assert_eq!(txs[1].extended_details.as_deref(), Some("Streaming plan"));
        assert_eq!(txs[1].category.as_deref(), Some("Entertainment"));
    }

    #[test]
    fn test_parse_csv_minimal_headers_any_order() {
        let data = "Amount,Description,Date\n9.99,SPOTIFY,2024-02-01\n";
        let txs = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(txs[0].amount, 9.99);
        assert_eq!(txs[0].description, "SPOTIFY");
    }

    #[test]
    fn test_parse_csv_errors_name_the_line() {
        let data = "date,description,amount\n2024-01-01,OK,1.00\nnot-a-date,BAD,2.00\n";
        let err = parse_csv(data.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("Line 3"), "{}", err);

        let missing = parse_csv("date,description\n2024-01-01,X\n".as_bytes())
            .unwrap_err()
            .to_string();
        assert!(missing.contains("amount"));
    }

    #[test]
    fn test_parse_json() {
        let data = r#"[
            {"date": "2024-03-01", "description": "SQ *CORNER CAFE", "amount": 4.75},
            {"date": "03/02/2024", "description": "ACME", "amount": "$1,200.00", "category": ""}
        ]"#;
        let txs = parse_json(data.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, 4.75);
        assert_eq!(txs[1].amount, 1200.0);
        assert_eq!(txs[1].category, None);

        let bad = r#"[{"date": "2024-03-01", "description": "X", "amount": "lots"}]"#;
        let err = parse_json(bad.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("Record 1"), "{}", err);
    }

    #[test]
    fn test_load_by_extension_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("txs.json");
        let mut f = File::create(&json_path).unwrap();
        write!(f, r#"[{{"date": "2024-03-01", "description": "ACME", "amount": 3}}]"#).unwrap();

        assert_eq!(load_transactions(&json_path, None).unwrap().len(), 1);

        let odd_path = dir.path().join("export.txt");
        std::fs::copy(&json_path, &odd_path).unwrap();
        assert!(load_transactions(&odd_path, None).is_err());
        assert_eq!(
            load_transactions(&odd_path, Some(InputFormat::Json))
                .unwrap()
                .len(),
            1
        );
    }
}
