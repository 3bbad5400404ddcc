//! Receipt text parsing
//!
//! Pulls the figures an audit needs out of OCR text from a payout
//! screenshot. OCR routinely misreads the rupee sign, so the amount pattern
//! accepts any of `₹`, `R`, `s`, `?`, `I`, `N` or `|` as the currency marker.

use chrono::Utc;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

const AMOUNT_PATTERN: &str = r"(?i)[₹|Rs?INR]\.?\s?([\d,]+\.?\d*)";
const DATE_PATTERN: &str = r"(\d{2}[/-]\d{2}[/-]\d{2,4})";
const PENALTY_KEYWORDS: [&str; 4] = ["penalty", "adjustment", "deduction", "dr"];

static PARSER: LazyLock<ReceiptParser> = LazyLock::new(ReceiptParser::new);

/// Structured view of a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptAnalysis {
    /// First date found, or today as `YYYY-MM-DD`
    pub detected_date: String,

    /// Largest amount found (zero when none)
    pub total_earnings: Decimal,

    /// Text mentions a penalty, adjustment or deduction
    pub penalty_flag: bool,

    /// Every amount found, in text order
    pub raw_amounts_found: Vec<Decimal>,
}

/// Compiled receipt patterns
#[derive(Debug)]
pub struct ReceiptParser {
    amount_regex: Regex,
    date_regex: Regex,
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser {
    /// Compile the patterns
    pub fn new() -> Self {
        Self {
            amount_regex: Regex::new(AMOUNT_PATTERN).expect("amount pattern is valid"),
            date_regex: Regex::new(DATE_PATTERN).expect("date pattern is valid"),
        }
    }

    /// Parse raw receipt text
    pub fn parse(&self, raw_text: &str) -> ReceiptAnalysis {
        let text = raw_text.replace('\n', " ");
        let text = text.trim();

        let raw_amounts_found: Vec<Decimal> = self
            .amount_regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| parse_amount(m.as_str()))
            .collect();

        let total_earnings = raw_amounts_found
            .iter()
            .copied()
            .max()
            .unwrap_or(Decimal::ZERO);

        let lower = text.to_lowercase();
        let penalty_flag = PENALTY_KEYWORDS.iter().any(|kw| lower.contains(kw));

        let detected_date = self
            .date_regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

        tracing::debug!(
            amounts = raw_amounts_found.len(),
            total = %total_earnings,
            penalty_flag,
            "Receipt parsed"
        );

        ReceiptAnalysis {
            detected_date,
            total_earnings,
            penalty_flag,
            raw_amounts_found,
        }
    }
}

/// Parse a receipt with the shared parser
pub fn parse_gig_receipt(raw_text: &str) -> ReceiptAnalysis {
    PARSER.parse(raw_text)
}

fn parse_amount(captured: &str) -> Option<Decimal> {
    let cleaned = captured.replace(',', "");
    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}
