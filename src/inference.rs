//! Storage type inference over a sample of cleaned rows.
//!
//! Each column gets a [`TypeCandidate`] accumulator fed with every sampled
//! value; the first rule that holds for the whole column decides its type:
//! integer tiers, then decimals, then booleans, then the 70% date and email
//! thresholds, and finally a text size tier.

use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::transform::{date, email, nulls};

/// Rows of cleaned output considered for inference.
pub const SAMPLE_ROWS: usize = 500;

const TINYINT_LIMIT: u128 = 128;
const SMALLINT_LIMIT: u128 = 32_768;
const INT_LIMIT: u128 = 1 << 31;
const MONEY_SCALE: u32 = 2;
const VARCHAR_LIMIT: usize = 255;
const TEXT_LIMIT: usize = 500;
const LONGTEXT_LIMIT: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    #[serde(rename = "tinyint")]
    TinyInt,
    #[serde(rename = "smallint")]
    SmallInt,
    Int,
    #[serde(rename = "bigint")]
    BigInt,
    DecimalMoney,
    Decimal,
    Boolean,
    Date,
    Email,
    Varchar,
    VarcharLong,
    Text,
    #[serde(rename = "longtext")]
    LongText,
}

impl InferredType {
    pub fn tag(self) -> &'static str {
        match self {
            InferredType::TinyInt => "tinyint",
            InferredType::SmallInt => "smallint",
            InferredType::Int => "int",
            InferredType::BigInt => "bigint",
            InferredType::DecimalMoney => "decimal_money",
            InferredType::Decimal => "decimal",
            InferredType::Boolean => "boolean",
            InferredType::Date => "date",
            InferredType::Email => "email",
            InferredType::Varchar => "varchar",
            InferredType::VarcharLong => "varchar_long",
            InferredType::Text => "text",
            InferredType::LongText => "longtext",
        }
    }

    /// Smallest integer tier holding values up to `magnitude`.
    pub fn integer_tier(magnitude: u128) -> Self {
        match magnitude {
            m if m < TINYINT_LIMIT => InferredType::TinyInt,
            m if m < SMALLINT_LIMIT => InferredType::SmallInt,
            m if m < INT_LIMIT => InferredType::Int,
            _ => InferredType::BigInt,
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Inferred type per output column, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypes {
    entries: Vec<(String, InferredType)>,
}

impl ColumnTypes {
    pub fn get(&self, column: &str) -> Option<InferredType> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, InferredType)> {
        self.entries.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overrides the type of an existing column. Unknown columns are ignored.
    pub fn set(&mut self, column: &str, ty: InferredType) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == column) {
            entry.1 = ty;
        }
    }
}

impl Serialize for ColumnTypes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(name, ty)| (name, ty.tag())))
    }
}

fn integer_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?\d+$").expect("integer pattern"))
}

fn decimal_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)$").expect("decimal pattern"))
}

fn is_boolean_token(lowered: &str) -> bool {
    matches!(
        lowered,
        "true" | "false" | "yes" | "no" | "y" | "n" | "t" | "f"
    )
}

#[derive(Debug, Clone, Default)]
struct TypeCandidate {
    non_empty: usize,
    integer_matches: usize,
    integer_max_magnitude: u128,
    decimal_matches: usize,
    decimal_max_scale: u32,
    boolean_matches: usize,
    date_matches: usize,
    email_matches: usize,
    max_len: usize,
}

impl TypeCandidate {
    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() || nulls::is_null_token(trimmed) {
            return;
        }
        self.non_empty += 1;
        self.max_len = self.max_len.max(trimmed.chars().count());

        if integer_shape().is_match(trimmed) {
            self.integer_matches += 1;
            let digits = trimmed.trim_start_matches(['-', '+']);
            let magnitude = digits.parse::<u128>().unwrap_or(u128::MAX);
            self.integer_max_magnitude = self.integer_max_magnitude.max(magnitude);
        }
        if decimal_shape().is_match(trimmed)
            && let Ok(parsed) = Decimal::from_str(trimmed)
        {
            self.decimal_matches += 1;
            self.decimal_max_scale = self.decimal_max_scale.max(parsed.scale());
        }
        if is_boolean_token(&trimmed.to_ascii_lowercase()) {
            self.boolean_matches += 1;
        }
        if date::looks_like_date(trimmed) {
            self.date_matches += 1;
        }
        if email::looks_like_email(trimmed) {
            self.email_matches += 1;
        }
    }

    fn all(&self, count: usize) -> bool {
        count == self.non_empty
    }

    fn at_least_seventy_percent(&self, count: usize) -> bool {
        count * 10 >= self.non_empty * 7
    }

    fn decide(&self) -> InferredType {
        if self.non_empty == 0 {
            return InferredType::Varchar;
        }
        if self.all(self.integer_matches) {
            return InferredType::integer_tier(self.integer_max_magnitude);
        }
        if self.all(self.decimal_matches) {
            return if self.decimal_max_scale <= MONEY_SCALE {
                InferredType::DecimalMoney
            } else {
                InferredType::Decimal
            };
        }
        if self.all(self.boolean_matches) {
            return InferredType::Boolean;
        }
        if self.at_least_seventy_percent(self.date_matches) {
            return InferredType::Date;
        }
        if self.at_least_seventy_percent(self.email_matches) {
            return InferredType::Email;
        }
        match self.max_len {
            len if len > LONGTEXT_LIMIT => InferredType::LongText,
            len if len > TEXT_LIMIT => InferredType::Text,
            len if len > VARCHAR_LIMIT => InferredType::VarcharLong,
            _ => InferredType::Varchar,
        }
    }
}

/// Infers a type for every header from `rows`, which are aligned to `headers`.
///
/// Only the first [`SAMPLE_ROWS`] rows are consulted.
pub fn infer_column_types(headers: &[String], rows: &[Vec<String>]) -> ColumnTypes {
    let mut candidates = vec![TypeCandidate::default(); headers.len()];
    for row in rows.iter().take(SAMPLE_ROWS) {
        for (candidate, value) in candidates.iter_mut().zip(row.iter()) {
            candidate.update(value);
        }
    }
    ColumnTypes {
        entries: headers
            .iter()
            .cloned()
            .zip(candidates.iter().map(TypeCandidate::decide))
            .collect(),
    }
}
