//! Validation parameters and the `key=value` parameter-string parser
//!
//! Grammar: pairs separated by `,` or `;` (equivalent, neither takes
//! precedence), list values separated by `|`, mapping entries written as
//! `source=target`. Separators inside quotes or parentheses do not split,
//! so filter fragments such as `status IN ('A','B')` survive intact.
//! Canonical output from [`ValidationSpec::to_param_string`] uses `;`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::OnceLock;

/// How numeric differences are judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceType {
    Exact,
    Absolute,
    Percentage,
}

impl FromStr for ToleranceType {
    type Err = SpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "absolute" | "abs" => Ok(Self::Absolute),
            "percentage" | "percent" | "pct" | "%" => Ok(Self::Percentage),
            other => Err(SpecParseError::InvalidToleranceType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ToleranceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Absolute => write!(f, "absolute"),
            Self::Percentage => write!(f, "percentage"),
        }
    }
}

/// A tolerance type paired with its non-negative magnitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRule {
    pub kind: ToleranceType,
    pub value: f64,
}

impl ToleranceRule {
    pub fn exact() -> Self {
        Self { kind: ToleranceType::Exact, value: 0.0 }
    }

    pub fn absolute(value: f64) -> Self {
        Self { kind: ToleranceType::Absolute, value }
    }

    pub fn percentage(value: f64) -> Self {
        Self { kind: ToleranceType::Percentage, value }
    }
}

impl std::fmt::Display for ToleranceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ToleranceType::Exact => write!(f, "exact"),
            ToleranceType::Absolute => write!(f, "±{}", self.value),
            ToleranceType::Percentage => write!(f, "±{}%", self.value),
        }
    }
}

/// Fractional digits used when comparing decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalPrecision {
    Exact,
    Digits(u32),
}

impl FromStr for DecimalPrecision {
    type Err = SpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("exact") {
            return Ok(Self::Exact);
        }
        s.parse::<u32>()
            .map(Self::Digits)
            .map_err(|_| SpecParseError::InvalidPrecision(s.to_string()))
    }
}

impl std::fmt::Display for DecimalPrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Digits(n) => write!(f, "{}", n),
        }
    }
}

/// Unit of a date tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateUnit {
    Days,
    Hours,
    Minutes,
}

/// Allowed distance between two instants, e.g. `1 day`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTolerance {
    pub magnitude: u32,
    pub unit: DateUnit,
}

impl DateTolerance {
    pub fn new(magnitude: u32, unit: DateUnit) -> Self {
        Self { magnitude, unit }
    }

    /// Zero tolerance: instants must be identical
    pub fn zero() -> Self {
        Self::new(0, DateUnit::Days)
    }

    pub fn as_duration(&self) -> chrono::Duration {
        let n = i64::from(self.magnitude);
        match self.unit {
            DateUnit::Days => chrono::Duration::days(n),
            DateUnit::Hours => chrono::Duration::hours(n),
            DateUnit::Minutes => chrono::Duration::minutes(n),
        }
    }
}

impl Default for DateTolerance {
    fn default() -> Self {
        Self::zero()
    }
}

fn date_tolerance_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^\s*(\d+)\s*([A-Za-z]+)\s*$").expect("date tolerance pattern is valid")
    })
}

impl FromStr for DateTolerance {
    type Err = SpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SpecParseError::InvalidDateTolerance(s.trim().to_string());
        let caps = date_tolerance_pattern().captures(s).ok_or_else(invalid)?;
        let magnitude = caps[1].parse::<u32>().map_err(|_| invalid())?;
        let unit = match caps[2].to_lowercase().as_str() {
            "d" | "day" | "days" => DateUnit::Days,
            "h" | "hr" | "hrs" | "hour" | "hours" => DateUnit::Hours,
            "m" | "min" | "mins" | "minute" | "minutes" => DateUnit::Minutes,
            _ => return Err(invalid()),
        };
        Ok(Self { magnitude, unit })
    }
}

impl std::fmt::Display for DateTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match (self.unit, self.magnitude) {
            (DateUnit::Days, 1) => "day",
            (DateUnit::Days, _) => "days",
            (DateUnit::Hours, 1) => "hour",
            (DateUnit::Hours, _) => "hours",
            (DateUnit::Minutes, 1) => "minute",
            (DateUnit::Minutes, _) => "minutes",
        };
        write!(f, "{} {}", self.magnitude, unit)
    }
}

/// Problems found while reading a parameter string
///
/// The parser never aborts on these: the offending pair is skipped and the
/// error is kept in [`ValidationSpec::warnings`].
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SpecParseError {
    #[error("Malformed pair (expected key=value): '{0}'")]
    MalformedPair(String),

    #[error("Invalid number for '{key}': '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("Tolerance for '{key}' must be non-negative, got '{value}'")]
    NegativeTolerance { key: String, value: String },

    #[error("Invalid boolean for '{key}': '{value}' (expected true/false)")]
    InvalidBool { key: String, value: String },

    #[error("Invalid tolerance type: '{0}'")]
    InvalidToleranceType(String),

    #[error("Invalid decimal precision: '{0}' (expected integer or 'exact')")]
    InvalidPrecision(String),

    #[error("Invalid date tolerance: '{0}' (expected e.g. '1 day', '2 hours')")]
    InvalidDateTolerance(String),

    #[error("Invalid column mapping entry: '{0}' (expected source=target)")]
    InvalidMapping(String),

    #[error("Unknown string tolerance option: '{0}'")]
    InvalidStringTolerance(String),

    #[error("Invalid sample size: '{0}'")]
    InvalidSampleSize(String),

    #[error("Missing required parameter: {0}")]
    MissingField(String),
}

/// Which comparison a spec is about to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonKind {
    Schema,
    RowCount,
    ColumnValues,
}

/// Typed validation parameters for one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSpec {
    pub source_table: String,
    pub target_table: String,
    pub source_where: Option<String>,
    pub target_where: Option<String>,

    /// Columns to compare; empty means all columns common to both sides
    pub compare_columns: Vec<String>,
    pub key_column: Option<String>,

    /// Never compared
    pub exclude_columns: BTreeSet<String>,

    /// Compared for tracking only, never fail equality
    pub expected_different_columns: BTreeSet<String>,

    /// Source column name to target column name
    pub column_mappings: IndexMap<String, String>,

    pub case_sensitive: bool,
    pub trim_spaces: bool,
    pub allow_nulls: bool,
    pub decimal_precision: DecimalPrecision,
    pub tolerance_type: ToleranceType,
    pub tolerance_value: f64,

    /// Overrides the shared tolerance for column comparisons
    pub numeric_tolerance: Option<ToleranceRule>,
    pub date_tolerance: DateTolerance,

    /// Overrides the configured sample size for column comparisons
    pub sample_size: Option<usize>,

    /// Pairs skipped during parsing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SpecParseError>,
}

impl Default for ValidationSpec {
    fn default() -> Self {
        Self {
            source_table: String::new(),
            target_table: String::new(),
            source_where: None,
            target_where: None,
            compare_columns: Vec::new(),
            key_column: None,
            exclude_columns: BTreeSet::new(),
            expected_different_columns: BTreeSet::new(),
            column_mappings: IndexMap::new(),
            case_sensitive: true,
            trim_spaces: false,
            allow_nulls: true,
            decimal_precision: DecimalPrecision::Exact,
            tolerance_type: ToleranceType::Exact,
            tolerance_value: 0.0,
            numeric_tolerance: None,
            date_tolerance: DateTolerance::zero(),
            sample_size: None,
            warnings: Vec::new(),
        }
    }
}

/// Keys producers write that carry no validation parameter; they end a
/// legacy mapping run instead of becoming mappings
const NON_MAPPING_KEYS: &[&str] = &["validation_type", "validate_datatypes", "validate_columns"];

/// Parse a raw parameter string into a spec
pub fn parse(raw: &str) -> ValidationSpec {
    ValidationSpec::parse(raw)
}

impl ValidationSpec {
    /// Parse a raw parameter string
    ///
    /// Unknown keys are ignored; malformed pairs are skipped and recorded in
    /// `warnings`.
    pub fn parse(raw: &str) -> Self {
        let mut spec = Self::default();
        let mut explicit_type: Option<ToleranceType> = None;
        let mut explicit_numeric_type: Option<ToleranceType> = None;
        let mut tolerance: Option<f64> = None;
        let mut numeric: Option<(f64, bool)> = None;
        let mut in_mappings = false;

        for segment in split_pairs(raw) {
            let Some((raw_key, value)) = segment.split_once('=') else {
                spec.warn(SpecParseError::MalformedPair(segment.to_string()));
                in_mappings = false;
                continue;
            };
            let raw_key = raw_key.trim();
            let key = raw_key.to_lowercase();
            let value = value.trim();

            if raw_key.is_empty() {
                spec.warn(SpecParseError::MalformedPair(segment.to_string()));
                in_mappings = false;
                continue;
            }

            let continues_mappings = in_mappings;
            in_mappings = false;

            match key.as_str() {
                "source_table" => spec.source_table = value.to_string(),
                "target_table" => spec.target_table = value.to_string(),
                "source_where" => spec.source_where = strip_where(value),
                "target_where" => spec.target_where = strip_where(value),
                "compare_columns" => spec.compare_columns = split_list(value),
                "key_column" => {
                    spec.key_column = (!value.is_empty()).then(|| value.to_string());
                }
                "exclude_columns" => spec.exclude_columns.extend(split_list(value)),
                "expect_cols" | "expected_different_columns" => {
                    spec.expected_different_columns.extend(split_list(value));
                }
                "column_mappings" => {
                    for entry in split_list(value) {
                        spec.add_mapping(&entry);
                    }
                    in_mappings = true;
                }
                "case_sensitive" => {
                    if let Some(b) = spec.parse_bool(&key, value) {
                        spec.case_sensitive = b;
                    }
                }
                "trim_spaces" => {
                    if let Some(b) = spec.parse_bool(&key, value) {
                        spec.trim_spaces = b;
                    }
                }
                "allow_nulls" => {
                    if let Some(b) = spec.parse_bool(&key, value) {
                        spec.allow_nulls = b;
                    }
                }
                "string_tolerance" => {
                    for option in split_list(value) {
                        match option.to_lowercase().as_str() {
                            "case_insensitive" | "ignore_case" => spec.case_sensitive = false,
                            "trim_whitespace" | "trim_spaces" | "trim" => spec.trim_spaces = true,
                            other => spec.warn(SpecParseError::InvalidStringTolerance(other.to_string())),
                        }
                    }
                }
                "decimal_precision" => match value.parse::<DecimalPrecision>() {
                    Ok(p) => spec.decimal_precision = p,
                    Err(e) => spec.warn(e),
                },
                "tolerance" => {
                    if let Some((v, _)) = spec.parse_tolerance(&key, value) {
                        tolerance = Some(v);
                    }
                }
                "numeric_tolerance" | "float_tolerance" => {
                    if let Some(parsed) = spec.parse_tolerance(&key, value) {
                        numeric = Some(parsed);
                    }
                }
                "tolerance_type" => match value.parse::<ToleranceType>() {
                    Ok(t) => explicit_type = Some(t),
                    Err(e) => spec.warn(e),
                },
                "numeric_tolerance_type" | "float_tolerance_type" => match value.parse::<ToleranceType>() {
                    Ok(t) => explicit_numeric_type = Some(t),
                    Err(e) => spec.warn(e),
                },
                "date_tolerance" => match value.parse::<DateTolerance>() {
                    Ok(t) => spec.date_tolerance = t,
                    Err(e) => spec.warn(e),
                },
                "sample_size" => match value.parse::<usize>() {
                    Ok(n) if n > 0 => spec.sample_size = Some(n),
                    _ => spec.warn(SpecParseError::InvalidSampleSize(value.to_string())),
                },
                k if NON_MAPPING_KEYS.contains(&k) => {
                    tracing::debug!(key = %raw_key, "ignoring non-validation parameter");
                }
                _ if continues_mappings && !value.is_empty() => {
                    spec.column_mappings.insert(raw_key.to_string(), value.to_string());
                    in_mappings = true;
                }
                _ => tracing::debug!(key = %raw_key, "ignoring unknown parameter"),
            }
        }

        // A bare `tolerance` is a percentage, with or without the `%` suffix
        spec.tolerance_type = match (explicit_type, tolerance) {
            (Some(t), _) => t,
            (None, Some(_)) => ToleranceType::Percentage,
            (None, None) => ToleranceType::Exact,
        };
        spec.tolerance_value = tolerance.unwrap_or(0.0);

        // `numeric_tolerance` resolves from its own suffix, never from `tolerance`'s
        spec.numeric_tolerance = numeric.map(|(value, pct)| {
            let implied = if pct {
                ToleranceType::Percentage
            } else {
                ToleranceType::Absolute
            };
            ToleranceRule {
                kind: explicit_numeric_type.or(explicit_type).unwrap_or(implied),
                value,
            }
        });

        spec
    }

    fn warn(&mut self, error: SpecParseError) {
        tracing::warn!(%error, "skipping validation parameter");
        self.warnings.push(error);
    }

    fn add_mapping(&mut self, entry: &str) {
        match entry.split_once('=') {
            Some((src, tgt)) if !src.trim().is_empty() && !tgt.trim().is_empty() => {
                self.column_mappings
                    .insert(src.trim().to_string(), tgt.trim().to_string());
            }
            _ => self.warn(SpecParseError::InvalidMapping(entry.to_string())),
        }
    }

    fn parse_bool(&mut self, key: &str, value: &str) -> Option<bool> {
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            self.warn(SpecParseError::InvalidBool {
                key: key.to_string(),
                value: value.to_string(),
            });
            None
        }
    }

    /// Returns the magnitude and whether a `%` suffix was present
    fn parse_tolerance(&mut self, key: &str, value: &str) -> Option<(f64, bool)> {
        let (number, pct) = match value.strip_suffix('%') {
            Some(rest) => (rest.trim(), true),
            None => (value, false),
        };
        match number.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Some((v, pct)),
            Ok(v) if v.is_finite() => {
                self.warn(SpecParseError::NegativeTolerance {
                    key: key.to_string(),
                    value: value.to_string(),
                });
                None
            }
            _ => {
                self.warn(SpecParseError::InvalidNumber {
                    key: key.to_string(),
                    value: value.to_string(),
                });
                None
            }
        }
    }

    /// Rule for row count comparison
    pub fn row_count_rule(&self) -> ToleranceRule {
        ToleranceRule {
            kind: self.tolerance_type,
            value: self.tolerance_value,
        }
    }

    /// Rule for numeric cell comparison; `numeric_tolerance` wins over `tolerance`
    pub fn column_rule(&self) -> ToleranceRule {
        self.numeric_tolerance.unwrap_or_else(|| self.row_count_rule())
    }

    /// Target-side name of a source column
    pub fn target_name<'a>(&'a self, source: &'a str) -> &'a str {
        self.column_mappings
            .get(source)
            .map(String::as_str)
            .unwrap_or(source)
    }

    /// Source-side name of a target column
    pub fn source_name<'a>(&'a self, target: &'a str) -> &'a str {
        self.column_mappings
            .iter()
            .find(|(_, tgt)| tgt.as_str() == target)
            .map(|(src, _)| src.as_str())
            .unwrap_or(target)
    }

    /// True when a column (named on either side) is excluded
    pub fn is_excluded(&self, target_name: &str) -> bool {
        self.exclude_columns.contains(target_name)
            || self.exclude_columns.contains(self.source_name(target_name))
    }

    /// True when a column (named on either side) is expected to differ
    pub fn is_expected_different(&self, target_name: &str) -> bool {
        self.expected_different_columns.contains(target_name)
            || self.expected_different_columns.contains(self.source_name(target_name))
    }

    /// Check the fields a comparison needs are present
    pub fn validate_for(&self, kind: ComparisonKind) -> Result<(), SpecParseError> {
        if self.source_table.is_empty() {
            return Err(SpecParseError::MissingField("source_table".to_string()));
        }
        if self.target_table.is_empty() {
            return Err(SpecParseError::MissingField("target_table".to_string()));
        }
        if kind == ComparisonKind::ColumnValues && self.key_column.is_none() {
            return Err(SpecParseError::MissingField("key_column".to_string()));
        }
        Ok(())
    }

    /// Render back to the canonical `;`-separated parameter string
    pub fn to_param_string(&self) -> String {
        let mut pairs = Vec::new();

        if !self.source_table.is_empty() {
            pairs.push(format!("source_table={}", self.source_table));
        }
        if !self.target_table.is_empty() {
            pairs.push(format!("target_table={}", self.target_table));
        }
        if let Some(w) = &self.source_where {
            pairs.push(format!("source_where={}", w));
        }
        if let Some(w) = &self.target_where {
            pairs.push(format!("target_where={}", w));
        }
        if !self.compare_columns.is_empty() {
            pairs.push(format!("compare_columns={}", join_list(&self.compare_columns)));
        }
        if let Some(k) = &self.key_column {
            pairs.push(format!("key_column={}", k));
        }
        if !self.exclude_columns.is_empty() {
            pairs.push(format!("exclude_columns={}", join_list(&self.exclude_columns)));
        }
        if !self.expected_different_columns.is_empty() {
            pairs.push(format!(
                "expect_cols={}",
                join_list(&self.expected_different_columns)
            ));
        }
        if !self.column_mappings.is_empty() {
            let entries: Vec<String> = self
                .column_mappings
                .iter()
                .map(|(s, t)| format!("{}={}", s, t))
                .collect();
            pairs.push(format!("column_mappings={}", entries.join("|")));
        }
        pairs.push(format!("case_sensitive={}", self.case_sensitive));
        pairs.push(format!("trim_spaces={}", self.trim_spaces));
        pairs.push(format!("allow_nulls={}", self.allow_nulls));
        pairs.push(format!("decimal_precision={}", self.decimal_precision));
        pairs.push(format!("tolerance={}", self.tolerance_value));
        pairs.push(format!("tolerance_type={}", self.tolerance_type));
        if let Some(rule) = self.numeric_tolerance {
            pairs.push(format!("numeric_tolerance={}", rule.value));
            pairs.push(format!("numeric_tolerance_type={}", rule.kind));
        }
        pairs.push(format!("date_tolerance={}", self.date_tolerance));
        if let Some(n) = self.sample_size {
            pairs.push(format!("sample_size={}", n));
        }

        pairs.join(";")
    }
}

/// Split on top-level `,` / `;`, ignoring separators inside quotes or parentheses
fn split_pairs(raw: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in raw.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',' | ';') if depth == 0 => {
                segments.push(&raw[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&raw[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn join_list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_where(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let body = match trimmed.get(..5) {
        Some(head)
            if head.eq_ignore_ascii_case("where")
                && trimmed[5..].starts_with(char::is_whitespace) =>
        {
            trimmed[5..].trim()
        }
        _ => trimmed,
    };
    (!body.is_empty()).then(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let spec = ValidationSpec::parse("");
        assert_eq!(spec.tolerance_type, ToleranceType::Exact);
        assert_eq!(spec.tolerance_value, 0.0);
        assert!(spec.case_sensitive);
        assert!(!spec.trim_spaces);
        assert!(spec.allow_nulls);
        assert_eq!(spec.decimal_precision, DecimalPrecision::Exact);
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn both_separators_accepted() {
        let semi = ValidationSpec::parse("source_table=hr.emp;target_table=dw.emp;key_column=id");
        let comma = ValidationSpec::parse("source_table=hr.emp,target_table=dw.emp,key_column=id");
        let mixed = ValidationSpec::parse("source_table=hr.emp;target_table=dw.emp,key_column=id");
        assert_eq!(semi, comma);
        assert_eq!(semi, mixed);
        assert_eq!(semi.source_table, "hr.emp");
        assert_eq!(semi.key_column.as_deref(), Some("id"));
    }

    #[test]
    fn list_fields_and_mappings() {
        let spec = ValidationSpec::parse(
            "compare_columns=salary|bonus;exclude_columns=updated_at;expect_cols=bonus;\
             column_mappings=emp_name=full_name|dept=department_id",
        );
        assert_eq!(spec.compare_columns, vec!["salary", "bonus"]);
        assert!(spec.exclude_columns.contains("updated_at"));
        assert!(spec.expected_different_columns.contains("bonus"));
        assert_eq!(spec.column_mappings.get("emp_name").map(String::as_str), Some("full_name"));
        assert_eq!(spec.target_name("dept"), "department_id");
        assert_eq!(spec.source_name("full_name"), "emp_name");
        assert_eq!(spec.target_name("salary"), "salary");
    }

    #[test]
    fn legacy_comma_mappings_continue() {
        let spec = ValidationSpec::parse(
            "column_mappings=cost_price=price,description=product_description,key_column=id",
        );
        assert_eq!(spec.column_mappings.len(), 2);
        assert_eq!(spec.target_name("description"), "product_description");
        assert_eq!(spec.key_column.as_deref(), Some("id"));
    }

    #[test]
    fn validation_type_ends_mapping_run() {
        let spec = ValidationSpec::parse(
            "column_mappings=cost_price=price,validation_type=soft,description=product_description",
        );
        assert_eq!(spec.column_mappings.len(), 1);
        assert!(!spec.column_mappings.contains_key("validation_type"));
        assert!(!spec.column_mappings.contains_key("description"));
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn malformed_pairs_skipped() {
        let spec = ValidationSpec::parse("source_table=a;garbage;target_table=b;=x");
        assert_eq!(spec.source_table, "a");
        assert_eq!(spec.target_table, "b");
        assert_eq!(spec.warnings.len(), 2);
        assert!(matches!(spec.warnings[0], SpecParseError::MalformedPair(_)));
    }

    #[test]
    fn unknown_keys_ignored() {
        let spec = ValidationSpec::parse("source_table=a;validation_type=soft");
        assert!(spec.warnings.is_empty());
        assert_eq!(spec.source_table, "a");
    }

    #[test]
    fn booleans_case_insensitive() {
        let spec = ValidationSpec::parse("case_sensitive=FALSE;trim_spaces=True;allow_nulls=false");
        assert!(!spec.case_sensitive);
        assert!(spec.trim_spaces);
        assert!(!spec.allow_nulls);

        let bad = ValidationSpec::parse("case_sensitive=nope");
        assert!(bad.case_sensitive);
        assert_eq!(bad.warnings.len(), 1);
    }

    #[test]
    fn tolerance_resolution() {
        let pct = ValidationSpec::parse("tolerance=5%");
        assert_eq!(pct.row_count_rule(), ToleranceRule::percentage(5.0));

        let explicit = ValidationSpec::parse("tolerance=5;tolerance_type=percentage");
        assert_eq!(explicit.row_count_rule(), ToleranceRule::percentage(5.0));

        let order_free = ValidationSpec::parse("tolerance_type=absolute;tolerance=3");
        assert_eq!(order_free.row_count_rule(), ToleranceRule::absolute(3.0));

        let bare = ValidationSpec::parse("tolerance=70.0");
        assert_eq!(bare.row_count_rule(), ToleranceRule::percentage(70.0));
        assert_eq!(bare.column_rule(), ToleranceRule::percentage(70.0));

        let numeric = ValidationSpec::parse("tolerance=10;numeric_tolerance=0.01;tolerance_type=absolute");
        assert_eq!(numeric.row_count_rule(), ToleranceRule::absolute(10.0));
        assert_eq!(numeric.column_rule(), ToleranceRule::absolute(0.01));
    }

    #[test]
    fn numeric_tolerance_resolves_independently() {
        let spec = ValidationSpec::parse("tolerance=5%;numeric_tolerance=0.5");
        assert_eq!(spec.row_count_rule(), ToleranceRule::percentage(5.0));
        assert_eq!(spec.column_rule(), ToleranceRule::absolute(0.5));

        let spec = ValidationSpec::parse("tolerance=10;numeric_tolerance=2%");
        assert_eq!(spec.row_count_rule(), ToleranceRule::percentage(10.0));
        assert_eq!(spec.column_rule(), ToleranceRule::percentage(2.0));

        let spec = ValidationSpec::parse("float_tolerance=5%");
        assert_eq!(spec.row_count_rule(), ToleranceRule::exact());
        assert_eq!(spec.column_rule(), ToleranceRule::percentage(5.0));

        let spec = ValidationSpec::parse("tolerance=3;tolerance_type=absolute;numeric_tolerance=2%");
        assert_eq!(spec.row_count_rule(), ToleranceRule::absolute(3.0));
        assert_eq!(spec.column_rule(), ToleranceRule::absolute(2.0));

        let spec = ValidationSpec::parse(
            "tolerance=3;tolerance_type=absolute;numeric_tolerance=2;numeric_tolerance_type=percentage",
        );
        assert_eq!(spec.row_count_rule(), ToleranceRule::absolute(3.0));
        assert_eq!(spec.column_rule(), ToleranceRule::percentage(2.0));
        assert_eq!(ValidationSpec::parse(&spec.to_param_string()), spec);
    }

    #[test]
    fn negative_tolerance_rejected() {
        let spec = ValidationSpec::parse("tolerance=-1");
        assert_eq!(spec.tolerance_value, 0.0);
        assert_eq!(spec.tolerance_type, ToleranceType::Exact);
        assert!(matches!(spec.warnings[0], SpecParseError::NegativeTolerance { .. }));
    }

    #[test]
    fn precision_and_dates() {
        let spec = ValidationSpec::parse("decimal_precision=2;date_tolerance=1 day");
        assert_eq!(spec.decimal_precision, DecimalPrecision::Digits(2));
        assert_eq!(spec.date_tolerance, DateTolerance::new(1, DateUnit::Days));

        let exact = ValidationSpec::parse("decimal_precision=EXACT;date_tolerance=3 hours");
        assert_eq!(exact.decimal_precision, DecimalPrecision::Exact);
        assert_eq!(exact.date_tolerance.as_duration(), chrono::Duration::hours(3));

        assert_eq!(
            "30 minutes".parse::<DateTolerance>().unwrap(),
            DateTolerance::new(30, DateUnit::Minutes)
        );
        assert!("one day".parse::<DateTolerance>().is_err());
        assert!("1 fortnight".parse::<DateTolerance>().is_err());
    }

    #[test]
    fn where_clauses_keep_inner_separators() {
        let spec = ValidationSpec::parse(
            "source_table=a;source_where=WHERE status IN ('A','B');target_where=region = 'x;y',target_table=b",
        );
        assert_eq!(spec.source_where.as_deref(), Some("status IN ('A','B')"));
        assert_eq!(spec.target_where.as_deref(), Some("region = 'x;y'"));
        assert_eq!(spec.target_table, "b");
    }

    #[test]
    fn string_tolerance_alias() {
        let spec = ValidationSpec::parse("string_tolerance=case_insensitive|trim_whitespace");
        assert!(!spec.case_sensitive);
        assert!(spec.trim_spaces);
    }

    #[test]
    fn exclusion_checks_both_names() {
        let spec = ValidationSpec::parse("exclude_columns=emp_name;column_mappings=emp_name=full_name");
        assert!(spec.is_excluded("full_name"));
        assert!(!spec.is_excluded("salary"));
    }

    #[test]
    fn validation_requirements() {
        let spec = ValidationSpec::parse("source_table=a;target_table=b");
        assert!(spec.validate_for(ComparisonKind::RowCount).is_ok());
        assert_eq!(
            spec.validate_for(ComparisonKind::ColumnValues),
            Err(SpecParseError::MissingField("key_column".to_string()))
        );
        assert!(ValidationSpec::parse("").validate_for(ComparisonKind::Schema).is_err());
    }

    #[test]
    fn canonical_rendering_reparses() {
        let spec = ValidationSpec::parse(
            "source_table=a,target_table=b,compare_columns=x|y,key_column=id,tolerance=5%,\
             column_mappings=x=x2,date_tolerance=2 days,decimal_precision=2",
        );
        let rendered = spec.to_param_string();
        assert!(rendered.contains(';'));
        assert_eq!(ValidationSpec::parse(&rendered), spec);
    }
}
