//! Value coercion between the two platforms.
//!
//! Values pulled from a CA order arrive as arbitrary JSON and are shaped into
//! the scalar each CLM data type expects ([`DestCoercer`]). Values pulled from
//! CLM certificate metadata arrive as strings and are validated against the CA
//! field type ([`coerce_for_source`]).
//!
//! Coercion never fails loudly. A value that does not fit the target type
//! becomes `None` and the caller drops that one field.
//!
//! The two directions join email lists differently: `", "` towards the CLM and
//! `","` towards the CA.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::sanitize::{sanitize_text, WHITESPACE_RUN};
use crate::types::{DestDataType, SourceDataType};

/// Output format used when none is configured.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,}$")
        .expect("EMAIL_REGEX is a valid regex pattern")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("ISO_DATE is a valid regex pattern"));

const EMAIL_SEPARATORS: &[char] = &[',', ';', ' ', '\t', '\r', '\n'];
const EMAIL_WRAPPERS: &[char] = &['"', '\'', '<', '>', '(', ')', '[', ']'];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
];

/// A value ready to be written into CLM certificate metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CoercedValue {
    Integer(i32),
    Boolean(bool),
    Text(String),
}

/// Coerces raw CA values into CLM metadata values.
///
/// Holds the date output format so runs with different formats never share
/// state.
#[derive(Debug, Clone)]
pub struct DestCoercer {
    date_format: String,
}

impl Default for DestCoercer {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DestCoercer {
    /// Create a coercer with the given date output format.
    ///
    /// Accepts strftime patterns (`%Y-%m-%d`) and the `yyyy-MM-dd` style
    /// tokens used by the CLM's own settings.
    pub fn new(date_format: &str) -> CoreResult<Self> {
        let format = translate_date_format(date_format.trim());
        if format.is_empty() || StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(CoreError::InvalidField {
                field: "date_format".to_string(),
                message: format!("'{date_format}' is not a valid date format"),
            });
        }
        Ok(Self { date_format: format })
    }

    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Coerce one raw value for a CLM field of type `ty`.
    ///
    /// `options` is only consulted for `MultipleChoice`.
    #[must_use]
    pub fn coerce(&self, value: &Value, ty: DestDataType, options: Option<&[String]>) -> Option<CoercedValue> {
        if value.is_null() {
            return None;
        }
        match ty {
            DestDataType::Integer => coerce_int(value).map(CoercedValue::Integer),
            DestDataType::Boolean => coerce_bool(value).map(CoercedValue::Boolean),
            DestDataType::Date => self.coerce_date(value).map(CoercedValue::Text),
            DestDataType::Email => coerce_email_csv(value).map(CoercedValue::Text),
            DestDataType::MultipleChoice => coerce_choice(value, options).map(CoercedValue::Text),
            DestDataType::BigText => coerce_string(value, true).map(CoercedValue::Text),
            DestDataType::String => coerce_string(value, false).map(CoercedValue::Text),
        }
    }

    fn coerce_date(&self, value: &Value) -> Option<String> {
        let raw = scalar_text(value)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if self.date_format == DEFAULT_DATE_FORMAT && ISO_DATE.is_match(raw) {
            return Some(raw.to_string());
        }
        parse_date_utc(raw).map(|dt| dt.format(&self.date_format).to_string())
    }
}

/// Translate a `M/d/yyyy h:mm:ss tt` style pattern into strftime.
///
/// Runs of a pattern letter form one token (`MMM`, `yy`, `d`). Quoted text,
/// backslash escapes and letters with no meaning are kept as literals.
/// Patterns that already carry strftime specifiers are returned unchanged.
fn translate_date_format(format: &str) -> String {
    if is_strftime(format) {
        return format.to_string();
    }
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .map_or(chars.len(), |p| i + 1 + p);
                for &ch in &chars[i + 1..end] {
                    push_literal(&mut out, ch);
                }
                i = end + 1;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    push_literal(&mut out, next);
                }
                i += 2;
            }
            _ => {
                let run = chars[i..].iter().take_while(|&&ch| ch == c).count();
                match date_token(c, run) {
                    Some(spec) => out.push_str(spec),
                    None => (0..run).for_each(|_| push_literal(&mut out, c)),
                }
                i += run;
            }
        }
    }
    out
}

fn is_strftime(format: &str) -> bool {
    format.split('%').skip(1).any(|rest| {
        rest.trim_start_matches(['-', '_', '0', '^', '#'])
            .starts_with(|c: char| c.is_ascii_alphabetic() || matches!(c, '.' | ':' | '+'))
    })
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// strftime specifier for a run of `len` copies of `letter`.
fn date_token(letter: char, len: usize) -> Option<&'static str> {
    let spec = match (letter, len) {
        ('y', 1) => "%-y",
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', 2) => "%d",
        ('d', 3) => "%a",
        ('d', _) => "%A",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('t', _) => "%p",
        // chrono only prints 3, 6 or 9 fractional digits
        ('f', 1..=3) => "%3f",
        ('f', 4..=6) => "%6f",
        ('f', _) => "%9f",
        ('z', _) => "%:z",
        _ => return None,
    };
    Some(spec)
}

/// Broad date parsing. Timestamps without an offset are taken as UTC and
/// offsets are converted to UTC.
fn parse_date_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(raw, f).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(naive.and_utc());
    }
    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Strings as-is, numbers and booleans as their JSON text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|l| i32::try_from(l).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        Value::Bool(b) => Some(i32::from(*b)),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n
            .as_i64()
            .and_then(|l| i32::try_from(l).ok())
            .map(|n| n != 0),
        Value::String(s) => parse_bool_loose(s),
        _ => None,
    }
}

fn parse_bool_loose(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn coerce_string(value: &Value, multiline: bool) -> Option<String> {
    match value {
        Value::String(s) => (!s.trim().is_empty()).then(|| s.clone()),
        Value::Number(_) | Value::Bool(_) => scalar_text(value),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| coerce_string(item, false))
                .filter(|s| !s.trim().is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(_) => multiline.then(|| value.to_string()),
        Value::Null => None,
    }
}

fn coerce_choice(value: &Value, options: Option<&[String]>) -> Option<String> {
    let text = coerce_string(value, false)?;
    match options {
        Some(options) if !options.is_empty() => match_option(&text, options).map(str::to_string),
        _ => Some(text),
    }
}

/// Lowercase, trim and collapse inner whitespace.
#[must_use]
pub fn normalize_choice(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").to_lowercase()
}

/// First option equal to `value` after normalization.
#[must_use]
pub fn match_option<'a>(value: &str, options: &'a [String]) -> Option<&'a str> {
    let wanted = normalize_choice(value);
    options
        .iter()
        .find(|o| normalize_choice(o) == wanted)
        .map(String::as_str)
}

/// Whether `candidate` looks like a single email address.
#[must_use]
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_REGEX.is_match(candidate)
}

fn emails_from_text(text: &str, out: &mut Vec<String>) {
    out.extend(
        text.split(EMAIL_SEPARATORS)
            .map(|piece| piece.trim().trim_matches(EMAIL_WRAPPERS))
            .filter(|candidate| is_valid_email(candidate))
            .map(str::to_string),
    );
}

fn extract_emails(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => emails_from_text(s, out),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => emails_from_text(s, out),
                    Value::Object(obj) => {
                        if let Some(Value::String(s)) = obj.get("email") {
                            emails_from_text(s, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::Object(obj) => match (obj.get("email"), obj.get("emails")) {
            (Some(Value::String(s)), _) => emails_from_text(s, out),
            (_, Some(nested)) => extract_emails(nested, out),
            _ => emails_from_text(&value.to_string(), out),
        },
        Value::Null => {}
        other => emails_from_text(&other.to_string(), out),
    }
}

/// Keep the first spelling of every address, comparing case-insensitively.
fn dedupe_emails(emails: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    emails
        .into_iter()
        .filter(|e| seen.insert(e.to_lowercase()))
        .collect()
}

fn coerce_email_csv(value: &Value) -> Option<String> {
    let mut found = Vec::new();
    extract_emails(value, &mut found);
    let emails = dedupe_emails(found);
    (!emails.is_empty()).then(|| emails.join(", "))
}

/// Coerce a CLM metadata string for a CA field of type `ty`.
///
/// `options` are the CLM choice list when the field is a multiple-choice
/// field on the CLM side. The value is sanitized before it is checked.
#[must_use]
pub fn coerce_for_source(value: Option<&str>, ty: SourceDataType, options: Option<&[String]>) -> Option<String> {
    let cleaned = sanitize_text(value?, true);
    let s = cleaned.as_str();
    if s.is_empty() {
        return None;
    }
    match ty {
        SourceDataType::Int => s.parse::<i32>().ok().map(|n| n.to_string()),
        SourceDataType::EmailAddress => is_valid_email(s).then(|| s.to_string()),
        SourceDataType::EmailList => {
            let mut found = Vec::new();
            emails_from_text(s, &mut found);
            let emails = dedupe_emails(found);
            (!emails.is_empty()).then(|| emails.join(","))
        }
        SourceDataType::Text => match options {
            Some(options) if !options.is_empty() => {
                Some(match_option(s, options).unwrap_or(s).to_string())
            }
            _ => Some(s.to_string()),
        },
        SourceDataType::Anything => Some(s.to_string()),
    }
}
