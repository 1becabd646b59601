//! Scalar rendering and coercion
//!
//! Writing turns a [`Scalar`] into the literal placed after `"value":`.
//! Reading turns submitted text back into a [`Scalar`] of the kind the
//! destination property declares.

use crate::config::CodecOptions;
use crate::lexer::RawValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use metaform_model::{CodeValue, Scalar, ScalarKind};
use std::fmt::{self, Write};

/// Prefix carried by rendered language codes
pub const LOCALE_PREFIX: &str = "LanguageCode.";

/// How a date field is rendered, from its `render` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRender {
    /// Formatted with `date_time_pattern`
    DateTime,
    /// Formatted with `date_pattern`
    Date,
    /// Milliseconds since the epoch
    Millis,
}

impl DateRender {
    /// Mode selected by a `render` attribute
    #[must_use]
    pub fn from_render(render: Option<&str>) -> Self {
        let Some(render) = render else {
            return Self::Millis;
        };
        let render = render.to_ascii_uppercase();
        if render.contains("DATETIME") {
            Self::DateTime
        } else if render.contains("DATE") {
            Self::Date
        } else {
            Self::Millis
        }
    }
}

/// Write the form literal for `value`
///
/// # Errors
/// Propagates writer errors, and `fmt::Error` for an unusable date pattern
pub fn write_scalar<W: Write>(
    out: &mut W,
    value: Option<&Scalar>,
    render: Option<&str>,
    options: &CodecOptions,
) -> fmt::Result {
    match value {
        None => out.write_str("null"),
        Some(Scalar::Integer(i)) => write!(out, "{i}"),
        Some(Scalar::Decimal(d) | Scalar::Angle(d)) => {
            if d.is_finite() {
                write!(out, "{d}")
            } else {
                out.write_str("null")
            }
        }
        Some(Scalar::Boolean(b)) => write_quoted(out, if *b { "true" } else { "false" }),
        Some(Scalar::Code(code)) => write_quoted(out, &code.to_string()),
        Some(Scalar::Locale(language)) => {
            out.write_char('"')?;
            out.write_str(LOCALE_PREFIX)?;
            write_escaped(out, language)?;
            out.write_char('"')
        }
        Some(Scalar::Charset(name)) => write_quoted(out, name),
        Some(Scalar::Date(date)) => {
            let mut text = String::new();
            match DateRender::from_render(render) {
                DateRender::DateTime => write!(text, "{}", date.format(&options.date_time_pattern))?,
                DateRender::Date => write!(text, "{}", date.format(&options.date_pattern))?,
                DateRender::Millis => write!(text, "{}", date.timestamp_millis())?,
            }
            write_quoted(out, &text)
        }
        Some(Scalar::Text(text)) => write_quoted(out, text),
    }
}

/// Write `s` between double quotes
///
/// # Errors
/// Propagates writer errors
pub fn write_quoted<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    out.write_char('"')?;
    write_escaped(out, s)?;
    out.write_char('"')
}

fn write_escaped<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if u32::from(c) < 0x20 => write!(out, "\\u{:04x}", u32::from(c))?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}

/// Convert submitted text into a value of `kind`
///
/// Empty text and `null` mean "no value".
///
/// # Errors
/// Returns a description of the problem when the text does not fit `kind`
pub fn coerce(raw: &RawValue, kind: &ScalarKind, options: &CodecOptions) -> Result<Option<Scalar>, String> {
    let Some(text) = raw.as_text() else {
        return Ok(None);
    };
    if text.is_empty() {
        return Ok(None);
    }
    let trimmed = text.trim();
    let scalar = match kind {
        ScalarKind::Text => Scalar::Text(text.to_string()),
        ScalarKind::Integer => Scalar::Integer(trimmed.parse().map_err(|e| format!("not an integer: {e}"))?),
        ScalarKind::Decimal => Scalar::Decimal(parse_decimal(trimmed)?),
        ScalarKind::Angle => Scalar::Angle(parse_decimal(trimmed)?),
        ScalarKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Scalar::Boolean(true),
            "false" => Scalar::Boolean(false),
            _ => return Err("expected true or false".to_string()),
        },
        ScalarKind::Code(list) => Scalar::Code(parse_code(trimmed, list)?),
        ScalarKind::Date => Scalar::Date(parse_date(trimmed, options)?),
        ScalarKind::Locale => {
            let language = trimmed.strip_prefix(LOCALE_PREFIX).unwrap_or(trimmed);
            if language.is_empty() {
                return Err("empty language code".to_string());
            }
            Scalar::Locale(language.to_string())
        }
        ScalarKind::Charset => Scalar::Charset(trimmed.to_string()),
    };
    Ok(Some(scalar))
}

/// Default value declared by a template
pub(crate) fn default_scalar(value: RawValue) -> Option<Scalar> {
    match value {
        RawValue::Null => None,
        RawValue::Text(text) => Some(Scalar::Text(text)),
        RawValue::Number(n) => Some(
            n.parse::<i64>()
                .map(Scalar::Integer)
                .unwrap_or_else(|_| n.parse::<f64>().map_or(Scalar::Text(n), Scalar::Decimal)),
        ),
    }
}

fn parse_decimal(text: &str) -> Result<f64, String> {
    let value: f64 = text.parse().map_err(|e| format!("not a number: {e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("not a finite number".to_string())
    }
}

fn parse_code(text: &str, list: &str) -> Result<CodeValue, String> {
    let code = match text.split_once('.') {
        Some((prefix, code)) if prefix == list => code,
        Some((prefix, _)) => return Err(format!("code belongs to list {prefix}, expected {list}")),
        None => text,
    };
    if code.is_empty() {
        return Err("empty code".to_string());
    }
    Ok(CodeValue::new(list, code))
}

fn parse_date(text: &str, options: &CodecOptions) -> Result<DateTime<Utc>, String> {
    if let Ok(millis) = text.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| format!("timestamp {millis} out of range"));
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, &options.date_time_pattern) {
        return Ok(datetime.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, &options.date_pattern) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| format!("unrecognized date, expected {} or {}", options.date_time_pattern, options.date_pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: &Scalar, render: Option<&str>) -> String {
        let mut out = String::new();
        write_scalar(&mut out, Some(value), render, &CodecOptions::default()).unwrap();
        out
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    fn sample_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn numbers_are_unquoted() {
        assert_eq!(render(&Scalar::Integer(-42), None), "-42");
        assert_eq!(render(&Scalar::Decimal(2.5), None), "2.5");
        assert_eq!(render(&Scalar::Angle(45.0), None), "45");
    }

    #[test]
    fn typed_strings_are_prefixed() {
        assert_eq!(render(&Scalar::code("CI_RoleCode", "pointOfContact"), None), "\"CI_RoleCode.pointOfContact\"");
        assert_eq!(render(&Scalar::Locale("fra".into()), None), "\"LanguageCode.fra\"");
        assert_eq!(render(&Scalar::Charset("UTF-8".into()), None), "\"UTF-8\"");
        assert_eq!(render(&Scalar::Boolean(true), None), "\"true\"");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(render(&Scalar::text("a \"b\"\\\n\tc"), None), r#""a \"b\"\\\n\tc""#);
        assert_eq!(render(&Scalar::text("\u{1}"), None), r#""\u0001""#);
    }

    #[test]
    fn missing_value_is_null() {
        let mut out = String::new();
        write_scalar(&mut out, None, None, &CodecOptions::default()).unwrap();
        assert_eq!(out, "null");
    }

    #[test]
    fn date_follows_render_mode() {
        let date = Scalar::Date(sample_date());
        assert_eq!(render(&date, Some("DATETIME")), "\"2024-03-09 14:05:00\"");
        assert_eq!(render(&date, Some("date")), "\"2024-03-09\"");
        assert_eq!(render(&date, Some("text")), format!("\"{}\"", sample_date().timestamp_millis()));
        assert_eq!(render(&date, None), format!("\"{}\"", sample_date().timestamp_millis()));
    }

    #[test]
    fn coerce_empty_is_none() {
        let options = CodecOptions::default();
        assert_eq!(coerce(&RawValue::Null, &ScalarKind::Integer, &options), Ok(None));
        assert_eq!(coerce(&text(""), &ScalarKind::Text, &options), Ok(None));
    }

    #[test]
    fn coerce_numbers_and_flags() {
        let options = CodecOptions::default();
        assert_eq!(
            coerce(&RawValue::Number("12".into()), &ScalarKind::Integer, &options),
            Ok(Some(Scalar::Integer(12)))
        );
        assert_eq!(coerce(&text("-7.25"), &ScalarKind::Angle, &options), Ok(Some(Scalar::Angle(-7.25))));
        assert_eq!(coerce(&text("TRUE"), &ScalarKind::Boolean, &options), Ok(Some(Scalar::Boolean(true))));
        assert!(coerce(&text("twelve"), &ScalarKind::Integer, &options).is_err());
        assert!(coerce(&text("NaN"), &ScalarKind::Decimal, &options).is_err());
    }

    #[test]
    fn coerce_codes() {
        let options = CodecOptions::default();
        let kind = ScalarKind::Code("CI_RoleCode".into());
        let expected = Some(Scalar::code("CI_RoleCode", "author"));
        assert_eq!(coerce(&text("CI_RoleCode.author"), &kind, &options), Ok(expected.clone()));
        assert_eq!(coerce(&text("author"), &kind, &options), Ok(expected));
        assert!(coerce(&text("MD_ScopeCode.dataset"), &kind, &options).is_err());
    }

    #[test]
    fn coerce_locale_strips_prefix() {
        let options = CodecOptions::default();
        assert_eq!(
            coerce(&text("LanguageCode.eng"), &ScalarKind::Locale, &options),
            Ok(Some(Scalar::Locale("eng".into())))
        );
    }

    #[test]
    fn coerce_dates() {
        let options = CodecOptions::default();
        let expected = Some(Scalar::Date(sample_date()));
        let millis = sample_date().timestamp_millis().to_string();
        assert_eq!(coerce(&text(&millis), &ScalarKind::Date, &options), Ok(expected.clone()));
        assert_eq!(coerce(&text("2024-03-09 14:05:00"), &ScalarKind::Date, &options), Ok(expected.clone()));
        assert_eq!(coerce(&text("2024-03-09T14:05:00Z"), &ScalarKind::Date, &options), Ok(expected));
        assert_eq!(
            coerce(&text("2024-03-09"), &ScalarKind::Date, &options),
            Ok(Some(Scalar::Date(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())))
        );
        assert!(coerce(&text("March 9th"), &ScalarKind::Date, &options).is_err());
    }

    #[test]
    fn template_defaults() {
        assert_eq!(default_scalar(RawValue::Null), None);
        assert_eq!(default_scalar(RawValue::Number("3".into())), Some(Scalar::Integer(3)));
        assert_eq!(default_scalar(RawValue::Number("0.5".into())), Some(Scalar::Decimal(0.5)));
        assert_eq!(default_scalar(text("n/a")), Some(Scalar::text("n/a")));
    }
}
