use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::model::db::QuestionCore;

use super::{check_length, FieldErrors, INVALID_DATETIME, REQUIRED};

/// Accepted `pub_date` formats. All are interpreted as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// The format used to pre-fill `pub_date` inputs.
pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Validate the question fields of a form.
pub fn validate(
    question_text: Option<&str>,
    pub_date: Option<&str>,
) -> Result<QuestionCore, FieldErrors> {
    let mut errors = FieldErrors::new();

    let question_text = question_text.unwrap_or_default().trim();
    if question_text.is_empty() {
        errors.add("question_text", REQUIRED);
    } else if let Err(message) = check_length(question_text) {
        errors.add("question_text", message);
    }

    let pub_date = pub_date.unwrap_or_default().trim();
    let parsed = if pub_date.is_empty() {
        errors.add("pub_date", REQUIRED);
        None
    } else {
        let parsed = parse_pub_date(pub_date);
        if parsed.is_none() {
            errors.add("pub_date", INVALID_DATETIME);
        }
        parsed
    };

    match parsed {
        Some(pub_date) if errors.is_empty() => Ok(QuestionCore {
            question_text: question_text.to_string(),
            pub_date,
        }),
        _ => Err(errors),
    }
}

/// Parse a submitted publication date.
pub fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}
