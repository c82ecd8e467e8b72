use crate::error::SchemaError;
use crate::validation::RuleContext;
use chrono::NaiveDate;
use regex::Regex;

pub type ValidationError = String;
pub type Validator = Box<dyn Fn(&str, &RuleContext) -> Result<(), ValidationError> + Send + Sync>;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Run a list of validators against `value`, returning the first error.
pub fn run_validators(
    validators: &[Validator],
    value: &str,
    ctx: &RuleContext,
) -> Result<(), ValidationError> {
    for validator in validators {
        validator(value, ctx)?;
    }
    Ok(())
}

pub fn required(message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &str, _: &RuleContext| {
        if value.trim().is_empty() {
            Err(message.clone())
        } else {
            Ok(())
        }
    })
}

pub fn min_length(min_len: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &str, _: &RuleContext| {
        if value.chars().count() < min_len {
            Err(message.clone())
        } else {
            Ok(())
        }
    })
}

pub fn max_length(max_len: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &str, _: &RuleContext| {
        if value.chars().count() > max_len {
            Err(message.clone())
        } else {
            Ok(())
        }
    })
}

pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Validator, regex::Error> {
    let re = Regex::new(pattern)?;
    let message = message.into();
    Ok(Box::new(move |value: &str, _: &RuleContext| {
        if re.is_match(value) {
            Ok(())
        } else {
            Err(message.clone())
        }
    }))
}

pub fn email(message: impl Into<String>) -> Validator {
    let re = Regex::new(EMAIL_PATTERN).expect("email pattern is valid");
    let message = message.into();
    Box::new(move |value: &str, _: &RuleContext| {
        if re.is_match(value) {
            Ok(())
        } else {
            Err(message.clone())
        }
    })
}

/// ASCII digits only, with a length from `lengths`.
pub fn digits(lengths: &[usize], message: impl Into<String>) -> Validator {
    let lengths = lengths.to_vec();
    let message = message.into();
    Box::new(move |value: &str, _: &RuleContext| {
        let all_digits = value.bytes().all(|b| b.is_ascii_digit());
        if all_digits && lengths.contains(&value.len()) {
            Ok(())
        } else {
            Err(message.clone())
        }
    })
}

/// `MM/YY` card expiry. The first day of `20YY-MM` must fall after today.
pub fn expiry_date(
    format_message: impl Into<String>,
    expired_message: impl Into<String>,
) -> Validator {
    let format_message = format_message.into();
    let expired_message = expired_message.into();
    Box::new(move |value: &str, ctx: &RuleContext| {
        let Some(first_of_month) = parse_expiry(value) else {
            return Err(format_message.clone());
        };
        if first_of_month > ctx.today() {
            Ok(())
        } else {
            Err(expired_message.clone())
        }
    })
}

/// Parses `MM/YY` into the first of that month. Years always land in 2000..=2099.
pub fn parse_expiry(value: &str) -> Option<NaiveDate> {
    let (month, year) = value.split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    NaiveDate::from_ymd_opt(2000 + year, month, 1)
}

pub(crate) fn compile_pattern(field: &str, source: &str, message: String) -> Result<Validator, SchemaError> {
    pattern(source, message).map_err(|source| SchemaError::InvalidPattern {
        field: field.to_string(),
        source,
    })
}
