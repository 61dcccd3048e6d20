use crate::utils::error::{GradeError, Result};
use std::fmt::Display;
use std::path::Path;
use url::Url;

/// Largest number of points a single rubric criterion may carry.
pub const MAX_CRITERION_WEIGHT: u32 = 100;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid_setting(field: &str, value: impl ToString, reason: impl Into<String>) -> GradeError {
    GradeError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

// Settings checks: config files and command-line flags. Failures are
// configuration errors.

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid_setting(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid_setting(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid_setting(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid_setting(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid_setting(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid_setting(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

/// Checks one file's extension, ignoring case (`answers.CSV` passes for `csv`).
pub fn validate_file_extension(field_name: &str, file: &Path, allowed: &[&str]) -> Result<()> {
    let shown = file.display();
    let extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| invalid_setting(field_name, &shown, "File has no extension"))?;

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(extension)) {
        Ok(())
    } else {
        Err(invalid_setting(
            field_name,
            &shown,
            format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed.join(", ")
            ),
        ))
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid_setting(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid_setting(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

// Content checks: question text and rubric weights coming from callers.
// Failures are input errors, which the HTTP service answers with 400.

pub fn require_text(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GradeError::validation(format!("{} cannot be blank", field_name)));
    }
    Ok(())
}

pub fn validate_weight(objective: impl Display, weight: u32) -> Result<()> {
    if !(1..=MAX_CRITERION_WEIGHT).contains(&weight) {
        return Err(GradeError::validation(format!(
            "weight for '{}' must be between 1 and {}, got {}",
            objective, MAX_CRITERION_WEIGHT, weight
        )));
    }
    Ok(())
}
