//! Field checks shared by the config sections

pub use crate::error::ValidationError;
use std::fmt::Display;
use std::path::Path;

/// A `[section]` of the config file
pub trait ConfigSection: Default {
    /// Checks every field; `Err` holds at least one error
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Overwrites this section with `other`
    fn merge(&mut self, other: Self);

    fn section_name(&self) -> &'static str;
}

/// Field checks returning field-scoped errors
pub struct Validator;

fn ensure(ok: bool, error: impl FnOnce() -> ValidationError) -> Result<(), ValidationError> {
    if ok {
        Ok(())
    } else {
        Err(error())
    }
}

impl Validator {
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + Display + Copy,
    {
        ensure(value >= min && value <= max, || {
            ValidationError::new(field, format!("must be between {} and {}", min, max))
                .with_found(value)
        })
    }

    pub fn is_directory(path: &Path, field: &str) -> Result<(), ValidationError> {
        ensure(path.is_dir(), || {
            ValidationError::new(field, "must be a directory").with_found(path.display())
        })
    }

    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        ensure(!value.trim().is_empty(), || {
            ValidationError::new(field, "must not be empty")
        })
    }

    /// Accepts `http://` and `https://` URLs with a host
    pub fn http_url(value: &str, field: &str) -> Result<(), ValidationError> {
        let host = value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"))
            .unwrap_or_default();
        ensure(!host.trim().is_empty(), || {
            ValidationError::new(field, "must be an http or https URL").with_found(value)
        })
    }

    pub fn one_of<T>(value: &T, allowed: &[T], field: &str) -> Result<(), ValidationError>
    where
        T: PartialEq + Display,
    {
        ensure(allowed.contains(value), || {
            let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
            ValidationError::new(field, format!("must be one of {}", options.join(", ")))
                .with_found(value)
        })
    }

    /// Keeps only the failures
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_bounds() {
        assert!(Validator::in_range(30, 1, 600, "network.timeout_secs").is_ok());
        let err = Validator::in_range(0, 1, 600, "network.timeout_secs").unwrap_err();
        assert_eq!(err.found.as_deref(), Some("0"));
        assert!(Validator::in_range(601, 1, 600, "network.timeout_secs").is_err());
    }

    #[test]
    fn test_not_empty() {
        assert!(Validator::not_empty("1", "profile.user_id").is_ok());
        assert!(Validator::not_empty("   ", "profile.user_id").is_err());
    }

    #[test]
    fn test_http_url() {
        assert!(Validator::http_url("https://api.alquran.cloud/v1", "url").is_ok());
        assert!(Validator::http_url("http://localhost:8080", "url").is_ok());
        assert!(Validator::http_url("https://", "url").is_err());
        assert!(Validator::http_url("file:///etc", "url").is_err());
    }

    #[test]
    fn test_riwayah_choices() {
        assert!(Validator::one_of(&"Hafs", &["Qaloon", "Hafs"], "profile.riwayah").is_ok());
        let err = Validator::one_of(&"Other", &["Qaloon", "Hafs"], "profile.riwayah").unwrap_err();
        assert_eq!(err.message, "must be one of Qaloon, Hafs");
    }

    #[test]
    fn test_collect_keeps_failures_only() {
        let results = vec![
            Ok(()),
            Err(ValidationError::new("a", "is wrong")),
            Err(ValidationError::new("b", "is worse")),
        ];
        assert_eq!(Validator::collect_errors(results).unwrap_err().len(), 2);
    }
}
