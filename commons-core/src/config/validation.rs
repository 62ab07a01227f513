//! Configuration validation utilities.
//!
//! Validators collect every problem they find into a [`ValidationContext`]
//! so operators see path-qualified field names such as
//! `tenancy.base_domain`.

use crate::error::ConfigError;

/// Result type for validation operations.
pub type ValidationResult = Result<(), ConfigError>;

/// Context for validation operations.
///
/// Tracks the current path in the configuration tree for better error messages.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    path: Vec<String>,
    errors: Vec<ConfigError>,
}

impl ValidationContext {
    /// Creates a new validation context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a named section.
    pub fn enter(&mut self, section: impl Into<String>) {
        self.path.push(section.into());
    }

    /// Leaves the current section.
    pub fn exit(&mut self) {
        self.path.pop();
    }

    /// Returns the current path as a dot-separated string.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.path.join(".")
    }

    /// Records a validation error.
    pub fn add_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Returns true if no errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the recorded errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Consumes the context and returns the first error, if any.
    ///
    /// # Errors
    ///
    /// Returns the first recorded error.
    pub fn into_result(self) -> ValidationResult {
        self.errors.into_iter().next().map_or(Ok(()), Err)
    }

    /// Builds a missing field error qualified with the current path.
    #[must_use]
    pub fn missing_field(&self, field: impl Into<String>) -> ConfigError {
        let section = if self.path.is_empty() {
            None
        } else {
            Some(self.current_path())
        };
        ConfigError::MissingField {
            field: field.into(),
            section,
        }
    }

    /// Builds an invalid value error qualified with the current path.
    #[must_use]
    pub fn invalid_value(&self, field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
        let field = field.into();
        let field = if self.path.is_empty() {
            field
        } else {
            format!("{}.{field}", self.current_path())
        };
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Fluent validator writing into a [`ValidationContext`].
#[derive(Debug)]
pub struct Validator<'a> {
    ctx: &'a mut ValidationContext,
}

impl<'a> Validator<'a> {
    /// Creates a validator over the given context.
    pub fn new(ctx: &'a mut ValidationContext) -> Self {
        Self { ctx }
    }

    /// Requires a string field to be non-empty after trimming.
    pub fn require_non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.ctx.add_error(self.ctx.missing_field(field));
        }
        self
    }

    /// Requires a value to fall in `[min, max]`.
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
        min: &T,
        max: &T,
    ) -> &mut Self {
        if value < min || value > max {
            self.ctx.add_error(self.ctx.invalid_value(
                field,
                format!("Value {value} must be between {min} and {max}"),
            ));
        }
        self
    }

    /// Requires a value to be strictly positive.
    pub fn positive<T: PartialOrd + Default + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
    ) -> &mut Self {
        if *value <= T::default() {
            self.ctx.add_error(
                self.ctx
                    .invalid_value(field, format!("Value {value} must be positive")),
            );
        }
        self
    }

    /// Requires a value to be a lowercase DNS hostname (no port, no scheme).
    pub fn hostname(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_hostname(value) {
            self.ctx.add_error(self.ctx.invalid_value(
                field,
                format!("'{value}' is not a lowercase hostname"),
            ));
        }
        self
    }

    /// Validates using a custom predicate.
    pub fn custom<F>(&mut self, field: &str, predicate: F, error_msg: &str) -> &mut Self
    where
        F: FnOnce() -> bool,
    {
        if !predicate() {
            self.ctx.add_error(self.ctx.invalid_value(field, error_msg));
        }
        self
    }

    /// Returns the first recorded error, if any.
    ///
    /// # Errors
    ///
    /// Returns the first recorded error.
    pub fn result(&self) -> ValidationResult {
        match self.ctx.errors().first() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn is_hostname(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    })
}

/// Validates that `value` lies in `[min, max]`.
///
/// # Example
///
/// ```rust
/// use commons_core::config::validation::validate_range;
///
/// assert!(validate_range("port", &8080, &1, &65535).is_ok());
/// assert!(validate_range("port", &0, &1, &65535).is_err());
/// ```
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when out of range.
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    field: &str,
    value: &T,
    min: &T,
    max: &T,
) -> ValidationResult {
    if value < min || value > max {
        Err(ConfigError::invalid_value(
            field,
            format!("Value {value} must be between {min} and {max}"),
        ))
    } else {
        Ok(())
    }
}

/// Validates that a string field is present.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] for an empty value.
pub fn validate_required(field: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        Err(ConfigError::missing_field(field))
    } else {
        Ok(())
    }
}

/// Environment variable overrides.
///
/// Unset variables leave the target untouched. Values that fail to parse
/// are ignored as well.
///
/// ```rust
/// use commons_core::config::validation::EnvOverride;
///
/// let mut domain = "platform.com".to_string();
/// EnvOverride::apply_string("COMMONS_DOC_UNSET_VAR", &mut domain);
/// assert_eq!(domain, "platform.com");
/// ```
pub struct EnvOverride;

impl EnvOverride {
    /// Overrides a string value.
    pub fn apply_string(var_name: &str, target: &mut String) {
        if let Ok(value) = std::env::var(var_name) {
            *target = value;
        }
    }

    /// Overrides an optional string value.
    pub fn apply_optional_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(value) = std::env::var(var_name) {
            *target = Some(value);
        }
    }

    /// Overrides a value parsed with [`std::str::FromStr`].
    pub fn apply_number<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(value) = std::env::var(var_name)
            && let Ok(parsed) = value.parse()
        {
            *target = parsed;
        }
    }

    /// Overrides a boolean; accepts true/false, 1/0, yes/no, on/off.
    pub fn apply_bool(var_name: &str, target: &mut bool) {
        if let Ok(value) = std::env::var(var_name) {
            match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => *target = true,
                "false" | "0" | "no" | "off" => *target = false,
                _ => {}
            }
        }
    }

    /// Overrides a list from a comma-separated value, trimming and
    /// dropping empty entries.
    pub fn apply_list(var_name: &str, target: &mut Vec<String>) {
        if let Ok(value) = std::env::var(var_name) {
            *target = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
}
