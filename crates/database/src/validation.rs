//! Input validation for dashboard-managed fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value too long.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Empty value where one is required.
    Empty(&'static str),
    /// Number outside its allowed range.
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        actual: f64,
    },
    /// Value not in the accepted format.
    InvalidFormat { field: &'static str, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "{} must be between {} and {} (got {})", field, min, max, actual),
            ValidationError::InvalidFormat { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for chatbot names.
pub const MAX_CHATBOT_NAME_LENGTH: usize = 100;

/// Maximum allowed length for knowledge source names.
pub const MAX_KNOWLEDGE_NAME_LENGTH: usize = 255;

/// Largest border radius the widget renders, in pixels.
pub const MAX_BORDER_RADIUS: i64 = 24;

/// Longest auto-open delay, in milliseconds.
pub const MAX_AUTO_OPEN_DELAY_MS: i64 = 60_000;

/// Widget positions understood by the embed script.
pub const WIDGET_POSITIONS: [&str; 4] = ["bottom-right", "bottom-left", "top-right", "top-left"];

fn validate_name(field: &'static str, name: &str, max: usize) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    let len = name.chars().count();
    if len > max {
        return Err(ValidationError::TooLong {
            field,
            max,
            actual: len,
        });
    }
    Ok(())
}

/// Validate a chatbot display name.
pub fn validate_chatbot_name(name: &str) -> Result<(), ValidationError> {
    validate_name("chatbot name", name, MAX_CHATBOT_NAME_LENGTH)
}

/// Validate a knowledge source name.
pub fn validate_knowledge_name(name: &str) -> Result<(), ValidationError> {
    validate_name("knowledge source name", name, MAX_KNOWLEDGE_NAME_LENGTH)
}

/// Validate a sampling temperature (0.0 - 2.0 inclusive).
pub fn validate_temperature(temperature: f64) -> Result<(), ValidationError> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ValidationError::OutOfRange {
            field: "temperature",
            min: 0.0,
            max: 2.0,
            actual: temperature,
        });
    }
    Ok(())
}

/// Validate a max output token count (must be positive).
pub fn validate_max_tokens(max_tokens: i64) -> Result<(), ValidationError> {
    if max_tokens <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "max_tokens",
            min: 1.0,
            max: f64::from(i32::MAX),
            actual: max_tokens as f64,
        });
    }
    Ok(())
}

/// Validate a `#rrggbb` hex color.
pub fn validate_hex_color(field: &'static str, color: &str) -> Result<(), ValidationError> {
    let Some(hex) = color.strip_prefix('#') else {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must start with #".to_string(),
        });
    };
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must be 6 hex digits".to_string(),
        });
    }
    Ok(())
}

/// Validate a widget position.
pub fn validate_position(position: &str) -> Result<(), ValidationError> {
    if !WIDGET_POSITIONS.contains(&position) {
        return Err(ValidationError::InvalidFormat {
            field: "position",
            reason: format!("expected one of {}", WIDGET_POSITIONS.join(", ")),
        });
    }
    Ok(())
}

/// Validate a widget border radius in pixels.
pub fn validate_border_radius(radius: i64) -> Result<(), ValidationError> {
    if !(0..=MAX_BORDER_RADIUS).contains(&radius) {
        return Err(ValidationError::OutOfRange {
            field: "border_radius",
            min: 0.0,
            max: MAX_BORDER_RADIUS as f64,
            actual: radius as f64,
        });
    }
    Ok(())
}

/// Validate the widget auto-open delay in milliseconds.
pub fn validate_auto_open_delay(delay_ms: i64) -> Result<(), ValidationError> {
    if !(0..=MAX_AUTO_OPEN_DELAY_MS).contains(&delay_ms) {
        return Err(ValidationError::OutOfRange {
            field: "auto_open_delay",
            min: 0.0,
            max: MAX_AUTO_OPEN_DELAY_MS as f64,
            actual: delay_ms as f64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chatbot_names() {
        assert!(validate_chatbot_name("Support Bot").is_ok());
        assert_eq!(
            validate_chatbot_name("   "),
            Err(ValidationError::Empty("chatbot name"))
        );
        let long = "x".repeat(MAX_CHATBOT_NAME_LENGTH + 1);
        assert!(matches!(
            validate_chatbot_name(&long),
            Err(ValidationError::TooLong { actual: 101, .. })
        ));
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(validate_temperature(0.0).is_ok());
        assert!(validate_temperature(0.7).is_ok());
        assert!(validate_temperature(2.0).is_ok());
        assert!(validate_temperature(-0.1).is_err());
        assert!(validate_temperature(2.5).is_err());
        assert!(validate_temperature(f64::NAN).is_err());
    }

    #[test]
    fn test_max_tokens() {
        assert!(validate_max_tokens(1024).is_ok());
        assert!(validate_max_tokens(0).is_err());
        assert!(validate_max_tokens(-5).is_err());
    }

    #[test]
    fn test_hex_colors() {
        assert!(validate_hex_color("primary_color", "#6366f1").is_ok());
        assert!(validate_hex_color("primary_color", "#FFFFFF").is_ok());
        assert!(validate_hex_color("primary_color", "6366f1").is_err());
        assert!(validate_hex_color("primary_color", "#fff").is_err());
        assert!(validate_hex_color("primary_color", "#gggggg").is_err());
    }

    #[test]
    fn test_widget_ranges() {
        assert!(validate_position("bottom-left").is_ok());
        assert!(validate_position("top-left").is_ok());
        assert!(validate_position("center").is_err());
        assert!(validate_border_radius(16).is_ok());
        assert!(validate_border_radius(25).is_err());
        assert!(validate_auto_open_delay(3000).is_ok());
        assert!(validate_auto_open_delay(60_001).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = validate_temperature(3.0).unwrap_err();
        assert_eq!(err.to_string(), "temperature must be between 0 and 2 (got 3)");
    }
}
