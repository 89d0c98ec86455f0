//! Configuration validation for pluggable implementations.
//!
//! Each gateway and storage implementation receives its own raw TOML table.
//! Implementations describe that table with a [`Schema`] and validate it
//! before construction, so a bad `base_url` or negative TTL fails at startup
//! with the offending field named.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field is present but its value is unacceptable.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong TOML type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// The table could not be deserialized into the implementation config.
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// Any string.
	String,
	/// An `http://` or `https://` URL.
	Url,
	/// An integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A decimal number, written either as a TOML number or a string.
	Decimal { min: Option<Decimal> },
	/// A boolean.
	Boolean,
	/// An array whose elements all have the given type.
	Array(Box<FieldType>),
	/// A nested table validated by its own schema.
	Table(Schema),
}

/// Custom validation hook run after the type check.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a schema from required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates `config`, which must be a table.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| type_mismatch("root", "table", config))?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn type_mismatch(field: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn invalid(field: &str, message: String) -> ValidationError {
	ValidationError::InvalidValue {
		field: field.to_string(),
		message,
	}
}

/// Parses a TOML value holding a decimal number (integer, float or string).
pub fn toml_decimal(value: &toml::Value) -> Option<Decimal> {
	match value {
		toml::Value::Integer(i) => Some(Decimal::from(*i)),
		toml::Value::Float(f) => Decimal::from_str(&f.to_string()).ok(),
		toml::Value::String(s) => Decimal::from_str(s.trim()).ok(),
		_ => None,
	}
}

fn check_type(
	field_name: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		},
		FieldType::Url => {
			let url = value
				.as_str()
				.ok_or_else(|| type_mismatch(field_name, "string", value))?;
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(invalid(
					field_name,
					format!("'{}' must start with http:// or https://", url),
				));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| type_mismatch(field_name, "integer", value))?;
			if let Some(min) = min.filter(|m| int_val < *m) {
				return Err(invalid(
					field_name,
					format!("Value {} is less than minimum {}", int_val, min),
				));
			}
			if let Some(max) = max.filter(|m| int_val > *m) {
				return Err(invalid(
					field_name,
					format!("Value {} is greater than maximum {}", int_val, max),
				));
			}
		},
		FieldType::Decimal { min } => {
			let dec_val =
				toml_decimal(value).ok_or_else(|| type_mismatch(field_name, "decimal", value))?;
			if let Some(min) = min.filter(|m| dec_val < *m) {
				return Err(invalid(
					field_name,
					format!("Value {} is less than minimum {}", dec_val, min),
				));
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(type_mismatch(field_name, "boolean", value));
			}
		},
		FieldType::Array(inner) => {
			let items = value
				.as_array()
				.ok_or_else(|| type_mismatch(field_name, "array", value))?;
			for (i, item) in items.iter().enumerate() {
				check_type(&format!("{}[{}]", field_name, i), item, inner)?;
			}
		},
		FieldType::Table(schema) => {
			schema
				.validate(value)
				.map_err(|e| prefix_field(field_name, e))?;
		},
	}

	Ok(())
}

/// Qualifies a nested error's field with its parent table name.
fn prefix_field(parent: &str, error: ValidationError) -> ValidationError {
	match error {
		ValidationError::MissingField(f) => {
			ValidationError::MissingField(format!("{}.{}", parent, f))
		},
		ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
			field: format!("{}.{}", parent, field),
			message,
		},
		ValidationError::TypeMismatch {
			field,
			expected,
			actual,
		} => ValidationError::TypeMismatch {
			field: format!("{}.{}", parent, field),
			expected,
			actual,
		},
		other => other,
	}
}

/// A configuration schema that validates an implementation's TOML table.
pub trait ConfigSchema: Send + Sync {
	/// Validates the table, naming the offending field on failure.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(input: &str) -> toml::Value {
		toml::from_str(input).unwrap()
	}

	fn gateway_schema() -> Schema {
		Schema::new(
			vec![Field::new("base_url", FieldType::Url)],
			vec![
				Field::new(
					"max_routes",
					FieldType::Integer {
						min: Some(1),
						max: Some(50),
					},
				),
				Field::new(
					"min_fee",
					FieldType::Decimal {
						min: Some(Decimal::ZERO),
					},
				),
				Field::new(
					"bridges",
					FieldType::Array(Box::new(FieldType::String)),
				),
			],
		)
	}

	#[test]
	fn test_valid_table() {
		let config = parse(
			r#"
base_url = "https://api.socket.tech/v2"
max_routes = 5
min_fee = "0.5"
bridges = ["hop", "stargate"]
"#,
		);
		assert!(gateway_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let err = gateway_schema().validate(&parse("max_routes = 5")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "base_url"));
	}

	#[test]
	fn test_bad_url() {
		let err = gateway_schema()
			.validate(&parse(r#"base_url = "ftp://example.com""#))
			.unwrap_err();
		assert!(err.to_string().contains("base_url"));
	}

	#[test]
	fn test_integer_bounds() {
		let err = gateway_schema()
			.validate(&parse(
				r#"
base_url = "http://localhost:8080"
max_routes = 99
"#,
			))
			.unwrap_err();
		assert!(err.to_string().contains("greater than maximum 50"));
	}

	#[test]
	fn test_decimal_minimum() {
		let err = gateway_schema()
			.validate(&parse(
				r#"
base_url = "http://localhost:8080"
min_fee = -1
"#,
			))
			.unwrap_err();
		assert!(err.to_string().contains("less than minimum"));
	}

	#[test]
	fn test_array_element_type() {
		let err = gateway_schema()
			.validate(&parse(
				r#"
base_url = "http://localhost:8080"
bridges = ["hop", 3]
"#,
			))
			.unwrap_err();
		assert!(matches!(
			err,
			ValidationError::TypeMismatch { ref field, .. } if field == "bridges[1]"
		));
	}

	#[test]
	fn test_nested_table_prefix() {
		let schema = Schema::new(
			vec![Field::new(
				"auth",
				FieldType::Table(Schema::new(vec![Field::new("key", FieldType::String)], vec![])),
			)],
			vec![],
		);
		let err = schema.validate(&parse("[auth]\nother = 1")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "auth.key"));
	}

	#[test]
	fn test_toml_decimal_forms() {
		assert_eq!(toml_decimal(&toml::Value::Integer(3)), Some(Decimal::from(3)));
		assert_eq!(
			toml_decimal(&toml::Value::String("0.01".into())),
			Some("0.01".parse().unwrap())
		);
		assert!(toml_decimal(&toml::Value::Boolean(true)).is_none());
	}
}
