//! Loader for configurations split across several TOML files.
//!
//! The entry file may name other files through `include`. Each top-level
//! section has to live in exactly one file; the merged table is then parsed
//! and validated like a single-file configuration.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a configuration file together with its includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Canonical paths already read, for cycle detection.
	visited: HashSet<PathBuf>,
	/// File each top-level section came from.
	section_origins: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	/// Creates a loader resolving relative paths against `base_path`.
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			visited: HashSet::new(),
			section_origins: HashMap::new(),
		}
	}

	/// Loads `config_path`, merges its includes and validates the result.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let entry_path = self.resolve_path(config_path)?;
		let entry_content = self.read_resolved(&entry_path).await?;
		let mut merged: toml::Value = toml::from_str(&entry_content)?;

		let includes = take_includes(&mut merged)?;
		if includes.is_empty() {
			return entry_content.parse();
		}

		self.record_sections(&merged, &entry_path)?;
		for include in includes {
			let include_path = self.resolve_path(&include)?;
			let content = self.read_resolved(&include_path).await?;
			let fragment: toml::Value = toml::from_str(&content)?;
			if fragment.get("include").is_some() {
				return Err(ConfigError::Validation(format!(
					"Nested include in {} is not supported",
					include_path.display()
				)));
			}
			self.record_sections(&fragment, &include_path)?;
			tracing::debug!(path = %include_path.display(), "Merging config include");

			if let (Some(target), toml::Value::Table(source)) = (merged.as_table_mut(), fragment)
			{
				target.extend(source);
			}
		}

		let serialized = toml::to_string(&merged).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize merged config: {}", e))
		})?;
		serialized.parse()
	}

	/// Reads a file once and substitutes environment references.
	async fn read_resolved(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	/// Remembers which file owns each top-level section.
	fn record_sections(&mut self, value: &toml::Value, origin: &Path) -> Result<(), ConfigError> {
		let Some(table) = value.as_table() else {
			return Ok(());
		};
		for key in table.keys() {
			if let Some(existing) = self.section_origins.get(key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					key,
					existing.display(),
					origin.display()
				)));
			}
			self.section_origins
				.insert(key.clone(), origin.to_path_buf());
		}
		Ok(())
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

/// Removes and returns the `include` directive (a string or array of strings).
fn take_includes(value: &mut toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	let Some(include) = value.as_table_mut().and_then(|t| t.remove("include")) else {
		return Ok(Vec::new());
	};

	match include {
		toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
		toml::Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		_ => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
