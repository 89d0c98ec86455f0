//! Registry trait for self-registering implementations.
//!
//! Pluggable components (gateways, storage backends) expose a `Registry`
//! struct naming the configuration key they answer to and the factory that
//! builds them from their TOML table.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// Key used under `[<section>.implementations.<NAME>]` in the config file,
	/// e.g. "socket" for `provider.implementations.socket`.
	const NAME: &'static str;

	/// Factory function type of the component family.
	type Factory;

	/// Returns the factory that builds this implementation from its config table.
	fn factory() -> Self::Factory;
}
