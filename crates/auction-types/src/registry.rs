//! Self-registration of pluggable implementations.
//!
//! Storage backends and wallet providers expose a `Registry` type that names
//! the implementation and hands out its factory, so the front end can pick
//! one by the name found in configuration.

/// Implemented by the `Registry` marker of each implementation module.
pub trait ImplementationRegistry {
	/// Name used to select the implementation in configuration.
	const NAME: &'static str;

	/// Factory function type accepted by the owning crate.
	type Factory;

	/// Returns the factory that builds the implementation.
	fn factory() -> Self::Factory;
}
