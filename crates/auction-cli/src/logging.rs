//! Logging setup and helpers pairing user output with tracing
//!
//! User-facing messages go through [`Display`]; the same events are recorded
//! as structured logs so `RUST_LOG=debug` shows what happened underneath.

use crate::cli::output::Display;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter: info for the CLI itself, warn for every other crate.
pub const DEFAULT_FILTER: &str = "auction_cli=info,warn";

/// Filter used with `--debug`.
pub const DEBUG_FILTER: &str = "auction_cli=debug,auction_wallet=debug,auction_contract=debug,info";

/// Initialize structured logging with configurable verbosity
///
/// `RUST_LOG` wins over both defaults when set.
///
/// # Errors
/// Returns an error if a global subscriber is already installed
pub fn init_logging(debug: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
	let default_filter = if debug { DEBUG_FILTER } else { DEFAULT_FILTER };
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

	tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_target(true)
				.with_thread_ids(false)
				.with_file(false)
				.with_line_number(false)
				.compact(),
		)
		.with(env_filter)
		.try_init()
}

/// Operation error with both user and developer logging
///
/// # Arguments
/// * `operation` - Name of the operation that failed
/// * `error` - Error that caused the failure
pub fn operation_error(operation: &str, error: &anyhow::Error) {
	Display::error(&format!("{} failed: {:#}", operation, error));
	error!(
		operation = operation,
		error = %error,
		"Operation failed"
	);
}

/// Operation warning with both user and developer logging
///
/// # Arguments
/// * `operation` - Name of the operation with warning
/// * `message` - Warning message to display
/// * `context` - Additional context for logging
pub fn operation_warning(operation: &str, message: &str, context: &str) {
	Display::warning(message);
	warn!(
		operation = operation,
		message = message,
		context = context,
		"Operation warning"
	);
}

/// Records the outcome of a state-changing call and displays it
pub fn call_outcome(operation: &str, result: &auction_types::CallResult) {
	Display::call_result(result);
	if result.success {
		info!(operation = operation, tx_hash = ?result.tx_hash, "Call succeeded");
	} else {
		warn!(
			operation = operation,
			message = %result.message,
			tx_hash = ?result.tx_hash,
			"Call failed"
		);
	}
}
