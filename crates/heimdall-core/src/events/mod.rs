//! Process-level lifecycle events shared by every front end.

use tracing::{error, info, warn};

use crate::errors::HeimdallError;

pub fn log_app_startup(command: &str) {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION"),
        command = command
    );
}

pub fn log_app_shutdown(success: bool) {
    info!(event = "core.app.shutdown_started", success = success);
}

/// User errors (bad input, missing files) are warnings; the rest are errors.
pub fn log_app_error(error: &dyn HeimdallError) {
    if error.is_user_error() {
        warn!(
            event = "core.app.user_error",
            error = %error,
            error_code = error.error_code()
        );
    } else {
        error!(
            event = "core.app.error_occurred",
            error = %error,
            error_code = error.error_code()
        );
    }
}
