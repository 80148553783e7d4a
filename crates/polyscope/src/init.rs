//! Initialization and lifecycle management for polyscope-rs.

use crate::Result;

/// Initializes polyscope.
///
/// This must be called before any other polyscope functions. It also installs
/// an `env_logger` logger unless one is already set.
///
/// # Errors
///
/// Returns an error if polyscope has already been initialized.
///
/// # Example
///
/// ```no_run
/// use polyscope::*;
///
/// fn main() -> Result<()> {
///     init()?;
///     // Now you can register cuboid networks
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    let _ = env_logger::try_init();
    polyscope_core::init_context()?;
    log::info!("polyscope-rs initialized");
    Ok(())
}

/// Returns whether polyscope has been initialized.
#[must_use]
pub fn is_initialized() -> bool {
    polyscope_core::is_initialized()
}

/// Shuts down polyscope and drops every registered structure.
///
/// After calling this, [`init()`] starts a fresh session.
pub fn shutdown() {
    polyscope_core::shutdown_context();
    log::info!("polyscope-rs shut down");
}
