//! Thin `tracing` wrapper matching the four call sites the reference
//! implementation's `Logger` used. Kept as free functions rather than a
//! struct since `tracing` itself is the shared, ambient sink.

pub fn log_info(message: &str) {
    tracing::info!("{}", message);
}

pub fn log_warning(message: &str) {
    tracing::warn!("{}", message);
}

pub fn log_error(message: &str) {
    tracing::error!("{}", message);
}

pub fn log_success(message: &str) {
    tracing::info!(target: "success", "{}", message);
}
