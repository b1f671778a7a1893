use log::{debug, error, info, warn};

/// Thin wrapper over the `log` facade so model, field, and handler code can
/// hold a logger the way processing stages hold their pools.
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn trace(&self, message: &str) {
        debug!("{}", message);
    }

    pub fn caution(&self, message: &str) {
        warn!("{}", message);
    }

    pub fn fail(&self, message: &str) {
        error!("{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
