//! Configuration errors

use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// The simulation core itself never fails; hosts log these and fall back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config payload was not valid JSON for `SimConfig`.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tunable is out of its permitted range.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParam {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidParam { field, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = ConfigError::invalid("lane.damping", "must be in (0, 1]");
        let msg = format!("{e}");
        assert!(msg.contains("lane.damping"));
        assert!(msg.contains("(0, 1]"));
    }
}
