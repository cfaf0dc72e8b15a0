use std::env;

/// Runtime switches of the execution layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Fail fast: a failed statement logs the whole response envelope and
    /// stops the process. Meant for development only.
    pub debug: bool,
}

impl Config {
    pub const DEBUG_VAR: &'static str = "DRAY_DEBUG";

    /// Reads `DRAY_DEBUG`. Unset or unrecognized values leave debug off.
    pub fn from_env() -> Self {
        Self {
            debug: env::var(Self::DEBUG_VAR)
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Boolean flag in the usual spellings: `1/true/on/yes` and `0/false/off/no`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}
