//! Process-wide configuration: behaviour flags plus global callbacks.

use serde::{Deserialize, Serialize};

use crate::domain::{Callback, CallbackKind, CallbackQueues};

pub const DEFAULT_PROCESS_NAME_PREFIX: &str = "[BATCHY]";

/// Behaviour flags. Every field is optional in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// When false, starting a batch whose guid is already running ends `ignored`.
    pub allow_duplicates: bool,

    /// `clean_expired_force` refuses to run unless this is set; SIGKILL on an
    /// expired batch can hit the host application itself.
    pub allow_mass_sigkill: bool,

    /// Hand body failures back to the caller after the batch is finalized.
    pub raise_errors: bool,

    /// Relabel the process as `"{prefix} {name}"` while a batch runs.
    pub name_process: bool,

    pub process_name_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_duplicates: true,
            allow_mass_sigkill: false,
            raise_errors: false,
            name_process: true,
            process_name_prefix: DEFAULT_PROCESS_NAME_PREFIX.to_string(),
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read `BATCHY_*` environment variables on top of the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => Some(true),
                    "0" | "false" | "no" | "off" => Some(false),
                    _ => None,
                })
                .unwrap_or(default)
        };
        let defaults = Self::default();
        Self {
            allow_duplicates: flag("BATCHY_ALLOW_DUPLICATES", defaults.allow_duplicates),
            allow_mass_sigkill: flag("BATCHY_ALLOW_MASS_SIGKILL", defaults.allow_mass_sigkill),
            raise_errors: flag("BATCHY_RAISE_ERRORS", defaults.raise_errors),
            name_process: flag("BATCHY_NAME_PROCESS", defaults.name_process),
            process_name_prefix: lookup("BATCHY_PROCESS_NAME_PREFIX")
                .unwrap_or(defaults.process_name_prefix),
        }
    }

    pub fn process_title(&self, batch_name: &str) -> String {
        if self.process_name_prefix.is_empty() {
            batch_name.to_string()
        } else {
            format!("{} {}", self.process_name_prefix, batch_name)
        }
    }
}

/// Settings plus the global callbacks that run before every batch's own.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: Settings,
    global_callbacks: CallbackQueues,
}

impl Config {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            global_callbacks: CallbackQueues::new(),
        }
    }

    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.settings.allow_duplicates = allow;
        self
    }

    pub fn allow_mass_sigkill(mut self, allow: bool) -> Self {
        self.settings.allow_mass_sigkill = allow;
        self
    }

    pub fn raise_errors(mut self, raise: bool) -> Self {
        self.settings.raise_errors = raise;
        self
    }

    pub fn name_process(mut self, name: bool) -> Self {
        self.settings.name_process = name;
        self
    }

    pub fn process_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.process_name_prefix = prefix.into();
        self
    }

    pub fn add_global_success_callback(mut self, callback: impl Into<Callback>) -> Self {
        self.global_callbacks.push(CallbackKind::Success, callback);
        self
    }

    pub fn add_global_failure_callback(mut self, callback: impl Into<Callback>) -> Self {
        self.global_callbacks.push(CallbackKind::Failure, callback);
        self
    }

    pub fn add_global_ignore_callback(mut self, callback: impl Into<Callback>) -> Self {
        self.global_callbacks.push(CallbackKind::Ignore, callback);
        self
    }

    pub fn add_global_ensure_callback(mut self, callback: impl Into<Callback>) -> Self {
        self.global_callbacks.push(CallbackKind::Ensure, callback);
        self
    }

    pub fn global_callbacks(&self) -> &CallbackQueues {
        &self.global_callbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert!(s.allow_duplicates);
        assert!(!s.allow_mass_sigkill);
        assert!(!s.raise_errors);
        assert!(s.name_process);
        assert_eq!(s.process_name_prefix, "[BATCHY]");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let s = Settings::from_json_str(r#"{ "allow_duplicates": false }"#).unwrap();
        assert!(!s.allow_duplicates);
        assert!(s.name_process);
        assert_eq!(s.process_name_prefix, "[BATCHY]");
    }

    #[test]
    fn env_lookup_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BATCHY_ALLOW_MASS_SIGKILL", "yes"),
            ("BATCHY_RAISE_ERRORS", "maybe"),
            ("BATCHY_PROCESS_NAME_PREFIX", "[BOB]"),
        ]);
        let s = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert!(s.allow_mass_sigkill);
        assert!(!s.raise_errors);
        assert_eq!(s.process_name_prefix, "[BOB]");
    }

    #[test]
    fn process_title_uses_prefix() {
        let s = Settings {
            process_name_prefix: "[BOB]".into(),
            ..Settings::default()
        };
        assert_eq!(s.process_title("test"), "[BOB] test");

        let bare = Settings {
            process_name_prefix: String::new(),
            ..Settings::default()
        };
        assert_eq!(bare.process_title("test"), "test");
    }

    #[test]
    fn global_callbacks_are_kept_per_kind() {
        let config = Config::default()
            .add_global_failure_callback(Callback::new(|_| Ok(())))
            .add_global_ensure_callback(Callback::new(|_| Ok(())))
            .add_global_ensure_callback(Callback::new(|_| Ok(())));
        assert_eq!(config.global_callbacks().len(CallbackKind::Failure), 1);
        assert_eq!(config.global_callbacks().len(CallbackKind::Ensure), 2);
        assert_eq!(config.global_callbacks().len(CallbackKind::Success), 0);
    }
}
