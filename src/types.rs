use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Environment the host (and therefore the build tool) runs in.
///
/// - `Development`: the tool runs in watch mode and rebuilds on change.
/// - `Test` / `Production`: the tool runs once, blocking, before serving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    /// Whether builds in this environment should stay resident and rebuild
    /// on source changes.
    pub fn watches(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "invalid environment: {other} (expected \"development\", \"test\" or \"production\")"
            )),
        }
    }
}

/// How the build tool is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Run once and block until the process exits.
    OneShot,
    /// Stay resident, rebuilding on source changes.
    Watch,
}

/// Derived build state, computed from the lock and error files.
///
/// Never stored; always recomputed from the filesystem so that separate host
/// processes agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Pending,
    Success,
    Failure,
}

impl BuildOutcome {
    /// Error file wins over lock file; absence of both is success.
    pub fn from_markers(locked: bool, errored: bool) -> Self {
        if errored {
            BuildOutcome::Failure
        } else if locked {
            BuildOutcome::Pending
        } else {
            BuildOutcome::Success
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildOutcome::Pending)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildOutcome::Pending => "pending",
            BuildOutcome::Success => "success",
            BuildOutcome::Failure => "failure",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_marker_takes_precedence() {
        assert_eq!(BuildOutcome::from_markers(true, true), BuildOutcome::Failure);
        assert_eq!(BuildOutcome::from_markers(false, true), BuildOutcome::Failure);
        assert_eq!(BuildOutcome::from_markers(true, false), BuildOutcome::Pending);
        assert_eq!(BuildOutcome::from_markers(false, false), BuildOutcome::Success);
    }

    #[test]
    fn environment_parses_short_forms() {
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!(" Production ".parse::<Environment>(), Ok(Environment::Production));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn default_environment_is_development() {
        assert_eq!(Environment::default(), Environment::Development);
        assert!(Environment::default().watches());
    }
}
