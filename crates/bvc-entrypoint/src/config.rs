//! Entrypoint configuration, read once from the environment.

use std::ffi::OsString;

use crate::error::{EntrypointError, EntrypointResult};

/// Program run when `CONCAT_COMMAND` is unset.
pub const DEFAULT_COMMAND: [&str; 2] = ["python3", "/app/blackvueconcat.py"];

/// Variable overriding the concat program command line.
pub const COMMAND_VAR: &str = "CONCAT_COMMAND";

/// How a variable is forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// `--flag <value>`
    Value,
    /// `--flag`, whatever the variable holds.
    Switch,
}

/// A recognized environment variable and the flag it turns into.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    pub env: &'static str,
    pub flag: &'static str,
    pub kind: FlagKind,
}

const fn value(env: &'static str, flag: &'static str) -> FlagSpec {
    FlagSpec {
        env,
        flag,
        kind: FlagKind::Value,
    }
}

const fn switch(env: &'static str, flag: &'static str) -> FlagSpec {
    FlagSpec {
        env,
        flag,
        kind: FlagKind::Switch,
    }
}

/// Recognized variables in emission order.
pub const FLAGS: [FlagSpec; 11] = [
    value("LOGGING_LEVEL", "--logging-level"),
    value("SOURCE_DIR", "--source-dir"),
    value("WORK_DIR", "--work-dir"),
    value("OUTPUT_DIR", "--output-dir"),
    value("CONSECUTIVE_THRESHOLD", "--consecutive-threshold"),
    value("CONCAT_THRESHOLD", "--concat-threshold"),
    value("RETENTION", "--retention"),
    switch("INITIAL_IMPACT", "--initial-impact"),
    switch("NO_OUTPUT", "--no-output"),
    switch("OVERWRITE", "--overwrite"),
    value("LOG_FILE", "--log-file"),
];

/// One flag to pass, with its value for value-taking flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatFlag {
    pub flag: &'static str,
    pub value: Option<OsString>,
}

/// Everything the wrapper needs, resolved at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointConfig {
    /// Program and leading arguments
    pub command: Vec<String>,
    /// Flags to append, in emission order
    pub flags: Vec<ConcatFlag>,
}

impl Default for EntrypointConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect(),
            flags: Vec::new(),
        }
    }
}

impl EntrypointConfig {
    /// Create config from environment variables.
    pub fn from_env() -> EntrypointResult<Self> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Create config from an arbitrary variable source.
    ///
    /// Empty values count as unset. Values are forwarded verbatim.
    pub fn from_lookup<F>(lookup: F) -> EntrypointResult<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let command = match get(COMMAND_VAR) {
            Some(line) => {
                let line = line
                    .into_string()
                    .map_err(|line| EntrypointError::invalid_command(format!("{:?} is not valid unicode", line)))?;
                split_command(&line)?
            }
            None => Self::default().command,
        };

        let flags = FLAGS
            .iter()
            .filter_map(|spec| {
                get(spec.env).map(|v| ConcatFlag {
                    flag: spec.flag,
                    value: match spec.kind {
                        FlagKind::Value => Some(v),
                        FlagKind::Switch => None,
                    },
                })
            })
            .collect();

        Ok(Self { command, flags })
    }
}

fn split_command(line: &str) -> EntrypointResult<Vec<String>> {
    match shlex::split(line) {
        Some(words) if !words.is_empty() => Ok(words),
        Some(_) => Err(EntrypointError::invalid_command("no program given")),
        None => Err(EntrypointError::invalid_command(format!("cannot split {:?}", line))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> EntrypointConfig {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        EntrypointConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_no_variables() {
        let cfg = config(&[]);
        assert_eq!(cfg, EntrypointConfig::default());
        assert_eq!(cfg.command, vec!["python3", "/app/blackvueconcat.py"]);
    }

    #[test]
    fn test_empty_variables_are_unset() {
        let vars: Vec<(&str, &str)> = FLAGS.iter().map(|spec| (spec.env, "")).collect();
        let cfg = config(&vars);
        assert!(cfg.flags.is_empty());
    }

    #[test]
    fn test_every_variable_once_in_table_order() {
        let vars: Vec<(&str, &str)> = FLAGS.iter().map(|spec| (spec.env, "7")).collect();
        let cfg = config(&vars);

        let flags: Vec<&str> = cfg.flags.iter().map(|f| f.flag).collect();
        let expected: Vec<&str> = FLAGS.iter().map(|spec| spec.flag).collect();
        assert_eq!(flags, expected);
    }

    #[test]
    fn test_switches_carry_no_value() {
        let cfg = config(&[("INITIAL_IMPACT", "false"), ("NO_OUTPUT", "0"), ("OVERWRITE", "yes")]);
        assert_eq!(
            cfg.flags,
            vec![
                ConcatFlag { flag: "--initial-impact", value: None },
                ConcatFlag { flag: "--no-output", value: None },
                ConcatFlag { flag: "--overwrite", value: None },
            ]
        );
    }

    #[test]
    fn test_consecutive_threshold_is_forwarded() {
        let cfg = config(&[("CONSECUTIVE_THRESHOLD", "5")]);
        assert_eq!(
            cfg.flags,
            vec![ConcatFlag {
                flag: "--consecutive-threshold",
                value: Some("5".into()),
            }]
        );
    }

    #[test]
    fn test_values_are_verbatim() {
        let cfg = config(&[("RETENTION", "not a number"), ("SOURCE_DIR", " /data/in ")]);
        assert_eq!(cfg.flags[0].value, Some(" /data/in ".into()));
        assert_eq!(cfg.flags[1].value, Some("not a number".into()));
    }

    #[test]
    fn test_command_override() {
        let cfg = config(&[("CONCAT_COMMAND", "/usr/local/bin/blackvueconcat")]);
        assert_eq!(cfg.command, vec!["/usr/local/bin/blackvueconcat"]);

        let cfg = config(&[("CONCAT_COMMAND", "nice -n 10 '/opt/concat tool'")]);
        assert_eq!(cfg.command, vec!["nice", "-n", "10", "/opt/concat tool"]);
    }

    #[test]
    fn test_invalid_command() {
        let lookup = |line: &'static str| {
            move |name: &str| (name == COMMAND_VAR).then(|| OsString::from(line))
        };
        assert!(matches!(
            EntrypointConfig::from_lookup(lookup("'unbalanced")),
            Err(EntrypointError::InvalidCommand(_))
        ));
        assert!(matches!(
            EntrypointConfig::from_lookup(lookup("   ")),
            Err(EntrypointError::InvalidCommand(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_value_is_forwarded() {
        use std::os::unix::ffi::OsStringExt;

        let dir = OsString::from_vec(b"/data/\xffin".to_vec());
        let expected = dir.clone();
        let cfg = EntrypointConfig::from_lookup(move |name| {
            (name == "SOURCE_DIR").then(|| dir.clone())
        })
        .unwrap();

        assert_eq!(
            cfg.flags,
            vec![ConcatFlag {
                flag: "--source-dir",
                value: Some(expected),
            }]
        );
    }
}
