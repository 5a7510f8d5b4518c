//! Invocation context for a cascade run.
//!
//! The core never reads process-wide state: the harness builds a
//! [`CascadeConfig`] (typically via [`RunnerConfig::from_env`]) and passes it
//! to [`run_cascade`](super::run_cascade).

use std::env;

use thiserror::Error;

use crate::types::{PrNumber, RepoId};

/// Repository, taking precedence over `GITHUB_REPOSITORY`.
pub const ENV_REPOSITORY: &str = "CASCADE_REPOSITORY";
/// Set by GitHub Actions to `owner/repo`.
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// Trigger branch, taking precedence over `GITHUB_BASE_REF`.
pub const ENV_BRANCH: &str = "CASCADE_BRANCH";
/// Set by GitHub Actions on pull request events to the PR's base branch.
pub const ENV_GITHUB_BASE_REF: &str = "GITHUB_BASE_REF";
/// Number of the originating pull request.
pub const ENV_PR_NUMBER: &str = "CASCADE_PR_NUMBER";
pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
/// `1` or `true` to log mutations instead of executing them.
pub const ENV_DRY_RUN: &str = "CASCADE_DRY_RUN";

/// Errors building configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Everything the core needs to know about the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeConfig {
    /// Repository whose release branches are cascaded.
    pub repo: RepoId,

    /// The branch the originating change landed on.
    pub trigger_branch: String,

    /// The pull request that triggered the run; receives all status comments.
    pub origin_pr: PrNumber,
}

impl CascadeConfig {
    pub fn new(repo: RepoId, trigger_branch: impl Into<String>, origin_pr: PrNumber) -> Self {
        CascadeConfig {
            repo,
            trigger_branch: trigger_branch.into(),
            origin_pr,
        }
    }

    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from a variable lookup (see the `ENV_*` constants).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let first_set = |primary: &'static str, fallback: &'static str| {
            non_empty(&lookup, primary)
                .map(|v| (primary, v))
                .or_else(|| non_empty(&lookup, fallback).map(|v| (fallback, v)))
        };

        let (repo_var, repo_value) = first_set(ENV_REPOSITORY, ENV_GITHUB_REPOSITORY)
            .ok_or(ConfigError::Missing(ENV_REPOSITORY))?;
        let repo = RepoId::parse(&repo_value).ok_or_else(|| ConfigError::Invalid {
            name: repo_var,
            value: repo_value.clone(),
            reason: "expected owner/repo",
        })?;

        let (_, trigger_branch) =
            first_set(ENV_BRANCH, ENV_GITHUB_BASE_REF).ok_or(ConfigError::Missing(ENV_BRANCH))?;
        let trigger_branch = trigger_branch
            .strip_prefix("refs/heads/")
            .map(str::to_string)
            .unwrap_or(trigger_branch);

        let pr_value = non_empty(&lookup, ENV_PR_NUMBER).ok_or(ConfigError::Missing(ENV_PR_NUMBER))?;
        let origin_pr = pr_value
            .trim_start_matches('#')
            .parse::<u64>()
            .map(PrNumber)
            .map_err(|_| ConfigError::Invalid {
                name: ENV_PR_NUMBER,
                value: pr_value.clone(),
                reason: "expected a pull request number",
            })?;

        Ok(CascadeConfig {
            repo,
            trigger_branch,
            origin_pr,
        })
    }
}

/// Harness configuration: the run context plus credentials and mode.
#[derive(Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub cascade: CascadeConfig,
    pub token: String,
    pub dry_run: bool,
}

impl RunnerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cascade = CascadeConfig::from_lookup(&lookup)?;
        let token = non_empty(&lookup, ENV_TOKEN).ok_or(ConfigError::Missing(ENV_TOKEN))?;
        let dry_run = match non_empty(&lookup, ENV_DRY_RUN) {
            None => false,
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
                name: ENV_DRY_RUN,
                value: v,
                reason: "expected true/false/1/0",
            })?,
        };

        Ok(RunnerConfig {
            cascade,
            token,
            dry_run,
        })
    }
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("cascade", &self.cascade)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_cascade_variables() {
        let config = CascadeConfig::from_lookup(lookup(&[
            (ENV_REPOSITORY, "acme/widgets"),
            (ENV_BRANCH, "release/v1.0.0"),
            (ENV_PR_NUMBER, "42"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            CascadeConfig::new(RepoId::new("acme", "widgets"), "release/v1.0.0", PrNumber(42))
        );
    }

    #[test]
    fn falls_back_to_github_actions_variables() {
        let config = CascadeConfig::from_lookup(lookup(&[
            (ENV_GITHUB_REPOSITORY, "acme/widgets"),
            (ENV_GITHUB_BASE_REF, "refs/heads/release/v2.0.0"),
            (ENV_PR_NUMBER, "#7"),
        ]))
        .unwrap();

        assert_eq!(config.repo, RepoId::new("acme", "widgets"));
        assert_eq!(config.trigger_branch, "release/v2.0.0");
        assert_eq!(config.origin_pr, PrNumber(7));
    }

    #[test]
    fn explicit_variables_win() {
        let config = CascadeConfig::from_lookup(lookup(&[
            (ENV_REPOSITORY, "acme/override"),
            (ENV_GITHUB_REPOSITORY, "acme/widgets"),
            (ENV_BRANCH, "release/v3.0.0"),
            (ENV_GITHUB_BASE_REF, "release/v1.0.0"),
            (ENV_PR_NUMBER, "1"),
        ]))
        .unwrap();

        assert_eq!(config.repo.repo, "override");
        assert_eq!(config.trigger_branch, "release/v3.0.0");
    }

    #[test]
    fn missing_variables_are_named() {
        assert_eq!(
            CascadeConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing(ENV_REPOSITORY))
        );
        assert_eq!(
            CascadeConfig::from_lookup(lookup(&[(ENV_REPOSITORY, "a/b")])),
            Err(ConfigError::Missing(ENV_BRANCH))
        );
        assert_eq!(
            CascadeConfig::from_lookup(lookup(&[(ENV_REPOSITORY, "a/b"), (ENV_BRANCH, "  ")])),
            Err(ConfigError::Missing(ENV_BRANCH))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            CascadeConfig::from_lookup(lookup(&[
                (ENV_REPOSITORY, "not-a-repo"),
                (ENV_BRANCH, "release/v1.0.0"),
                (ENV_PR_NUMBER, "1"),
            ])),
            Err(ConfigError::Invalid { name: ENV_REPOSITORY, .. })
        ));
        assert!(matches!(
            CascadeConfig::from_lookup(lookup(&[
                (ENV_REPOSITORY, "a/b"),
                (ENV_BRANCH, "release/v1.0.0"),
                (ENV_PR_NUMBER, "abc"),
            ])),
            Err(ConfigError::Invalid { name: ENV_PR_NUMBER, .. })
        ));
    }

    #[test]
    fn runner_config_reads_token_and_dry_run() {
        let vars = [
            (ENV_REPOSITORY, "a/b"),
            (ENV_BRANCH, "release/v1.0.0"),
            (ENV_PR_NUMBER, "3"),
            (ENV_TOKEN, "ghp_secret"),
            (ENV_DRY_RUN, "TRUE"),
        ];
        let config = RunnerConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.token, "ghp_secret");
        assert!(!format!("{:?}", config).contains("ghp_secret"));
    }

    #[test]
    fn runner_config_requires_token() {
        let vars = [
            (ENV_REPOSITORY, "a/b"),
            (ENV_BRANCH, "release/v1.0.0"),
            (ENV_PR_NUMBER, "3"),
        ];
        assert_eq!(
            RunnerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing(ENV_TOKEN))
        );
    }

    #[test]
    fn dry_run_defaults_off_and_rejects_garbage() {
        let base = [
            (ENV_REPOSITORY, "a/b"),
            (ENV_BRANCH, "release/v1.0.0"),
            (ENV_PR_NUMBER, "3"),
            (ENV_TOKEN, "t"),
        ];
        assert!(!RunnerConfig::from_lookup(lookup(&base)).unwrap().dry_run);

        let mut with_garbage = base.to_vec();
        with_garbage.push((ENV_DRY_RUN, "maybe"));
        assert!(matches!(
            RunnerConfig::from_lookup(lookup(&with_garbage)),
            Err(ConfigError::Invalid { name: ENV_DRY_RUN, .. })
        ));
    }
}
