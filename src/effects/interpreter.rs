//! The seam between cascade logic and the hosting API.

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};

/// Executes [`GitHubEffect`]s for one repository.
///
/// Three implementations exist: `OctocrabClient` talks to GitHub,
/// `LoggingGitHubInterpreter` turns mutations into log lines for dry runs,
/// and the test mock scripts answers and records every call. The cascade
/// core is generic over this trait and never sees which one it has.
///
/// An interpreter is bound to a repository when it is built; effects carry
/// no repository of their own.
pub trait GitHubInterpreter {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Performs `effect` and returns the matching response variant.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}

/// Lets wrappers such as the dry-run interpreter borrow another interpreter.
impl<T> GitHubInterpreter for &T
where
    T: GitHubInterpreter + Sync,
{
    type Error = T::Error;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        T::interpret(self, effect)
    }
}
