//! Comment, title, and body formatting for cascade pull requests.
//!
//! Every comment posted on the originating request starts with
//! [`STATUS_COMMENT_MARKER`], an HTML comment that is invisible when rendered
//! but lets people and tools find automation comments.

use crate::types::{CascadeStep, PrNumber, PullRequestRef};

/// GitHub's comment size limit (65536 characters).
pub const GITHUB_COMMENT_SIZE_LIMIT: usize = 65536;

/// Maximum size for a merge failure reason quoted in a comment (4KB).
const MAX_REASON_LEN: usize = 4096;

/// Hidden marker prefixed to every status comment.
pub const STATUS_COMMENT_MARKER: &str = "<!-- release-cascade -->";

/// Title of the cascade PR for a step. Deterministic for a given pair.
pub fn format_pr_title(step: &CascadeStep) -> String {
    format!("Cascade {} into {}", step.head, step.base)
}

/// Body of the cascade PR for a step.
pub fn format_pr_body(step: &CascadeStep, origin_pr: PrNumber) -> String {
    format!(
        "{}\nAutomated release cascade: merges `{}` into `{}`.\n\n\
         Triggered by {}. This pull request is merged automatically with a merge commit; \
         if it is still open, the cascade stopped here and needs manual attention.",
        STATUS_COMMENT_MARKER, step.head, step.base, origin_pr
    )
}

/// Comment posted on the originating request after a step merges.
pub fn format_step_success(step: &CascadeStep, pr: &PullRequestRef) -> String {
    format!(
        "{}\n:white_check_mark: Cascaded `{}` into `{}` via {}.",
        STATUS_COMMENT_MARKER, step.head, step.base, pr.number
    )
}

/// Comment posted on the originating request when a step's merge is rejected.
pub fn format_step_failure(step: &CascadeStep, pr: &PullRequestRef, reason: &str) -> String {
    format!(
        "{}\n:x: Could not merge {} (`{}` into `{}`).\n\n\
         Reason: {}\n\n\
         Please resolve and merge {} manually, then merge its base forward to continue \
         the cascade. Later release branches were not updated.",
        STATUS_COMMENT_MARKER,
        pr.number,
        step.head,
        step.base,
        truncate_with_suffix(reason, MAX_REASON_LEN),
        pr.number
    )
}

/// Final comment posted on the originating request after every step merged.
pub fn format_cascade_complete(steps: &[CascadeStep]) -> String {
    let mut body = format!(
        "{}\n:tada: Release cascade complete: {} branch{} updated.\n",
        STATUS_COMMENT_MARKER,
        steps.len(),
        if steps.len() == 1 { "" } else { "es" }
    );
    for step in steps {
        body.push_str(&format!("\n- `{}` → `{}`", step.head, step.base));
    }
    body
}

/// Truncates a string to the given length with a "... [truncated]" suffix.
fn truncate_with_suffix(s: &str, max_len: usize) -> String {
    const SUFFIX: &str = "... [truncated]";

    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len.saturating_sub(SUFFIX.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &s[..end], SUFFIX)
}
