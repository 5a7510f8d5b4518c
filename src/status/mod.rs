//! Human-readable status reporting.
//!
//! All status goes to the originating request as comments: one per merged
//! step, one on a merge failure, and one when the whole cascade completes.

pub mod format;

pub use format::{
    GITHUB_COMMENT_SIZE_LIMIT, STATUS_COMMENT_MARKER, format_cascade_complete, format_pr_body,
    format_pr_title, format_step_failure, format_step_success,
};
