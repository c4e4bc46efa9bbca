mod error;
mod session;

pub use error::CoreError;
pub use session::{open, CoreSession};

#[allow(
    clippy::doc_markdown,
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc,
    clippy::empty_line_after_doc_comments,
    clippy::missing_safety_doc
)]
mod scaffolding {
    use super::{open, CoreError, CoreSession};
    use crate::{ComparisonRequest, DiffMode, FileChange, FileStatus, RepositoryInfo};

    uniffi::include_scaffolding!("guck_core");
}

pub use scaffolding::*;
