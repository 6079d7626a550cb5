use thiserror::Error;

use crate::domain::ports::PublishError;

#[derive(Debug, Error)]
pub enum DomainError {
    /// The channel refused or failed the publish; the message is passed through.
    #[error(transparent)]
    Upstream(#[from] PublishError),
}
