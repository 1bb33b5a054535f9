use thiserror::Error;

use crate::model::{ItemError, ProgressError, SetError};
use crate::policy::PolicyError;
use crate::quiz::GenerateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Set(#[from] SetError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}
