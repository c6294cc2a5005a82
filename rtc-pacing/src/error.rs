use crate::module::ModuleRole;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    //Registry contract violations
    #[error("{role} module with ssrc {ssrc} is already registered")]
    ModuleAlreadyRegistered { role: ModuleRole, ssrc: u32 },
    #[error("{role} module with ssrc {ssrc} is not registered")]
    ModuleNotRegistered { role: ModuleRole, ssrc: u32 },

    //Configuration errors
    #[error("remb decrease threshold must be within 1..=100 percent, got {0}")]
    InvalidRembDecreaseThreshold(u32),
}
