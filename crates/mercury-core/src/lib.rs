pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::MercuryConfig;
pub use constants::*;
pub use error::MercuryError;
pub use types::{
    Caller, Credits, GroupName, PackageUuid, PipelineName, RequestId, RequestState, Timestamp,
};
