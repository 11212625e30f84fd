// lib.rs

pub use std::{
    net,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

pub use log::*;
pub use serde::{Deserialize, Serialize};
pub use tokio::time::{Duration, sleep};

mod error;
pub use error::*;

mod config;
pub use config::*;

mod state;
pub use state::*;

mod measure;
pub use measure::*;

mod report;
pub use report::*;

mod mqtt;
pub use mqtt::*;

mod apiserver;
pub use apiserver::*;

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

// EOF
