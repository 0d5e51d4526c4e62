//! CLI command implementations.

mod attribute;
mod config;
mod reset;
mod show;

pub use attribute::{run_get, run_set, GetArgs, PathArgs, SetArgs, SET_NOTE};
pub use config::{run_config, ConfigArgs};
pub use reset::{run_reset, ResetArgs};
pub use show::{run_show, ShowArgs};
