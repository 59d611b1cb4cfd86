#[macro_use]
extern crate log;

pub mod service;
pub mod status;
pub mod sv;

pub use service::Service;
pub use status::{StatResult, Status};
pub use sv::{Action, ErringSv, Error, FakeSv, Result, Sv, System};
