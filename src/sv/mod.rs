use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::service::Service;
use crate::status::StatResult;

mod fake;
mod system;

pub use fake::{ErringSv, FakeSv};
pub use system::System;

/// Control interface of the runit `sv` utility. Implementors only provide
/// `execute`, every action is a single call to it.
pub trait Sv {
    /// run `sv {action} {service.path}` and return its output
    fn execute(&self, service: &Service, action: Action) -> Result<String>;

    fn start(&self, service: &Service) -> Result<String> {
        self.execute(service, Action::Start)
    }

    fn stop(&self, service: &Service) -> Result<String> {
        self.execute(service, Action::Stop)
    }

    fn restart(&self, service: &Service) -> Result<String> {
        self.execute(service, Action::Restart)
    }

    fn once(&self, service: &Service) -> Result<String> {
        self.execute(service, Action::Once)
    }

    fn exit(&self, service: &Service) -> Result<String> {
        self.execute(service, Action::Exit)
    }

    fn up(&self, service: &Service) -> Result<String> {
        self.execute(service, Action::Up)
    }

    fn down(&self, service: &Service) -> Result<String> {
        self.execute(service, Action::Down)
    }

    /// query the service status and parse the first line of the output
    fn stat(&self, service: &Service) -> Result<StatResult> {
        let output = self.execute(service, Action::Status)?;
        output.lines().next().unwrap_or_default().parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Status,
    Up,
    Down,
    Once,
    Start,
    Stop,
    Restart,
    Exit,
}

impl Action {
    pub const NAMES: &'static [&'static str] = &[
        "status", "up", "down", "once", "start", "stop", "restart", "exit",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Status => "status",
            Action::Up => "up",
            Action::Down => "down",
            Action::Once => "once",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
            Action::Exit => "exit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Action> {
        let action = match s {
            "status" => Action::Status,
            "up" => Action::Up,
            "down" => Action::Down,
            "once" => Action::Once,
            "start" => Action::Start,
            "stop" => Action::Stop,
            "restart" => Action::Restart,
            "exit" => Action::Exit,
            s => return Err(Error::UnknownAction(s.into())),
        };

        Ok(action)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to run '{command}' (exit code: {code:?}): {output}")]
    Execution {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("invalid status line '{line}': {reason}")]
    Parse { line: String, reason: String },

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_action_names() -> Result<()> {
        for name in Action::NAMES {
            let action: Action = name.parse()?;
            assert_eq!(action.as_str(), *name);
            assert_eq!(action.to_string(), *name);
        }

        assert_matches!("reload".parse::<Action>(), Err(Error::UnknownAction(s)) if s == "reload");
        Ok(())
    }
}
