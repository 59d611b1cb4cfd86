use std::cell::RefCell;
use std::path::PathBuf;

use crate::service::Service;

use super::{Action, Error};

/// FakeSv never spawns anything. Every action succeeds and echoes
/// `{action} {path}`, the way `sv` would be called.
#[derive(Debug, Default)]
pub struct FakeSv {
    status: Option<String>,
    calls: RefCell<Vec<(PathBuf, Action)>>,
}

impl FakeSv {
    pub fn new() -> FakeSv {
        Self::default()
    }

    /// answer `status` queries with the given line
    pub fn with_status<S>(line: S) -> FakeSv
    where
        S: Into<String>,
    {
        FakeSv {
            status: Some(line.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Action)> {
        self.calls.borrow().clone()
    }
}

impl super::Sv for FakeSv {
    fn execute(&self, service: &Service, action: Action) -> super::Result<String> {
        self.calls
            .borrow_mut()
            .push((service.path.clone(), action));

        match (action, &self.status) {
            (Action::Status, Some(line)) => Ok(format!("{}\n", line)),
            _ => Ok(format!("{} {}\n", action, service.path.display())),
        }
    }
}

/// ErringSv fails every action.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErringSv;

impl super::Sv for ErringSv {
    fn execute(&self, service: &Service, action: Action) -> super::Result<String> {
        Err(Error::Execution {
            command: format!("{} {}", action, service.path.display()),
            code: Some(1),
            output: String::from("fail: forced failure"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;
    use crate::sv::Sv;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn service() -> (tempfile::TempDir, Service) {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        std::fs::create_dir_all(dir.path().join("supervise")).expect("failed to create supervise");
        let service = Service::new(dir.path(), "foo");
        (dir, service)
    }

    #[test]
    fn test_services_can_be_started() -> super::super::Result<()> {
        let (_dir, service) = service();
        let sv = FakeSv::new();

        let out = sv.start(&service)?;
        assert_eq!(out, format!("start {}\n", service.path.display()));
        Ok(())
    }

    #[test]
    fn test_services_can_be_onced() -> super::super::Result<()> {
        let (_dir, service) = service();
        let sv = FakeSv::new();

        let out = sv.once(&service)?;
        assert_eq!(out, format!("once {}\n", service.path.display()));
        assert_eq!(sv.calls(), vec![(service.path.clone(), Action::Once)]);
        Ok(())
    }

    #[test]
    fn test_error_returned_if_service_bails() {
        let (_dir, service) = service();
        let sv = ErringSv;

        assert_matches!(sv.start(&service), Err(Error::Execution { .. }));
        assert_matches!(sv.stat(&service), Err(Error::Execution { .. }));
    }

    #[test]
    fn test_stat_parses_status_line() -> super::super::Result<()> {
        let (_dir, service) = service();
        let sv = FakeSv::with_status(
            "run: /etc/service/foo: (pid 12) 30s; down: log: 4s, normally up",
        );

        let stat = sv.stat(&service)?;
        assert_eq!(stat.child_status, Status::Run);
        assert_eq!(stat.child_pid, 12);
        assert_eq!(stat.child_time, Duration::from_secs(30));
        assert_eq!(stat.log_status, Status::Down);
        assert_eq!(stat.log_pid, 0);
        Ok(())
    }

    #[test]
    fn test_stat_without_status_line() {
        let (_dir, service) = service();
        let sv = FakeSv::new();

        assert_matches!(sv.stat(&service), Err(Error::Parse { .. }));
    }
}
