use std::path::PathBuf;
use std::process::Command;

use crate::service::Service;

use super::{Action, Error};

const SV_BINARY: &str = "sv";

/// System runs the real `sv` binary, one process per call.
#[derive(Debug, Clone)]
pub struct System {
    binary: PathBuf,
    options: Vec<String>,
}

impl System {
    pub fn new() -> System {
        Self::with_binary(SV_BINARY)
    }

    pub fn with_binary<P>(binary: P) -> System
    where
        P: Into<PathBuf>,
    {
        System {
            binary: binary.into(),
            options: Vec::new(),
        }
    }

    /// extra arguments passed before the action, e.g. `-w 10`
    pub fn options<I, S>(mut self, options: I) -> System
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Sv for System {
    fn execute(&self, service: &Service, action: Action) -> super::Result<String> {
        // sv {options} {action} {service.path}
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.options);
        cmd.arg(action.as_str());
        cmd.arg(&service.path);

        let command = format!("{:?}", cmd);
        debug!("{}: {}", service.name, command);

        let output = match cmd.output() {
            Ok(output) => output,
            Err(err) => {
                debug!("failed to spawn {}: {}", command, err);
                return Err(Error::Execution {
                    command,
                    code: None,
                    output: err.to_string(),
                });
            }
        };

        if !output.status.success() {
            // sv reports failures (`fail: ...`, `timeout: ...`) on stdout
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));

            debug!("{} exited with {}", command, output.status);
            return Err(Error::Execution {
                command,
                code: output.status.code(),
                output: text.trim().into(),
            });
        }

        let code = output.status.code();
        String::from_utf8(output.stdout).map_err(|err| Error::Execution {
            command,
            code,
            output: format!("invalid utf-8 output: {}", err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sv::Sv;
    use assert_matches::assert_matches;

    fn service() -> (tempfile::TempDir, Service) {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        std::fs::create_dir_all(dir.path().join("supervise")).expect("failed to create supervise");
        let service = Service::new(dir.path(), "foo");
        (dir, service)
    }

    #[test]
    fn test_passes_action_and_path() -> super::super::Result<()> {
        let (_dir, service) = service();
        let sv = System::with_binary("echo");

        assert_eq!(
            sv.start(&service)?,
            format!("start {}\n", service.path.display())
        );
        assert_eq!(
            sv.once(&service)?,
            format!("once {}\n", service.path.display())
        );
        Ok(())
    }

    #[test]
    fn test_options_come_first() -> super::super::Result<()> {
        let (_dir, service) = service();
        let sv = System::with_binary("echo").options(vec!["-w", "7"]);

        assert_eq!(
            sv.stop(&service)?,
            format!("-w 7 stop {}\n", service.path.display())
        );
        Ok(())
    }

    #[test]
    fn test_non_zero_exit() {
        let (_dir, service) = service();
        let sv = System::with_binary("false");

        assert_matches!(
            sv.start(&service),
            Err(Error::Execution { code: Some(1), .. })
        );
    }

    #[test]
    fn test_invalid_utf8_output() {
        let (_dir, service) = service();
        // sh -c {script} status {path}: the trailing args land in $0 and $1
        let sv = System::with_binary("sh").options(vec!["-c", r"printf '\377\376'"]);

        assert_matches!(
            sv.stat(&service),
            Err(Error::Execution { code: Some(0), output, .. }) if output.contains("utf-8")
        );
    }

    #[test]
    fn test_missing_binary() {
        let (_dir, service) = service();
        let sv = System::with_binary("/nonexistent/bin/sv");

        assert_matches!(
            sv.restart(&service),
            Err(Error::Execution { code: None, .. })
        );
    }
}
