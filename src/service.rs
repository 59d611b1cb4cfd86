use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::sv::Result;

const SUPERVISE_DIR: &str = "supervise";

/// A runit service, identified by its control directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub path: PathBuf,
    pub name: String,
}

impl Service {
    pub fn new<P, S>(path: P, name: S) -> Service
    where
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        Service {
            path: path.into(),
            name: String::from(name.as_ref()),
        }
    }

    /// service `name` living under a service root such as `/var/service`
    pub fn in_root<P, S>(root: P, name: S) -> Service
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        Service::new(root.as_ref().join(name.as_ref()), name)
    }

    pub fn supervise_dir(&self) -> PathBuf {
        self.path.join(SUPERVISE_DIR)
    }

    /// true once runsv has created the supervise directory
    pub fn is_supervised(&self) -> bool {
        self.supervise_dir().is_dir()
    }
}

/// discover lists all supervised services directly under root, sorted by
/// name. Entries are usually symlinks into /etc/sv so links are followed.
pub fn discover<P>(root: P) -> Result<Vec<Service>>
where
    P: AsRef<Path>,
{
    let root = root.as_ref();
    if !fs::metadata(root)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a directory", root.display()),
        )
        .into());
    }

    let mut services = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // a dangling link should not hide the other services
                warn!("skipping service entry: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let service = Service::new(entry.path(), entry.file_name().to_string_lossy());
        if !service.is_supervised() {
            debug!("{} has no supervise directory", service.path.display());
            continue;
        }

        services.push(service);
    }

    Ok(services)
}
