use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::sv::{Error, Result};

/// State of a supervised process as reported by `sv status`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Run,
    Down,
    Finish,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Run => "run",
            Status::Down => "down",
            Status::Finish => "finish",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatResult {
    pub child_status: Status,
    pub child_pid: u64,
    #[serde(serialize_with = "seconds")]
    pub child_time: Duration,
    pub log_status: Status,
    pub log_pid: u64,
    #[serde(serialize_with = "seconds")]
    pub log_time: Duration,
}

fn seconds<S>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_u64(d.as_secs())
}

impl StatResult {
    /// parse a single `sv status` line of the form
    ///
    /// `run: /etc/service/foo: (pid 123) 45s; run: log: (pid 122) 50s`
    ///
    /// `down` entries carry no pid, their pid is reported as 0. Anything
    /// after the elapsed time (`, normally up`, `, want down`) is ignored.
    pub fn parse(line: &str) -> Result<StatResult> {
        let invalid = |reason: String| Error::Parse {
            line: line.into(),
            reason,
        };

        // the log segment never contains "; ", a service path might
        let (child, log) = match line.trim_end().rsplit_once("; ") {
            Some(parts) => parts,
            None => return Err(invalid("missing log segment".into())),
        };

        let child = segment(child).map_err(|e| invalid(format!("service: {}", e)))?;
        let log = segment(log).map_err(|e| invalid(format!("log: {}", e)))?;

        if log.name != "log" {
            return Err(invalid(format!("expected log segment, got '{}'", log.name)));
        }

        Ok(StatResult {
            child_status: child.status,
            child_pid: child.pid,
            child_time: child.time,
            log_status: log.status,
            log_pid: log.pid,
            log_time: log.time,
        })
    }
}

impl FromStr for StatResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<StatResult> {
        StatResult::parse(s)
    }
}

struct Segment<'a> {
    status: Status,
    name: &'a str,
    pid: u64,
    time: Duration,
}

fn segment(text: &str) -> std::result::Result<Segment, String> {
    let (keyword, rest) = text
        .split_once(": ")
        .ok_or_else(|| format!("no status in '{}'", text))?;

    let status = match keyword {
        "run" => Status::Run,
        "down" => Status::Down,
        "finish" => Status::Finish,
        k => return Err(format!("unknown status '{}'", k)),
    };

    let (name, state) = rest
        .rsplit_once(": ")
        .ok_or_else(|| format!("no state in '{}'", rest))?;

    let (pid, state) = match state.strip_prefix("(pid ") {
        Some(state) => {
            let (pid, state) = state
                .split_once(") ")
                .ok_or_else(|| format!("malformed pid in '{}'", text))?;
            (Some(number(pid)?), state)
        }
        None => (None, state),
    };

    let pid = match (status, pid) {
        (_, Some(pid)) => pid,
        (Status::Down, None) => 0,
        (status, None) => return Err(format!("missing pid for {} process", status)),
    };

    // the elapsed time may be followed by `, normally up` and friends
    let time = match state.split_once(", ") {
        Some((time, _)) => time,
        None => state,
    };
    let time = time
        .strip_suffix('s')
        .ok_or_else(|| format!("malformed elapsed time '{}'", time))?;

    Ok(Segment {
        status,
        name,
        pid,
        time: Duration::from_secs(number(time)?),
    })
}

fn number(text: &str) -> std::result::Result<u64, String> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a number", text));
    }

    text.parse()
        .map_err(|e| format!("'{}' is not a number: {}", text, e))
}
