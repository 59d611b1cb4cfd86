#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;

use anyhow::{Context, Result};
use config::{Command, Config};
use runit_sv::{service, Action, Service, StatResult, Status, Sv, System};
use serde::Serialize;
use std::time::{Duration, Instant};

// longest pause between two status polls
const MAX_POLL_DELAY: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct Report<'a> {
    service: &'a str,
    #[serde(flatten)]
    stat: &'a StatResult,
}

fn main() {
    let cfg = match Config::current() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("invalid arguments: {:#}", err);
            std::process::exit(2);
        }
    };

    let level = if cfg.debug {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    if let Err(err) = simple_logger::init_with_level(level) {
        eprintln!("failed to initialize logger: {}", err);
    }

    if let Err(err) = run(&cfg) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cfg: &Config) -> Result<()> {
    let action = match cfg.command {
        Command::List => {
            for service in service::discover(&cfg.root)
                .with_context(|| format!("failed to list services in {:?}", cfg.root))?
            {
                println!("{}", service.name);
            }
            return Ok(());
        }
        Command::Sv(action) => action,
    };

    let services = services(cfg)?;
    let sv = System::with_binary(&cfg.binary).options(cfg.options.iter().cloned());

    // keep going on failure, every service gets its chance
    let mut failed = 0;
    for service in services.iter() {
        match apply(&sv, service, action, cfg) {
            Ok(Some(line)) => println!("{}", line),
            Ok(None) => {}
            Err(err) => {
                error!("{}: {:#}", service.name, err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} services failed", failed, services.len());
    }

    Ok(())
}

fn services(cfg: &Config) -> Result<Vec<Service>> {
    if cfg.services.is_empty() {
        return service::discover(&cfg.root)
            .with_context(|| format!("failed to list services in {:?}", cfg.root));
    }

    Ok(cfg
        .services
        .iter()
        .map(|name| Service::in_root(&cfg.root, name))
        .collect())
}

/// apply runs a single action on a service. Returns the line to print
/// for status queries.
fn apply(
    sv: &dyn Sv,
    service: &Service,
    action: Action,
    cfg: &Config,
) -> Result<Option<String>> {
    if action == Action::Status {
        let stat = sv.stat(service)?;
        return render(service, &stat, cfg.json).map(Some);
    }

    let out = sv.execute(service, action)?;
    info!("{}", out.trim_end());

    if let (Some(timeout), Some(want)) = (cfg.wait, expected_status(action)) {
        let stat = wait_for(sv, service, want, timeout)?;
        info!(
            "{} is {} (pid {}) after {}s",
            service.name,
            stat.child_status,
            stat.child_pid,
            stat.child_time.as_secs()
        );
    }

    Ok(None)
}

/// state the child should reach after the action, if any
fn expected_status(action: Action) -> Option<Status> {
    match action {
        Action::Start | Action::Up | Action::Restart => Some(Status::Run),
        Action::Stop | Action::Down => Some(Status::Down),
        Action::Status | Action::Once | Action::Exit => None,
    }
}

/// wait_for polls the service status with exponential backoff until the
/// child reports `want` or the timeout expires
fn wait_for(
    sv: &dyn Sv,
    service: &Service,
    want: Status,
    timeout: Duration,
) -> Result<StatResult> {
    let deadline = Instant::now() + timeout;
    // never sleep past the deadline, the last poll happens right at it
    let delays = retry::delay::Exponential::from_millis(100)
        .map(move |delay| {
            let left = deadline.saturating_duration_since(Instant::now());
            delay.min(MAX_POLL_DELAY).min(left)
        })
        .take_while(move |_| Instant::now() < deadline);

    let result = retry::retry(delays, || -> Result<StatResult> {
        let stat = sv.stat(service)?;
        if stat.child_status != want {
            debug!("{} is {}, waiting for {}", service.name, stat.child_status, want);
            bail!("service '{}' is {}, expected {}", service.name, stat.child_status, want);
        }

        Ok(stat)
    });

    match result {
        Ok(stat) => Ok(stat),
        Err(retry::Error::Operation { error, .. }) => Err(error),
        Err(retry::Error::Internal(msg)) => bail!("failed waiting for '{}': {}", service.name, msg),
    }
}

fn render(service: &Service, stat: &StatResult, json: bool) -> Result<String> {
    if json {
        let report = Report {
            service: &service.name,
            stat,
        };
        return Ok(serde_json::to_string(&report)?);
    }

    Ok(format!(
        "{}: {} (pid {}) {}s; log: {} (pid {}) {}s",
        service.name,
        stat.child_status,
        stat.child_pid,
        stat.child_time.as_secs(),
        stat.log_status,
        stat.log_pid,
        stat.log_time.as_secs()
    ))
}
