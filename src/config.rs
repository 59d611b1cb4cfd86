use anyhow::{Context, Result};
use clap::{App, Arg, ArgMatches};
use runit_sv::Action;
use std::path::PathBuf;
use std::time::Duration;

const SERVICE_ROOT: &str = "/var/service";
const SV_BINARY: &str = "sv";
const SV_OPTS: &str = "SV_OPTS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    List,
    Sv(Action),
}

#[derive(Debug)]
pub struct Config {
    pub command: Command,
    pub services: Vec<String>,
    pub root: PathBuf,
    pub binary: String,
    pub options: Vec<String>,
    pub wait: Option<Duration>,
    pub json: bool,
    pub debug: bool,
}

fn app() -> App<'static, 'static> {
    let mut actions = vec!["list"];
    actions.extend_from_slice(Action::NAMES);

    App::new("runit-sv")
        .about("control runit services through sv")
        .arg(
            Arg::with_name("action")
                .value_name("ACTION")
                .required(true)
                .possible_values(&actions)
                .help("sv action to run, or list to show the supervised services"),
        )
        .arg(
            Arg::with_name("services")
                .value_name("SERVICE")
                .multiple(true)
                .help("service names, defaults to every service under the root"),
        )
        .arg(
            Arg::with_name("root")
                .short("r")
                .long("root")
                .value_name("ROOT")
                .takes_value(true)
                .default_value(SERVICE_ROOT)
                .help("service root directory"),
        )
        .arg(
            Arg::with_name("binary")
                .short("b")
                .long("binary")
                .value_name("BINARY")
                .takes_value(true)
                .default_value(SV_BINARY)
                .help("sv binary to run"),
        )
        .arg(
            Arg::with_name("wait")
                .short("w")
                .long("wait")
                .value_name("SECONDS")
                .takes_value(true)
                .help("wait up to SECONDS for the service to reach the requested state"),
        )
        .arg(
            Arg::with_name("json")
                .short("j")
                .long("json")
                .takes_value(false)
                .help("print status as json"),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .takes_value(false)
                .help("enable debug logging"),
        )
}

impl Config {
    pub fn current() -> Result<Config> {
        let opts = std::env::var(SV_OPTS).ok();
        Self::from_matches(&app().get_matches(), opts.as_deref())
    }

    fn from_matches(matches: &ArgMatches, opts: Option<&str>) -> Result<Config> {
        let command = match matches.value_of("action") {
            Some("list") => Command::List,
            Some(action) => Command::Sv(action.parse()?),
            None => bail!("missing action"),
        };

        let wait = match matches.value_of("wait") {
            Some(wait) => {
                let secs: u64 = wait
                    .parse()
                    .with_context(|| format!("invalid wait value '{}'", wait))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let options = match opts {
            Some(opts) => match shlex::split(opts) {
                Some(options) => options,
                None => bail!("failed to parse {}: '{}'", SV_OPTS, opts),
            },
            None => Vec::new(),
        };

        Ok(Config {
            command,
            services: matches
                .values_of("services")
                .map(|values| values.map(String::from).collect())
                .unwrap_or_default(),
            root: PathBuf::from(matches.value_of("root").unwrap_or(SERVICE_ROOT)),
            binary: String::from(matches.value_of("binary").unwrap_or(SV_BINARY)),
            options,
            wait,
            json: matches.is_present("json"),
            debug: matches.occurrences_of("debug") > 0,
        })
    }
}
