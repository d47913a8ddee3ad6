use std::{fs::File, io::BufReader, process};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use env_logger::{Builder, Env};
use log::{error, info};

use qxlib::prelude::{
    Config, Constellation, EpochLogger, Error, Pipeline, RinexNavigation, Termination, Vector3,
    MAX_CHANNELS,
};

fn parse_ecef(s: &str) -> Result<Vector3<f64>, String> {
    let coords = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().map_err(|e| format!("{}: {}", c, e)))
        .collect::<Result<Vec<_>, _>>()?;

    match coords[..] {
        [x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(format!("expecting x,y,z ECEF coordinates, got \"{}\"", s)),
    }
}

fn command() -> Command {
    Command::new("qx2pos")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Raw GNSS observables (.qx) to position solutions")
        .arg(
            Arg::new("nav")
                .help("Broadcast navigation (RINEX) file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("obs")
                .help("Binary observables stream (.qx)")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("channels")
                .help("Receiver channel count")
                .required(true)
                .value_parser(value_parser!(usize))
                .index(3),
        )
        .arg(
            Arg::new("reference")
                .long("reference")
                .value_name("X,Y,Z")
                .value_parser(parse_ecef)
                .help("Reference ECEF position (m), enables error reporting"),
        )
        .arg(
            Arg::new("epsilon")
                .long("epsilon")
                .value_parser(value_parser!(f64))
                .help("Epoch boundary tolerance (s)"),
        )
        .arg(
            Arg::new("cn0")
                .long("cn0")
                .value_parser(value_parser!(f64))
                .help("C/N0 estimate (dB.Hz) applied to all signals"),
        )
        .arg(
            Arg::new("galileo")
                .long("galileo")
                .action(ArgAction::SetTrue)
                .help("Observables are Galileo signals"),
        )
        .arg(
            Arg::new("flush-eof")
                .long("flush-eof")
                .action(ArgAction::SetTrue)
                .help("Process the last epoch of the stream, even if incomplete"),
        )
}

fn config(matches: &ArgMatches) -> Result<Config, Error> {
    let channels = matches.get_one::<usize>("channels").copied().unwrap_or_default();
    let mut cfg = Config::with_channels(channels)?;

    if let Some(reference) = matches.get_one::<Vector3<f64>>("reference") {
        cfg = cfg.with_reference(*reference);
    }
    if let Some(epsilon) = matches.get_one::<f64>("epsilon") {
        cfg = cfg.with_tow_epsilon(*epsilon);
    }
    if let Some(cn0) = matches.get_one::<f64>("cn0") {
        cfg = cfg.with_cn0_estimate(*cn0);
    }
    if matches.get_flag("galileo") {
        cfg = cfg.with_constellation(Constellation::Galileo);
    }
    Ok(cfg.with_flush_on_eof(matches.get_flag("flush-eof")))
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let cfg = config(matches)?;
    info!("channels: {} (max {})", cfg.channels, MAX_CHANNELS);

    let nav_path = matches.get_one::<String>("nav").cloned().unwrap_or_default();
    let obs_path = matches.get_one::<String>("obs").cloned().unwrap_or_default();

    info!("reading brdc: {}", nav_path);
    let nav = RinexNavigation::from_file(&nav_path)?;

    info!("reading observables: {}", obs_path);
    let fd = File::open(&obs_path)?;

    let mut pipeline = Pipeline::new(cfg, nav, EpochLogger::default(), std::io::stdout())?;
    let summary = pipeline.run(BufReader::new(fd))?;

    match &summary.termination {
        Termination::EndOfStream => println!("EOF"),
        Termination::Malformed(e) => println!("terminated: {}", e),
    }

    println!("num_obs = {}", summary.observations);
    println!("epochs = {}", summary.epochs);
    println!("records = {}", summary.records);
    println!("solutions = {}", summary.solutions);
    println!("anomalies = {}", summary.anomalies);
    println!("out of bound channels = {}", summary.out_of_bound_channels);
    println!("quantization errors = {}", summary.quantization_errors);
    Ok(())
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        },
    };

    if let Err(e) = run(&matches) {
        error!("{}", e);
        process::exit(1);
    }
}
