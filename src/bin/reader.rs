use std::io::Write;

use clap::{App, Arg};
use log::error;
use shmcast::{PublisherConfig, Result, SegmentReader, ShmCastError, Strategy};

fn main() {
    env_logger::init();

    let matches = App::new("shmcast-read")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reads and decodes a segment published by shmcast")
        .arg(
            Arg::with_name("conf")
                .short("c")
                .long("conf")
                .value_name("FILE")
                .help("Derive the segment key from a publisher config file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("anchor")
                .short("a")
                .long("anchor")
                .value_name("PATH")
                .help("Anchor file the publisher derived its key from")
                .takes_value(true)
                .conflicts_with("conf"),
        )
        .arg(
            Arg::with_name("project-id")
                .short("p")
                .long("project-id")
                .value_name("ID")
                .help("Project id mixed into the segment key")
                .default_value("100")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("strategy")
                .short("s")
                .long("strategy")
                .value_name("NAME")
                .help("Payload strategy: framed, raw or json")
                .default_value("framed")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("raw")
                .long("raw")
                .help("Dump the raw segment bytes to stdout without decoding"),
        )
        .get_matches();

    match run(&matches) {
        Ok(()) => {}
        // a missing or torn segment means "try again later", not a fault
        Err(e) if e.is_retryable() => {
            eprintln!("segment not readable yet: {}", e);
            std::process::exit(2);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let reader = if let Some(conf) = matches.value_of("conf") {
        SegmentReader::from_config(&PublisherConfig::load(conf)?)?
    } else {
        let anchor = matches.value_of("anchor").ok_or_else(|| {
            ShmCastError::invalid_parameter("anchor", "either --conf or --anchor is required")
        })?;
        let project_id: u8 = matches
            .value_of("project-id")
            .unwrap()
            .parse()
            .map_err(|_| {
                ShmCastError::invalid_parameter("project-id", "expected a value in 0..=255")
            })?;
        let strategy: Strategy = matches.value_of("strategy").unwrap().parse()?;
        SegmentReader::new(anchor, project_id, strategy)?
    };

    if matches.is_present("raw") {
        let bytes = reader.read_raw()?;
        std::io::stdout().write_all(&bytes)?;
        return Ok(());
    }

    let mut records: Vec<_> = reader.read()?.into_iter().collect();
    records.sort();
    for (key, value) in records {
        println!(
            "{} = {}",
            String::from_utf8_lossy(&key),
            String::from_utf8_lossy(&value)
        );
    }
    Ok(())
}
