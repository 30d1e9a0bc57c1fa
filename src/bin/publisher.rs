use clap::{App, Arg};
use log::{error, info};
use shmcast::{
    AssetSource, LifecycleController, PublisherConfig, Result, SegmentManager, SignalIntents,
};

fn main() {
    let matches = App::new("shmcast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Publishes configured assets into a System V shared memory segment")
        .arg(
            Arg::with_name("conf")
                .short("c")
                .long("conf")
                .value_name("FILE")
                .help("Path to the configuration file")
                .default_value("shmcast.toml")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("print-config")
                .short("C")
                .help("Print the loaded configuration and exit"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging"),
        )
        .arg(
            Arg::with_name("exec")
                .short("x")
                .help("Enable command execution regardless of the config"),
        )
        .arg(
            Arg::with_name("no-exec")
                .short("X")
                .help("Disable command execution regardless of the config"),
        )
        .arg(
            Arg::with_name("ignore-missing")
                .short("I")
                .long("ignore-missing-files")
                .help("Skip unreadable files instead of aborting"),
        )
        .get_matches();

    let default_level = if matches.is_present("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let config_path = matches.value_of("conf").unwrap();
    let mut config = PublisherConfig::load(config_path)?;

    if matches.is_present("exec") {
        config.settings.exec_enabled = true;
    }
    if matches.is_present("no-exec") {
        config.settings.exec_enabled = false;
    }
    if matches.is_present("ignore-missing") {
        config.settings.ignore_missing = true;
    }

    if matches.is_present("print-config") {
        println!("Configuration loaded from `{}`:", config_path);
        println!("{:#?}", config);
        return Ok(());
    }

    let key = config.segment_key()?;
    info!(
        "publishing under segment key {} (strategy: {})",
        key, config.settings.strategy
    );

    let source = AssetSource::from_config(&config);
    let mut intents = SignalIntents::install()?;
    let mut controller =
        LifecycleController::new(SegmentManager::new(), key, config.settings.strategy, source)
            .with_poll_interval(config.poll_interval());

    controller.run(&mut intents)
}
