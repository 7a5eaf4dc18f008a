use clap::{Arg, Command};
use gamesave::config::read_configuration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let matches = Command::new("Config Check")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Confirm that a gamesave configuration resolves to what you expect it to be")
        .arg(
            Arg::new("config")
                .help("Path to the configuration toml file")
                .long("config")
                .default_value("./gamesave/resources/gamesave.toml"),
        )
        .get_matches();

    // Always present because of the default value
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or_default();

    let configuration = read_configuration(config_path)?;
    println!("---------- gamesave Config ----------\n{configuration:#?}");
    Ok(())
}
