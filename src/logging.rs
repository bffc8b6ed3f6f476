//! log4rs setup.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::Path;

pub const LOG_CONFIG_FILE: &str = "log4rs.yml";
const CONSOLE_PATTERN: &str = "{d(%H:%M:%S)} {h({l:5})} {m}{n}";

/// Initialise logging from `config_file` when it exists, else log `info`
/// and above to the console.
pub fn init(config_file: &str) -> Result<(), Box<dyn Error>> {
    if Path::new(config_file).exists() {
        log4rs::init_file(config_file, Default::default())?;
        log::debug!("logging configured from {config_file}");
        return Ok(());
    }
    log4rs::init_config(console_config(LevelFilter::Info)?)?;
    log::debug!("{config_file} not found, logging to console");
    Ok(())
}

fn console_config(level: LevelFilter) -> Result<Config, Box<dyn Error>> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;
    Ok(config)
}
