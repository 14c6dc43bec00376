use crate::formula::errors::FormulaError;
use chrono::Local;
use simplelog::*;
use std::fs::File;

/// Maps a level name from the settings file onto a filter.
pub fn level_filter(level: &str) -> Result<LevelFilter, FormulaError> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" => Ok(LevelFilter::Off),
        other => Err(FormulaError::Config(format!(
            "loglevel must be debug, info, warn, error or off, got '{}'",
            other
        ))),
    }
}

/// Terminal logger, plus a `log_<date>_<time>.txt` file logger when `log_to_file` is set.
/// Returns false when a logger was already installed (it stays in place).
pub fn init_logger(level: &str, log_to_file: bool) -> Result<bool, FormulaError> {
    let log_option = level_filter(level)?;
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if log_to_file {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let name = format!("log_{}.txt", date_and_time);
        let file = File::create(&name)
            .map_err(|e| FormulaError::Config(format!("cannot create {}: {}", name, e)))?;
        loggers.push(WriteLogger::new(log_option, Config::default(), file));
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            log::info!("logging started with level {}", log_option);
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(level_filter("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(level_filter("WARN").unwrap(), LevelFilter::Warn);
        assert_eq!(level_filter("off").unwrap(), LevelFilter::Off);
        assert!(matches!(
            level_filter("verbose"),
            Err(FormulaError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_level_does_not_install_a_logger() {
        assert!(init_logger("loud", false).is_err());
    }
}
