use crate::{LogRootSettings, LoggerError};
use config_rs::{Config, File};

/// Reads the [`LogRootSettings`] from a TOML file.
///
/// Example of a valid file:
/// ```toml
/// use_terminal = true
/// use_file = true
/// verbosity_terminal = 3
/// verbosity_file = 4
/// file_path = "/var/log/zommon/app.log"
///
/// # Optional, these are the default values
/// [rotation]
/// max_size_kb = 1048576
/// max_backups = 5
/// max_age_days = 28
/// compress = true
/// ```
pub fn load_settings(config_file_path: &str) -> Result<LogRootSettings, LoggerError> {
    let mut config = Config::new();
    config.merge(File::with_name(config_file_path)).map_err(|err| {
        LoggerError::LoggerConfigurationError {
            message: format!(
                "Cannot read the logger configuration file [{}]. err: {:?}",
                config_file_path, err
            ),
        }
    })?;
    config.try_into().map_err(|err| LoggerError::LoggerConfigurationError {
        message: format!(
            "Cannot parse the logger configuration file [{}]. err: {:?}",
            config_file_path, err
        ),
    })
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::{RotationPolicy, Verbosity};

    #[test]
    fn should_read_configuration_from_file() {
        // Act
        let settings = load_settings("./test_resources/logger.toml").unwrap();

        // Assert
        assert_eq!(
            LogRootSettings::new(true, true, Verbosity::Info, Verbosity::Debug, "/tmp/zommon/app.log"),
            settings
        );
        assert_eq!(RotationPolicy::default(), settings.rotation);
    }

    #[test]
    fn should_read_the_rotation_policy_from_file() {
        // Act
        let settings = load_settings("./test_resources/logger_with_rotation.toml").unwrap();

        // Assert
        assert!(!settings.use_terminal);
        assert_eq!(Verbosity::Crit, settings.verbosity_terminal);
        assert_eq!(Verbosity::Trace, settings.verbosity_file);
        assert_eq!(
            RotationPolicy { max_size_kb: 10240, max_backups: 2, max_age_days: 28, compress: false },
            settings.rotation
        );
    }

    #[test]
    fn should_fail_if_the_verbosity_is_unknown() {
        assert!(load_settings("./test_resources/logger_wrong_verbosity.toml").is_err());
    }

    #[test]
    fn should_fail_if_the_file_does_not_exist() {
        assert!(load_settings("./test_resources/non-existing.toml").is_err());
    }
}
