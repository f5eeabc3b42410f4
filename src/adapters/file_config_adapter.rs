//! INI file configuration adapter.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TraderError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TraderError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[engine]
symbol = ETHUSDT
initial_balance = 1000.0

[risk]
margin_type = isolated
leverage = 5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("engine", "symbol"),
            Some("ETHUSDT".to_string())
        );
        assert_eq!(
            adapter.get_string("risk", "margin_type"),
            Some("isolated".to_string())
        );
        assert_eq!(adapter.get_int("risk", "leverage", 1).unwrap(), 5);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[engine]\nsymbol = X\n").unwrap();
        assert_eq!(adapter.get_string("engine", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_reads_value_or_default() {
        let adapter = FileConfigAdapter::from_string("[indicator]\nperiod = 21\n").unwrap();
        assert_eq!(adapter.get_int("indicator", "period", 14).unwrap(), 21);
        assert_eq!(adapter.get_int("indicator", "missing", 42).unwrap(), 42);
    }

    #[test]
    fn malformed_int_is_invalid() {
        let adapter = FileConfigAdapter::from_string("[indicator]\nperiod = 1x4\n").unwrap();
        assert!(matches!(
            adapter.get_int("indicator", "period", 14),
            Err(TraderError::ConfigInvalid { ref key, .. }) if key == "period"
        ));
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string("[exit]\nbig_profit_pct = 3.5\n").unwrap();
        assert_eq!(adapter.get_double("exit", "big_profit_pct", 0.0).unwrap(), 3.5);
        assert_eq!(adapter.get_double("exit", "missing", 99.9).unwrap(), 99.9);
    }

    #[test]
    fn malformed_double_is_invalid() {
        let adapter = FileConfigAdapter::from_string("[exit]\nmin_profit_pct = x\n").unwrap();
        assert!(matches!(
            adapter.get_double("exit", "min_profit_pct", 0.75),
            Err(TraderError::ConfigInvalid { ref key, .. }) if key == "min_profit_pct"
        ));
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[entry]\na = true\nb = yes\nc = 1\nd = off\ne = no\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("entry", "a", false).unwrap());
        assert!(adapter.get_bool("entry", "b", false).unwrap());
        assert!(adapter.get_bool("entry", "c", false).unwrap());
        assert!(!adapter.get_bool("entry", "d", true).unwrap());
        assert!(!adapter.get_bool("entry", "e", true).unwrap());
        assert!(adapter.get_bool("entry", "f", true).is_err());
        assert!(!adapter.get_bool("entry", "missing", false).unwrap());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[paper]\ncommission_pct = 0.04\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_double("paper", "commission_pct", 0.0).unwrap(), 0.04);
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TraderError::ConfigParse { .. })));
    }
}
