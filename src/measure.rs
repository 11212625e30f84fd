// measure.rs

use std::{fmt, fs, str::FromStr};

use crate::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TempUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TempUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TempUnit::Celsius => "C",
            TempUnit::Fahrenheit => "F",
            TempUnit::Kelvin => "K",
        }
    }

    /// Kelvin is written without a degree sign.
    pub fn prefix(self) -> &'static str {
        match self {
            TempUnit::Celsius | TempUnit::Fahrenheit => "°",
            TempUnit::Kelvin => "",
        }
    }

    pub fn label(self) -> String {
        format!("{}{}", self.prefix(), self.symbol())
    }

    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            TempUnit::Celsius => celsius,
            TempUnit::Fahrenheit => fahrenheit(celsius),
            TempUnit::Kelvin => kelvin(celsius),
        }
    }
}

impl FromStr for TempUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "C" => Ok(TempUnit::Celsius),
            "f" | "F" => Ok(TempUnit::Fahrenheit),
            "k" | "K" => Ok(TempUnit::Kelvin),
            _ => Err(ConfigError::InvalidUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TempUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

pub fn fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

// Integer offset, not 273.15. Existing consumers expect this value.
pub fn kelvin(celsius: f64) -> f64 {
    celsius + 273.0
}

/// Raw sensor value in millidegrees Celsius.
pub fn read_millidegrees(path: &Path) -> Result<i64, SensorError> {
    let content = fs::read_to_string(path).map_err(|source| SensorError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    content
        .trim()
        .parse::<i64>()
        .map_err(|source| SensorError::Parse {
            path: path.to_path_buf(),
            content: content.clone(),
            source,
        })
}

/// Current temperature from the configured thermal file, in the configured unit.
pub fn read_temperature(config: &MyConfig) -> Result<f64, SensorError> {
    let milli = read_millidegrees(&config.thermal_file)?;
    Ok(config.unit.convert(milli as f64 / 1000.0))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn sensor_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn celsius_is_millidegrees_over_1000() {
        for milli in [0_i64, 1, -1, 23456, -40000, 105_000, 999_999] {
            let f = sensor_file(&milli.to_string());
            let t = read_temperature(&MyConfig::for_test(f.path(), TempUnit::Celsius)).unwrap();
            assert_eq!(t, milli as f64 / 1000.0);
        }
    }

    #[test]
    fn whitespace_is_trimmed() {
        let f = sensor_file("  23456\n");
        assert_eq!(read_millidegrees(f.path()).unwrap(), 23456);
        let t = read_temperature(&MyConfig::for_test(f.path(), TempUnit::Celsius)).unwrap();
        assert_eq!(t, 23.456);
    }

    #[test]
    fn fahrenheit_of_zero_is_32() {
        let f = sensor_file("0");
        let t = read_temperature(&MyConfig::for_test(f.path(), TempUnit::Fahrenheit)).unwrap();
        assert_eq!(t, 32.0);
    }

    #[test]
    fn conversions() {
        assert_eq!(fahrenheit(100.0), 212.0);
        assert_eq!(fahrenheit(-40.0), -40.0);
        assert_eq!(kelvin(0.0), 273.0);
        assert_eq!(kelvin(25.5), 298.5);
        assert_eq!(TempUnit::Kelvin.convert(-273.0), 0.0);
    }

    #[test]
    fn unit_labels() {
        assert_eq!(TempUnit::Celsius.label(), "°C");
        assert_eq!(TempUnit::Fahrenheit.label(), "°F");
        assert_eq!(TempUnit::Kelvin.label(), "K");
        assert_eq!(TempUnit::Kelvin.to_string(), "K");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        for content in ["", "\n", "abc", "23.5", "12 34", "0x10"] {
            let f = sensor_file(content);
            match read_millidegrees(f.path()) {
                Err(SensorError::Parse { content: c, .. }) => assert_eq!(c, content),
                other => panic!("expected parse error for {content:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        match read_millidegrees(&path) {
            Err(e @ SensorError::Read { .. }) => assert!(e.to_string().contains("nope")),
            other => panic!("expected read error, got {other:?}"),
        }
    }
}

// EOF
