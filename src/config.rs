// config.rs

use clap::Parser;

use crate::*;

pub const DEFAULT_THERMAL_FILE: &str = "/sys/devices/virtual/thermal/thermal_zone0/temp";
pub const DEFAULT_HTTP_PORT: u16 = 9550;
pub const DEFAULT_MQTT_BROKER: &str = "localhost";
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_MQTT_TLS_PORT: u16 = 8883;
pub const DEFAULT_MQTT_INTERVAL: u64 = 30;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (commit ", env!("GIT_COMMIT"), ")");

#[derive(Clone, Debug, Parser)]
#[command(version = VERSION, about)]
pub struct Args {
    /// File containing the temperature in millidegrees Celsius
    #[arg(long, env = "PITEMP_THERMAL_FILE", default_value = DEFAULT_THERMAL_FILE)]
    pub thermal_file: PathBuf,

    /// Temperature unit: C, F or K
    #[arg(short, long, env = "PITEMP_UNIT", default_value = "C")]
    pub unit: String,

    /// HTTP port to listen on
    #[arg(long, env = "PITEMP_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Notify MQTT broker
    #[arg(long, env = "PITEMP_MQTT")]
    pub mqtt: bool,

    /// MQTT broker address
    #[arg(long, env = "PITEMP_MQTT_BROKER", default_value = DEFAULT_MQTT_BROKER)]
    pub mqtt_broker: String,

    /// MQTT broker port [default: 1883, or 8883 with --mqtt-tls]
    #[arg(long, env = "PITEMP_MQTT_PORT")]
    pub mqtt_port: Option<u16>,

    /// Connect to the MQTT broker over TLS
    #[arg(long, env = "PITEMP_MQTT_TLS", alias = "mqtt-ssl")]
    pub mqtt_tls: bool,

    /// MQTT client name [default: short hostname]
    #[arg(long, env = "PITEMP_MQTT_CLIENT")]
    pub mqtt_client: Option<String>,

    /// MQTT topic prefix [default: homeassistant/sensor/<client>_temperature]
    #[arg(long, env = "PITEMP_MQTT_TOPIC")]
    pub mqtt_topic: Option<String>,

    /// MQTT notification interval: plain seconds or a duration like 30s, 1m, 500ms
    #[arg(long, env = "PITEMP_MQTT_INTERVAL", default_value = "30s", value_parser = parse_interval)]
    pub mqtt_interval: Duration,

    /// MQTT username
    #[arg(long, env = "PITEMP_MQTT_USERNAME", default_value = "")]
    pub mqtt_username: String,

    /// MQTT password
    #[arg(long, env = "PITEMP_MQTT_PASSWORD", default_value = "", hide_env_values = true)]
    pub mqtt_password: String,
}

#[derive(Clone, Debug)]
pub struct MqttConfig {
    pub enabled: bool,
    pub broker: String,
    pub port: u16,
    pub tls: bool,
    pub client: String,
    pub username: String,
    pub password: String,
    pub topic: String,
    pub interval: Duration,
}

#[derive(Clone, Debug)]
pub struct MyConfig {
    pub thermal_file: PathBuf,
    pub unit: TempUnit,
    pub http_port: u16,
    pub mqtt: MqttConfig,
}

impl MyConfig {
    /// Builds the validated runtime configuration.
    /// `hostname` supplies the default client name and topic.
    pub fn from_args(args: Args, hostname: &str) -> Result<Self, ConfigError> {
        let unit = args.unit.parse::<TempUnit>()?;

        let port = args.mqtt_port.unwrap_or(if args.mqtt_tls {
            DEFAULT_MQTT_TLS_PORT
        } else {
            DEFAULT_MQTT_PORT
        });

        let client = args.mqtt_client.unwrap_or_else(|| hostname.to_string());
        let topic = args.mqtt_topic.unwrap_or_else(|| default_topic(&client));

        let config = MyConfig {
            thermal_file: args.thermal_file,
            unit,
            http_port: args.http_port,
            mqtt: MqttConfig {
                enabled: args.mqtt,
                broker: args.mqtt_broker,
                port,
                tls: args.mqtt_tls,
                client,
                username: args.mqtt_username,
                password: args.mqtt_password,
                topic,
                interval: args.mqtt_interval,
            },
        };
        config.mqtt.validate()?;
        Ok(config)
    }
}

impl MqttConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.broker.is_empty() {
            return Err(ConfigError::MissingBroker);
        }
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.client.is_empty() {
            return Err(ConfigError::MissingClientName);
        }
        if !valid_client_name(&self.client) {
            return Err(ConfigError::InvalidClientName(self.client.clone()));
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if !valid_topic_name(&self.topic) {
            return Err(ConfigError::InvalidTopic(self.topic.clone()));
        }
        Ok(())
    }
}

pub fn parse_interval(s: &str) -> Result<Duration, humantime::DurationError> {
    match s.trim().parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => humantime::parse_duration(s.trim()),
    }
}

pub fn default_topic(client: &str) -> String {
    format!("homeassistant/sensor/{client}_temperature")
}

/// Letters, digits, underscore and hyphen only.
pub fn valid_client_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A topic we may publish to: non-empty, no `+`/`#` wildcards, no NUL.
pub fn valid_topic_name(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(['+', '#', '\0'])
}

/// System hostname up to the first dot.
pub fn short_hostname() -> anyhow::Result<String> {
    let name = hostname::get()?.to_string_lossy().into_owned();
    Ok(name.split('.').next().unwrap_or_default().to_string())
}

#[cfg(test)]
impl MyConfig {
    pub(crate) fn for_test(thermal_file: &Path, unit: TempUnit) -> Self {
        MyConfig {
            thermal_file: thermal_file.to_path_buf(),
            unit,
            http_port: DEFAULT_HTTP_PORT,
            mqtt: MqttConfig {
                enabled: true,
                broker: DEFAULT_MQTT_BROKER.into(),
                port: DEFAULT_MQTT_PORT,
                tls: false,
                client: "pi".into(),
                username: String::new(),
                password: String::new(),
                topic: default_topic("pi"),
                interval: Duration::from_secs(DEFAULT_MQTT_INTERVAL),
            },
        }
    }
}


// EOF
