// error.rs

use std::{io, num::ParseIntError, path::PathBuf};

use rumqttc::{ClientError, Request};
use thiserror::Error;

/// Rejected command line configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid temperature unit {0:?}")]
    InvalidUnit(String),

    #[error("MQTT broker must be specified")]
    MissingBroker,

    #[error("MQTT broker port must not be 0")]
    ZeroPort,

    #[error("MQTT client name must be specified")]
    MissingClientName,

    #[error("{0:?} is an invalid MQTT client name; only letters, digits, '_' and '-' are allowed")]
    InvalidClientName(String),

    #[error("MQTT interval must not be 0")]
    ZeroInterval,

    #[error("{0:?} is an invalid MQTT topic prefix; wildcards and NUL are not allowed")]
    InvalidTopic(String),
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("error reading thermal file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error obtaining temperature from the thermal file {path:?} (content {content:?}): {source}")]
    Parse {
        path: PathBuf,
        content: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not read temperature: {0}")]
    Sensor(#[from] SensorError),

    #[error("could not generate JSON response: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker or client refused this one message; the next cycle tries again.
    #[error("publish rejected: {0}")]
    Rejected(String),

    /// The client lost its event loop and can never publish again.
    #[error("MQTT client is closed")]
    Closed,
}

/// The client hands back the request it could not queue. A publish to a topic
/// the client refuses, or a full queue, only loses this message. Anything else
/// means the event loop hung up.
impl From<rumqttc::ClientError> for PublishError {
    fn from(e: rumqttc::ClientError) -> Self {
        match e {
            ClientError::Request(Request::Publish(p)) if !crate::valid_topic_name(&p.topic) => {
                PublishError::Rejected(format!("invalid topic {:?}", p.topic))
            }
            ClientError::TryRequest(_) => PublishError::Rejected("request queue full".into()),
            ClientError::Request(_) => PublishError::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::{Publish, QoS};

    use super::*;

    fn publish(topic: &str) -> Request {
        Request::Publish(Publish::new(topic, QoS::AtMostOnce, vec![]))
    }

    #[test]
    fn bad_topic_only_rejects_the_message() {
        let e = PublishError::from(ClientError::Request(publish("home/+/pi/config")));
        assert!(matches!(e, PublishError::Rejected(ref m) if m.contains("home/+/pi/config")));

        let e = PublishError::from(ClientError::Request(publish("home/#")));
        assert!(matches!(e, PublishError::Rejected(_)));
    }

    #[test]
    fn full_queue_only_rejects_the_message() {
        let e = PublishError::from(ClientError::TryRequest(publish("home/pi/state")));
        assert!(matches!(e, PublishError::Rejected(_)));
    }

    #[test]
    fn hung_up_event_loop_is_closed() {
        let e = PublishError::from(ClientError::Request(publish("home/pi/state")));
        assert!(matches!(e, PublishError::Closed));
    }
}

// EOF
