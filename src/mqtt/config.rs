use rumqttc::QoS;
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_PORT: u16 = 1883;

/// Broker address and credentials.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttServer {
    /// Broker address, `host` or `host:port`
    pub url: String,
    pub user: String,
    pub pw: String,
}

impl fmt::Display for MqttServer {
    /// Shown as "user@url"; the password is never printed.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MqttConfigError {
    #[error("Broker address is empty")]
    MissingHost,

    #[error("Invalid broker port in '{0}'")]
    InvalidPort(String),

    #[error("QoS must be 0, 1 or 2, got {0}")]
    InvalidQos(u8),
}

impl MqttServer {
    /// Splits `url` into host and port, defaulting to port 1883.
    pub fn host_and_port(&self) -> Result<(String, u16), MqttConfigError> {
        let url = self.url.trim();
        let (host, port) = match url.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| MqttConfigError::InvalidPort(url.to_string()))?;
                (host, port)
            }
            None => (url, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(MqttConfigError::MissingHost);
        }
        Ok((host.to_string(), port))
    }
}

/// Everything needed to open the broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub qos: u8,
    /// Capacity of the request queue between client handle and event loop
    pub channel_capacity: usize,
    pub server: MqttServer,
}

impl Default for MqttConfig {
    fn default() -> Self {
        MqttConfig {
            client_id: "SmartbikeConsole".to_string(),
            keep_alive_secs: 5,
            qos: 0,
            channel_capacity: 100,
            server: MqttServer::default(),
        }
    }
}

impl MqttConfig {
    pub fn qos(&self) -> Result<QoS, MqttConfigError> {
        match self.qos {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(MqttConfigError::InvalidQos(other)),
        }
    }

    pub fn validate(&self) -> Result<(), MqttConfigError> {
        self.server.host_and_port()?;
        self.qos()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(url: &str) -> MqttServer {
        MqttServer {
            url: url.to_string(),
            user: "rider".to_string(),
            pw: "secret".to_string(),
        }
    }

    #[test]
    fn test_host_and_port() {
        assert_eq!(
            server("broker.local:8883").host_and_port(),
            Ok(("broker.local".to_string(), 8883))
        );
        assert_eq!(
            server("broker.local").host_and_port(),
            Ok(("broker.local".to_string(), 1883))
        );
        assert_eq!(
            server("broker.local:abc").host_and_port(),
            Err(MqttConfigError::InvalidPort("broker.local:abc".to_string()))
        );
        assert_eq!(server("").host_and_port(), Err(MqttConfigError::MissingHost));
        assert_eq!(server(":1883").host_and_port(), Err(MqttConfigError::MissingHost));
    }

    #[test]
    fn test_display_hides_password() {
        let shown = server("broker.local").to_string();
        assert_eq!(shown, "rider@broker.local");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_qos() {
        let mut config = MqttConfig::default();
        assert_eq!(config.qos(), Ok(QoS::AtMostOnce));
        config.qos = 2;
        assert_eq!(config.qos(), Ok(QoS::ExactlyOnce));
        config.qos = 3;
        assert_eq!(config.qos(), Err(MqttConfigError::InvalidQos(3)));
    }
}
