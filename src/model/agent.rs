use super::RtmlUrl;
use crate::errors::RtmlError;
use serde::Serialize;

/// The software agent that submitted the document and expects replies.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IntelligentAgent {
    pub hostname: Option<String>,
    port: Option<u16>,
    /// Opaque request token echoed back in replies.
    pub id: Option<String>,
    pub uri: Option<RtmlUrl>,
}

impl IntelligentAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), RtmlError> {
        if port == 0 {
            return Err(RtmlError::value(
                "model::IntelligentAgent",
                "port",
                port.to_string(),
            ));
        }
        self.port = Some(port);
        Ok(())
    }

    /// Parses and validates a port number.
    pub fn set_port_str(&mut self, port: &str) -> Result<(), RtmlError> {
        let parsed = port.trim().parse::<u16>().map_err(|e| {
            RtmlError::value_caused_by("model::IntelligentAgent", "port", port, e)
        })?;
        self.set_port(parsed)
    }

    /// The agent endpoint: its URI when set, otherwise `http://host:port/`.
    pub fn respond_to(&self) -> Option<String> {
        if let Some(uri) = &self.uri {
            return Some(uri.to_string());
        }
        match (&self.hostname, self.port) {
            (Some(host), Some(port)) => Some(format!("http://{}:{}/", host, port)),
            (Some(host), None) => Some(format!("http://{}/", host)),
            _ => None,
        }
    }
}
