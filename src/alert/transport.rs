//! Alert delivery transports.
//!
//! Transports are best-effort side channels: a failed delivery is logged and
//! forgotten, never retried, and never surfaced to the perception loop.
//! Network delivery (HTTP SMS gateway) is feature-gated; without it the
//! daemon falls back to the console banner transport.

use anyhow::Result;

use crate::alert::AlertEvent;

/// Sends a human-facing alert somewhere external (SMS, console banner).
pub trait AlertTransport: Send {
    fn name(&self) -> &'static str;

    fn send_alert(&mut self, event: &AlertEvent) -> Result<()>;
}

/// Plays an audible alarm. Fire-and-forget.
pub trait SoundTransport: Send {
    fn name(&self) -> &'static str;

    fn play_alarm(&mut self) -> Result<()>;
}

/// Human-readable alert body shared by transports.
pub fn format_alert_message(event: &AlertEvent) -> String {
    format!(
        "ALERT! Wild animal intrusion detected.\n\
         Animal: {}\n\
         Confidence: {:.2}\n\
         Time: {} (epoch s)\n\
         Episode: #{}\n\
         Please take immediate action.",
        event.label, event.confidence, event.at, event.sequence
    )
}

/// Console banner transport: the default when no SMS gateway is configured.
pub struct LogAlertTransport;

impl AlertTransport for LogAlertTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send_alert(&mut self, event: &AlertEvent) -> Result<()> {
        log::warn!(
            "intrusion alert ({}): {}",
            event.reason.as_str(),
            format_alert_message(event).replace('\n', " | ")
        );
        Ok(())
    }
}

/// Stands in for a transport whose credentials are missing: warns once,
/// then swallows every delivery. Alerting is a side channel, never a
/// precondition for perception.
pub struct NoopAlertTransport {
    reason: String,
    warned: bool,
}

impl NoopAlertTransport {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            warned: false,
        }
    }
}

impl AlertTransport for NoopAlertTransport {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn send_alert(&mut self, _event: &AlertEvent) -> Result<()> {
        if !self.warned {
            log::warn!("alert transport disabled: {}", self.reason);
            self.warned = true;
        }
        Ok(())
    }
}

/// Alarm "playback" via the log. Real speaker output is an external
/// collaborator; deployments wire their own `SoundTransport`.
pub struct LogSoundTransport;

impl SoundTransport for LogSoundTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    fn play_alarm(&mut self) -> Result<()> {
        log::warn!("alarm sounding");
        Ok(())
    }
}

#[cfg(feature = "alert-http")]
pub use http::HttpSmsTransport;

#[cfg(feature = "alert-http")]
mod http {
    use std::time::Duration;

    use anyhow::{anyhow, Result};

    use super::{format_alert_message, AlertTransport};
    use crate::alert::AlertEvent;

    const SMS_GATEWAY_ENV: &str = "FIELDWATCH_SMS_GATEWAY";
    const SMS_FROM_ENV: &str = "FIELDWATCH_SMS_FROM";

    /// SMS delivery through an HTTP gateway (Twilio-style form POST).
    pub struct HttpSmsTransport {
        agent: ureq::Agent,
        gateway_url: String,
        from: String,
        to: String,
    }

    impl HttpSmsTransport {
        pub fn new(gateway_url: String, from: String, to: String) -> Self {
            // Short timeouts: a slow gateway must not pin the worker thread
            // for longer than a couple of ticks' worth of queue slack.
            let agent = ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(2))
                .timeout(Duration::from_secs(5))
                .build();
            Self {
                agent,
                gateway_url,
                from,
                to,
            }
        }

        /// Build from environment credentials. Returns None (not an error)
        /// when the gateway is not configured, so callers can degrade to the
        /// warn-once noop transport.
        pub fn from_env(destination: &str) -> Result<Option<Self>> {
            let gateway = match std::env::var(SMS_GATEWAY_ENV) {
                Ok(url) if !url.trim().is_empty() => url,
                _ => return Ok(None),
            };
            let from = std::env::var(SMS_FROM_ENV)
                .map_err(|_| anyhow!("{} is set but {} is missing", SMS_GATEWAY_ENV, SMS_FROM_ENV))?;
            Ok(Some(Self::new(gateway, from, destination.to_string())))
        }
    }

    impl AlertTransport for HttpSmsTransport {
        fn name(&self) -> &'static str {
            "http-sms"
        }

        fn send_alert(&mut self, event: &AlertEvent) -> Result<()> {
            let body = format_alert_message(event);
            let response = self
                .agent
                .post(&self.gateway_url)
                .send_form(&[
                    ("From", self.from.as_str()),
                    ("To", self.to.as_str()),
                    ("Body", body.as_str()),
                ])
                .map_err(|e| anyhow!("sms gateway request failed: {}", e))?;
            if response.status() >= 300 {
                return Err(anyhow!("sms gateway returned status {}", response.status()));
            }
            log::info!("sms alert sent to {} ({})", self.to, event.label);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::TransitionReason;

    #[test]
    fn message_carries_label_confidence_and_sequence() {
        let event = AlertEvent {
            reason: TransitionReason::EpisodeStart,
            label: "tiger".to_string(),
            confidence: 0.87,
            sequence: 3,
            at: 1_700_000_000,
        };
        let body = format_alert_message(&event);
        assert!(body.contains("tiger"));
        assert!(body.contains("0.87"));
        assert!(body.contains("#3"));
    }

    #[test]
    fn noop_transport_never_fails() {
        let mut transport = NoopAlertTransport::new("no credentials");
        let event = AlertEvent {
            reason: TransitionReason::EpisodeStart,
            label: "deer".to_string(),
            confidence: 0.5,
            sequence: 1,
            at: 0,
        };
        assert!(transport.send_alert(&event).is_ok());
        assert!(transport.send_alert(&event).is_ok());
    }
}
