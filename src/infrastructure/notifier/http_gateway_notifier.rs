use async_trait::async_trait;
use serde::Serialize;

use crate::domain::entities::task::NotificationChannel;
use crate::domain::notifier::{Notifier, NotifyError};

#[derive(Serialize)]
struct OutboundMessage<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Notifier that hands rendered messages to external delivery gateways over
/// HTTP. The gateways own SMTP / WhatsApp; this process only posts JSON and
/// checks the response status.
pub struct HttpGatewayNotifier {
    client: reqwest::Client,
    email_url: Option<String>,
    whatsapp_url: Option<String>,
}

impl HttpGatewayNotifier {
    pub fn new(email_url: Option<String>, whatsapp_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            email_url,
            whatsapp_url,
        }
    }

    fn url_for(&self, channel: NotificationChannel) -> Result<&str, NotifyError> {
        let url = match channel {
            NotificationChannel::Email => self.email_url.as_deref(),
            NotificationChannel::WhatsApp => self.whatsapp_url.as_deref(),
        };
        url.ok_or_else(|| NotifyError::Send(format!("No gateway configured for {}", channel)))
    }
}

#[async_trait]
impl Notifier for HttpGatewayNotifier {
    async fn send(
        &self,
        channel: NotificationChannel,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let url = self.url_for(channel)?;

        let response = self
            .client
            .post(url)
            .json(&OutboundMessage {
                to: address,
                subject,
                body,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Send(format!(
                "Gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
