use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use std::fmt::Write;
use std::time;

use crate::dispatch::{AlertSender, SendError};
use crate::domain::alert::AlertEvent;
use crate::domain::forecast::CurrentConditions;
use crate::domain::location::Location;
use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    api_key: Secret<String>,
    unsubscribe_base_url: String,
}

#[derive(serde::Serialize)]
pub struct SendEmailBody {
    personalizations: Vec<SendgridPersonalization>,
    from: SendgridEmail,
    subject: String,
    content: Vec<SendgridContent>,
}

#[derive(serde::Serialize)]
struct SendgridEmail {
    email: String,
}

#[derive(serde::Serialize)]
struct SendgridPersonalization {
    to: Vec<SendgridEmail>,
}

#[derive(serde::Serialize)]
struct SendgridContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        api_key: Secret<String>,
        unsubscribe_base_url: String,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
            unsubscribe_base_url,
        })
    }

    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        text_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/mail/send", self.base_url);
        let body = SendEmailBody {
            from: SendgridEmail {
                email: String::from(self.sender.as_ref()),
            },
            personalizations: vec![SendgridPersonalization {
                to: vec![SendgridEmail {
                    email: String::from(recipient.as_ref()),
                }],
            }],
            subject: String::from(subject),
            content: vec![SendgridContent {
                content_type: String::from("text/plain"),
                value: String::from(text_content),
            }],
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }

    fn unsubscribe_link(&self, recipient: &SubscriberEmail) -> String {
        let base = format!("{}/unsubscribe", self.unsubscribe_base_url);
        match Url::parse_with_params(&base, &[("email", recipient.as_ref())]) {
            Ok(url) => url.to_string(),
            Err(_) => base,
        }
    }
}

/// Plain-text alert body. Writing into a `String` cannot fail, so the `fmt`
/// results are ignored.
fn alert_text(
    location: &Location,
    alerts: &[AlertEvent],
    current: &CurrentConditions,
    unsubscribe_link: &str,
) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "Weather alert for {}", location);
    let _ = writeln!(text);
    let _ = writeln!(text, "Expected in the next hours:");
    for alert in alerts {
        let _ = writeln!(
            text,
            "- [{}] {} ({})",
            alert.severity().as_ref(),
            alert.description(),
            alert.forecast_at().format("%a %d %b %H:%M UTC")
        );
    }
    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "Current conditions: {}°C, {}, humidity {}%, wind {} m/s",
        current.temperature.round(),
        current.description,
        current.humidity,
        current.wind_speed
    );
    let _ = writeln!(text);
    let _ = writeln!(text, "Unsubscribe: {}", unsubscribe_link);

    text
}

#[async_trait]
impl AlertSender for EmailClient {
    #[tracing::instrument(
        name = "Send a weather alert email",
        skip(self, recipient, location, alerts, current),
        fields(
            subscriber_email = %recipient,
            location = %location,
            alerts = alerts.len()
        )
    )]
    async fn send(
        &self,
        recipient: &SubscriberEmail,
        location: &Location,
        alerts: &[AlertEvent],
        current: &CurrentConditions,
    ) -> Result<(), SendError> {
        let subject = format!("Weather Alert for {}", location);
        let text = alert_text(location, alerts, current, &self.unsubscribe_link(recipient));

        self.send_email(recipient, &subject, &text)
            .await
            .map_err(|err| SendError::Rejected(Box::new(err)))
    }
}
