//! Transactional email delivery.
//!
//! Sends go through a JSON HTTP API and are always fire-and-forget: the
//! triggering request (signup, contact submission) must never fail or roll
//! back because an email could not be delivered.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::EmailConfig;
use crate::database::models::NewContact;

#[derive(Clone)]
pub struct Mailer {
    http: Client,
    config: Option<EmailConfig>,
}

#[derive(Debug, Serialize)]
struct OutboundEmail {
    from: String,
    to: String,
    subject: String,
    html: String,
}

impl Mailer {
    pub fn new(config: Option<EmailConfig>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");
        if config.is_none() {
            tracing::warn!("Email delivery not configured, outbound mail is disabled");
        }
        Self { http, config }
    }

    /// Mailer that never sends; used where delivery is irrelevant.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Send the signup verification link for `email`.
    pub fn send_verification(&self, email: &str, token: &str) {
        let Some(config) = &self.config else {
            tracing::debug!("verification email for {email} skipped, mailer disabled");
            return;
        };
        let link = format!(
            "{}/auth/verify-email?token={}",
            config.public_base_url, token
        );
        let message = OutboundEmail {
            from: config.from_address.clone(),
            to: email.to_string(),
            subject: "Verify your email address".to_string(),
            html: format!(
                "<p>Please click the following link to verify your email address: \
                 <a href=\"{link}\">{link}</a></p>"
            ),
        };
        self.dispatch(message, "verification");
    }

    /// Notify the configured inbox about a contact-form submission.
    pub fn send_contact_notification(&self, submission: &NewContact) {
        let Some(config) = &self.config else {
            tracing::debug!("contact notification skipped, mailer disabled");
            return;
        };
        let phone_row = submission
            .phone
            .as_deref()
            .map(|p| format!("<p>Phone: {p}</p>"))
            .unwrap_or_default();
        let message = OutboundEmail {
            from: config.from_address.clone(),
            to: config.contact_notify_to.clone(),
            subject: format!("New contact form submission: {}", submission.subject),
            html: format!(
                "<h2>New Contact Form Submission</h2>\
                 <p>Name: {}</p>\
                 <p>Email: {}</p>\
                 {phone_row}\
                 <div style=\"white-space: pre-wrap;\">{}</div>",
                submission.name, submission.email, submission.message
            ),
        };
        self.dispatch(message, "contact notification");
    }

    /// Spawn the actual send so the caller never waits on delivery, and log
    /// failures instead of propagating them.
    fn dispatch(&self, message: OutboundEmail, kind: &'static str) {
        let Some(config) = &self.config else { return };
        let request = self
            .http
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&message);
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("{kind} email delivered");
                }
                Ok(response) => {
                    tracing::warn!("{kind} email rejected with status {}", response.status());
                }
                Err(e) => {
                    tracing::warn!("{kind} email failed to send: {e}");
                }
            }
        });
    }
}
