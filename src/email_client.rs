use serde::Serialize;

use crate::error::{EmailError, ValidationError};
use crate::validators::is_valid_email;

/// Client for the outbound email delivery service. The only mail this
/// service sends is the password recovery code.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
}

/// A sender address that has passed email validation.
#[derive(Clone)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: String) -> Result<Self, ValidationError> {
        let email = is_valid_email(&s)?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    subject: String,
    html: String,
}

impl EmailClient {
    pub fn new(base_url: String, sender: SenderEmail, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }

    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner().to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html: html_content.to_string(),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach email service: {}", e);
                EmailError::ServiceUnavailable(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Email service returned error: {}", e);
                EmailError::SendFailed(e.to_string())
            })?;

        Ok(())
    }

    /// Deliver a password recovery code to the account's email address.
    pub async fn send_recovery_code(&self, recipient: &str, code: &str) -> Result<(), EmailError> {
        let html = format!(
            "<p>Your password recovery code is <strong>{}</strong>.</p>\
             <p>The code expires in 15 minutes. If you did not request a \
             password reset, you can ignore this message.</p>",
            code
        );

        self.send_email(recipient, "Password recovery code", &html)
            .await
    }
}
