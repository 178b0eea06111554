//! Email service for workflow notifications.
//!
//! Uses `lettre` for SMTP transport. All sends are best-effort from the
//! caller's point of view: a failed notification must never roll back a
//! workflow state transition.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for workflow notifications.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();
        Ok(transport)
    }

    /// Notifies an approver that an expense is waiting on their decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_approval_request(
        &self,
        to_email: &str,
        to_name: &str,
        expense_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<(), EmailError> {
        let subject = "An expense is waiting for your approval - Expenza";
        let body = format!(
            r"Hi {to_name},

An expense of {amount} {currency} (ref {expense_id}) has reached your
approval queue. Please log in to review it.

Best regards,
The Expenza Team"
        );

        self.send_email(to_email, subject, &body).await
    }

    /// Notifies a submitter that their expense reached a terminal state.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_expense_resolved(
        &self,
        to_email: &str,
        to_name: &str,
        expense_id: Uuid,
        approved: bool,
    ) -> Result<(), EmailError> {
        let verdict = if approved { "approved" } else { "rejected" };
        let subject = format!("Your expense has been {verdict} - Expenza");
        let body = format!(
            r"Hi {to_name},

Your expense (ref {expense_id}) has been {verdict}.

Best regards,
The Expenza Team"
        );

        self.send_email(to_email, &subject, &body).await
    }

    /// Sends a generic email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}
