//! Outbound email: credentials on registration, OTP codes for password
//! reset, and contact-form receipts.
//!
//! SMTP settings come from the environment; when they are absent the
//! server runs without a mailer and call sites log and carry on (mail is
//! best-effort everywhere except OTP delivery, which the reset flow
//! requires).

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Cannot build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub struct Mailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl Mailer {
    /// Build from SMTP_HOST, SMTP_USER, SMTP_PASSWORD. Returns `None`
    /// when any of the three is missing (mail disabled).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        let user = std::env::var("SMTP_USER").ok()?;
        let password = std::env::var("SMTP_PASSWORD").ok()?;

        let from: Mailbox = match user.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(error = %e, "SMTP_USER is not a valid address, mail disabled");
                return None;
            }
        };
        let transport = match SmtpTransport::relay(&host) {
            Ok(builder) => builder.credentials(Credentials::new(user, password)).build(),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot configure SMTP relay, mail disabled");
                return None;
            }
        };
        Some(Self { transport, from })
    }

    fn send_html(&self, to: &str, subject: &str, html: String) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;
        self.transport.send(&message)?;
        tracing::info!(to, subject, "Email sent");
        Ok(())
    }

    /// Login credentials after registration.
    pub fn send_credentials(&self, to: &str, password: &str) -> Result<(), MailError> {
        self.send_html(to, "Your Ayurix Credentials", credentials_body(to, password))
    }

    /// One-time password for the reset flow.
    pub fn send_otp(&self, to: &str, code: &str) -> Result<(), MailError> {
        self.send_html(to, "Your One-Time Password (OTP)", otp_body(code))
    }

    /// Receipt for a contact-form query.
    pub fn send_query_receipt(
        &self,
        to: &str,
        subject: &str,
        query_id: &str,
    ) -> Result<(), MailError> {
        self.send_html(to, "Query Received - Ayurix", query_body(subject, query_id))
    }
}

const FOOTER: &str =
    "<hr style=\"margin: 20px 0;\"><p style=\"font-size: 12px; color: #aaa;\">\
     &copy; 2025 Ayurix. Empowering Prevention Through Prediction.</p>";

fn wrap(inner: &str) -> String {
    format!(
        "<html><body>\
         <div style=\"font-family: Arial, sans-serif; padding: 20px; background-color: #f4f6f9; \
         border-radius: 8px; color: #333;\"><div style=\"text-align: center;\">{inner}{FOOTER}\
         </div></div></body></html>"
    )
}

fn credentials_body(email: &str, password: &str) -> String {
    wrap(&format!(
        "<h2 style=\"color: #0077b6;\">Your Ayurix Credentials</h2>\
         <p>Please find your login credentials below:</p>\
         <p><strong>Username</strong>: {email}<br>\
         <strong>Password</strong>: {password}</p>\
         <p style=\"color: #666;\">Please do not share these credentials with anyone. \
         For security, change your password after first login.</p>\
         <p>Regards,<br><strong>Ayurix Support Team</strong></p>"
    ))
}

fn otp_body(code: &str) -> String {
    wrap(&format!(
        "<h2 style=\"color: #0077b6;\">Your One-Time Password (OTP)</h2>\
         <p>Thank you for using Ayurix. Please use the OTP below to proceed:</p>\
         <p style=\"font-size: 24px; font-weight: bold; color: #0077b6;\">{code}</p>\
         <p style=\"color: #666;\">This OTP is valid for a limited time. \
         Please do not share it with anyone.</p>"
    ))
}

fn query_body(subject: &str, query_id: &str) -> String {
    wrap(&format!(
        "<h2 style=\"color: #0077b6;\">Query Received</h2>\
         <p>We have received your query regarding:</p>\
         <p style=\"font-size: 18px; font-weight: bold; color: #0077b6;\">{subject}</p>\
         <p><strong>Query ID:</strong> {query_id}</p>\
         <p style=\"color: #666;\">Our team is working on it and will get back to you \
         as soon as possible.</p>\
         <p>Regards,<br><strong>Ayurix Support Team</strong></p>"
    ))
}
