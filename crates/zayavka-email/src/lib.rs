// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP notification adapter.
//!
//! Sends plain-text mail with an optional single binary attachment over an
//! authenticated implicit-TLS submission connection (port 465). The sender
//! address doubles as the SMTP login, matching how mailbox providers
//! issue app passwords.

use std::path::Path;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use zayavka_core::{Mailer, ZayavkaError};

/// Mailer over an authenticated SMTPS relay.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Connect settings for `host:465` with `from_address` as both the
    /// sender and the login name.
    pub fn new(host: &str, from_address: &str, password: &str) -> Result<Self, ZayavkaError> {
        let from: Mailbox = from_address
            .parse()
            .map_err(|e| ZayavkaError::Email(format!("invalid sender address: {e}")))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| ZayavkaError::Email(format!("smtp relay setup failed: {e}")))?
            .credentials(Credentials::new(
                from_address.to_string(),
                password.to_string(),
            ))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<(), ZayavkaError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| ZayavkaError::Email(format!("invalid recipient address: {e}")))?;
        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject);

        let message = match attachment {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| ZayavkaError::Email(format!("attachment unreadable: {e}")))?;
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "attachment".to_string());
                let content_type = ContentType::parse("application/octet-stream")
                    .map_err(|e| ZayavkaError::Email(format!("content type: {e}")))?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(body.to_string()))
                        .singlepart(Attachment::new(filename).body(bytes, content_type)),
                )
            }
            None => builder.body(body.to_string()),
        }
        .map_err(|e| ZayavkaError::Email(format!("message assembly failed: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ZayavkaError::Email(format!("smtp submission failed: {e}")))?;
        debug!(subject, "email submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_a_malformed_sender() {
        let err = SmtpMailer::new("smtp.yandex.ru", "not-an-address", "secret").unwrap_err();
        assert!(matches!(err, ZayavkaError::Email(_)));
    }

    #[test]
    fn construction_accepts_a_plain_mailbox() {
        assert!(SmtpMailer::new("smtp.yandex.ru", "bot@example.com", "secret").is_ok());
    }
}
