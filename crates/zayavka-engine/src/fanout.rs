// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification fan-out.
//!
//! Protocol handlers append commands to a bounded queue and return
//! immediately; a single worker task drains the queue and talks to the chat
//! transport and the mailer. Delivery failures are logged, never retried,
//! and never propagate back into the protocol step that queued them.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zayavka_core::{
    ChatId, ChatTransport, Keyboard, Mailer, MediaKind, MessageBody, OutboundMessage, TicketId,
};

const QUEUE_DEPTH: usize = 256;

/// One queued delivery.
#[derive(Debug, Clone)]
pub enum FanoutCommand {
    /// Notify a staff member about a freshly created ticket. Carries the
    /// rendered summary and, when the ticket has an attachment, the
    /// promoted media file to show alongside it.
    StaffNotice {
        chat_id: ChatId,
        ticket_id: TicketId,
        summary: String,
        media: Option<(MediaKind, PathBuf)>,
    },
    /// Best-effort email copy of a resolution reply.
    Email {
        to: String,
        subject: String,
        body: String,
        attachment: Option<PathBuf>,
    },
}

/// Cheap cloneable producer side of the fan-out queue.
#[derive(Debug, Clone)]
pub struct FanoutHandle {
    tx: mpsc::Sender<FanoutCommand>,
}

impl FanoutHandle {
    /// Queue a command without blocking. A full or closed queue drops the
    /// command with a warning; fan-out is best-effort by contract.
    pub fn enqueue(&self, cmd: FanoutCommand) {
        if let Err(e) = self.tx.try_send(cmd) {
            warn!(error = %e, "fan-out queue rejected command");
        }
    }
}

/// Spawn the fan-out worker. `mailer` is `None` when email notifications
/// are not configured; queued email commands are then dropped with a log.
pub fn spawn_fanout(
    transport: Arc<dyn ChatTransport>,
    mailer: Option<Arc<dyn Mailer>>,
) -> (FanoutHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(QUEUE_DEPTH);
    let handle = tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            deliver(cmd, transport.as_ref(), mailer.as_deref()).await;
        }
        debug!("fan-out queue closed, worker exiting");
    });
    (FanoutHandle { tx }, handle)
}

async fn deliver(cmd: FanoutCommand, transport: &dyn ChatTransport, mailer: Option<&dyn Mailer>) {
    match cmd {
        FanoutCommand::StaffNotice {
            chat_id,
            ticket_id,
            summary,
            media,
        } => {
            let body = match media {
                Some((MediaKind::Photo, path)) => MessageBody::Photo {
                    path,
                    caption: summary,
                },
                Some((MediaKind::Video, path)) => MessageBody::Video {
                    path,
                    caption: summary,
                },
                None => MessageBody::Text(summary),
            };
            let msg = OutboundMessage {
                chat_id,
                body,
                keyboard: Some(Keyboard::Answer(ticket_id)),
            };
            match transport.send(msg).await {
                Ok(()) => info!(%chat_id, %ticket_id, "staff notified"),
                Err(e) => warn!(%chat_id, %ticket_id, error = %e, "staff notification failed"),
            }
        }
        FanoutCommand::Email {
            to,
            subject,
            body,
            attachment,
        } => match mailer {
            Some(mailer) => {
                match mailer.send(&to, &subject, &body, attachment.as_deref()).await {
                    Ok(()) => info!(to, "email notification sent"),
                    Err(e) => warn!(to, error = %e, "email notification failed"),
                }
            }
            None => debug!(to, "email notifications disabled, command dropped"),
        },
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use zayavka_core::ZayavkaError;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send(&self, msg: OutboundMessage) -> Result<(), ZayavkaError> {
            self.sent.lock().await.push(msg);
            Ok(())
        }

        async fn stage_file(
            &self,
            _file_id: &str,
            _staging_dir: &std::path::Path,
        ) -> Result<PathBuf, ZayavkaError> {
            unreachable!("fan-out never stages files")
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(
            &self,
            to: &str,
            subject: &str,
            _body: &str,
            _attachment: Option<&std::path::Path>,
        ) -> Result<(), ZayavkaError> {
            self.sent.lock().await.push((to.into(), subject.into()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn staff_notice_carries_answer_button() {
        let transport = Arc::new(RecordingTransport::default());
        let (handle, worker) = spawn_fanout(transport.clone(), None);

        handle.enqueue(FanoutCommand::StaffNotice {
            chat_id: ChatId(10),
            ticket_id: TicketId(3),
            summary: "Новая заявка".into(),
            media: None,
        });
        drop(handle);
        worker.await.unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, ChatId(10));
        assert_eq!(sent[0].keyboard, Some(Keyboard::Answer(TicketId(3))));
    }

    #[tokio::test]
    async fn email_goes_through_the_mailer() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = Arc::new(RecordingMailer::default());
        let (handle, worker) = spawn_fanout(transport, Some(mailer.clone()));

        handle.enqueue(FanoutCommand::Email {
            to: "user@example.com".into(),
            subject: "Ответ по заявке №3".into(),
            body: "Готово".into(),
            attachment: None,
        });
        drop(handle);
        worker.await.unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            &[("user@example.com".to_string(), "Ответ по заявке №3".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_mailer_drops_email_without_panicking() {
        let transport = Arc::new(RecordingTransport::default());
        let (handle, worker) = spawn_fanout(transport.clone(), None);
        handle.enqueue(FanoutCommand::Email {
            to: "user@example.com".into(),
            subject: "s".into(),
            body: "b".into(),
            attachment: None,
        });
        drop(handle);
        worker.await.unwrap();
        assert!(transport.sent.lock().await.is_empty());
    }
}
