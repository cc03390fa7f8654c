// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport adapter for the Zayavka bot.
//!
//! Long-polls the Bot API via teloxide, maps messages and inline button
//! presses into [`InboundEvent`]s on an internal queue, and implements
//! [`ChatTransport`] for outbound delivery (HTML text, photos, videos,
//! reply keyboards) and staged file downloads.

pub mod handler;
pub mod keyboards;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use teloxide::dptree;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, ParseMode, Recipient};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zayavka_core::{ChatTransport, InboundEvent, MessageBody, OutboundMessage, ZayavkaError};

/// Telegram channel: inbound long polling plus the outbound transport.
pub struct TelegramChannel {
    bot: Bot,
    download_timeout: Duration,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    pub fn new(token: &str, download_timeout: Duration) -> Result<Self, ZayavkaError> {
        if token.is_empty() {
            return Err(ZayavkaError::Config("bot.token cannot be empty".into()));
        }
        let (inbound_tx, inbound_rx) = mpsc::channel(100);
        Ok(Self {
            bot: Bot::new(token),
            download_timeout,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Start the long-polling dispatcher. Idempotent.
    pub fn connect(&mut self) {
        if self.polling_handle.is_some() {
            return;
        }

        let bot = self.bot.clone();
        let msg_tx = self.inbound_tx.clone();
        let cb_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");
        let handle = tokio::spawn(async move {
            let messages = Update::filter_message().endpoint(move |msg: Message| {
                let tx = msg_tx.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }
                    if let Some(event) = handler::map_message(&msg) {
                        if tx.send(event).await.is_err() {
                            warn!("inbound queue closed, dropping message");
                        }
                    }
                    respond(())
                }
            });

            let callbacks =
                Update::filter_callback_query().endpoint(move |bot: Bot, query: CallbackQuery| {
                    let tx = cb_tx.clone();
                    async move {
                        // Stop the button spinner regardless of outcome.
                        if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                            debug!(error = %e, "answer_callback_query failed");
                        }
                        if let Some(event) = handler::map_callback(&query) {
                            if tx.send(event).await.is_err() {
                                warn!("inbound queue closed, dropping callback");
                            }
                        }
                        respond(())
                    }
                });

            let tree = dptree::entry().branch(messages).branch(callbacks);
            Dispatcher::builder(bot, tree)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });
        self.polling_handle = Some(handle);
    }

    /// Next inbound event. Errors only when the polling task is gone.
    pub async fn receive(&self) -> Result<InboundEvent, ZayavkaError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| ZayavkaError::transport("Telegram inbound queue closed"))
    }
}

fn send_err(e: teloxide::RequestError) -> ZayavkaError {
    ZayavkaError::Transport {
        message: format!("telegram send failed: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl ChatTransport for TelegramChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<(), ZayavkaError> {
        let recipient = Recipient::Id(ChatId(msg.chat_id.0));
        let markup = msg.keyboard.as_ref().map(keyboards::render);

        match msg.body {
            MessageBody::Text(text) => {
                let request = self
                    .bot
                    .send_message(recipient, text)
                    .parse_mode(ParseMode::Html);
                match markup {
                    Some(markup) => request.reply_markup(markup).await.map_err(send_err)?,
                    None => request.await.map_err(send_err)?,
                };
            }
            MessageBody::Photo { path, caption } => {
                let request = self
                    .bot
                    .send_photo(recipient, InputFile::file(path))
                    .caption(caption)
                    .parse_mode(ParseMode::Html);
                match markup {
                    Some(markup) => request.reply_markup(markup).await.map_err(send_err)?,
                    None => request.await.map_err(send_err)?,
                };
            }
            MessageBody::Video { path, caption } => {
                let request = self
                    .bot
                    .send_video(recipient, InputFile::file(path))
                    .caption(caption)
                    .parse_mode(ParseMode::Html);
                match markup {
                    Some(markup) => request.reply_markup(markup).await.map_err(send_err)?,
                    None => request.await.map_err(send_err)?,
                };
            }
        }
        Ok(())
    }

    async fn stage_file(
        &self,
        file_id: &str,
        staging_dir: &Path,
    ) -> Result<PathBuf, ZayavkaError> {
        let download = async {
            let file = self
                .bot
                .get_file(FileId(file_id.to_string()))
                .await
                .map_err(send_err)?;

            // Keep the remote extension so players and mail clients can
            // identify the file.
            let extension = Path::new(&file.path)
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "bin".to_string());
            let dest = staging_dir.join(format!("{file_id}.{extension}"));

            let mut bytes = Vec::new();
            self.bot
                .download_file(&file.path, &mut bytes)
                .await
                .map_err(|e| ZayavkaError::Transport {
                    message: format!("telegram file download failed: {e}"),
                    source: Some(Box::new(e)),
                })?;
            tokio::fs::write(&dest, &bytes)
                .await
                .map_err(|e| ZayavkaError::Staging(e.to_string()))?;
            debug!(file_id, dest = %dest.display(), size = bytes.len(), "file staged");
            Ok(dest)
        };

        tokio::time::timeout(self.download_timeout, download)
            .await
            .map_err(|_| ZayavkaError::Timeout {
                duration: self.download_timeout,
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_an_empty_token() {
        assert!(TelegramChannel::new("", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn new_accepts_a_plausible_token() {
        let channel =
            TelegramChannel::new("123456:ABC-DEF1234ghIkl", Duration::from_secs(120)).unwrap();
        assert!(channel.polling_handle.is_none());
    }
}
