// Telegram side of the bot: teloxide update loop and `ChatTransport` impl

use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};

use super::dispatcher::RequestDispatcher;
use super::transport::{ChatTransport, Choice, InboundEvent, MediaUpload, TransportError};

/// Telegram rejects callback data longer than this
pub const MAX_CALLBACK_DATA_BYTES: usize = 64;

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard(choices: &[Choice]) -> InlineKeyboardMarkup {
    let rows = choices
        .iter()
        .map(|choice| {
            if choice.id.len() > MAX_CALLBACK_DATA_BYTES {
                tracing::warn!(
                    "[Telegram] Callback data for {} is {} bytes, over the {} byte limit",
                    choice.label,
                    choice.id.len(),
                    MAX_CALLBACK_DATA_BYTES
                );
            }
            vec![InlineKeyboardButton::callback(choice.label.clone(), choice.id.clone())]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

fn transport_error(e: teloxide::RequestError) -> TransportError {
    TransportError(e.to_string())
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn send_media(&self, chat_id: i64, media: MediaUpload<'_>) -> Result<(), TransportError> {
        let file = InputFile::file(media.path).file_name(media.file_name.to_string());
        let mut request = self.bot.send_video(ChatId(chat_id), file);
        if !media.caption.is_empty() {
            request = request.caption(media.caption);
        }
        request.await.map_err(transport_error)?;
        Ok(())
    }

    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[Choice],
    ) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(keyboard(choices))
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn remove_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(transport_error)?;
        Ok(())
    }
}

async fn on_message(msg: Message, dispatcher: Arc<RequestDispatcher>) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        dispatcher.dispatch(InboundEvent::Message {
            chat_id: msg.chat.id.0,
            text: text.to_string(),
        });
    }
    Ok(())
}

async fn on_callback(
    bot: Bot,
    q: CallbackQuery,
    dispatcher: Arc<RequestDispatcher>,
) -> ResponseResult<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        tracing::warn!("[Telegram] Failed to answer callback query: {}", e);
    }

    let (Some(data), Some(message)) = (q.data, q.message) else {
        tracing::debug!("[Telegram] Callback query without data or message, ignored");
        return Ok(());
    };

    dispatcher.dispatch(InboundEvent::Interaction {
        chat_id: message.chat().id.0,
        message_id: message.id().0,
        data,
    });
    Ok(())
}

/// Run the update loop until Ctrl-C
pub async fn run(bot: Bot, dispatcher: Arc<RequestDispatcher>) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    tracing::info!("[Telegram] Listening for updates");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
