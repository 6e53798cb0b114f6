//! Bot-side collaborators: the inbound webhook update model and the
//! outbound message sender.

use std::sync::Mutex;
use std::time::Duration;

use pulse_storage::UserStore;
use serde::Deserialize;
use tracing::{info, warn};

const WELCOME_NEW: &str = "Welcome! Please use our web app to get started.";
const FALLBACK_REPLY: &str = "Please use our web interface for full functionality.";

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<Sender>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub data: Option<String>,
    pub from: Sender,
    #[serde(default)]
    pub message: Option<Message>,
}

/// Outbound Telegram API client. Delivery failures are logged and reported
/// as `false`, never escalated to the request that triggered them.
pub struct BotClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl BotClient {
    pub fn new(token: String, api_base: String) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_base,
            token,
        })
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> bool {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                info!(event = "message_sent", chat_id);
                true
            }
            Ok(response) => {
                warn!(event = "send_failed", chat_id, status = %response.status());
                false
            }
            Err(err) => {
                warn!(event = "send_failed", chat_id, error = %err);
                false
            }
        }
    }
}

/// Handles one webhook update. Replies are best effort; nothing here
/// escalates back to the webhook response.
pub async fn handle_update(update: Update, store: &Mutex<UserStore>, bot: &BotClient) {
    if let Some(message) = update.message {
        let Some(from) = message.from else {
            return;
        };
        let text = message.text.unwrap_or_default();
        let reply = if text.trim().starts_with("/start") {
            info!(event = "start_command", user_id = from.id);
            start_reply(store, from.id)
        } else {
            FALLBACK_REPLY.to_string()
        };
        bot.send_message(message.chat.id, &reply).await;
    } else if let Some(query) = update.callback_query {
        let chat_id = query
            .message
            .map(|message| message.chat.id)
            .unwrap_or(query.from.id);
        let data = query.data.unwrap_or_default();
        info!(event = "callback_query", chat_id);
        bot.send_message(chat_id, &format!("Action received: {data}"))
            .await;
    }
}

fn start_reply(store: &Mutex<UserStore>, user_id: i64) -> String {
    let record = match store.lock() {
        Ok(store) => match store.user_by_id(user_id) {
            Ok(record) => record,
            Err(err) => {
                warn!(event = "start_lookup_failed", user_id, error = %err);
                None
            }
        },
        Err(_) => {
            warn!(event = "store_lock_poisoned");
            None
        }
    };

    match record {
        Some(record) => format!("Welcome back, {}!", record.first_name),
        None => WELCOME_NEW.to_string(),
    }
}
