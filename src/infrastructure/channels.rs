//! Outbound notification channels over HTTP.

use crate::domain::order::Order;
use crate::domain::ports::{Mailer, MessagingBot, SmsGateway};
use crate::error::{OrderError, Result};
use crate::infrastructure::http_client::response_text;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Bot API in the Telegram style: `<base>/sendMessage` and `<base>/sendPhoto`,
/// where `base` already carries the bot token.
pub struct TelegramBot {
    client: reqwest::Client,
    base_url: String,
    chat_id: String,
}

#[derive(Deserialize)]
struct BotReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramBot {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chat_id: chat_id.into(),
        }
    }

    fn check(body: String) -> Result<String> {
        let reply: BotReply = serde_json::from_str(&body)?;
        if reply.ok {
            Ok(body)
        } else {
            Err(OrderError::Notification(
                reply.description.unwrap_or_else(|| "bot refused the message".to_string()),
            ))
        }
    }
}

#[async_trait]
impl MessagingBot for TelegramBot {
    async fn send_text(&self, text: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&json!({ "chat_id": self.chat_id, "text": text }))
            .send()
            .await?;
        Self::check(response_text(response).await?)
    }

    async fn send_photo(&self, image: &[u8], caption: &str) -> Result<String> {
        let photo = Part::bytes(image.to_vec()).file_name("document.jpg");
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", photo);
        let response = self
            .client
            .post(format!("{}/sendPhoto", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Self::check(response_text(response).await?)
    }
}

/// Generic JSON SMS gateway: `POST <url>` with `{to, text}` and a bearer key.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpSmsGateway {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, phone: &str, text: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "to": phone, "text": text }))
            .send()
            .await?;
        response_text(response).await
    }
}

/// Transactional email API that renders the `order-received` template.
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_order_received(&self, order: &Order) -> Result<String> {
        let payload = json!({
            "to": order.customer.email,
            "template": "order-received",
            "locale": order.locale,
            "data": {
                "orderId": order.id,
                "name": order.customer.full_name(),
                "plan": order.plan_id,
                "periodStart": order.period.start(),
                "periodEnd": order.period.end(),
                "price": order.price,
                "currency": order.currency,
            }
        });
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        response_text(response).await
    }
}

/// Stand-in for a channel that has no endpoint configured: writes the
/// message to the log and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyChannel;

#[async_trait]
impl MessagingBot for LogOnlyChannel {
    async fn send_text(&self, text: &str) -> Result<String> {
        info!(channel = "messaging-bot", %text, "bot not configured, message logged");
        Ok("logged".to_string())
    }

    async fn send_photo(&self, image: &[u8], caption: &str) -> Result<String> {
        info!(channel = "messaging-bot", bytes = image.len(), %caption, "bot not configured, photo logged");
        Ok("logged".to_string())
    }
}

#[async_trait]
impl SmsGateway for LogOnlyChannel {
    async fn send(&self, phone: &str, text: &str) -> Result<String> {
        info!(channel = "sms", %phone, %text, "SMS gateway not configured, message logged");
        Ok("logged".to_string())
    }
}

#[async_trait]
impl Mailer for LogOnlyChannel {
    async fn send_order_received(&self, order: &Order) -> Result<String> {
        info!(channel = "email", order_id = %order.id, to = %order.customer.email, "mailer not configured, message logged");
        Ok("logged".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures;
    use axum::Router;
    use axum::extract::{Json, Multipart};
    use axum::routing::post;
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_bot_text_and_refusal() {
        let seen = Arc::new(Mutex::new(Vec::<serde_json::Value>::new()));
        let sink = seen.clone();
        let router = Router::new()
            .route(
                "/botTOKEN/sendMessage",
                post(move |Json(body): Json<serde_json::Value>| {
                    let sink = sink.clone();
                    async move {
                        sink.lock().unwrap().push(body);
                        Json(json!({ "ok": true, "result": { "message_id": 7 } }))
                    }
                }),
            )
            .route(
                "/botTOKEN/sendPhoto",
                post(|mut multipart: Multipart| async move {
                    let mut names = Vec::new();
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        names.push(field.name().unwrap_or_default().to_string());
                    }
                    assert!(names.contains(&"photo".to_string()));
                    Json(json!({ "ok": false, "description": "Bad Request: IMAGE_PROCESS_FAILED" }))
                }),
            );
        let base = serve(router).await;
        let bot = TelegramBot::new(reqwest::Client::new(), format!("{base}/botTOKEN"), "-100");

        bot.send_text("hello").await.unwrap();
        assert_eq!(seen.lock().unwrap()[0]["chat_id"], "-100");

        let err = bot.send_photo(b"jpeg", "caption").await.unwrap_err();
        assert!(matches!(err, OrderError::Notification(msg) if msg.contains("IMAGE_PROCESS_FAILED")));
    }

    #[tokio::test]
    async fn test_sms_gateway_error_status_is_an_http_error() {
        let router = Router::new().route(
            "/sms",
            post(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = serve(router).await;
        let sms = HttpSmsGateway::new(reqwest::Client::new(), format!("{base}/sms"), "key");

        let err = sms.send("+995555123456", "hi").await.unwrap_err();
        let OrderError::Http(e) = err else {
            panic!("expected an HTTP error");
        };
        assert_eq!(e.status().map(|s| s.as_u16()), Some(503));
    }

    #[tokio::test]
    async fn test_mailer_sends_order_fields() {
        let seen = Arc::new(Mutex::new(None::<serde_json::Value>));
        let sink = seen.clone();
        let router = Router::new().route(
            "/mail",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    "accepted"
                }
            }),
        );
        let base = serve(router).await;
        let mailer = HttpMailer::new(reqwest::Client::new(), format!("{base}/mail"), "key");

        let order = fixtures::pending_order("TI-1");
        assert_eq!(mailer.send_order_received(&order).await.unwrap(), "accepted");
        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["to"], "nino@example.ge");
        assert_eq!(body["data"]["orderId"], "TI-1");
        assert_eq!(body["data"]["price"], "15");
    }
}
