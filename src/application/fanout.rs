use crate::domain::contact::DomesticNumbering;
use crate::domain::messages;
use crate::domain::notification::{Channel, NoticeKind, NotificationRecord};
use crate::domain::order::{Order, OrderId};
use crate::domain::ports::{Mailer, MessagingBot, SharedNotificationLog, SmsGateway};
use crate::error::{OrderError, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sends one order event to every notification channel.
///
/// Channels are independent and best-effort: each attempt is recorded in
/// the notification log and failures are logged, never returned.
pub struct NotificationFanout {
    bot: Arc<dyn MessagingBot>,
    sms: Arc<dyn SmsGateway>,
    mailer: Arc<dyn Mailer>,
    log: SharedNotificationLog,
    numbering: DomesticNumbering,
}

impl NotificationFanout {
    pub fn new(
        bot: Arc<dyn MessagingBot>,
        sms: Arc<dyn SmsGateway>,
        mailer: Arc<dyn Mailer>,
        log: SharedNotificationLog,
        numbering: DomesticNumbering,
    ) -> Self {
        Self {
            bot,
            sms,
            mailer,
            log,
            numbering,
        }
    }

    /// Starts the "order received" fan-out in the background.
    ///
    /// The caller may drop the handle; the task keeps running.
    pub fn spawn_order_received(
        self: &Arc<Self>,
        order: Order,
        document: Option<Vec<u8>>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.order_received(&order, document.as_deref()).await })
    }

    pub async fn order_received(&self, order: &Order, document: Option<&[u8]>) {
        tokio::join!(
            self.post_summary(order, document),
            self.send_sms(order),
            self.send_email(order),
        );
        debug!(order_id = %order.id, "order fan-out finished");
    }

    /// Starts a settlement announcement in the background.
    pub fn spawn_settlement(self: &Arc<Self>, order: Order, kind: NoticeKind) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.settlement(&order, kind).await })
    }

    /// Announces a settlement outcome on the messaging bot.
    pub async fn settlement(&self, order: &Order, kind: NoticeKind) {
        let text = match kind {
            NoticeKind::PaymentFailed => messages::payment_failed(order),
            _ => messages::payment_received(order),
        };
        let outcome = self.bot.send_text(&text).await;
        self.record(&order.id, Channel::MessagingBot, kind, None, outcome)
            .await;
    }

    async fn post_summary(&self, order: &Order, document: Option<&[u8]>) {
        let summary = messages::order_summary(order);
        let outcome = match document {
            Some(image) => match self.bot.send_photo(image, &summary).await {
                Ok(response) => Ok(response),
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "document upload failed, sending text only");
                    self.bot.send_text(&summary).await
                }
            },
            None => self.bot.send_text(&summary).await,
        };
        self.record(
            &order.id,
            Channel::MessagingBot,
            NoticeKind::OrderReceived,
            None,
            outcome,
        )
        .await;
    }

    async fn send_sms(&self, order: &Order) {
        let Some(phone) = self.numbering.normalize(&order.customer.phone) else {
            debug!(order_id = %order.id, "phone is not domestic, skipping SMS");
            return;
        };
        let outcome = self
            .sms
            .send(&phone, &messages::order_received_sms(order))
            .await;
        self.record(
            &order.id,
            Channel::Sms,
            NoticeKind::OrderReceived,
            Some(phone),
            outcome,
        )
        .await;
    }

    async fn send_email(&self, order: &Order) {
        let outcome = self.mailer.send_order_received(order).await;
        self.record(
            &order.id,
            Channel::Email,
            NoticeKind::OrderReceived,
            Some(order.customer.email.clone()),
            outcome,
        )
        .await;
    }

    async fn record(
        &self,
        order_id: &OrderId,
        channel: Channel,
        kind: NoticeKind,
        destination: Option<String>,
        outcome: Result<String>,
    ) {
        let record = match outcome {
            Ok(response) => {
                info!(order_id = %order_id, %channel, "notification delivered");
                NotificationRecord::delivered(order_id, channel, kind, destination, response)
            }
            Err(e) => {
                warn!(order_id = %order_id, %channel, error = %e, "notification failed");
                NotificationRecord::failed(
                    order_id,
                    channel,
                    kind,
                    destination,
                    error_code(&e),
                    e.to_string(),
                )
            }
        };
        if let Err(e) = self.log.record(record).await {
            warn!(order_id = %order_id, %channel, error = %e, "could not store notification record");
        }
    }
}

/// Short machine-readable code for a failed delivery.
fn error_code(error: &OrderError) -> String {
    match error {
        OrderError::Http(e) => match e.status() {
            Some(status) => status.as_u16().to_string(),
            None if e.is_timeout() => "timeout".to_string(),
            None => "unreachable".to_string(),
        },
        OrderError::Notification(_) => "rejected".to_string(),
        _ => "internal".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records what it was asked to send; fails on demand.
    #[derive(Default)]
    pub struct RecordingBot {
        pub texts: Mutex<Vec<String>>,
        pub photos: Mutex<Vec<String>>,
        pub fail_photos: bool,
        pub fail_all: bool,
    }

    #[async_trait]
    impl MessagingBot for RecordingBot {
        async fn send_text(&self, text: &str) -> Result<String> {
            if self.fail_all {
                return Err(OrderError::Notification("bot down".to_string()));
            }
            self.texts.lock().unwrap().push(text.to_string());
            Ok("ok".to_string())
        }

        async fn send_photo(&self, _image: &[u8], caption: &str) -> Result<String> {
            if self.fail_photos || self.fail_all {
                return Err(OrderError::Notification("photo rejected".to_string()));
            }
            self.photos.lock().unwrap().push(caption.to_string());
            Ok("ok".to_string())
        }
    }

    #[derive(Default)]
    pub struct RecordingSms {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl SmsGateway for RecordingSms {
        async fn send(&self, phone: &str, text: &str) -> Result<String> {
            if self.fail {
                return Err(OrderError::Notification("gateway unreachable".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), text.to_string()));
            Ok("queued".to_string())
        }
    }

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OrderId>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_order_received(&self, order: &Order) -> Result<String> {
            if self.fail {
                return Err(OrderError::Notification("mail api down".to_string()));
            }
            self.sent.lock().unwrap().push(order.id.clone());
            Ok("accepted".to_string())
        }
    }
}
