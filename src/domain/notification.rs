use crate::domain::order::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    MessagingBot,
    Sms,
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Channel::MessagingBot => "messaging-bot",
            Channel::Sms => "sms",
            Channel::Email => "email",
        };
        f.write_str(s)
    }
}

/// Which order event a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    OrderReceived,
    PaymentReceived,
    PaymentFailed,
}

/// Audit entry for one delivery attempt on one channel.
///
/// Kept apart from the order: a failed delivery never changes order status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub order_id: OrderId,
    pub channel: Channel,
    pub kind: NoticeKind,
    pub destination: Option<String>,
    pub success: bool,
    pub provider_response: Option<String>,
    pub error_code: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn delivered(
        order_id: &OrderId,
        channel: Channel,
        kind: NoticeKind,
        destination: Option<String>,
        provider_response: String,
    ) -> Self {
        Self {
            order_id: order_id.clone(),
            channel,
            kind,
            destination,
            success: true,
            provider_response: Some(provider_response),
            error_code: None,
            attempted_at: Utc::now(),
        }
    }

    pub fn failed(
        order_id: &OrderId,
        channel: Channel,
        kind: NoticeKind,
        destination: Option<String>,
        error_code: String,
        detail: String,
    ) -> Self {
        Self {
            order_id: order_id.clone(),
            channel,
            kind,
            destination,
            success: false,
            provider_response: Some(detail),
            error_code: Some(error_code),
            attempted_at: Utc::now(),
        }
    }
}
