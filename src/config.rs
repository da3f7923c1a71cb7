//! Command line and environment configuration.

use crate::domain::catalog::Catalog;
use crate::domain::contact::DomesticNumbering;
use crate::domain::pricing::{DEFAULT_MIN_PER_DAY_DAYS, PricingRules, SubscriptionOption};
use crate::domain::settlement::CurrencyConversion;
use crate::error::Result;
use crate::infrastructure::signature::DEFAULT_TOLERANCE_SECS;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "POLICY_DESK_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the storefront HTTP API.
    Serve(ServeArgs),
    /// Price a plan for a period without starting the server.
    Quote(QuoteArgs),
    /// Write a CSV report of every stored order with its re-derived price.
    Audit(AuditArgs),
}

/// Options shared by every command that reads the catalog or the store.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "POLICY_DESK_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON file with plans and settlement accounts; built-in defaults otherwise.
    #[arg(long, env = "POLICY_DESK_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Currency of the built-in plans.
    #[arg(long, env = "POLICY_DESK_DISPLAY_CURRENCY", default_value = "GEL")]
    pub display_currency: String,

    /// Shortest per-day policy, in days, both ends included.
    #[arg(long, env = "POLICY_DESK_MIN_PER_DAY_DAYS", default_value_t = DEFAULT_MIN_PER_DAY_DAYS)]
    pub min_per_day_days: u32,
}

impl StoreArgs {
    pub fn pricing_rules(&self) -> PricingRules {
        PricingRules {
            min_per_day_days: self.min_per_day_days,
        }
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        load_catalog(self.catalog.as_deref(), &self.display_currency)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = "POLICY_DESK_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Shared secret for processor webhook signatures.
    #[arg(long, env = "POLICY_DESK_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    #[arg(long, env = "POLICY_DESK_SIGNATURE_TOLERANCE_SECS", default_value_t = DEFAULT_TOLERANCE_SECS)]
    pub signature_tolerance_secs: i64,

    #[arg(long, env = "POLICY_DESK_PROCESSOR_URL", default_value = "https://api.stripe.com")]
    pub processor_url: String,

    #[arg(long, env = "POLICY_DESK_PROCESSOR_KEY", hide_env_values = true, default_value = "")]
    pub processor_key: String,

    /// Public base URL of the storefront; the processor returns customers here.
    #[arg(long, env = "POLICY_DESK_PUBLIC_URL", default_value = "http://127.0.0.1:8080")]
    pub public_url: String,

    /// Prefix of generated order identifiers.
    #[arg(long, env = "POLICY_DESK_ORDER_PREFIX", default_value = "TI")]
    pub order_prefix: String,

    /// Bot API base including the token, e.g. https://api.telegram.org/bot<token>.
    #[arg(long, env = "POLICY_DESK_BOT_URL")]
    pub bot_url: Option<String>,

    #[arg(long, env = "POLICY_DESK_BOT_CHAT_ID", default_value = "")]
    pub bot_chat_id: String,

    #[arg(long, env = "POLICY_DESK_SMS_URL")]
    pub sms_url: Option<String>,

    #[arg(long, env = "POLICY_DESK_SMS_KEY", hide_env_values = true, default_value = "")]
    pub sms_key: String,

    #[arg(long, env = "POLICY_DESK_EMAIL_URL")]
    pub email_url: Option<String>,

    #[arg(long, env = "POLICY_DESK_EMAIL_KEY", hide_env_values = true, default_value = "")]
    pub email_key: String,

    /// Settlement-currency units per display-currency unit, used when the
    /// processor reports no rate.
    #[arg(long, env = "POLICY_DESK_DEFAULT_EXCHANGE_RATE", default_value = "0.37")]
    pub default_exchange_rate: Decimal,

    /// Country calling code of numbers that receive SMS.
    #[arg(long, env = "POLICY_DESK_DOMESTIC_COUNTRY_CODE", default_value = "995")]
    pub domestic_country_code: String,
}

impl ServeArgs {
    pub fn conversion(&self) -> CurrencyConversion {
        CurrencyConversion {
            default_rate: self.default_exchange_rate,
        }
    }

    pub fn numbering(&self) -> DomesticNumbering {
        DomesticNumbering {
            country_code: self.domestic_country_code.clone(),
            ..DomesticNumbering::default()
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionArg {
    Quarterly,
    Yearly,
}

impl From<OptionArg> for SubscriptionOption {
    fn from(value: OptionArg) -> Self {
        match value {
            OptionArg::Quarterly => SubscriptionOption::Quarterly,
            OptionArg::Yearly => SubscriptionOption::Yearly,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Plan identifier from the catalog.
    #[arg(long)]
    pub plan: String,

    #[arg(long)]
    pub start: NaiveDate,

    /// Last covered day; per-day plans only.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Subscription payment option.
    #[arg(long, value_enum)]
    pub option: Option<OptionArg>,
}

#[derive(Args, Debug, Clone)]
pub struct AuditArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output file; stdout when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Reads the catalog file, or builds the default catalog priced in `currency`.
pub fn load_catalog(path: Option<&Path>, currency: &str) -> Result<Catalog> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => {
            let mut catalog = Catalog::default();
            for plan in &mut catalog.plans {
                plan.currency = currency.to_string();
            }
            Ok(catalog)
        }
    }
}
