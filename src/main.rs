use clap::Parser;
use miette::{IntoDiagnostic, Result};
use policy_desk::application::fanout::NotificationFanout;
use policy_desk::application::intake::OrderIntake;
use policy_desk::application::payment::PaymentSelector;
use policy_desk::application::reconciler::WebhookReconciler;
use policy_desk::config::{AuditArgs, Cli, Command, QuoteArgs, ServeArgs};
use policy_desk::domain::ports::{
    Mailer, MessagingBot, SharedNotificationLog, SharedOrderStore, SmsGateway,
};
use policy_desk::error::OrderError;
use policy_desk::infrastructure::channels::{HttpMailer, HttpSmsGateway, LogOnlyChannel, TelegramBot};
use policy_desk::infrastructure::http_client::build_client;
use policy_desk::infrastructure::in_memory::{InMemoryNotificationLog, InMemoryOrderStore};
use policy_desk::infrastructure::processor::HttpPaymentProcessor;
use policy_desk::infrastructure::signature::SignatureVerifier;
use policy_desk::interfaces::csv::order_writer::OrderAuditWriter;
use policy_desk::interfaces::http::{AppState, router};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

struct Stores {
    orders: SharedOrderStore,
    notifications: SharedNotificationLog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Quote(args) => quote(args),
        Command::Audit(args) => audit(args).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    if let Some(db_path) = db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            let store = policy_desk::infrastructure::rocksdb::RocksDBStore::open(db_path)
                .into_diagnostic()?;
            info!(path = %db_path.display(), "using RocksDB storage");
            return Ok(Stores {
                orders: Arc::new(store.clone()),
                notifications: Arc::new(store),
            });
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        warn!(
            path = %db_path.display(),
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Stores {
        orders: Arc::new(InMemoryOrderStore::new()),
        notifications: Arc::new(InMemoryNotificationLog::new()),
    })
}

async fn serve(args: ServeArgs) -> Result<()> {
    let stores = open_stores(args.store.db_path.as_deref())?;
    let catalog = Arc::new(args.store.load_catalog().into_diagnostic()?);
    let client = build_client().into_diagnostic()?;

    let bot: Arc<dyn MessagingBot> = match &args.bot_url {
        Some(url) => Arc::new(TelegramBot::new(client.clone(), url, &args.bot_chat_id)),
        None => Arc::new(LogOnlyChannel),
    };
    let sms: Arc<dyn SmsGateway> = match &args.sms_url {
        Some(url) => Arc::new(HttpSmsGateway::new(client.clone(), url, &args.sms_key)),
        None => Arc::new(LogOnlyChannel),
    };
    let mailer: Arc<dyn Mailer> = match &args.email_url {
        Some(url) => Arc::new(HttpMailer::new(client.clone(), url, &args.email_key)),
        None => Arc::new(LogOnlyChannel),
    };
    let processor = Arc::new(HttpPaymentProcessor::new(
        client,
        &args.processor_url,
        &args.processor_key,
    ));

    let fanout = Arc::new(NotificationFanout::new(
        bot,
        sms,
        mailer,
        stores.notifications,
        args.numbering(),
    ));
    let state = AppState {
        intake: Arc::new(OrderIntake::new(
            stores.orders.clone(),
            catalog.clone(),
            args.store.pricing_rules(),
            fanout.clone(),
            &args.order_prefix,
        )),
        selector: Arc::new(PaymentSelector::new(
            stores.orders.clone(),
            processor.clone(),
            catalog.settlement_accounts.clone(),
            &args.public_url,
        )),
        reconciler: Arc::new(WebhookReconciler::new(
            stores.orders.clone(),
            processor,
            SignatureVerifier::new(&args.webhook_secret, args.signature_tolerance_secs),
            fanout,
            args.conversion(),
        )),
        store: stores.orders,
    };

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .into_diagnostic()?;
    info!(addr = %listener.local_addr().into_diagnostic()?, "policy desk listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not listen for shutdown signal");
            }
        })
        .await
        .into_diagnostic()?;
    Ok(())
}

fn quote(args: QuoteArgs) -> Result<()> {
    let catalog = args.store.load_catalog().into_diagnostic()?;
    let plan = catalog
        .plan(&args.plan)
        .ok_or_else(|| OrderError::UnknownPlan(args.plan.clone()))
        .into_diagnostic()?;
    let model = plan
        .pricing_model(args.option.map(Into::into))
        .into_diagnostic()?;
    let period = model.period(args.start, args.end).into_diagnostic()?;
    let price = args
        .store
        .pricing_rules()
        .quote(&model, &period)
        .into_diagnostic()?;

    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "plan={} start={} end={} days={} price={} {}",
        plan.id,
        period.start(),
        period.end(),
        period.number_of_days(),
        price,
        plan.currency
    )
    .into_diagnostic()?;
    Ok(())
}

async fn audit(args: AuditArgs) -> Result<()> {
    let stores = open_stores(args.store.db_path.as_deref())?;
    let orders = stores.orders.all_orders().await.into_diagnostic()?;

    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            OrderAuditWriter::new(file).write_orders(&orders)
        }
        None => OrderAuditWriter::new(io::stdout().lock()).write_orders(&orders),
    }
    .into_diagnostic()?;

    if summary.mismatches > 0 {
        warn!(orders = summary.orders, mismatches = summary.mismatches, "stored prices differ from re-derived prices");
    } else {
        info!(orders = summary.orders, "audit complete, all prices re-derive");
    }
    Ok(())
}
