//! gantt-sync - command line entry point
//!
//! Resolves the host context from a page snapshot, loads the production
//! orders it points at and prints them as chart tasks (JSON) on stdout.

use std::sync::Arc;

use gantt_sync::{
    client::ProductionOrderClient, config::Config, host_context::HostContext,
    localization::MessageCatalog, session::GanttSession,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // All work shares one event loop; requests interleave at I/O only.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gantt_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let page = config.read_host_page()?;

    let mut context = HostContext::resolve_with_base(&page, config.host_base_url.as_ref())
        .with_license_fallback(config.license_key.clone());
    if let Some(api_url) = &config.api_url {
        context = context.with_endpoint(api_url.clone());
    }
    info!(
        "Host context: endpoint={} locale={} kind={:?}",
        context.endpoint_or_empty(),
        context.locale.as_deref().unwrap_or("(default)"),
        context.resource_kind
    );
    if context.license_key.is_none() {
        warn!("No widget license key found on the host page or in GANTT_LICENSE_KEY");
    }

    let catalog = match &config.messages_path {
        Some(path) => MessageCatalog::from_json_file(path)?,
        None => MessageCatalog::new(),
    };

    let client = Arc::new(ProductionOrderClient::from_context(&context));
    let (session, mut events) = GanttSession::new(context, client, catalog);
    let mut session = session.with_policy(config.load_policy());

    session.start().await?;
    while let Ok(event) = events.try_recv() {
        info!("{:?}", event);
    }

    let tasks = session.tasks().await;
    println!("{}", serde_json::to_string_pretty(&tasks)?);

    Ok(())
}
