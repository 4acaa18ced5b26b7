use std::sync::Arc;

use clap::Parser;
use storefront_auth::JwksCache;
use tracing_subscriber::EnvFilter;
use url::Url;

mod pipeline;
mod server;
mod stages;

use pipeline::Pipeline;

#[derive(Debug, Parser)]
#[command(name = "storefront-coprocessor", about = "External request-pipeline coprocessor")]
struct Opt {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8081)]
    port: u16,

    /// JWKS endpoint for the RouterRequest auth gate. The gate is disabled
    /// when unset.
    #[arg(long, env = "JWKS_URL")]
    jwks_url: Option<Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let jwks = match &opt.jwks_url {
        Some(url) => {
            tracing::info!(%url, "RouterRequest auth gate enabled");
            Some(Arc::new(JwksCache::new(url.clone())))
        }
        None => {
            tracing::info!("RouterRequest auth gate disabled");
            None
        }
    };

    let app = server::router(Arc::new(Pipeline::new(jwks)));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", opt.port)).await?;
    tracing::info!(port = opt.port, "coprocessor listening");
    axum::serve(listener, app).await?;
    Ok(())
}
