use std::{env, sync::Arc};

use jsonrpc_proxy_client::{client::HttpTransport, config::ClientConfig, logging, Client};
use serde_json::Value;
use tracing::info;

const USAGE: &str = "usage: jsonrpc-call <method> [params-json]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let mut args = env::args().skip(1);
    let method = args.next().ok_or(USAGE)?;
    let params = args
        .next()
        .map(|raw| serde_json::from_str::<Value>(&raw))
        .transpose()?;

    let config = ClientConfig::from_env()?;
    let transport = HttpTransport::from_config(&config)?;
    let client = Arc::new(
        Client::with_transport(config.server_url.clone(), transport)
            .with_result_type(config.result_type),
    );

    info!(
        server_url = %config.server_url,
        method = %method,
        "calling remote method"
    );

    let (namespace, name) = method.rsplit_once('.').unwrap_or(("", method.as_str()));
    let value = client.proxy(namespace).invoke(name, params).await?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
