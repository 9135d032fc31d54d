use anyhow::Context as _;
use garage_provider::{
    provider::{Diagnostic, GarageProvider, Request, Response},
    telemetry,
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Serve host requests, one JSON document per line on stdin, until stdin closes
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting garage provider");

    let mut provider = GarageProvider::new();
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await.context("failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!(op = request.op(), "Handling request");
                provider.handle(request).await
            }
            Err(e) => Response {
                diagnostics: vec![Diagnostic::error("Invalid Request", e.to_string())],
                ..Default::default()
            },
        };

        let mut out = serde_json::to_vec(&response).context("failed to encode response")?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!("Host closed stdin, shutting down");
    Ok(())
}
