//! Line-oriented TCP client.
//!
//! Sends every line read from stdin to the given peer and prints whatever
//! comes back. Closes the connection on EOF.
//!
//! ```sh
//! RUST_LOG=info cargo run -p strand-net --example line_client -- 127.0.0.1 9000
//! ```

use std::io::BufRead;
use std::sync::Arc;

use bytes::Bytes;
use strand_net::tcp::{ClientListener, RemoteEndpoint, TcpClient, TcpClientConfig};
use tracing_subscriber::EnvFilter;

struct Console;

impl ClientListener for Console {
    fn on_received(&self, endpoint: &RemoteEndpoint, chunk: Bytes) {
        tracing::info!(%endpoint, "<< {}", String::from_utf8_lossy(&chunk).trim_end());
    }

    fn on_sent(&self, endpoint: &RemoteEndpoint, count: usize) {
        tracing::debug!(%endpoint, count, "sent");
    }

    fn on_send_failed(&self, endpoint: &RemoteEndpoint) {
        tracing::error!(%endpoint, "send failed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_default();
    let port = args.next().unwrap_or_default();
    let endpoint = RemoteEndpoint::parse(&host, &port)?;

    let client = TcpClient::with_listener(
        TcpClientConfig::from_endpoint(endpoint).no_delay(true),
        Arc::new(Console),
    );

    let _state_log = client.state_changed.connect(|change| {
        tracing::info!(endpoint = %change.endpoint, state = %change.state, "state changed");
    });

    client.connect()?;

    for line in std::io::stdin().lock().lines() {
        let mut line = line?;
        line.push('\n');
        client.send(line)?;
    }

    client.close();
    client.join();
    Ok(())
}
