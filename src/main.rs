//! Relay binary
//!
//! Reads lines from stdin, publishes each one as a message on the `stdin`
//! channel and prints every broadcast payload to stdout. Runs until Ctrl-C.

use std::collections::BTreeMap;
use std::sync::Arc;

use eventrelay::broker::{BrokerConfig, Message, MessageBroker, Subscriber};
use eventrelay::config::load_config;
use eventrelay::utils::logging;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        eprintln!("Relay failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_config()?;
    logging::init(&settings.logging.level);

    let broker = Arc::new(MessageBroker::new(BrokerConfig::from(&settings.broker)));

    let (subscriber, mut inbox) = Subscriber::channel(settings.broker.subscriber_buffer);
    broker.subscribe(&subscriber);
    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(payload) = inbox.recv().await {
            if let Err(e) = write_line(&mut stdout, &payload).await {
                warn!("Stopped printing payloads: {}", e);
                break;
            }
        }
    });

    let producer = broker.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let content = BTreeMap::from([("line".to_string(), line)]);
            if let Err(e) = producer.deliver(Message::now("stdin", content)).await {
                warn!("Dropped input line: {}", e);
            }
        }
    });

    info!(broker = %broker.config().name, "relay running, press Ctrl-C to stop");
    broker.run(tokio::signal::ctrl_c()).await?;
    info!("Shutdown signal received. Exiting gracefully.");

    Ok(())
}

async fn write_line<W>(out: &mut W, payload: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(payload).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
