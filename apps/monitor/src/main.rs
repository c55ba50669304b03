use anyhow::Result;
use clap::Parser;
use client_core::{spawn_event_stream, spawn_synthetic_producer, EventStore, StoreChange};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    server_url: String,
    /// Feed the store fabricated events instead of connecting to a relay.
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let store = EventStore::new();
    let mut changes = store.subscribe_changes();

    let _producer = if args.simulate {
        println!("Simulating control events locally.");
        Some(spawn_synthetic_producer(store.clone()))
    } else {
        spawn_event_stream(store.clone(), &args.server_url).await?;
        println!("Watching control events from {}", args.server_url);
        None
    };

    loop {
        match changes.recv().await {
            Ok(StoreChange::Event(event)) => {
                println!(
                    "{} {} ({} in history)",
                    event.received_at.format("%H:%M:%S%.3f"),
                    event.display_label(),
                    store.events().await.len(),
                );
            }
            Ok(StoreChange::ActiveCleared) => {
                println!("(idle)");
            }
            Ok(StoreChange::Connection(connected)) => {
                println!("console {}", if connected { "connected" } else { "disconnected" });
                if !connected {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                println!("(skipped {skipped} updates)");
            }
            Err(RecvError::Closed) => break,
        }
    }

    Ok(())
}
