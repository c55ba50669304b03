use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{fire, standard_bindings, BindingBehavior, DeckBinding, HttpControlClient};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the configured bindings.
    Bindings,
    /// Press a key binding one or more times.
    Press {
        action: String,
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Rotate a dial binding by a signed number of detents.
    Rotate {
        action: String,
        #[arg(allow_negative_numbers = true)]
        detents: i64,
    },
    /// Walk every binding repeatedly, firing as it goes.
    Demo {
        #[arg(long, default_value_t = 3)]
        rounds: u32,
    },
}

fn find_binding(bindings: Vec<DeckBinding>, action: &str) -> Result<DeckBinding> {
    let wanted = action.to_ascii_lowercase();
    bindings
        .into_iter()
        .find(|binding| {
            binding.display_name.to_ascii_lowercase() == wanted
                || binding.event_kind.to_ascii_lowercase() == wanted
        })
        .ok_or_else(|| anyhow!("no binding named '{action}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();
    let sink = HttpControlClient::new(cli.server_url);

    match cli.command {
        Command::Bindings => {
            for binding in standard_bindings() {
                println!("{:<18} -> {}", binding.display_name, binding.event_kind);
            }
        }
        Command::Press { action, times } => {
            let mut binding = find_binding(standard_bindings(), &action)?;
            for _ in 0..times {
                if let Some(envelope) = binding.press() {
                    fire(&sink, &binding.display_name, envelope).await;
                }
            }
            println!("{}", binding.display_text().replace('\n', " "));
        }
        Command::Rotate { action, detents } => {
            let mut binding = find_binding(standard_bindings(), &action)?;
            if let Some(envelope) = binding.rotate(detents) {
                fire(&sink, &binding.display_name, envelope).await;
            }
            println!("{}", binding.display_text().replace('\n', " "));
        }
        Command::Demo { rounds } => {
            let mut bindings = standard_bindings();
            for _ in 0..rounds {
                for binding in bindings.iter_mut() {
                    let envelope = if matches!(binding.behavior(), BindingBehavior::Dial { .. }) {
                        binding.rotate(5)
                    } else {
                        binding.press()
                    };
                    let Some(envelope) = envelope else { continue };
                    let delivered = fire(&sink, &binding.display_name, envelope).await;
                    println!(
                        "{} {}",
                        if delivered { "sent" } else { "dropped" },
                        binding.display_text().replace('\n', " "),
                    );
                    tokio::time::sleep(Duration::from_millis(400)).await;
                }
            }
        }
    }

    Ok(())
}
