//! Hashi demo bot.
//!
//! Connects to the gateway at `HASHI_HOST:HASHI_PORT` as account `UIN` and
//! prints every message it receives.

use std::env;
use std::error::Error;

use hashi_client::obs::{self, Verbosity};
use hashi_client::{Client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    obs::init(Verbosity::Info)?;

    let host = env::var("HASHI_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = env::var("HASHI_PORT").map_or(Ok(3000), |p| p.parse::<u16>())?;
    let account: i64 = env::var("UIN")
        .map_err(|_| "UIN must be set to the bot account")?
        .parse()?;

    let cfg = ClientConfig::new(host, port, account).with_heartbeat(20);
    let client = Client::new(cfg)?;

    client.on_event_blocking(|msg| {
        println!("{msg:?}");
        Ok(())
    });
    client.on_friend_message_blocking(|msg| {
        println!("{msg:?}");
        Ok(())
    });
    client.on_group_message_blocking(|msg| {
        println!("{msg:?}");
        Ok(())
    });

    client.initialize();

    tokio::select! {
        res = client.run() => res?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
            client.disconnect().await?;
        }
    }
    Ok(())
}
