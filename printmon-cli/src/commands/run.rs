//! `printmon run` — headless supervision until ctrl-c or server exit.

use anyhow::{Context, Result};

use crate::app::App;
use crate::GlobalArgs;

pub fn run(global: &GlobalArgs) -> Result<()> {
    let app = App::from_args(global)?;
    super::runtime()?.block_on(async move {
        let relay = app.spawn_relay();
        if app.handle_start().await {
            tracing::info!("relaying print server output; ctrl-c to stop");
            tokio::select! {
                waited = tokio::signal::ctrl_c() => {
                    if let Err(err) = waited {
                        tracing::warn!(error = %err, "ctrl-c handler failed");
                    }
                }
                status = app.wait_for_exit() => {
                    tracing::info!(?status, "print server exited on its own");
                }
            }
        }

        let stats = relay.shutdown().await.context("log relay failed");
        app.shutdown().await;
        let stats = stats?;
        tracing::debug!(lines = stats.lines, "relay joined");
        Ok(())
    })
}
