//! `navwatch run` and `navwatch notify-test`.

use anyhow::Result;
use tracing::info;

use nw_monitor::RunOutcome;

use super::{build_monitor, load_config, notifiers_from_env};
use crate::ConfigArgs;

/// Full monitor run. Every [`RunOutcome`] is a normal exit.
pub async fn run_monitor(args: &ConfigArgs) -> Result<()> {
    let (loaded, cfg) = load_config(args)?;
    let notifiers = notifiers_from_env(&loaded, &cfg)?;
    let mut monitor = build_monitor(&cfg, notifiers)?;

    let outcome = monitor.run().await;
    info!(
        completed = matches!(outcome, RunOutcome::Completed(_)),
        summary = %outcome.summary(),
        "run finished"
    );
    Ok(())
}

/// Broadcast a fixed message; fails if any channel failed or none is configured.
pub async fn notify_test(args: &ConfigArgs, title: &str, body: &str) -> Result<()> {
    let (loaded, cfg) = load_config(args)?;
    let notifiers = notifiers_from_env(&loaded, &cfg)?;

    let report = notifiers.broadcast(title, body).await;
    for o in &report.outcomes {
        match &o.result {
            Ok(()) => println!("channel={} delivered=true", o.channel),
            Err(e) => println!("channel={} delivered=false error={}", o.channel, e),
        }
    }

    let delivered = report.into_result()?;
    println!("delivered={delivered}");
    Ok(())
}
