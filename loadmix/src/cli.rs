//! Command line entry point of the `loadmix` binary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;

use crate::config::Config;
use crate::controller::Controller;
use crate::observability;

/// Drives a randomized mix of reads, inserts, updates and deletes against a data store and
/// reports aggregated statistics on SIGINT or SIGTERM.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,
}

/// Bootstrap the runtime and run the load generator until it is stopped.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    let config = Config::load(args.config.as_deref())?;
    let validated = config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("loadmix-rt")
        .enable_all()
        .worker_threads(config.runtime.worker_threads)
        .build()?;
    let _runtime_guard = runtime.enter();

    observability::init_tracing(&config.logging);
    tracing::debug!(?config);

    let mut controller = Controller::from_config(&validated);
    if let Some(seed) = config.seed {
        controller = controller.seed(seed);
    }

    let store = config.store.open();
    let report = runtime.block_on(controller.run(store, shutdown(config.duration)))?;
    report.print();

    // Clients are aborted but may still hold store connections, do not wait for them.
    runtime.shutdown_background();
    Ok(())
}

/// Resolves on SIGINT or SIGTERM, or once the optional run duration has elapsed.
async fn shutdown(duration: Option<Duration>) {
    let signal = async {
        elegant_departure::tokio::depart()
            .on_termination()
            .on_sigint()
            .await;
    };

    match duration {
        Some(duration) => tokio::select! {
            () = signal => {}
            () = tokio::time::sleep(duration) => {
                tracing::info!(?duration, "run duration elapsed");
            }
        },
        None => signal.await,
    }
}
