//! Server entry point with managed logging.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use proven_log_bootstrap::{Bootstrap, EXIT_SUCCESS, Error, redirect_frameworks};
use proven_logger_file::OsFileSystem;
use tokio::sync::oneshot;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (hook_tx, hook_rx) = oneshot::channel();

    let code = Bootstrap::new(io::stdout(), io::stderr(), Arc::new(OsFileSystem))
        .with_framework_redirect(|logger, level| {
            if let Err(e) = redirect_frameworks(logger, level) {
                eprintln!("{e}");
            }
        })
        .with_shutdown_hook_registrar(move |hook| {
            let _ = hook_tx.send(hook);
        })
        .start(std::env::args_os().skip(1));

    if code != EXIT_SUCCESS {
        return ExitCode::from(u8::try_from(code).unwrap_or(1));
    }

    // No hook means nothing was started (for example `--help`).
    let Ok(shutdown) = hook_rx.await else {
        return ExitCode::SUCCESS;
    };

    let result = wait_for_signal().await;
    shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "shut down without a signal");
            ExitCode::FAILURE
        }
    }
}

async fn wait_for_signal() -> Result<(), Error> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).map_err(Error::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(Error::Signal)?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map_err(Error::Signal)?;
        info!("Received interrupt signal");
    }

    Ok(())
}
