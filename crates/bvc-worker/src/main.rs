//! Dashcam concat binary.

use std::process::ExitCode;

use bvc_media::FfmpegRunner;
use bvc_worker::logging::init_logging;
use bvc_worker::{run, Cli, FfmpegBackend};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let _log_guard = match init_logging(cli.logging_level, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("options: {:?}", cli);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Ends the run and kills the running ffmpeg on shutdown
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        let _ = cancel_tx.send(true);
    });

    let mut runner = FfmpegRunner::new().with_cancel(cancel_rx.clone());
    if let Some(secs) = config.ffmpeg_timeout_secs {
        runner = runner.with_timeout(secs);
    }
    let backend = FfmpegBackend::new(runner);

    match run(&config, &backend, cancel_rx).await {
        Ok(summary) => {
            info!(
                sessions = summary.sessions,
                below_threshold = summary.below_threshold,
                lists_created = summary.lists_created,
                lists_kept = summary.lists_kept,
                outputs_created = summary.outputs_created,
                outputs_kept = summary.outputs_kept,
                outputs_failed = summary.outputs_failed,
                files_deleted = summary.files_deleted,
                "Run complete"
            );
            if summary.outputs_failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
