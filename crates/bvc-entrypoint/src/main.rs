//! Entrypoint binary: environment in, concat program exit status out.

use std::process::ExitCode;

use bvc_entrypoint::{exit_code, EntrypointConfig, Invocation};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Stdout belongs to the concat program
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let layer = if use_json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry().with(layer).with(env_filter).init();

    let config = match EntrypointConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let invocation = Invocation::from_config(&config);
    info!("Running {}", invocation);

    match invocation.run().await {
        Ok(status) => {
            let code = exit_code(status);
            if code != 0 {
                error!("{} exited with {}", invocation.program, code);
            }
            ExitCode::from(code)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
