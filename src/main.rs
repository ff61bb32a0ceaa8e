use anyhow::Result;
use clap::Parser;
use tracing::info;

use sandbox_launcher::cli::{exit_code, print_argv, Cli};
use sandbox_launcher::sandbox::{init_config, LauncherConfig};
use sandbox_launcher::SandboxRunner;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "sandbox_launcher=debug"
    } else {
        "sandbox_launcher=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse()?),
        )
        .init();

    let config = init_config(cli.launcher_config(LauncherConfig::from_env()))?;
    let sandbox = cli.sandbox()?;
    let spec = cli.command_spec();

    if cli.print_args {
        let argv = print_argv(config, &sandbox, &spec);
        println!("{}", serde_json::to_string_pretty(&argv)?);
        return Ok(());
    }

    info!(
        "Running {:?} in sandbox {} via {}",
        spec.program,
        sandbox.root(),
        config.sandbox_path.display()
    );

    let runner = SandboxRunner::from_config(config).with_inherit_stdio(true);
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available, never cancel
            std::future::pending::<()>().await;
        }
    };

    let result = runner.run_until(&sandbox, &spec, None, interrupted).await;
    std::process::exit(exit_code(&result));
}
