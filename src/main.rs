//! jumon: Markdown-based AI workflow orchestration on a message broker.

mod client;
mod config;
mod server;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "jumon",
    about = "Magically simple markdown-based AI workflow orchestration"
)]
struct Cli {
    /// Disable anonymous telemetry data collection.
    #[arg(long, default_value_t = false)]
    disable_telemetry: bool,

    /// Enable debug mode.
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the jumon services.
    Serve {
        /// Broker URL to connect to.
        #[arg(long)]
        url: Option<String>,
    },
    /// Stop a running jumon server.
    Stop,
    /// Initialize a JUMON.md in the current directory.
    Init {
        /// Name of the module.
        name: String,
    },
    /// Run a module from a URL or path.
    Run {
        /// URL or path to the jumon module.
        url_or_path: String,
        /// Input to the module.
        input: Option<String>,
    },
    /// Show the version.
    Version,
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Command::Serve { url } => server::serve(url, cli.disable_telemetry).await,
        Command::Stop => server::quit().await,
        Command::Init { name } => jumon_module::init_module(&name).map_err(Into::into),
        Command::Run { url_or_path, input } => {
            client::run(&url_or_path, input.unwrap_or_default().as_bytes()).await
        }
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
