use clap::{Parser, Subcommand};
use stem::{
    commands::{
        config::{self, ConfigAction},
        eject, list,
    },
    logger,
    settings::RuntimeSettings,
    GlobalOpts,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Eject source code from stem packages",
    long_about = "stem copies the source code of a stem package dependency into your project, points your imports at the copy and removes the dependency."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Eject a stem package (lists the available ejectables when no package is given)
    Eject {
        /// Package to eject (e.g., @org/stem-widgets)
        package: Option<String>,
        /// Variant of the package's ejectables
        variant: Option<String>,
    },
    /// List stem packages and their ejectables
    List,
    /// Configure stem
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let default_filter = format!("stem={level},stem_eject={level},stem_manifest={level}");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing(cli.global.verbosity_level());

    let result = match cli.command {
        Commands::Config { action } => config::handle_config(action, &cli.global),
        Commands::Eject { package, variant } => load_settings(&cli.global)
            .and_then(|settings| eject::handle_eject(package, variant, &settings, &cli.global)),
        Commands::List => {
            load_settings(&cli.global).and_then(|settings| list::list_packages(&settings))
        }
    };

    if let Err(e) = result {
        logger::error(&e);
        if cli.global.verbosity_level() > 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}

fn load_settings(opts: &GlobalOpts) -> Result<RuntimeSettings, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to read the current directory: {}", e))?;
    RuntimeSettings::load(opts, cwd)
}
