use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use ucprof::{
    commands::{self, ProfileChanges, Selection},
    paths::Paths,
    resolve::KeyOverride,
    store::ProfileStore,
    telemetry,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "ucprof")]
#[command(about = "Manage named configuration and credential profiles for the cloud CLI")]
#[command(version)]
struct Cli {
    /// Profile to use instead of the active one
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Public key overriding the profile's (needs --private-key too)
    #[arg(long, global = true, env = "UCPROF_PUBLIC_KEY", hide_env_values = true)]
    public_key: Option<String>,

    /// Private key overriding the profile's (needs --public-key too)
    #[arg(long, global = true, env = "UCPROF_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Log debug information to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_enum, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all profiles with their keys masked
    List,

    /// Print profile names, one per line
    Names,

    /// Show the profile in use and the client settings derived from it
    Current,

    /// Add a new profile
    Add {
        /// Name of the profile to create
        name: String,

        #[command(flatten)]
        changes: ProfileChanges,
    },

    /// Change a profile, creating it if needed
    Update {
        /// Name of the profile to change
        name: String,

        #[command(flatten)]
        changes: ProfileChanges,
    },

    /// Make a profile the active one
    Use {
        /// Name of the profile to activate
        name: String,
    },

    /// Delete profiles
    Delete {
        /// Names of the profiles to delete
        #[arg(required = true)]
        names: Vec<String>,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Run diagnostics on the ucprof setup
    Doctor,

    /// Generate a shell completion script
    Completion {
        /// Shell to generate for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.debug)?;
    let ui = Ui::new(cli.color, cli.no_color);
    let paths = Paths::new()?;

    // These must work without a loadable store.
    match &cli.command {
        Commands::Doctor => return commands::doctor(&paths, &ui),
        Commands::Completion { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "ucprof", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    paths.ensure_dirs()?;
    let mut store = ProfileStore::open(&paths)?;

    let selection = Selection {
        profile: cli.profile,
        keys: KeyOverride {
            public_key: cli.public_key,
            private_key: cli.private_key,
        },
        debug: cli.debug,
    };

    match cli.command {
        Commands::List => commands::list(&store, &ui, cli.json),
        Commands::Names => commands::names(&store, &ui),
        Commands::Current => commands::current(&store, &ui, &selection, cli.json),
        Commands::Add { name, changes } => {
            commands::add(&mut store, &ui, &name, &changes, commands::prompt_key)
        }
        Commands::Update { name, changes } => {
            commands::update(&mut store, &ui, &name, &changes, commands::prompt_key)
        }
        Commands::Use { name } => commands::use_profile(&mut store, &ui, &name),
        Commands::Delete { names, yes } => commands::delete(&mut store, &ui, &names, yes),
        Commands::Doctor | Commands::Completion { .. } => Ok(()),
    }
}
