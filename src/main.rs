use clap::{
    Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spotify_cleaner::{
    cli,
    config::{self, Config},
    error,
    management::{FilterOptions, PlaylistCleaner},
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Ignore any stored credential and authorize again in the browser
    #[clap(long, global = true)]
    re_auth: bool,

    /// Show diagnostic logs on stderr
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List your playlists (default)
    List(ListOptions),

    /// Unfollow playlists selected by filters, by id, or from a checklist
    Clean(CleanOptions),

    /// Authorize with Spotify API
    Auth,

    /// Fetch your profile to check the stored credential
    TestAuth,

    /// Remove the stored credential
    Logout,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Regex searched in the playlist name
    #[clap(long)]
    name: Option<String>,

    /// Owner user id; `me` for your playlists, `not-me` for everyone else's
    #[clap(long)]
    owner: Option<String>,

    /// Only collaborative playlists
    #[clap(long, conflicts_with = "not_collaborative")]
    collaborative: bool,

    /// Only non-collaborative playlists
    #[clap(long)]
    not_collaborative: bool,

    /// Only playlists with zero tracks
    #[clap(long)]
    empty: bool,

    /// Only playlists without a description
    #[clap(long)]
    no_description: bool,
}

impl From<FilterArgs> for FilterOptions {
    fn from(args: FilterArgs) -> Self {
        let collaborative = match (args.collaborative, args.not_collaborative) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        FilterOptions {
            name: args.name,
            owner: args.owner,
            collaborative,
            empty: args.empty,
            no_description: args.no_description,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ListOptions {
    /// Page number, starting at 1
    #[clap(long, default_value_t = 1)]
    page: u32,

    /// Playlists per page (at most 50)
    #[clap(long, default_value_t = 50)]
    limit: u32,

    #[command(flatten)]
    filters: FilterArgs,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            filters: FilterArgs::default(),
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct CleanOptions {
    #[command(flatten)]
    filters: FilterArgs,

    /// Playlist id to unfollow; can be repeated, replaces the filters
    #[clap(long = "id", num_args = 1)]
    ids: Vec<String>,

    /// Show what would be unfollowed without changing anything
    #[clap(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[clap(long, short)]
    yes: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli
        .command
        .unwrap_or_else(|| Command::List(ListOptions::default()));

    if let Command::Completions(opt) = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    let cleaner = match PlaylistCleaner::from_config(config) {
        Ok(c) => c,
        Err(e) => error!("Cannot set up Spotify client. Err: {}", e),
    };

    match command {
        Command::Auth => {
            cli::auth(&cleaner, cli.re_auth).await;
            return;
        }
        Command::Logout => {
            cli::logout(&cleaner).await;
            return;
        }
        _ => {}
    }

    if cli.re_auth {
        cli::auth(&cleaner, true).await;
    }

    match command {
        Command::List(opt) => cli::list(&cleaner, opt.filters.into(), opt.page, opt.limit).await,
        Command::Clean(opt) => {
            cli::clean(&cleaner, opt.filters.into(), opt.ids, opt.dry_run, opt.yes).await
        }
        Command::TestAuth => cli::test_auth(&cleaner).await,
        Command::Auth | Command::Logout | Command::Completions(_) => {}
    }
}
