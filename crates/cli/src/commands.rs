use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full-table sync for every configured stream
    Sync {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Only sync the stream with this id")]
        stream: Option<String>,
    },
    /// Report whether each stream can be paginated by key
    Check {
        #[arg(long, help = "Config file path")]
        config: String,
    },
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommand,
    },
}

#[derive(Subcommand)]
pub enum BookmarkCommand {
    /// Print the persisted bookmark of a stream
    Show {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Stream id")]
        stream: String,

        #[arg(long, help = "Also list the stream's checkpoint log")]
        history: bool,
    },
    /// Forget a stream's bookmark so the next sync starts fresh
    Reset {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Stream id")]
        stream: String,
    },
}
