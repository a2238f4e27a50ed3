use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "meetnote")]
#[command(about = "Meeting caption capture and summarization", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// View stored summary history
    History(HistoryCliArgs),
    /// Store the generation API key
    SetKey(SetKeyCliArgs),
    /// Wipe all sessions and summary history
    Clear,
}

#[derive(ClapArgs, Debug)]
pub struct HistoryCliArgs {
    /// Maximum number of summaries to show
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
    /// Print full summary text instead of the first line
    #[arg(long)]
    pub full: bool,
}

#[derive(ClapArgs, Debug)]
pub struct SetKeyCliArgs {
    /// The API key value
    pub key: String,
}
