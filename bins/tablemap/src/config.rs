use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tablemap", about = "Typed records over a wide-column table store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a filter and print the store query it produces
    ParseFilter(ParseFilterArgs),
    /// List the columns of the sample record
    Fields,
    /// Store, query and delete sample records in the in-memory store
    Demo(DemoArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ParseFilterArgs {
    /// Filter text, e.g. "Age >= 30" or "Name=Bob"
    pub text: String,

    /// Partition the query is scoped to
    #[arg(long, default_value = "default")]
    pub partition_key: String,
}

#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// Path to a repository TOML config file
    #[arg(long, env = "TABLEMAP_CONFIG")]
    pub config: Option<String>,

    /// Print the store content as JSON rows when done
    #[arg(long)]
    pub dump: bool,
}
