use anyhow::Result;
use clap::Parser;

use socialgraph::api;

#[derive(Parser)]
#[clap(version, author = "socialgraph contributors")]
enum Cli {
    /// Start the socialgraph service
    Serve {
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Print the GraphQL schema SDL
    Schema {
        /// Write to this file instead of stdout
        #[clap(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli {
        Cli::Serve { config } => {
            println!("Starting socialgraph service with config: {}", config);
            api::start_service(config).await?;
        }
        Cli::Schema { output } => {
            api::print_schema(output)?;
        }
    }

    Ok(())
}
