use clap::Parser;

use codexlink::bootstrap::load_codexlink_env;
use codexlink::cli::{Cli, init_logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_codexlink_env();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let code = run(cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
