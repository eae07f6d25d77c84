use clap::Parser;
use nuclei_step::{Cli, Output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    let code = match cli.run().await {
        Ok(code) => code,
        Err(err) => {
            Output::new(false, quiet).error(&format!("{err:#}"));
            1
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
}
