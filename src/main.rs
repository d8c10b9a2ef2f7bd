use clap::Parser;
use verdict::cli::{
    ask, handle_completions, handle_config_init, log, providers, Cli, Commands, ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask(args) => ask::run_ask(args).await,
        Commands::Providers(args) => providers::handle_providers(&args).map(|output| {
            println!("{}", output);
        }),
        Commands::Log(args) => log::handle_log(&args).map(|output| {
            println!("{}", output);
        }),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
