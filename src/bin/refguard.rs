use clap::Parser;
use colored::Colorize;
use refguard_core::cli::{self, Cli};
use refguard_core::exit::RefguardExit;

fn main() -> RefguardExit {
    let cli = Cli::parse();

    let result = if let Some(cmd) = cli.command {
        cli::dispatch::execute(cmd)
    } else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        Ok(RefguardExit::Success)
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            RefguardExit::Failure
        }
    }
}
