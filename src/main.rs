mod cli;

use clap::Parser;

fn main() {
    cli::install_tracing();
    let args = cli::Cli::parse();

    let exit_code = match cli::run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("doxy: {e}");
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}
