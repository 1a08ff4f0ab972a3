mod cli;
mod commands;
mod deck;
mod env_loader;
mod error;
mod logging;
mod remote;

fn main() {
    env_loader::load_dotenv();
    logging::init();

    if let Err(err) = cli::run() {
        match serde_json::to_string_pretty(&err.envelope()) {
            Ok(rendered) => eprintln!("{rendered}"),
            Err(_) => eprintln!("error: {err}"),
        }
        std::process::exit(1);
    }
}
