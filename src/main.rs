use crate::cli::run;

pub mod cli;
mod config;
pub mod deck;
pub mod domain;
pub mod http;
mod importer;
pub mod library;
pub mod search;
mod session;
pub mod storage;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
