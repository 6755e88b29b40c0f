use crate::cli::run;

pub mod auth;
pub mod catalog;
pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod storage;

fn main() {
    run();
}
