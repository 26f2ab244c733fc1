#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod constants;
mod deploy;
mod errors;
mod git;
mod report;
mod subcommands;
mod transport;

#[tokio::main]
async fn main() -> Result<()> {
    cli::Cli::parse().run().await
}
