use crate::commands::{pack::PackArgs, port::PortArgs, pull::PullArgs, train::TrainArgs};

pub mod pack;
pub mod port;
pub mod pull;
pub mod train;

/// Subcommands for ctxpack-cli
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Pack JSONL text records into fixed-length training examples.
    Pack(PackArgs),

    /// Filter and reformat a chat dataset for re-publication.
    Port(PortArgs),

    /// Prefetch dataset shards into the local cache.
    Pull(PullArgs),

    /// Prepare packed splits and a step schedule for the external trainer.
    Train(TrainArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Pack(cmd) => cmd.run(),
            Commands::Port(cmd) => cmd.run(),
            Commands::Pull(cmd) => cmd.run(),
            Commands::Train(cmd) => cmd.run(),
        }
    }
}
