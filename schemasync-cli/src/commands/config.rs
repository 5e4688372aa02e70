//! `schemasync config`: show the configuration a sync would run with.

use anyhow::Result;
use clap::Args;

use super::options::OptionsArgs;

/// Arguments for `schemasync config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub options: OptionsArgs,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let config = self.options.resolve()?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
    }
}
