//! `schemasync branch-name`: print the timestamp-derived sync branch.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;

use schemasync_core::{BranchName, Clock, FixedClock, SystemClock};

/// Arguments for `schemasync branch-name`.
#[derive(Args, Debug)]
pub struct BranchNameArgs {
    /// Use this instant instead of now, e.g. `2024-03-05T09:07:00Z`.
    #[arg(long, value_parser = parse_rfc3339)]
    pub at: Option<DateTime<Utc>>,
}

impl BranchNameArgs {
    pub fn run(self) -> Result<()> {
        let clock: Box<dyn Clock> = match self.at {
            Some(at) => Box::new(FixedClock(at)),
            None => Box::new(SystemClock),
        };
        println!("{}", BranchName::from_timestamp(clock.now()));
        Ok(())
    }
}

fn parse_rfc3339(input: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(input)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}
