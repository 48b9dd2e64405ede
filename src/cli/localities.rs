//! Localities command - list the localities of one region

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use super::{format_error, CliContext};

#[derive(Parser, Debug)]
pub struct LocalitiesCmd {
    /// Two-letter region code, e.g. SP
    #[arg(value_name = "UF")]
    pub region: String,
}

#[derive(Debug, Serialize)]
pub struct LocalitiesResult {
    pub region: String,
    pub localities: Vec<String>,
}

impl LocalitiesCmd {
    pub async fn execute(&self, context: &CliContext, json_output: bool) -> Result<()> {
        match self.execute_inner(context).await {
            Ok(output) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    for name in &output.localities {
                        println!("{name}");
                    }
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, context: &CliContext) -> Result<LocalitiesResult> {
        let localities = context.directory.localities(&self.region).await?;
        Ok(LocalitiesResult {
            region: self.region.clone(),
            localities: localities.into_iter().map(|entry| entry.name).collect(),
        })
    }
}
