//! Regions command - list the region codes the directory serves

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use super::{format_error, CliContext};

#[derive(Parser, Debug)]
pub struct RegionsCmd {}

#[derive(Debug, Serialize)]
pub struct RegionsResult {
    pub regions: Vec<String>,
}

impl RegionsCmd {
    pub async fn execute(&self, context: &CliContext, json_output: bool) -> Result<()> {
        match self.execute_inner(context).await {
            Ok(output) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    for code in &output.regions {
                        println!("{code}");
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

    async fn execute_inner(&self, context: &CliContext) -> Result<RegionsResult> {
        let regions = context.directory.regions().await?;
        Ok(RegionsResult {
            regions: regions.into_iter().map(|entry| entry.code).collect(),
        })
    }
}
