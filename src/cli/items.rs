//! Items command - list the recyclable item categories

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use coleta_types::RecyclableItem;

use super::{format_error, CliContext};

#[derive(Parser, Debug)]
pub struct ItemsCmd {}

#[derive(Debug, Serialize)]
pub struct ItemsResult {
    pub items: Vec<RecyclableItem>,
}

impl ItemsCmd {
    pub async fn execute(&self, context: &CliContext, json_output: bool) -> Result<()> {
        match self.execute_inner(context).await {
            Ok(output) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    for item in &output.items {
                        println!("{:>4}  {}", item.id, item.title);
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

    async fn execute_inner(&self, context: &CliContext) -> Result<ItemsResult> {
        let items = context.registry.items().await?;
        Ok(ItemsResult { items })
    }
}
