//! Search command - find collection points by region, locality and items

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use coleta_types::PointSummary;

use crate::search::SearchFlow;

use super::{format_error, CliContext};

#[derive(Parser, Debug)]
pub struct SearchCmd {
    /// Two-letter region code, e.g. SP
    #[arg(value_name = "UF")]
    pub region: String,

    /// Locality name exactly as the directory spells it
    #[arg(value_name = "CITY")]
    pub city: String,

    /// Item category ids to match, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub items: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub count: usize,
    pub points: Vec<PointSummary>,
}

impl SearchCmd {
    pub async fn execute(&self, context: &CliContext, json_output: bool) -> Result<()> {
        match self.execute_inner(context).await {
            Ok(output) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    print_search_result(&output);
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, context: &CliContext) -> Result<SearchResult> {
        let mut flow = SearchFlow::new(context.directory.clone(), context.registry.clone());
        flow.prime().await?;
        flow.select_region(&self.region).await?;
        flow.select_locality(&self.city).await?;
        flow.set_items(self.items.iter().copied()).await?;
        Ok(SearchResult {
            count: flow.results().len(),
            points: flow.results().to_vec(),
        })
    }
}

fn print_search_result(result: &SearchResult) {
    if result.points.is_empty() {
        println!("No collection points found.");
        return;
    }
    println!("{} collection point(s):", result.count);
    for point in &result.points {
        println!("{:>5}  {}  ({})", point.id, point.name, point.position());
    }
}
