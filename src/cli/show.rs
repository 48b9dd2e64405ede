//! Show command - display one collection point in full

use anyhow::Result;
use clap::Parser;

use coleta_types::PointDetail;

use super::{format_error, CliContext};

#[derive(Parser, Debug)]
pub struct ShowCmd {
    /// Collection point id
    #[arg(value_name = "ID")]
    pub id: u64,
}

impl ShowCmd {
    pub async fn execute(&self, context: &CliContext, json_output: bool) -> Result<()> {
        match self.execute_inner(context).await {
            Ok(detail) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&detail)?);
                } else {
                    print_detail(&detail);
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, context: &CliContext) -> Result<PointDetail> {
        let detail = context.registry.point_detail(self.id).await?;
        Ok(detail)
    }
}

fn print_detail(detail: &PointDetail) {
    println!("{}", detail.point.name);
    println!("  items:    {}", detail.item_titles());
    println!("  address:  {}, {}", detail.point.city, detail.point.uf);
    println!("  email:    {}", detail.point.email);
    println!("  whatsapp: {}", detail.point.whatsapp);
    if let Some(url) = &detail.point.image_url {
        println!("  image:    {url}");
    }
}
