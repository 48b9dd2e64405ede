//! Register command - submit a new collection point

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use serde_json::Value;

use coleta_types::{Coordinates, ImageAttachment};

use crate::register::RegistrationFlow;

use super::{format_error, CliContext};

#[derive(Parser, Debug)]
pub struct RegisterCmd {
    /// Point name
    #[arg(long)]
    pub name: String,

    /// Contact email
    #[arg(long)]
    pub email: String,

    /// Contact WhatsApp number
    #[arg(long)]
    pub whatsapp: String,

    /// Two-letter region code, e.g. SP
    #[arg(long, value_name = "UF")]
    pub region: String,

    /// Locality name exactly as the directory spells it
    #[arg(long)]
    pub city: String,

    /// Accepted item category ids, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub items: Vec<u64>,

    /// Image file to attach (png, jpg, jpeg, gif or webp)
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Pin the marker at `LAT,LNG` instead of the derived position
    #[arg(long, value_name = "LAT,LNG")]
    pub position: Option<Coordinates>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResult {
    pub success: bool,
    pub position: String,
    pub reply: Value,
}

impl RegisterCmd {
    pub async fn execute(&self, context: &CliContext, json_output: bool) -> Result<()> {
        match self.execute_inner(context).await {
            Ok(output) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("Collection point registered at {}.", output.position);
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, context: &CliContext) -> Result<RegisterResult> {
        let mut flow = RegistrationFlow::new(
            context.directory.clone(),
            context.registry.clone(),
            context.geo.clone(),
            &context.config,
        );
        flow.set_name(self.name.clone());
        flow.set_email(self.email.clone());
        flow.set_whatsapp(self.whatsapp.clone());
        for id in &self.items {
            flow.toggle_item(*id);
        }
        if let Some(path) = &self.image {
            flow.attach_image(ImageAttachment::from_path(path)?);
        }

        flow.prime().await?;
        flow.select_region(&self.region).await?;
        flow.select_locality(&self.city).await?;
        if let Some(position) = self.position {
            flow.pin_position(position);
        }

        let point = flow.validate()?;
        let position = point.position.to_string();
        let reply = flow.submit().await?;
        Ok(RegisterResult {
            success: true,
            position,
            reply,
        })
    }
}
