//! Provider status command.

use anyhow::Result;

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, render_list, CommandOutput};
use crate::domain::models::ProviderStatus;

#[derive(Debug, serde::Serialize)]
pub struct ProvidersOutput {
    pub providers: Vec<ProviderStatus>,
    pub available: usize,
}

impl CommandOutput for ProvidersOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["provider", "status", "models", "notes"]);
        for status in &self.providers {
            let models: Vec<&str> = status.models.iter().map(|m| m.id.as_str()).collect();
            table.add_row(vec![
                status.provider.as_str().to_string(),
                if status.available { "ready" } else { "missing" }.to_string(),
                status.model_count.to_string(),
                status.reason.clone().unwrap_or_else(|| models.join(", ")),
            ]);
        }
        format!(
            "{} of {} providers available\n{}",
            self.available,
            self.providers.len(),
            render_list("provider", &table, self.providers.len())
        )
    }
}

pub async fn execute(ctx: &AppContext, json_mode: bool) -> Result<()> {
    let providers = ctx.registry.status();
    let out = ProvidersOutput {
        available: providers.iter().filter(|p| p.available).count(),
        providers,
    };
    output(&out, json_mode);
    Ok(())
}
