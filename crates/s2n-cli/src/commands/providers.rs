//! The providers command

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use s2n_broker::provider::DESCRIPTORS;
use s2n_broker::BrokerConfig;
use serde_json::json;

use crate::error::Result;
use crate::output::OutputFormat;

pub fn render(config: &BrokerConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["code", "label", "services", "dataset queries"]);

            for descriptor in &DESCRIPTORS {
                let services: Vec<&str> = descriptor.services.iter().map(|s| s.as_str()).collect();
                table.add_row(vec![
                    descriptor.code.to_string(),
                    descriptor.label.to_string(),
                    services.join(", "),
                    if descriptor.dataset_queries { "yes" } else { "no" }.to_string(),
                ]);
            }
            Ok(table.to_string())
        },
        OutputFormat::Json | OutputFormat::Annotated => {
            let providers: Vec<_> = DESCRIPTORS
                .iter()
                .map(|descriptor| {
                    json!({
                        "code": descriptor.code,
                        "label": descriptor.label,
                        "icon_url": config.icon_url(descriptor.code),
                        "services": descriptor.services,
                        "dataset_queries": descriptor.dataset_queries,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&providers)?)
        },
    }
}

pub fn run(format: OutputFormat) -> Result<()> {
    let config = BrokerConfig::load()?;
    println!("{}", render(&config, format)?);
    Ok(())
}
