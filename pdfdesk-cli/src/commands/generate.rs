use super::save_download;
use crate::console::print_table;
use crate::context::Context;
use anyhow::Context as _;
use clap::Args;
use pdfdesk_core::quota::QuotaService;
use pdfdesk_core::registry::{ClientStore, FormSetComposer, TemplateRegistry};
use pdfdesk_core::workflow::{FormGenerationWorkflow, FormGenerator, WorkflowStep};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct GenerateArgs {
    /// Client id
    #[arg(long)]
    client: String,

    /// Template id; repeat for each template
    #[arg(long = "template")]
    templates: Vec<String>,

    /// Add every template of a form set
    #[arg(long)]
    form_set: Option<String>,

    /// JSON object merged over the client's stored data
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long)]
    insurer: Option<String>,

    /// Directory for the downloaded batch
    #[arg(long)]
    out: Option<PathBuf>,

    /// Only report results, do not download
    #[arg(long)]
    no_download: bool,
}

fn read_overrides(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

pub async fn run(ctx: &Context, args: GenerateArgs) -> anyhow::Result<()> {
    ctx.require_session()?;

    let client = ClientStore::new(ctx.client.clone()).get(&args.client).await?;
    let record = client.to_record();
    let mut client_data: Map<String, Value> = record.extensions.into_iter().collect();
    client_data.insert("id_number".to_string(), Value::String(record.id_number));
    if let Some(path) = &args.data {
        client_data.extend(read_overrides(path)?);
    }

    let mut template_ids = args.templates.clone();
    if let Some(set_id) = &args.form_set {
        let set = FormSetComposer::new(ctx.client.clone()).get(set_id).await?;
        template_ids.extend(set.template_ids());
    }

    let mut workflow = FormGenerationWorkflow::new(
        FormGenerator::new(ctx.client.clone()),
        QuotaService::new(ctx.client.clone()),
        ctx.notifier.clone(),
        client.id.clone(),
        client_data,
    );
    if let Some(insurer) = &args.insurer {
        workflow = workflow.with_insurer(insurer.clone());
    }

    workflow.start().await;
    if let Some(daily) = workflow.quota().and_then(|q| q.daily) {
        println!("Daily quota: {}", daily);
    }

    let templates = TemplateRegistry::new(ctx.client.clone());
    for id in &template_ids {
        if !workflow.is_selected(id) {
            workflow.toggle_template(templates.get(id).await?);
        }
    }

    if workflow.next().await != WorkflowStep::Generating {
        anyhow::bail!("No templates selected");
    }
    if workflow.next().await != WorkflowStep::ReviewingResults {
        anyhow::bail!("Form generation did not complete");
    }

    let Some(batch) = workflow.batch() else {
        anyhow::bail!("Form generation did not return a batch");
    };
    let rows: Vec<Vec<String>> = batch
        .forms
        .iter()
        .map(|f| {
            vec![f.id.clone(), f.template_name.clone(), f.status.to_string(), f.error().unwrap_or("").to_string()]
        })
        .collect();
    print_table(&["FORM", "TEMPLATE", "STATUS", "ERROR"], &rows);
    println!(
        "Batch {}: {} of {} completed, {} failed",
        batch.id, batch.completed_forms, batch.total_forms, batch.failed_forms
    );

    if !args.no_download && batch.completed().next().is_some() {
        let download = workflow.download_batch().await?;
        let dest = save_download(&download, args.out.as_deref())?;
        println!("Saved {}", dest.display());
    }
    Ok(())
}
