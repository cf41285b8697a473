use super::save_download;
use crate::console::print_table;
use crate::context::Context;
use anyhow::Context as _;
use clap::Subcommand;
use pdfdesk_core::error::ApiError;
use pdfdesk_core::model::template::PdfFile;
use pdfdesk_core::model::{ListQuery, TemplateCategory};
use pdfdesk_core::registry::{TemplateBoard, TemplateFilter, TemplateRegistry};
use pdfdesk_core::validation::TemplateForm;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum TemplatesCommand {
    /// List templates
    List {
        /// broker, boclife or chubb
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        page: Option<u32>,
    },
    /// Upload a new PDF template
    Upload {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// broker, boclife or chubb
        #[arg(long)]
        category: String,

        /// fna, application, agreement or payment
        #[arg(long)]
        form_type: String,

        /// broker or insurance
        #[arg(long)]
        affiliation: String,

        #[arg(long)]
        version: String,

        #[arg(long)]
        inactive: bool,
    },
    /// Show which templates can be deleted
    Deletable {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Delete a template that no form set uses
    Delete { id: String },
    /// Save a template's PDF
    Download {
        id: String,

        /// Directory to write into
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn filter(category: Option<&str>, page: Option<u32>) -> anyhow::Result<TemplateFilter> {
    Ok(TemplateFilter {
        category: category.map(str::parse::<TemplateCategory>).transpose()?,
        is_active: None,
        list: ListQuery { page, ..ListQuery::default() },
    })
}

pub async fn run(ctx: &Context, command: TemplatesCommand) -> anyhow::Result<()> {
    ctx.require_session()?;
    let registry = TemplateRegistry::new(ctx.client.clone());

    match command {
        TemplatesCommand::List { category, page } => {
            let templates = registry.list(&filter(category.as_deref(), page)?).await?;
            let rows: Vec<Vec<String>> = templates
                .results
                .iter()
                .map(|t| {
                    vec![
                        t.id.clone(),
                        t.name.clone(),
                        t.category.to_string(),
                        t.form_type.map(|f| f.to_string()).unwrap_or_default(),
                        t.version.clone(),
                        if t.is_active { "yes".into() } else { "no".into() },
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "CATEGORY", "FORM TYPE", "VERSION", "ACTIVE"], &rows);
        }
        TemplatesCommand::Upload {
            file,
            name,
            description,
            category,
            form_type,
            affiliation,
            version,
            inactive,
        } => {
            let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "template.pdf".to_string());
            let form = TemplateForm {
                name,
                description,
                category,
                form_type,
                form_affiliation: affiliation,
                version,
                is_active: !inactive,
                file: Some(PdfFile::new(file_name, bytes)),
            };
            let template = registry.create(&form).await?;
            println!("Uploaded template {} ({})", template.name, template.id);
        }
        TemplatesCommand::Deletable { page } => {
            let mut board = TemplateBoard::new(registry);
            board.load(&filter(None, page)?).await?;
            let rows: Vec<Vec<String>> = board
                .templates()
                .iter()
                .map(|t| {
                    let status = if board.can_delete(&t.id) { "deletable" } else { "in use" };
                    vec![t.id.clone(), t.name.clone(), status.to_string()]
                })
                .collect();
            print_table(&["ID", "NAME", "STATUS"], &rows);
        }
        TemplatesCommand::Delete { id } => match registry.delete(&id, ctx.confirm()).await {
            Ok(()) => println!("Deleted template {}", id),
            Err(ApiError::Cancelled) => println!("Cancelled"),
            Err(ApiError::NotDeletable(_)) => {
                anyhow::bail!("Template {} is used by a form set and cannot be deleted", id)
            }
            Err(err) => return Err(err.into()),
        },
        TemplatesCommand::Download { id, out } => {
            let download = registry.download(&id).await?;
            let dest = save_download(&download, out.as_deref())?;
            println!("Saved {}", dest.display());
        }
    }
    Ok(())
}
