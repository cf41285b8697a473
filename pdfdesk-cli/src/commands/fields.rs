use crate::console::print_table;
use crate::context::Context;
use clap::Subcommand;
use pdfdesk_core::error::ApiError;
use pdfdesk_core::model::{FieldCategory, ListQuery};
use pdfdesk_core::ordering::{DisplayOrderManager, ReorderOutcome};
use pdfdesk_core::registry::{CategoryRegistry, FieldFilter, FieldRegistry};
use pdfdesk_core::validation::StandardizedFieldForm;

#[derive(Subcommand)]
pub enum FieldsCommand {
    /// List fields
    List {
        /// Subject category: client, user or broker
        #[arg(long)]
        category: Option<String>,

        /// Display category name
        #[arg(long)]
        display_category: Option<String>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        page: Option<u32>,
    },
    /// Create a field
    Create {
        /// Machine key, snake_case
        #[arg(long)]
        name: String,

        #[arg(long)]
        label: String,

        #[arg(long = "type")]
        field_type: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        display_category: String,

        #[arg(long)]
        required: bool,

        #[arg(long)]
        definition: Option<String>,
    },
    /// Delete a field
    Delete { id: String },
    /// Move a field within its display category (1-based positions)
    Reorder {
        #[arg(long)]
        display_category: String,

        #[arg(long)]
        from: usize,

        #[arg(long)]
        to: usize,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommand {
    /// List display categories
    List,
}

pub async fn run(ctx: &Context, command: FieldsCommand) -> anyhow::Result<()> {
    ctx.require_session()?;
    let registry = FieldRegistry::new(ctx.client.clone());

    match command {
        FieldsCommand::List { category, display_category, search, page } => {
            let filter = FieldFilter {
                category: category.as_deref().map(str::parse::<FieldCategory>).transpose()?,
                display_category,
                is_active: None,
                list: ListQuery { search, page, ..ListQuery::default() },
            };
            let fields = registry.list(&filter).await?;
            let rows: Vec<Vec<String>> = fields
                .results
                .iter()
                .map(|f| {
                    vec![
                        f.id.clone(),
                        f.name.clone(),
                        f.label.clone(),
                        f.field_type.to_string(),
                        f.display_category.clone().unwrap_or_default(),
                        f.display_order.map(|o| o.to_string()).unwrap_or_else(|| "-".into()),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "LABEL", "TYPE", "DISPLAY CATEGORY", "ORDER"], &rows);
            println!("{} of {} field(s)", fields.results.len(), fields.count);
        }
        FieldsCommand::Create { name, label, field_type, category, display_category, required, definition } => {
            let form = StandardizedFieldForm {
                name,
                label,
                field_type,
                field_category: category,
                display_category,
                is_required: required,
                field_definition: definition.unwrap_or_default(),
                ..StandardizedFieldForm::default()
            };
            let field = registry.create(&form).await?;
            println!("Created field {} ({})", field.name, field.id);
        }
        FieldsCommand::Delete { id } => {
            let field = registry.get(&id).await?;
            match registry.delete(&field, ctx.confirm()).await {
                Ok(()) => println!("Deleted field {}", field.name),
                Err(ApiError::Cancelled) => println!("Cancelled"),
                Err(err) => return Err(err.into()),
            }
        }
        FieldsCommand::Reorder { display_category, from, to } => {
            if from == 0 || to == 0 {
                anyhow::bail!("Positions start at 1");
            }
            let mut manager = DisplayOrderManager::new(registry, ctx.notifier.clone());
            manager.select_category(&display_category).await?;
            match manager.move_to(from - 1, to - 1).await? {
                ReorderOutcome::Unchanged => println!("Nothing to reorder"),
                ReorderOutcome::Saved { .. } => {
                    for (i, field) in manager.fields().iter().enumerate() {
                        println!("{:>3}. {}", i + 1, field.label);
                    }
                }
                ReorderOutcome::Resynced { failed } => {
                    anyhow::bail!("{} display order update(s) failed; order reloaded from server", failed)
                }
            }
        }
    }
    Ok(())
}

pub async fn run_categories(ctx: &Context, command: CategoriesCommand) -> anyhow::Result<()> {
    ctx.require_session()?;
    let registry = CategoryRegistry::new(ctx.client.clone());

    match command {
        CategoriesCommand::List => {
            let categories = registry.list(&ListQuery::default()).await?;
            let rows: Vec<Vec<String>> = categories
                .results
                .iter()
                .map(|c| vec![c.id.clone(), c.name.clone(), c.description.clone().unwrap_or_default()])
                .collect();
            print_table(&["ID", "NAME", "DESCRIPTION"], &rows);
        }
    }
    Ok(())
}
