use crate::console::print_table;
use crate::context::Context;
use clap::Subcommand;
use pdfdesk_core::model::ListQuery;
use pdfdesk_core::registry::FormSetComposer;
use pdfdesk_core::validation::FormSetForm;

#[derive(Subcommand)]
pub enum FormSetsCommand {
    /// List form sets
    List,
    /// Bundle templates into a form set
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Template id; repeat for each member
        #[arg(long = "template")]
        templates: Vec<String>,
    },
}

pub async fn run(ctx: &Context, command: FormSetsCommand) -> anyhow::Result<()> {
    ctx.require_session()?;
    let composer = FormSetComposer::new(ctx.client.clone());

    match command {
        FormSetsCommand::List => {
            let sets = composer.list(&ListQuery::default()).await?;
            let rows: Vec<Vec<String>> = sets
                .results
                .iter()
                .map(|s| {
                    let names: Vec<&str> = s.templates.iter().map(|t| t.name.as_str()).collect();
                    vec![s.id.clone(), s.name.clone(), names.join(", ")]
                })
                .collect();
            print_table(&["ID", "NAME", "TEMPLATES"], &rows);
        }
        FormSetsCommand::Create { name, description, templates } => {
            let form = FormSetForm { name, description, template_ids: templates };
            let set = composer.create(&form).await?;
            println!("Created form set {} ({}) with {} template(s)", set.name, set.id, set.templates.len());
        }
    }
    Ok(())
}
