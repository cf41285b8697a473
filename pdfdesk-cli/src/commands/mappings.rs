use crate::console::print_table;
use crate::context::Context;
use clap::Subcommand;
use pdfdesk_core::model::Binding;
use pdfdesk_core::registry::FieldMappingLayer;
use pdfdesk_core::validation::FieldMappingForm;

#[derive(Subcommand)]
pub enum MappingsCommand {
    /// List a template's mappings
    List { template: String },
    /// Bind a PDF field
    Add {
        template: String,

        /// AcroForm field name inside the PDF
        #[arg(long)]
        pdf_field: String,

        #[arg(long)]
        system_field: String,

        #[arg(long = "type")]
        field_type: String,

        /// Registry field id; takes precedence over the system field name
        #[arg(long)]
        standardized_field: Option<String>,
    },
    /// Validate a template's mappings on the server
    Validate { template: String },
}

pub async fn run(ctx: &Context, command: MappingsCommand) -> anyhow::Result<()> {
    ctx.require_session()?;
    let layer = FieldMappingLayer::new(ctx.client.clone());

    match command {
        MappingsCommand::List { template } => {
            let mappings = layer.list(&template).await?;
            let rows: Vec<Vec<String>> = mappings
                .iter()
                .map(|m| {
                    let binding = match m.binding() {
                        Binding::Standardized(id) => format!("field #{}", id),
                        Binding::System(name) => name.to_string(),
                        Binding::Unbound => "-".to_string(),
                    };
                    let field_type = m.field_type.map(|t| t.to_string()).unwrap_or_default();
                    vec![m.id.clone(), m.pdf_field_name.clone(), binding, field_type]
                })
                .collect();
            print_table(&["ID", "PDF FIELD", "BOUND TO", "TYPE"], &rows);
        }
        MappingsCommand::Add { template, pdf_field, system_field, field_type, standardized_field } => {
            let form = FieldMappingForm {
                pdf_field_name: pdf_field,
                system_field_name: system_field,
                standardized_field_id: standardized_field,
                field_type,
                ..FieldMappingForm::default()
            };
            let mapping = layer.create(&template, &form).await?;
            println!("Mapped {} ({})", mapping.pdf_field_name, mapping.id);
        }
        MappingsCommand::Validate { template } => {
            let report = layer.validate(&template).await?;
            if report.valid {
                println!("All mappings are valid");
                return Ok(());
            }
            for (key, messages) in report.errors.iter() {
                for message in messages {
                    println!("{}: {}", key, message);
                }
            }
            for message in &report.general {
                println!("{}", message);
            }
            anyhow::bail!("Template {} has invalid mappings", template);
        }
    }
    Ok(())
}
