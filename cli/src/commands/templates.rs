//! Template commands

use anyhow::{bail, Context};
use serde_json::Value;
use std::fs;
use std::io::{self, BufRead, Write};
use tabled::Tabled;

use crate::output::{print_notices, print_table, OutputFormat};
use crate::TemplateCommands;
use review_forms::{
    render_form, BuilderAction, DeletePrompt, FieldDefinition, FieldType, Responses, Template,
    TemplateBuilder, TemplateId,
};

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Active")]
    active: &'static str,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Template> for TemplateRow {
    fn from(t: &Template) -> Self {
        Self {
            id: t.id().map(|id| id.to_string()).unwrap_or_default(),
            name: t.name().to_string(),
            fields: t.fields().len(),
            active: if t.is_active() { "yes" } else { "" },
            updated: t
                .updated_at()
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "#")]
    order: u32,
    #[tabled(rename = "Type")]
    field_type: FieldType,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Required")]
    required: &'static str,
    #[tabled(rename = "Options")]
    options: String,
}

impl From<&FieldDefinition> for FieldRow {
    fn from(f: &FieldDefinition) -> Self {
        Self {
            order: f.order,
            field_type: f.field_type,
            label: f.label.clone(),
            required: if f.is_required { "yes" } else { "" },
            options: f
                .options()
                .iter()
                .map(|o| o.value.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub async fn handle(action: TemplateCommands, mut builder: TemplateBuilder, format: OutputFormat) -> anyhow::Result<()> {
    let result = run(action, &mut builder, format).await;
    print_notices(&builder.take_notices());
    result
}

async fn run(action: TemplateCommands, builder: &mut TemplateBuilder, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        TemplateCommands::List => {
            builder.refresh().await?;
            let templates = builder.state().templates();
            format.print(&templates, templates.iter().map(TemplateRow::from).collect())?;
        }
        TemplateCommands::Show { id } => {
            let template = fetch(builder, &id).await?;
            if format == OutputFormat::Table {
                print_table(vec![TemplateRow::from(&template)]);
            }
            format.print(&template, template.fields().iter().map(FieldRow::from).collect())?;
        }
        TemplateCommands::New {
            name,
            description,
            fields,
            review_url,
        } => {
            let field_types = fields
                .iter()
                .map(|f| f.parse::<FieldType>())
                .collect::<Result<Vec<_>, _>>()?;

            builder.start().await;
            builder.dispatch(BuilderAction::SetName(name));
            if let Some(description) = description {
                builder.dispatch(BuilderAction::SetDescription(description));
            }
            if let Some(url) = review_url {
                builder.dispatch(BuilderAction::SetReviewUrl(url));
            }
            if !field_types.is_empty() {
                while let Some(id) = builder.state().working().fields().first().map(|f| f.id.clone()) {
                    builder.dispatch(BuilderAction::RemoveField(id));
                }
                for field_type in field_types {
                    builder.dispatch(BuilderAction::AddField(field_type));
                }
                builder.dispatch(BuilderAction::CloseEditor);
            }

            let saved = builder.save().await?;
            println!("Created template: {}", saved.id().map(|id| id.as_str()).unwrap_or_default());
        }
        TemplateCommands::Import { file } => {
            let content = fs::read_to_string(&file).with_context(|| format!("reading {}", file))?;
            let value: Value = if file.ends_with(".yaml") || file.ends_with(".yml") {
                serde_yaml::from_str(&content)?
            } else {
                serde_json::from_str(&content)?
            };
            let saved = import(builder, value).await?;
            println!("Imported template: {}", saved.id().map(|id| id.as_str()).unwrap_or_default());
        }
        TemplateCommands::Export { id } => {
            let template = fetch(builder, &id).await?;
            format.print_document(&template)?;
        }
        TemplateCommands::Render { id, mode } => {
            let template = fetch(builder, &id).await?;
            println!("{}", render_form(&template, mode.into(), &Responses::new()).into_string());
        }
        TemplateCommands::Delete { id, yes } => {
            builder.refresh().await?;
            builder.delete(&TemplateId::new(id), |prompt| yes || confirm(prompt)).await?;
        }
        TemplateCommands::Activate { id } => {
            let id = TemplateId::new(id);
            if !builder.activate(&id).await {
                bail!("could not activate template {}", id);
            }
            println!("Activated template: {}", id);
        }
    }
    Ok(())
}

async fn import(builder: &mut TemplateBuilder, mut value: Value) -> anyhow::Result<Template> {
    prepare_import(&mut value, builder.state().business_id().as_str())?;
    let template: Template = serde_json::from_value(value).context("invalid template file")?;

    builder.start().await;
    builder.dispatch(BuilderAction::Load(template));
    Ok(builder.save().await?)
}

async fn fetch(builder: &mut TemplateBuilder, id: &str) -> anyhow::Result<Template> {
    builder.refresh().await?;
    builder.load(&TemplateId::new(id))?;
    Ok(builder.state().working().clone())
}

fn confirm(prompt: &DeletePrompt) -> bool {
    eprint!("{} [y/N] ", prompt.message);
    io::stderr().flush().ok();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Turn an exported template into a new one for `business_id`. Field ids are
/// made local so the store assigns fresh ones; conditionals follow the rename.
fn prepare_import(value: &mut Value, business_id: &str) -> anyhow::Result<()> {
    let Some(object) = value.as_object_mut() else {
        bail!("template file must contain an object");
    };
    for key in ["id", "isActive", "createdAt", "updatedAt"] {
        object.remove(key);
    }
    object.insert("businessId".into(), Value::String(business_id.to_string()));

    let Some(fields) = object.get_mut("fields").and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for field in fields {
        if let Some(id) = field.get_mut("id") {
            localize(id);
        }
        if let Some(target) = field.get_mut("conditional").and_then(|c| c.get_mut("fieldId")) {
            localize(target);
        }
    }
    Ok(())
}

fn localize(id: &mut Value) {
    let raw = match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return,
    };
    if !raw.starts_with("local-") {
        *id = Value::String(format!("local-{}", raw));
    }
}
