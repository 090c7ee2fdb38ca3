//! Terminal output for diagnostics, resource listings and schemas

use console::style;
use crdform_core::{Attribute, AttributeType, Schema};
use crdform_engine::{Diagnostic, Diagnostics, ResourceMetadata};

/// Print diagnostics one per line, grouped under the resource type
pub fn print_diagnostics(resource: &str, diagnostics: &Diagnostics) {
    println!();
    println!("{}", style(resource).cyan().bold());
    for diagnostic in diagnostics.iter() {
        print_diagnostic(diagnostic);
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let icon = if diagnostic.is_error() {
        style("✗").red()
    } else {
        style("⚠").yellow()
    };
    let at = match &diagnostic.attribute {
        Some(attribute) => format!(" at {}", style(attribute).dim()),
        None => String::new(),
    };
    println!("  {} {}{}", icon, diagnostic.summary, at);
    if !diagnostic.detail.is_empty() {
        println!("    {} {}", style("detail:").blue(), diagnostic.detail);
    }
}

pub fn print_summary(diagnostics: &Diagnostics) {
    let errors = diagnostics.errors().count();
    let warnings = diagnostics.warnings().count();

    if errors == 0 && warnings == 0 {
        println!("{} Configuration is valid", style("✓").green().bold());
    } else if errors == 0 {
        println!(
            "{} Configuration is valid with {} warning(s)",
            style("✓").green().bold(),
            warnings
        );
    } else {
        println!(
            "{} Found {} error(s) and {} warning(s)",
            style("✗").red().bold(),
            errors,
            warnings
        );
    }
}

pub fn print_resources(resources: &[&ResourceMetadata]) {
    if resources.is_empty() {
        println!("No resource types registered");
        return;
    }

    let width = resources
        .iter()
        .map(|r| r.type_name.len())
        .max()
        .unwrap_or(0);
    println!(
        "{:<width$}  {:<32}  {}",
        style("TYPE").bold(),
        style("API VERSION").bold(),
        style("KIND").bold(),
        width = width
    );
    for resource in resources {
        let kind = if resource.namespaced {
            resource.kind.clone()
        } else {
            format!("{} (cluster)", resource.kind)
        };
        println!(
            "{:<width$}  {:<32}  {}",
            resource.type_name,
            resource.api_version,
            kind,
            width = width
        );
    }
}

/// Attribute tree with configuration names
pub fn print_schema(type_name: &str, schema: &Schema) {
    println!("{}", style(type_name).cyan().bold());
    if let Some(description) = &schema.description {
        println!("  {}", style(description).dim());
    }
    println!();
    for (name, attribute) in &schema.attributes {
        print_attribute(&attribute.config_name(name), attribute, 1);
    }
}

fn print_attribute(name: &str, attribute: &Attribute, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut flags = Vec::new();
    if attribute.required {
        flags.push("required".to_string());
    }
    if attribute.computed {
        flags.push("computed".to_string());
    }
    if let Some(format) = &attribute.format {
        flags.push(format!("format={format}"));
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    println!(
        "{}{} {}{}",
        indent,
        style(name).bold(),
        style(type_label(attribute)).green(),
        style(flags).yellow()
    );
    if let Some(description) = &attribute.description {
        println!("{}  {}", indent, style(description).dim());
    }

    let children = match (&attribute.attr_type, &attribute.items) {
        (AttributeType::Object, _) => Some(&attribute.properties),
        (AttributeType::List, Some(items)) if items.attr_type == AttributeType::Object => {
            Some(&items.properties)
        }
        _ => None,
    };
    for (child, child_attr) in children.into_iter().flatten() {
        print_attribute(&child_attr.config_name(child), child_attr, depth + 1);
    }
}

fn type_label(attribute: &Attribute) -> String {
    match (&attribute.attr_type, &attribute.items) {
        (AttributeType::List, Some(items)) => format!("list({})", items.attr_type),
        (attr_type, _) => attr_type.to_string(),
    }
}
