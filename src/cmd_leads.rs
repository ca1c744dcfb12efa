//! Lead Store subcommand handlers for LeadFlow.

use tracing::info;

use leadflow_config::Config;
use leadflow_protocols::{LeadRecord, LeadStore, NewLead};

use crate::cli::LeadsAction;
use crate::server::{open_lead_store, open_storage, BoxError};

/// Handle leads subcommands.
pub(crate) async fn handle_leads_command(action: LeadsAction, config: &Config) -> Result<(), BoxError> {
    let (_, settings) = open_storage(config).await?;
    let store = open_lead_store(config, &settings)?;
    if !store.is_configured() {
        return Err("Lead store endpoint is not configured".into());
    }

    match action {
        LeadsAction::List { all, format } => leads_list(store.as_ref(), all, &format).await,
        LeadsAction::Probe => leads_probe(store.as_ref()).await,
        LeadsAction::Add {
            given_name,
            last_name,
            email,
            mobile,
            telephone,
            notes,
        } => {
            let lead = NewLead {
                given_name,
                last_name,
                email: email.unwrap_or_default(),
                mobile: mobile.unwrap_or_default(),
                telephone: telephone.unwrap_or_default(),
                source_notes: notes.unwrap_or_default(),
                ..Default::default()
            };
            leads_add(store.as_ref(), &lead).await
        }
    }
}

async fn leads_list(store: &dyn LeadStore, all: bool, format: &str) -> Result<(), BoxError> {
    let leads = if all {
        store.all_leads().await?
    } else {
        store.unprocessed_leads().await?
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&leads)?);
        return Ok(());
    }

    if leads.is_empty() {
        println!("No leads found.");
        return Ok(());
    }

    println!("{:<6} {:<28} {:<32} {:<14} PROCESSED", "ROW", "NAME", "EMAIL", "MOBILE");
    println!("{}", "-".repeat(92));
    for lead in &leads {
        println!("{}", format_lead_row(lead));
    }
    println!("\nTotal: {} lead(s)", leads.len());
    Ok(())
}

async fn leads_probe(store: &dyn LeadStore) -> Result<(), BoxError> {
    let summary = store.probe().await?;
    println!("Connected to sheet '{}'", summary.sheet_name);
    println!("  Leads:   {}", summary.last_row.saturating_sub(1));
    println!("  Columns: {}", summary.last_column);
    Ok(())
}

async fn leads_add(store: &dyn LeadStore, lead: &NewLead) -> Result<(), BoxError> {
    let row_index = store.add_lead(lead).await?;
    info!("Added lead {} {} at row {}", lead.given_name, lead.last_name, row_index);
    println!("Added lead at row {}", row_index);
    Ok(())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(width.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

fn format_lead_row(lead: &LeadRecord) -> String {
    format!(
        "{:<6} {:<28} {:<32} {:<14} {}",
        lead.row_index,
        truncate(&lead.display_name(), 28),
        truncate(&lead.email, 32),
        truncate(&lead.mobile, 14),
        lead.processed.as_deref().unwrap_or("-"),
    )
}
