//! Command dispatch. Each command runs on an already logged-in service.

use anyhow::{Context as _, Result};

use registrobr_core::ReconciliationService;
use registrobr_provider::{RecordType, codec};

use crate::args::Commands;
use crate::output;

pub async fn execute(svc: &mut ReconciliationService, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Domains => domains(svc, json).await,
        Commands::ZoneInfo { domain } => zone_info(svc, &domain, json).await,
        Commands::AddRecord {
            domain,
            record_type,
            ownername,
            value,
            dry_run,
        } => add_record(svc, &domain, record_type, &ownername, &value, dry_run, json).await,
        Commands::DeleteRecord {
            domain,
            index,
            dry_run,
        } => delete_record(svc, &domain, index, dry_run, json).await,
    }
}

async fn domains(svc: &mut ReconciliationService, json: bool) -> Result<()> {
    let domains = svc.repository_mut().list_domains().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&domains)?);
    } else {
        print!("{}", output::render_domains(&domains));
    }
    Ok(())
}

async fn zone_info(svc: &mut ReconciliationService, domain: &str, json: bool) -> Result<()> {
    let fqdn = svc.repository_mut().find_domain(domain).await?.fqdn;
    let zone = svc.repository_mut().zone_info(&fqdn, false).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(zone.records())?);
    } else {
        print!("{}", output::render_records(&fqdn, zone.records()));
    }
    Ok(())
}

async fn add_record(
    svc: &mut ReconciliationService,
    domain: &str,
    record_type: RecordType,
    ownername: &str,
    value: &str,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let record = codec::from_user_input(record_type, ownername, value)
        .with_context(|| format!("invalid {record_type} record"))?;
    let fqdn = svc.repository_mut().find_domain(domain).await?.fqdn;
    svc.repository_mut().zone_info(&fqdn, false).await?;
    svc.stage(&fqdn, record)?;
    commit(svc, &fqdn, dry_run, json).await
}

async fn delete_record(
    svc: &mut ReconciliationService,
    domain: &str,
    index: usize,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let fqdn = svc.repository_mut().find_domain(domain).await?.fqdn;
    svc.repository_mut().zone_info(&fqdn, false).await?;
    let outcome = svc.mark_for_deletion(&fqdn, index)?;
    tracing::debug!(?outcome, index, "marked for deletion");
    commit(svc, &fqdn, dry_run, json).await
}

/// Print the pending lists, and save unless this is a dry run.
async fn commit(svc: &mut ReconciliationService, fqdn: &str, dry_run: bool, json: bool) -> Result<()> {
    let changes = if dry_run {
        svc.pending_changes(fqdn)?
    } else {
        svc.save(fqdn).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }

    print!("{}", output::render_pending(&changes));
    if !dry_run {
        let records = svc.list_pending(fqdn)?;
        print!("{}", output::render_records(fqdn, records));
    }
    Ok(())
}
