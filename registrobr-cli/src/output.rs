//! Text rendering for domains, zones and pending changes.

use registrobr_core::{ChangeState, PendingChanges, RecordState};
use registrobr_provider::Domain;

fn state_marker(state: ChangeState) -> &'static str {
    match state {
        ChangeState::Unchanged => " ",
        ChangeState::Add => "+",
        ChangeState::Delete => "-",
    }
}

pub fn render_domains(domains: &[Domain]) -> String {
    if domains.is_empty() {
        return "No domains.\n".to_string();
    }
    let width = domains.iter().map(|d| d.fqdn.len()).max().unwrap_or(0);
    let mut out = String::new();
    for d in domains {
        let expires = d
            .expiration()
            .map_or_else(|| d.expiration_date.clone(), |date| date.to_string());
        out.push_str(&format!(
            "{:<width$}  {:<12}  expires {expires}\n",
            d.fqdn, d.status
        ));
    }
    out
}

/// One line per record, prefixed with its index and a `+`/`-` change marker.
pub fn render_records(fqdn: &str, records: &[RecordState]) -> String {
    let mut out = format!("{fqdn} ({} records)\n", records.len());
    for (i, entry) in records.iter().enumerate() {
        out.push_str(&format!(
            "{} [{i:>3}] {}\n",
            state_marker(entry.state()),
            entry.record()
        ));
    }
    out
}

pub fn render_pending(changes: &PendingChanges) -> String {
    if changes.is_empty() {
        return "No pending changes.\n".to_string();
    }
    let mut out = String::new();
    for (i, wire) in changes.removals.iter().enumerate() {
        out.push_str(&format!("remove-rr-{i} = {wire}\n"));
    }
    for (i, wire) in changes.additions.iter().enumerate() {
        out.push_str(&format!("add-rr-{i} = {wire}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_lists_removals_first() {
        let changes = PendingChanges {
            additions: vec!["www|A|5.6.7.8".to_string()],
            removals: vec!["www|A|1.2.3.4".to_string()],
        };
        assert_eq!(
            render_pending(&changes),
            "remove-rr-0 = www|A|1.2.3.4\nadd-rr-0 = www|A|5.6.7.8\n"
        );
        assert_eq!(
            render_pending(&PendingChanges::default()),
            "No pending changes.\n"
        );
    }

    #[test]
    fn domains_table() {
        let domains: Vec<Domain> = serde_json::from_str(
            r#"[{"Id":1,"FQDN":"example.com.br","ExpirationDate":"2027-05-10T00:00:00","Status":"Publicado","Contact":null,"PayLink":null,"Auctionable":false}]"#,
        )
        .unwrap();
        let text = render_domains(&domains);
        assert!(text.starts_with("example.com.br  Publicado"));
        assert!(text.contains("expires 2027-05-10"));
    }
}
