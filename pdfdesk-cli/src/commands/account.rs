use crate::console::print_table;
use crate::context::Context;
use pdfdesk_core::quota::{QuotaGauge, QuotaLevel, QuotaService};
use pdfdesk_core::registry::UserAdmin;

fn gauge_line(label: &str, gauge: Option<QuotaGauge>) -> String {
    match gauge {
        Some(gauge) => {
            let marker = match gauge.level() {
                QuotaLevel::Critical => " (critical)",
                QuotaLevel::Warning => " (warning)",
                QuotaLevel::Normal => "",
            };
            format!("{}: {}{}", label, gauge, marker)
        }
        None => format!("{}: no quota", label),
    }
}

pub async fn quota(ctx: &Context) -> anyhow::Result<()> {
    ctx.require_session()?;
    let snapshot = QuotaService::new(ctx.client.clone()).snapshot().await?;
    println!("{}", gauge_line("Daily", snapshot.daily));
    println!("{}", gauge_line("Monthly", snapshot.monthly));
    Ok(())
}

pub async fn activity(ctx: &Context, user: Option<&str>, limit: u32) -> anyhow::Result<()> {
    ctx.require_session()?;
    let feed = UserAdmin::new(ctx.client.clone()).activity(user, limit).await?;
    let rows: Vec<Vec<String>> = feed
        .iter()
        .map(|a| {
            vec![a.timestamp.format("%Y-%m-%d %H:%M").to_string(), a.kind.to_string(), a.description.clone()]
        })
        .collect();
    print_table(&["WHEN", "TYPE", "DESCRIPTION"], &rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_lines() {
        assert_eq!(gauge_line("Daily", Some(QuotaGauge::new(95, Some(100)))), "Daily: 95 / 100 (95%) (critical)");
        assert_eq!(gauge_line("Monthly", None), "Monthly: no quota");
    }
}
