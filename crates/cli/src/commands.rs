//! Command handlers.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;

use salesbook_core::InvoiceId;
use salesbook_export::export;
use salesbook_invoicing::{Invoice, InvoiceDraft, ProfitRow, SalesReport};
use salesbook_store::backup;

use crate::app::App;
use crate::cli::{BackupCommand, Command, SettingsCommand};
use crate::output;

pub async fn run<W: Write>(app: &App, command: Command, refresh_interval: Duration, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::New(fields) => {
            let settings = app.settings().load().await;
            let mut draft = InvoiceDraft::blank(Utc::now());
            draft.company_name = settings.app_name.clone();
            fields.apply(&mut draft, &settings.shipping_rates);

            let id = app.store().create(draft).await.context("failed to create invoice")?;
            let invoice = find(app, &id).await?;
            writeln!(
                out,
                "created {id} ({}), total {}",
                invoice.invoice_number(),
                invoice.total().to_display_2dp()
            )?;
        }

        Command::Edit { id, fields } => {
            let settings = app.settings().load().await;
            // An unknown id starts from a blank form; the store's missing-record
            // policy decides whether that rejects, ignores or creates.
            let mut draft = match app.store().get(&id).await {
                Some(existing) => existing.to_draft(),
                None => {
                    let mut blank = InvoiceDraft::blank(Utc::now());
                    blank.company_name = settings.app_name.clone();
                    blank
                }
            };
            fields.apply(&mut draft, &settings.shipping_rates);

            app.store()
                .update(&id, draft)
                .await
                .with_context(|| format!("failed to update invoice {id}"))?;
            match app.store().get(&id).await {
                Some(invoice) => writeln!(out, "updated {id}, total {}", invoice.total().to_display_2dp())?,
                None => writeln!(out, "no invoice {id}; nothing changed")?,
            }
        }

        Command::SetPurchasePrice { id, amount, clear } => {
            let price = if clear { None } else { amount };
            app.store()
                .set_purchase_price(&id, price)
                .await
                .context("failed to set purchase price")?;
            match price {
                Some(p) => writeln!(out, "purchase price of {id} set to {}", p.to_display_2dp())?,
                None => writeln!(out, "purchase price of {id} cleared")?,
            }
        }

        Command::Delete { id } => {
            app.store().delete(&id).await.context("failed to delete invoice")?;
            writeln!(out, "deleted {id}")?;
        }

        Command::List { search } => {
            let invoices = match search.as_deref() {
                Some(term) => app.store().search(term).await,
                None => app.store().list().await.to_vec(),
            };
            writeln!(out, "{}", output::invoice_table(&invoices))?;
        }

        Command::Show { id } => {
            let invoice = find(app, &id).await?;
            writeln!(out, "{}", output::invoice_details(&invoice))?;
        }

        Command::Report => {
            let invoices = app.store().list().await;
            let report = SalesReport::from_invoices(invoices.iter());
            let rows: Vec<ProfitRow> = invoices.iter().map(ProfitRow::for_invoice).collect();
            writeln!(out, "{}", output::report_table(&report))?;
            writeln!(out, "{}", output::profit_table(&rows))?;
        }

        Command::Export { id, format, out: dir } => {
            let invoice = find(app, &id).await?;
            let document = export(&invoice, format).with_context(|| format!("failed to export {id} as {format}"))?;
            let path = dir.join(&document.file_name);
            write_file(&path, &document.bytes).await?;
            writeln!(out, "{}", path.display())?;
        }

        Command::Settings(cmd) => settings_command(app, cmd, out).await?,

        Command::Backup(cmd) => backup_command(app, cmd, out).await?,

        Command::Watch => {
            watch(app, refresh_interval, out, async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %err, "failed to listen for ctrl-c");
                }
            })
            .await?;
        }
    }
    Ok(())
}

async fn find(app: &App, id: &InvoiceId) -> anyhow::Result<Invoice> {
    app.store()
        .get(id)
        .await
        .with_context(|| format!("invoice {id} not found"))
}

async fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

async fn settings_command<W: Write>(app: &App, command: SettingsCommand, out: &mut W) -> anyhow::Result<()> {
    let store = app.settings();
    match command {
        SettingsCommand::Show => {
            let settings = store.load().await;
            writeln!(out, "{}", serde_json::to_string_pretty(&settings)?)?;
        }
        SettingsCommand::AppName { name } => {
            if name.trim().is_empty() {
                bail!("app name must not be empty");
            }
            store.save_app_name(&name).await.context("failed to save app name")?;
            writeln!(out, "app name set to {}", name.trim())?;
        }
        SettingsCommand::Rate {
            governorate,
            amount,
            clear,
        } => {
            let cost = if clear { None } else { amount };
            store
                .set_shipping_rate(governorate, cost)
                .await
                .context("failed to save shipping rate")?;
            match cost {
                Some(c) => writeln!(out, "shipping rate for {governorate} set to {}", c.to_display_2dp())?,
                None => writeln!(out, "shipping rate for {governorate} cleared")?,
            }
        }
    }
    Ok(())
}

async fn backup_command<W: Write>(app: &App, command: BackupCommand, out: &mut W) -> anyhow::Result<()> {
    match command {
        BackupCommand::Export { out: None } => {
            let invoices = app.store().list().await;
            writeln!(out, "{}", backup::encode(&invoices)?)?;
        }
        BackupCommand::Export { out: Some(path) } => {
            let invoices = app.store().list().await;
            write_file(&path, backup::encode(&invoices)?.as_bytes()).await?;
            writeln!(out, "backed up {} invoices to {}", invoices.len(), path.display())?;
        }
        BackupCommand::Import { file, yes } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let invoices = backup::decode(&raw).with_context(|| format!("invalid backup file {}", file.display()))?;

            let current = app.store().list().await.len();
            if !yes {
                bail!(
                    "importing {} invoices would replace the current {current}; re-run with --yes to confirm",
                    invoices.len()
                );
            }
            let count = invoices.len();
            app.store().replace_all(invoices).await.context("failed to import backup")?;
            writeln!(out, "imported {count} invoices (replaced {current})")?;
        }
    }
    Ok(())
}

/// Print one line per snapshot until `stop` resolves. The remote refresher
/// is stopped on every exit, including a failed write to `out`.
pub async fn watch<W, F>(app: &App, refresh_interval: Duration, out: &mut W, stop: F) -> anyhow::Result<()>
where
    W: Write,
    F: Future<Output = ()>,
{
    let mut subscription = app.store().subscribe();
    let refresher = app.remote_store().map(|remote| remote.spawn_refresh(refresh_interval));

    let printed = async {
        if let Some(snapshot) = subscription.current() {
            writeln!(out, "{}", output::snapshot_line(&snapshot))?;
        }

        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => break,
                next = subscription.changed() => match next {
                    Some(snapshot) => writeln!(out, "{}", output::snapshot_line(&snapshot))?,
                    None => break,
                },
            }
        }
        anyhow::Ok(())
    }
    .await;

    subscription.unsubscribe();
    if let (Some(remote), Some(task)) = (app.remote_store(), refresher) {
        remote.shutdown();
        let _ = task.await;
    }
    printed
}
