use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use salesbook_cli::{App, Cli, commands};
use salesbook_core::Money;
use salesbook_store::{
    DocumentBackend, InMemoryDocumentBackend, InMemoryKeyValueStore, KeyValueStore, MissingRecordPolicy, StoreConfig,
};

async fn local_app() -> App {
    local_app_with(MissingRecordPolicy::default()).await
}

async fn local_app_with(policy: MissingRecordPolicy) -> App {
    let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
    App::local(kv, StoreConfig::default().with_missing_record(policy)).await
}

const GHOST_EDIT: &[&str] = &["edit", "ghost", "--customer", "A", "--product", "P", "--price", "5"];

async fn run(app: &App, argv: &[&str]) -> anyhow::Result<String> {
    let mut full = vec!["salesbook"];
    full.extend_from_slice(argv);
    let cli = Cli::try_parse_from(full)?;
    let mut out = Vec::new();
    commands::run(app, cli.command, Duration::from_millis(10), &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn new_invoice_uses_settings_for_company_and_shipping() {
    let app = local_app().await;
    run(&app, &["settings", "app-name", "Mrs Fashion"]).await.unwrap();
    run(&app, &["settings", "rate", "Giza", "40"]).await.unwrap();

    let printed = run(
        &app,
        &[
            "new", "--customer", "Hoda", "--product", "Scarf", "--price", "120", "--quantity", "2",
            "--governorate", "giza",
        ],
    )
    .await
    .unwrap();
    assert!(printed.contains("total 280.00"), "{printed}");

    let invoices = app.store().list().await;
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].details().company_name, "Mrs Fashion");
    assert_eq!(invoices[0].shipping_cost(), Money::from_units(40));
}

#[tokio::test]
async fn edit_patches_only_given_fields() {
    let app = local_app().await;
    run(&app, &["new", "--customer", "Hoda", "--product", "Scarf", "--price", "100", "--number", "INV-000777"])
        .await
        .unwrap();
    let id = app.store().list().await[0].id().to_string();

    run(&app, &["edit", &id, "--price", "150"]).await.unwrap();
    let invoice = app.store().list().await[0].clone();
    assert_eq!(invoice.id().as_str(), id);
    assert_eq!(invoice.invoice_number(), "INV-000777");
    assert_eq!(invoice.customer_name(), "Hoda");
    assert_eq!(invoice.total(), Money::from_units(150));
}

#[tokio::test]
async fn edit_of_unknown_id_follows_missing_record_policy() {
    let app = local_app_with(MissingRecordPolicy::Reject).await;
    assert!(run(&app, GHOST_EDIT).await.is_err());
    assert!(app.store().list().await.is_empty());

    let app = local_app_with(MissingRecordPolicy::Ignore).await;
    let printed = run(&app, GHOST_EDIT).await.unwrap();
    assert!(printed.contains("nothing changed"), "{printed}");
    assert!(app.store().list().await.is_empty());

    let app = local_app_with(MissingRecordPolicy::Upsert).await;
    run(&app, &["settings", "app-name", "Mrs Fashion"]).await.unwrap();
    let printed = run(&app, GHOST_EDIT).await.unwrap();
    assert!(printed.contains("total 5.00"), "{printed}");
    let invoices = app.store().list().await;
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].id().as_str(), "ghost");
    assert_eq!(invoices[0].details().company_name, "Mrs Fashion");
}

#[tokio::test]
async fn out_of_range_amount_is_rejected_not_a_crash() {
    let app = local_app().await;
    let result = run(
        &app,
        &["new", "--customer", "A", "--product", "P", "--price", "79228162514264337593543950335", "--quantity", "2"],
    )
    .await;
    assert!(result.is_err());
    assert!(app.store().list().await.is_empty());
}

#[tokio::test]
async fn report_shows_unknown_profit_for_uncosted_invoices() {
    let app = local_app().await;
    run(&app, &["new", "--customer", "A", "--product", "Dress", "--price", "100"]).await.unwrap();
    let id = app.store().list().await[0].id().to_string();
    run(&app, &["new", "--customer", "B", "--product", "Bag", "--price", "50"]).await.unwrap();
    run(&app, &["set-purchase-price", &id, "60"]).await.unwrap();

    let report = run(&app, &["report"]).await.unwrap();
    assert!(report.contains("150.00"), "{report}");
    assert!(report.contains("40.00"), "{report}");
    assert!(report.contains(" - "), "{report}");
}

#[tokio::test]
async fn backup_import_requires_confirmation() {
    let app = local_app().await;
    run(&app, &["new", "--customer", "A", "--product", "Dress", "--price", "10"]).await.unwrap();
    let backup = run(&app, &["backup", "export"]).await.unwrap();

    let path = std::env::temp_dir().join(format!("salesbook-backup-{}.json", salesbook_core::InvoiceId::generate()));
    std::fs::write(&path, backup.trim()).unwrap();
    let path_str = path.to_string_lossy().to_string();

    let other = local_app().await;
    assert!(run(&other, &["backup", "import", &path_str]).await.is_err());
    assert!(other.store().list().await.is_empty());

    run(&other, &["backup", "import", &path_str, "--yes"]).await.unwrap();
    assert_eq!(other.store().list().await.to_vec(), app.store().list().await.to_vec());

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn export_writes_named_file() {
    let app = local_app().await;
    run(&app, &["new", "--customer", "A", "--product", "Dress", "--price", "10", "--number", "INV-000123"])
        .await
        .unwrap();
    let id = app.store().list().await[0].id().to_string();

    let dir = std::env::temp_dir().join(format!("salesbook-export-{}", salesbook_core::InvoiceId::generate()));
    let dir_str = dir.to_string_lossy().to_string();
    let printed = run(&app, &["export", &id, "--format", "word", "--out", &dir_str]).await.unwrap();

    assert!(printed.trim().ends_with("Invoice_INV-000123.doc"));
    assert!(dir.join("Invoice_INV-000123.doc").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn unknown_invoice_is_an_error() {
    let app = local_app().await;
    assert!(run(&app, &["show", "missing"]).await.is_err());
    assert!(run(&app, &["delete", "missing"]).await.is_ok());
}

#[tokio::test]
async fn watch_follows_remote_changes_until_stopped() {
    let backend = Arc::new(InMemoryDocumentBackend::new());
    let settings: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
    let watcher = App::remote(backend.clone() as Arc<dyn DocumentBackend>, settings.clone(), StoreConfig::default()).await;
    let writer = App::remote(backend as Arc<dyn DocumentBackend>, settings, StoreConfig::default()).await;

    let stop = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        run(&writer, &["new", "--customer", "Remote", "--product", "Dress", "--price", "25"])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    };

    let mut out = Vec::new();
    commands::watch(&watcher, Duration::from_millis(10), &mut out, stop).await.unwrap();
    let printed = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = printed.lines().collect();
    assert_eq!(lines.first(), Some(&"0 invoices, total sales 0.00"));
    assert_eq!(lines.last(), Some(&"1 invoices, total sales 25.00"));
}

struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn watch_stops_remote_refresh_when_output_fails() {
    let backend: Arc<dyn DocumentBackend> = Arc::new(InMemoryDocumentBackend::new());
    let settings: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
    let app = App::remote(backend, settings, StoreConfig::default()).await;

    let result = commands::watch(&app, Duration::from_millis(10), &mut ClosedPipe, std::future::pending::<()>()).await;
    assert!(result.is_err());
    assert!(app.remote_store().unwrap().is_shut_down());
}
