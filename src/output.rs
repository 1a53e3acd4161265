//! Output formatting utilities

use crate::compare::ComparisonReport;
use crate::diff::{DiffKind, DiffRecord, TableDiffResult};
use crate::error::Result;
use crate::pipeline::IngestSummary;
use crate::schema::SchemaRegistry;
use crate::service::DeleteSummary;
use crate::upload::{Upload, UploadStatus};
use crate::workspace::WorkspaceStats;
use chrono::{DateTime, Utc};

/// Diff records printed per table before eliding the rest
const RECORDS_PER_TABLE: usize = 10;

/// Pretty printer for cfgdiff output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print workspace statistics
    pub fn print_workspace_stats(stats: &WorkspaceStats) {
        println!("📊 Cfgdiff Workspace Statistics");
        println!("├─ Store size: {}", format_bytes(stats.store_size));
        println!("├─ Saved reports: {}", stats.report_count);
        println!("└─ Report size: {}", format_bytes(stats.total_report_size));
    }

    /// Print the outcome of an ingestion
    pub fn print_ingest_summary(summary: &IngestSummary, file_name: &str) {
        println!("✅ Ingested {}", file_name);
        println!("├─ Upload id: {}", summary.upload_id);
        println!("├─ Records: {}", summary.records_processed);
        println!(
            "├─ Tables: {} ({})",
            summary.tables_processed.len(),
            summary.tables_processed.join(", ")
        );
        if let Some(previous) = summary.duplicate_of {
            println!("├─ ⚠️  Same content as upload {}", previous);
        }
        if summary.skipped_tables.is_empty() {
            println!("└─ Skipped tables: none");
        } else {
            println!("└─ Skipped tables: {}", summary.skipped_tables.join(", "));
        }
    }

    /// Print upload history
    pub fn print_upload_list(uploads: &[Upload]) {
        if uploads.is_empty() {
            println!("No uploads found.");
            return;
        }

        println!("📸 Uploads (newest first):");
        for (i, upload) in uploads.iter().enumerate() {
            let prefix = if i == uploads.len() - 1 { "└─" } else { "├─" };
            println!(
                "{} {} {}@{}  {}/{}/{}  {} records  [{}]",
                prefix,
                status_marker(upload.status),
                upload.file_name,
                format_timestamp(&upload.uploaded_at),
                upload.company,
                upload.product,
                upload.version,
                upload.records_processed,
                upload.id
            );
        }
    }

    /// Print one upload's metadata
    pub fn print_upload(upload: &Upload) {
        println!("📸 Upload: {}", upload.id);
        println!("├─ File: {}", upload.file_name);
        println!("├─ Uploaded: {} by {}", format_timestamp(&upload.uploaded_at), upload.uploaded_by);
        println!("├─ Company/Product/Version: {}/{}/{}", upload.company, upload.product, upload.version);
        println!("├─ Status: {} {}", status_marker(upload.status), upload.status);
        if let Some(message) = &upload.error_message {
            println!("├─ Error: {}", message);
        }
        println!("├─ Rows parsed: {}", upload.total_records);
        println!("├─ Records saved: {}", upload.records_processed);
        println!("├─ Fingerprint: {}", upload.fingerprint);
        if upload.tables_processed.is_empty() {
            println!("└─ Tables: none");
        } else {
            println!("└─ Tables:");
            for (i, table) in upload.tables_processed.iter().enumerate() {
                let prefix = if i == upload.tables_processed.len() - 1 { "   └─" } else { "   ├─" };
                println!("{} {}", prefix, table);
            }
        }
    }

    /// Print a comparison report
    pub fn print_comparison_report(report: &ComparisonReport) {
        println!(
            "🔍 Comparing {}@{} → {}@{} (tables: {})",
            report.left.file_name,
            format_timestamp(&report.left.uploaded_at),
            report.right.file_name,
            format_timestamp(&report.right.uploaded_at),
            report.scope
        );

        if !report.has_differences() {
            println!("└─ ✅ No differences");
            return;
        }

        for table in &report.tables {
            Self::print_table_diff(table);
        }

        let summary = &report.summary;
        println!("📊 Summary");
        println!("├─ Tables affected: {}", summary.tables_affected);
        println!("├─ Changed: {}", summary.differences);
        println!("├─ Only in left: {}", summary.added_left);
        println!("├─ Only in right: {}", summary.added_right);
        println!("└─ Total: {}", summary.total_records);
    }

    fn print_table_diff(table: &TableDiffResult) {
        println!(
            "├─ ❌ {}: {} changed, {} only left, {} only right",
            table.table, table.changed_count, table.added_left_count, table.added_right_count
        );

        let shown = table.records.len().min(RECORDS_PER_TABLE);
        for (i, record) in table.records.iter().take(shown).enumerate() {
            let is_last = i == shown - 1 && table.records.len() <= shown;
            let marker = if is_last { "└─" } else { "├─" };
            Self::print_diff_record(record, marker, if is_last { "   " } else { "│  " });
        }
        if table.records.len() > shown {
            println!("│  └─ ... and {} more", table.records.len() - shown);
        }
    }

    fn print_diff_record(record: &DiffRecord, marker: &str, indent: &str) {
        match record.kind {
            DiffKind::AddedLeft => println!("│  {} - {} (only in left)", marker, record.key),
            DiffKind::AddedRight => println!("│  {} + {} (only in right)", marker, record.key),
            DiffKind::Changed => {
                println!("│  {} ~ {}", marker, record.key);
                for (j, field) in record.changed_fields.iter().enumerate() {
                    let field_marker = if j == record.changed_fields.len() - 1 { "└─" } else { "├─" };
                    let before = record.left.as_ref().and_then(|r| r.get(field)).unwrap_or_default();
                    let after = record.right.as_ref().and_then(|r| r.get(field)).unwrap_or_default();
                    println!("│  {}   {} {}: '{}' → '{}'", indent, field_marker, field, before, after);
                }
            }
        }
    }

    /// Print the result of a delete
    pub fn print_delete_summary(summary: &DeleteSummary) {
        println!(
            "🗑️  Deleted {}@{}",
            summary.upload.file_name,
            format_timestamp(&summary.upload.uploaded_at)
        );
        println!(
            "├─ Records removed: {} from {} tables",
            summary.deleted_records,
            summary.upload.tables_processed.len()
        );
        if !summary.failed_tables.is_empty() {
            println!("├─ ⚠️  Failed tables: {}", summary.failed_tables.join(", "));
        }
        println!("└─ Raw lines removed: {}", summary.deleted_raw_lines);
    }

    /// Print the supported tables and their aliases
    pub fn print_tables(registry: &SchemaRegistry) {
        println!("📋 Supported tables:");
        let schemas = registry.schemas();
        for (i, schema) in schemas.iter().enumerate() {
            let is_last = i == schemas.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let indent = if is_last { "   " } else { "│  " };
            println!("{} {} ({})", prefix, schema.discriminator, schema.storage_name());
            println!("{}├─ Key: {}", indent, schema.key_fields.join(", "));
            println!("{}├─ Compared: {} fields", indent, schema.comparable_fields.len());
            let aliases = registry.aliases_of(&schema.discriminator);
            if aliases.is_empty() {
                println!("{}└─ Aliases: none", indent);
            } else {
                println!("{}└─ Aliases: {}", indent, aliases.join(", "));
            }
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format workspace stats as JSON
    pub fn format_workspace_stats(stats: &WorkspaceStats) -> Result<String> {
        let json = serde_json::json!({
            "store_size": stats.store_size,
            "report_count": stats.report_count,
            "total_report_size": stats.total_report_size
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }

    /// Format the registry as JSON
    pub fn format_tables(registry: &SchemaRegistry) -> Result<String> {
        let tables: Vec<serde_json::Value> = registry
            .schemas()
            .iter()
            .map(|schema| {
                serde_json::json!({
                    "table": schema.discriminator,
                    "kind": schema.kind,
                    "storage": schema.storage_name(),
                    "key_fields": schema.key_fields,
                    "comparable_fields": schema.comparable_fields,
                    "fields": schema.fields(),
                    "aliases": registry.aliases_of(&schema.discriminator),
                })
            })
            .collect();
        Ok(serde_json::to_string_pretty(&tables)?)
    }
}

fn status_marker(status: UploadStatus) -> &'static str {
    match status {
        UploadStatus::Completed => "✅",
        UploadStatus::Processing => "⏳",
        UploadStatus::Error => "❌",
    }
}

/// Timestamp as shown in listings; accepted back by `<file>@<timestamp>` selectors
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Format bytes in human-readable format
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
