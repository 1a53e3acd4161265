//! Unit tests for CLI argument parsing and validation

use cfgdiff::cli::{Cli, Commands, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_cli_init_command() {
    let cli = Cli::try_parse_from(&["cfgdiff", "init"]).unwrap();
    match cli.command {
        Commands::Init { force } => assert!(!force),
        _ => panic!("Expected Init command"),
    }
}

#[test]
fn test_cli_init_command_with_force() {
    let cli = Cli::try_parse_from(&["cfgdiff", "init", "--force"]).unwrap();
    match cli.command {
        Commands::Init { force } => assert!(force),
        _ => panic!("Expected Init command"),
    }
}

#[test]
fn test_cli_ingest_command() {
    let cli = Cli::try_parse_from(&["cfgdiff", "ingest", "export.csv"]).unwrap();
    match cli.command {
        Commands::Ingest {
            file,
            owner,
            batch_size,
            keep_raw_lines,
            quiet,
        } => {
            assert_eq!(file, PathBuf::from("export.csv"));
            assert!(owner.is_none());
            assert!(batch_size.is_none());
            assert!(!keep_raw_lines);
            assert!(!quiet);
        }
        _ => panic!("Expected Ingest command"),
    }
}

#[test]
fn test_cli_ingest_command_with_options() {
    let cli = Cli::try_parse_from(&[
        "cfgdiff",
        "ingest",
        "export.csv",
        "--owner",
        "alice",
        "--batch-size",
        "250",
        "--keep-raw-lines",
        "--quiet",
    ])
    .unwrap();

    match cli.command {
        Commands::Ingest {
            owner,
            batch_size,
            keep_raw_lines,
            quiet,
            ..
        } => {
            assert_eq!(owner.as_deref(), Some("alice"));
            assert_eq!(batch_size, Some(250));
            assert!(keep_raw_lines);
            assert!(quiet);
        }
        _ => panic!("Expected Ingest command"),
    }
}

#[test]
fn test_cli_ingest_rejects_bad_batch_size() {
    assert!(Cli::try_parse_from(&["cfgdiff", "ingest", "export.csv", "--batch-size", "0"]).is_err());
    assert!(Cli::try_parse_from(&["cfgdiff", "ingest", "export.csv", "--batch-size", "lots"]).is_err());
}

#[test]
fn test_cli_ingest_requires_file() {
    assert!(Cli::try_parse_from(&["cfgdiff", "ingest"]).is_err());
}

#[test]
fn test_cli_compare_defaults() {
    let cli = Cli::try_parse_from(&["cfgdiff", "compare", "left-id", "right-id"]).unwrap();
    match cli.command {
        Commands::Compare {
            left,
            right,
            table,
            format,
            output,
            save,
        } => {
            assert_eq!(left, "left-id");
            assert_eq!(right, "right-id");
            assert_eq!(table, "all");
            assert_eq!(format, "pretty");
            assert!(output.is_none());
            assert!(!save);
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_with_options() {
    let cli = Cli::try_parse_from(&[
        "cfgdiff",
        "compare",
        "a.csv@2024-03-01 10:00:00",
        "b.csv@2024-03-02 10:00:00",
        "--table",
        "/MFND/C_ODO03",
        "--format",
        "json",
        "--output",
        "report.json",
        "--save",
    ])
    .unwrap();

    match cli.command {
        Commands::Compare {
            table,
            format,
            output,
            save,
            ..
        } => {
            assert_eq!(table, "/MFND/C_ODO03");
            assert_eq!(format, "json");
            assert_eq!(output, Some(PathBuf::from("report.json")));
            assert!(save);
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_requires_two_uploads() {
    assert!(Cli::try_parse_from(&["cfgdiff", "compare", "only-one"]).is_err());
}

#[test]
fn test_cli_delete_show_list_tables_stats() {
    let cli = Cli::try_parse_from(&["cfgdiff", "delete", "some-id"]).unwrap();
    assert!(matches!(cli.command, Commands::Delete { ref upload, .. } if upload == "some-id"));

    let cli = Cli::try_parse_from(&["cfgdiff", "show", "some-id", "--format", "json"]).unwrap();
    assert!(matches!(cli.command, Commands::Show { ref format, .. } if format == "json"));

    let cli = Cli::try_parse_from(&["cfgdiff", "list"]).unwrap();
    assert!(matches!(cli.command, Commands::List { ref format } if format == "pretty"));

    let cli = Cli::try_parse_from(&["cfgdiff", "tables"]).unwrap();
    assert!(matches!(cli.command, Commands::Tables { .. }));

    let cli = Cli::try_parse_from(&["cfgdiff", "stats"]).unwrap();
    assert!(matches!(cli.command, Commands::Stats { .. }));
}

#[test]
fn test_cli_global_flags() {
    let cli = Cli::try_parse_from(&["cfgdiff", "list", "--workspace", "/tmp/ws", "-v"]).unwrap();
    assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
    assert!(cli.verbose);
}

#[test]
fn test_cli_unknown_command() {
    assert!(Cli::try_parse_from(&["cfgdiff", "snapshot", "data.csv"]).is_err());
}

#[test]
fn test_output_format_parsing() {
    assert_eq!(OutputFormat::parse("pretty"), Ok(OutputFormat::Pretty));
    assert_eq!(OutputFormat::parse("Json"), Ok(OutputFormat::Json));
    assert!(OutputFormat::parse("xml").is_err());
}
