use clap::Parser;

use super::*;
use a24_sync::SyncPhase;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["a24-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["a24-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["a24-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn sync_phases_map_to_pipeline_phases() {
    let cases = [
        ("categories", SyncPhase::Categories),
        ("products", SyncPhase::Products),
        ("create", SyncPhase::Create),
        ("cleanup", SyncPhase::Cleanup),
        ("all", SyncPhase::All),
    ];
    for (arg, phase) in cases {
        let cli = Cli::try_parse_from(["a24-cli", "sync", arg]).unwrap();
        let Some(Commands::Sync { command }) = cli.command else {
            panic!("expected sync command for {arg}");
        };
        assert_eq!(command.phase(), phase);
        assert!(!command.dry_run());
    }
}

#[test]
fn sync_all_dry_run() {
    let cli = Cli::try_parse_from(["a24-cli", "sync", "all", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            command: SyncCommands::All { dry_run: true }
        })
    ));
}

#[test]
fn sync_requires_a_phase() {
    assert!(Cli::try_parse_from(["a24-cli", "sync"]).is_err());
}

#[test]
fn unknown_sync_phase_is_rejected() {
    assert!(Cli::try_parse_from(["a24-cli", "sync", "prices"]).is_err());
}

#[test]
fn staged_list_defaults() {
    let cli = Cli::try_parse_from(["a24-cli", "staged", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Staged {
            command: StagedCommands::List {
                barcode: None,
                limit: 50
            }
        })
    ));
}

#[test]
fn staged_list_with_barcode() {
    let cli =
        Cli::try_parse_from(["a24-cli", "staged", "list", "--barcode", "4860001"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Staged {
            command: StagedCommands::List {
                barcode: Some(ref b),
                ..
            }
        }) if b == "4860001"
    ));
}

#[test]
fn runs_list_with_limit() {
    let cli = Cli::try_parse_from(["a24-cli", "runs", "list", "--limit", "5"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Runs {
            command: RunsCommands::List { limit: 5 }
        })
    ));
}

#[test]
fn runs_show_takes_an_id() {
    let cli = Cli::try_parse_from(["a24-cli", "runs", "show", "42"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Runs {
            command: RunsCommands::Show { id: 42 }
        })
    ));
    assert!(Cli::try_parse_from(["a24-cli", "runs", "show", "latest"]).is_err());
}

#[test]
fn parses_schedule_command() {
    let cli = Cli::try_parse_from(["a24-cli", "schedule"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Schedule)));
}
