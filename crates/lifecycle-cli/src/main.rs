//! Operator CLI for the document lifecycle service
//!
//! Inspects version history and workflow state, creates versions, and
//! submits approve/reject actions against a live document service.

use anyhow::{bail, Context};
use clap::{Arg, Command};
use lifecycle_core::{
    Direction, LifecycleConfig, LifecycleFacade, NewVersion, VersionPayload, WorkflowAction,
};
use lifecycle_types::{ActorId, DocumentId, StepState, VersionId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("lifecycle-cli")
        .version("1.0.0")
        .about("Document lifecycle console tool")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config/lifecycle.json"),
        )
        .arg(
            Arg::new("document")
                .long("document")
                .short('d')
                .value_name("ID")
                .required(true)
                .help("Document to operate on"),
        )
        .arg(
            Arg::new("list-versions")
                .long("list-versions")
                .help("List the document's versions, newest first")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("create-note")
                .long("create-note")
                .value_name("TEXT")
                .help("Create a notes-only version"),
        )
        .arg(
            Arg::new("upload")
                .long("upload")
                .value_name("FILE")
                .help("Create a version from a local file"),
        )
        .arg(
            Arg::new("show-workflow")
                .long("show-workflow")
                .help("Show workflow steps and execution history")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("approve")
                .long("approve")
                .help("Approve the current workflow step")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("reject")
                .long("reject")
                .help("Reject the current workflow step")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("download")
                .long("download")
                .value_name("VERSION_ID")
                .help("Download a version's file payload"),
        )
        .arg(
            Arg::new("show-version")
                .long("show-version")
                .value_name("VERSION_ID")
                .help("Print a version's payload"),
        )
        .arg(
            Arg::new("navigate")
                .long("navigate")
                .value_name("prev|next")
                .help("Step the selection from --from-version"),
        )
        .arg(
            Arg::new("from-version")
                .long("from-version")
                .value_name("VERSION_ID")
                .help("Version the navigation starts from"),
        )
        .arg(
            Arg::new("step")
                .long("step")
                .value_name("N")
                .help("Step number the action targets (defaults to the current step)"),
        )
        .arg(
            Arg::new("actor")
                .long("actor")
                .value_name("ID")
                .help("Reviewer submitting the action")
                .default_value("cli-operator"),
        )
        .arg(
            Arg::new("notes")
                .long("notes")
                .value_name("TEXT")
                .help("Notes attached to the action or upload"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .help("Where to write a downloaded file"),
        )
        .get_matches();

    // Load configuration
    let config_path = matches.get_one::<String>("config").unwrap();
    let config = LifecycleConfig::from_file(config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;
    log::info!("Loaded configuration from {}", config_path);

    let facade = LifecycleFacade::from_config(&config);

    let document_id = DocumentId::new(matches.get_one::<String>("document").unwrap().clone());
    let actor = ActorId::new(matches.get_one::<String>("actor").unwrap().clone());
    let notes = matches.get_one::<String>("notes").cloned();
    let step = matches
        .get_one::<String>("step")
        .map(|s| s.parse::<u32>())
        .transpose()
        .context("--step must be a positive integer")?;

    if matches.get_flag("list-versions") {
        let versions = facade.list_versions(&document_id).await?;
        if versions.is_empty() {
            println!("No versions for document {}", document_id);
        }
        for version in versions {
            let kind = match &version.file_reference {
                Some(file) => format!("file: {}", file.filename),
                None => "notes".to_string(),
            };
            println!(
                "v{:<4} {}  {}  [{}]",
                version.version_number, version.id, version.created_at, kind
            );
        }
    } else if let Some(text) = matches.get_one::<String>("create-note") {
        let created = facade
            .create_version(&document_id, NewVersion::note(text.clone()))
            .await?;
        println!(
            "Created version {} ({}) for document {}",
            created.version_number, created.id, document_id
        );
    } else if let Some(path) = matches.get_one::<String>("upload") {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
        let filename = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let created = facade
            .create_version(&document_id, NewVersion::file(filename, bytes, notes))
            .await?;
        println!(
            "Uploaded version {} ({}) for document {}",
            created.version_number, created.id, document_id
        );
    } else if matches.get_flag("show-workflow") {
        match facade.workflow_view(&document_id).await? {
            None => println!("Document {} has no workflow", document_id),
            Some(view) => {
                println!(
                    "Workflow {} [{}]  step {}  started {}",
                    view.workflow.id,
                    view.workflow.status,
                    view.workflow.current_step,
                    view.workflow.started_at
                );
                for step in &view.steps {
                    let marker = match step.state {
                        StepState::Complete => "x",
                        StepState::Current => ">",
                        StepState::Upcoming => " ",
                    };
                    println!("  [{}] {}. {}", marker, step.number, step.name);
                }
                if view.history().is_empty() {
                    println!("  (no actions recorded)");
                }
                for record in view.history() {
                    println!(
                        "  {}  step {}  {}  by {}{}",
                        record.performed_at,
                        record.step_number,
                        record.action,
                        record.performed_by,
                        record
                            .notes
                            .as_deref()
                            .map(|n| format!("  - {}", n))
                            .unwrap_or_default()
                    );
                }
            }
        }
    } else if matches.get_flag("approve") || matches.get_flag("reject") {
        let action = if matches.get_flag("approve") {
            WorkflowAction::Approve
        } else {
            WorkflowAction::Reject
        };
        let (updated, record) = facade
            .submit_workflow_action(&document_id, action, step, actor, notes)
            .await?;
        println!(
            "{} recorded on step {}; workflow {} is now {}",
            record.action, record.step_number, updated.id, updated.status
        );
    } else if let Some(version_id) = matches.get_one::<String>("show-version") {
        let payload = facade
            .fetch_version_payload(&document_id, &VersionId::new(version_id.clone()))
            .await?;
        match payload {
            VersionPayload::Text(text) => println!("{}", text),
            VersionPayload::Binary { bytes, filename } => {
                println!("Binary payload {} ({} bytes)", filename, bytes.len())
            }
            VersionPayload::Unstructured(value) => {
                println!("{}", serde_json::to_string_pretty(&value)?)
            }
        }
    } else if let Some(version_id) = matches.get_one::<String>("download") {
        let (bytes, filename) = facade
            .download_version(&document_id, &VersionId::new(version_id.clone()))
            .await?;
        let target = matches
            .get_one::<String>("output")
            .cloned()
            .unwrap_or(filename);
        std::fs::write(&target, &bytes).with_context(|| format!("writing {}", target))?;
        println!("Wrote {} bytes to {}", bytes.len(), target);
    } else if let Some(direction) = matches.get_one::<String>("navigate") {
        let from = matches
            .get_one::<String>("from-version")
            .context("--navigate requires --from-version")?;
        let direction = match direction.as_str() {
            "prev" => Direction::Prev,
            "next" => Direction::Next,
            other => bail!("unknown direction '{}', expected prev or next", other),
        };
        let version = facade
            .navigate_version(&document_id, direction, &VersionId::new(from.clone()))
            .await?;
        println!(
            "Selected version {} ({})",
            version.version_number, version.id
        );
    } else {
        bail!("No action specified. Use --help for options.");
    }

    Ok(())
}
