//! # CLI Command Implementations

use rex::api;
use rex::client::HttpRepositoryClient;
use rex::config::RexConfig;
use rex::explorer::{Explorer, TracingSink};
use rex_core::{
    EntityResponse, GenId, HistoryEntry, Provenance, RelationshipResponse, ReloadResolver,
    RexError, SearchSelection, ServerContext, Session, TraversalResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum recording size (100 MB).
const MAX_REPLAY_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum number of recorded steps.
const MAX_REPLAY_STEPS: usize = 100_000;

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), RexError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| RexError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(RexError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize and check that the path names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, RexError> {
    let canonical = path.canonicalize().map_err(|e| {
        RexError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(RexError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn or_none(name: &str) -> &str {
    if name.is_empty() { "<none>" } else { name }
}

fn print_json(value: &impl Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(config: &RexConfig) -> Result<(), RexError> {
    let client = HttpRepositoryClient::new(&config.repository.base_url, config.timeout())
        .map_err(|e| RexError::IoError(e.to_string()))?;
    let selected = config.selected_context();

    println!("Rex Repository Explorer Starting...");
    println!();
    println!("Configuration:");
    println!("  Listen:     {}", config.server.addr());
    println!("  Repository: {}", client.base_url());
    println!(
        "  Server:     {} on {} ({})",
        or_none(&selected.server_name),
        or_none(&selected.platform_name),
        if selected.enterprise_option { "enterprise" } else { "local" }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let explorer = Explorer::new(Arc::new(client), Arc::new(TracingSink), selected);
    api::run_server(&config.server, explorer).await
}

// =============================================================================
// REPLAY COMMAND
// =============================================================================

/// One recorded repository interaction or session action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordedStep {
    /// Raw get-entity response.
    Entity { response: Value },
    /// Raw get-relationship response.
    Relationship { response: Value },
    /// Raw traversal response and the context it was requested under.
    Traversal {
        #[serde(default)]
        context: ServerContext,
        response: Value,
    },
    /// A search result selection.
    Search { selection: SearchSelection },
    Undo,
    Clear,
}

/// Result of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: usize,
    pub failures: usize,
    pub latest_generation: GenId,
    pub history: Vec<HistoryEntry>,
}

/// Apply recorded steps to a fresh session.
///
/// Unusable responses are counted and skipped, as a live explorer would
/// report and skip them.
pub fn replay(steps: Vec<RecordedStep>) -> Result<ReplayReport, RexError> {
    let mut session = Session::new();
    let total = steps.len();
    let mut failures = 0;

    for (index, step) in steps.into_iter().enumerate() {
        let applied = match step {
            RecordedStep::Entity { response } => EntityResponse::parse(response)
                .and_then(|entity| session.process_entity(entity).map(|_| ())),
            RecordedStep::Relationship { response } => RelationshipResponse::parse(response)
                .and_then(|relationship| session.process_relationship(relationship).map(|_| ())),
            RecordedStep::Traversal { context, response } => TraversalResponse::parse(response)
                .and_then(|payload| {
                    session
                        .process_traversal(payload.into_generation(&context))
                        .map(|_| ())
                }),
            RecordedStep::Search { selection } => session
                .process_traversal(selection.into_generation())
                .map(|_| ()),
            RecordedStep::Undo => {
                session.remove_latest_generation();
                Ok(())
            }
            RecordedStep::Clear => {
                session.clear();
                Ok(())
            }
        };

        match applied {
            Ok(()) => {}
            Err(e @ (RexError::RepositoryFailure { .. }
            | RexError::MissingPayload(_)
            | RexError::SerializationError(_))) => {
                tracing::warn!(step = index, error = %e, "skipping unusable recorded response");
                failures += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(ReplayReport {
        steps: total,
        failures,
        latest_generation: session.latest_active_generation_id(),
        history: session.compile_history(),
    })
}

/// Replay a recording file and print the resulting history.
pub fn cmd_replay(file: &Path, json_mode: bool) -> Result<(), RexError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_REPLAY_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| RexError::IoError(format!("Read file: {}", e)))?;
    let steps: Vec<RecordedStep> = serde_json::from_slice(&contents)
        .map_err(|e| RexError::SerializationError(format!("Invalid recording: {}", e)))?;
    if steps.len() > MAX_REPLAY_STEPS {
        return Err(RexError::SerializationError(format!(
            "Step count {} exceeds maximum allowed {}",
            steps.len(),
            MAX_REPLAY_STEPS
        )));
    }

    tracing::info!("Replaying {} steps from {:?}", steps.len(), validated_path);
    let report = replay(steps)?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    println!("Rex Replay");
    println!("==========");
    println!("Steps:      {}", report.steps);
    println!("Failures:   {}", report.failures);
    println!("Latest gen: {}", report.latest_generation);
    println!();
    for entry in &report.history {
        println!("Gen {}: {}", entry.generation, entry.query);
        for instance in &entry.instances {
            println!(
                "  {:<12} {}  ({}, {})",
                instance.category.name(),
                instance.label,
                instance.guid,
                instance.provenance
            );
        }
    }

    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Print the reload target for an instance with the given provenance.
pub fn cmd_resolve(
    provenance: &str,
    server: &str,
    platform: &str,
    enterprise: bool,
    json_mode: bool,
) -> Result<(), RexError> {
    let origin = ServerContext::new(server, platform, enterprise);
    let target = ReloadResolver::resolve(&Provenance::from(provenance), &origin)?;

    if json_mode {
        print_json(&target);
        return Ok(());
    }

    println!("Server:     {}", target.server_name);
    println!("Platform:   {}", target.platform_name);
    println!(
        "Mode:       {}",
        if target.enterprise_mode { "enterprise" } else { "local" }
    );
    Ok(())
}

// =============================================================================
// CONFIG COMMAND
// =============================================================================

/// Print the effective configuration.
pub fn cmd_config(config: &RexConfig) -> Result<(), RexError> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
