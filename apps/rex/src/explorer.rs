//! # Explorer
//!
//! Drives a `Session` against a live repository.
//!
//! A retrieval takes a `RetrievalTicket`, drops the session lock, awaits the
//! repository, then re-locks and applies the answer only if the session was
//! not cleared in the meantime. Repository failures go to the `FailureSink`
//! and never touch the session.

use crate::client::{ClientError, RepositoryClient};
use rex_core::primitives::NOTHING_NEW_NOTICE;
use rex_core::{
    EntityResponse, ExpandedEntity, ExpandedRelationship, ExploreFilters, FocusChange, GenId,
    Generation, Guid, HistoryEntry, InstanceCategory, RelationshipResponse, RepositoryQuery,
    Retrieval, RetrievalTicket, RexError, SearchSelection, ServerContext, Session, SessionState,
    TraversalOutcome, TraversalResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

// =============================================================================
// FAILURE SINK
// =============================================================================

/// Receiver of failures and advisories meant for the user.
pub trait FailureSink: Send + Sync {
    /// A repository operation failed. `raw` is the answer, if there was one.
    fn report(&self, operation_label: &str, raw: Option<&Value>);

    /// Something worth telling the user that is not a failure.
    fn advise(&self, notice: &str);
}

/// Sink that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, operation_label: &str, raw: Option<&Value>) {
        match raw {
            Some(raw) => tracing::error!(operation = operation_label, response = %raw, "Failed to {}", operation_label),
            None => tracing::error!(operation = operation_label, "Failed to {}", operation_label),
        }
    }

    fn advise(&self, notice: &str) {
        tracing::info!("{}", notice);
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// What an explorer action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    /// An instance was retrieved and is now the focus.
    Focused {
        category: InstanceCategory,
        guid: Guid,
        generation: GenId,
        committed: bool,
    },
    /// A traversal or search selection was committed.
    Expanded { generation: GenId },
    /// Everything returned was already known.
    NothingNew,
    /// The focus was deselected.
    Deselected,
    /// Nothing was done.
    Ignored { reason: String },
    /// The repository call failed and was reported.
    Failed { operation: String },
    /// The answer arrived after a clear and was discarded.
    Stale,
}

// =============================================================================
// EXPLORER
// =============================================================================

/// One exploration session bound to a repository client.
pub struct Explorer {
    client: Arc<dyn RepositoryClient>,
    sink: Arc<dyn FailureSink>,
    session: RwLock<Session>,
    selected: RwLock<ServerContext>,
}

impl Explorer {
    /// Create an explorer with an empty session.
    pub fn new(
        client: Arc<dyn RepositoryClient>,
        sink: Arc<dyn FailureSink>,
        selected: ServerContext,
    ) -> Self {
        Self {
            client,
            sink,
            session: RwLock::new(Session::new()),
            selected: RwLock::new(selected),
        }
    }

    /// The current session snapshot.
    pub async fn snapshot(&self) -> Arc<SessionState> {
        self.session.read().await.snapshot()
    }

    /// The currently selected server context.
    pub async fn selected(&self) -> ServerContext {
        self.selected.read().await.clone()
    }

    /// Change the server used by plain retrievals and explores.
    pub async fn select_server(&self, context: ServerContext) {
        tracing::info!(
            server = %context.server_name,
            platform = %context.platform_name,
            enterprise = context.enterprise_option,
            "server selected"
        );
        *self.selected.write().await = context;
    }

    /// History of the current session.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.session.read().await.compile_history()
    }

    // =========================================================================
    // RETRIEVALS
    // =========================================================================

    /// Retrieve an entity from the selected server and focus it.
    pub async fn load_entity(&self, guid: Guid) -> Result<Outcome, RexError> {
        let context = self.selected().await;
        let ticket = self.ticket().await;
        self.issue(RepositoryQuery::entity(guid), context, ticket).await
    }

    /// Retrieve a relationship from the selected server and focus it.
    pub async fn load_relationship(&self, guid: Guid) -> Result<Outcome, RexError> {
        let context = self.selected().await;
        let ticket = self.ticket().await;
        self.issue(RepositoryQuery::relationship(guid), context, ticket).await
    }

    /// Retrieve an entity from a specific server in a specific mode.
    pub async fn load_entity_from(
        &self,
        context: ServerContext,
        guid: Guid,
    ) -> Result<Outcome, RexError> {
        let query = RepositoryQuery::instance(InstanceCategory::Entity, guid, context.enterprise_option);
        let ticket = self.ticket().await;
        self.issue(query, context, ticket).await
    }

    /// Retrieve a relationship from a specific server in a specific mode.
    pub async fn load_relationship_from(
        &self,
        context: ServerContext,
        guid: Guid,
    ) -> Result<Outcome, RexError> {
        let query =
            RepositoryQuery::instance(InstanceCategory::Relationship, guid, context.enterprise_option);
        let ticket = self.ticket().await;
        self.issue(query, context, ticket).await
    }

    /// Explore one hop around the focus entity on the selected server.
    ///
    /// The ticket is taken together with the focus the query is rooted at, so
    /// a clear in between makes the answer stale.
    pub async fn explore(&self, filters: ExploreFilters) -> Result<Outcome, RexError> {
        let (query, ticket) = {
            let session = self.session.read().await;
            (session.explore_query(filters)?, session.ticket())
        };
        let context = self.selected().await;
        self.issue(query, context, ticket).await
    }

    /// Commit the instances a user picked from search results.
    pub async fn submit_search_selection(
        &self,
        selection: SearchSelection,
    ) -> Result<Outcome, RexError> {
        let candidate = selection.into_generation();
        let outcome = self.session.write().await.process_traversal(candidate)?;
        Ok(self.traversal_outcome(outcome))
    }

    // =========================================================================
    // FOCUS
    // =========================================================================

    /// Toggle or reload the focus on a known entity.
    pub async fn change_focus_entity(&self, guid: Guid) -> Result<Outcome, RexError> {
        self.change_focus(InstanceCategory::Entity, guid).await
    }

    /// Toggle or reload the focus on a known relationship.
    pub async fn change_focus_relationship(&self, guid: Guid) -> Result<Outcome, RexError> {
        self.change_focus(InstanceCategory::Relationship, guid).await
    }

    async fn change_focus(
        &self,
        category: InstanceCategory,
        guid: Guid,
    ) -> Result<Outcome, RexError> {
        let (change, ticket) = {
            let mut session = self.session.write().await;
            let change = session.change_focus(category, &guid);
            (change, session.ticket())
        };
        match change {
            Ok(FocusChange::Deselected) => Ok(Outcome::Deselected),
            Ok(FocusChange::Unknown) => Ok(Outcome::Ignored {
                reason: format!("{} {} is not known", category, guid),
            }),
            Ok(FocusChange::Reload(plan)) => {
                self.issue(plan.query(), plan.target.context(), ticket).await
            }
            Err(RexError::UnrecognizedProvenance(tag)) => Ok(Outcome::Ignored {
                reason: format!("Unknown value {} for instance provenance was encountered", tag),
            }),
            Err(e) => Err(e),
        }
    }

    /// Deselect the focus.
    pub async fn clear_focus(&self) {
        self.session.write().await.clear_focus();
    }

    // =========================================================================
    // UNDO AND RESET
    // =========================================================================

    /// Remove the newest generation. Returns its id.
    pub async fn undo(&self) -> Option<GenId> {
        let removed = self.session.write().await.remove_latest_generation()?;
        Some(removed.id)
    }

    /// Reset the session. Answers still in flight will be discarded.
    pub async fn clear(&self) {
        self.session.write().await.clear();
    }

    // =========================================================================
    // RAW ACCESS
    // =========================================================================

    /// Post a raw request to the currently selected server.
    pub async fn post_selected(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        let context = self.selected().await;
        self.post_to(&context, path, body).await
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn post_to(
        &self,
        context: &ServerContext,
        path: &str,
        body: Value,
    ) -> Result<Value, ClientError> {
        self.client
            .post(&context.server_name, &context.platform_name, path, body)
            .await
    }

    async fn ticket(&self) -> RetrievalTicket {
        self.session.read().await.ticket()
    }

    /// Send a query. `ticket` must come from the same session read that
    /// decided to send it.
    async fn issue(
        &self,
        query: RepositoryQuery,
        context: ServerContext,
        ticket: RetrievalTicket,
    ) -> Result<Outcome, RexError> {
        let label = query.operation_label();
        let enterprise_option = query.enterprise_option(context.enterprise_option);
        let body = query.body(context.enterprise_option);

        // No session lock is held across this await.
        let raw = match self.post_to(&context, query.path(), body).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(operation = label, error = %e, "repository call failed");
                self.sink.report(label, None);
                return Ok(Outcome::Failed {
                    operation: label.to_string(),
                });
            }
        };

        let requested = ServerContext {
            enterprise_option,
            ..context
        };
        self.apply(&query, &requested, ticket, raw).await
    }

    async fn apply(
        &self,
        query: &RepositoryQuery,
        requested: &ServerContext,
        ticket: RetrievalTicket,
        raw: Value,
    ) -> Result<Outcome, RexError> {
        let label = query.operation_label();
        let mut session = self.session.write().await;
        if let Err(e) = session.check_ticket(ticket) {
            tracing::warn!(operation = label, error = %e, "discarding response");
            return Ok(Outcome::Stale);
        }

        let parsed = match query {
            RepositoryQuery::Entity { .. } => {
                EntityResponse::parse(raw.clone()).map(|entity| Parsed::Entity(Box::new(entity)))
            }
            RepositoryQuery::Relationship { .. } => RelationshipResponse::parse(raw.clone())
                .map(|relationship| Parsed::Relationship(Box::new(relationship))),
            RepositoryQuery::Traversal(_) => TraversalResponse::parse(raw.clone())
                .map(|payload| Parsed::Traversal(payload.into_generation(requested))),
        };
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(operation = label, error = %e, "unusable repository response");
                self.sink.report(label, Some(&raw));
                return Ok(Outcome::Failed {
                    operation: label.to_string(),
                });
            }
        };

        let applied = match parsed {
            Parsed::Entity(entity) => {
                let guid = entity.guid().clone();
                session
                    .process_entity(*entity)
                    .map(|retrieval| focused(InstanceCategory::Entity, guid, retrieval))
            }
            Parsed::Relationship(relationship) => {
                let guid = relationship.guid().clone();
                session
                    .process_relationship(*relationship)
                    .map(|retrieval| focused(InstanceCategory::Relationship, guid, retrieval))
            }
            Parsed::Traversal(candidate) => {
                let outcome = session.process_traversal(candidate);
                drop(session);
                outcome.map(|outcome| self.traversal_outcome(outcome))
            }
        };

        applied.map_err(|e| {
            tracing::warn!(operation = label, error = %e, "response rejected by the session");
            self.sink.report(label, Some(&raw));
            e
        })
    }

    fn traversal_outcome(&self, outcome: TraversalOutcome) -> Outcome {
        match outcome {
            TraversalOutcome::Committed(generation) => Outcome::Expanded { generation },
            TraversalOutcome::NothingNew => {
                self.sink.advise(NOTHING_NEW_NOTICE);
                Outcome::NothingNew
            }
        }
    }
}

enum Parsed {
    Entity(Box<ExpandedEntity>),
    Relationship(Box<ExpandedRelationship>),
    Traversal(Generation),
}

fn focused(category: InstanceCategory, guid: Guid, retrieval: Retrieval) -> Outcome {
    Outcome::Focused {
        category,
        guid,
        generation: retrieval.generation(),
        committed: matches!(retrieval, Retrieval::Committed(_)),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rex_core::primitives::{ENTITY_PATH, GET_ENTITY_LABEL, TRAVERSAL_PATH};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    type Call = (String, String, String, Value);

    #[derive(Default)]
    struct ScriptedClient {
        answers: Mutex<VecDeque<Result<Value, ClientError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedClient {
        fn answering(answers: Vec<Result<Value, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                calls: Mutex::default(),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RepositoryClient for ScriptedClient {
        async fn post(
            &self,
            server_name: &str,
            platform_name: &str,
            path: &str,
            body: Value,
        ) -> Result<Value, ClientError> {
            self.calls.lock().unwrap().push((
                server_name.to_string(),
                platform_name.to_string(),
                path.to_string(),
                body,
            ));
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::ConnectionFailed("script exhausted".into())))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<(String, Option<Value>)>>,
        notices: Mutex<Vec<String>>,
    }

    impl FailureSink for RecordingSink {
        fn report(&self, operation_label: &str, raw: Option<&Value>) {
            self.reports
                .lock()
                .unwrap()
                .push((operation_label.to_string(), raw.cloned()));
        }

        fn advise(&self, notice: &str) {
            self.notices.lock().unwrap().push(notice.to_string());
        }
    }

    fn entity_answer(guid: &str, provenance: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "relatedHTTPCode": 200,
            "expandedEntityDetail": {
                "serverName": "cocoMDS1",
                "platformName": "platform",
                "entityDetail": { "guid": guid, "type": "GlossaryTerm" },
                "entityDigest": { "entityGUID": guid, "label": guid, "provenance": provenance }
            }
        }))
    }

    fn traversal_answer(root: &str, neighbours: &[&str]) -> Result<Value, ClientError> {
        let mut entities = serde_json::Map::new();
        let mut relationships = serde_json::Map::new();
        for (i, n) in neighbours.iter().enumerate() {
            entities.insert(
                (*n).to_string(),
                json!({ "entityGUID": n, "label": n, "provenance": "home" }),
            );
            let r = format!("r-{i}-{n}");
            relationships.insert(
                r.clone(),
                json!({
                    "relationshipGUID": r, "end1GUID": root, "end2GUID": n,
                    "label": "TermAnchor", "provenance": "home"
                }),
            );
        }
        Ok(json!({
            "relatedHTTPCode": 200,
            "rexTraversal": {
                "entityGUID": root,
                "depth": 1,
                "entities": entities,
                "relationships": relationships
            }
        }))
    }

    fn explorer(client: Arc<ScriptedClient>, sink: Arc<RecordingSink>) -> Explorer {
        Explorer::new(
            client,
            sink,
            ServerContext::new("cocoMDS1", "platform", false),
        )
    }

    #[tokio::test]
    async fn load_entity_commits_then_refocuses() {
        let client = ScriptedClient::answering(vec![
            entity_answer("e-1", "home"),
            entity_answer("e-1", "home"),
        ]);
        let explorer = explorer(client.clone(), Arc::default());

        let first = explorer.load_entity(Guid::new("e-1")).await.unwrap();
        let second = explorer.load_entity(Guid::new("e-1")).await.unwrap();

        assert_eq!(
            first,
            Outcome::Focused {
                category: InstanceCategory::Entity,
                guid: Guid::new("e-1"),
                generation: GenId(1),
                committed: true,
            }
        );
        assert!(matches!(second, Outcome::Focused { committed: false, .. }));
        assert_eq!(explorer.snapshot().await.store.len(), 1);

        let calls = client.calls();
        assert_eq!(calls[0].2, ENTITY_PATH);
        assert_eq!(
            calls[0].3,
            json!({ "entityGUID": "e-1", "enterpriseOption": false })
        );
    }

    #[tokio::test]
    async fn transport_failure_is_reported_without_raw() {
        let client = ScriptedClient::answering(vec![Err(ClientError::RateLimited)]);
        let sink = Arc::new(RecordingSink::default());
        let explorer = explorer(client, sink.clone());

        let outcome = explorer.load_entity(Guid::new("e-1")).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Failed {
                operation: GET_ENTITY_LABEL.to_string()
            }
        );
        assert_eq!(
            sink.reports.lock().unwrap().as_slice(),
            &[(GET_ENTITY_LABEL.to_string(), None)]
        );
        assert!(explorer.snapshot().await.store.is_empty());
    }

    #[tokio::test]
    async fn repository_error_code_is_reported_with_raw() {
        let raw = json!({ "relatedHTTPCode": 404, "exceptionErrorMessage": "not found" });
        let client = ScriptedClient::answering(vec![Ok(raw.clone())]);
        let sink = Arc::new(RecordingSink::default());
        let explorer = explorer(client, sink.clone());

        let outcome = explorer.load_entity(Guid::new("e-1")).await.unwrap();

        assert!(matches!(outcome, Outcome::Failed { .. }));
        assert_eq!(sink.reports.lock().unwrap()[0].1, Some(raw));
        assert!(explorer.snapshot().await.focus.is_none());
    }

    #[tokio::test]
    async fn explore_without_focus_is_rejected() {
        let client = ScriptedClient::answering(vec![]);
        let explorer = explorer(client.clone(), Arc::default());

        let result = explorer.explore(ExploreFilters::default()).await;

        assert_eq!(result, Err(RexError::NoFocus));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn explore_commits_then_reports_nothing_new() {
        let client = ScriptedClient::answering(vec![
            entity_answer("e-1", "home"),
            traversal_answer("e-1", &["e-2", "e-3"]),
            traversal_answer("e-1", &["e-2", "e-3"]),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let explorer = explorer(client.clone(), sink.clone());
        explorer.load_entity(Guid::new("e-1")).await.unwrap();

        let filters = ExploreFilters {
            classification_names: vec!["Confidential".to_string()],
            ..ExploreFilters::default()
        };
        let first = explorer.explore(filters.clone()).await.unwrap();
        let second = explorer.explore(filters).await.unwrap();

        assert_eq!(first, Outcome::Expanded { generation: GenId(2) });
        assert_eq!(second, Outcome::NothingNew);
        assert_eq!(
            sink.notices.lock().unwrap().as_slice(),
            &[NOTHING_NEW_NOTICE.to_string()]
        );

        let calls = client.calls();
        assert_eq!(calls[1].2, TRAVERSAL_PATH);
        assert_eq!(calls[1].3["entityGUID"], json!("e-1"));
        assert_eq!(calls[1].3["depth"], json!(1));
        assert_eq!(calls[1].3["classificationNames"], json!(["Confidential"]));

        let history = explorer.history().await;
        assert_eq!(history.len(), 2);
        assert!(history[1].query.starts_with("[cocoMDS1] Local Traversal from entity e-1"));
    }

    #[tokio::test]
    async fn refocus_toggles_then_reloads_by_provenance() {
        let client = ScriptedClient::answering(vec![
            entity_answer("e-1", "refCopy"),
            entity_answer("e-1", "refCopy"),
        ]);
        let explorer = Explorer::new(
            client.clone(),
            Arc::new(RecordingSink::default()),
            ServerContext::new("cocoMDS1", "platform", true),
        );
        explorer.load_entity(Guid::new("e-1")).await.unwrap();

        let toggled = explorer.change_focus_entity(Guid::new("e-1")).await.unwrap();
        assert_eq!(toggled, Outcome::Deselected);

        explorer
            .select_server(ServerContext::new("cocoMDS2", "other", false))
            .await;
        let reloaded = explorer.change_focus_entity(Guid::new("e-1")).await.unwrap();
        assert!(matches!(reloaded, Outcome::Focused { committed: false, .. }));

        // refCopy reloads go back to the answering server in its recorded mode.
        let calls = client.calls();
        assert_eq!(calls[0].3["enterpriseOption"], json!(true));
        assert_eq!(calls[1].0, "cocoMDS1");
        assert_eq!(calls[1].3["enterpriseOption"], json!(false));
    }

    #[tokio::test]
    async fn refocus_on_unknown_guid_is_ignored() {
        let client = ScriptedClient::answering(vec![]);
        let explorer = explorer(client.clone(), Arc::default());

        let outcome = explorer
            .change_focus_relationship(Guid::new("r-404"))
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Ignored { .. }));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn search_selection_is_committed_once() {
        let explorer = explorer(ScriptedClient::answering(vec![]), Arc::default());
        let selection: SearchSelection = serde_json::from_value(json!({
            "serverName": "cocoMDS1",
            "platformName": "platform",
            "searchCategory": "Entity",
            "searchText": "customer.*",
            "entities": { "e-9": { "entityGUID": "e-9", "label": "Customer", "provenance": "home" } }
        }))
        .unwrap();

        let first = explorer.submit_search_selection(selection.clone()).await.unwrap();
        let second = explorer.submit_search_selection(selection).await.unwrap();

        assert_eq!(first, Outcome::Expanded { generation: GenId(1) });
        assert_eq!(second, Outcome::NothingNew);
        assert_eq!(
            explorer.history().await[0].query,
            "[cocoMDS1] Local Entity Search: Expression [customer.*]"
        );
    }

    #[tokio::test]
    async fn undo_pops_newest_generation() {
        let client = ScriptedClient::answering(vec![
            entity_answer("e-1", "home"),
            entity_answer("e-2", "home"),
        ]);
        let explorer = explorer(client, Arc::default());
        explorer.load_entity(Guid::new("e-1")).await.unwrap();
        explorer.load_entity(Guid::new("e-2")).await.unwrap();

        assert_eq!(explorer.undo().await, Some(GenId(2)));
        assert!(explorer.snapshot().await.focus.is_none());
        assert_eq!(explorer.undo().await, Some(GenId(1)));
        assert_eq!(explorer.undo().await, None);
    }

    #[tokio::test]
    async fn post_selected_targets_current_server() {
        let client = ScriptedClient::answering(vec![Ok(json!({ "relatedHTTPCode": 200 }))]);
        let explorer = explorer(client.clone(), Arc::default());
        explorer
            .select_server(ServerContext::new("cocoMDS3", "platform3", false))
            .await;

        let raw = explorer
            .post_selected(ENTITY_PATH, json!({ "entityGUID": "e-1" }))
            .await
            .unwrap();

        assert_eq!(raw["relatedHTTPCode"], 200);
        let calls = client.calls();
        assert_eq!(calls[0].0, "cocoMDS3");
        assert_eq!(calls[0].1, "platform3");
        // Nothing was interpreted or committed.
        assert!(explorer.snapshot().await.store.is_empty());
    }

    /// Holds its single answer until released.
    struct GatedClient {
        arrived: Notify,
        release: Notify,
        answer: Value,
    }

    #[async_trait]
    impl RepositoryClient for GatedClient {
        async fn post(&self, _: &str, _: &str, _: &str, _: Value) -> Result<Value, ClientError> {
            self.arrived.notify_one();
            self.release.notified().await;
            Ok(self.answer.clone())
        }
    }

    #[tokio::test]
    async fn answer_arriving_after_clear_is_discarded() {
        let client = Arc::new(GatedClient {
            arrived: Notify::new(),
            release: Notify::new(),
            answer: entity_answer("e-1", "home").unwrap(),
        });
        let explorer = Arc::new(Explorer::new(
            client.clone(),
            Arc::new(TracingSink),
            ServerContext::new("cocoMDS1", "platform", false),
        ));

        let pending = {
            let explorer = explorer.clone();
            tokio::spawn(async move { explorer.load_entity(Guid::new("e-1")).await })
        };
        client.arrived.notified().await;
        explorer.clear().await;
        client.release.notify_one();

        let outcome = pending.await.unwrap().unwrap();

        assert_eq!(outcome, Outcome::Stale);
        let state = explorer.snapshot().await;
        assert!(state.store.is_empty());
        assert!(state.focus.is_none());
        assert_eq!(state.epoch, 1);
    }

    #[tokio::test]
    async fn explore_built_before_clear_is_discarded() {
        let client = ScriptedClient::answering(vec![
            entity_answer("e-1", "home"),
            traversal_answer("e-1", &["e-2"]),
        ]);
        let explorer = Arc::new(explorer(client.clone(), Arc::default()));
        explorer.load_entity(Guid::new("e-1")).await.unwrap();

        // Park the explore between building its query and sending it.
        let selected = explorer.selected.write().await;
        let pending = {
            let explorer = explorer.clone();
            tokio::spawn(async move { explorer.explore(ExploreFilters::default()).await })
        };
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        explorer.clear().await;
        drop(selected);

        let outcome = pending.await.unwrap().unwrap();

        assert_eq!(outcome, Outcome::Stale);
        assert_eq!(client.calls()[1].2, TRAVERSAL_PATH);
        let state = explorer.snapshot().await;
        assert!(state.store.is_empty());
        assert_eq!(state.epoch, 1);
        assert!(explorer.history().await.is_empty());
    }

    #[tokio::test]
    async fn answer_rejected_by_session_is_reported_with_raw() {
        let raw = json!({
            "relatedHTTPCode": 200,
            "expandedRelationship": {
                "serverName": "cocoMDS1",
                "platformName": "platform",
                "relationship": { "guid": "x-1" },
                "relationshipDigest": {
                    "relationshipGUID": "x-1", "end1GUID": "x-1", "end2GUID": "e-2",
                    "label": "Loop", "provenance": "home"
                },
                "entityOneDigest": { "entityGUID": "x-1", "label": "x-1", "provenance": "proxy" },
                "entityTwoDigest": { "entityGUID": "e-2", "label": "e-2", "provenance": "proxy" }
            }
        });
        let client = ScriptedClient::answering(vec![Ok(raw.clone())]);
        let sink = Arc::new(RecordingSink::default());
        let explorer = explorer(client, sink.clone());

        let result = explorer.load_relationship(Guid::new("x-1")).await;

        assert!(matches!(result, Err(RexError::DuplicateInstance { .. })));
        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].1, Some(raw));
        assert!(explorer.snapshot().await.store.is_empty());
    }
}
