/*!
Request orchestrator

Drives the four backend operations through Idle -> Pending -> Success | Failure -> Idle.

- A trigger checks the operation's in-flight flag and its preconditions, then spawns the
  backend call on the tokio runtime, wrapped in the configured timeout.
- The spawned task sends a `Completion` back over a channel. It carries the `ControlGuard`,
  so the control is re-enabled once the outcome has been applied on the UI thread, or earlier
  if the task or the handler unwinds.
- `poll` drains finished operations each frame and applies them to the `AppState`.
*/

pub mod control;
pub mod preconditions;
pub mod state;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error, info, warn};

use crate::backend::wire::{CompareRequest, GenerateRequest, OptimizeRequest, RunTestsRequest};
use crate::backend::{BackendResult, PathBackend, RequestError};
use crate::gui::surface::GlobeSurface;
use crate::network::network_graph::Graph;
use crate::network::node::NodeId;
use crate::network::results::{
    Algorithm, ComparisonResult, OptimizationResult, TestStatistics, Weights,
};

use control::{ControlGuard, Controls, Operation};
use preconditions::{ValidationError, clamp_test_count, require_graph, validate_weights};
use state::{AppState, NotificationLevel};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrchestratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} is already in progress")]
    AlreadyPending(Operation),
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub request_timeout: Duration,
    pub max_tests: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_tests: preconditions::MAX_TESTS,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Generated(BackendResult<Graph>),
    Optimized(BackendResult<OptimizationResult>),
    Compared(BackendResult<ComparisonResult>),
    TestsRun(BackendResult<TestStatistics>),
}

impl Outcome {
    fn is_ok(&self) -> bool {
        match self {
            Outcome::Generated(result) => result.is_ok(),
            Outcome::Optimized(result) => result.is_ok(),
            Outcome::Compared(result) => result.is_ok(),
            Outcome::TestsRun(result) => result.is_ok(),
        }
    }

    /// Results computed against the graph that was live when the request was made.
    fn depends_on_graph(&self) -> bool {
        !matches!(self, Outcome::Generated(_))
    }
}

#[derive(Debug)]
pub struct Completion {
    guard: ControlGuard,
    /// `GraphStore::generation` at trigger time.
    graph_generation: u64,
    pub outcome: Outcome,
}

pub struct Orchestrator {
    backend: Arc<dyn PathBackend>,
    handle: Handle,
    settings: OrchestratorSettings,
    controls: Controls,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn PathBackend>,
        handle: Handle,
        settings: OrchestratorSettings,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            backend,
            handle,
            settings,
            controls: Controls::default(),
            tx,
            rx,
        }
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    pub fn generate(
        &self,
        state: &mut AppState,
        request: GenerateRequest,
    ) -> Result<(), OrchestratorError> {
        let guard = self.begin(state, Operation::Generate, |_| Ok(()))?;
        info!("[orchestrator] generate: {request:?}");
        let backend = self.backend.clone();
        self.dispatch(
            guard,
            state.store.generation(),
            async move { backend.generate_network(&request).await },
            Outcome::Generated,
        );
        Ok(())
    }

    pub fn optimize(
        &self,
        state: &mut AppState,
        source: NodeId,
        destination: NodeId,
        algorithm: Algorithm,
        weights: Weights,
    ) -> Result<(), OrchestratorError> {
        let guard = self.begin(state, Operation::Optimize, |state| {
            require_graph(&state.store)?;
            validate_weights(&weights)
        })?;
        let request = OptimizeRequest {
            source,
            destination,
            algorithm: algorithm.code().to_string(),
            weights,
        };
        info!("[orchestrator] optimize {source} -> {destination} with {algorithm}");
        let backend = self.backend.clone();
        self.dispatch(
            guard,
            state.store.generation(),
            async move { backend.optimize(&request).await },
            Outcome::Optimized,
        );
        Ok(())
    }

    pub fn compare(
        &self,
        state: &mut AppState,
        source: NodeId,
        destination: NodeId,
        weights: Weights,
    ) -> Result<(), OrchestratorError> {
        let guard = self.begin(state, Operation::Compare, |state| {
            require_graph(&state.store)
        })?;
        let request = CompareRequest {
            source,
            destination,
            weights,
        };
        info!("[orchestrator] compare {source} -> {destination}");
        let backend = self.backend.clone();
        self.dispatch(
            guard,
            state.store.generation(),
            async move { backend.compare_algorithms(&request).await },
            Outcome::Compared,
        );
        Ok(())
    }

    pub fn run_tests(
        &self,
        state: &mut AppState,
        requested: u32,
    ) -> Result<(), OrchestratorError> {
        let guard = self.begin(state, Operation::RunTests, |state| {
            require_graph(&state.store)
        })?;
        let num_tests = clamp_test_count(requested, self.settings.max_tests);
        if num_tests != requested {
            debug!("[orchestrator] test count {requested} clamped to {num_tests}");
        }
        let request = RunTestsRequest { num_tests };
        info!("[orchestrator] run {num_tests} tests");
        let backend = self.backend.clone();
        self.dispatch(
            guard,
            state.store.generation(),
            async move { backend.run_tests(&request).await },
            Outcome::TestsRun,
        );
        Ok(())
    }

    /// Rejects re-entrant triggers, then runs `check` before marking `op` pending.
    fn begin<F>(
        &self,
        state: &mut AppState,
        op: Operation,
        check: F,
    ) -> Result<ControlGuard, OrchestratorError>
    where
        F: FnOnce(&AppState) -> Result<(), ValidationError>,
    {
        if self.controls.is_pending(op) {
            warn!("[orchestrator] {op} rejected: already pending");
            return Err(OrchestratorError::AlreadyPending(op));
        }
        if let Err(err) = check(&*state) {
            warn!("[orchestrator] {op} rejected: {err}");
            state.notify(NotificationLevel::Warning, err.to_string());
            return Err(err.into());
        }
        self.controls
            .try_begin(op)
            .ok_or(OrchestratorError::AlreadyPending(op))
    }

    fn dispatch<T, Fut>(
        &self,
        guard: ControlGuard,
        graph_generation: u64,
        call: Fut,
        wrap: fn(BackendResult<T>) -> Outcome,
    ) where
        T: Send + 'static,
        Fut: Future<Output = BackendResult<T>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let timeout = self.settings.request_timeout;
        self.handle.spawn(async move {
            let result = match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(RequestError::TimedOut(timeout)),
            };
            let op = guard.operation();
            let completion = Completion {
                guard,
                graph_generation,
                outcome: wrap(result),
            };
            if tx.send(completion).is_err() {
                debug!("[orchestrator] {op} finished after the UI went away");
            }
        });
    }

    /// Applies every finished operation. Returns how many were applied.
    pub fn poll(&mut self, state: &mut AppState, surface: &mut dyn GlobeSurface) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            apply_completion(completion, state, surface);
            applied += 1;
        }
        applied
    }

    /// Waits for the next finished operation and applies it.
    pub async fn settle_next(
        &mut self,
        state: &mut AppState,
        surface: &mut dyn GlobeSurface,
    ) -> bool {
        match self.rx.recv().await {
            Some(completion) => {
                apply_completion(completion, state, surface);
                true
            }
            None => false,
        }
    }
}

fn apply_completion(
    completion: Completion,
    state: &mut AppState,
    surface: &mut dyn GlobeSurface,
) {
    // Dropped at the end of this function, after the outcome is applied
    let Completion {
        guard,
        graph_generation,
        outcome,
    } = completion;
    let op = guard.operation();
    if outcome.depends_on_graph()
        && outcome.is_ok()
        && graph_generation != state.store.generation()
    {
        warn!("[orchestrator] {op} result discarded: the network was replaced while it ran");
        state.notify(
            NotificationLevel::Warning,
            format!("Discarded {op} result computed for a previous network"),
        );
        return;
    }
    match outcome {
        Outcome::Generated(Ok(graph)) => {
            let message = format!(
                "Network generated: {} nodes, {} edges",
                graph.nodes().len(),
                graph.edges().len()
            );
            state.store.replace(graph);
            if let Some(graph) = state.store.graph() {
                state.pipeline.render_graph(graph, surface);
            }
            state.pipeline.refresh_labels(&state.store, surface);
            state.results.clear();
            succeed(state, op, message);
        }
        Outcome::Optimized(Ok(result)) => {
            if let Some(graph) = state.store.graph() {
                state.pipeline.render_path(graph, &result.path, surface);
            }
            state.results.show_path_result(&result);
            let message = format!(
                "{}: path of {} nodes, cost {:.4}",
                result.algorithm,
                result.path.len(),
                result.cost
            );
            succeed(state, op, message);
        }
        Outcome::Compared(Ok(comparison)) => {
            if let (Some(graph), Some(best)) = (state.store.graph(), comparison.best()) {
                state.pipeline.render_path(graph, &best.path, surface);
            }
            state.results.show_comparison(&comparison);
            if comparison.is_empty() {
                warn!("[orchestrator] compare returned an empty result set");
            }
            let message = match comparison.best() {
                Some(best) => format!(
                    "Compared {} algorithms, best: {} ({:.4})",
                    comparison.len(),
                    best.algorithm,
                    best.cost
                ),
                None => "Comparison returned no results".to_string(),
            };
            succeed(state, op, message);
        }
        Outcome::TestsRun(Ok(stats)) => {
            state.results.show_test_statistics(&stats);
            let message = format!("Completed {} tests", stats.num_tests);
            succeed(state, op, message);
        }
        Outcome::Generated(Err(err))
        | Outcome::Optimized(Err(err))
        | Outcome::Compared(Err(err))
        | Outcome::TestsRun(Err(err)) => fail(state, op, &err),
    }
}

fn succeed(state: &mut AppState, op: Operation, message: String) {
    info!("[orchestrator] {op} succeeded: {message}");
    state.notify(NotificationLevel::Info, message);
}

fn fail(state: &mut AppState, op: Operation, err: &RequestError) {
    match err {
        RequestError::Transport(detail) => error!("[orchestrator] {op} failed: {detail}"),
        other => warn!("[orchestrator] {op} failed: {other}"),
    }
    state.notify(NotificationLevel::Error, err.user_message());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::globe_view::GlobeView;
    use crate::gui::style::NodeRole;
    use crate::network::network_graph::tests::line_graph;
    use crate::network::path::Path;
    use crate::network::results::PathMetrics;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Generate(GenerateRequest),
        Optimize(OptimizeRequest),
        Compare(CompareRequest),
        RunTests(RunTestsRequest),
    }

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<Call>>,
        stall: Option<Duration>,
        /// Extra delay for optimize only, so a later generate can overtake it.
        optimize_stall: Option<Duration>,
        fail_with: Option<RequestError>,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn record(&self, call: Call) -> BackendResult<()> {
            self.calls.lock().unwrap().push(call);
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    fn path_result(algorithm: &str, nodes: Vec<NodeId>, cost: f64) -> OptimizationResult {
        OptimizationResult {
            algorithm: algorithm.to_string(),
            path: Path::new(nodes).unwrap(),
            cost,
            metrics: PathMetrics {
                total_delay: 4.0,
                total_reliability: 0.93,
                resource_cost: 0.5,
            },
            execution_time: 0.05,
        }
    }

    #[async_trait]
    impl PathBackend for FakeBackend {
        async fn generate_network(&self, request: &GenerateRequest) -> BackendResult<Graph> {
            self.record(Call::Generate(request.clone())).await?;
            Ok(line_graph())
        }

        async fn optimize(&self, request: &OptimizeRequest) -> BackendResult<OptimizationResult> {
            self.record(Call::Optimize(request.clone())).await?;
            if let Some(stall) = self.optimize_stall {
                tokio::time::sleep(stall).await;
            }
            Ok(path_result(&request.algorithm, vec![0, 1, 2], 1.5))
        }

        async fn compare_algorithms(
            &self,
            request: &CompareRequest,
        ) -> BackendResult<ComparisonResult> {
            self.record(Call::Compare(request.clone())).await?;
            Ok(ComparisonResult::new(vec![
                path_result("GA", vec![0, 1], 3.0),
                path_result("ACO", vec![0, 1, 2], 2.0),
            ]))
        }

        async fn run_tests(&self, request: &RunTestsRequest) -> BackendResult<TestStatistics> {
            self.record(Call::RunTests(request.clone())).await?;
            Ok(TestStatistics {
                num_tests: request.num_tests as usize,
                ..Default::default()
            })
        }
    }

    fn orchestrator(backend: Arc<FakeBackend>, timeout: Duration) -> Orchestrator {
        Orchestrator::new(
            backend,
            Handle::current(),
            OrchestratorSettings {
                request_timeout: timeout,
                max_tests: 20,
            },
        )
    }

    fn loaded_state() -> AppState {
        let mut state = AppState::default();
        state.store.replace(line_graph());
        state
    }

    #[tokio::test]
    async fn test_run_tests_clamps_count() {
        let backend = Arc::new(FakeBackend::default());
        let mut orch = orchestrator(backend.clone(), DEFAULT_REQUEST_TIMEOUT);
        let mut state = loaded_state();
        let mut globe = GlobeView::default();

        orch.run_tests(&mut state, 35).unwrap();
        assert!(orch.settle_next(&mut state, &mut globe).await);

        assert_eq!(backend.calls(), vec![Call::RunTests(RunTestsRequest { num_tests: 20 })]);
        let body = serde_json::to_value(RunTestsRequest { num_tests: 20 }).unwrap();
        assert_eq!(body, serde_json::json!({"num_tests": 20}));
        assert_eq!(state.results.statistics.as_ref().unwrap().num_tests, 20);
    }

    #[tokio::test]
    async fn test_no_graph_fails_fast() {
        let backend = Arc::new(FakeBackend::default());
        let orch = orchestrator(backend.clone(), DEFAULT_REQUEST_TIMEOUT);
        let mut state = AppState::default();
        let weights = Weights::default();

        for result in [
            orch.optimize(&mut state, 0, 2, Algorithm::Genetic, weights),
            orch.compare(&mut state, 0, 2, weights),
            orch.run_tests(&mut state, 5),
        ] {
            assert_eq!(result, Err(OrchestratorError::Validation(ValidationError::NoGraph)));
        }
        assert!(backend.calls().is_empty());
        assert!(!orch.controls().any_pending());
        assert_eq!(state.latest_notification().unwrap().level, NotificationLevel::Warning);
    }

    #[tokio::test]
    async fn test_unnormalized_weights_rejected() {
        let backend = Arc::new(FakeBackend::default());
        let orch = orchestrator(backend.clone(), DEFAULT_REQUEST_TIMEOUT);
        let mut state = loaded_state();

        let weights = Weights::new(0.5, 0.3, 0.3);
        let result = orch.optimize(&mut state, 0, 2, Algorithm::Genetic, weights);
        assert!(matches!(
            result,
            Err(OrchestratorError::Validation(ValidationError::WeightsNotNormalized(_)))
        ));
        assert!(backend.calls().is_empty());
        assert!(orch.controls().is_enabled(Operation::Optimize));
    }

    #[tokio::test]
    async fn test_reentrant_trigger_rejected() {
        let backend = Arc::new(FakeBackend {
            stall: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let mut orch = orchestrator(backend.clone(), DEFAULT_REQUEST_TIMEOUT);
        let mut state = loaded_state();
        let mut globe = GlobeView::default();
        let weights = Weights::default();

        orch.optimize(&mut state, 0, 2, Algorithm::AntColony, weights).unwrap();
        assert_eq!(orch.controls().label(Operation::Optimize), Operation::Optimize.busy_label());
        assert_eq!(
            orch.optimize(&mut state, 0, 2, Algorithm::AntColony, weights),
            Err(OrchestratorError::AlreadyPending(Operation::Optimize))
        );
        // A different operation is not blocked
        orch.compare(&mut state, 0, 2, weights).unwrap();

        assert!(orch.settle_next(&mut state, &mut globe).await);
        assert!(orch.settle_next(&mut state, &mut globe).await);
        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], Call::Optimize(req) if req.algorithm == "ACO"));
        assert!(!orch.controls().any_pending());
    }

    #[tokio::test]
    async fn test_timeout_fails_and_reenables_control() {
        let backend = Arc::new(FakeBackend {
            stall: Some(Duration::from_secs(30)),
            ..Default::default()
        });
        let mut orch = orchestrator(backend, Duration::from_millis(50));
        let mut state = AppState::default();
        let mut globe = GlobeView::default();

        orch.generate(&mut state, GenerateRequest::random(250, 0.4, None)).unwrap();
        assert!(orch.controls().is_pending(Operation::Generate));
        assert!(orch.settle_next(&mut state, &mut globe).await);

        assert!(orch.controls().is_enabled(Operation::Generate));
        assert!(!state.store.is_loaded());
        let note = state.latest_notification().unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.message, "request timed out after 50ms");
    }

    #[tokio::test]
    async fn test_backend_failure_applies_nothing() {
        let backend = Arc::new(FakeBackend {
            fail_with: Some(RequestError::Backend("No path between source and destination".into())),
            ..Default::default()
        });
        let mut orch = orchestrator(backend, DEFAULT_REQUEST_TIMEOUT);
        let mut state = loaded_state();
        let mut globe = GlobeView::default();

        orch.optimize(&mut state, 0, 2, Algorithm::Genetic, Weights::default()).unwrap();
        assert!(orch.settle_next(&mut state, &mut globe).await);

        assert!(state.results.path.is_none());
        assert!(state.pipeline.highlighted_path().is_none());
        assert_eq!(
            state.latest_notification().unwrap().message,
            "No path between source and destination"
        );
        assert!(orch.controls().is_enabled(Operation::Optimize));
    }

    #[tokio::test]
    async fn test_generate_then_optimize_highlights_path() {
        let backend = Arc::new(FakeBackend::default());
        let mut orch = orchestrator(backend.clone(), DEFAULT_REQUEST_TIMEOUT);
        let mut state = AppState::default();
        let mut globe = GlobeView::default();

        orch.generate(&mut state, GenerateRequest::dataset()).unwrap();
        assert!(orch.settle_next(&mut state, &mut globe).await);
        assert!(state.store.is_loaded());
        assert_eq!(globe.points().len(), 3);

        orch.optimize(&mut state, 0, 2, Algorithm::Genetic, Weights::new(0.5, 0.3, 0.2))
            .unwrap();
        assert!(orch.settle_next(&mut state, &mut globe).await);

        assert!(globe.arcs().iter().all(|arc| arc.style.on_path));
        let role = |id| globe.points().iter().find(|p| p.id == id).unwrap().role;
        assert_eq!(role(0), NodeRole::Source);
        assert_eq!(role(1), NodeRole::Interior);
        assert_eq!(role(2), NodeRole::Destination);
        assert_eq!(state.results.path.as_ref().unwrap().route, "0 → 1 → 2");
        assert_eq!(
            backend.calls()[0],
            Call::Generate(GenerateRequest::Dataset { use_dataset: true })
        );
    }

    #[tokio::test]
    async fn test_result_for_replaced_graph_is_discarded() {
        let backend = Arc::new(FakeBackend {
            optimize_stall: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let mut orch = orchestrator(backend, DEFAULT_REQUEST_TIMEOUT);
        let mut state = loaded_state();
        let mut globe = GlobeView::default();
        let before = state.store.generation();

        orch.optimize(&mut state, 0, 2, Algorithm::Genetic, Weights::default())
            .unwrap();
        orch.generate(&mut state, GenerateRequest::dataset()).unwrap();

        // The generate lands first and replaces the graph
        assert!(orch.settle_next(&mut state, &mut globe).await);
        assert_eq!(state.store.generation(), before + 1);
        assert!(orch.controls().is_pending(Operation::Optimize));

        assert!(orch.settle_next(&mut state, &mut globe).await);
        assert!(state.pipeline.highlighted_path().is_none());
        assert!(state.results.path.is_none());
        assert!(globe.arcs().iter().all(|arc| !arc.style.on_path));
        assert!(orch.controls().is_enabled(Operation::Optimize));
        let note = state.latest_notification().unwrap();
        assert_eq!(note.level, NotificationLevel::Warning);
        assert_eq!(
            note.message,
            "Discarded optimize result computed for a previous network"
        );
    }

    #[tokio::test]
    async fn test_compare_highlights_cheapest() {
        let backend = Arc::new(FakeBackend::default());
        let mut orch = orchestrator(backend, DEFAULT_REQUEST_TIMEOUT);
        let mut state = loaded_state();
        let mut globe = GlobeView::default();

        orch.compare(&mut state, 0, 2, Weights::default()).unwrap();
        assert!(orch.settle_next(&mut state, &mut globe).await);

        assert_eq!(state.pipeline.highlighted_path().unwrap().nodes(), &[0, 1, 2]);
        let rows = &state.results.comparison.as_ref().unwrap().rows;
        assert_eq!(rows[0].algorithm, "GA");
        assert!(rows[1].best);
    }

    #[tokio::test]
    async fn test_poll_is_nonblocking() {
        let backend = Arc::new(FakeBackend {
            stall: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let mut orch = orchestrator(backend, DEFAULT_REQUEST_TIMEOUT);
        let mut state = AppState::default();
        let mut globe = GlobeView::default();

        orch.generate(&mut state, GenerateRequest::dataset()).unwrap();
        assert_eq!(orch.poll(&mut state, &mut globe), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(orch.poll(&mut state, &mut globe), 1);
        assert!(state.store.is_loaded());
    }
}
