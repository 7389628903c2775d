//! Periodic refresh of the dashboard.
//!
//! A [`RefreshOrchestrator`] fetches the history of every charted key
//! concurrently, folds each into a [`MonthlySeries`] and hands whole series
//! to injected [`RenderTarget`]s. A failed refresh is retried as a unit;
//! when retries run out the previous render stays on screen.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use ecowatch_types::{HistoryWindow, MonthlySeries, MONTHS_PER_SERIES};

use crate::data::{
    aggregate_monthly, chart_keys, trailing_window, ChartId, ChartSpec, Dataset, DisplayRules,
    MonthLocale,
};
use crate::retry::{retry_with, RetryPolicy};
use crate::source::{is_transient_message, FetchError, FetchOutcome, HistoryFetcher};

/// The series of one chart, in dataset order.
pub type ChartSeries = Vec<(Dataset, MonthlySeries)>;

/// Receives every dataset of one chart at once.
///
/// Each call replaces whatever was shown before.
pub trait RenderTarget: Send + Sync {
    /// Replace the chart's datasets.
    fn replace_series(&self, chart: ChartId, series: ChartSeries);
}

/// Receives the formatted current values.
pub trait ValueTarget: Send + Sync {
    /// Replace the displayed values (key to display text).
    fn replace_values(&self, values: BTreeMap<String, String>);
}

/// Errors that fail a whole refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// A per-key fetch task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    Task(#[from] JoinError),

    /// A key's history could not be fetched within the fetch retry budget.
    #[error("history of {key} unavailable: {source}")]
    Fetch {
        /// The key that failed.
        key: String,
        /// Last fetch error.
        source: FetchError,
    },

    /// The clock is outside the representable date range.
    #[error("cannot compute a history window for {0}")]
    Window(String),
}

/// Out-of-band requests for an extra refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshSignal {
    /// Refresh now.
    Manual,
    /// A failure surfaced outside the normal retry path. Triggers a refresh
    /// only when the message names a transient condition.
    Failure(String),
}

/// A chart and where its series go.
#[derive(Clone)]
struct ChartBinding {
    spec: ChartSpec,
    target: Arc<dyn RenderTarget>,
}

/// Coordinates fetch and aggregate cycles across every charted key.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use ecowatch::data::{ChartId, ChartSpec};
/// use ecowatch::refresh::{ChartSeries, RefreshOrchestrator, RenderTarget};
/// use ecowatch::source::{HistoryFetcher, ProxyClient};
///
/// struct Print;
///
/// impl RenderTarget for Print {
///     fn replace_series(&self, chart: ChartId, series: ChartSeries) {
///         for (dataset, values) in series {
///             println!("{:?} {}: {:?}", chart, dataset.label, values.values());
///         }
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Arc::new(ProxyClient::new("http://localhost:3000")?);
///     let orchestrator = RefreshOrchestrator::builder(HistoryFetcher::new(client))
///         .chart(ChartSpec::co2(), Arc::new(Print))
///         .build();
///
///     let handle = Arc::new(orchestrator).start(Duration::from_secs(60));
///     tokio::time::sleep(Duration::from_secs(300)).await;
///     handle.stop();
///     Ok(())
/// }
/// ```
pub struct RefreshOrchestrator {
    fetcher: HistoryFetcher,
    charts: Vec<ChartBinding>,
    values: Option<(DisplayRules, Arc<dyn ValueTarget>)>,
    locale: MonthLocale,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RefreshOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshOrchestrator")
            .field("fetcher", &self.fetcher)
            .field("charts", &self.charts.iter().map(|c| c.spec.id).collect::<Vec<_>>())
            .field("locale", &self.locale)
            .field("policy", &self.policy)
            .finish()
    }
}

impl RefreshOrchestrator {
    /// Five retries, one second apart.
    pub const DEFAULT_POLICY: RetryPolicy = RetryPolicy::fixed(5, Duration::from_secs(1));

    /// Create a builder around a fetcher.
    pub fn builder(fetcher: HistoryFetcher) -> RefreshOrchestratorBuilder {
        RefreshOrchestratorBuilder::new(fetcher)
    }

    /// Every key any configured chart needs.
    pub fn keys(&self) -> BTreeSet<String> {
        let specs: Vec<ChartSpec> = self.charts.iter().map(|c| c.spec.clone()).collect();
        chart_keys(&specs)
    }

    /// Fetch `keys` concurrently and aggregate each, relative to the
    /// current local time.
    pub async fn refresh(
        &self,
        keys: &BTreeSet<String>,
        window: HistoryWindow,
    ) -> Result<BTreeMap<String, MonthlySeries>, RefreshError> {
        self.refresh_at(keys, window, &Local::now()).await
    }

    /// Like [`refresh`](Self::refresh), bucketing relative to `now`.
    ///
    /// All keys finish before anything is aggregated. Any failed key or
    /// dead task fails the whole refresh, so callers never see a partial one.
    pub async fn refresh_at<Tz: TimeZone>(
        &self,
        keys: &BTreeSet<String>,
        window: HistoryWindow,
        now: &DateTime<Tz>,
    ) -> Result<BTreeMap<String, MonthlySeries>, RefreshError> {
        let mut tasks = JoinSet::new();
        for key in keys {
            let fetcher = self.fetcher.clone();
            let key = key.clone();
            tasks.spawn(async move {
                let outcome = fetcher.fetch_outcome(&key, window).await;
                (key, outcome)
            });
        }

        let mut fetched = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (key, outcome) = joined?;
            fetched.insert(key, outcome);
        }

        let mut series = BTreeMap::new();
        for (key, outcome) in fetched {
            let samples = match outcome {
                FetchOutcome::Samples(samples) => samples,
                FetchOutcome::Failed(source) => return Err(RefreshError::Fetch { key, source }),
            };
            series.insert(key, aggregate_monthly(&samples, now, self.locale));
        }
        Ok(series)
    }

    /// Refresh every chart over the trailing 12 months and render the result.
    ///
    /// The whole refresh is retried under the orchestrator's policy. On
    /// exhaustion the error is logged and returned and nothing is rendered.
    pub async fn refresh_charts(&self) -> Result<(), RefreshError> {
        let keys = self.keys();
        let result = retry_with("chart refresh", &self.policy, |_| true, |_| {
            let keys = &keys;
            async move {
                let now = Local::now();
                let window = trailing_window(&now, MONTHS_PER_SERIES as u32)
                    .ok_or_else(|| RefreshError::Window(now.to_rfc3339()))?;
                self.refresh_at(keys, window, &now).await
            }
        })
        .await;

        match result {
            Ok(series) => {
                self.render(&series);
                info!("Charts refreshed ({} keys)", series.len());
                Ok(())
            }
            Err(e) => {
                error!(
                    "Chart refresh failed after {} attempts, keeping previous data: {}",
                    self.policy.max_attempts(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Hand each chart its datasets.
    fn render(&self, series: &BTreeMap<String, MonthlySeries>) {
        for binding in &self.charts {
            let datasets: ChartSeries = binding
                .spec
                .datasets
                .iter()
                .filter_map(|d| series.get(d.key).map(|s| (d.clone(), s.clone())))
                .collect();
            binding.target.replace_series(binding.spec.id, datasets);
        }
    }

    /// Fetch and format the current values, if a value target is configured.
    pub async fn refresh_values(&self) -> Result<(), FetchError> {
        let Some((rules, target)) = &self.values else {
            return Ok(());
        };

        let latest = self.fetcher.fetch_latest().await?;
        let formatted = rules.format_latest(&latest);
        debug!("Current values refreshed ({} keys)", formatted.len());
        target.replace_values(formatted);
        Ok(())
    }

    /// One timer cycle: charts and current values side by side.
    ///
    /// A current-values failure is reported on `signals`.
    async fn cycle(&self, signals: &mpsc::UnboundedSender<RefreshSignal>) {
        let (_, values) = tokio::join!(self.refresh_charts(), self.refresh_values());
        if let Err(e) = values {
            warn!("Current values refresh failed: {}", e);
            let _ = signals.send(RefreshSignal::Failure(e.to_string()));
        }
    }

    /// Run refresh cycles every `interval` until the handle is stopped.
    ///
    /// Every tick spawns its own cycle, so a slow cycle may overlap the
    /// next one; whichever renders last wins.
    pub fn start(self: &Arc<Self>, interval: Duration) -> RefreshHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let orchestrator = self.clone();
        let failures = signal_tx.clone();

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let orchestrator = orchestrator.clone();
                        let failures = failures.clone();
                        tokio::spawn(async move { orchestrator.cycle(&failures).await });
                    }
                    Some(signal) = signal_rx.recv() => {
                        if !should_refresh(&signal) {
                            debug!("Ignoring {:?}", signal);
                            continue;
                        }
                        info!("Extra refresh requested: {:?}", signal);
                        let orchestrator = orchestrator.clone();
                        match signal {
                            RefreshSignal::Manual => {
                                let failures = failures.clone();
                                tokio::spawn(async move { orchestrator.cycle(&failures).await });
                            }
                            RefreshSignal::Failure(_) => {
                                tokio::spawn(async move { orchestrator.refresh_charts().await });
                            }
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            debug!("Refresh loop stopped");
                            break;
                        }
                    }
                }
            }
        });

        RefreshHandle { stop_tx, signal_tx }
    }
}

/// Whether a signal warrants an extra refresh.
pub fn should_refresh(signal: &RefreshSignal) -> bool {
    match signal {
        RefreshSignal::Manual => true,
        RefreshSignal::Failure(message) => is_transient_message(message),
    }
}

/// Builder for configuring a [`RefreshOrchestrator`].
pub struct RefreshOrchestratorBuilder {
    fetcher: HistoryFetcher,
    charts: Vec<ChartBinding>,
    values: Option<(DisplayRules, Arc<dyn ValueTarget>)>,
    locale: MonthLocale,
    policy: Option<RetryPolicy>,
}

impl RefreshOrchestratorBuilder {
    /// Create a new builder.
    pub fn new(fetcher: HistoryFetcher) -> Self {
        Self {
            fetcher,
            charts: Vec::new(),
            values: None,
            locale: MonthLocale::default(),
            policy: None,
        }
    }

    /// Add a chart and its render target.
    pub fn chart(mut self, spec: ChartSpec, target: Arc<dyn RenderTarget>) -> Self {
        self.charts.push(ChartBinding { spec, target });
        self
    }

    /// Also refresh current values every cycle.
    pub fn values(mut self, rules: DisplayRules, target: Arc<dyn ValueTarget>) -> Self {
        self.values = Some((rules, target));
        self
    }

    /// Set the month label language.
    pub fn locale(mut self, locale: MonthLocale) -> Self {
        self.locale = locale;
        self
    }

    /// Set the whole-refresh retry policy.
    ///
    /// Defaults to [`RefreshOrchestrator::DEFAULT_POLICY`].
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> RefreshOrchestrator {
        RefreshOrchestrator {
            fetcher: self.fetcher,
            charts: self.charts,
            values: self.values,
            locale: self.locale,
            policy: self.policy.unwrap_or(RefreshOrchestrator::DEFAULT_POLICY),
        }
    }
}

/// Handle for controlling the background refresh loop.
///
/// Drop this handle to stop the loop, or call `stop()` explicitly.
#[derive(Debug)]
pub struct RefreshHandle {
    stop_tx: watch::Sender<bool>,
    signal_tx: mpsc::UnboundedSender<RefreshSignal>,
}

impl RefreshHandle {
    /// Ask for an extra refresh.
    pub fn signal(&self, signal: RefreshSignal) {
        let _ = self.signal_tx.send(signal);
    }

    /// Shorthand for [`RefreshSignal::Manual`].
    pub fn refresh_now(&self) {
        self.signal(RefreshSignal::Manual);
    }

    /// Stop the refresh loop. Cycles already running finish on their own.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use ecowatch_types::{LatestValues, Sample};
    use parking_lot::Mutex;

    use crate::source::scripted::{
        auth_failure, not_found, server_error, ScriptedClient, PANIC_KEY,
    };

    #[derive(Default)]
    struct Recorder {
        renders: Mutex<Vec<(ChartId, ChartSeries)>>,
        values: Mutex<Vec<BTreeMap<String, String>>>,
    }

    impl Recorder {
        fn renders_of(&self, chart: ChartId) -> usize {
            self.renders.lock().iter().filter(|(id, _)| *id == chart).count()
        }

        fn last(&self, chart: ChartId) -> Option<ChartSeries> {
            self.renders
                .lock()
                .iter()
                .rev()
                .find(|(id, _)| *id == chart)
                .map(|(_, s)| s.clone())
        }
    }

    impl RenderTarget for Recorder {
        fn replace_series(&self, chart: ChartId, series: ChartSeries) {
            self.renders.lock().push((chart, series));
        }
    }

    impl ValueTarget for Recorder {
        fn replace_values(&self, values: BTreeMap<String, String>) {
            self.values.lock().push(values);
        }
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn panicking_chart() -> ChartSpec {
        ChartSpec {
            id: ChartId::Co2,
            title: "broken",
            datasets: vec![Dataset {
                key: PANIC_KEY,
                label: "broken",
                unit: "",
            }],
        }
    }

    fn orchestrator(
        client: &Arc<ScriptedClient>,
        recorder: &Arc<Recorder>,
    ) -> RefreshOrchestratorBuilder {
        RefreshOrchestrator::builder(HistoryFetcher::new(client.clone()))
            .chart(ChartSpec::co2(), recorder.clone())
            .chart(ChartSpec::energy(), recorder.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_returns_series_for_every_key() {
        let client = Arc::new(
            ScriptedClient::new()
                .script("co2evitado", vec![Ok(vec![Sample::new(now_ms(), "12,5")])])
                .script("co2emitido", vec![Ok(vec![])]),
        );
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&client, &recorder).build();

        let keys = orchestrator.keys();
        let now = Utc::now();
        let window = trailing_window(&now, 12).unwrap();
        let series = orchestrator.refresh_at(&keys, window, &now).await.unwrap();

        assert_eq!(series.len(), 4);
        assert!(series.values().all(|s| s.len() == 12));
        assert_eq!(series["co2evitado"].values().last(), Some(&12.5));
        assert_eq!(series["co2emitido"].total(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_fails_when_any_key_fails() {
        let client = Arc::new(
            ScriptedClient::new()
                .script("co2evitado", vec![Ok(vec![Sample::new(now_ms(), "12,5")])])
                .script("co2emitido", vec![Err(not_found())]),
        );
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&client, &recorder).build();

        let keys = orchestrator.keys();
        let now = Utc::now();
        let window = trailing_window(&now, 12).unwrap();
        let result = orchestrator.refresh_at(&keys, window, &now).await;

        match result {
            Err(RefreshError::Fetch { key, source }) => {
                assert_eq!(key, "co2emitido");
                assert_eq!(source, not_found());
            }
            other => panic!("expected a fetch error, got {:?}", other),
        }
        assert_eq!(client.calls("co2emitido"), 1);
        assert_eq!(client.calls("co2evitado"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_is_not_rendered() {
        let client = Arc::new(
            ScriptedClient::new()
                .script("co2evitado", vec![Ok(vec![Sample::new(now_ms(), "10")])])
                .script("co2emitido", vec![Err(server_error())]),
        );
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&client, &recorder).build();
        let started = tokio::time::Instant::now();

        let result = orchestrator.refresh_charts().await;

        assert!(matches!(result, Err(RefreshError::Fetch { ref key, .. }) if key == "co2emitido"));
        // Six whole attempts, each spending the four-call fetch budget.
        assert_eq!(client.calls("co2emitido"), 6 * 4);
        assert_eq!(client.calls("co2evitado"), 6);
        // 3 s of fetch backoff per attempt plus 1 s between attempts.
        assert_eq!(started.elapsed(), Duration::from_secs(6 * 3 + 5));
        assert!(recorder.renders.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_fetch_failure_keeps_previous_render() {
        let client = Arc::new(
            ScriptedClient::new()
                .script(
                    "co2evitado",
                    vec![Ok(vec![Sample::new(now_ms(), "10")]), Err(server_error())],
                )
                .script(
                    "co2emitido",
                    vec![Ok(vec![Sample::new(now_ms(), "4")]), Err(server_error())],
                ),
        );
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&client, &recorder).build();

        orchestrator.refresh_charts().await.unwrap();
        let before: Vec<f64> = recorder
            .last(ChartId::Co2)
            .unwrap()
            .iter()
            .map(|(_, s)| s.total())
            .collect();
        assert_eq!(before, vec![10.0, 4.0]);

        assert!(orchestrator.refresh_charts().await.is_err());

        assert_eq!(recorder.renders_of(ChartId::Co2), 1);
        assert_eq!(recorder.renders_of(ChartId::Energy), 1);
        let after: Vec<f64> = recorder
            .last(ChartId::Co2)
            .unwrap()
            .iter()
            .map(|(_, s)| s.total())
            .collect();
        assert_eq!(after, before);
        assert_eq!(client.calls("co2evitado"), 1 + 6 * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_recovers_on_next_whole_attempt() {
        let client = Arc::new(ScriptedClient::new().script(
            "energiaredeconsumida",
            vec![
                Err(server_error()),
                Err(server_error()),
                Err(server_error()),
                Err(server_error()),
                Ok(vec![Sample::new(now_ms(), "7")]),
            ],
        ));
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&client, &recorder).build();

        orchestrator.refresh_charts().await.unwrap();

        assert_eq!(client.calls("energiaredeconsumida"), 5);
        assert_eq!(recorder.renders_of(ChartId::Energy), 1);
        let energy = recorder.last(ChartId::Energy).unwrap();
        assert_eq!(energy[1].1.total(), 7.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_charts_replaces_whole_series() {
        let client = Arc::new(
            ScriptedClient::new()
                .script(
                    "energiasolarconsumida",
                    vec![
                        Ok(vec![Sample::new(now_ms(), "10")]),
                        Ok(vec![Sample::new(now_ms(), "20")]),
                    ],
                )
                .script("energiaredeconsumida", vec![Ok(vec![Sample::new(now_ms(), "5")])]),
        );
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&client, &recorder).build();

        orchestrator.refresh_charts().await.unwrap();
        orchestrator.refresh_charts().await.unwrap();

        assert_eq!(recorder.renders_of(ChartId::Energy), 2);
        assert_eq!(recorder.renders_of(ChartId::Co2), 2);

        let energy = recorder.last(ChartId::Energy).unwrap();
        let keys: Vec<_> = energy.iter().map(|(d, _)| d.key).collect();
        assert_eq!(keys, vec!["energiasolarconsumida", "energiaredeconsumida"]);
        assert_eq!(energy[0].1.values().last(), Some(&20.0));
        assert_eq!(energy[0].1.len(), 12);
        assert_eq!(energy[1].1.values().last(), Some(&5.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_failure_retries_then_keeps_previous_render() {
        let client = Arc::new(ScriptedClient::new());
        let recorder = Arc::new(Recorder::default());
        let orchestrator = RefreshOrchestrator::builder(HistoryFetcher::new(client.clone()))
            .chart(panicking_chart(), recorder.clone())
            .build();
        let started = tokio::time::Instant::now();

        let result = orchestrator.refresh_charts().await;

        assert!(matches!(result, Err(RefreshError::Task(_))));
        assert_eq!(client.calls(PANIC_KEY), 6);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert!(recorder.renders.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_refresh_policy() {
        let client = Arc::new(ScriptedClient::new());
        let recorder = Arc::new(Recorder::default());
        let orchestrator = RefreshOrchestrator::builder(HistoryFetcher::new(client.clone()))
            .chart(panicking_chart(), recorder.clone())
            .retry_policy(RetryPolicy::fixed(2, Duration::from_millis(100)))
            .build();

        assert!(orchestrator.refresh_charts().await.is_err());
        assert_eq!(client.calls(PANIC_KEY), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_values_formats_latest() {
        let mut latest = LatestValues::new();
        latest.insert("tempEx".to_string(), vec![Sample::new(now_ms(), "21,6")]);
        latest.insert("co2evitadototal".to_string(), vec![Sample::new(now_ms(), "3,14159")]);
        let client = Arc::new(ScriptedClient::new().script_latest(vec![Ok(latest)]));
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(&client, &recorder)
            .values(DisplayRules::default(), recorder.clone())
            .build();

        orchestrator.refresh_values().await.unwrap();

        let values = recorder.values.lock();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["tempEx"], "22");
        assert_eq!(values[0]["co2evitadototal"], "3.14");
    }

    #[test]
    fn test_should_refresh() {
        assert!(should_refresh(&RefreshSignal::Manual));
        assert!(should_refresh(&RefreshSignal::Failure("HTTP 500: upstream_error".into())));
        assert!(should_refresh(&RefreshSignal::Failure(
            "Failed to authenticate with ThingsBoard".into()
        )));
        assert!(!should_refresh(&RefreshSignal::Failure("HTTP 404: Page not found".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ticks_and_handles_signals() {
        let client = Arc::new(ScriptedClient::new());
        let recorder = Arc::new(Recorder::default());
        let orchestrator = Arc::new(orchestrator(&client, &recorder).build());

        let handle = orchestrator.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(recorder.renders_of(ChartId::Co2), 1);

        handle.refresh_now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(recorder.renders_of(ChartId::Co2), 2);

        handle.signal(RefreshSignal::Failure("HTTP 404: Page not found".into()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(recorder.renders_of(ChartId::Co2), 2);

        handle.signal(RefreshSignal::Failure("HTTP 500: upstream_error".into()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(recorder.renders_of(ChartId::Co2), 3);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(recorder.renders_of(ChartId::Co2), 4);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(recorder.renders_of(ChartId::Co2), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_failure_triggers_chart_refresh() {
        let client = Arc::new(ScriptedClient::new().script_latest(vec![Err(auth_failure())]));
        let recorder = Arc::new(Recorder::default());
        let orchestrator = Arc::new(
            orchestrator(&client, &recorder)
                .values(DisplayRules::default(), recorder.clone())
                .build(),
        );

        let handle = orchestrator.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Tick render plus the one requested by the auth failure.
        assert_eq!(recorder.renders_of(ChartId::Co2), 2);
        assert_eq!(client.latest_calls(), 4);
        assert!(recorder.values.lock().is_empty());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_value_failure_is_ignored() {
        let client = Arc::new(ScriptedClient::new().script_latest(vec![Err(not_found())]));
        let recorder = Arc::new(Recorder::default());
        let orchestrator = Arc::new(
            orchestrator(&client, &recorder)
                .values(DisplayRules::default(), recorder.clone())
                .build(),
        );

        let handle = orchestrator.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(recorder.renders_of(ChartId::Co2), 1);
        assert_eq!(client.latest_calls(), 1);
        handle.stop();
    }
}
