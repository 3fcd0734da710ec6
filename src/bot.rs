//! Command dispatcher.
//!
//! Every command runs as its own task. The only shared state is the map of
//! pending follow-up questions, keyed by author; it is locked briefly to
//! register or route an answer and never held across an await.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::aggregate::{RegionIndex, RegionSeries};
use crate::chart::{Chart, ChartRenderer, DailyChart, TotalsChart};
use crate::command::{parse_command, resolve_regions, Command, Operation, ReportStat};
use crate::config::AppConfig;
use crate::error::{BotError, ChartError};
use crate::loader::TableSource;
use crate::output;
use crate::reports::{compose_report, rank, FATALITY_RATIO, RANK_SIZE};
use crate::series::summarize_from;
use crate::window::DateWindow;

/// Grouping key and summed columns of the daily report ranking.
const REPORT_GROUP: &str = "Province_State";
const REPORT_COLUMNS: &[&str] = &["Confirmed", "Deaths"];

/// An inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub author: String,
    pub channel: String,
    pub content: String,
}

/// An outbound reply: text plus an optional chart artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub channel: String,
    pub text: String,
    pub chart: Option<PathBuf>,
}

/// Delivers replies to the conversation they belong to.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, reply: Reply) -> Result<(), BotError>;
}

/// Result of waiting for a follow-up answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    Answered(String),
    TimedOut,
}

/// Wait for `rx` until `deadline` elapses. A dropped sender counts as a
/// timeout.
pub async fn await_reply(rx: oneshot::Receiver<String>, deadline: Duration) -> FollowUp {
    match tokio::time::timeout(deadline, rx).await {
        Ok(Ok(text)) => FollowUp::Answered(text),
        Ok(Err(_)) | Err(_) => FollowUp::TimedOut,
    }
}

/// What became of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a command.
    Ignored,
    /// A reply was delivered.
    Sent,
    /// A handler could not make sense of the command.
    Unhandled,
    /// The improper-format reply was sent for an unhandled command.
    Improper,
    /// A follow-up question went unanswered.
    NoResponse,
    /// A handler failed; an error reply was attempted.
    Failed,
}

#[derive(Clone)]
pub struct Bot {
    config: Arc<AppConfig>,
    source: Arc<dyn TableSource>,
    renderer: Arc<dyn ChartRenderer>,
    responder: Arc<dyn Responder>,
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<String>>>>,
}

impl Bot {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn TableSource>,
        renderer: Arc<dyn ChartRenderer>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            source,
            renderer,
            responder,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<String>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Process messages until the inbox closes, then wait for in-flight
    /// commands to finish.
    pub async fn run(&self, mut inbox: mpsc::Receiver<Message>) {
        let mut tasks = JoinSet::new();
        while let Some(message) = inbox.recv().await {
            if self.route_follow_up(&message) {
                continue;
            }
            if parse_command(&message.content, &self.config.prefix).is_none() {
                continue;
            }
            let bot = self.clone();
            tasks.spawn(async move { bot.handle(message).await });
            while let Some(done) = tasks.try_join_next() {
                if let Err(e) = done {
                    error!(error = %e, "command task panicked");
                }
            }
        }
        while let Some(done) = tasks.join_next().await {
            if let Err(e) = done {
                error!(error = %e, "command task panicked");
            }
        }
    }

    /// Hand `message` to its author's pending follow-up, if any.
    pub fn route_follow_up(&self, message: &Message) -> bool {
        let Some(tx) = self.pending().remove(&message.author) else {
            return false;
        };
        tx.send(message.content.clone()).is_ok()
    }

    /// Ask `message.author` a question and wait for the answer.
    async fn follow_up(&self, message: &Message, prompt: String) -> Result<FollowUp, BotError> {
        let (tx, rx) = oneshot::channel();
        self.pending().insert(message.author.clone(), tx);
        if let Err(e) = self.reply(message, prompt, None).await {
            self.pending().remove(&message.author);
            return Err(e);
        }
        let outcome = await_reply(rx, self.config.reply_timeout).await;
        if outcome == FollowUp::TimedOut {
            let mut pending = self.pending();
            // Only our own (now closed) sender; a newer wait keeps its slot.
            if pending.get(&message.author).is_some_and(oneshot::Sender::is_closed) {
                pending.remove(&message.author);
            }
            debug!(author = %message.author, "follow-up timed out");
        }
        Ok(outcome)
    }

    async fn reply(
        &self,
        message: &Message,
        text: String,
        chart: Option<PathBuf>,
    ) -> Result<(), BotError> {
        self.responder
            .send(Reply {
                channel: message.channel.clone(),
                text,
                chart,
            })
            .await
    }

    /// Send a reply carrying `chart`, then delete the file unless charts are
    /// kept.
    async fn reply_with_chart(
        &self,
        message: &Message,
        text: String,
        chart: PathBuf,
    ) -> Result<(), BotError> {
        let sent = self.reply(message, text, Some(chart.clone())).await;
        if !self.config.keep_charts {
            if let Err(e) = tokio::fs::remove_file(&chart).await {
                warn!(path = %chart.display(), error = %e, "failed to remove chart");
            }
        }
        sent
    }

    async fn render(&self, chart: Chart) -> Result<PathBuf, BotError> {
        let renderer = Arc::clone(&self.renderer);
        let path = tokio::task::spawn_blocking(move || renderer.render(&chart))
            .await
            .map_err(|e| ChartError::Draw(e.to_string()))??;
        Ok(path)
    }

    /// Handle one message end to end and report what happened.
    pub async fn handle(&self, message: Message) -> Outcome {
        let Some(command) = parse_command(&message.content, &self.config.prefix) else {
            return Outcome::Ignored;
        };
        info!(author = %message.author, operation = ?command.operation, "covid request");

        let result = match command.operation {
            Operation::Help => self
                .reply(&message, output::help_text(&self.config.prefix), None)
                .await
                .map(|()| Outcome::Sent),
            Operation::Total | Operation::Daily => self.handle_series(&message, &command).await,
            Operation::Report => self.handle_report(&message, &command).await,
            Operation::Unrecognized => Ok(Outcome::Unhandled),
        };

        match result {
            Ok(Outcome::Unhandled) => {
                warn!(content = %message.content, "improper request");
                let text = output::improper_format_text(&self.config.prefix);
                match self.reply(&message, text, None).await {
                    Ok(()) => Outcome::Improper,
                    Err(e) => {
                        error!(error = %e, "failed to send improper-format reply");
                        Outcome::Failed
                    }
                }
            }
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "request failed");
                if let Err(send_err) = self.reply(&message, output::error_text(&e), None).await {
                    error!(error = %send_err, "failed to send error reply");
                }
                Outcome::Failed
            }
        }
    }

    async fn handle_series(&self, message: &Message, command: &Command) -> Result<Outcome, BotError> {
        let stat = command.stat;
        let table = self.source.time_series(stat).await?;
        let full = DateWindow::full(&table)?;
        // Aggregate over the whole table; `since` only narrows what is shown.
        let shown = match command.since {
            Some(date) => full.since(date)?,
            None => full,
        };

        let index = RegionIndex::build(&table);
        let regions = resolve_regions(&command.words, &index);
        if regions.is_empty() {
            self.reply(message, output::no_region_text(&self.config.prefix), None)
                .await?;
            return Ok(Outcome::Sent);
        }

        let series: Vec<RegionSeries> = regions
            .iter()
            .map(|key| index.aggregate(&table, key, full))
            .collect();
        for s in &series {
            debug!(region = %s.name, rows = s.matched_rows, days = shown.len(), "aggregated region");
        }
        let dates: Vec<_> = shown.dates().iter().map(|c| c.date).collect();

        if command.operation == Operation::Daily {
            let width = self.config.rolling_window;
            for s in &series {
                let summary = summarize_from(&s.values, width, shown.offset());
                let chart = Chart::Daily(DailyChart {
                    title: output::daily_title(&s.name, stat),
                    y_label: output::daily_axis(stat),
                    dates: dates.clone(),
                    daily: summary.daily.clone(),
                    average: summary.rolling.clone(),
                });
                let path = self.render(chart).await?;
                let text = output::daily_text(&s.name, &summary, stat, shown, width);
                self.reply_with_chart(message, text, path).await?;
            }
            return Ok(Outcome::Sent);
        }

        let lines = series
            .iter()
            .map(|s| (s.name.clone(), shown.slice(&s.values).to_vec()))
            .collect();
        let (title, text) = if let [single] = series.as_slice() {
            (
                output::total_title(&single.name, stat),
                output::total_text(single, stat, full),
            )
        } else {
            let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
            (
                output::totals_title(&names, stat),
                output::totals_text(&series, stat),
            )
        };
        let chart = Chart::Totals(TotalsChart {
            title,
            y_label: output::total_axis(stat),
            dates,
            lines,
        });
        let path = self.render(chart).await?;
        self.reply_with_chart(message, text, path).await?;
        Ok(Outcome::Sent)
    }

    async fn handle_report(&self, message: &Message, command: &Command) -> Result<Outcome, BotError> {
        let stat = match command.report_stat {
            Some(stat) => stat,
            None => match self.follow_up(message, output::report_prompt_text()).await? {
                FollowUp::Answered(answer) => match ReportStat::from_word(&answer) {
                    Some(stat) => stat,
                    None => return Ok(Outcome::Unhandled),
                },
                FollowUp::TimedOut => {
                    self.reply(message, output::timeout_text(), None).await?;
                    return Ok(Outcome::NoResponse);
                }
            },
        };

        let table = self.source.daily_report().await?;
        let report = compose_report(&table, REPORT_GROUP, REPORT_COLUMNS)?
            .with_ratio(FATALITY_RATIO, "Deaths", "Confirmed")?;
        let ranking = rank(&report, stat.column(), RANK_SIZE)?;
        info!(
            statistic = %ranking.statistic,
            group = %report.group_column,
            groups = report.rows.len(),
            "ranked daily report"
        );
        self.reply(message, output::report_text(&ranking, stat), None)
            .await?;
        Ok(Outcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::SvgChartRenderer;
    use crate::error::LoadError;
    use crate::loader::parse_report;
    use crate::types::{DateColumn, ReportTable, Stat, TimeSeriesRow, TimeSeriesTable};
    use chrono::NaiveDate;

    struct FixedSource {
        series: TimeSeriesTable,
        report: ReportTable,
    }

    #[async_trait]
    impl TableSource for FixedSource {
        async fn time_series(&self, _stat: Stat) -> Result<TimeSeriesTable, LoadError> {
            Ok(self.series.clone())
        }

        async fn daily_report(&self) -> Result<ReportTable, LoadError> {
            Ok(self.report.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl TableSource for FailingSource {
        async fn time_series(&self, _stat: Stat) -> Result<TimeSeriesTable, LoadError> {
            Err(LoadError::NotFound("confirmed.csv".to_string()))
        }

        async fn daily_report(&self) -> Result<ReportTable, LoadError> {
            Err(LoadError::LookbackExhausted { days: 3 })
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        charts: Mutex<Vec<Chart>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render(&self, chart: &Chart) -> Result<PathBuf, ChartError> {
            let mut charts = self.charts.lock().unwrap();
            charts.push(chart.clone());
            Ok(PathBuf::from(format!("chart-{}.svg", charts.len())))
        }
    }

    #[derive(Default)]
    struct RecordingResponder {
        replies: Mutex<Vec<Reply>>,
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn send(&self, reply: Reply) -> Result<(), BotError> {
            self.replies.lock().unwrap().push(reply);
            Ok(())
        }
    }

    impl RecordingResponder {
        fn texts(&self) -> Vec<String> {
            self.replies.lock().unwrap().iter().map(|r| r.text.clone()).collect()
        }

        async fn wait_for(&self, count: usize) {
            for _ in 0..400 {
                if self.replies.lock().unwrap().len() >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            panic!("timed out waiting for {count} replies");
        }
    }

    fn config(reply_timeout: Duration) -> AppConfig {
        AppConfig {
            prefix: "~covid".to_string(),
            confirmed_url: String::new(),
            deaths_url: String::new(),
            daily_reports_url: String::new(),
            report_lookback_days: 1,
            rolling_window: 2,
            reply_timeout,
            chart_dir: PathBuf::from("charts"),
            keep_charts: true,
            request_timeout_secs: 1,
            user_agent: "test".to_string(),
            log_level: "info".to_string(),
        }
    }

    fn series_table() -> TimeSeriesTable {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let dates = (0..4)
            .map(|i| {
                let date = start + chrono::Days::new(i);
                DateColumn {
                    date,
                    label: crate::util::display_label(date),
                    index: 2 + i as usize,
                }
            })
            .collect();
        let row = |state: &str, values: &[i64]| TimeSeriesRow {
            identity: vec![state.to_string(), "The United States".to_string()],
            values: values.to_vec(),
        };
        TimeSeriesTable {
            identity_headers: vec!["Province_State".to_string(), "Country_Region".to_string()],
            dates,
            rows: vec![row("Alpha", &[0, 5, 5, 10]), row("Beta", &[2, 2, 2, 2])],
        }
    }

    fn report_table() -> ReportTable {
        parse_report(
            "Province_State,Country_Region,Confirmed,Deaths\n\
             Alpha,US,10,1\n\
             Beta,US,0,0\n",
        )
        .unwrap()
    }

    struct Harness {
        bot: Bot,
        renderer: Arc<RecordingRenderer>,
        responder: Arc<RecordingResponder>,
    }

    fn harness(reply_timeout: Duration) -> Harness {
        let renderer = Arc::new(RecordingRenderer::default());
        let responder = Arc::new(RecordingResponder::default());
        let source = Arc::new(FixedSource {
            series: series_table(),
            report: report_table(),
        });
        let bot = Bot::new(config(reply_timeout), source, renderer.clone(), responder.clone());
        Harness {
            bot,
            renderer,
            responder,
        }
    }

    fn message(author: &str, content: &str) -> Message {
        Message {
            author: author.to_string(),
            channel: "general".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn non_commands_are_ignored() {
        let h = harness(Duration::from_secs(1));
        assert_eq!(h.bot.handle(message("a", "hello")).await, Outcome::Ignored);
        assert!(h.responder.texts().is_empty());
    }

    #[tokio::test]
    async fn help_is_sent() {
        let h = harness(Duration::from_secs(1));
        assert_eq!(h.bot.handle(message("a", "~covid help")).await, Outcome::Sent);
        assert!(h.responder.texts()[0].contains("USAGE:"));
    }

    #[tokio::test]
    async fn unrecognized_command_falls_back_to_improper_format() {
        let h = harness(Duration::from_secs(1));
        assert_eq!(h.bot.handle(message("a", "~covid Alpha")).await, Outcome::Improper);
        assert!(h.responder.texts()[0].contains("improper format"));
    }

    #[tokio::test]
    async fn daily_command_renders_delta_and_rolling_average() {
        let h = harness(Duration::from_secs(1));
        assert_eq!(h.bot.handle(message("a", "~covid daily alpha")).await, Outcome::Sent);

        let charts = h.renderer.charts.lock().unwrap().clone();
        assert_eq!(charts.len(), 1);
        let Chart::Daily(chart) = &charts[0] else {
            panic!("expected a daily chart");
        };
        assert_eq!(chart.daily, vec![0, 5, 0, 5]);
        assert_eq!(chart.average, vec![0.0, 2.5, 2.5, 2.5]);

        let replies = h.responder.replies.lock().unwrap().clone();
        assert_eq!(replies[0].chart, Some(PathBuf::from("chart-1.svg")));
        assert!(replies[0].text.starts_with("Alpha had 5 new cases yesterday."));
        assert!(replies[0].text.ends_with("on Mar 2, 2020"));
    }

    #[tokio::test]
    async fn single_total_reports_first_recorded_date() {
        let h = harness(Duration::from_secs(1));
        assert_eq!(h.bot.handle(message("a", "~covid total Alpha")).await, Outcome::Sent);
        assert_eq!(
            h.responder.texts()[0],
            "Alpha has reached 10 cases since the first recorded case there on Mar 2, 2020."
        );
        let charts = h.renderer.charts.lock().unwrap().clone();
        let Chart::Totals(chart) = &charts[0] else {
            panic!("expected a totals chart");
        };
        assert_eq!(chart.lines, vec![("Alpha".to_string(), vec![0, 5, 5, 10])]);
    }

    #[tokio::test]
    async fn multi_total_aggregates_regions_independently() {
        let h = harness(Duration::from_secs(1));
        let outcome = h.bot.handle(message("a", "~covid total beta alpha US")).await;
        assert_eq!(outcome, Outcome::Sent);
        let charts = h.renderer.charts.lock().unwrap().clone();
        let Chart::Totals(chart) = &charts[0] else {
            panic!("expected a totals chart");
        };
        assert_eq!(
            chart.lines,
            vec![
                ("Beta".to_string(), vec![2, 2, 2, 2]),
                ("Alpha".to_string(), vec![0, 5, 5, 10]),
                ("The United States".to_string(), vec![2, 7, 7, 12]),
            ]
        );
        assert_eq!(
            h.responder.texts()[0],
            "Since the first recorded case in the United States:\n\
             Beta has reached 2 Cases\n\
             Alpha has reached 10 Cases\n\
             The United States has reached 12 Cases"
        );
    }

    #[tokio::test]
    async fn since_narrows_the_window() {
        let h = harness(Duration::from_secs(1));
        h.bot.handle(message("a", "~covid total alpha since 3/3/20")).await;
        let charts = h.renderer.charts.lock().unwrap().clone();
        let Chart::Totals(chart) = &charts[0] else {
            panic!("expected a totals chart");
        };
        assert_eq!(chart.dates.len(), 2);
        assert_eq!(chart.lines[0].1, vec![5, 10]);
        assert_eq!(
            h.responder.texts()[0],
            "Alpha has reached 10 cases since the first recorded case there on Mar 2, 2020."
        );
    }

    #[tokio::test]
    async fn daily_since_keeps_true_deltas_and_peak_date() {
        let h = harness(Duration::from_secs(1));
        let outcome = h.bot.handle(message("a", "~covid daily alpha since 3/3/20")).await;
        assert_eq!(outcome, Outcome::Sent);

        let charts = h.renderer.charts.lock().unwrap().clone();
        let Chart::Daily(chart) = &charts[0] else {
            panic!("expected a daily chart");
        };
        assert_eq!(chart.dates.len(), 2);
        assert_eq!(chart.daily, vec![0, 5]);
        assert_eq!(chart.average, vec![2.5, 2.5]);

        let text = &h.responder.texts()[0];
        assert!(text.starts_with("Alpha had 5 new cases yesterday."), "{text}");
        assert!(text.ends_with("The max number of cases in a day was 5, on Mar 4, 2020"), "{text}");
    }

    #[tokio::test]
    async fn since_after_last_date_is_reported_as_out_of_range() {
        let h = harness(Duration::from_secs(1));
        let outcome = h.bot.handle(message("a", "~covid total alpha since 1/1/25")).await;
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(
            h.responder.texts()[0],
            "There is no data on or after Jan 1, 2025. The latest available date is Mar 4, 2020."
        );
        assert!(h.renderer.charts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sent_charts_are_removed_unless_kept() {
        let dir = tempfile::tempdir().unwrap();
        let responder = Arc::new(RecordingResponder::default());
        let mut cfg = config(Duration::from_secs(1));
        cfg.keep_charts = false;
        let bot = Bot::new(
            cfg,
            Arc::new(FixedSource {
                series: series_table(),
                report: report_table(),
            }),
            Arc::new(SvgChartRenderer::new(dir.path())),
            responder.clone(),
        );

        assert_eq!(bot.handle(message("a", "~covid total alpha")).await, Outcome::Sent);
        let replies = responder.replies.lock().unwrap().clone();
        let path = replies[0].chart.clone().unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unknown_region_is_reported_without_rendering() {
        let h = harness(Duration::from_secs(1));
        assert_eq!(h.bot.handle(message("a", "~covid total Atlantis")).await, Outcome::Sent);
        assert!(h.responder.texts()[0].starts_with("I couldn't find"));
        assert!(h.renderer.charts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_with_named_statistic_excludes_undefined_ratio() {
        let h = harness(Duration::from_secs(1));
        let outcome = h.bot.handle(message("a", "~covid report fatality")).await;
        assert_eq!(outcome, Outcome::Sent);
        let text = &h.responder.texts()[0];
        assert!(text.contains("Alpha with 10.00%"));
        assert!(!text.contains("Beta"));
    }

    #[tokio::test]
    async fn report_asks_follow_up_and_uses_answer() {
        let h = harness(Duration::from_secs(2));
        let bot = h.bot.clone();
        let task = tokio::spawn(async move { bot.handle(message("alice", "~covid report")).await });

        h.responder.wait_for(1).await;
        assert!(h.responder.texts()[0].starts_with("Which statistic"));
        assert!(h.bot.route_follow_up(&message("alice", "deaths")));

        assert_eq!(task.await.unwrap(), Outcome::Sent);
        let texts = h.responder.texts();
        assert!(texts[1].contains("by death toll"));
        assert!(texts[1].contains("Alpha with 1 deaths"));
    }

    #[tokio::test]
    async fn unanswered_follow_up_times_out_cleanly() {
        let h = harness(Duration::from_millis(50));
        let outcome = h.bot.handle(message("alice", "~covid report")).await;
        assert_eq!(outcome, Outcome::NoResponse);
        assert_eq!(h.responder.texts()[1], output::timeout_text());
        assert!(h.bot.pending().is_empty());
        assert!(!h.bot.route_follow_up(&message("alice", "1")));
    }

    #[tokio::test]
    async fn unparseable_answer_is_improper() {
        let h = harness(Duration::from_secs(2));
        let bot = h.bot.clone();
        let task = tokio::spawn(async move { bot.handle(message("alice", "~covid report")).await });
        h.responder.wait_for(1).await;
        assert!(h.bot.route_follow_up(&message("alice", "whatever")));
        assert_eq!(task.await.unwrap(), Outcome::Improper);
    }

    #[tokio::test]
    async fn pending_follow_up_does_not_block_other_users() {
        let h = harness(Duration::from_secs(2));
        let (tx, rx) = mpsc::channel(8);
        let bot = h.bot.clone();
        let runner = tokio::spawn(async move { bot.run(rx).await });

        tx.send(message("alice", "~covid report")).await.unwrap();
        h.responder.wait_for(1).await;

        tx.send(message("bob", "~covid total alpha")).await.unwrap();
        h.responder.wait_for(2).await;
        assert!(h.responder.texts()[1].starts_with("Alpha has reached 10 cases"));

        tx.send(message("alice", "confirmed")).await.unwrap();
        h.responder.wait_for(3).await;
        assert!(h.responder.texts()[2].contains("by confirmed case count"));

        drop(tx);
        runner.await.unwrap();
    }

    #[tokio::test]
    async fn load_failures_become_error_replies() {
        let renderer = Arc::new(RecordingRenderer::default());
        let responder = Arc::new(RecordingResponder::default());
        let bot = Bot::new(
            config(Duration::from_secs(1)),
            Arc::new(FailingSource),
            renderer,
            responder.clone(),
        );
        assert_eq!(bot.handle(message("a", "~covid daily alpha")).await, Outcome::Failed);
        assert_eq!(bot.handle(message("a", "~covid report deaths")).await, Outcome::Failed);
        let texts = responder.texts();
        assert!(texts[0].starts_with("I couldn't fetch the data"));
        assert!(texts[1].starts_with("No recent daily report"));
    }

    #[tokio::test]
    async fn await_reply_distinguishes_answer_and_deadline() {
        let (tx, rx) = oneshot::channel();
        tx.send("yes".to_string()).unwrap();
        assert_eq!(
            await_reply(rx, Duration::from_millis(10)).await,
            FollowUp::Answered("yes".to_string())
        );

        let (_tx, rx) = oneshot::channel::<String>();
        assert_eq!(await_reply(rx, Duration::from_millis(10)).await, FollowUp::TimedOut);
    }
}
