//! Batch Builder - 標準衣類の週次クロスイベントバッチ
//!
//! パーソナライズ品はイベントごとの clothing_order パイプラインで発注しますが、
//! 標準（非パーソナライズ）衣類は多くのイベントにまたがって売れるため、
//! ISO 週単位でまとめて 1 回発注します。
//!
//! # 冪等性
//! batch_id は週から決定的に決まる（"STD-<year>-W<week>"）。作成前に
//! cancelled 以外の既存バッチタスクを batch_id で探し、あれば新しく作らず
//! 既存タスクを返します（集計は都度再計算。キャッシュしない）。
//! cron が同じ週に何度走っても、バッチタスクは週に 1 つしかできません。
//! completed も作成をブロックします: 発注済みの週を再バッチすると、
//! 同じ注文を 2 つ目のタスクがカバーして二重フルフィルメントになるためです。
//!
//! cancelled のバッチタスクだけは未発注のまま放棄された状態なので無視し、
//! 新しいバッチを作ります（注文は毎回取り直すので古い集計を引きずらない）。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{OrderAggregate, aggregate};
use crate::catalog;
use crate::deadline::compute_deadline;
use crate::domain::{
    EventId, Order, TaskDraft, TaskRecord, TaskStatus, TsumugiError,
    template::STANDARD_CLOTHING_BATCH,
};
use crate::ports::{Clock, RecordStore};

/// A Monday..Sunday ISO week window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The previous ISO week (Monday..Sunday) relative to `reference`.
///
/// cron は週明けに走り、閉じたばかりの週を対象にする。
pub fn week_range(reference: NaiveDate) -> WeekRange {
    let days_from_monday = reference.weekday().num_days_from_monday() as i64;
    let this_monday = reference - Duration::days(days_from_monday);
    let start = this_monday - Duration::days(7);
    WeekRange {
        start,
        end: start + Duration::days(6),
    }
}

/// Deterministic batch identity for the week starting at `start`.
pub fn batch_id_for(start: NaiveDate) -> String {
    let week = start.iso_week();
    format!("STD-{}-W{:02}", week.year(), week.week())
}

/// Parse a batch_id back into its week window (for recomputing views).
pub fn week_range_of_batch_id(batch_id: &str) -> Option<WeekRange> {
    let rest = batch_id.strip_prefix("STD-")?;
    let (year, week) = rest.split_once("-W")?;
    let year: i32 = year.parse().ok()?;
    let week: u32 = week.parse().ok()?;
    let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
    Some(WeekRange {
        start,
        end: start + Duration::days(6),
    })
}

/// Cross-event weekly aggregate view (recomputed on read, never persisted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardClothingBatch {
    pub batch_id: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    #[serde(flatten)]
    pub aggregate: OrderAggregate,
    pub event_record_ids: Vec<EventId>,
    pub event_names: Vec<String>,
}

/// What one batch-build pass did.
#[derive(Debug, Clone)]
pub enum BatchRunOutcome {
    /// 対象注文なし。静かにスキップする（エラーではない）。
    Skipped,
    /// プレビュー: タスクは作らず集計だけ返す。
    DryRun(StandardClothingBatch),
    /// 新しいバッチタスクを作った。
    Created {
        task: TaskRecord,
        batch: StandardClothingBatch,
    },
    /// この週のバッチタスク（pending または completed）が既にあった。
    /// 集計は再計算済み。
    AlreadyExists {
        task: TaskRecord,
        batch: StandardClothingBatch,
    },
}

pub struct BatchBuilder {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl BatchBuilder {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Aggregate the standard-clothing orders of `range`.
    ///
    /// Returns `None` when no qualifying orders exist（「今週は何もない」は
    /// 失敗ではない）。ストア障害はそのまま Upstream で伝播する。
    pub async fn find_standard_orders_for_week(
        &self,
        range: WeekRange,
    ) -> Result<Option<StandardClothingBatch>, TsumugiError> {
        let orders = self
            .store
            .get_orders_in_date_range(range.start, range.end)
            .await?;

        let qualifying: Vec<&Order> = orders
            .iter()
            .filter(|o| o.items.iter().any(|i| catalog::is_standard(&i.variant)))
            .collect();

        if qualifying.is_empty() {
            return Ok(None);
        }

        let agg = aggregate(qualifying.iter().copied(), catalog::resolve_standard);

        // 触れたイベントを表示用に集める（id で重複排除、名前順は id に従う）
        let mut events: BTreeMap<EventId, String> = BTreeMap::new();
        for order in &qualifying {
            if let Some(event_id) = &order.event_id {
                let name = order.event_name.clone().unwrap_or_default();
                events.entry(event_id.clone()).or_insert(name);
            }
        }

        Ok(Some(StandardClothingBatch {
            batch_id: batch_id_for(range.start),
            week_start: range.start,
            week_end: range.end,
            aggregate: agg,
            event_record_ids: events.keys().cloned().collect(),
            event_names: events.into_values().collect(),
        }))
    }

    /// Run one batch-build pass for the week before `self.clock.today()`.
    pub async fn run(&self, dry_run: bool) -> Result<BatchRunOutcome, TsumugiError> {
        let started = Instant::now();
        let range = week_range(self.clock.today());

        let result = self.run_for_week(range, dry_run).await;

        match &result {
            Ok(outcome) => info!(
                week_start = %range.start,
                elapsed_ms = started.elapsed().as_millis() as u64,
                outcome = outcome.label(),
                "batch-build pass finished"
            ),
            Err(err) => info!(
                week_start = %range.start,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "batch-build pass failed"
            ),
        }

        result
    }

    /// Run one batch-build pass for an explicit week window.
    pub async fn run_for_week(
        &self,
        range: WeekRange,
        dry_run: bool,
    ) -> Result<BatchRunOutcome, TsumugiError> {
        let Some(batch) = self.find_standard_orders_for_week(range).await? else {
            return Ok(BatchRunOutcome::Skipped);
        };

        if dry_run {
            return Ok(BatchRunOutcome::DryRun(batch));
        }

        // 週に 1 つの不変条件: cancelled 以外のタスクが既にあれば作らない。
        // pending は作業中、completed は発注済みで、どちらの週も再バッチすると
        // 同じ注文を二重にカバーしてしまう。cancelled だけは未発注のまま
        // 放棄された状態なので無視し、新しいバッチを作る。
        let existing = self.store.find_tasks_by_batch_id(&batch.batch_id).await?;
        if let Some(task) = existing
            .into_iter()
            .find(|t| t.status != TaskStatus::Cancelled)
        {
            return Ok(BatchRunOutcome::AlreadyExists { task, batch });
        }

        // バッチの締切は対象週の日曜を基準にした雛形オフセット。
        let deadline = compute_deadline(range.end, STANDARD_CLOTHING_BATCH.timeline_offset)?;

        let task = self
            .store
            .create_task(TaskDraft {
                template_id: STANDARD_CLOTHING_BATCH.id.to_string(),
                event_id: None,
                event_ids: batch.event_record_ids.clone(),
                batch_id: Some(batch.batch_id.clone()),
                task_type: STANDARD_CLOTHING_BATCH.task_type,
                completion_type: STANDARD_CLOTHING_BATCH.completion_type,
                timeline_offset: STANDARD_CLOTHING_BATCH.timeline_offset,
                deadline,
                order_ids: batch.aggregate.order_ids.clone(),
                parent_task_id: None,
            })
            .await?;

        Ok(BatchRunOutcome::Created { task, batch })
    }
}

impl BatchRunOutcome {
    fn label(&self) -> &'static str {
        match self {
            BatchRunOutcome::Skipped => "skipped",
            BatchRunOutcome::DryRun(_) => "dry-run",
            BatchRunOutcome::Created { .. } => "created",
            BatchRunOutcome::AlreadyExists { .. } => "already-exists",
        }
    }
}
