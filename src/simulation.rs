//! # Simulation モジュール
//!
//! センサーや位置情報から届く距離・方位の更新を、時間駆動でレーダーフィールドに
//! 反映するフィード再生エンジンを提供します。
//!
//! 配置エンジンはアイテムの距離・方位を追加時点でしか参照しないため、
//! 値が変わったアイテムは「削除してから再追加」することで位置を更新します。
//! このモジュールはその手順を固定時間刻み（Δt）のループで再現します。
//!
//! ## 処理順序
//!
//! 各時間刻みは区間 `[t, t + Δt)` を受け持ち、その区間に入るイベントを記録順に適用します。
//! 最後の刻みは `t_max` を含む区間まで進むため、`t_max` 未満のイベントは必ず適用されます。
//!
//! 1. **Upsert**: 既存なら削除し、新しい距離・方位で再追加
//! 2. **Remove**: アイテムを削除
//!
//! ## 使用例
//!
//! ```rust,ignore
//! let scenario = ScenarioConfig::from_file("scenarios/nearby_users.yaml")?;
//! let field = RadarField::new(scenario.field.clone())?;
//! let mut engine = SimulationEngine::new(field, scenario.replay.clone().unwrap(), 1);
//! let stats = engine.run();
//! ```

use crate::models::{Item, PlacementError, RadarField};
use crate::scenario::{FeedAction, FeedEventConfig, ReplayConfig};
use tracing::{debug, info, trace, warn};

/// 時刻比較の許容誤差
const TIME_EPSILON: f64 = 1e-9;

/// 再生結果の統計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayStats {
    pub steps: u64,
    pub events_applied: usize,
    /// 新規に配置されたアイテム数
    pub placed: usize,
    /// 削除→再追加で位置が更新されたアイテム数
    pub moved: usize,
    pub removed: usize,
    /// 配置に失敗したイベント数
    pub rejected: usize,
    /// 存在しないキーへの削除
    pub missing: usize,
    pub final_occupancy: usize,
    pub capacity: usize,
}

/// フィード再生エンジン
pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub max_time: f64,
    pub step_count: u64,

    pub field: RadarField<String>,
    events: Vec<FeedEventConfig>,
    next_event: usize,
    stats: ReplayStats,

    pub verbose_level: u8,
}

impl SimulationEngine {
    pub fn new(field: RadarField<String>, replay: ReplayConfig, verbose_level: u8) -> Self {
        let mut events = replay.events;
        // 同時刻のイベントは記録順を保つ
        events.sort_by(|a, b| a.t_s.total_cmp(&b.t_s));

        Self {
            current_time: 0.0,
            dt: replay.dt_s,
            max_time: replay.t_max_s,
            step_count: 0,
            field,
            events,
            next_event: 0,
            stats: ReplayStats::default(),
            verbose_level,
        }
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    pub fn run(&mut self) -> ReplayStats {
        info!("=== フィード再生開始 ===");

        while self.current_time < self.max_time {
            self.step();

            if self.verbose_level > 2 {
                trace!("時刻: {:.2}秒 (ステップ: {})", self.current_time, self.step_count);
            }

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.current_time / self.max_time) * 100.0;
                info!(
                    "進行状況: {:.1}% ({:.1}/{:.1}秒)",
                    progress, self.current_time, self.max_time
                );
            }
        }

        self.stats.steps = self.step_count;
        self.stats.final_occupancy = self.field.occupancy();
        self.stats.capacity = self.field.capacity();

        info!("=== フィード再生完了 ===");
        info!("総ステップ数: {}", self.step_count);
        info!(
            "配置: {} / 移動: {} / 削除: {} / 失敗: {}",
            self.stats.placed, self.stats.moved, self.stats.removed, self.stats.rejected
        );

        self.stats.clone()
    }

    /// 1ステップ進める
    pub fn step(&mut self) {
        let step_end = (self.step_count + 1) as f64 * self.dt;
        while let Some(event) = self.events.get(self.next_event) {
            if event.t_s >= step_end - TIME_EPSILON {
                break;
            }
            let event = event.clone();
            self.next_event += 1;
            self.apply(&event);
        }

        self.step_count += 1;
        // 累積誤差を避けるためステップ数から時刻を計算
        self.current_time = self.step_count as f64 * self.dt;
    }

    fn apply(&mut self, event: &FeedEventConfig) {
        self.stats.events_applied += 1;
        match event.action {
            FeedAction::Upsert => self.upsert(event),
            FeedAction::Remove => match self.field.remove(&event.key) {
                Ok(_) => {
                    self.stats.removed += 1;
                    debug!("削除: {} ({:.2}秒)", event.key, self.current_time);
                }
                Err(e) => {
                    self.stats.missing += 1;
                    warn!("{}", e);
                }
            },
        }
    }

    fn upsert(&mut self, event: &FeedEventConfig) {
        let previous = self.field.remove(&event.key).ok();
        let label = event
            .label
            .clone()
            .or_else(|| previous.as_ref().map(|item| item.payload.clone()))
            .unwrap_or_else(|| event.key.clone());

        let mut item = Item::new(event.key.clone(), label);
        item.set_distance(event.distance);
        item.set_angle(event.angle_deg);

        match self.field.add(item) {
            Ok(placement) => {
                if previous.is_some() {
                    self.stats.moved += 1;
                } else {
                    self.stats.placed += 1;
                }
                if self.verbose_level > 1 {
                    debug!(
                        "配置: {} → リング{} スロット{} ({:.2}秒)",
                        event.key,
                        placement.ring + 1,
                        placement.slot,
                        self.current_time
                    );
                }
            }
            Err(e) => {
                self.stats.rejected += 1;
                match e {
                    PlacementError::RingFull { .. } => warn!("{} ({:.2}秒)", e, self.current_time),
                    _ => debug!("{} ({:.2}秒)", e, self.current_time),
                }
            }
        }
    }
}
