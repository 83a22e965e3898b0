use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{FieldLayout, Item};

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// 初期アイテム設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemConfig {
    pub key: String,
    /// 表示ラベル（省略時はキー）
    pub label: Option<String>,
    pub distance: Option<f64>,
    pub angle_deg: Option<f64>,
}

impl ItemConfig {
    pub fn to_item(&self) -> Item<String> {
        let label = self.label.clone().unwrap_or_else(|| self.key.clone());
        let mut item = Item::new(self.key.clone(), label);
        item.set_distance(self.distance);
        item.set_angle(self.angle_deg);
        item
    }
}

/// 回転設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RotationConfig {
    pub degrees: f64,
    #[serde(default = "default_rotation_duration")]
    pub duration_s: f64,
}

fn default_rotation_duration() -> f64 {
    1.5
}

/// フィードイベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedAction {
    /// 追加、または既存アイテムの位置更新
    #[default]
    Upsert,
    Remove,
}

/// 時刻つきのフィードイベント
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedEventConfig {
    pub t_s: f64,
    pub key: String,
    #[serde(default)]
    pub action: FeedAction,
    pub label: Option<String>,
    pub distance: Option<f64>,
    pub angle_deg: Option<f64>,
}

/// フィード再生設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    #[serde(default)]
    pub events: Vec<FeedEventConfig>,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub field: FieldLayout,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
    pub rotate: Option<RotationConfig>,
    pub replay: Option<ReplayConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::Parse(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.field
            .validate()
            .map_err(|e| ScenarioError::Validation(format!("field: {e}")))?;

        let mut seen = std::collections::HashSet::new();
        for item in &self.items {
            if !seen.insert(item.key.as_str()) {
                return Err(ScenarioError::Validation(format!(
                    "duplicate item key '{}'",
                    item.key
                )));
            }
        }

        if let Some(rotate) = &self.rotate {
            if !rotate.degrees.is_finite() || !(rotate.duration_s >= 0.0) {
                return Err(ScenarioError::Validation(
                    "rotate.degrees must be finite and rotate.duration_s non-negative".to_string(),
                ));
            }
        }

        if let Some(replay) = &self.replay {
            if !(replay.dt_s > 0.0) {
                return Err(ScenarioError::Validation("dt_s must be positive".to_string()));
            }
            if !(replay.t_max_s > 0.0) {
                return Err(ScenarioError::Validation("t_max_s must be positive".to_string()));
            }
            for event in &replay.events {
                if !(event.t_s >= 0.0) || event.t_s >= replay.t_max_s {
                    return Err(ScenarioError::Validation(format!(
                        "event for '{}' at {} is outside [0, {})",
                        event.key, event.t_s, replay.t_max_s
                    )));
                }
            }
        }

        Ok(())
    }

    /// 初期アイテムの一覧
    pub fn initial_items(&self) -> Vec<Item<String>> {
        self.items.iter().map(ItemConfig::to_item).collect()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== フィールド設定 ===");
        println!("リング数: {}", self.field.ring_count);
        println!(
            "距離範囲: [{:.1}, {:.1})",
            self.field.min_distance, self.field.max_distance
        );
        println!(
            "アイテム幅: {:.1} / 余白: {:.1}",
            self.field.item_footprint, self.field.spacing
        );
        println!(
            "中心ディスク半径: {:.1} / リング間隔: {:.1}",
            self.field.inner_radius, self.field.ring_padding
        );
        match self.field.seed {
            Some(seed) => println!("シード値: {}", seed),
            None => println!("シード値: (ランダム)"),
        }
        println!();

        println!("=== アイテム ===");
        println!("初期アイテム数: {}", self.items.len());
        let without_distance = self.items.iter().filter(|i| i.distance.is_none()).count();
        let without_angle = self.items.iter().filter(|i| i.angle_deg.is_none()).count();
        println!("  距離なし: {}", without_distance);
        println!("  方位なし: {}", without_angle);

        if let Some(rotate) = &self.rotate {
            println!();
            println!("回転: {:.1}度 ({:.2}秒)", rotate.degrees, rotate.duration_s);
        }

        if let Some(replay) = &self.replay {
            println!();
            println!("=== フィード再生 ===");
            println!("時間刻み: {:.3}秒", replay.dt_s);
            println!("最大時間: {:.1}秒", replay.t_max_s);
            println!("イベント数: {}", replay.events.len());
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    Validation(String),
}
