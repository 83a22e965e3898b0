use thiserror::Error;

/// 構成時のジオメトリ検証エラー
///
/// 失敗した構成呼び出しだけが無効になり、既存のフィールドは変更されません。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("リング半径が負です: {radius}")]
    NegativeRadius { radius: f64 },
    #[error("{field} は有限値である必要があります: {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} は正の値である必要があります: {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} は負にできません: {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("距離範囲が不正です: [{min}, {max})")]
    EmptyDistanceRange { min: f64, max: f64 },
    #[error("フォールバックリング {ring} は存在しません（リング数: {ring_count}）")]
    FallbackRingOutOfBounds { ring: usize, ring_count: usize },
    #[error("リング半径 {radius} ではスロット数が上限 {max} を超えます")]
    CapacityTooLarge { radius: f64, max: usize },
}

/// アイテム配置の失敗理由
///
/// いずれも回復可能で、失敗時に状態は変化しません。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("リング {ring} に空きスロットがありません")]
    RingFull { ring: String },
    #[error("キー '{key}' は既に配置されています")]
    DuplicateKey { key: String },
    #[error("キー '{key}' の距離 {distance} はどのリングの範囲にも含まれません")]
    OutOfRange { key: String, distance: f64 },
    #[error("キー '{key}' は距離を持たないため配置できません")]
    MissingDistance { key: String },
    #[error("キー '{key}' の{field}が有限値ではありません: {value}")]
    NonFiniteCoordinate {
        key: String,
        field: &'static str,
        value: f64,
    },
}

/// キーに対応するアイテムが存在しない
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("キー '{key}' のアイテムが見つかりません")]
pub struct NotFound {
    pub key: String,
}

impl NotFound {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}
