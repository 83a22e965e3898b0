// 座標変換と幾何ユーティリティ
pub mod geometry;

// エラー型
pub mod error;

// アイテムと構成
pub mod item;
pub mod layout;

// リングとフィールド（配置エンジン本体）
pub mod ring_model;
pub mod ring;
pub mod field;

// 表示層とのインターフェース
pub mod presentation;

// 便利な re-export
pub use error::{GeometryError, NotFound, PlacementError};
pub use field::{RadarField, Rejected, SelectionEvent};
pub use geometry::{Point2D, Size2D, angle_of_point, math_utils, point_on_circle};
pub use item::Item;
pub use layout::{AnglePolicy, DistanceInterval, DistancePolicy, FieldLayout};
pub use presentation::{TextView, TextViewFactory, ViewFactory};
pub use ring::{MAX_RING_CAPACITY, Occupant, Placement, Ring, RotationArc, RotationPlan};
pub use ring_model::RingModel;
