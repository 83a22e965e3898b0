//! # radarfield
//!
//! 近くのユーザーや端末を、中心を囲む同心円リング上の点として配置するエンジンです。
//!
//! 距離でリング（距離帯）を、方位でリング上のスロットを決定し、
//! スロットの重複がないこと・容量を超えないことを保証します。
//! 描画やアニメーションは扱わず、配置結果（リング・スロット・座標）だけを返します。
//!
//! ```rust
//! use radarfield::models::{Item, RadarField};
//!
//! let mut field: RadarField<&str> = RadarField::configure(2, 0.0, 100.0, 5.0, 2.0)?;
//! let placement = field.add(Item::new("u1", "Alice").with_distance(30.0).with_angle(0.0))?;
//! assert_eq!(placement.ring, 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
