use serde::{Deserialize, Serialize};

use crate::models::{
    error::GeometryError,
    geometry::{Point2D, Size2D},
};

/// 距離を持たないアイテムのリング選択方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DistancePolicy {
    /// 配置を拒否する（MissingDistance）
    #[default]
    Reject,
    /// 指定インデックスのリングに配置する
    FixedRing { ring: usize },
}

/// 方位を持たないアイテムのスロット選択方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnglePolicy {
    /// 空きスロットから一様乱数で選ぶ
    #[default]
    RandomSlot,
    /// 空きスロット列の先頭を使う
    FirstAvailable,
}

/// 半開区間 `[min, max)` の距離帯
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceInterval {
    pub min: f64,
    pub max: f64,
}

impl DistanceInterval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance < self.max
    }
}

/// レーダーフィールドの構成
///
/// リング `i`（0始まり）の半径は `inner_radius + ring_padding * (i + 1)` です。
/// 距離範囲 `[min_distance, max_distance)` は `ring_count` 個の等幅区間に分割されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLayout {
    /// リング数
    pub ring_count: usize,
    /// 最小距離
    pub min_distance: f64,
    /// 最大距離（この値自体は範囲外）
    pub max_distance: f64,
    /// アイテムの占有幅
    pub item_footprint: f64,
    /// アイテム間の余白
    pub spacing: f64,
    /// フィールド中心
    pub origin: Point2D,
    /// 中心ディスクの半径
    pub inner_radius: f64,
    /// リング間の間隔
    pub ring_padding: f64,
    pub distance_policy: DistancePolicy,
    pub angle_policy: AnglePolicy,
    /// 乱数シード（未指定時はエントロピーから生成）
    pub seed: Option<u64>,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            ring_count: 3,
            min_distance: 0.0,
            max_distance: 1000.0,
            item_footprint: 18.0,
            spacing: 10.0,
            origin: Point2D::origin(),
            inner_radius: 8.0,
            ring_padding: 40.0,
            distance_policy: DistancePolicy::default(),
            angle_policy: AnglePolicy::default(),
            seed: None,
        }
    }
}

impl FieldLayout {
    /// 構成値の検証
    pub fn validate(&self) -> Result<(), GeometryError> {
        let finite = [
            ("min_distance", self.min_distance),
            ("max_distance", self.max_distance),
            ("item_footprint", self.item_footprint),
            ("spacing", self.spacing),
            ("origin.x", self.origin.x),
            ("origin.y", self.origin.y),
            ("inner_radius", self.inner_radius),
            ("ring_padding", self.ring_padding),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite { field, value });
            }
        }

        if self.item_footprint <= 0.0 {
            return Err(GeometryError::NonPositive {
                field: "item_footprint",
                value: self.item_footprint,
            });
        }
        if self.spacing < 0.0 {
            return Err(GeometryError::Negative {
                field: "spacing",
                value: self.spacing,
            });
        }
        if self.ring_padding <= 0.0 {
            return Err(GeometryError::NonPositive {
                field: "ring_padding",
                value: self.ring_padding,
            });
        }
        if self.inner_radius < 0.0 {
            return Err(GeometryError::Negative {
                field: "inner_radius",
                value: self.inner_radius,
            });
        }
        if self.ring_count > 0 && self.min_distance >= self.max_distance {
            return Err(GeometryError::EmptyDistanceRange {
                min: self.min_distance,
                max: self.max_distance,
            });
        }
        if let DistancePolicy::FixedRing { ring } = self.distance_policy {
            if ring >= self.ring_count {
                return Err(GeometryError::FallbackRingOutOfBounds {
                    ring,
                    ring_count: self.ring_count,
                });
            }
        }

        Ok(())
    }

    /// リング `index` の半径
    pub fn ring_radius(&self, index: usize) -> f64 {
        self.inner_radius + self.ring_padding * (index as f64 + 1.0)
    }

    /// リング `index` が受け持つ距離帯
    ///
    /// 最後のリングの上端は丸め誤差を避けるため `max_distance` をそのまま使います。
    pub fn ring_interval(&self, index: usize) -> DistanceInterval {
        let width = (self.max_distance - self.min_distance) / self.ring_count as f64;
        let min = self.min_distance + index as f64 * width;
        let max = if index + 1 == self.ring_count {
            self.max_distance
        } else {
            self.min_distance + (index as f64 + 1.0) * width
        };
        DistanceInterval::new(min, max)
    }

    /// ビューファクトリに渡すアイテムの推奨サイズ
    pub fn preferred_item_size(&self) -> Size2D {
        Size2D::square(self.item_footprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_are_contiguous() {
        let layout = FieldLayout {
            ring_count: 3,
            min_distance: 10.0,
            max_distance: 40.0,
            ..FieldLayout::default()
        };
        let intervals: Vec<_> = (0..3).map(|i| layout.ring_interval(i)).collect();
        assert_eq!(intervals[0], DistanceInterval::new(10.0, 20.0));
        assert_eq!(intervals[1], DistanceInterval::new(20.0, 30.0));
        assert_eq!(intervals[2], DistanceInterval::new(30.0, 40.0));
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].max, pair[1].min);
        }
        assert!(intervals[0].contains(10.0));
        assert!(!intervals[0].contains(20.0));
        assert!(!intervals[2].contains(40.0));
    }

    #[test]
    fn test_ring_radius_grows_with_index() {
        let layout = FieldLayout {
            inner_radius: 8.0,
            ring_padding: 40.0,
            ..FieldLayout::default()
        };
        assert_eq!(layout.ring_radius(0), 48.0);
        assert_eq!(layout.ring_radius(2), 128.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_footprint = FieldLayout {
            item_footprint: 0.0,
            ..FieldLayout::default()
        };
        assert!(matches!(
            bad_footprint.validate(),
            Err(GeometryError::NonPositive { field: "item_footprint", .. })
        ));

        let bad_range = FieldLayout {
            min_distance: 5.0,
            max_distance: 5.0,
            ..FieldLayout::default()
        };
        assert!(matches!(
            bad_range.validate(),
            Err(GeometryError::EmptyDistanceRange { .. })
        ));

        let bad_fallback = FieldLayout {
            ring_count: 2,
            distance_policy: DistancePolicy::FixedRing { ring: 2 },
            ..FieldLayout::default()
        };
        assert!(matches!(
            bad_fallback.validate(),
            Err(GeometryError::FallbackRingOutOfBounds { ring: 2, ring_count: 2 })
        ));

        let nan_origin = FieldLayout {
            origin: Point2D::new(f64::NAN, 0.0),
            ..FieldLayout::default()
        };
        assert!(matches!(nan_origin.validate(), Err(GeometryError::NonFinite { .. })));
    }

    #[test]
    fn test_zero_rings_skip_range_check() {
        let layout = FieldLayout {
            ring_count: 0,
            min_distance: 5.0,
            max_distance: 5.0,
            ..FieldLayout::default()
        };
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_policies_from_yaml() {
        let layout: FieldLayout = serde_yaml::from_str(
            "ring_count: 2\ndistance_policy:\n  mode: fixed_ring\n  ring: 1\nangle_policy: first_available\n",
        )
        .unwrap();
        assert_eq!(layout.ring_count, 2);
        assert_eq!(layout.distance_policy, DistancePolicy::FixedRing { ring: 1 });
        assert_eq!(layout.angle_policy, AnglePolicy::FirstAvailable);
        assert_eq!(layout.item_footprint, 18.0);
    }
}
