use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::models::{
    error::{GeometryError, NotFound, PlacementError},
    geometry::{Point2D, angle_of_point, math_utils, point_on_circle},
    item::Item,
    layout::{AnglePolicy, DistanceInterval},
    ring_model::RingModel,
};

/// 1リングあたりのスロット数の上限
pub const MAX_RING_CAPACITY: usize = 65_536;

/// 最近傍スロットの比較で同距離とみなす誤差（半径に対する比）
const TIE_TOLERANCE: f64 = 1e-9;

/// リング上の配置結果（リング・スロット・座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// リングのインデックス（0始まり）
    pub ring: usize,
    /// スロットのインデックス（`all_slots` 内の位置）
    pub slot: usize,
    /// スロットの画面座標
    pub point: Point2D,
}

/// スロットを占有しているアイテム
#[derive(Debug, Clone)]
pub struct Occupant<T> {
    pub slot: usize,
    pub item: Item<T>,
}

/// 1アイテム分の回転弧
#[derive(Debug, Clone, PartialEq)]
pub struct RotationArc {
    pub key: String,
    /// 論理スロット（回転しても変わらない）
    pub slot: usize,
    pub from_angle: f64,
    pub to_angle: f64,
    /// 回転量（度、符号つき）
    pub sweep: f64,
    pub from: Point2D,
    pub to: Point2D,
    center: Point2D,
    radius: f64,
}

impl RotationArc {
    /// 弧上の位置を補間（`t` は0.0〜1.0にクランプ）
    pub fn point_at(&self, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        point_on_circle(self.from_angle + self.sweep * t, self.center, self.radius)
    }
}

/// リング単位の回転計画
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPlan {
    pub ring: usize,
    pub duration: Duration,
    pub arcs: Vec<RotationArc>,
}

/// 同心円リング
///
/// スロット配置は構築時に一度だけ計算され、以後変更されません。
/// 変化するのは占有状態（`available` / `occupants` / `model`）のみで、
/// 常に `available ⊎ occupied == all_slots` が成り立ちます。
#[derive(Debug, Clone)]
pub struct Ring<T> {
    index: usize,
    name: String,
    radius: f64,
    origin: Point2D,
    item_footprint: f64,
    spacing: f64,
    interval: DistanceInterval,
    all_slots: Vec<Point2D>,
    available: Vec<usize>,
    occupants: Vec<Occupant<T>>,
    model: RingModel,
}

impl<T> Ring<T> {
    /// 新しいリングを作成します
    ///
    /// 容量は `floor(2πr / (item_footprint + spacing / 2))` で、
    /// スロット `i` の角度は `i * 360 / capacity` 度です。
    /// 容量が [`MAX_RING_CAPACITY`] を超える場合は `CapacityTooLarge` を返します。
    ///
    /// # 引数
    ///
    /// * `index` - フィールド内でのリング番号（0始まり）
    /// * `radius` - リング半径（負値はエラー）
    /// * `origin` - 中心座標
    /// * `item_footprint` - アイテムの占有幅
    /// * `spacing` - アイテム間の余白
    /// * `interval` - 受け持つ距離帯
    pub fn new(
        index: usize,
        radius: f64,
        origin: Point2D,
        item_footprint: f64,
        spacing: f64,
        interval: DistanceInterval,
    ) -> Result<Self, GeometryError> {
        if !radius.is_finite() {
            return Err(GeometryError::NonFinite {
                field: "radius",
                value: radius,
            });
        }
        if radius < 0.0 {
            return Err(GeometryError::NegativeRadius { radius });
        }
        let footprint = item_footprint + spacing / 2.0;
        if !(footprint > 0.0) {
            return Err(GeometryError::NonPositive {
                field: "item_footprint + spacing / 2",
                value: footprint,
            });
        }

        let circumference = 2.0 * std::f64::consts::PI * radius;
        let slots = (circumference / footprint).floor();
        if slots > MAX_RING_CAPACITY as f64 {
            return Err(GeometryError::CapacityTooLarge {
                radius,
                max: MAX_RING_CAPACITY,
            });
        }
        let capacity = slots as usize;
        let all_slots: Vec<Point2D> = (0..capacity)
            .map(|i| point_on_circle(i as f64 * 360.0 / capacity as f64, origin, radius))
            .collect();

        Ok(Self {
            index,
            name: format!("C{}", index + 1),
            radius,
            origin,
            item_footprint,
            spacing,
            interval,
            available: (0..capacity).collect(),
            all_slots,
            occupants: Vec::new(),
            model: RingModel::new(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn origin(&self) -> Point2D {
        self.origin
    }

    pub fn item_footprint(&self) -> f64 {
        self.item_footprint
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn interval(&self) -> DistanceInterval {
        self.interval
    }

    /// 全スロット数
    pub fn capacity(&self) -> usize {
        self.all_slots.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn occupancy(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_full(&self) -> bool {
        self.available.is_empty()
    }

    pub fn all_slots(&self) -> &[Point2D] {
        &self.all_slots
    }

    /// 空きスロットの座標（順序に意味はない）
    pub fn available_slots(&self) -> impl Iterator<Item = Point2D> + '_ {
        self.available.iter().map(|&slot| self.all_slots[slot])
    }

    pub fn available_slot_indices(&self) -> &[usize] {
        &self.available
    }

    /// 挿入順の占有リスト
    pub fn occupants(&self) -> &[Occupant<T>] {
        &self.occupants
    }

    pub fn occupant(&self, key: &str) -> Option<&Occupant<T>> {
        self.occupants.iter().find(|o| o.item.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.model.contains(key)
    }

    pub fn slot_point(&self, slot: usize) -> Option<Point2D> {
        self.all_slots.get(slot).copied()
    }

    pub fn slot_angle(&self, slot: usize) -> Option<f64> {
        (slot < self.capacity()).then(|| slot as f64 * 360.0 / self.capacity() as f64)
    }

    fn placement(&self, slot: usize) -> Placement {
        Placement {
            ring: self.index,
            slot,
            point: self.all_slots[slot],
        }
    }

    /// アイテムに割り当てるスロットを決定
    ///
    /// 方位があれば理想位置に最も近い空きスロット、なければ `policy` に従います。
    /// 満杯なら `None`。
    ///
    /// 距離の差が丸め誤差の範囲なら同距離とみなし、空きスロット列で先に並ぶ方を選びます。
    /// 方位は有限値である前提です（`add` で検証済み）。
    pub fn resolve_slot<R: Rng>(
        &self,
        item: &Item<T>,
        policy: AnglePolicy,
        rng: &mut R,
    ) -> Option<usize> {
        if self.available.is_empty() {
            return None;
        }

        match item.angle {
            Some(angle) => {
                let ideal = point_on_circle(angle, self.origin, self.radius);
                let tolerance = TIE_TOLERANCE * self.radius.max(1.0);
                let mut best: Option<(usize, f64)> = None;
                for &slot in &self.available {
                    let distance = self.all_slots[slot].distance_to(&ideal);
                    match best {
                        Some((_, best_distance)) if distance >= best_distance - tolerance => {}
                        _ => best = Some((slot, distance)),
                    }
                }
                best.map(|(slot, _)| slot)
            }
            None => match policy {
                AnglePolicy::RandomSlot => {
                    let pick = rng.random_range(0..self.available.len());
                    Some(self.available[pick])
                }
                AnglePolicy::FirstAvailable => Some(self.available[0]),
            },
        }
    }

    /// アイテムをリングに追加
    ///
    /// 距離・方位が非有限 → `NonFiniteCoordinate`、距離帯の外 → `OutOfRange`、
    /// 同一キーが存在 → `DuplicateKey`、空きなし → `RingFull` の順に判定します。
    /// 失敗時は状態を変更しません。
    pub fn add<R: Rng>(
        &mut self,
        item: Item<T>,
        policy: AnglePolicy,
        rng: &mut R,
    ) -> Result<Placement, PlacementError> {
        if let Some((field, value)) = item.non_finite_coordinate() {
            return Err(PlacementError::NonFiniteCoordinate {
                key: item.key().to_string(),
                field,
                value,
            });
        }
        if let Some(distance) = item.distance {
            if !self.interval.contains(distance) {
                return Err(PlacementError::OutOfRange {
                    key: item.key().to_string(),
                    distance,
                });
            }
        }
        if self.model.contains(item.key()) {
            return Err(PlacementError::DuplicateKey {
                key: item.key().to_string(),
            });
        }
        let Some(slot) = self.resolve_slot(&item, policy, rng) else {
            warn!(ring = %self.name, key = item.key(), "リングに空きスロットがありません");
            return Err(PlacementError::RingFull {
                ring: self.name.clone(),
            });
        };

        self.available.retain(|&s| s != slot);
        self.model.add(&item);
        debug!(ring = %self.name, slot, key = item.key(), "アイテムを配置");
        self.occupants.push(Occupant { slot, item });

        Ok(self.placement(slot))
    }

    /// キーで指定したアイテムを取り除き、スロットを空きに戻す
    pub fn remove(&mut self, key: &str) -> Result<Item<T>, NotFound> {
        let position = self
            .occupants
            .iter()
            .position(|o| o.item.key() == key)
            .ok_or_else(|| NotFound::new(key))?;

        let occupant = self.occupants.remove(position);
        self.available.push(occupant.slot);
        self.model.remove(&occupant.item);
        debug!(ring = %self.name, slot = occupant.slot, key, "アイテムを削除");

        Ok(occupant.item)
    }

    pub fn placement_of(&self, key: &str) -> Option<Placement> {
        self.occupant(key).map(|o| self.placement(o.slot))
    }

    /// 全占有を解除し、空きスロットを元の順序に戻す
    pub fn clear(&mut self) {
        self.occupants.clear();
        self.model.clear();
        self.available = (0..self.capacity()).collect();
    }

    /// 全占有アイテムの回転弧を計算
    ///
    /// 各アイテムのスロット位置から `by_degrees` だけ回した位置までの弧を返します。
    /// 占有状態は変更しません。
    pub fn rotate(&self, by_degrees: f64, duration: Duration) -> RotationPlan {
        let arcs = self
            .occupants
            .iter()
            .map(|occupant| {
                let from = self.all_slots[occupant.slot];
                let from_angle = angle_of_point(from, self.origin);
                let to_angle = math_utils::normalize_angle(from_angle + by_degrees);
                RotationArc {
                    key: occupant.item.key().to_string(),
                    slot: occupant.slot,
                    from_angle,
                    to_angle,
                    sweep: by_degrees,
                    from,
                    to: point_on_circle(from_angle + by_degrees, self.origin, self.radius),
                    center: self.origin,
                    radius: self.radius,
                }
            })
            .collect();

        RotationPlan {
            ring: self.index,
            duration,
            arcs,
        }
    }
}
