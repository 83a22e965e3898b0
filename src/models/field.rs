use std::time::Duration;

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::models::{
    error::{GeometryError, NotFound, PlacementError},
    geometry::Size2D,
    item::Item,
    layout::{DistancePolicy, FieldLayout},
    ring::{Placement, Ring, RotationPlan},
};

/// 選択状態の変化通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// 新しいアイテムが選択された
    Selected(String),
    /// 別のアイテムへの切り替えで選択が外れた
    Deselected(String),
    /// 選択が全て解除された（直前の選択キー）
    DeselectedAll(String),
}

/// 再構成で配置できなかったアイテム
#[derive(Debug, Clone)]
pub struct Rejected<T> {
    pub item: Item<T>,
    pub error: PlacementError,
}

/// 同心円リングの集合とアイテムの振り分け
///
/// 各リングは互いに重ならない半開区間の距離帯を受け持ち、
/// アイテムは距離を含む唯一のリングに配置されます。
/// ジオメトリは構築時に固定され、構成変更は新しいフィールドを作ることで行います。
#[derive(Debug, Clone)]
pub struct RadarField<T> {
    layout: FieldLayout,
    rings: Vec<Ring<T>>,
    rng: StdRng,
    selected: Option<String>,
}

impl<T> RadarField<T> {
    /// 構成からフィールドを作成
    pub fn new(layout: FieldLayout) -> Result<Self, GeometryError> {
        layout.validate()?;

        let rings = (0..layout.ring_count)
            .map(|index| {
                Ring::new(
                    index,
                    layout.ring_radius(index),
                    layout.origin,
                    layout.item_footprint,
                    layout.spacing,
                    layout.ring_interval(index),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let seed = layout.seed.unwrap_or_else(rand::random::<u64>);
        let field = Self {
            rng: StdRng::seed_from_u64(seed),
            layout,
            rings,
            selected: None,
        };

        info!(
            rings = field.rings.len(),
            capacity = field.capacity(),
            min_distance = field.layout.min_distance,
            max_distance = field.layout.max_distance,
            "レーダーフィールドを構成"
        );
        Ok(field)
    }

    /// 主要パラメータのみ指定してフィールドを作成（他は既定値）
    pub fn configure(
        ring_count: usize,
        min_distance: f64,
        max_distance: f64,
        item_footprint: f64,
        spacing: f64,
    ) -> Result<Self, GeometryError> {
        Self::new(FieldLayout {
            ring_count,
            min_distance,
            max_distance,
            item_footprint,
            spacing,
            ..FieldLayout::default()
        })
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn rings(&self) -> &[Ring<T>] {
        &self.rings
    }

    pub fn ring(&self, index: usize) -> Option<&Ring<T>> {
        self.rings.get(index)
    }

    pub fn preferred_item_size(&self) -> Size2D {
        self.layout.preferred_item_size()
    }

    /// 全リングのスロット総数（占有状態に依存しない）
    pub fn capacity(&self) -> usize {
        self.rings.iter().map(Ring::capacity).sum()
    }

    /// 現在配置されているアイテム数
    pub fn occupancy(&self) -> usize {
        self.rings.iter().map(Ring::occupancy).sum()
    }

    /// 距離を含むリングのインデックス
    pub fn select_ring_index(&self, distance: f64) -> Option<usize> {
        self.rings
            .iter()
            .position(|ring| ring.interval().contains(distance))
    }

    /// 距離を含むリング
    pub fn select_ring(&self, distance: f64) -> Option<&Ring<T>> {
        self.select_ring_index(distance).map(|index| &self.rings[index])
    }

    fn target_ring(&self, item: &Item<T>) -> Result<usize, PlacementError> {
        match item.distance {
            Some(distance) => {
                self.select_ring_index(distance)
                    .ok_or_else(|| PlacementError::OutOfRange {
                        key: item.key().to_string(),
                        distance,
                    })
            }
            None => match self.layout.distance_policy {
                DistancePolicy::FixedRing { ring } if ring < self.rings.len() => Ok(ring),
                _ => Err(PlacementError::MissingDistance {
                    key: item.key().to_string(),
                }),
            },
        }
    }

    /// アイテムを配置し、割り当てたスロットを返す
    ///
    /// アイテムはこの時点の距離・方位で配置され、以後の変更は反映されません。
    pub fn add(&mut self, item: Item<T>) -> Result<Placement, PlacementError> {
        if let Some((field, value)) = item.non_finite_coordinate() {
            return Err(PlacementError::NonFiniteCoordinate {
                key: item.key().to_string(),
                field,
                value,
            });
        }
        let index = self.target_ring(&item)?;
        if self.contains(item.key()) {
            return Err(PlacementError::DuplicateKey {
                key: item.key().to_string(),
            });
        }

        let policy = self.layout.angle_policy;
        self.rings[index].add(item, policy, &mut self.rng)
    }

    /// 複数アイテムを順に配置
    pub fn add_all<I>(&mut self, items: I) -> Vec<Result<Placement, PlacementError>>
    where
        I: IntoIterator<Item = Item<T>>,
    {
        items.into_iter().map(|item| self.add(item)).collect()
    }

    /// キーで指定したアイテムを取り除く
    ///
    /// 所属リングは占有状態から探すため、追加後に距離が変わっていても見つかります。
    pub fn remove(&mut self, key: &str) -> Result<Item<T>, NotFound> {
        let ring = self
            .rings
            .iter_mut()
            .find(|ring| ring.contains(key))
            .ok_or_else(|| NotFound::new(key))?;
        let item = ring.remove(key)?;

        if self.selected.as_deref() == Some(key) {
            self.selected = None;
        }
        Ok(item)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rings.iter().any(|ring| ring.contains(key))
    }

    pub fn placement_of(&self, key: &str) -> Result<Placement, NotFound> {
        self.rings
            .iter()
            .find_map(|ring| ring.placement_of(key))
            .ok_or_else(|| NotFound::new(key))
    }

    pub fn item(&self, key: &str) -> Option<&Item<T>> {
        self.rings
            .iter()
            .find_map(|ring| ring.occupant(key))
            .map(|occupant| &occupant.item)
    }

    /// リングの占有アイテム（挿入順）。存在しないリングは空
    pub fn occupants_of(&self, ring_index: usize) -> Vec<&Item<T>> {
        self.rings
            .get(ring_index)
            .map(|ring| ring.occupants().iter().map(|o| &o.item).collect())
            .unwrap_or_default()
    }

    /// 全リングの占有を解除
    pub fn clear(&mut self) {
        for ring in &mut self.rings {
            ring.clear();
        }
        self.selected = None;
        debug!("全リングをクリア");
    }

    /// 全リングの回転計画
    pub fn rotate(&self, by_degrees: f64, duration: Duration) -> Vec<RotationPlan> {
        self.rings
            .iter()
            .map(|ring| ring.rotate(by_degrees, duration))
            .collect()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// アイテムを選択し、発生した選択イベントを返す
    pub fn select(&mut self, key: &str) -> Result<Vec<SelectionEvent>, NotFound> {
        if !self.contains(key) {
            return Err(NotFound::new(key));
        }

        let mut events = Vec::new();
        if let Some(previous) = self.selected.replace(key.to_string()) {
            events.push(SelectionEvent::Deselected(previous));
        }
        events.push(SelectionEvent::Selected(key.to_string()));
        Ok(events)
    }

    /// 選択を解除
    pub fn deselect(&mut self) -> Vec<SelectionEvent> {
        self.selected
            .take()
            .map(SelectionEvent::DeselectedAll)
            .into_iter()
            .collect()
    }
}

impl<T: Clone> RadarField<T> {
    /// 新しい構成でフィールドを作り直し、現在のアイテムを再配置する
    ///
    /// 元のフィールドは変更しません。新しい構成で配置できなかったアイテムは
    /// `Rejected` として返します。
    pub fn reconfigure(
        &self,
        layout: FieldLayout,
    ) -> Result<(RadarField<T>, Vec<Rejected<T>>), GeometryError> {
        let mut field = RadarField::new(layout)?;
        let mut rejected = Vec::new();

        for ring in &self.rings {
            for occupant in ring.occupants() {
                if let Err(error) = field.add(occupant.item.clone()) {
                    rejected.push(Rejected {
                        item: occupant.item.clone(),
                        error,
                    });
                }
            }
        }

        if let Some(key) = self.selected.as_deref() {
            if field.contains(key) {
                field.selected = Some(key.to_string());
            }
        }

        info!(
            kept = field.occupancy(),
            rejected = rejected.len(),
            "レーダーフィールドを再構成"
        );
        Ok((field, rejected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{geometry::Point2D, layout::AnglePolicy, ring::MAX_RING_CAPACITY};

    fn seeded(ring_count: usize) -> RadarField<&'static str> {
        RadarField::new(FieldLayout {
            ring_count,
            min_distance: 0.0,
            max_distance: 100.0,
            item_footprint: 5.0,
            spacing: 2.0,
            seed: Some(7),
            ..FieldLayout::default()
        })
        .unwrap()
    }

    #[test]
    fn test_two_ring_example() {
        let mut field = seeded(2);
        assert_eq!(field.rings().len(), 2);
        assert_eq!(field.rings()[0].interval().min, 0.0);
        assert_eq!(field.rings()[0].interval().max, 50.0);
        assert_eq!(field.rings()[1].interval().min, 50.0);
        assert_eq!(field.rings()[1].interval().max, 100.0);

        let near = field
            .add(Item::new("near", "n").with_distance(30.0).with_angle(0.0))
            .unwrap();
        assert_eq!(near.ring, 0);
        assert_eq!(near.slot, 0);
        let radius = field.rings()[0].radius();
        assert!(near.point.approx_eq(&Point2D::new(radius, 0.0), 1e-9));

        let far = field.add(Item::new("far", "f").with_distance(80.0)).unwrap();
        assert_eq!(far.ring, 1);
        assert_eq!(field.occupants_of(0).len(), 1);
        assert_eq!(field.occupants_of(1)[0].key(), "far");
        assert!(field.occupants_of(5).is_empty());
    }

    #[test]
    fn test_configure_uses_defaults_for_rest() {
        let field: RadarField<()> = RadarField::configure(2, 0.0, 100.0, 5.0, 2.0).unwrap();
        let layout = field.layout();
        assert_eq!(layout.inner_radius, FieldLayout::default().inner_radius);
        assert_eq!(field.rings()[1].radius(), layout.ring_radius(1));
    }

    #[test]
    fn test_capacity_is_sum_of_ring_slots() {
        let mut field = seeded(3);
        let expected: usize = field.rings().iter().map(|r| r.all_slots().len()).sum();
        assert_eq!(field.capacity(), expected);

        field.add(Item::new("a", "a").with_distance(1.0)).unwrap();
        assert_eq!(field.capacity(), expected);
    }

    #[test]
    fn test_zero_rings() {
        let mut field: RadarField<()> = RadarField::configure(0, 0.0, 100.0, 5.0, 2.0).unwrap();
        assert_eq!(field.capacity(), 0);
        assert!(matches!(
            field.add(Item::new("a", ()).with_distance(10.0)),
            Err(PlacementError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_configuration() {
        let result: Result<RadarField<()>, _> = RadarField::configure(2, 0.0, 100.0, -1.0, 2.0);
        assert!(matches!(result, Err(GeometryError::NonPositive { .. })));
    }

    #[test]
    fn test_oversized_ring_is_a_configuration_error() {
        let layout = FieldLayout {
            ring_count: 1,
            ring_padding: 1e300,
            ..FieldLayout::default()
        };
        assert_eq!(layout.validate(), Ok(()));
        let result: Result<RadarField<()>, _> = RadarField::new(layout);
        assert!(matches!(
            result,
            Err(GeometryError::CapacityTooLarge { max: MAX_RING_CAPACITY, .. })
        ));
    }

    #[test]
    fn test_non_finite_distance_is_rejected_before_ring_selection() {
        let mut field = seeded(2);
        let err = field
            .add(Item::new("a", "a").with_distance(f64::NAN).with_angle(0.0))
            .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::NonFiniteCoordinate { field: "distance", .. }
        ));
        assert!(!field.contains("a"));
    }

    #[test]
    fn test_out_of_range_and_missing_distance() {
        let mut field = seeded(2);
        assert!(matches!(
            field.add(Item::new("a", "a").with_distance(100.0)),
            Err(PlacementError::OutOfRange { .. })
        ));
        assert!(matches!(
            field.add(Item::new("b", "b").with_distance(-0.5)),
            Err(PlacementError::OutOfRange { .. })
        ));
        assert_eq!(
            field.add(Item::new("c", "c")).unwrap_err(),
            PlacementError::MissingDistance { key: "c".into() }
        );
        assert_eq!(field.occupancy(), 0);
    }

    #[test]
    fn test_fixed_ring_fallback() {
        let mut field: RadarField<&str> = RadarField::new(FieldLayout {
            ring_count: 3,
            distance_policy: DistancePolicy::FixedRing { ring: 2 },
            angle_policy: AnglePolicy::FirstAvailable,
            seed: Some(1),
            ..FieldLayout::default()
        })
        .unwrap();
        let placement = field.add(Item::new("nowhere", "x")).unwrap();
        assert_eq!(placement.ring, 2);
        assert_eq!(placement.slot, 0);
    }

    #[test]
    fn test_duplicate_key_is_rejected_across_rings() {
        let mut field = seeded(2);
        field.add(Item::new("a", "a").with_distance(10.0)).unwrap();
        let before = field.occupancy();
        let dup = field.add(Item::new("a", "a").with_distance(90.0));
        assert_eq!(dup.unwrap_err(), PlacementError::DuplicateKey { key: "a".into() });
        assert_eq!(field.occupancy(), before);
    }

    #[test]
    fn test_overflowing_a_ring() {
        let mut field = seeded(2);
        let capacity = field.rings()[0].capacity();
        for i in 0..capacity {
            field
                .add(Item::new(format!("k{i}"), "v").with_distance(10.0))
                .unwrap();
        }
        let overflow = field.add(Item::new("extra", "v").with_distance(10.0));
        assert!(matches!(overflow, Err(PlacementError::RingFull { .. })));
        assert_eq!(field.rings()[0].occupancy(), capacity);

        // 外側リングには影響しない
        assert!(field.add(Item::new("outer", "v").with_distance(60.0)).is_ok());
    }

    #[test]
    fn test_remove_then_re_add_restores_occupancy() {
        let mut field = seeded(2);
        let item = Item::new("a", "a").with_distance(20.0).with_angle(45.0);
        field.add(item.clone()).unwrap();
        field.add(Item::new("b", "b").with_distance(70.0)).unwrap();
        let occupancy = field.occupancy();

        field.remove("a").unwrap();
        assert_eq!(field.occupancy(), occupancy - 1);
        field.add(item).unwrap();
        assert_eq!(field.occupancy(), occupancy);
    }

    #[test]
    fn test_remove_missing_key() {
        let mut field = seeded(2);
        field.add(Item::new("a", "a").with_distance(20.0)).unwrap();
        let capacity = field.capacity();
        assert_eq!(field.remove("zzz").unwrap_err(), NotFound::new("zzz"));
        assert_eq!(field.capacity(), capacity);
        assert_eq!(field.occupancy(), 1);
    }

    #[test]
    fn test_remove_uses_occupancy_not_current_distance() {
        let mut field = seeded(2);
        let mut item = Item::new("moving", "m").with_distance(10.0);
        field.add(item.clone()).unwrap();

        // 呼び出し側で距離が変わっても、実際の所属リングから削除される
        item.set_distance(Some(90.0));
        let removed = field.remove(item.key()).unwrap();
        assert_eq!(removed.distance, Some(10.0));
        assert_eq!(field.occupancy(), 0);
    }

    #[test]
    fn test_lookup_and_clear() {
        let mut field = seeded(2);
        let placement = field.add(Item::new("a", "alpha").with_distance(60.0)).unwrap();
        assert_eq!(field.placement_of("a").unwrap(), placement);
        assert_eq!(field.item("a").map(|i| i.payload), Some("alpha"));
        assert!(field.placement_of("b").is_err());

        field.clear();
        assert_eq!(field.occupancy(), 0);
        assert!(!field.contains("a"));
        assert!(field.rings().iter().all(|r| r.available_count() == r.capacity()));
    }

    #[test]
    fn test_seeded_fields_place_identically() {
        let mut a = seeded(2);
        let mut b = seeded(2);
        let items = || (0..5).map(|i| Item::new(format!("k{i}"), "v").with_distance(10.0));
        let pa: Vec<_> = a.add_all(items()).into_iter().map(|r| r.unwrap().slot).collect();
        let pb: Vec<_> = b.add_all(items()).into_iter().map(|r| r.unwrap().slot).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_selection_events() {
        let mut field = seeded(2);
        field.add(Item::new("a", "a").with_distance(10.0)).unwrap();
        field.add(Item::new("b", "b").with_distance(60.0)).unwrap();

        assert_eq!(field.select("a").unwrap(), vec![SelectionEvent::Selected("a".into())]);
        assert_eq!(
            field.select("b").unwrap(),
            vec![
                SelectionEvent::Deselected("a".into()),
                SelectionEvent::Selected("b".into())
            ]
        );
        assert_eq!(field.deselect(), vec![SelectionEvent::DeselectedAll("b".into())]);
        assert!(field.deselect().is_empty());
        assert!(field.select("nope").is_err());

        field.select("a").unwrap();
        field.remove("a").unwrap();
        assert_eq!(field.selected(), None);
    }

    #[test]
    fn test_rotate_covers_all_rings_without_mutation() {
        let mut field = seeded(2);
        field.add(Item::new("a", "a").with_distance(10.0).with_angle(30.0)).unwrap();
        field.add(Item::new("b", "b").with_distance(60.0).with_angle(200.0)).unwrap();
        let before: Vec<_> = ["a", "b"].iter().map(|k| field.placement_of(k).unwrap()).collect();

        let plans = field.rotate(360.0, Duration::from_millis(1500));
        assert_eq!(plans.len(), 2);
        for arc in plans.iter().flat_map(|p| &p.arcs) {
            assert!(arc.to.approx_eq(&arc.from, 1e-6));
        }

        let after: Vec<_> = ["a", "b"].iter().map(|k| field.placement_of(k).unwrap()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_reconfigure_re_adds_and_reports_rejections() {
        let mut field = seeded(2);
        field.add(Item::new("a", "a").with_distance(10.0)).unwrap();
        field.add(Item::new("b", "b").with_distance(80.0)).unwrap();
        field.select("a").unwrap();

        let narrower = FieldLayout {
            max_distance: 50.0,
            ..field.layout().clone()
        };
        let (rebuilt, rejected) = field.reconfigure(narrower).unwrap();

        assert!(rebuilt.contains("a"));
        assert!(!rebuilt.contains("b"));
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].item.key(), "b");
        assert!(matches!(rejected[0].error, PlacementError::OutOfRange { .. }));
        assert_eq!(rebuilt.selected(), Some("a"));

        // 元のフィールドはそのまま
        assert_eq!(field.occupancy(), 2);
    }

    #[test]
    fn test_reconfigure_with_invalid_layout_keeps_original() {
        let mut field = seeded(2);
        field.add(Item::new("a", "a").with_distance(10.0)).unwrap();
        let bad = FieldLayout {
            ring_padding: 0.0,
            ..field.layout().clone()
        };
        assert!(field.reconfigure(bad).is_err());
        assert!(field.contains("a"));
    }
}
