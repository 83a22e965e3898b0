use std::hash::{Hash, Hasher};

/// レーダー上に表示されるアイテム
///
/// 同一性は `key` のみで決まります。ペイロードは呼び出し側のデータで、
/// 配置エンジンは中身を一切参照しません。
#[derive(Debug, Clone)]
pub struct Item<T> {
    key: String,
    /// 呼び出し側の任意データ
    pub payload: T,
    /// 中心からの距離（リングの選択に使用）
    pub distance: Option<f64>,
    /// 方位（度、スロットの選択に使用）
    pub angle: Option<f64>,
}

impl<T> Item<T> {
    pub fn new(key: impl Into<String>, payload: T) -> Self {
        Self {
            key: key.into(),
            payload,
            distance: None,
            angle: None,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_angle(mut self, angle_deg: f64) -> Self {
        self.angle = Some(angle_deg);
        self
    }

    /// 一意キー（構築後は変更不可）
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_distance(&mut self, distance: Option<f64>) {
        self.distance = distance;
    }

    pub fn set_angle(&mut self, angle_deg: Option<f64>) {
        self.angle = angle_deg;
    }

    /// NaN・無限大の距離または方位（最初に見つかったもの）
    pub fn non_finite_coordinate(&self) -> Option<(&'static str, f64)> {
        [("distance", self.distance), ("angle", self.angle)]
            .into_iter()
            .find_map(|(field, value)| value.filter(|v| !v.is_finite()).map(|v| (field, v)))
    }
}

impl<T> PartialEq for Item<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Item<T> {}

impl<T> Hash for Item<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_payload_and_measurements() {
        let a = Item::new("u1", "alice").with_distance(10.0).with_angle(45.0);
        let b = Item::new("u1", "someone else");
        let c = Item::new("u2", "alice").with_distance(10.0).with_angle(45.0);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_measurements_are_mutable() {
        let mut item = Item::new("u1", ());
        assert_eq!(item.distance, None);
        item.set_distance(Some(12.5));
        item.set_angle(Some(270.0));
        assert_eq!(item.distance, Some(12.5));
        assert_eq!(item.angle, Some(270.0));
        assert_eq!(item.key(), "u1");
    }

    #[test]
    fn test_non_finite_coordinate() {
        assert_eq!(Item::new("a", ()).with_distance(3.0).non_finite_coordinate(), None);
        assert_eq!(Item::new("a", ()).non_finite_coordinate(), None);

        let (field, value) = Item::new("b", ())
            .with_distance(5.0)
            .with_angle(f64::INFINITY)
            .non_finite_coordinate()
            .unwrap();
        assert_eq!(field, "angle");
        assert_eq!(value, f64::INFINITY);

        let (field, value) = Item::new("c", ()).with_distance(f64::NAN).non_finite_coordinate().unwrap();
        assert_eq!(field, "distance");
        assert!(value.is_nan());
    }
}
