use serde::{Deserialize, Serialize};

/// 2次元位置を表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// 2点間のユークリッド距離
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// 許容誤差つきの一致判定
    pub fn approx_eq(&self, other: &Point2D, tolerance: f64) -> bool {
        self.distance_to(other) <= tolerance
    }
}

/// ビューファクトリに渡す推奨サイズ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn square(side: f64) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// 極座標（角度・半径）から直交座標への変換
///
/// 角度は度で指定します。`x = r·cos(θ) + ox`, `y = r·sin(θ) + oy`
///
/// # 引数
///
/// * `angle_deg` - 角度（度）
/// * `origin` - 円の中心
/// * `radius` - 円の半径
pub fn point_on_circle(angle_deg: f64, origin: Point2D, radius: f64) -> Point2D {
    let angle_rad = math_utils::deg_to_rad(angle_deg);
    Point2D::new(
        radius * angle_rad.cos() + origin.x,
        radius * angle_rad.sin() + origin.y,
    )
}

/// 中心から見た点の角度（度、0度〜360度未満）
pub fn angle_of_point(point: Point2D, origin: Point2D) -> f64 {
    let angle = math_utils::rad_to_deg((point.y - origin.y).atan2(point.x - origin.x));
    math_utils::normalize_angle(angle)
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / std::f64::consts::PI
    }

    /// 角度を0度〜360度未満の範囲に正規化
    pub fn normalize_angle(angle_deg: f64) -> f64 {
        let normalized = angle_deg.rem_euclid(360.0);
        // rem_euclidは丸めで360.0を返すことがある
        if normalized >= 360.0 { 0.0 } else { normalized }
    }
}
