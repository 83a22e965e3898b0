use crate::models::{
    geometry::{Point2D, Size2D},
    item::Item,
    ring::Placement,
};

/// 配置済みアイテムの表示物を生成する外部コラボレータ
///
/// 配置エンジン自身は呼び出しません。呼び出し側が `add` の成功後に使います。
pub trait ViewFactory<T> {
    type View;

    fn make_view(&self, item: &Item<T>, preferred_size: Size2D) -> Self::View;
}

/// テキスト表示用のビュー
#[derive(Debug, Clone, PartialEq)]
pub struct TextView {
    pub label: String,
    pub size: Size2D,
    pub center: Point2D,
}

impl TextView {
    /// 配置位置にビューを置く
    pub fn placed_at(mut self, placement: &Placement) -> Self {
        self.center = placement.point;
        self
    }

    pub fn render(&self) -> String {
        format!(
            "[{}] ({:.1}, {:.1}) {:.0}x{:.0}",
            self.label, self.center.x, self.center.y, self.size.width, self.size.height
        )
    }
}

/// ペイロードの `Display` をラベルにするファクトリ
#[derive(Debug, Clone, Copy, Default)]
pub struct TextViewFactory;

impl<T: std::fmt::Display> ViewFactory<T> for TextViewFactory {
    type View = TextView;

    fn make_view(&self, item: &Item<T>, preferred_size: Size2D) -> TextView {
        TextView {
            label: item.payload.to_string(),
            size: preferred_size,
            center: Point2D::origin(),
        }
    }
}
