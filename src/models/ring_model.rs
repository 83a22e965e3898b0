use std::collections::HashSet;

use crate::models::item::Item;

/// リングの所属アイテム集合
///
/// キーによる重複排除のみを保証します。順序は持ちません。
#[derive(Debug, Clone, Default)]
pub struct RingModel {
    members: HashSet<String>,
}

impl RingModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未登録なら追加してtrue、既に存在する場合は何もせずfalse
    pub fn add<T>(&mut self, item: &Item<T>) -> bool {
        self.members.insert(item.key().to_string())
    }

    /// 登録済みなら削除してtrue
    pub fn remove<T>(&mut self, item: &Item<T>) -> bool {
        self.members.remove(item.key())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
