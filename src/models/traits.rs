use crate::models::common::Vector2;

/// レイキャストの対象となる形状のインターフェース
///
/// センサーの測距処理から呼び出されます。
pub trait IRayTarget {
    /// `origin` から `direction` 方向に伸ばしたレイとの交差距離
    ///
    /// `current_min` より近い正の交差距離が見つかった場合のみ `Some` を返します。
    fn ray_hit(&self, origin: &Vector2, direction: &Vector2, current_min: f64) -> Option<f64>;
}

/// 衝突判定のインターフェース
///
/// 運動積分のサブステップごとに呼び出されます。
pub trait ICollision {
    /// 点が形状の内部（境界を含む）にあるかどうか
    fn contains_point(&self, point: &Vector2) -> bool;
}
