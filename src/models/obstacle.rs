use crate::models::{
    traits::{IRayTarget, ICollision},
    common::Vector2,
};

/// 静的障害物
///
/// 矩形の `origin` はセンサー（レイキャスト）と衝突判定で解釈が異なります。
///
/// - レイキャスト: `origin` を矩形の**中心**として扱う
/// - 衝突判定: `origin` を矩形の**左上隅**として扱う
///
/// どちらの規約も既存の挙動として維持しています。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    /// 円形障害物
    Circle {
        center: Vector2,
        radius: f64,
    },
    /// 軸平行な矩形障害物
    Rectangle {
        origin: Vector2,
        width: f64,
        height: f64,
    },
}

impl Obstacle {
    pub fn circle(center: Vector2, radius: f64) -> Self {
        Obstacle::Circle { center, radius }
    }

    pub fn rectangle(origin: Vector2, width: f64, height: f64) -> Self {
        Obstacle::Rectangle { origin, width, height }
    }

    /// 障害物種別の名前（ログ出力用）
    pub fn kind(&self) -> &'static str {
        match self {
            Obstacle::Circle { .. } => "circle",
            Obstacle::Rectangle { .. } => "rectangle",
        }
    }

    /// 中心基準の矩形に対するスラブ法のレイ交差判定
    fn rectangle_ray_hit(
        center: &Vector2,
        width: f64,
        height: f64,
        origin: &Vector2,
        direction: &Vector2,
        current_min: f64,
    ) -> Option<f64> {
        let left = center.x - width / 2.0;
        let right = center.x + width / 2.0;
        let top = center.y - height / 2.0;
        let bottom = center.y + height / 2.0;

        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        // X軸スラブ
        if direction.x != 0.0 {
            let t1 = (left - origin.x) / direction.x;
            let t2 = (right - origin.x) / direction.x;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        } else if origin.x < left || origin.x > right {
            return None;
        }

        // Y軸スラブ
        if direction.y != 0.0 {
            let t1 = (top - origin.y) / direction.y;
            let t2 = (bottom - origin.y) / direction.y;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        } else if origin.y < top || origin.y > bottom {
            return None;
        }

        if t_near > t_far || t_far < 0.0 {
            return None;
        }

        let t_intersect = if t_near > 0.0 { t_near } else { t_far };
        (t_intersect > 0.0 && t_intersect < current_min).then_some(t_intersect)
    }
}

impl IRayTarget for Obstacle {
    fn ray_hit(&self, origin: &Vector2, direction: &Vector2, current_min: f64) -> Option<f64> {
        match self {
            Obstacle::Circle { center, radius } => {
                let offset = *origin - *center;
                let a = direction.x.powi(2) + direction.y.powi(2);
                let b = 2.0 * (direction.x * offset.x + direction.y * offset.y);
                let c = offset.x.powi(2) + offset.y.powi(2) - radius.powi(2);

                let discriminant = b.powi(2) - 4.0 * a * c;
                if discriminant < 0.0 {
                    return None;
                }

                let sqrt_discr = discriminant.sqrt();
                let t1 = (-b - sqrt_discr) / (2.0 * a);
                let t2 = (-b + sqrt_discr) / (2.0 * a);

                // t1 <= t2 なので最初に条件を満たした根が最小
                [t1, t2].into_iter().find(|&t| t > 0.0 && t < current_min)
            }
            Obstacle::Rectangle { origin: center, width, height } => {
                Self::rectangle_ray_hit(center, *width, *height, origin, direction, current_min)
            }
        }
    }
}

impl ICollision for Obstacle {
    fn contains_point(&self, point: &Vector2) -> bool {
        match self {
            Obstacle::Circle { center, radius } => {
                point.distance_squared(center) <= radius.powi(2)
            }
            Obstacle::Rectangle { origin, width, height } => {
                origin.x <= point.x && point.x <= origin.x + width &&
                origin.y <= point.y && point.y <= origin.y + height
            }
        }
    }
}

/// 点がいずれかの障害物と衝突しているかどうか
///
/// 矩形は `origin` を左上隅として判定します。外部から受け取った座標の検証にも使用できます。
pub fn is_colliding(point: &Vector2, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|obstacle| obstacle.contains_point(point))
}
