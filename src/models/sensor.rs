use crate::models::{
    traits::IRayTarget,
    common::{Vector2, SECTOR_COUNT, SECTOR_ANGLE_DEG, math_utils},
    obstacle::Obstacle,
};

/// セクター測距結果
///
/// 6つのセクターそれぞれについて、最も近い障害物（またはフィールド境界）までの距離を保持します。
/// セクター i は北から時計回りに [i·60°, (i+1)·60°) の範囲を表します。
/// 各値は 0 以上、最大検知距離以下に収まります。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    distances: [f64; SECTOR_COUNT],
}

impl SensorReading {
    pub fn new(distances: [f64; SECTOR_COUNT]) -> Self {
        Self { distances }
    }

    /// セクター距離のスライス
    pub fn as_slice(&self) -> &[f64] {
        &self.distances
    }

    pub fn distance(&self, sector: usize) -> Option<f64> {
        self.distances.get(sector).copied()
    }

    /// 全セクター中の最小距離
    pub fn min_distance(&self) -> f64 {
        self.distances.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// 最も空いているセクターのインデックス（同値の場合は小さいインデックスを優先）
    pub fn clearest_sector(&self) -> usize {
        clearest_sector(&self.distances).unwrap_or(0)
    }

    /// 方位角が属するセクターのインデックス
    pub fn sector_for_bearing(bearing_deg: f64) -> usize {
        sector_for_bearing(bearing_deg)
    }
}

impl AsRef<[f64]> for SensorReading {
    fn as_ref(&self) -> &[f64] {
        &self.distances
    }
}

/// 方位角（[0, 360) に正規化済み）が属するセクター
pub(crate) fn sector_for_bearing(bearing_deg: f64) -> usize {
    (bearing_deg / SECTOR_ANGLE_DEG) as usize % SECTOR_COUNT
}

/// 距離が最大のセクター。同値の場合は先に現れたインデックスを返す
pub(crate) fn clearest_sector(distances: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &distance) in distances.iter().enumerate() {
        match best {
            Some((_, best_distance)) if distance <= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// レイがフィールド矩形から出るまでの距離
///
/// 方向成分がゼロの軸は無限遠として扱います。
fn boundary_distance(position: &Vector2, direction: &Vector2, field_size: (f64, f64)) -> f64 {
    let (field_width, field_height) = field_size;

    let tx = if direction.x > 0.0 {
        (field_width - position.x) / direction.x
    } else if direction.x < 0.0 {
        -position.x / direction.x
    } else {
        f64::INFINITY
    };

    let ty = if direction.y > 0.0 {
        (field_height - position.y) / direction.y
    } else if direction.y < 0.0 {
        -position.y / direction.y
    } else {
        f64::INFINITY
    };

    tx.min(ty).max(0.0)
}

/// 6セクターの障害物距離をレイキャストで計算します
///
/// 各セクターの開始角（i·60°）方向に1本のレイを飛ばし、フィールド境界と
/// 全障害物との最近交差距離を求めます。副作用はなく、並行呼び出しに対して安全です。
///
/// # 引数
///
/// * `position` - 車両の現在位置
/// * `obstacles` - 障害物リスト（矩形は中心基準で解釈）
/// * `field_size` - フィールドの (幅, 高さ)
/// * `max_detect_distance` - 最大検知距離
///
/// # 戻り値
///
/// 各値が [0, max_detect_distance] に収まるセクター測距結果
pub fn cast_sector_distances(
    position: &Vector2,
    obstacles: &[Obstacle],
    field_size: (f64, f64),
    max_detect_distance: f64,
) -> SensorReading {
    let max_detect_distance = max_detect_distance.max(0.0);
    let mut distances = [0.0; SECTOR_COUNT];

    for (sector, slot) in distances.iter_mut().enumerate() {
        let direction = math_utils::heading_to_ray(sector as f64 * SECTOR_ANGLE_DEG);

        let mut min_distance = max_detect_distance;

        let t_field = boundary_distance(position, &direction, field_size);
        if t_field < min_distance {
            min_distance = t_field;
        }

        for obstacle in obstacles {
            if let Some(t) = obstacle.ray_hit(position, &direction, min_distance) {
                min_distance = t;
            }
        }

        *slot = min_distance.min(max_detect_distance);
    }

    SensorReading::new(distances)
}
