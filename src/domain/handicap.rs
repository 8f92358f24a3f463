//! Handicap index 計算（World Handicap System 公式）。
//!
//! 取最佳 8 個差值平均後乘上 0.96，四捨五入到小數一位。
//! 篩選球員、狀態與最近 20 輪由 [`crate::domain::selection`] 負責，這裡只做算術。

use crate::domain::model::{HandicapResult, Round};
use crate::utils::error::{HandicapError, Result};

/// 參與平均的最佳差值數量
pub const BEST_DIFFERENTIALS: usize = 8;

/// 平均差值的縮放係數
pub const HANDICAP_FACTOR: f64 = 0.96;

/// 計算時考慮的最近輪數
pub const RECENT_ROUNDS: usize = 20;

/// 標準坡度
pub const STANDARD_SLOPE: f64 = 113.0;

/// 由總桿、球場難度與坡度換算單輪差值：`(gross - course_rating) * 113 / slope_rating`。
///
/// 結果不做四捨五入；坡度必須為正。
pub fn score_differential(gross: f64, course_rating: f64, slope_rating: f64) -> Result<f64> {
    if !slope_rating.is_finite() || slope_rating <= 0.0 {
        return Err(HandicapError::InvalidScore {
            message: format!("slope_rating must be positive, got {}", slope_rating),
        });
    }
    if !gross.is_finite() || !course_rating.is_finite() {
        return Err(HandicapError::InvalidScore {
            message: format!("gross {} / course_rating {} must be finite", gross, course_rating),
        });
    }

    Ok((gross - course_rating) * STANDARD_SLOPE / slope_rating)
}

/// 由差值序列計算 handicap index。
///
/// 空序列回傳全零結果；相同差值保持輸入順序（穩定排序）。
pub fn calculate_handicap(differentials: &[f64]) -> HandicapResult {
    if differentials.is_empty() {
        return HandicapResult::default();
    }

    let mut sorted = differentials.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let best = &sorted[..sorted.len().min(BEST_DIFFERENTIALS)];
    let avg_differential = best.iter().sum::<f64>() / best.len() as f64;

    HandicapResult {
        avg_differential,
        handicap_index: round_to_tenth(avg_differential * HANDICAP_FACTOR),
        rounds_used: best.len(),
    }
}

/// 先把每一輪的差值轉成數字再計算；遇到無法轉換的差值立即回傳錯誤。
///
/// 呼叫端需先排除差值為 null 的輪次，這裡會略過它們。
pub fn calculate_for_rounds<'a, I>(rounds: I) -> Result<HandicapResult>
where
    I: IntoIterator<Item = &'a Round>,
{
    let differentials = rounds
        .into_iter()
        .filter_map(|round| round.differential.as_ref())
        .map(|differential| differential.value())
        .collect::<Result<Vec<f64>>>()?;

    Ok(calculate_handicap(&differentials))
}

/// 四捨五入到小數一位，.x5 遠離零進位
pub fn round_to_tenth(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // 避免輸出 -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
