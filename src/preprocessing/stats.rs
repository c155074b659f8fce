//! Описательная статистика по непропущенным значениям

use std::cmp::Ordering;

use ndarray::Array1;

/// Непропущенные значения колонки
pub fn present(values: &[Option<f64>]) -> Array1<f64> {
    values.iter().flatten().copied().collect()
}

pub fn mean(values: &Array1<f64>) -> Option<f64> {
    values.mean()
}

/// Выборочное стандартное отклонение (n - 1); для n < 2 не определено
pub fn sample_std(values: &Array1<f64>) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.std(1.0))
}

/// Квантиль с линейной интерполяцией между соседними рангами
pub fn quantile(values: &Array1<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn median(values: &Array1<f64>) -> Option<f64> {
    quantile(values, 0.5)
}

pub fn min_max(values: &Array1<f64>) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Мода: самое частое значение, при равенстве - наименьшее
pub fn mode_by<T: Clone>(mut values: Vec<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Option<T> {
    values.sort_by(&cmp);

    let mut best: Option<(&T, usize)> = None;
    let mut i = 0;
    while i < values.len() {
        let mut j = i + 1;
        while j < values.len() && cmp(&values[i], &values[j]) == Ordering::Equal {
            j += 1;
        }
        let count = j - i;
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((&values[i], count));
        }
        i = j;
    }

    best.map(|(value, _)| value.clone())
}

pub fn numeric_mode(values: &Array1<f64>) -> Option<f64> {
    mode_by(values.to_vec(), f64::total_cmp)
}

pub fn text_mode(values: &[Option<String>]) -> Option<String> {
    mode_by(values.iter().flatten().cloned().collect(), |a: &String, b: &String| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_quantiles_match_linear_interpolation() {
        let values = array![1.0, 2.0, 3.0, 4.0, 100.0];
        assert_eq!(quantile(&values, 0.25), Some(2.0));
        assert_eq!(quantile(&values, 0.75), Some(4.0));
        assert_eq!(median(&array![4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_sample_std() {
        let values = array![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std(&values).unwrap();
        assert!((std - 2.138089935299395).abs() < 1e-12);
        assert_eq!(sample_std(&array![1.0]), None);
    }

    #[test]
    fn test_mode_prefers_smallest_on_tie() {
        assert_eq!(numeric_mode(&array![3.0, 1.0, 3.0, 1.0, 2.0]), Some(1.0));
        let words = vec![Some("b".to_string()), None, Some("a".to_string()), Some("b".to_string())];
        assert_eq!(text_mode(&words), Some("b".to_string()));
        assert_eq!(text_mode(&[None, None]), None);
    }

    #[test]
    fn test_present_skips_missing() {
        let values = present(&[Some(1.0), None, Some(3.0)]);
        assert_eq!(values.len(), 2);
        assert_eq!(mean(&values), Some(2.0));
    }
}
