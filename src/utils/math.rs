/// Calculate percentage change between two values
pub fn percentage_change(old_value: f64, new_value: f64) -> Result<f64, String> {
    if old_value == 0.0 {
        return Err("Cannot calculate percentage change with zero base value".to_string());
    }

    Ok((new_value - old_value) / old_value * 100.0)
}

/// Arithmetic mean of a series; 0.0 for an empty series
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a series of values
pub fn std_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let avg = mean(values);
    let variance = values
        .iter()
        .map(|x| {
            let diff = x - avg;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;

    variance.sqrt()
}
