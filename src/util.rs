use std::f64::consts::TAU;

pub fn join_id(delimiter: &str, parts: &[&str]) -> String {
    parts.join(delimiter)
}

pub fn container_id(root: &str, delimiter: &str, container: &str) -> String {
    join_id(delimiter, &[root, container])
}

pub fn leaf_id(root: &str, delimiter: &str, container: &str, object: &str) -> String {
    join_id(delimiter, &[root, container, object])
}

pub fn short_name<'a>(id: &'a str, delimiter: &str) -> &'a str {
    if delimiter.is_empty() {
        return id;
    }
    id.rsplit_once(delimiter).map(|(_, rest)| rest).unwrap_or(id)
}

pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

pub fn polar_to_cartesian(angle: f64, radius: f64) -> (f64, f64) {
    (radius * angle.cos(), radius * angle.sin())
}

pub fn cartesian_to_polar(x: f64, y: f64) -> (f64, f64) {
    let radius = x.hypot(y);
    if radius <= f64::EPSILON {
        return (0.0, 0.0);
    }
    (normalize_angle(y.atan2(x)), radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_join_with_delimiter() {
        assert_eq!(container_id("Model", ".", "Sales"), "Model.Sales");
        assert_eq!(leaf_id("Model", ".", "Sales", "Amount"), "Model.Sales.Amount");
        assert_eq!(leaf_id("M", "/", "a", "b"), "M/a/b");
    }

    #[test]
    fn test_short_name_takes_last_segment() {
        assert_eq!(short_name("Model.Sales.Amount", "."), "Amount");
        assert_eq!(short_name("Model", "."), "Model");
    }

    #[test]
    fn test_normalize_angle_wraps_into_range() {
        let wrapped = normalize_angle(-std::f64::consts::FRAC_PI_2);
        assert!((wrapped - 1.5 * std::f64::consts::PI).abs() < 1e-12);
        assert!(normalize_angle(TAU).abs() < 1e-12);
    }

    #[test]
    fn test_polar_round_trip() {
        let (x, y) = polar_to_cartesian(1.0, 3.0);
        let (angle, radius) = cartesian_to_polar(x, y);
        assert!((angle - 1.0).abs() < 1e-9);
        assert!((radius - 3.0).abs() < 1e-9);
        assert_eq!(cartesian_to_polar(0.0, 0.0), (0.0, 0.0));
    }
}
