use nalgebra::{Point3, Vector3};

/// Wraps a fractional coordinate into `[0, 1)`.
///
/// Values that land on `1.0` after subtracting the floor (tiny negatives) map to `0.0`.
pub fn wrap_unit(value: f64) -> f64 {
    let wrapped = value - value.floor();
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

pub fn wrap_vector(vector: &Vector3<f64>) -> Vector3<f64> {
    vector.map(wrap_unit)
}

pub fn wrap_point(point: &Point3<f64>) -> Point3<f64> {
    Point3::from(wrap_vector(&point.coords))
}

/// Largest deviation of any component of `vector` from its nearest integer.
pub fn integer_deviation(vector: &Vector3<f64>) -> f64 {
    vector
        .iter()
        .map(|x| (x - x.round()).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unit_maps_into_half_open_interval() {
        assert_eq!(wrap_unit(0.25), 0.25);
        assert_eq!(wrap_unit(1.0), 0.0);
        assert_eq!(wrap_unit(-0.25), 0.75);
        assert_eq!(wrap_unit(2.5), 0.5);
        assert_eq!(wrap_unit(-1e-20), 0.0);
    }

    #[test]
    fn wrap_point_wraps_each_component() {
        let wrapped = wrap_point(&Point3::new(-0.5, 1.25, 3.0));
        assert_eq!(wrapped, Point3::new(0.5, 0.25, 0.0));
    }

    #[test]
    fn integer_deviation_measures_distance_to_lattice_translation() {
        assert_eq!(integer_deviation(&Vector3::new(1.0, -2.0, 0.0)), 0.0);
        assert!((integer_deviation(&Vector3::new(0.9, 0.05, 3.0)) - 0.1).abs() < 1e-12);
    }
}
