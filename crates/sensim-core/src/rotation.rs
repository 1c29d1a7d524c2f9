//! Sensor orientations.
//!
//! A sensor's orientation maps its local frame (footprint in the local
//! x-y plane, measurement axes along the local axes) into the global
//! frame of the simulation.

use nalgebra::Rotation3;

/// Orientation of a single sensor, local frame to global frame.
pub type Rotation = Rotation3<f64>;

/// Build an orientation from `[z, y, x]` angles in degrees.
///
/// Angles are applied intrinsically: yaw about z, then pitch about the new
/// y, then roll about the new x.
pub fn euler_zyx_degrees(zyx: [f64; 3]) -> Rotation {
    Rotation3::from_euler_angles(zyx[2].to_radians(), zyx[1].to_radians(), zyx[0].to_radians())
}

/// `n` identity orientations.
pub fn identity_rotations(n: usize) -> Vec<Rotation> {
    vec![Rotation3::identity(); n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;
    use proptest::prelude::*;

    #[test]
    fn yaw_of_ninety_degrees_maps_x_to_y() {
        let r = euler_zyx_degrees([90.0, 0.0, 0.0]);
        let v = r * Vector3::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_angles_are_identity() {
        let r = euler_zyx_degrees([0.0, 0.0, 0.0]);
        assert_eq!(r, Rotation::identity());
    }

    #[test]
    fn identity_rotations_has_requested_length() {
        let rs = identity_rotations(3);
        assert_eq!(rs.len(), 3);
        assert!(rs.iter().all(|r| *r == Rotation::identity()));
    }

    proptest! {
        #[test]
        fn rotations_preserve_length(
            z in -180.0f64..180.0,
            y in -90.0f64..90.0,
            x in -180.0f64..180.0,
            v in prop::array::uniform3(-10.0f64..10.0),
        ) {
            let v = Vector3::from(v);
            let r = euler_zyx_degrees([z, y, x]);
            prop_assert!(((r * v).norm() - v.norm()).abs() < 1e-9);
            prop_assert!((r.inverse() * (r * v) - v).norm() < 1e-9);
        }
    }
}
