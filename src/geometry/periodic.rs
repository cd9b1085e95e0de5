//! Periodic box wrapping
//!
//! Re-images coordinates into `(-L/2, L/2]` along each axis. Points far
//! outside the box are corrected one box length at a time until they land
//! inside, so the boundary semantics are exactly those of the comparisons:
//! `+L/2` is kept, `-L/2` becomes `+L/2`. Points many box lengths away are
//! first reduced with a remainder. Non-finite components are left alone.

/// Wrap coordinates into the periodic box, in place.
///
/// `None` means a non-periodic volume and leaves the coordinates alone.
/// Box lengths must be positive and finite.
pub fn wrap_box(coords: &mut [[f64; 3]], boxsize: Option<&[f64; 3]>) {
    let Some(boxsize) = boxsize else {
        return;
    };
    for coord in coords.iter_mut() {
        for axis in 0..3 {
            coord[axis] = wrap_component(coord[axis], boxsize[axis]);
        }
    }
}

/// Beyond this many box lengths, reduce with a remainder before the
/// correction loops.
const REDUCE_BEYOND: f64 = 4.0;

#[inline]
fn wrap_component(mut x: f64, length: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    if x.abs() > REDUCE_BEYOND * length {
        x = x.rem_euclid(length);
    }
    let half = length / 2.0;
    while x > half {
        x -= length;
    }
    while x <= -half {
        x += length;
    }
    x
}

/// True if the box lengths can be used for wrapping.
pub fn is_valid_boxsize(boxsize: &[f64; 3]) -> bool {
    boxsize.iter().all(|l| l.is_finite() && *l > 0.0)
}
