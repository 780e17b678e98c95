use std::sync::OnceLock;

// Logistic Functions

/// Knots of the logistic curve at d = -2048, -1920, .., 2048.
const SQUASH_KNOTS: [i32; 33] = [
    1,2,3,6,10,16,27,45,73,120,194,310,488,747,1101,
    1546,2047,2549,2994,3348,3607,3785,3901,3975,4022,
    4050,4068,4079,4085,4089,4092,4093,4094];

/// Returns p = 1/(1 + exp(-d)) (Inverse of stretch)
/// d = (-2047..2047), p = (0..4095)
#[inline]
pub fn squash(d: i32) -> i32 {
    if d > 2047  { return 4095; }
    if d < -2047 { return 0;    }
    let i_w = d & 127;
    let d = ((d >> 7) + 16) as usize;
    (SQUASH_KNOTS[d] * (128 - i_w) + SQUASH_KNOTS[d+1] * i_w + 64) >> 7
}

/// Returns p = ln(d/(1-d)) (Inverse of squash)
/// d = (0..4095), p = (-2047..2047)
#[inline]
pub fn stretch(p: i32) -> i32 {
    debug_assert!((0..4096).contains(&p), "probability {} out of range", p);
    stretch_table()[p as usize] as i32
}

/// Smallest d with squash(d) >= p, for every 12 bit probability.
fn stretch_table() -> &'static [i16; 4096] {
    static TABLE: OnceLock<[i16; 4096]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i16; 4096];
        let mut pi = 0;
        for x in -2047..=2047 {
            let i = squash(x);
            for j in pi..=i {
                table[j as usize] = x as i16;
            }
            pi = i + 1;
        }
        for j in pi..4096 {
            table[j as usize] = 2047;
        }
        table
    })
}

/// Logistic function sampled in floating point at every d. This is the
/// older way the curve was built; squash() is the canonical curve and the
/// two differ by up to 14 near |d| = 1000.
pub fn squash_reference(d: i32) -> i32 {
    static TABLE: OnceLock<Vec<i16>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        (-2047..=2047)
            .map(|d| {
                let p = 4096.0 / (1.0 + (-(d as f64) / 256.0).exp());
                (p as i32).min(4095) as i16
            })
            .collect()
    });
    table[(d.clamp(-2047, 2047) + 2047) as usize] as i32
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_is_monotone_and_bounded() {
        let mut last = squash(-4000);
        assert_eq!(last, 0);
        for d in -2047..=2047 {
            let p = squash(d);
            assert!(p >= last);
            assert!((0..4096).contains(&p));
            last = p;
        }
        assert_eq!(squash(0), 2047);
        assert_eq!(squash(4000), 4095);
    }

    #[test]
    fn stretch_inverts_squash_on_the_steep_part() {
        for d in -800..=800 {
            let back = stretch(squash(d));
            assert!((back - d).abs() <= 1, "d = {}, stretch(squash(d)) = {}", d, back);
        }
    }

    #[test]
    fn squash_of_stretch_never_undershoots() {
        for p in 0..4096 {
            let q = squash(stretch(p));
            assert!(q - p >= -1 && q - p <= 3, "p = {}, squash(stretch(p)) = {}", p, q);
        }
    }

    #[test]
    fn stretch_is_monotone_and_symmetric_at_the_ends() {
        for p in 1..4096 {
            assert!(stretch(p) >= stretch(p - 1));
        }
        assert_eq!(stretch(0), -2047);
        assert_eq!(stretch(4095), 2047);
    }

    #[test]
    fn reference_curve_is_close() {
        for d in -2047..=2047 {
            assert!((squash(d) - squash_reference(d)).abs() <= 16, "d = {}", d);
        }
        assert_eq!(squash_reference(0), 2048);
    }
}
