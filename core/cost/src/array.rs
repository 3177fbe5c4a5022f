use common::NormalizedFloat;

/// Normalizes dispersion of `stats`, treated as a distribution over servers (or hosts/racks),
/// against the best and worst case for that total mass (§4.2). Shared by every skew-style cost
/// function, the same way `Consideration::curve` is the one clamp-to-`[0,1]` shape every
/// consideration in the teacher's scoring system runs through.
pub fn cost_from_array(stats: &[f64]) -> NormalizedFloat {
    let n = stats.len();
    if n == 0 {
        return NormalizedFloat::zero();
    }

    let n_f = n as f64;
    let total: f64 = stats.iter().sum();
    let mean = total / n_f;

    let max = (n_f - 1.0) * mean + (total - mean);

    let min = if total < n_f {
        (n_f - total) * mean + (1.0 - mean) * total
    } else {
        let frac = total - mean.floor() * n_f;
        frac * (mean.ceil() - mean) + (n_f - frac) * (mean - mean.floor())
    };

    if (max - min).abs() < f64::EPSILON {
        return NormalizedFloat::zero();
    }

    let dispersion: f64 = stats.iter().map(|&s| (s - mean).abs()).sum();
    NormalizedFloat::clamped((dispersion - min) / (max - min))
}
