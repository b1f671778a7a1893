use iced::Color;

/// Anchor points of a plasma-style colormap, (position, rgb in [0, 1]).
const ANCHORS: [(f32, [f32; 3]); 5] = [
    (0.00, [0.050, 0.030, 0.528]),
    (0.25, [0.494, 0.012, 0.658]),
    (0.50, [0.798, 0.280, 0.470]),
    (0.75, [0.973, 0.585, 0.254]),
    (1.00, [0.940, 0.975, 0.131]),
];

/// Maps a normalized magnitude in [0, 1] to a color; values outside the
/// range are clamped to the end anchors.
pub fn plasma(t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    for window in ANCHORS.windows(2) {
        let (t0, low) = window[0];
        let (t1, high) = window[1];
        if t <= t1 {
            let blend = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return Color::from_rgb(
                low[0] + (high[0] - low[0]) * blend,
                low[1] + (high[1] - low[1]) * blend,
                low[2] + (high[2] - low[2]) * blend,
            );
        }
    }
    let last = ANCHORS[ANCHORS.len() - 1].1;
    Color::from_rgb(last[0], last[1], last[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn endpoints_hit_the_anchor_colors() {
        let low = plasma(0.0);
        assert!(close(low.r, 0.050) && close(low.g, 0.030) && close(low.b, 0.528));

        let high = plasma(1.0);
        assert!(close(high.r, 0.940) && close(high.g, 0.975) && close(high.b, 0.131));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(plasma(-2.0), plasma(0.0));
        assert_eq!(plasma(3.5), plasma(1.0));
    }

    #[test]
    fn midpoints_interpolate_between_anchors() {
        // Halfway between the 0.00 and 0.25 anchors.
        let color = plasma(0.125);
        assert!(close(color.r, (0.050 + 0.494) / 2.0));
        assert!(close(color.g, (0.030 + 0.012) / 2.0));
        assert!(close(color.b, (0.528 + 0.658) / 2.0));
    }
}
