use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMap {
    #[default]
    Gray,
    Magma,
    Viridis,
}

const MAGMA: [[u8; 3]; 5] = [
    [0, 0, 4],
    [81, 18, 124],
    [183, 55, 121],
    [252, 137, 97],
    [252, 253, 191],
];

const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

impl ColorMap {
    /// Bytes per pixel in the rasterized output.
    pub fn channels(self) -> usize {
        match self {
            ColorMap::Gray => 1,
            ColorMap::Magma | ColorMap::Viridis => 3,
        }
    }

    /// Write the colour for intensity `t` (clamped to `[0, 1]`) into `out`,
    /// which holds `channels()` bytes.
    pub fn paint(self, t: f32, out: &mut [u8]) {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            ColorMap::Gray => out[0] = quantize(t * 255.0),
            ColorMap::Magma => out.copy_from_slice(&gradient(&MAGMA, t)),
            ColorMap::Viridis => out.copy_from_slice(&gradient(&VIRIDIS, t)),
        }
    }
}

fn quantize(v: f32) -> u8 {
    (v + 0.5).floor().clamp(0.0, 255.0) as u8
}

fn gradient(stops: &[[u8; 3]], t: f32) -> [u8; 3] {
    let pos = t * (stops.len() - 1) as f32;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    let frac = pos - i as f32;
    let (a, b) = (stops[i], stops[i + 1]);
    let mut rgb = [0u8; 3];
    for c in 0..3 {
        rgb[c] = quantize(a[c] as f32 + (b[c] as f32 - a[c] as f32) * frac);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(map: ColorMap, t: f32) -> Vec<u8> {
        let mut out = vec![0; map.channels()];
        map.paint(t, &mut out);
        out
    }

    #[test]
    fn gray_spans_full_range() {
        assert_eq!(paint(ColorMap::Gray, 0.0), vec![0]);
        assert_eq!(paint(ColorMap::Gray, 1.0), vec![255]);
        assert_eq!(paint(ColorMap::Gray, 0.5), vec![128]);
        assert_eq!(paint(ColorMap::Gray, 2.0), vec![255]);
        assert_eq!(paint(ColorMap::Gray, f32::NAN), vec![0]);
    }

    #[test]
    fn gradients_hit_their_stops() {
        assert_eq!(paint(ColorMap::Magma, 0.0), MAGMA[0].to_vec());
        assert_eq!(paint(ColorMap::Magma, 1.0), MAGMA[4].to_vec());
        assert_eq!(paint(ColorMap::Viridis, 0.5), VIRIDIS[2].to_vec());
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let mid = paint(ColorMap::Viridis, 0.125);
        for c in 0..3 {
            let lo = VIRIDIS[0][c].min(VIRIDIS[1][c]);
            let hi = VIRIDIS[0][c].max(VIRIDIS[1][c]);
            assert!(mid[c] >= lo && mid[c] <= hi);
        }
    }
}
