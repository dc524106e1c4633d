use image::Rgb;

/// "Ocean" palette: dark green at zero through deep blue to white at 255.
///
/// Channel curves, with `x = value / 255`:
/// red `3x - 2`, green `|(3x - 1) / 2|`, blue `x`, each clipped to `[0, 1]`.
pub fn ocean(value: u8) -> Rgb<u8> {
    let x = value as f32 / 255.0;
    let r = (3.0 * x - 2.0).clamp(0.0, 1.0);
    let g = ((3.0 * x - 1.0) / 2.0).abs().clamp(0.0, 1.0);
    let b = x;
    Rgb([to_byte(r), to_byte(g), to_byte(b)])
}

fn to_byte(c: f32) -> u8 {
    (c * 255.0).round() as u8
}

/// The full 256-entry lookup table.
pub(crate) fn ocean_lut() -> [Rgb<u8>; 256] {
    std::array::from_fn(|i| ocean(i as u8))
}
