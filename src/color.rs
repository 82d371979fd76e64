// Accent color to backlight color transform

use steelsvc_transport::Rgb;

/// Vibrance boost applied around the gray axis
pub const VIBRANCE: f32 = 1.45;

/// Perceptual luminance (ITU-R BT.601 weights)
pub fn luminance(color: Rgb) -> f32 {
    0.2989 * color.r as f32 + 0.587 * color.g as f32 + 0.114 * color.b as f32
}

/// Map a desktop accent color to the color shown by the backlight
///
/// Every channel is pushed away from the luminance by `VIBRANCE`; grays stay
/// gray. The sum is truncated toward zero before clamping to 0..=255.
pub fn transform(accent: Rgb) -> Rgb {
    let offset = -luminance(accent) * VIBRANCE;
    let channel = |c: u8| -> u8 {
        let value = (offset + c as f32 * (1.0 + VIBRANCE)) as i32;
        value.clamp(0, 255) as u8
    };

    Rgb {
        r: channel(accent.r),
        g: channel(accent.g),
        b: channel(accent.b),
    }
}
