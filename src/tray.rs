//! Tray icon rendering, tinted by the current phase.

use pomotimer::models::Phase;
use thiserror::Error;
use tray_icon::Icon;

const ICON_SIZE: u32 = 22;

#[derive(Error, Debug)]
pub enum TrayError {
    #[error("Failed to load icon: {0}")]
    IconLoad(#[from] tray_icon::BadIcon),
}

/// Which icon variant to show; compared to avoid redundant icon swaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconKind {
    pub phase: Phase,
    pub finishing: bool,
}

/// RGB tint for each icon variant.
pub fn icon_color(kind: IconKind) -> [u8; 3] {
    match kind.phase {
        Phase::Work if kind.finishing => [235, 137, 33],
        Phase::Work => [220, 50, 47],
        Phase::ShortBreak => [76, 153, 0],
        Phase::LongBreak => [38, 110, 200],
    }
}

/// Builds a round icon in the variant's color with a small stem on top.
pub fn phase_icon(kind: IconKind) -> Result<Icon, TrayError> {
    let rgba = render_icon(icon_color(kind));
    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE).map_err(TrayError::IconLoad)
}

fn render_icon([r, g, b]: [u8; 3]) -> Vec<u8> {
    let size = ICON_SIZE;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);

    let center = size as f32 / 2.0;
    let radius = (size as f32 / 2.0) - 2.0;

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let distance = (dx * dx + dy * dy).sqrt();

            let alpha = if distance <= radius {
                255
            } else if distance <= radius + 1.0 {
                // Anti-aliased edge
                ((radius + 1.0 - distance) * 255.0) as u8
            } else {
                0
            };
            if alpha == 0 {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                rgba.extend_from_slice(&[r, g, b, alpha]);
            }
        }
    }

    // Green stem at the top
    let stem_center = size / 2;
    for y in 2..5 {
        for x in (stem_center - 1)..=(stem_center + 1) {
            let idx = ((y * size + x) * 4) as usize;
            rgba[idx..idx + 4].copy_from_slice(&[76, 153, 0, 255]);
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(phase: Phase, finishing: bool) -> IconKind {
        IconKind { phase, finishing }
    }

    #[test]
    fn test_icon_colors_differ_by_phase() {
        let work = icon_color(kind(Phase::Work, false));
        let finishing = icon_color(kind(Phase::Work, true));
        let short = icon_color(kind(Phase::ShortBreak, false));
        let long = icon_color(kind(Phase::LongBreak, false));
        assert_ne!(work, finishing);
        assert_ne!(work, short);
        assert_ne!(short, long);
    }

    #[test]
    fn test_render_icon_size_and_center() {
        let rgba = render_icon([1, 2, 3]);
        assert_eq!(rgba.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);

        let center = ((ICON_SIZE / 2 * ICON_SIZE + ICON_SIZE / 2) * 4) as usize;
        assert_eq!(&rgba[center..center + 4], &[1, 2, 3, 255]);
        // Corners are transparent
        assert_eq!(rgba[3], 0);
    }

    #[test]
    fn test_load_icon() {
        assert!(phase_icon(kind(Phase::Work, false)).is_ok());
        assert!(phase_icon(kind(Phase::LongBreak, false)).is_ok());
    }
}
