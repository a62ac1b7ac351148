use serde::{Deserialize, Serialize};

use crate::geom::{Rect, Size};

/// How source content is placed inside a destination rectangle.
///
/// Mirrors the familiar view content-mode set: two aspect-preserving scale
/// modes, a stretch mode, and nine anchored modes that keep the source at
/// its native point size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentMode {
    /// Stretch to fill the destination, ignoring aspect ratio.
    #[default]
    ScaleToFill,
    /// Uniformly scale so the whole source fits inside the destination.
    ScaleAspectFit,
    /// Uniformly scale so the source covers the whole destination.
    ScaleAspectFill,
    /// Treated identically to [`ContentMode::ScaleToFill`] in a raster
    /// pipeline; there is no deferred redraw pass here.
    Redraw,
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Compute where content of `source` size lands inside `dest` under `mode`.
///
/// The result may extend outside `dest` (aspect-fill and the anchored modes
/// do not clamp); callers that need clipping clip to `dest` themselves.
pub fn fit_rect(source: Size, dest: Rect, mode: ContentMode) -> Rect {
    let dest = dest.abs();
    let center = dest.center();
    match mode {
        ContentMode::ScaleToFill | ContentMode::Redraw => dest,
        ContentMode::ScaleAspectFit | ContentMode::ScaleAspectFill => {
            if source.width < 0.01 || source.height < 0.01 {
                return Rect::from_center_size(center, Size::ZERO);
            }
            let sx = dest.width() / source.width;
            let sy = dest.height() / source.height;
            let s = if matches!(mode, ContentMode::ScaleAspectFit) {
                sx.min(sy)
            } else {
                sx.max(sy)
            };
            let scaled = Size::new(source.width * s, source.height * s);
            Rect::from_center_size(center, scaled)
        }
        anchored => {
            let x = match anchored {
                ContentMode::Left | ContentMode::TopLeft | ContentMode::BottomLeft => dest.x0,
                ContentMode::Right | ContentMode::TopRight | ContentMode::BottomRight => {
                    dest.x1 - source.width
                }
                _ => center.x - source.width / 2.0,
            };
            let y = match anchored {
                ContentMode::Top | ContentMode::TopLeft | ContentMode::TopRight => dest.y0,
                ContentMode::Bottom | ContentMode::BottomLeft | ContentMode::BottomRight => {
                    dest.y1 - source.height
                }
                _ => center.y - source.height / 2.0,
            };
            Rect::new(x, y, x + source.width, y + source.height)
        }
    }
}

/// Whether the placed rect fully covers the destination, so no destination
/// pixel can remain transparent.
pub(crate) fn covers_dest(placed: Rect, dest: Rect) -> bool {
    placed.x0 <= dest.x0 && placed.y0 <= dest.y0 && placed.x1 >= dest.x1 && placed.y1 >= dest.y1
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEST: Rect = Rect::new(0.0, 0.0, 100.0, 40.0);

    #[test]
    fn scale_to_fill_returns_dest() {
        assert_eq!(fit_rect(Size::new(7.0, 3.0), DEST, ContentMode::ScaleToFill), DEST);
        assert_eq!(fit_rect(Size::new(7.0, 3.0), DEST, ContentMode::Redraw), DEST);
    }

    #[test]
    fn aspect_fit_letterboxes_wide_source() {
        // A 2:1 source into a wider dest pillarboxes horizontally.
        let r = fit_rect(Size::new(100.0, 50.0), DEST, ContentMode::ScaleAspectFit);
        assert_eq!(r, Rect::new(10.0, 0.0, 90.0, 40.0));
    }

    #[test]
    fn aspect_fit_square_source() {
        let r = fit_rect(Size::new(50.0, 50.0), DEST, ContentMode::ScaleAspectFit);
        assert_eq!(r, Rect::new(30.0, 0.0, 70.0, 40.0));
    }

    #[test]
    fn aspect_fill_covers_and_overflows() {
        let r = fit_rect(Size::new(50.0, 50.0), DEST, ContentMode::ScaleAspectFill);
        assert_eq!(r, Rect::new(0.0, -30.0, 100.0, 70.0));
        assert!(covers_dest(r, DEST));
    }

    #[test]
    fn degenerate_source_collapses_to_center() {
        let r = fit_rect(Size::new(0.0, 50.0), DEST, ContentMode::ScaleAspectFit);
        assert_eq!(r, Rect::from_center_size(DEST.center(), Size::ZERO));
    }

    #[test]
    fn anchored_modes_keep_native_size() {
        let src = Size::new(20.0, 10.0);
        assert_eq!(fit_rect(src, DEST, ContentMode::Center), Rect::new(40.0, 15.0, 60.0, 25.0));
        assert_eq!(fit_rect(src, DEST, ContentMode::TopLeft), Rect::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(
            fit_rect(src, DEST, ContentMode::BottomRight),
            Rect::new(80.0, 30.0, 100.0, 40.0)
        );
        assert_eq!(fit_rect(src, DEST, ContentMode::Top), Rect::new(40.0, 0.0, 60.0, 10.0));
        assert_eq!(fit_rect(src, DEST, ContentMode::Left), Rect::new(0.0, 15.0, 20.0, 25.0));
    }

    #[test]
    fn negative_dest_is_normalized() {
        let flipped = Rect::new(100.0, 40.0, 0.0, 0.0);
        assert_eq!(
            fit_rect(Size::new(50.0, 50.0), flipped, ContentMode::ScaleAspectFit),
            Rect::new(30.0, 0.0, 70.0, 40.0)
        );
    }
}
