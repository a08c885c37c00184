//! Overlays recognition results onto camera frames.

use crate::hand::{HandLandmarks, CONNECTIVITY, NUM_LANDMARKS};
use crate::image::{draw, Color, Frame, Rect};

/// Margin added around the landmark extent of a hand, in pixels.
const BOX_MARGIN: i32 = 10;

/// Vertical gap between the bounding box and the symbol label, in pixels.
const LABEL_PAD: i32 = 4;

const BOX_COLOR: Color = Color::BLACK;
const SKELETON_COLOR: Color = Color::WHITE;
const LANDMARK_COLOR: Color = Color::RED;

/// Computes the pixel-space bounding box of a hand on a frame of the given size.
///
/// Landmark positions are normalized to `[0, 1]`. The box spans the landmark extent, expanded by a
/// fixed margin on every side. It may extend past the frame edges; drawing clips it.
pub fn bounding_box(hand: &HandLandmarks, width: u32, height: u32) -> Rect {
    let corners = hand.positions().iter().flat_map(|&[x, y]| {
        let px = x * width as f32;
        let py = y * height as f32;
        [
            (px.floor() as i32, py.floor() as i32),
            (px.ceil() as i32, py.ceil() as i32),
        ]
    });
    Rect::bounding(corners)
        .unwrap_or_else(|| Rect::from_top_left(0, 0, 0, 0))
        .grow_sides(BOX_MARGIN, BOX_MARGIN, BOX_MARGIN, BOX_MARGIN)
}

/// Draws hand landmarks, their bounding box, and the recognized symbol onto `frame`.
///
/// The symbol label is attached to the first hand. It is drawn above the bounding box when there
/// is room and below it otherwise, so that it stays within the frame.
///
/// Hands that do not carry the full landmark topology are skipped; drawing never fails.
pub fn annotate(frame: &mut Frame, hands: &[HandLandmarks], symbol: Option<char>) {
    let (width, height) = (frame.width(), frame.height());
    for (i, hand) in hands.iter().enumerate() {
        if hand.len() != NUM_LANDMARKS {
            log::warn!("not drawing hand with {} of {NUM_LANDMARKS} landmarks", hand.len());
            continue;
        }
        let px = |p: [f32; 2]| {
            (
                (p[0] * width as f32).round() as i32,
                (p[1] * height as f32).round() as i32,
            )
        };

        for &(a, b) in CONNECTIVITY {
            let (ax, ay) = px(hand.position(a));
            let (bx, by) = px(hand.position(b));
            draw::line(frame, ax, ay, bx, by).color(SKELETON_COLOR);
        }
        for &p in hand.positions() {
            let (x, y) = px(p);
            draw::marker(frame, x, y).color(LANDMARK_COLOR);
        }

        let rect = bounding_box(hand, width, height);
        draw::rect(frame, rect).color(BOX_COLOR).stroke_width(2);

        if i == 0 {
            if let Some(symbol) = symbol {
                draw_label(frame, rect, symbol);
            }
        }
    }
}

fn draw_label(frame: &mut Frame, rect: Rect, symbol: char) {
    let mut buf = [0; 4];
    let text = symbol.encode_utf8(&mut buf);
    let (text_w, text_h) = draw::text_extent(text);

    let mut y = rect.y() - LABEL_PAD - text_h as i32;
    if y < 0 {
        y = rect.max_y() + LABEL_PAD;
    }
    let x = rect.x().max(0);

    draw::rect(
        frame,
        Rect::from_top_left(x, y, text_w + 2, text_h),
    )
    .color(BOX_COLOR)
    .fill();
    draw::text(frame, x + 1, y, text)
        .align_left()
        .align_top()
        .color(Color::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_spanning(min: [f32; 2], max: [f32; 2]) -> HandLandmarks {
        let mut points = vec![[min[0], min[1]], [max[0], max[1]]];
        points.resize(crate::hand::NUM_LANDMARKS, [min[0], min[1]]);
        HandLandmarks::new(points)
    }

    #[test]
    fn bounding_box_adds_margin_in_pixel_space() {
        let hand = hand_spanning([0.2, 0.3], [0.6, 0.8]);
        let rect = bounding_box(&hand, 640, 480);
        assert_eq!((rect.x(), rect.y()), (118, 134));
        assert_eq!((rect.max_x(), rect.max_y()), (394, 394));
    }

    #[test]
    fn degenerate_extent_still_yields_a_box() {
        let hand = hand_spanning([0.5, 0.5], [0.5, 0.5]);
        let rect = bounding_box(&hand, 100, 100);
        assert_eq!((rect.x(), rect.y()), (40, 40));
        assert_eq!((rect.max_x(), rect.max_y()), (60, 60));
    }

    #[test]
    fn annotate_handles_hands_near_the_frame_edge() {
        let mut frame = Frame::new(64, 64);
        let hand = hand_spanning([0.0, 0.0], [0.1, 0.1]);
        // Label would land above the frame; it must be moved below the box instead of vanishing.
        annotate(&mut frame, &[hand], Some('A'));
    }

    #[test]
    fn hands_with_missing_landmarks_are_not_drawn() {
        let mut frame = Frame::new(32, 32);
        let short = HandLandmarks::new(vec![[0.5, 0.5]; 5]);
        annotate(&mut frame, &[short], Some('A'));
        for y in 0..32 {
            for x in 0..32 {
                assert_eq!(frame.get(x, y).a(), 0);
            }
        }
    }

    #[test]
    fn annotate_without_hands_is_a_no_op() {
        let mut frame = Frame::new(8, 8);
        annotate(&mut frame, &[], Some('A'));
        assert_eq!(frame.get(4, 4).a(), 0);
    }
}
