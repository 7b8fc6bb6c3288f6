use web_sys::CanvasRenderingContext2d;

use cardboard_core::geometry::{MeasureText, MonospaceMeasure};
use cardboard_core::gesture::HANDLE_SIZE;
use cardboard_core::scene::{Element, Scene, Selection, ShapeKind};

use crate::bitmaps::BitmapStore;

const HANDLE_FILL: &str = "#667eea";
const SELECTION_STROKE: &str = "#f00";

/// Text measurement through the live drawing surface. Falls back to the
/// fixed-advance approximation if the context refuses to measure.
pub struct CanvasMeasure<'a> {
    pub ctx: &'a CanvasRenderingContext2d,
}

impl MeasureText for CanvasMeasure<'_> {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        self.ctx.set_font(&format!("{font_size}px Arial"));
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(_) => MonospaceMeasure::default().text_width(text, font_size),
        }
    }
}

fn draw_arrow(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
    let half_w = width / 2.0;
    let head = (half_w - 10.0).max(0.0);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(-half_w, 0.0);
    ctx.line_to(head, 0.0);
    ctx.stroke();
    let barb = 6.0_f64.min(height / 2.0);
    ctx.begin_path();
    ctx.move_to(half_w, 0.0);
    ctx.line_to(head, -barb);
    ctx.line_to(head, barb);
    ctx.close_path();
    ctx.fill();
}

fn draw_element(ctx: &CanvasRenderingContext2d, element: &Element, bitmaps: &BitmapStore) {
    let (w, h) = (element.width(), element.height());
    let (cx, cy) = (element.x() + w / 2.0, element.y() + h / 2.0);

    ctx.save();
    let _ = ctx.translate(cx, cy);
    let _ = ctx.rotate(element.rotation().to_radians());

    match element {
        Element::Image { bitmap, .. } => {
            // still decoding: draw nothing this frame
            if let Some(image) = bitmap.as_ref().and_then(|id| bitmaps.get(*id)) {
                let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    image,
                    -w / 2.0,
                    -h / 2.0,
                    w,
                    h,
                );
            }
        }
        Element::Shape {
            kind,
            filled,
            color,
            ..
        } => {
            ctx.set_fill_style_str(color);
            ctx.set_stroke_style_str(color);
            match kind {
                ShapeKind::Rect => {
                    if *filled {
                        ctx.fill_rect(-w / 2.0, -h / 2.0, w, h);
                    } else {
                        ctx.set_line_width(2.0);
                        ctx.stroke_rect(-w / 2.0, -h / 2.0, w, h);
                    }
                }
                ShapeKind::Bar => {
                    ctx.fill_rect(-w / 2.0, -h / 2.0, w, h);
                }
                ShapeKind::Arrow => {
                    draw_arrow(ctx, w, h);
                }
            }
        }
    }
    ctx.restore();
}

fn draw_handle(ctx: &CanvasRenderingContext2d, element: &Element) {
    // axis-aligned even when the body is rotated, matching hit-testing
    let hx = element.x() + element.width();
    let hy = element.y() + element.height();
    ctx.set_fill_style_str(HANDLE_FILL);
    ctx.fill_rect(hx - HANDLE_SIZE, hy - HANDLE_SIZE, HANDLE_SIZE, HANDLE_SIZE);
    ctx.set_stroke_style_str("#fff");
    ctx.set_line_width(1.0);
    ctx.stroke_rect(hx - HANDLE_SIZE, hy - HANDLE_SIZE, HANDLE_SIZE, HANDLE_SIZE);
}

/// Full-scene redraw: white background, elements in list order (so later
/// additions paint on top), texts above everything, selection feedback
/// last.
pub fn draw_scene(ctx: &CanvasRenderingContext2d, scene: &Scene, bitmaps: &BitmapStore) {
    ctx.clear_rect(0.0, 0.0, scene.canvas_width, scene.canvas_height);
    ctx.set_fill_style_str("#fff");
    ctx.fill_rect(0.0, 0.0, scene.canvas_width, scene.canvas_height);

    for element in &scene.elements {
        draw_element(ctx, element, bitmaps);
    }

    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for (index, item) in scene.texts.iter().enumerate() {
        ctx.save();
        let _ = ctx.translate(item.x, item.y);
        let _ = ctx.rotate(item.rotation.to_radians());
        ctx.set_font(&format!("{}px Arial", item.font_size));
        ctx.set_fill_style_str(&item.color);
        let _ = ctx.fill_text(&item.text, 0.0, 0.0);

        if scene.selection == Selection::Text(index) {
            let width = match ctx.measure_text(&item.text) {
                Ok(metrics) => metrics.width(),
                Err(_) => MonospaceMeasure::default().text_width(&item.text, item.font_size),
            };
            let half_w = width / 2.0 + 4.0;
            let half_h = item.font_size / 2.0 + 4.0;
            ctx.set_stroke_style_str(SELECTION_STROKE);
            ctx.set_line_width(1.0);
            ctx.stroke_rect(-half_w, -half_h, half_w * 2.0, half_h * 2.0);
        }
        ctx.restore();
    }

    if let Some(element) = scene.selected_element() {
        draw_handle(ctx, element);
    }
}
