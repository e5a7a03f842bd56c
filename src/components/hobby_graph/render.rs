//! Canvas rendering for the hobby graph.
//!
//! Draws from the transition layer rather than the raw model so entering and
//! exiting elements animate. Passes, back to front:
//! 1. Background (screen space)
//! 2. Links, dimmed unless they touch the hovered node (world space)
//! 3. Nodes: fill, stroke, icon, label, then the hover ring

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::highlight::HighlightState;
use super::simulation::LayoutEngine;
use super::state::HobbyGraphState;
use super::theme::{Color, Theme};
use super::transition::{LinkPresence, NodePresence};

fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Renders the complete graph to the canvas.
pub fn render<E: LayoutEngine>(state: &HobbyGraphState<E>, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	draw_background(state.width, state.height, ctx, theme);

	let highlight = state.controller.highlight();
	let k = state.transform.k;
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(k, k);

	for link in state.transitions.links() {
		draw_link(ctx, link, highlight, theme);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	for node in state.transitions.nodes() {
		draw_node(ctx, node, highlight, theme, k);
	}

	ctx.restore();
}

fn draw_background(width: f64, height: f64, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let background = &theme.background;
	match ctx.create_radial_gradient(
		width / 2.0,
		height / 2.0,
		0.0,
		width / 2.0,
		height / 2.0,
		width.max(height) * 0.8,
	) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &background.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &background.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&background.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, width, height);
}

fn draw_link(ctx: &CanvasRenderingContext2d, presence: &LinkPresence, highlight: &HighlightState, theme: &Theme) {
	let segment = &presence.item;
	let ((x1, y1), (x2, y2)) = (segment.from, segment.to);
	if (x2 - x1).hypot(y2 - y1) < 0.001 {
		return;
	}

	let style = &theme.link;
	let link_t = smooth_step(highlight.link_intensity(&segment.link.source, &segment.link.target));
	let dim = 1.0 - 0.6 * smooth_step(highlight.max_intensity()) * (1.0 - link_t);

	let (base, width) = if segment.link.is_child_link {
		(style.child_color, style.child_width)
	} else {
		(style.color, style.width)
	};
	let color = base.lerp(style.highlight_color, link_t);

	ctx.set_stroke_style_str(&color.with_alpha(color.a * dim * presence.scale).to_css());
	ctx.set_line_width(width + style.highlight_width * link_t);
	if segment.link.is_child_link {
		let (dash, gap) = style.child_dash;
		let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(dash), &JsValue::from_f64(gap)));
	} else {
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}

	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(x2, y2);
	ctx.stroke();
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	presence: &NodePresence,
	highlight: &HighlightState,
	theme: &Theme,
	k: f64,
) {
	let node = &presence.item;
	let scale = smooth_step(presence.scale);
	if scale < 0.01 {
		return;
	}

	let style = &theme.node;
	let node_t = smooth_step(highlight.node_intensity(&node.id));
	let max_t = smooth_step(highlight.max_intensity());
	let alpha = (1.0 - 0.5 * max_t * (1.0 - node_t)) * presence.scale.min(1.0);
	let radius = node.radius * scale * (1.0 + 0.08 * node_t);
	let (x, y) = (node.x, node.y);
	let base = Color::parse(&node.color);

	ctx.set_global_alpha(alpha);

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	match ctx.create_radial_gradient(x - radius * 0.3, y - radius * 0.3, 0.0, x, y, radius) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &base.lighten(style.sheen).to_css());
			let _ = gradient.add_color_stop(0.75, &base.to_css());
			let _ = gradient.add_color_stop(1.0, &base.darken(0.1).to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&base.to_css()),
	}
	ctx.fill();

	ctx.set_stroke_style_str(&base.darken(style.stroke_darken).to_css());
	ctx.set_line_width(style.stroke_width / k);
	ctx.stroke();

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	let icon_px = radius * style.icon_scale;
	ctx.set_font(&format!("{icon_px:.1}px sans-serif"));
	ctx.set_fill_style_str("#ffffff");
	let _ = ctx.fill_text(&node.icon, x, y - radius * 0.15);

	let label_px = (node.radius * style.label_scale).max(style.label_min_px) * scale;
	ctx.set_font(&format!("600 {label_px:.1}px {}", style.label_font_family));
	ctx.set_fill_style_str(&style.label_color.to_css());
	let _ = ctx.fill_text(&node.label, x, y + radius * 0.55);

	ctx.set_global_alpha(1.0);

	let ring_t = smooth_step(highlight.hover_ring_intensity(&node.id));
	if ring_t > 0.01 {
		let ring = style.hover_ring;
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius + 6.0 / k, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&ring.with_alpha(ring.a * ring_t).to_css());
		ctx.set_line_width(2.0 / k);
		ctx.stroke();
	}
}
