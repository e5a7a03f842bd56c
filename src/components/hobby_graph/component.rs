//! Leptos component wrapping the hobby graph canvas.
//!
//! The component creates an HTML canvas element, wires mouse and wheel
//! handlers to the view state, and runs an animation loop via
//! `requestAnimationFrame`. Content documents are fetched with
//! `wasm_bindgen_futures::spawn_local` and handed back to the controller when
//! they arrive. The achievement tooltip and the topic hover card are DOM
//! overlays driven by signals.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::ControllerConfig;
use super::content::ContentLoader;
use super::controller::{ContentRequest, GraphController};
use super::data::HobbyData;
use super::render;
use super::simulation::ForceSimulation;
use super::state::{HobbyGraphState, HoverCard};
use super::theme::Theme;

/// Longest frame step fed to the simulation clock, so a background tab does
/// not fast-forward timers on return.
const MAX_FRAME_SECS: f64 = 0.1;

struct GraphContext {
	state: HobbyGraphState<ForceSimulation>,
	theme: Theme,
}

/// What the tooltip overlay shows. Positions are whole pixels so the signal
/// only changes when something visible does.
#[derive(Clone, Debug, PartialEq)]
struct TooltipView {
	title: String,
	icon: String,
	description: String,
	tag: String,
	image: Option<String>,
	background: String,
	x: i32,
	y: i32,
}

fn tooltip_view(state: &HobbyGraphState<ForceSimulation>, content_root: &str) -> Option<TooltipView> {
	let tooltip = state.controller.tooltip()?;
	let (x, y) = state.tooltip_anchor()?;
	let background = tooltip.gradient.clone().unwrap_or_else(|| {
		state
			.controller
			.node(&tooltip.node_id)
			.map(|n| n.color.clone())
			.unwrap_or_default()
	});
	Some(TooltipView {
		title: tooltip.title.clone(),
		icon: tooltip.icon.clone(),
		description: tooltip.description.clone(),
		tag: tooltip.tag.clone(),
		image: tooltip.image.as_ref().map(|path| {
			if content_root.is_empty() {
				path.clone()
			} else {
				format!("{}/{path}", content_root.trim_end_matches('/'))
			}
		}),
		background,
		x: x.round() as i32,
		y: y.round() as i32,
	})
}

/// Hover card in whole pixels, same reasoning as [`TooltipView`].
#[derive(Clone, Debug, PartialEq)]
struct HoverCardView {
	label: String,
	icon: String,
	description: String,
	x: i32,
	y: i32,
}

impl From<HoverCard> for HoverCardView {
	fn from(card: HoverCard) -> Self {
		Self {
			label: card.label,
			icon: card.icon,
			description: card.description,
			x: card.x.round() as i32,
			y: card.y.round() as i32,
		}
	}
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Fetches a topic document and completes the expansion when it arrives.
fn spawn_content_request(
	request: ContentRequest,
	loader: Rc<ContentLoader>,
	context: Rc<RefCell<Option<GraphContext>>>,
) {
	wasm_bindgen_futures::spawn_local(async move {
		let content = loader.load(&request.topic_id).await;
		if let Some(ref mut c) = *context.borrow_mut() {
			c.state.controller.complete_expand(request, content);
		}
	});
}

/// Renders the interactive hobby graph on a canvas element.
///
/// Hobby data comes from the reactive `data` signal and topic documents are
/// fetched from `{content_root}/{topic}.md`. The component sizes itself to its
/// parent container by default; set `fullscreen = true` to fill the viewport
/// and follow window resizes. Explicit `width`/`height` override automatic
/// sizing.
#[component]
pub fn HobbyGraphCanvas(
	/// Center and hobbies to show.
	#[prop(into)]
	data: Signal<HobbyData>,
	/// Forces, geometry and timers.
	#[prop(optional)]
	config: ControllerConfig,
	/// Visual theme; the default theme when omitted.
	#[prop(optional)]
	theme: Option<Theme>,
	/// Directory holding the `{topic}.md` documents.
	#[prop(into, default = "content".to_string())]
	content_root: String,
	/// Fill the viewport and follow window resizes.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed canvas width in pixels.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed canvas height in pixels.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let loader = Rc::new(ContentLoader::new(content_root.clone()));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let tooltip = RwSignal::new(None::<TooltipView>);
	let hover_card = RwSignal::new(None::<HoverCardView>);
	let cursor = RwSignal::new("grab");
	let (context_init, animate_init, resize_cb_init, loader_init) =
		(context.clone(), animate.clone(), resize_cb.clone(), loader.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		let hobby_data = data.get();
		let topic_ids = hobby_data.topic_ids();
		let engine = ForceSimulation::new(config.forces.clone());
		let controller = GraphController::new(config.clone(), hobby_data, engine);
		*context_init.borrow_mut() = Some(GraphContext {
			state: HobbyGraphState::new(controller, w, h),
			theme: theme.clone().unwrap_or_default(),
		});

		let loader_preload = loader_init.clone();
		wasm_bindgen_futures::spawn_local(async move {
			let loaded = loader_preload.preload_all(&topic_ids).await;
			let with_content = loaded.values().filter(|c| !c.achievements.is_empty()).count();
			info!("hobby-graph: preloaded {with_content}/{} topic documents", loaded.len());
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.state.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		let content_root = content_root.clone();
		let last_frame = Cell::new(js_sys::Date::now());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let now = js_sys::Date::now();
			let dt = ((now - last_frame.replace(now)) / 1000.0).clamp(0.0, MAX_FRAME_SECS);
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				c.state.tick(dt);
				render::render(&c.state, &ctx, &c.theme);

				let view = tooltip_view(&c.state, &content_root);
				if tooltip.with_untracked(|current| *current != view) {
					tooltip.set(view);
				}
				let card = c.state.hover_card().map(HoverCardView::from);
				if hover_card.with_untracked(|current| *current != card) {
					hover_card.set(card);
				}
				let next_cursor = c.state.cursor();
				if cursor.get_untracked() != next_cursor {
					cursor.set(next_cursor);
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			c.state.pointer_down(x, y);
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			c.state.pointer_move(x, y);
		}
	};

	let (context_mu, loader_mu) = (context.clone(), loader.clone());
	let on_mouseup = move |_: MouseEvent| {
		let request = context_mu
			.borrow_mut()
			.as_mut()
			.and_then(|c| c.state.pointer_up());
		if let Some(request) = request {
			debug!("hobby-graph: loading content for {}", request.topic_id);
			spawn_content_request(request, loader_mu.clone(), context_mu.clone());
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.state.pointer_leave();
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			c.state.wheel(x, y, ev.delta_y());
		}
	};

	let context_tt = context.clone();
	let on_tooltip_click = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_tt.borrow_mut() {
			c.state.dismiss_tooltip();
		}
	};

	view! {
		<div class="hobby-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="hobby-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style=move || format!("display: block; cursor: {};", cursor.get())
			/>
			<div
				class="hobby-graph-overlay"
				style="position: absolute; inset: 0; pointer-events: none;"
				on:click=on_tooltip_click
			>
				{move || {
					hover_card
						.get()
						.map(|card| {
							let style = format!(
								"position: absolute; left: {}px; top: {}px; transform: translate(-50%, 8px);",
								card.x,
								card.y,
							);
							view! {
								<div class="hobby-hover-card" style=style>
									<span class="hobby-hover-card-icon">{card.icon}</span>
									<span class="hobby-hover-card-title">{card.label}</span>
									<p class="hobby-hover-card-description">{card.description}</p>
								</div>
							}
						})
				}}
				{move || {
					tooltip
						.get()
						.map(|t| {
							let style = format!(
								"position: absolute; left: {}px; top: {}px; transform: translate(-50%, -100%); pointer-events: auto;",
								t.x,
								t.y,
							);
							let header = format!("background: {};", t.background);
							view! {
								<div class="hobby-tooltip" style=style>
									<div class="hobby-tooltip-header" style=header>
										<span class="hobby-tooltip-icon">{t.icon}</span>
										<span class="hobby-tooltip-title">{t.title}</span>
									</div>
									{(!t.tag.is_empty())
										.then(|| view! { <span class="hobby-tooltip-tag">{t.tag}</span> })}
									<p class="hobby-tooltip-description">{t.description}</p>
									{t.image.map(|src| view! { <img class="hobby-tooltip-image" src=src /> })}
								</div>
							}
						})
				}}
			</div>
		</div>
	}
}
