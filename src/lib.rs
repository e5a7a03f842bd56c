//! hobby-graph: Interactive expandable force-directed map of hobbies.
//!
//! This crate provides a WASM-based component that shows a center node, one
//! node per hobby, and achievement nodes that fan out when a hobby is
//! activated. Layout is a force simulation; achievement content is loaded
//! from per-hobby documents.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::hobby_graph::{
	ControllerConfig, GraphController, GraphSettings, HobbyData, HobbyGraphCanvas, LayoutEngine, Theme,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("hobby-graph: logging initialized");
}

/// Parse JSON from a script element, e.g. `<script id="hobby-data" type="application/json">`.
fn load_json<T: DeserializeOwned>(element_id: &str) -> Option<T> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(element_id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<T>(&json_text) {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("hobby-graph: failed to parse #{element_id}: {e}");
			None
		}
	}
}

/// Hobby data override from `#hobby-data`.
fn load_hobby_data() -> Option<HobbyData> {
	let data = load_json::<HobbyData>("hobby-data")?;
	info!("hobby-graph: loaded {} hobbies", data.hobbies.len());
	Some(data)
}

/// Controller and theme overrides from `#graph-config`.
fn load_graph_settings() -> Option<GraphSettings> {
	load_json("graph-config")
}

/// Main application component.
/// Loads hobby data and configuration from the DOM and renders the graph.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let hobby_data = load_hobby_data().unwrap_or_default();
	let title = hobby_data.center.name.clone();
	let data_signal = Signal::derive(move || hobby_data.clone());
	let settings = load_graph_settings().unwrap_or_default();
	let theme = settings.resolve_theme();
	let config = settings.controller;

	view! {
		<Html attr:lang="zh-CN" attr:dir="ltr" attr:data-theme="dark" />
		<Title text=title.clone() />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<HobbyGraphCanvas data=data_signal config=config theme=theme content_root="content" fullscreen=true />
			<div class="graph-overlay">
				<h1>{title}</h1>
				<p class="subtitle">"点击爱好展开成就，点击中心或空白处收起。拖动节点调整位置，滚轮缩放。"</p>
			</div>
		</div>
	}
}
