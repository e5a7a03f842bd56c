//! Visual theming for the hobby graph.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in `0.0..=1.0`.
	pub a: f64,
}

const FALLBACK: Color = Color::rgb(128, 128, 128);

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with opacity.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Parses `#RRGGBB`, `#RGB`, `rgb()` and `rgba()`. Anything else is gray.
	pub fn parse(css: &str) -> Self {
		let css = css.trim();
		if let Some(hex) = css.strip_prefix('#') {
			return Self::parse_hex(hex).unwrap_or(FALLBACK);
		}
		if css.starts_with("rgb") {
			let nums: Vec<&str> = css
				.trim_start_matches("rgba(")
				.trim_start_matches("rgb(")
				.trim_end_matches(')')
				.split(',')
				.map(str::trim)
				.collect();
			let channel = |i: usize| nums.get(i).and_then(|s| s.parse().ok()).unwrap_or(128);
			let a = nums.get(3).and_then(|s| s.parse().ok()).unwrap_or(1.0);
			return Self::rgba(channel(0), channel(1), channel(2), a);
		}
		FALLBACK
	}

	fn parse_hex(hex: &str) -> Option<Self> {
		if !hex.is_ascii() {
			return None;
		}
		let byte = |s: &str| u8::from_str_radix(s, 16).ok();
		match hex.len() {
			6 => Some(Self::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
			3 => {
				let short = |i: usize| byte(&hex[i..=i]).map(|v| v * 17);
				Some(Self::rgb(short(0)?, short(1)?, short(2)?))
			}
			_ => None,
		}
	}

	/// Same color with a different opacity.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		let up = |c: u8| (c as f64 + (255.0 - c as f64) * f) as u8;
		Self {
			r: up(self.r),
			g: up(self.g),
			b: up(self.b),
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		let down = |c: u8| (c as f64 * f) as u8;
		Self {
			r: down(self.r),
			g: down(self.g),
			b: down(self.b),
			a: self.a,
		}
	}

	/// Linear blend toward `other`; `t` is clamped to `0.0..=1.0`.
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
		Self {
			r: mix(self.r, other.r),
			g: mix(self.g, other.g),
			b: mix(self.b, other.b),
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	/// CSS color string, hex when opaque.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Radial canvas backdrop.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Outer color of the radial gradient.
	pub color: Color,
	/// Color at the center of the map.
	pub color_secondary: Color,
}

/// Link colors and widths. Child links are dashed.
#[derive(Clone, Debug)]
pub struct LinkStyle {
	/// Center to topic links.
	pub color: Color,
	/// Topic to achievement links.
	pub child_color: Color,
	/// Color blended in as a link's highlight intensity rises.
	pub highlight_color: Color,
	/// Stroke width of topic links.
	pub width: f64,
	/// Stroke width of child links.
	pub child_width: f64,
	/// Extra width at full highlight.
	pub highlight_width: f64,
	/// `(dash, gap)` for child links.
	pub child_dash: (f64, f64),
}

/// Node fill, stroke and text.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Stroke is the fill darkened by this factor.
	pub stroke_darken: f64,
	/// Stroke width in graph units.
	pub stroke_width: f64,
	/// Gradient highlight toward the upper left.
	pub sheen: f64,
	/// Label and icon text color.
	pub label_color: Color,
	/// CSS font family for labels.
	pub label_font_family: &'static str,
	/// Icon font size as a fraction of the node radius.
	pub icon_scale: f64,
	/// Label font size as a fraction of the node radius, clamped to `label_min_px`.
	pub label_scale: f64,
	/// Smallest label font size in pixels.
	pub label_min_px: f64,
	/// Ring drawn around the hovered node.
	pub hover_ring: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Preset name, as accepted by [`Theme::by_name`].
	pub name: &'static str,
	/// Canvas backdrop.
	pub background: BackgroundStyle,
	/// Link strokes.
	pub link: LinkStyle,
	/// Node fill, stroke and text.
	pub node: NodeStyle,
}

impl Theme {
	/// Deep violet backdrop with bright hobby colors (default).
	pub fn dusk() -> Self {
		Self {
			name: "dusk",
			background: BackgroundStyle {
				color: Color::rgb(30, 27, 58),
				color_secondary: Color::rgb(58, 50, 102),
			},
			link: LinkStyle {
				color: Color::rgba(255, 255, 255, 0.35),
				child_color: Color::rgba(255, 255, 255, 0.25),
				highlight_color: Color::rgba(255, 217, 61, 0.95),
				width: 2.0,
				child_width: 1.5,
				highlight_width: 2.0,
				child_dash: (6.0, 4.0),
			},
			node: NodeStyle {
				stroke_darken: 0.3,
				stroke_width: 3.0,
				sheen: 0.35,
				label_color: Color::rgb(255, 255, 255),
				label_font_family: "\"PingFang SC\", \"Microsoft YaHei\", sans-serif",
				icon_scale: 0.6,
				label_scale: 0.28,
				label_min_px: 10.0,
				hover_ring: Color::rgba(255, 255, 255, 0.8),
			},
		}
	}

	/// Light paper backdrop for printing or bright pages.
	pub fn paper() -> Self {
		Self {
			name: "paper",
			background: BackgroundStyle {
				color: Color::rgb(236, 233, 244),
				color_secondary: Color::rgb(252, 251, 255),
			},
			link: LinkStyle {
				color: Color::rgba(80, 80, 110, 0.35),
				child_color: Color::rgba(80, 80, 110, 0.25),
				highlight_color: Color::rgba(255, 107, 107, 0.9),
				width: 2.0,
				child_width: 1.5,
				highlight_width: 2.0,
				child_dash: (6.0, 4.0),
			},
			node: NodeStyle {
				stroke_darken: 0.3,
				stroke_width: 3.0,
				sheen: 0.3,
				label_color: Color::rgb(40, 40, 60),
				label_font_family: "\"PingFang SC\", \"Microsoft YaHei\", sans-serif",
				icon_scale: 0.6,
				label_scale: 0.28,
				label_min_px: 10.0,
				hover_ring: Color::rgba(60, 60, 90, 0.6),
			},
		}
	}

	/// Preset by name.
	pub fn by_name(name: &str) -> Option<Self> {
		match name {
			"dusk" => Some(Self::dusk()),
			"paper" => Some(Self::paper()),
			_ => None,
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::dusk()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_and_functional_notation() {
		assert_eq!(Color::parse("#FF6B6B"), Color::rgb(255, 107, 107));
		assert_eq!(Color::parse("#fff"), Color::rgb(255, 255, 255));
		assert_eq!(Color::parse("rgb(1, 2, 3)"), Color::rgb(1, 2, 3));
		assert_eq!(Color::parse("rgba(1,2,3,0.5)"), Color::rgba(1, 2, 3, 0.5));
	}

	#[test]
	fn unparseable_colors_fall_back_to_gray() {
		assert_eq!(Color::parse("tomato"), FALLBACK);
		assert_eq!(Color::parse("#12"), FALLBACK);
		assert_eq!(Color::parse("#zzzzzz"), FALLBACK);
		assert_eq!(Color::parse("#ééé"), FALLBACK);
	}

	#[test]
	fn darken_and_css_output() {
		let stroke = Color::parse("#4ECDC4").darken(0.5);
		assert_eq!(stroke, Color::rgb(39, 102, 98));
		assert_eq!(stroke.to_css(), "#276662");
		assert_eq!(stroke.with_alpha(0.5).to_css(), "rgba(39, 102, 98, 0.5)");
		assert_eq!(Color::rgb(0, 0, 0).lighten(1.0), Color::rgb(255, 255, 255));
	}

	#[test]
	fn lerp_reaches_both_ends() {
		let (a, b) = (Color::rgb(0, 0, 0), Color::rgba(200, 100, 50, 0.0));
		assert_eq!(a.lerp(b, 0.0), a);
		assert_eq!(a.lerp(b, 1.0), b);
		assert_eq!(a.lerp(b, 0.5), Color::rgba(100, 50, 25, 0.5));
	}

	#[test]
	fn themes_resolve_by_name() {
		assert_eq!(Theme::by_name("paper").map(|t| t.name), Some("paper"));
		assert!(Theme::by_name("neon").is_none());
		assert_eq!(Theme::default().name, "dusk");
	}
}
