//! Static hobby dataset and id/gradient/achievement lookups.
//!
//! The built-in dataset is used unless the page provides a JSON override
//! (see `load_hobby_data` in the crate root).

use serde::Deserialize;

use super::types::Achievement;

/// The hub node shown in the middle of the map.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CenterEntry {
	/// Node id.
	pub id: String,
	/// Label drawn on the node and used as the page title.
	pub name: String,
	/// Emoji drawn above the label.
	pub icon: String,
	/// Fill color.
	pub color: String,
	/// Shown in the hover card.
	#[serde(default)]
	pub description: String,
}

/// One hobby, rendered as a topic node.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HobbyEntry {
	/// Topic id, also the content document name.
	pub id: String,
	/// Label drawn on the node.
	pub name: String,
	/// Emoji drawn above the label, inherited by achievements.
	pub icon: String,
	/// Fill color, inherited by achievements.
	pub color: String,
	/// CSS gradient used by the tooltip header.
	#[serde(default)]
	pub gradient: Option<String>,
	/// Shown in the hover card.
	#[serde(default)]
	pub description: String,
	/// Used when the topic's content document yields nothing.
	#[serde(default)]
	pub achievements: Vec<Achievement>,
}

/// Center plus hobbies.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HobbyData {
	/// Hub node.
	pub center: CenterEntry,
	/// Topics in display order, clockwise from the top.
	pub hobbies: Vec<HobbyEntry>,
}

impl HobbyData {
	/// Hobby by id.
	pub fn hobby(&self, id: &str) -> Option<&HobbyEntry> {
		self.hobbies.iter().find(|h| h.id == id)
	}

	/// Hobby ids in display order.
	pub fn topic_ids(&self) -> Vec<String> {
		self.hobbies.iter().map(|h| h.id.clone()).collect()
	}

	/// Tooltip header gradient of a hobby, if configured.
	pub fn gradient_of(&self, id: &str) -> Option<&str> {
		self.hobby(id).and_then(|h| h.gradient.as_deref())
	}

	/// Static achievements for a topic (empty for unknown ids).
	pub fn achievements_for(&self, id: &str) -> &[Achievement] {
		self.hobby(id).map(|h| h.achievements.as_slice()).unwrap_or(&[])
	}
}

fn achievement(title: &str, description: &str, tag: &str) -> Achievement {
	Achievement {
		title: title.into(),
		description: description.into(),
		tag: tag.into(),
		image: None,
	}
}

impl Default for HobbyData {
	fn default() -> Self {
		Self {
			center: CenterEntry {
				id: "center".into(),
				name: "我的爱好".into(),
				icon: "🌟".into(),
				color: "#FFD93D".into(),
				description: "探索我的多彩世界".into(),
			},
			hobbies: vec![
				HobbyEntry {
					id: "video".into(),
					name: "视频制作".into(),
					icon: "🎬".into(),
					color: "#FF6B6B".into(),
					gradient: Some("linear-gradient(135deg, #FF6B6B 0%, #FF8E53 100%)".into()),
					description: "用镜头记录生活，用剪辑讲述故事。从创意构思到后期制作，每一帧都是艺术。"
						.into(),
					achievements: vec![
						achievement("短视频创作", "制作创意短视频，在各平台分享生活点滴", "内容创作"),
						achievement(
							"剪辑技术",
							"熟练使用 Premiere Pro、DaVinci Resolve 等专业剪辑软件",
							"技能",
						),
						achievement("特效制作", "学习 After Effects，制作炫酷的视觉特效", "进阶"),
						achievement("调色艺术", "掌握电影级调色技巧，营造独特视觉风格", "专业"),
					],
				},
				HobbyEntry {
					id: "hosting".into(),
					name: "主持".into(),
					icon: "🎤".into(),
					color: "#4ECDC4".into(),
					gradient: Some("linear-gradient(135deg, #4ECDC4 0%, #44A08D 100%)".into()),
					description: "站在舞台中央，用声音传递力量。控场、互动、感染力，这就是主持的魅力。"
						.into(),
					achievements: vec![
						achievement("活动主持", "主持各类校园活动、晚会和比赛", "经验"),
						achievement("演讲能力", "具备出色的公众演讲和即兴发挥能力", "核心能力"),
						achievement("控场技巧", "能够灵活应对各种突发状况，保持活动流畅进行", "专业"),
						achievement("语言表达", "普通话标准，表达清晰有感染力", "基础"),
					],
				},
				HobbyEntry {
					id: "fitness".into(),
					name: "健身".into(),
					icon: "💪".into(),
					color: "#95E1D3".into(),
					gradient: Some("linear-gradient(135deg, #95E1D3 0%, #4ECDC4 100%)".into()),
					description: "强健体魄，挑战自我。科学训练，持续进步，感受每一次突破的喜悦。".into(),
					achievements: vec![
						achievement("力量训练", "系统进行重量训练，不断突破个人极限", "核心"),
						achievement("有氧运动", "跑步、游泳、骑行，保持心肺健康", "基础"),
						achievement("营养管理", "科学饮食计划，合理搭配蛋白质与碳水", "知识"),
						achievement("训练计划", "制定个性化训练计划，追踪进度和成果", "规划"),
					],
				},
			],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_dataset_has_three_hobbies() {
		let data = HobbyData::default();
		assert_eq!(data.topic_ids(), vec!["video", "hosting", "fitness"]);
		assert_eq!(data.achievements_for("video").len(), 4);
		assert!(data.achievements_for("cooking").is_empty());
	}

	#[test]
	fn lookups_cover_center_and_hobbies() {
		let data = HobbyData::default();
		assert_eq!(data.center.color, "#FFD93D");
		assert_eq!(data.hobby("hosting").map(|h| h.color.as_str()), Some("#4ECDC4"));
		assert!(data.hobby("nope").is_none());
		assert!(data.hobby("center").is_none());
		assert!(data.gradient_of("fitness").unwrap().contains("#95E1D3"));
		assert_eq!(data.gradient_of("center"), None);
	}

	#[test]
	fn deserializes_with_optional_fields_missing() {
		let json = r##"{
			"center": { "id": "me", "name": "Me", "icon": "*", "color": "#000000" },
			"hobbies": [ { "id": "chess", "name": "Chess", "icon": "♞", "color": "#333333",
				"achievements": [ { "title": "Club champion" } ] } ]
		}"##;
		let data: HobbyData = serde_json::from_str(json).unwrap();
		assert_eq!(data.center.description, "");
		let chess = data.hobby("chess").unwrap();
		assert_eq!(chess.gradient, None);
		assert_eq!(chess.achievements[0].tag, "");
		assert_eq!(chess.achievements[0].image, None);
	}
}
