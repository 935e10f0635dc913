use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub node_fill: String,
    pub node_border: String,
    pub start_color: String,
    pub final_color: String,
    pub text_color: String,
    pub line_color: String,
    pub edge_label_background: String,
    pub edge_label_text: String,
    pub shadow_color: String,
    pub placeholder_text: String,
    pub background: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, system-ui, sans-serif".to_string(),
            node_fill: "#FFFFFF".to_string(),
            node_border: "#475569".to_string(),
            start_color: "#F59E0B".to_string(),
            final_color: "#10B981".to_string(),
            text_color: "#1E293B".to_string(),
            line_color: "#94A3B8".to_string(),
            edge_label_background: "#1E293B".to_string(),
            edge_label_text: "#FFFFFF".to_string(),
            shadow_color: "#000000".to_string(),
            placeholder_text: "#64748B".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, system-ui, sans-serif".to_string(),
            node_fill: "#1E293B".to_string(),
            node_border: "#CBD5E1".to_string(),
            start_color: "#FBBF24".to_string(),
            final_color: "#34D399".to_string(),
            text_color: "#F1F5F9".to_string(),
            line_color: "#64748B".to_string(),
            edge_label_background: "#E2E8F0".to_string(),
            edge_label_text: "#0F172A".to_string(),
            shadow_color: "#000000".to_string(),
            placeholder_text: "#94A3B8".to_string(),
            background: "#0F172A".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "light" | "default" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
