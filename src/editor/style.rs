//! Editor styling.

use crate::node_types::KindCategory;
use egui::Color32;

/// Visual styling configuration for the canvas.
#[derive(Clone, Debug)]
pub struct EditorStyle {
    pub input_header: Color32,
    pub agent_header: Color32,
    pub tool_header: Color32,
    pub output_header: Color32,
    pub node_fill: Color32,
    pub node_stroke: Color32,
    pub selected_stroke: Color32,
    pub grid: Color32,
    pub use_gradient_connections: bool,
    pub connection_width: f32,
    pub font_size: f32,
}

impl Default for EditorStyle {
    fn default() -> Self {
        Self {
            input_header: Color32::from_rgb(200, 150, 50),
            agent_header: Color32::from_rgb(50, 100, 200),
            tool_header: Color32::from_rgb(50, 150, 100),
            output_header: Color32::from_rgb(180, 50, 50),
            node_fill: Color32::from_gray(38),
            node_stroke: Color32::from_gray(70),
            selected_stroke: Color32::from_rgb(255, 200, 60),
            grid: Color32::from_gray(45),
            use_gradient_connections: true,
            connection_width: 2.5,
            font_size: 14.0,
        }
    }
}

impl EditorStyle {
    pub fn header_color(&self, category: KindCategory) -> Color32 {
        match category {
            KindCategory::Input => self.input_header,
            KindCategory::Agent => self.agent_header,
            KindCategory::Tool => self.tool_header,
            KindCategory::Output => self.output_header,
        }
    }
}
