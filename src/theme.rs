use serde::{Deserialize, Serialize};

use crate::ir::Category;

const ROOT_BACKGROUND: &str = "#4B4B4B";
const SIMPLE_BACKGROUND: &str = "#AA7300";
const BITFIELD_BACKGROUND: &str = "#005555";
const COMPLEX_BACKGROUND: &str = "#550055";
const BASE_BACKGROUND: &str = "#337766";
const VTABLE_BACKGROUND: &str = "#007733";
const OTHER_BACKGROUND: &str = "#333333";

/// Fixed category → fill colour table.
pub fn category_background(category: Category) -> &'static str {
    match category {
        Category::Root => ROOT_BACKGROUND,
        Category::SimpleField => SIMPLE_BACKGROUND,
        Category::Bitfield => BITFIELD_BACKGROUND,
        Category::ComplexField => COMPLEX_BACKGROUND,
        Category::PrimaryVirtualBase
        | Category::VirtualBase
        | Category::PrimaryNonVirtualBase
        | Category::NonVirtualBase => BASE_BACKGROUND,
        Category::VTablePointer
        | Category::VFTablePointer
        | Category::VBTablePointer
        | Category::VtorDisplacement => VTABLE_BACKGROUND,
        Category::Union | Category::SharedMemory => OTHER_BACKGROUND,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub node_text_color: String,
    pub node_border_color: String,
    pub node_border_width: f32,
    pub grid_line_color: String,
    pub grid_line_opacity: f32,
    pub grid_label_color: String,
    pub overlay_color: String,
    pub overlay_opacity: f32,
}

impl Theme {
    /// Dark host-IDE palette.
    pub fn dark() -> Self {
        Self {
            font_family: "Verdana, sans-serif".to_string(),
            font_size: 12.0,
            background: "#1E1E1E".to_string(),
            node_text_color: "#FFFFFF".to_string(),
            node_border_color: "#FFFFFF".to_string(),
            node_border_width: 2.0,
            grid_line_color: "#000000".to_string(),
            grid_line_opacity: 0.39,
            grid_label_color: "#DCDCDC".to_string(),
            overlay_color: "#FFFFFF".to_string(),
            overlay_opacity: 0.3,
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "Verdana, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FFFFFF".to_string(),
            node_text_color: "#FFFFFF".to_string(),
            node_border_color: "#FFFFFF".to_string(),
            node_border_width: 2.0,
            grid_line_color: "#000000".to_string(),
            grid_line_opacity: 0.39,
            grid_label_color: "#1E1E1E".to_string(),
            overlay_color: "#FFFFFF".to_string(),
            overlay_opacity: 0.3,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
