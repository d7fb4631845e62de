use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CACHELINE_SIZE: u32 = 64;
pub const MAX_COLUMNS: u32 = 256;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayAlignment {
    /// Wrap at the root structure's alignment.
    #[default]
    Struct,
    Cacheline,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Nested, inset boxes.
    #[default]
    Stack,
    /// Only the deepest visible boxes, no insets.
    Flat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GridBase {
    Decimal,
    #[default]
    Hexadecimal,
}

impl GridBase {
    pub fn format_column(self, value: u32) -> String {
        match self {
            Self::Decimal => value.to_string(),
            Self::Hexadecimal => format!("{value:X}"),
        }
    }

    pub fn format_offset(self, value: u32) -> String {
        match self {
            Self::Decimal => value.to_string(),
            Self::Hexadecimal => format!("0x{value:X}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub base_cell_width: f32,
    pub base_cell_height: f32,
    pub padding_unit: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub label_min_width: f32,
    pub label_min_height: f32,
    pub font_family: String,
    pub font_size: f32,
    pub fast_text_metrics: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_cell_width: 25.0,
            base_cell_height: 25.0,
            padding_unit: 5.0,
            margin_left: 50.0,
            margin_right: 50.0,
            margin_top: 25.0,
            margin_bottom: 25.0,
            label_min_width: 15.0,
            label_min_height: 15.0,
            font_family: "Verdana".to_string(),
            font_size: 12.0,
            fast_text_metrics: false,
        }
    }
}

/// Settings a host would persist between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub alignment: DisplayAlignment,
    pub custom_alignment: u32,
    pub mode: DisplayMode,
    pub grid_base: GridBase,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            alignment: DisplayAlignment::Struct,
            custom_alignment: 8,
            mode: DisplayMode::Stack,
            grid_base: GridBase::Hexadecimal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub background: String,
    pub draw_axis_labels: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: "#1E1E1E".to_string(),
            draw_axis_labels: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub viewer: ViewerConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::dark();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            viewer: ViewerConfig::default(),
            render,
        }
    }
}

/// Columns shown for `alignment`, clamped to `[1, MAX_COLUMNS]`.
pub fn resolve_columns(alignment: DisplayAlignment, custom: u32, struct_align: u32) -> u32 {
    let columns = match alignment {
        DisplayAlignment::Struct => struct_align,
        DisplayAlignment::Cacheline => CACHELINE_SIZE,
        DisplayAlignment::Custom => custom,
    };
    columns.clamp(1, MAX_COLUMNS)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    node_text_color: Option<String>,
    node_border_color: Option<String>,
    node_border_width: Option<f32>,
    grid_line_color: Option<String>,
    grid_line_opacity: Option<f32>,
    grid_label_color: Option<String>,
    overlay_color: Option<String>,
    overlay_opacity: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    base_cell_width: Option<f32>,
    base_cell_height: Option<f32>,
    padding_unit: Option<f32>,
    margin_left: Option<f32>,
    margin_right: Option<f32>,
    margin_top: Option<f32>,
    margin_bottom: Option<f32>,
    label_min_width: Option<f32>,
    label_min_height: Option<f32>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ViewerConfigFile {
    alignment: Option<DisplayAlignment>,
    custom_alignment: Option<u32>,
    mode: Option<DisplayMode>,
    grid_base: Option<GridBase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    viewer: Option<ViewerConfigFile>,
    draw_axis_labels: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    match parsed.theme.as_deref() {
        Some("light") => config.theme = Theme::light(),
        Some("dark") => config.theme = Theme::dark(),
        Some(other) => log::warn!("unknown theme '{other}', keeping the dark theme"),
        None => {}
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.node_border_color {
            config.theme.node_border_color = v;
        }
        if let Some(v) = vars.node_border_width {
            config.theme.node_border_width = v;
        }
        if let Some(v) = vars.grid_line_color {
            config.theme.grid_line_color = v;
        }
        if let Some(v) = vars.grid_line_opacity {
            config.theme.grid_line_opacity = v;
        }
        if let Some(v) = vars.grid_label_color {
            config.theme.grid_label_color = v;
        }
        if let Some(v) = vars.overlay_color {
            config.theme.overlay_color = v;
        }
        if let Some(v) = vars.overlay_opacity {
            config.theme.overlay_opacity = v;
        }
    }
    config.render.background = config.theme.background.clone();

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.base_cell_width {
            target.base_cell_width = v;
        }
        if let Some(v) = layout.base_cell_height {
            target.base_cell_height = v;
        }
        if let Some(v) = layout.padding_unit {
            target.padding_unit = v;
        }
        if let Some(v) = layout.margin_left {
            target.margin_left = v;
        }
        if let Some(v) = layout.margin_right {
            target.margin_right = v;
        }
        if let Some(v) = layout.margin_top {
            target.margin_top = v;
        }
        if let Some(v) = layout.margin_bottom {
            target.margin_bottom = v;
        }
        if let Some(v) = layout.label_min_width {
            target.label_min_width = v;
        }
        if let Some(v) = layout.label_min_height {
            target.label_min_height = v;
        }
        if let Some(v) = layout.font_family {
            target.font_family = v;
        }
        if let Some(v) = layout.font_size {
            target.font_size = v;
        }
        if let Some(v) = layout.fast_text_metrics {
            target.fast_text_metrics = v;
        }
    }

    if let Some(viewer) = parsed.viewer {
        if let Some(v) = viewer.alignment {
            config.viewer.alignment = v;
        }
        if let Some(v) = viewer.custom_alignment {
            config.viewer.custom_alignment = v.clamp(1, MAX_COLUMNS);
        }
        if let Some(v) = viewer.mode {
            config.viewer.mode = v;
        }
        if let Some(v) = viewer.grid_base {
            config.viewer.grid_base = v;
        }
    }

    if let Some(v) = parsed.draw_axis_labels {
        config.render.draw_axis_labels = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("slview-{}-{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.viewer.mode, DisplayMode::Stack);
        assert_eq!(config.viewer.grid_base, GridBase::Hexadecimal);
        assert_eq!(config.layout.base_cell_width, 25.0);
    }

    #[test]
    fn overrides_are_applied() {
        let path = write_temp(
            "overrides.json",
            r##"{
                "theme": "light",
                "themeVariables": { "fontSize": 14 },
                "layout": { "paddingUnit": 3, "fastTextMetrics": true },
                "viewer": { "alignment": "custom", "customAlignment": 1000, "mode": "flat", "gridBase": "decimal" }
            }"##,
        );
        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.theme.background, "#FFFFFF");
        assert_eq!(config.render.background, "#FFFFFF");
        assert_eq!(config.theme.font_size, 14.0);
        assert_eq!(config.layout.padding_unit, 3.0);
        assert!(config.layout.fast_text_metrics);
        assert_eq!(config.viewer.alignment, DisplayAlignment::Custom);
        assert_eq!(config.viewer.custom_alignment, MAX_COLUMNS);
        assert_eq!(config.viewer.mode, DisplayMode::Flat);
        assert_eq!(config.viewer.grid_base, GridBase::Decimal);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let path = write_temp("broken.json", "{ not json");
        assert!(load_config(Some(&path)).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn columns_follow_alignment_and_clamp() {
        assert_eq!(resolve_columns(DisplayAlignment::Struct, 8, 4), 4);
        assert_eq!(resolve_columns(DisplayAlignment::Struct, 8, 0), 1);
        assert_eq!(resolve_columns(DisplayAlignment::Cacheline, 8, 4), 64);
        assert_eq!(resolve_columns(DisplayAlignment::Custom, 999, 4), MAX_COLUMNS);
    }

    #[test]
    fn grid_base_formats_axis_labels() {
        assert_eq!(GridBase::Hexadecimal.format_column(10), "A");
        assert_eq!(GridBase::Hexadecimal.format_offset(32), "0x20");
        assert_eq!(GridBase::Decimal.format_offset(32), "32");
    }
}
