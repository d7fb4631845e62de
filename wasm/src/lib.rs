use serde::Deserialize;
use struct_layout_viewer::config::{Config, DisplayMode};
use struct_layout_viewer::decode::{ParseOutcome, parse_layout};
use struct_layout_viewer::theme::Theme;
use struct_layout_viewer::view::{LayoutView, ToggleOutcome};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewerOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text: Option<bool>,
}

fn build_config(options: ViewerOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("light") {
        config.theme = Theme::light();
        config.render.background = config.theme.background.clone();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family.clone();
        config.layout.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
        config.layout.font_size = font_size;
    }
    // no system fonts to measure inside the browser
    config.layout.fast_text_metrics = options.fast_text.unwrap_or(true);
    config
}

#[wasm_bindgen]
pub struct StructLayoutViewer {
    view: LayoutView,
}

#[wasm_bindgen]
impl StructLayoutViewer {
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<StructLayoutViewer, JsValue> {
        let options = match options_json {
            Some(raw) => serde_json::from_str::<ViewerOptions>(&raw)
                .map_err(|error| JsValue::from_str(&error.to_string()))?,
            None => ViewerOptions::default(),
        };
        Ok(Self {
            view: LayoutView::new(build_config(options)),
        })
    }

    /// Loads a result blob. Returns `found`, `notFound` or the decode error.
    pub fn load(&mut self, bytes: &[u8]) -> String {
        match parse_layout(bytes) {
            Ok(ParseOutcome::Found(tree)) => {
                self.view.set_tree(Some(tree));
                "found".to_string()
            }
            Ok(ParseOutcome::NotFound) => {
                self.view.set_tree(None);
                "notFound".to_string()
            }
            Err(error) => {
                self.view.set_tree(None);
                error.to_string()
            }
        }
    }

    pub fn set_columns(&mut self, columns: u32) -> bool {
        self.view.set_columns(columns)
    }

    /// `"flat"` or anything else for stack mode.
    pub fn set_display_mode(&mut self, mode: &str) {
        let mode = if mode == "flat" {
            DisplayMode::Flat
        } else {
            DisplayMode::Stack
        };
        self.view.set_display_mode(mode);
    }

    /// Arena index of the node under the point, or -1.
    pub fn node_at(&self, x: f32, y: f32) -> i32 {
        self.view
            .node_at(x, y)
            .map(|id| id.index() as i32)
            .unwrap_or(-1)
    }

    /// Returns `expanded`, `collapsed`, `unchanged`, or a JSON array of
    /// member labels when a union needs an index.
    pub fn toggle_expand(&mut self, node: u32, index: Option<u32>) -> String {
        let Some(id) = self.view.tree().and_then(|tree| tree.node_id(node as usize)) else {
            return "unchanged".to_string();
        };
        match self.view.toggle_expand(id, index.map(|i| i as usize)) {
            ToggleOutcome::Expanded => "expanded".to_string(),
            ToggleOutcome::Collapsed => "collapsed".to_string(),
            ToggleOutcome::Unchanged => "unchanged".to_string(),
            ToggleOutcome::NeedsChoice(labels) => {
                serde_json::to_string(&labels).unwrap_or_else(|_| "[]".to_string())
            }
        }
    }

    pub fn describe(&self, node: u32) -> Option<String> {
        let id = self.view.tree()?.node_id(node as usize)?;
        self.view.describe(id)
    }

    pub fn set_hover(&mut self, node: i32) -> bool {
        let id = usize::try_from(node)
            .ok()
            .and_then(|index| self.view.tree()?.node_id(index));
        self.view.set_hover(id)
    }

    pub fn render_svg(&self) -> String {
        self.view.render_svg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_only_blob_is_not_found() {
        let mut viewer = StructLayoutViewer::new(None).unwrap();
        assert_eq!(viewer.load(&1u32.to_le_bytes()), "notFound");
        assert_eq!(viewer.node_at(60.0, 30.0), -1);
        assert!(viewer.render_svg().starts_with("<svg"));
    }

    #[test]
    fn light_theme_option() {
        let config = build_config(ViewerOptions {
            theme: Some("light".to_string()),
            ..Default::default()
        });
        assert_eq!(config.render.background, config.theme.background);
        assert!(config.layout.fast_text_metrics);
    }
}
