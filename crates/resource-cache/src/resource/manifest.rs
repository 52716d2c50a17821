//! # Resource Manifest
//!
//! The resource-related part of a game launch configuration: font and asset
//! maps plus client placeholders, turned into [`ResourceList`]s.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::resource::{HostContext, HostPlatform, ResourceList};

/// Font and asset maps of a launch configuration (key to remote URI)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameResources {
    #[serde(default)]
    pub fonts: BTreeMap<String, String>,
    #[serde(default)]
    pub assets: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderType {
    Text,
    Image,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    #[serde(rename = "type")]
    pub kind: PlaceholderType,
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub origin_value: Option<String>,
}

impl Placeholder {
    /// Image URI of an image placeholder
    pub fn image_uri(&self) -> Option<&str> {
        if self.kind != PlaceholderType::Image {
            return None;
        }
        self.origin_value.as_deref().or(self.value.as_deref())
    }
}

/// Everything needed to build the resource lists of one game instance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceManifest {
    #[serde(default)]
    pub game_instance_id: Option<u64>,
    #[serde(default)]
    pub platform: HostPlatform,
    #[serde(default)]
    pub game_resources: GameResources,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
}

impl ResourceManifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn host(&self) -> HostContext {
        HostContext::new(self.platform, self.game_instance_id)
    }

    /// Dynamic list of the launch configuration fonts
    pub fn font_list(&self) -> ResourceList {
        ResourceList::new_dynamic(
            "fonts",
            self.game_resources.fonts.clone(),
            &self.host(),
        )
    }

    pub fn asset_list(&self) -> ResourceList {
        ResourceList::new_dynamic(
            "assets",
            self.game_resources.assets.clone(),
            &self.host(),
        )
    }

    /// Static list of image placeholders, always fetched remotely
    pub fn image_placeholder_list(&self) -> ResourceList {
        let entries = self
            .placeholders
            .iter()
            .filter_map(|p| p.image_uri().map(|uri| (p.name.clone(), uri.to_owned())));
        ResourceList::new_static("imagePlaceholders", entries)
    }

    /// All lists in the order they are usually cached
    pub fn resource_lists(&self) -> Vec<ResourceList> {
        vec![
            self.font_list(),
            self.asset_list(),
            self.image_placeholder_list(),
        ]
    }
}
