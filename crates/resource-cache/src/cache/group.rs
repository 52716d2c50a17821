//! # Cache Groups
//!
//! Descriptors sharing an origin URI are duplicate requests for the same
//! content. They are bucketed into one group whose representative performs
//! the single fetch on behalf of every member.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::resource::{ResourceDescriptor, ResourceSet};

/// Descriptors sharing one origin URI
#[derive(Debug, Clone)]
pub struct CacheGroup {
    origin_key: String,
    representative: Arc<ResourceDescriptor>,
    members: Vec<Arc<ResourceDescriptor>>,
}

impl CacheGroup {
    fn new(descriptor: Arc<ResourceDescriptor>) -> Self {
        Self {
            origin_key: descriptor.origin_uri().to_owned(),
            representative: descriptor.clone(),
            members: vec![descriptor],
        }
    }

    fn push(&mut self, descriptor: Arc<ResourceDescriptor>) {
        // Strictly greater: the first descriptor seen keeps ties
        if descriptor.fetch_priority() > self.representative.fetch_priority() {
            self.representative = descriptor.clone();
        }
        self.members.push(descriptor);
    }

    pub fn origin_key(&self) -> &str {
        &self.origin_key
    }

    pub fn representative(&self) -> &Arc<ResourceDescriptor> {
        &self.representative
    }

    pub fn members(&self) -> &[Arc<ResourceDescriptor>] {
        &self.members
    }

    pub fn member_keys(&self) -> Vec<String> {
        self.members.iter().map(|m| m.key().to_owned()).collect()
    }
}

/// Groups of one caching pass, in order of first appearance
#[derive(Debug, Clone, Default)]
pub struct CacheGroups {
    groups: Vec<Arc<CacheGroup>>,
    index: HashMap<String, usize>,
}

impl CacheGroups {
    pub fn get(&self, origin_key: &str) -> Option<&Arc<CacheGroup>> {
        self.index.get(origin_key).map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CacheGroup>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Incremental construction of [`CacheGroups`]
#[derive(Debug, Default)]
pub struct GroupBuilder {
    groups: Vec<CacheGroup>,
    index: HashMap<String, usize>,
}

impl GroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, descriptor: &Arc<ResourceDescriptor>) {
        if descriptor.origin_uri().is_empty() {
            warn!(key = %descriptor.key(), "Resource has an empty origin URI");
        }

        match self.index.get(descriptor.origin_uri()) {
            Some(&i) => self.groups[i].push(descriptor.clone()),
            None => {
                self.index
                    .insert(descriptor.origin_uri().to_owned(), self.groups.len());
                self.groups.push(CacheGroup::new(descriptor.clone()));
            }
        }
    }

    pub fn add_list(&mut self, list: &dyn ResourceSet) {
        for descriptor in list.descriptors() {
            self.add(descriptor);
        }
    }

    pub fn build(self) -> CacheGroups {
        CacheGroups {
            groups: self.groups.into_iter().map(Arc::new).collect(),
            index: self.index,
        }
    }
}

/// Bucket every descriptor of `lists` by origin URI
pub fn build_groups(lists: &[&dyn ResourceSet]) -> CacheGroups {
    let mut builder = GroupBuilder::new();
    for list in lists {
        builder.add_list(*list);
    }
    let groups = builder.build();
    debug!(lists = lists.len(), groups = groups.len(), "Cache groups built");
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ListKind, ResourceList};

    fn descriptor(key: &str, origin: &str, priority: i32) -> ResourceDescriptor {
        ResourceDescriptor::new(key, format!("./local/{key}"), origin).with_priority(priority)
    }

    #[test]
    fn test_highest_priority_wins_and_first_seen_breaks_ties() {
        let list = ResourceList::new(
            "assets",
            ListKind::Dynamic,
            vec![
                descriptor("a", "https://cdn.example.com/x", 1),
                descriptor("b", "https://cdn.example.com/x", 2),
                descriptor("c", "https://cdn.example.com/x", 2),
            ],
        );
        let groups = build_groups(&[&list]);

        assert_eq!(groups.len(), 1);
        let group = groups.get("https://cdn.example.com/x").unwrap();
        assert_eq!(group.representative().key(), "b");
        assert_eq!(group.member_keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_groups_span_lists() {
        let fonts = ResourceList::new(
            "fonts",
            ListKind::Dynamic,
            vec![descriptor("font", "https://cdn.example.com/shared", 0)],
        );
        let assets = ResourceList::new(
            "assets",
            ListKind::Dynamic,
            vec![
                descriptor("asset", "https://cdn.example.com/shared", 5),
                descriptor("other", "https://cdn.example.com/other", 0),
            ],
        );
        let groups = build_groups(&[&fonts, &assets]);

        assert_eq!(groups.len(), 2);
        let shared = groups.get("https://cdn.example.com/shared").unwrap();
        assert_eq!(shared.members().len(), 2);
        assert_eq!(shared.representative().key(), "asset");

        let order: Vec<_> = groups.iter().map(|g| g.origin_key().to_owned()).collect();
        assert_eq!(
            order,
            vec!["https://cdn.example.com/shared", "https://cdn.example.com/other"]
        );
    }

    #[test]
    fn test_empty_origin_forms_its_own_group() {
        let list = ResourceList::new(
            "assets",
            ListKind::Static,
            vec![
                descriptor("broken", "", 0),
                descriptor("ok", "https://cdn.example.com/ok", 0),
            ],
        );
        let groups = build_groups(&[&list]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get("").unwrap().member_keys(), vec!["broken"]);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let list = ResourceList::new(
            "assets",
            ListKind::Static,
            vec![
                descriptor("a", "https://cdn.example.com/x", 3),
                descriptor("b", "https://cdn.example.com/x", 3),
            ],
        );

        let first = build_groups(&[&list]);
        let second = build_groups(&[&list]);
        let rep_first = first.get("https://cdn.example.com/x").unwrap().representative();
        let rep_second = second.get("https://cdn.example.com/x").unwrap().representative();
        assert!(Arc::ptr_eq(rep_first, rep_second));
        assert_eq!(rep_first.key(), "a");
    }
}
