use std::collections::HashMap;

use crate::note::Resource;

/// Content-hash to filename lookup for one note's attachments.
#[derive(Debug, Clone, Default)]
pub struct AttachmentResolver {
    names: HashMap<String, String>,
}

impl AttachmentResolver {
    pub fn from_resources(resources: &[Resource]) -> AttachmentResolver {
        let mut resolver = AttachmentResolver::default();
        for res in resources {
            resolver.insert(&res.data.hash, res.display_name());
        }
        resolver
    }

    pub fn insert(&mut self, hash: &str, file_name: &str) {
        self.names.insert(hash.to_string(), file_name.to_string());
    }

    pub fn resolve(&self, hash: &str) -> Option<&str> {
        self.names.get(hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
