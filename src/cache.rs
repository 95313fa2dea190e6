use crate::errors::Result;
use crate::origin::{Origin, Resource};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

pub const FONT_STYLESHEET_URL: &str =
    "https://fonts.googleapis.com/css?family=Share+Tech+Mono&display=swap";
pub const FONT_FILE_URL: &str =
    "https://fonts.gstatic.com/s/sharetechmono/v8/J7aHnp1uDWRBEqV98dVQztYldFcLowEF.woff2";

/// App-relative paths and absolute cross-origin URLs to pre-fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheManifest {
    pub local: Vec<String>,
    pub remote: Vec<String>,
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self {
            local: [
                "manifest.json",
                "index.html",
                "about.html",
                "assets/style.css",
                "assets/main.js",
                "assets/icon.svg",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            remote: vec![FONT_STYLESHEET_URL.to_string(), FONT_FILE_URL.to_string()],
        }
    }
}

impl CacheManifest {
    pub fn is_remote(&self, url: &str) -> bool {
        self.remote.iter().any(|candidate| candidate == url)
    }
}

#[derive(Debug, Default)]
pub struct ResourceCache {
    name: String,
    entries: HashMap<String, Resource>,
}

impl ResourceCache {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Fetches the whole manifest; any failed entry fails the population.
    pub async fn populate(
        name: impl Into<String>,
        manifest: &CacheManifest,
        origin: &Origin,
    ) -> Result<Self> {
        let name = name.into();
        let local = try_join_all(manifest.local.iter().map(|path| async move {
            let resource = origin.fetch_local(path).await?;
            Ok::<_, crate::errors::Error>((path.clone(), resource))
        }));
        let remote = try_join_all(manifest.remote.iter().map(|url| async move {
            let resource = origin.fetch_remote(url).await?;
            Ok::<_, crate::errors::Error>((url.clone(), resource))
        }));
        let (local, remote) = futures::try_join!(local, remote)?;

        let entries: HashMap<_, _> = local.into_iter().chain(remote).collect();
        info!(cache = %name, entries = entries.len(), "cache populated");
        Ok(Self { name, entries })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CacheStorage {
    namespaces: RwLock<HashMap<String, Arc<ResourceCache>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, cache: ResourceCache) -> Arc<ResourceCache> {
        let cache = Arc::new(cache);
        let mut namespaces = self.namespaces.write().unwrap_or_else(|e| e.into_inner());
        namespaces.insert(cache.name().to_string(), Arc::clone(&cache));
        cache
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceCache>> {
        let namespaces = self.namespaces.read().unwrap_or_else(|e| e.into_inner());
        namespaces.get(name).cloned()
    }

    /// Drops every namespace except `keep`, returning the dropped names.
    pub fn retain_only(&self, keep: &[&str]) -> Vec<String> {
        let mut namespaces = self.namespaces.write().unwrap_or_else(|e| e.into_inner());
        let removed: Vec<String> = namespaces
            .keys()
            .filter(|name| !keep.contains(&name.as_str()))
            .cloned()
            .collect();
        for name in &removed {
            namespaces.remove(name);
        }
        removed
    }

    pub fn names(&self) -> Vec<String> {
        let namespaces = self.namespaces.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = namespaces.keys().cloned().collect();
        names.sort();
        names
    }
}
