//! Owner of the links for one UI session.
//!
//! The registry derives each target's endpoint from the page origin,
//! spawns its manager and hands out [`LinkHandle`]s.
//!
//! # Policies
//!
//! | Mode | Existing policy | `create` with a link already registered |
//! |------|-----------------|-----------------------------------------|
//! | `Exclusive` | `Reuse` | Returns the active link, whatever the target |
//! | `Exclusive` | `Reject` | [`Error::SingletonAlreadyInitialized`] |
//! | `PerTarget` | `Reuse` | Returns the link for the same target, else spawns |
//! | `PerTarget` | `Reject` | Error for the same target, else spawns |
//!
//! # Example
//!
//! ```ignore
//! let origin = Url::parse("https://robot.local")?;
//! let registry = LinkRegistry::new(origin, LinkConfig::default())?;
//!
//! let link = registry.create(TargetId::new("RB-0042")?, LinkCallbacks::new())?;
//! link.toggle_face_detection(true).await?;
//!
//! registry.clear_all().await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::TargetId;
use crate::link::{ConnectionManager, LinkConfig, LinkHandle, LinkHandler};
use crate::transport::{Connector, WsConnector, camera_url};

// ============================================================================
// Policies
// ============================================================================

/// How many links a registry holds at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistryMode {
    /// At most one active link.
    #[default]
    Exclusive,
    /// One link per target.
    PerTarget,
}

/// What `create` does when a matching link already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingPolicy {
    /// Return the existing handle.
    #[default]
    Reuse,
    /// Fail with [`Error::SingletonAlreadyInitialized`].
    Reject,
}

// ============================================================================
// LinkRegistry
// ============================================================================

/// Creates, tracks and disposes links.
pub struct LinkRegistry<C: Connector = WsConnector> {
    origin: Url,
    config: LinkConfig,
    connector: C,
    mode: RegistryMode,
    policy: ExistingPolicy,
    links: Mutex<FxHashMap<TargetId, LinkHandle>>,
}

impl LinkRegistry<WsConnector> {
    /// Creates a registry that connects over WebSocket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the config does not validate or the
    /// origin has no host.
    pub fn new(origin: Url, config: LinkConfig) -> Result<Self> {
        Self::with_connector(origin, config, WsConnector)
    }
}

impl<C: Connector> LinkRegistry<C> {
    /// Creates a registry with a custom connector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the config does not validate or the
    /// origin has no host.
    pub fn with_connector(origin: Url, config: LinkConfig, connector: C) -> Result<Self> {
        config.validate()?;
        if origin.host_str().is_none() {
            return Err(Error::config(format!("Origin has no host: {origin}")));
        }

        debug!(%origin, connector = connector.name(), "Link registry created");

        Ok(Self {
            origin,
            config,
            connector,
            mode: RegistryMode::default(),
            policy: ExistingPolicy::default(),
            links: Mutex::new(FxHashMap::default()),
        })
    }

    /// Sets the registry mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RegistryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the existing-link policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ExistingPolicy) -> Self {
        self.policy = policy;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Page origin endpoints are derived from.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Config applied to every new link.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Registry mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    /// Existing-link policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ExistingPolicy {
        self.policy
    }

    /// Number of registered links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.lock().len()
    }

    /// Returns `true` if no links are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.lock().is_empty()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Creates a link for `target`, or returns the existing one.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::SingletonAlreadyInitialized`] under [`ExistingPolicy::Reject`]
    /// - [`Error::Config`] if the endpoint cannot be derived
    pub fn create(&self, target: TargetId, handler: impl LinkHandler) -> Result<LinkHandle> {
        let mut links = self.links.lock();
        links.retain(|_, link| !link.is_stopped());

        let existing = match self.mode {
            RegistryMode::Exclusive => links.values().next().cloned(),
            RegistryMode::PerTarget => links.get(&target).cloned(),
        };

        if let Some(existing) = existing {
            return match self.policy {
                ExistingPolicy::Reuse => {
                    if existing.target() != &target {
                        warn!(
                            requested = %target,
                            active = %existing.target(),
                            "Reusing active link for a different target"
                        );
                    }
                    Ok(existing)
                }
                ExistingPolicy::Reject => Err(Error::SingletonAlreadyInitialized {
                    active: existing.target().clone(),
                }),
            };
        }

        let url = camera_url(&self.origin, &target)?;
        let transport = self.connector.transport(&url);
        let link = ConnectionManager::spawn(target.clone(), url, transport, &self.config, handler)?;

        info!(target_id = %target, link_id = %link.link_id(), "Link registered");
        links.insert(target, link.clone());

        Ok(link)
    }

    /// Returns the link for `target`, if registered and running.
    #[must_use]
    pub fn get(&self, target: &TargetId) -> Option<LinkHandle> {
        self.links
            .lock()
            .get(target)
            .filter(|link| !link.is_stopped())
            .cloned()
    }

    /// Returns the active link.
    ///
    /// In per-target mode this returns a link only when exactly one is
    /// running.
    #[must_use]
    pub fn active(&self) -> Option<LinkHandle> {
        let links = self.links.lock();
        let mut running = links.values().filter(|link| !link.is_stopped());

        match (running.next(), running.next()) {
            (Some(link), None) => Some(link.clone()),
            _ => None,
        }
    }

    /// Disposes and removes the link for `target`.
    ///
    /// Returns `true` if a link was registered.
    pub async fn clear(&self, target: &TargetId) -> bool {
        let Some(link) = self.links.lock().remove(target) else {
            return false;
        };

        Self::dispose(link).await;
        true
    }

    /// Disposes and removes every link.
    pub async fn clear_all(&self) {
        let links: Vec<LinkHandle> = self.links.lock().drain().map(|(_, link)| link).collect();

        for link in links {
            Self::dispose(link).await;
        }
    }

    async fn dispose(link: LinkHandle) {
        match link.dispose().await {
            Ok(()) => info!(target_id = %link.target(), "Link cleared"),
            Err(Error::LinkStopped) => debug!(target_id = %link.target(), "Link already stopped"),
            Err(e) => warn!(target_id = %link.target(), error = %e, "Link dispose failed"),
        }
    }
}

impl<C: Connector> fmt::Debug for LinkRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkRegistry")
            .field("origin", &self.origin.as_str())
            .field("connector", &self.connector.name())
            .field("mode", &self.mode)
            .field("policy", &self.policy)
            .field("links", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
