//! Per-build context handed to every plugin when it is constructed

use crate::config::EnvSnapshot;
use crate::fs::{FileSystem, RealFileSystem};
use crate::installer::Installer;
use crate::layout::StagingLayout;
use crate::opts::OptsStore;
use crate::overrides::Overrides;
use crate::services::{ApplicationMetadata, ServiceCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a plugin may know about the build. Immutable once built.
pub struct StagingContext {
    layout: StagingLayout,
    services: ServiceCatalog,
    application: ApplicationMetadata,
    overrides: Overrides,
    fs: Arc<dyn FileSystem>,
    installer: Arc<dyn Installer>,
    opts: OptsStore,
}

impl std::fmt::Debug for StagingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingContext")
            .field("layout", &self.layout)
            .field("services", &self.services.bindings().len())
            .field("application", &self.application)
            .field("overrides", &self.overrides.prefix())
            .finish_non_exhaustive()
    }
}

impl StagingContext {
    pub fn builder(layout: StagingLayout, installer: Arc<dyn Installer>) -> StagingContextBuilder {
        StagingContextBuilder::new(layout, installer)
    }

    /// Context for a real staging run, resolved from a captured environment
    pub fn from_snapshot(
        layout: StagingLayout,
        snapshot: &EnvSnapshot,
        installer: Arc<dyn Installer>,
    ) -> Self {
        Self::builder(layout, installer)
            .services(ServiceCatalog::from_env_value(snapshot.vcap_services.as_deref()))
            .application(ApplicationMetadata::from_env_value(
                snapshot.vcap_application.as_deref(),
            ))
            .overrides(snapshot.overrides().clone())
            .build()
    }

    pub fn layout(&self) -> &StagingLayout {
        &self.layout
    }

    pub fn services(&self) -> &ServiceCatalog {
        &self.services
    }

    pub fn application(&self) -> &ApplicationMetadata {
        &self.application
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Read-only view of the application tree
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn installer(&self) -> &dyn Installer {
        self.installer.as_ref()
    }

    pub fn opts(&self) -> &OptsStore {
        &self.opts
    }

    pub fn build_dir(&self) -> &Path {
        &self.layout.build_dir
    }

    /// Path of `relative` inside the application
    pub fn app_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.layout.build_dir.join(relative)
    }

    /// Application name for agent labels, `"app"` when the platform gave none
    pub fn application_name(&self) -> String {
        self.application.name().unwrap_or("app").to_string()
    }
}

pub struct StagingContextBuilder {
    layout: StagingLayout,
    installer: Arc<dyn Installer>,
    services: ServiceCatalog,
    application: ApplicationMetadata,
    overrides: Overrides,
    fs: Option<Arc<dyn FileSystem>>,
}

impl StagingContextBuilder {
    pub fn new(layout: StagingLayout, installer: Arc<dyn Installer>) -> Self {
        Self {
            layout,
            installer,
            services: ServiceCatalog::empty(),
            application: ApplicationMetadata::default(),
            overrides: Overrides::default(),
            fs: None,
        }
    }

    pub fn services(mut self, services: ServiceCatalog) -> Self {
        self.services = services;
        self
    }

    pub fn application(mut self, application: ApplicationMetadata) -> Self {
        self.application = application;
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn build(self) -> StagingContext {
        let opts = OptsStore::new(self.layout.opts_dir());
        StagingContext {
            fs: self.fs.unwrap_or_else(|| Arc::new(RealFileSystem::new())),
            layout: self.layout,
            services: self.services,
            application: self.application,
            overrides: self.overrides,
            installer: self.installer,
            opts,
        }
    }
}
