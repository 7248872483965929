//! # linkhubd: linkhub daemon
//!
//! Composition root that wires the registries and the provisioning engine
//! together and keeps them running until shutdown.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise `tracing` from the configured filter
//! - Construct the in-memory item and thing registries (adapters)
//! - Construct the link registry and the provisioning engine, injecting the
//!   collaborators through port traits
//! - Activate, provision, wait for SIGINT, deactivate
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use linkhub_adapter_memory::{InMemoryItemRegistry, InMemoryThingRegistry, TracingListener};
use linkhub_app::ports::{Lifecycle, Provider};
use linkhub_app::services::link_registry::LinkRegistry;
use linkhub_app::services::provisioning::ProvisioningEngine;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("unable to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter)
                .context("invalid logging filter")?,
        )
        .init();

    // Adapters
    let item_registry = Arc::new(InMemoryItemRegistry::with_items(config.items()?));
    let thing_registry = Arc::new(InMemoryThingRegistry::new());

    // Components
    let link_registry = Arc::new(LinkRegistry::new());
    let engine = Arc::new(ProvisioningEngine::new());

    link_registry.add_provider_change_listener(Arc::new(TracingListener::new("links")));
    engine.add_provider_change_listener(item_registry.clone());
    engine.add_provider_change_listener(Arc::new(TracingListener::new("items")));

    // Startup: the linker must be active before the engine links anything.
    link_registry.activate()?;
    engine.attach_linker(link_registry.clone());
    engine.attach_item_registry(item_registry.clone());
    engine.activate()?;
    engine.attach_thing_source(thing_registry.clone());

    for binding in &config.provisioning.auto_bindings {
        let reports = engine.provide_items_for_binding(binding)?;
        tracing::info!(binding, things = reports.len(), "automatic provisioning enabled");
    }
    for thing in config.things()? {
        thing_registry.add(thing)?;
    }

    tracing::info!(
        things = thing_registry.get_all().len(),
        items = engine.get_all().len(),
        links = link_registry.get_all().len(),
        "linkhubd running"
    );

    tokio::signal::ctrl_c()
        .await
        .context("unable to listen for shutdown signal")?;
    tracing::info!("shutting down");

    engine.deactivate()?;
    link_registry.deactivate()?;

    Ok(())
}
