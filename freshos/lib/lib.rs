//! `freshos` boots a layered live system and manages the changes made on top of it.
//!
//! # Overview
//!
//! A freshos machine starts from an immutable base image plus an ordered chain of incremental
//! images ("bundles", squashfs archives named `NN-description.sb`). All of them are stacked
//! into one overlayfs mount with a single writable upper layer. Whatever the user changes in
//! that upper layer can later be captured into a new bundle (a snapshot), rolled back, or
//! folded together with everything else into a new base image.
//!
//! # Boot
//!
//! The first stage runs in the minimal boot environment:
//!
//! 1. [`device::Resolver`] scans the block devices and mounts the one holding the requested
//!    home directory (`fresh_os=UUID/name` on the kernel command line).
//! 2. [`bundle::BundleChain`] enumerates the bundles of that home directory and
//!    [`bundle::mount_chain`] builds the union root from them.
//! 3. [`boot::initialize`] prepares per-user persistent directories and generates the boot
//!    configuration used by every following boot.
//!
//! The stages hand over state through one JSON file, modelled by [`config::BootArguments`].
//!
//! # Snapshots
//!
//! The [`snapshot`] module implements the `savechanges` tool: `save`, `list`, `rollback`,
//! `pack` and `export`. The [`rules`] module decides which paths of the writable layer are
//! ephemeral and which known-transient artifacts get purged before packing.
//!
//! # Modules
//!
//! - [`boot`] - Boot stages and home directory initialization
//! - [`bundle`] - Bundle enumeration, ordering and the union mount
//! - [`cli`] - Command-line arguments, styles and prompts
//! - [`config`] - Well-known paths, defaults and the boot argument hand-off
//! - [`device`] - Block device discovery and target resolution
//! - [`parser`] - The `key=value` token parser shared by the command line and `blkid`
//! - [`rules`] - Exclusion and cleanup rule sets
//! - [`snapshot`] - The snapshot lifecycle
//! - [`sys`] - Thin wrappers around mount, device nodes and privileges

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod boot;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod device;
pub mod parser;
pub mod rules;
pub mod snapshot;
pub mod sys;

pub use error::*;
