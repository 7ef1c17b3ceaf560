//! # Core Module
//!
//! Shared-state primitives used across the placement pipeline.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//!
//! ## Usage
//! ```rust
//! use voxel_placer::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod mt_resource;

pub use mt_resource::MtResource;
