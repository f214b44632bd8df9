//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │                    OrderRepository                          │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │   InMemoryOrderRepository  │  FileOrderRepository          │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ordercache::adapters::FileOrderRepository;
//! use ordercache::domain::OrderRepository;
//!
//! let repo = FileOrderRepository::open("/var/lib/ordercache").await?;
//! let order = repo.get_by_id(&cancel, "b563feb7b2b84b6test").await?;
//! ```

mod file;
mod memory;

pub use file::FileOrderRepository;
pub use memory::{InMemoryOrderRepository, RepositoryStats};
