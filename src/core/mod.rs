/*-------------------------------------------------------------------------------------------------
  Core Modules
-------------------------------------------------------------------------------------------------*/

pub mod cache;
pub mod config;
pub mod errors;
pub mod fetchers;
pub mod json;
pub mod network_prefix;
pub mod provider;
pub mod registry;
