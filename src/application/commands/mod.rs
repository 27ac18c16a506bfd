// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the presentation layer and Services
// - Commands accept DTOs, return DTOs
// - Commands handle error conversion for the presentation layer
// - Commands NEVER contain business logic

pub mod workflow_commands;

pub use workflow_commands::*;
