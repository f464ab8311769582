//! Core library: result sets, image resource lifecycle, and viewer navigation.

pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod navigator;
pub mod resource;
pub mod services;

#[cfg(test)]
mod test_support;
