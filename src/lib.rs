//! Offline physically based Monte Carlo path tracer.
//!
//! Loads a scene (line-oriented text format or a glTF 2.0 subset),
//! traces it with a recursive MIS path integrator, and writes a binary
//! PPM image. See [`scene`] for the loaders, [`integrator`] for the
//! rendering equation, and [`render`] for the parallel tile driver.

pub mod aabb;
pub mod bvh;
pub mod camera;
pub mod error;
pub mod integrator;
pub mod math;
pub mod primitive;
pub mod render;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod tonemap;
