//! 3-vector and quaternion algebra, and 4x4 affine transform composition.
//! These are the primitives the rest of the renderer is built on.

mod quat;
mod transform;
mod vec3;

pub use quat::Quat;
pub use transform::Transform;
pub use vec3::{Color, Point3, Ray, Vec3};
