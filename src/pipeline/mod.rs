pub mod normalize;
pub mod extraction;
pub mod intent;
