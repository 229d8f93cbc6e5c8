// Domain layer: core models and ports (interfaces). No knowledge of HTTP,
// filesystems or PDF encoding lives here.

pub mod model;
pub mod ports;
