// Domain layer: handicap math, round selection, models and ports.
// No I/O here; adapters live under config/ and core/.

pub mod handicap;
pub mod model;
pub mod ports;
pub mod selection;
