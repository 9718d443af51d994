//! Builder → export → reader flows.

mod artifact;
mod determinism;
mod reference_network;
