
/// This module contains functionality related to tracking GNSS signals common to all systems
pub mod tracking;

pub mod channel;

pub mod galileo_e1;

pub mod synchro;
