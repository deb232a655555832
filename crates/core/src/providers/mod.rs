pub mod traits;

// API provider implementations
pub mod moex;
pub mod tinvest;
