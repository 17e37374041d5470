//! Configuration management module

pub mod parser;
pub mod ports;
pub mod validation;

// Re-export main functionality
pub use parser::{display_config_summary, load_config, ConfigParser};
pub use ports::parse_port_list;
pub use validation::{validate_config, ConfigValidator, ValidationLevel, ValidationWarning};

// Re-export from models for convenience
pub use crate::models::ProbeConfiguration;
