// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod common_enums;
pub mod common_result_and_error;
pub mod warn_once;

// Re-export.
pub use common_enums::*;
pub use common_result_and_error::*;
pub use warn_once::*;
