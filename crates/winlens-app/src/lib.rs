// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod contrast;
pub mod dictionary;
pub mod error;
pub mod forms;
pub mod ids;
pub mod model;
pub mod pagination;
pub mod render;
pub mod source;
pub mod state;

pub use contrast::resolve_text_color;
pub use dictionary::*;
pub use error::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use pagination::*;
pub use render::*;
pub use source::*;
pub use state::*;
